//! Tests for add and run subcommands.

use super::parse;
use crate::cli::{Cli, CliCommand};
use boxfetch_core::job_store::{Category, SourceType};
use clap::Parser;
use std::path::Path;

#[test]
fn cli_parse_add() {
    match parse(&["boxfetch", "add", "/tmp/show.torrent"]) {
        CliCommand::Add {
            path,
            kind,
            category,
        } => {
            assert_eq!(path, Path::new("/tmp/show.torrent"));
            assert!(kind.is_none());
            assert!(category.is_none());
        }
        _ => panic!("expected Add"),
    }
}

#[test]
fn cli_parse_add_kind_and_category() {
    match parse(&[
        "boxfetch",
        "add",
        "release.bin",
        "--kind",
        "usenet",
        "--category",
        "Radarr",
    ]) {
        CliCommand::Add {
            path,
            kind,
            category,
        } => {
            assert_eq!(path, Path::new("release.bin"));
            assert_eq!(kind, Some(SourceType::Nzb));
            assert_eq!(category, Some(Category::Radarr));
        }
        _ => panic!("expected Add with --kind and --category"),
    }
}

#[test]
fn cli_parse_add_rejects_unknown_category() {
    let err = Cli::try_parse_from(["boxfetch", "add", "x.nzb", "--category", "lidarr"]);
    assert!(err.is_err());
}

#[test]
fn cli_parse_add_requires_path() {
    assert!(Cli::try_parse_from(["boxfetch", "add"]).is_err());
}

#[test]
fn cli_parse_run() {
    match parse(&["boxfetch", "run"]) {
        CliCommand::Run => {}
        _ => panic!("expected Run"),
    }
}
