//! Tests for status, cancel, remove and settings.

use super::parse;
use crate::cli::{Cli, CliCommand, SettingsAction};
use clap::Parser;

#[test]
fn cli_parse_status() {
    match parse(&["boxfetch", "status"]) {
        CliCommand::Status => {}
        _ => panic!("expected Status"),
    }
}

#[test]
fn cli_parse_cancel() {
    match parse(&["boxfetch", "cancel", "42"]) {
        CliCommand::Cancel { id } => assert_eq!(id, 42),
        _ => panic!("expected Cancel"),
    }
}

#[test]
fn cli_parse_remove() {
    match parse(&["boxfetch", "remove", "7"]) {
        CliCommand::Remove { id } => assert_eq!(id, 7),
        _ => panic!("expected Remove"),
    }
}

#[test]
fn cli_parse_remove_rejects_non_numeric_id() {
    assert!(Cli::try_parse_from(["boxfetch", "remove", "seven"]).is_err());
}

#[test]
fn cli_parse_settings_set() {
    match parse(&["boxfetch", "settings", "set", "download_folder", "/media"]) {
        CliCommand::Settings {
            action: SettingsAction::Set { key, value },
        } => {
            assert_eq!(key, "download_folder");
            assert_eq!(value, "/media");
        }
        _ => panic!("expected Settings Set"),
    }
}

#[test]
fn cli_parse_settings_get_list_unset() {
    match parse(&["boxfetch", "settings", "get", "intake_path"]) {
        CliCommand::Settings {
            action: SettingsAction::Get { key },
        } => assert_eq!(key, "intake_path"),
        _ => panic!("expected Settings Get"),
    }
    match parse(&["boxfetch", "settings", "list"]) {
        CliCommand::Settings {
            action: SettingsAction::List,
        } => {}
        _ => panic!("expected Settings List"),
    }
    match parse(&["boxfetch", "settings", "unset", "intake_path"]) {
        CliCommand::Settings {
            action: SettingsAction::Unset { key },
        } => assert_eq!(key, "intake_path"),
        _ => panic!("expected Settings Unset"),
    }
}
