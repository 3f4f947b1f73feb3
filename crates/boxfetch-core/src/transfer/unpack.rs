//! Post-transfer archive handling.
//!
//! A finished zip is extracted next to itself into a directory named after its stem,
//! then deleted. A lone top-level file becomes the artifact; otherwise the directory
//! does. Any extraction failure leaves the archive in place as the artifact.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::error::JobError;

const ZIP_MAGIC: [&[u8; 4]; 2] = [b"PK\x03\x04", b"PK\x05\x06"];

/// True for `.zip` names and for files starting with a zip signature.
pub fn looks_like_zip(path: &Path) -> bool {
    let by_name = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("zip"));
    if by_name {
        return true;
    }
    let mut magic = [0u8; 4];
    File::open(path)
        .and_then(|mut f| f.read_exact(&mut magic))
        .map(|()| ZIP_MAGIC.iter().any(|m| **m == magic))
        .unwrap_or(false)
}

/// Returns the artifact to deliver for the finished file at `path`.
pub fn unpack_if_archive(path: &Path) -> PathBuf {
    if !path.is_file() || !looks_like_zip(path) {
        return path.to_path_buf();
    }
    match extract(path) {
        Ok(artifact) => {
            tracing::info!(
                archive = %path.display(),
                artifact = %artifact.display(),
                "extracted archive"
            );
            artifact
        }
        Err(e) => {
            tracing::warn!(archive = %path.display(), "{e}; keeping archive");
            path.to_path_buf()
        }
    }
}

/// Extraction directory for `archive`: sibling named after the stem.
fn extraction_dir(archive: &Path) -> PathBuf {
    let parent = archive.parent().unwrap_or_else(|| Path::new("."));
    let stem = archive
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dir = parent.join(&stem);
    if stem.is_empty() || dir == archive {
        parent.join(format!("{stem}_extracted"))
    } else {
        dir
    }
}

fn extract(archive: &Path) -> Result<PathBuf, JobError> {
    let dest = extraction_dir(archive);
    let existed = dest.exists();
    if let Err(e) = extract_into(archive, &dest) {
        if !existed {
            let _ = fs::remove_dir_all(&dest);
        }
        return Err(e);
    }

    if let Err(e) = fs::remove_file(archive) {
        tracing::warn!(archive = %archive.display(), "could not delete extracted archive: {e}");
    }
    Ok(single_file(&dest).unwrap_or(dest))
}

fn extract_into(archive: &Path, dest: &Path) -> Result<(), JobError> {
    let fail = |what: &str, e: &dyn std::fmt::Display| {
        JobError::ArchiveExtraction(format!("{}: {what}: {e}", archive.display()))
    };
    let file = File::open(archive).map_err(|e| fail("open", &e))?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| fail("read", &e))?;
    fs::create_dir_all(dest).map_err(|e| fail("create directory", &e))?;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(|e| fail("read entry", &e))?;
        let Some(relative) = entry.enclosed_name() else {
            return Err(fail("unsafe entry path", &entry.name().to_string()));
        };
        let out = dest.join(relative);
        if entry.is_dir() {
            fs::create_dir_all(&out).map_err(|e| fail("create directory", &e))?;
            continue;
        }
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent).map_err(|e| fail("create directory", &e))?;
        }
        let mut target = File::create(&out).map_err(|e| fail("create file", &e))?;
        io::copy(&mut entry, &mut target).map_err(|e| fail("write file", &e))?;
    }
    Ok(())
}

/// The only entry of `dir`, if it is a regular file.
fn single_file(dir: &Path) -> Option<PathBuf> {
    let mut entries = fs::read_dir(dir).ok()?.flatten();
    let first = entries.next()?;
    if entries.next().is_some() {
        return None;
    }
    let path = first.path();
    path.is_file().then_some(path)
}
