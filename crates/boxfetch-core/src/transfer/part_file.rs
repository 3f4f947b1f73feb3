//! In-progress output file: written as `<final>.part`, renamed into place when complete.
//!
//! Dropping an unfinished `PartFile` removes the partial data.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Suffix for files still being written.
pub const PART_SUFFIX: &str = ".part";

/// `file.mkv` → `file.mkv.part`.
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(PART_SUFFIX);
    PathBuf::from(o)
}

#[derive(Debug)]
pub struct PartFile {
    writer: Option<BufWriter<File>>,
    temp: PathBuf,
    final_path: PathBuf,
}

impl PartFile {
    /// Creates (or truncates) the `.part` file for `final_path`.
    pub fn create(final_path: PathBuf) -> io::Result<Self> {
        let temp = temp_path(&final_path);
        let file = File::create(&temp)?;
        Ok(Self {
            writer: Some(BufWriter::new(file)),
            temp,
            final_path,
        })
    }

    pub fn write_chunk(&mut self, data: &[u8]) -> io::Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "part file already closed"))?;
        writer.write_all(data)
    }

    /// Flushes, fsyncs and atomically renames onto the final path. On failure the
    /// `.part` file is removed.
    pub fn finish(mut self) -> io::Result<PathBuf> {
        let result = self.commit();
        if result.is_err() {
            remove_partial(&self.temp);
        }
        result.map(|()| std::mem::take(&mut self.final_path))
    }

    fn commit(&mut self) -> io::Result<()> {
        if let Some(writer) = self.writer.take() {
            let file = writer.into_inner().map_err(|e| e.into_error())?;
            file.sync_all()?;
        }
        fs::rename(&self.temp, &self.final_path)
    }
}

fn remove_partial(temp: &Path) {
    match fs::remove_file(temp) {
        Ok(()) => tracing::debug!(path = %temp.display(), "removed partial file"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %temp.display(), "could not remove partial file: {e}"),
    }
}

impl Drop for PartFile {
    fn drop(&mut self) {
        // Only an unfinished transfer still owns its writer.
        if self.writer.take().is_some() {
            remove_partial(&self.temp);
        }
    }
}
