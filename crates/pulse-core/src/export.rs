//! Output path resolution and JSON file publishing.
//!
//! The exporter never creates directories. A missing parent directory is a
//! configuration error: the write is skipped and the job tries again next
//! cycle. Files are replaced by writing a uniquely named temporary file in
//! the same directory and renaming it over the target, so a reader sees
//! either the previous document or the new one and a failed write leaves
//! the old file intact. Concurrent writers to one target each stage their
//! own file; the last rename wins.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tempfile::NamedTempFile;

/// Errors that can occur while publishing a batch.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The host process's working directory could not be determined.
    #[error("cannot resolve working directory: {source}")]
    CurrentDir {
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The resolved output directory does not exist.
    #[error("output directory does not exist: {}", path.display())]
    MissingDirectory {
        /// The directory that was expected.
        path: PathBuf,
    },

    /// The batch could not be encoded.
    #[error("failed to serialize records: {source}")]
    Serialize {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// Writing or replacing the output file failed.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        /// The file being written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// Summary of a successful export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    /// File that now holds the batch.
    pub path: PathBuf,
    /// Records written.
    pub records: usize,
    /// Bytes written.
    pub bytes: usize,
    /// When the file was replaced.
    pub exported_at: DateTime<Utc>,
}

/// Resolve the configured directory and file name against the process's
/// working directory.
///
/// # Errors
///
/// Returns [`ExportError::CurrentDir`] if the directory is relative and
/// the working directory cannot be read.
pub fn resolve_output_path(output_dir: &str, file_name: &str) -> Result<PathBuf, ExportError> {
    let dir = Path::new(output_dir);
    if dir.is_absolute() {
        return Ok(dir.join(file_name));
    }
    let cwd = std::env::current_dir().map_err(|source| ExportError::CurrentDir { source })?;
    Ok(resolve_output_path_from(&cwd, output_dir, file_name))
}

/// Resolve against an explicit base directory instead of the working
/// directory. Absolute `output_dir` values ignore `base`.
pub fn resolve_output_path_from(base: &Path, output_dir: &str, file_name: &str) -> PathBuf {
    base.join(output_dir).join(file_name)
}

/// Fail unless the directory that will hold `path` already exists.
///
/// # Errors
///
/// Returns [`ExportError::MissingDirectory`] naming the absent directory.
pub fn ensure_parent_exists(path: &Path) -> Result<(), ExportError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => {
            Err(ExportError::MissingDirectory {
                path: parent.to_path_buf(),
            })
        }
        _ => Ok(()),
    }
}

/// Encode `records` as a pretty-printed JSON array and replace the file at
/// `path` with it.
///
/// # Errors
///
/// Returns [`ExportError::MissingDirectory`] if the parent directory is
/// absent, [`ExportError::Serialize`] if encoding fails, or
/// [`ExportError::Write`] if the file cannot be written or replaced. On
/// any error the previous file contents are left as they were.
pub fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<ExportReport, ExportError> {
    ensure_parent_exists(path)?;

    let bytes = serde_json::to_vec_pretty(records)?;
    let write_error = |source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    };

    // Dropping the staging file on any early return deletes it.
    let mut staging = staging_file(path).map_err(write_error)?;
    staging.write_all(&bytes).map_err(write_error)?;
    staging
        .persist(path)
        .map_err(|persist| write_error(persist.error))?;

    Ok(ExportReport {
        path: path.to_path_buf(),
        records: records.len(),
        bytes: bytes.len(),
        exported_at: Utc::now(),
    })
}

/// Create a uniquely named staging file next to `path`, e.g.
/// `.players.json.a1B2c3.tmp`.
fn staging_file(path: &Path) -> std::io::Result<NamedTempFile> {
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut prefix = std::ffi::OsString::from(".");
    if let Some(name) = path.file_name() {
        prefix.push(name);
        prefix.push(".");
    }
    tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".tmp")
        .tempfile_in(dir)
}
