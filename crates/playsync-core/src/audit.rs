//! Audit logs for batch downloads.
//!
//! Three plain text files, one identifier per line, sorted. Each file is fully
//! rewritten per batch through a temp file and rename.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::info;

use crate::orchestrate::BatchReport;

/// Identifiers downloaded successfully.
pub const DOWNLOADED_LOG: &str = "apps_downloaded.log";
/// Identifiers that failed for any other reason.
pub const FAILED_LOG: &str = "apps_failed.log";
/// Identifiers the catalog does not know.
pub const NOT_AVAILABLE_LOG: &str = "apps_not_available.log";

/// Failure to rewrite one of the log files.
#[derive(Error, Debug)]
pub enum AuditLogError {
    #[error("Failed to write audit log {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Writer for the per-batch audit files in a directory.
#[derive(Debug, Clone)]
pub struct AuditLog {
    dir: PathBuf,
}

impl AuditLog {
    /// Logs written into `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the three category files for `report`.
    ///
    /// Empty categories leave their file untouched.
    ///
    /// # Errors
    ///
    /// Returns [`AuditLogError::Write`] naming the first file that could not
    /// be written.
    pub fn write(&self, report: &BatchReport) -> Result<(), AuditLogError> {
        let categories = [
            (DOWNLOADED_LOG, report.success()),
            (FAILED_LOG, report.failed()),
            (NOT_AVAILABLE_LOG, report.unavailable()),
        ];

        for (name, ids) in categories {
            if ids.is_empty() {
                continue;
            }
            let path = self.dir.join(name);
            write_sorted(&path, ids).map_err(|source| AuditLogError::Write {
                path: path.clone(),
                source,
            })?;
            info!(path = %path.display(), entries = ids.len(), "Wrote audit log");
        }
        Ok(())
    }
}

fn write_sorted(path: &Path, ids: &BTreeSet<String>) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    for id in ids {
        writeln!(tmp, "{id}")?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
