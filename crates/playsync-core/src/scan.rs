//! Local inventory scanning.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use playsync_schema::{APK_EXTENSION, LocalPackage};
use thiserror::Error;
use tracing::{info, warn};

use crate::Reporter;
use crate::apk::MetadataExtractor;

/// Errors that abort a scan.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Cannot read directory {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// List archive filenames in `dir`, in directory listing order.
///
/// # Errors
///
/// Returns [`ScanError::ReadDir`] if the directory cannot be listed.
pub fn list_archives(dir: &Path) -> Result<Vec<String>, ScanError> {
    let wrap = |source| ScanError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(wrap)? {
        let entry = entry.map_err(wrap)?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == APK_EXTENSION) {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(names)
}

/// Result of a scan: readable packages plus archives that were skipped.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Readable archives, in directory listing order.
    pub packages: Vec<LocalPackage>,
    /// `(filename, reason)` for archives whose metadata could not be read.
    pub skipped: Vec<(String, String)>,
}

/// Builds [`LocalPackage`] records for every archive in a directory.
pub struct Scanner<E> {
    extractor: E,
    reporter: Arc<dyn Reporter>,
}

impl<E> std::fmt::Debug for Scanner<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner").finish_non_exhaustive()
    }
}

impl<E: MetadataExtractor> Scanner<E> {
    /// Scanner reading metadata with `extractor`.
    pub fn new(extractor: E, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            extractor,
            reporter,
        }
    }

    /// Scan `dir`.
    ///
    /// An archive whose metadata cannot be extracted is skipped with a
    /// warning; it does not abort the scan.
    ///
    /// # Errors
    ///
    /// Fails only when the directory itself cannot be read.
    pub fn scan(&self, dir: &Path) -> Result<ScanReport, ScanError> {
        let mut report = ScanReport::default();

        for filename in list_archives(dir)? {
            let filepath = dir.join(&filename);
            info!("Analyzing {}", filepath.display());

            match self.extractor.extract(&filepath) {
                Ok(meta) => report.packages.push(LocalPackage {
                    identifier: meta.package,
                    local_version: meta.version_code,
                    filename,
                    filepath,
                }),
                Err(e) => {
                    warn!(file = %filepath.display(), "Skipping archive: {e}");
                    self.reporter
                        .warning(&format!("Skipping {filename}: {e}"));
                    report.skipped.push((filename, e.to_string()));
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NullReporter;
    use crate::apk::ApkManifestExtractor;
    use crate::apk::MAX_MANIFEST_BYTES;
    use crate::apk::fixtures::{write_apk, write_apk_with_manifest};
    use tempfile::TempDir;

    fn scanner() -> Scanner<ApkManifestExtractor> {
        Scanner::new(ApkManifestExtractor, Arc::new(NullReporter))
    }

    #[test]
    fn test_list_only_apk_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.apk"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();
        std::fs::write(dir.path().join("b.apk.part"), b"").unwrap();
        std::fs::create_dir(dir.path().join("dir.apk")).unwrap();

        assert_eq!(list_archives(dir.path()).unwrap(), vec!["a.apk".to_string()]);
    }

    #[test]
    fn test_scan_extracts_identity() {
        let dir = TempDir::new().unwrap();
        write_apk(&dir.path().join("a.apk"), "com.a", 1);

        let report = scanner().scan(dir.path()).unwrap();
        assert_eq!(
            report.packages,
            vec![LocalPackage {
                identifier: "com.a".into(),
                local_version: 1,
                filename: "a.apk".into(),
                filepath: dir.path().join("a.apk"),
            }]
        );
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_scan_skips_malformed_archive() {
        let dir = TempDir::new().unwrap();
        write_apk(&dir.path().join("good.apk"), "com.good", 3);
        std::fs::write(dir.path().join("bad.apk"), b"garbage").unwrap();

        let report = scanner().scan(dir.path()).unwrap();
        assert_eq!(report.packages.len(), 1);
        assert_eq!(report.packages[0].identifier, "com.good");
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].0, "bad.apk");
    }

    #[test]
    fn test_scan_skips_oversized_manifest() {
        let dir = TempDir::new().unwrap();
        write_apk(&dir.path().join("good.apk"), "com.good", 3);
        let oversized = vec![0u8; MAX_MANIFEST_BYTES as usize + 1];
        write_apk_with_manifest(&dir.path().join("huge.apk"), &oversized);

        let report = scanner().scan(dir.path()).unwrap();
        assert_eq!(report.packages.len(), 1);
        assert_eq!(report.packages[0].identifier, "com.good");
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].0, "huge.apk");
        assert!(report.skipped[0].1.contains("too large"));
    }

    #[test]
    fn test_missing_directory_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = scanner().scan(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, ScanError::ReadDir { .. }));
    }
}
