//! On-disk token cache: a single `"<token> <session_id>"` line.

use std::io::Write;
use std::path::{Path, PathBuf};

use playsync_schema::SessionCredential;
use tempfile::NamedTempFile;
use tracing::warn;

use super::TokenError;

/// Persists the last issued credential across invocations.
#[derive(Debug, Clone)]
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    /// Cache stored at `path`. Nothing is read until [`TokenCache::read_cached`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cached pair.
    ///
    /// A missing, empty or malformed file is a cache miss; it is logged and
    /// never reported as an error.
    pub fn read_cached(&self) -> Option<SessionCredential> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %self.path.display(), "Token cache unreadable: {e}");
                return None;
            }
        };

        let first_line = content.lines().next().unwrap_or_default();
        let cred = SessionCredential::from_line(first_line);
        if cred.is_none() {
            warn!(path = %self.path.display(), "Token cache is empty or corrupted");
        }
        cred
    }

    /// Overwrite the cache with `cred`.
    ///
    /// The line is written to a temporary file next to the cache and renamed
    /// into place, so a concurrent reader sees either the old or the new pair.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::CacheWrite`] if the directory cannot be created
    /// or the file cannot be written.
    pub fn write_cached(&self, cred: &SessionCredential) -> Result<(), TokenError> {
        let wrap = |source: std::io::Error| TokenError::CacheWrite {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(wrap)?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(wrap)?;
        tmp.write_all(cred.to_line().as_bytes()).map_err(wrap)?;
        tmp.as_file().sync_all().map_err(wrap)?;
        tmp.persist(&self.path).map_err(|e| wrap(e.error))?;
        Ok(())
    }
}
