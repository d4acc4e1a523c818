//! Command implementations, one module per mode.

pub mod download;
pub mod list;
pub mod search;
pub mod session;
pub mod update;

use std::path::Path;
use std::sync::Arc;

use playsync_core::{AuditLog, OrchestratorOptions, Reporter};
use tokio_util::sync::CancellationToken;

/// Whether later modes should still run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Stop with a successful exit.
    Stop,
}

/// State shared by the modes that download.
#[derive(Clone)]
pub struct Context {
    pub reporter: Arc<dyn Reporter>,
    pub cancel: CancellationToken,
    pub expansion_files: bool,
    pub jobs: usize,
    /// Directory for the audit logs, if enabled.
    pub audit_dir: Option<std::path::PathBuf>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("expansion_files", &self.expansion_files)
            .field("jobs", &self.jobs)
            .field("audit_dir", &self.audit_dir)
            .finish_non_exhaustive()
    }
}

impl Context {
    pub fn orchestrator_options(&self, dest: &Path) -> OrchestratorOptions {
        OrchestratorOptions {
            dest_dir: dest.to_path_buf(),
            expansion_files: self.expansion_files,
            concurrency: self.jobs,
            audit: self.audit_dir.as_ref().map(AuditLog::new),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted catalog shared by the command tests.

    use async_trait::async_trait;
    use bytes::Bytes;
    use playsync_core::{Catalog, CatalogError, DownloadOptions, NullReporter};
    use playsync_schema::{DownloadBundle, RemoteDetail, SearchResult};
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    use super::Context;

    #[derive(Default)]
    pub(crate) struct StubCatalog {
        pub(crate) versions: HashMap<String, i64>,
        pub(crate) results: Vec<SearchResult>,
    }

    impl StubCatalog {
        pub(crate) fn with_version(mut self, id: &str, version: i64) -> Self {
            self.versions.insert(id.to_string(), version);
            self
        }
    }

    #[async_trait]
    impl Catalog for StubCatalog {
        async fn bulk_details(&self, ids: &[String]) -> Result<Vec<RemoteDetail>, CatalogError> {
            Ok(ids
                .iter()
                .map(|id| match self.versions.get(id) {
                    Some(v) => RemoteDetail {
                        identifier: id.clone(),
                        remote_version: *v,
                    },
                    None => RemoteDetail::missing(id.clone()),
                })
                .collect())
        }

        async fn download(
            &self,
            id: &str,
            _: DownloadOptions,
        ) -> Result<DownloadBundle, CatalogError> {
            if self.versions.contains_key(id) {
                Ok(DownloadBundle {
                    doc_id: id.to_string(),
                    primary: Bytes::from(format!("apk:{id}")),
                    expansion_files: Vec::new(),
                })
            } else {
                Err(CatalogError::NotFound(id.to_string()))
            }
        }

        async fn search(&self, _: &str, _: usize) -> Result<Vec<SearchResult>, CatalogError> {
            Ok(self.results.clone())
        }
    }

    pub(crate) fn context() -> Context {
        Context {
            reporter: Arc::new(NullReporter),
            cancel: CancellationToken::new(),
            expansion_files: false,
            jobs: 1,
            audit_dir: None,
        }
    }
}
