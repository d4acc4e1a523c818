//! Batch download orchestration.
//!
//! Every request ends in exactly one [`DownloadOutcome`]; per-item errors are
//! classified and never abort the batch. Only a failed bulk-detail query or
//! an unusable destination directory is fatal.

use std::collections::{BTreeSet, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use futures::StreamExt;
use futures::stream;
use bytes::Bytes;
use playsync_schema::{
    DownloadBundle, DownloadOutcome, PackageRef, format_size, is_plain_file_name,
};
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::Reporter;
use crate::audit::AuditLog;
use crate::catalog::{Catalog, CatalogError, DownloadOptions, check_parity};

/// Appended to the cause of every unavailable package.
const SEARCH_HINT: &str = "this package does not exist, try to search it via --search before";

/// Batch-level failures. Per-item errors end up in the [`BatchReport`].
#[derive(Error, Debug)]
pub enum OrchestrateError {
    #[error("Failed to query catalog details: {0}")]
    Details(#[source] CatalogError),

    #[error("Cannot create download folder {}: {source}", path.display())]
    DestDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Settings for one [`Orchestrator`].
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Folder archives are written into. Created if missing.
    pub dest_dir: PathBuf,
    /// Also fetch and write `.obb` expansion files.
    pub expansion_files: bool,
    /// Downloads in flight at once. `0` is treated as `1`.
    pub concurrency: usize,
    /// Where to write the audit logs, if anywhere.
    pub audit: Option<AuditLog>,
}

impl OrchestratorOptions {
    /// Sequential downloads into `dest_dir`, no expansion files, no audit logs.
    pub fn new(dest_dir: impl Into<PathBuf>) -> Self {
        Self {
            dest_dir: dest_dir.into(),
            expansion_files: false,
            concurrency: 1,
            audit: None,
        }
    }
}

/// Classified result of one batch.
///
/// The success, failed and unavailable sets are disjoint. Requests that were
/// never scheduled because the batch was cancelled land in `cancelled`.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    requested: Vec<PackageRef>,
    outcomes: Vec<DownloadOutcome>,
    success: BTreeSet<String>,
    failed: BTreeSet<String>,
    unavailable: BTreeSet<String>,
    cancelled: BTreeSet<String>,
}

impl BatchReport {
    /// Fold ordered outcomes into the per-category sets.
    pub fn from_outcomes(requested: Vec<PackageRef>, outcomes: Vec<DownloadOutcome>) -> Self {
        let mut report = Self {
            requested,
            ..Self::default()
        };
        for outcome in &outcomes {
            let id = outcome.identifier().to_string();
            match outcome {
                DownloadOutcome::Success(_) => report.success.insert(id),
                DownloadOutcome::Failed(..) => report.failed.insert(id),
                DownloadOutcome::Unavailable(..) => report.unavailable.insert(id),
            };
        }
        report.cancelled = report
            .requested
            .iter()
            .map(|p| &p.identifier)
            .filter(|id| {
                !report.success.contains(*id)
                    && !report.failed.contains(*id)
                    && !report.unavailable.contains(*id)
            })
            .cloned()
            .collect();
        report.outcomes = outcomes;
        report
    }

    pub fn requested(&self) -> &[PackageRef] {
        &self.requested
    }

    /// Outcomes in request order.
    pub fn outcomes(&self) -> &[DownloadOutcome] {
        &self.outcomes
    }

    pub fn success(&self) -> &BTreeSet<String> {
        &self.success
    }

    pub fn failed(&self) -> &BTreeSet<String> {
        &self.failed
    }

    pub fn unavailable(&self) -> &BTreeSet<String> {
        &self.unavailable
    }

    pub fn cancelled(&self) -> &BTreeSet<String> {
        &self.cancelled
    }

    /// Requested identifiers minus everything that did not end up on disk.
    pub fn remaining(&self) -> BTreeSet<String> {
        self.requested
            .iter()
            .map(|p| &p.identifier)
            .filter(|id| {
                !self.failed.contains(*id)
                    && !self.unavailable.contains(*id)
                    && !self.cancelled.contains(*id)
            })
            .cloned()
            .collect()
    }

    /// Failed and unavailable outcomes, in request order.
    pub fn failures(&self) -> impl Iterator<Item = &DownloadOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn is_cancelled(&self) -> bool {
        !self.cancelled.is_empty()
    }
}

/// Drives a batch of downloads against an authenticated catalog session.
pub struct Orchestrator<C> {
    catalog: C,
    reporter: Arc<dyn Reporter>,
    options: OrchestratorOptions,
}

impl<C> std::fmt::Debug for Orchestrator<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<C: Catalog> Orchestrator<C> {
    pub fn new(catalog: C, reporter: Arc<dyn Reporter>, options: OrchestratorOptions) -> Self {
        Self {
            catalog,
            reporter,
            options,
        }
    }

    /// Convenience wrapper for bare identifiers.
    ///
    /// # Errors
    ///
    /// See [`Orchestrator::download_all`].
    pub async fn download_ids<I, S>(
        &self,
        ids: I,
        cancel: &CancellationToken,
    ) -> Result<BatchReport, OrchestrateError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let requests = ids.into_iter().map(PackageRef::new).collect();
        self.download_all(requests, cancel).await
    }

    /// Download every request and classify the result.
    ///
    /// Duplicate identifiers are collapsed to their first occurrence. Once
    /// `cancel` fires no further item is started; items already in flight
    /// finish and are classified.
    ///
    /// # Errors
    ///
    /// [`OrchestrateError::Details`] when the bulk-detail query fails and
    /// [`OrchestrateError::DestDir`] when the destination cannot be created.
    pub async fn download_all(
        &self,
        requests: Vec<PackageRef>,
        cancel: &CancellationToken,
    ) -> Result<BatchReport, OrchestrateError> {
        let mut seen = HashSet::new();
        let requests: Vec<PackageRef> = requests
            .into_iter()
            .filter(|p| seen.insert(p.identifier.clone()))
            .collect();
        if requests.is_empty() {
            return Ok(BatchReport::default());
        }

        let ids: Vec<String> = requests.iter().map(|p| p.identifier.clone()).collect();
        let details = self
            .catalog
            .bulk_details(&ids)
            .await
            .map_err(OrchestrateError::Details)?;
        check_parity(&ids, &details).map_err(OrchestrateError::Details)?;

        let dest = &self.options.dest_dir;
        tokio::fs::create_dir_all(dest)
            .await
            .map_err(|source| OrchestrateError::DestDir {
                path: dest.clone(),
                source,
            })?;

        self.reporter.section("Downloading");
        let started = Instant::now();
        let total = requests.len();

        let outcomes: Vec<DownloadOutcome> = stream::iter(requests.iter().zip(&details).enumerate())
            .take_until(cancel.cancelled())
            .map(|(index, (pkg, detail))| self.fetch_one(index + 1, total, pkg, detail.remote_version))
            .buffered(self.options.concurrency.max(1))
            .collect()
            .await;

        let report = BatchReport::from_outcomes(requests, outcomes);
        if report.is_cancelled() {
            warn!(skipped = report.cancelled().len(), "Batch cancelled");
            self.reporter.warning(&format!(
                "Cancelled, {} package(s) were not attempted",
                report.cancelled().len()
            ));
        }

        if let Some(audit) = &self.options.audit {
            if let Err(e) = audit.write(&report) {
                error!("{e}");
                self.reporter.error(&e.to_string());
            }
        }

        self.print_failed(&report);
        self.reporter.summary(
            report.success().len(),
            "downloaded",
            started.elapsed().as_secs_f64(),
        );
        Ok(report)
    }

    async fn fetch_one(
        &self,
        position: usize,
        total: usize,
        pkg: &PackageRef,
        remote_version: i64,
    ) -> DownloadOutcome {
        let id = pkg.identifier.as_str();
        info!("{position} / {total} {id}");
        self.reporter.item_started(position, total, id);

        let options = DownloadOptions {
            expansion_files: self.options.expansion_files,
        };
        let bundle = match self.catalog.download(id, options).await {
            Ok(bundle) => bundle,
            Err(e) if e.is_not_in_catalog() => {
                debug!(package = id, "Catalog lookup failed: {e}");
                error!("Error while downloading {id} : {SEARCH_HINT}");
                self.reporter.item_failed(id, SEARCH_HINT);
                return DownloadOutcome::Unavailable(pkg.clone(), SEARCH_HINT.to_string());
            }
            Err(e) => {
                error!("Error while downloading {id} : {e}");
                self.reporter.item_failed(id, &e.to_string());
                return DownloadOutcome::Failed(pkg.clone(), e.to_string());
            }
        };

        if let Err(e) = self.write_bundle(pkg, &bundle).await {
            let reason = format!("Error while writing {id} : {e}");
            error!("{reason}");
            self.reporter.item_failed(id, &reason);
            return DownloadOutcome::Failed(pkg.clone(), reason);
        }

        let detail = if remote_version > 0 {
            format!("v{remote_version} {}", format_size(bundle.size()))
        } else {
            format_size(bundle.size())
        };
        self.reporter.item_done(id, &detail);
        DownloadOutcome::Success(id.to_string())
    }

    /// Write the primary archive and its expansion files under the destination.
    ///
    /// Expansion files are moved into place first and the primary archive
    /// last, so a failure never leaves a half-written or missing archive where
    /// a working one used to be.
    async fn write_bundle(&self, pkg: &PackageRef, bundle: &DownloadBundle) -> std::io::Result<()> {
        let mut files = Vec::with_capacity(bundle.expansion_files.len() + 1);
        for obb in &bundle.expansion_files {
            files.push((checked_name(obb.file_name(&bundle.doc_id))?, obb.data.clone()));
        }
        files.push((checked_name(pkg.target_filename())?, bundle.primary.clone()));

        let dest = self.options.dest_dir.clone();
        tokio::task::spawn_blocking(move || write_files(&dest, files))
            .await
            .map_err(std::io::Error::other)?
    }

    fn print_failed(&self, report: &BatchReport) {
        let mut failures = report.failures().peekable();
        if failures.peek().is_none() {
            info!("Download complete");
            return;
        }

        let mut message = String::from("A few packages could not be downloaded :");
        for outcome in failures {
            let (pkg, cause) = match outcome {
                DownloadOutcome::Failed(pkg, cause) | DownloadOutcome::Unavailable(pkg, cause) => {
                    (pkg, cause)
                }
                DownloadOutcome::Success(_) => continue,
            };
            match &pkg.display_filename {
                Some(filename) => message.push_str(&format!("\n{filename} : {}", pkg.identifier)),
                None => message.push_str(&format!("\n{}", pkg.identifier)),
            }
            message.push_str(&format!("\n{cause}\n"));
        }
        error!("{message}");
        self.reporter.error(&message);
    }
}

/// Reject names that would resolve outside the destination directory.
fn checked_name(name: String) -> std::io::Result<String> {
    if is_plain_file_name(&name) {
        Ok(name)
    } else {
        Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("refusing to write '{name}' outside the download folder"),
        ))
    }
}

/// Stage every file in `dest`, then rename each over its target.
fn write_files(dest: &Path, files: Vec<(String, Bytes)>) -> std::io::Result<()> {
    let mut staged = Vec::with_capacity(files.len());
    for (name, data) in files {
        let mut tmp = NamedTempFile::new_in(dest)?;
        tmp.write_all(&data)?;
        tmp.as_file().sync_all()?;
        staged.push((dest.join(name), tmp));
    }
    for (path, tmp) in staged {
        debug!(path = %path.display(), "Writing");
        tmp.persist(&path).map_err(|e| e.error)?;
    }
    Ok(())
}
