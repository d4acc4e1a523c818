//! Update reconciliation: which local packages have a newer catalog version.

use std::collections::HashSet;

use playsync_schema::{LocalPackage, RemoteDetail, UpdateCandidate};
use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::{Catalog, CatalogError, check_parity};

/// Errors from [`reconcile`].
#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("Failed to query catalog details: {0}")]
    Catalog(#[from] CatalogError),
}

/// Query the catalog once for every local package and return the stale ones.
///
/// The bulk query is a single round trip regardless of inventory size.
/// Candidates come back in input order.
///
/// # Errors
///
/// Returns [`ReconcileError::Catalog`] if the bulk query fails or its answer
/// does not line up with the request.
pub async fn reconcile<C: Catalog + ?Sized>(
    catalog: &C,
    local: &[LocalPackage],
) -> Result<Vec<UpdateCandidate>, ReconcileError> {
    if local.is_empty() {
        return Ok(Vec::new());
    }

    let identifiers: Vec<String> = local.iter().map(|p| p.identifier.clone()).collect();
    let details = catalog.bulk_details(&identifiers).await?;
    check_parity(&identifiers, &details)?;

    let candidates = select_candidates(local, &details);
    info!(
        checked = local.len(),
        stale = candidates.len(),
        "Reconciled local packages against catalog"
    );
    Ok(candidates)
}

/// Pair local packages with their catalog details positionally and keep the
/// ones that need an update.
///
/// Only the first occurrence of an identifier is considered.
pub fn select_candidates(local: &[LocalPackage], remote: &[RemoteDetail]) -> Vec<UpdateCandidate> {
    let mut seen = HashSet::new();
    local
        .iter()
        .zip(remote)
        .filter(|(pkg, _)| seen.insert(pkg.identifier.as_str()))
        .filter_map(|(pkg, detail)| {
            let candidate = UpdateCandidate::evaluate(pkg, detail);
            if candidate.is_none() {
                debug!(
                    package = %pkg.identifier,
                    local = pkg.local_version,
                    remote = detail.remote_version,
                    "Up to date or not in catalog"
                );
            }
            candidate
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DownloadOptions;
    use async_trait::async_trait;
    use playsync_schema::{DownloadBundle, SearchResult};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MapCatalog {
        versions: HashMap<String, i64>,
        calls: AtomicUsize,
    }

    impl MapCatalog {
        fn new(entries: &[(&str, i64)]) -> Self {
            Self {
                versions: entries.iter().map(|(k, v)| ((*k).to_string(), *v)).collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Catalog for MapCatalog {
        async fn bulk_details(&self, ids: &[String]) -> Result<Vec<RemoteDetail>, CatalogError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
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
            Err(CatalogError::NotFound(id.to_string()))
        }
        async fn search(&self, _: &str, _: usize) -> Result<Vec<SearchResult>, CatalogError> {
            Ok(Vec::new())
        }
    }

    fn local(id: &str, version: i64, file: &str) -> LocalPackage {
        LocalPackage {
            identifier: id.to_string(),
            local_version: version,
            filename: file.to_string(),
            filepath: file.into(),
        }
    }

    #[tokio::test]
    async fn test_single_stale_package() {
        let catalog = MapCatalog::new(&[("com.a", 2)]);
        let candidates = reconcile(&catalog, &[local("com.a", 1, "a.apk")])
            .await
            .unwrap();
        assert_eq!(
            candidates,
            vec![UpdateCandidate {
                identifier: "com.a".into(),
                filename: "a.apk".into(),
                local_version: 1,
                remote_version: 2,
            }]
        );
    }

    #[tokio::test]
    async fn test_one_round_trip_and_input_order() {
        let catalog = MapCatalog::new(&[("com.c", 9), ("com.a", 5), ("com.b", 1)]);
        let inventory = [
            local("com.c", 1, "c.apk"),
            local("com.b", 1, "b.apk"),
            local("com.missing", 1, "m.apk"),
            local("com.a", 4, "a.apk"),
        ];
        let candidates = reconcile(&catalog, &inventory).await.unwrap();

        let ids: Vec<&str> = candidates.iter().map(|c| c.identifier.as_str()).collect();
        assert_eq!(ids, vec!["com.c", "com.a"]);
        assert_eq!(catalog.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_inventory_makes_no_call() {
        let catalog = MapCatalog::new(&[]);
        assert!(reconcile(&catalog, &[]).await.unwrap().is_empty());
        assert_eq!(catalog.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_duplicates_reported_once() {
        let inventory = [local("com.a", 1, "a.apk"), local("com.a", 1, "a-copy.apk")];
        let remote = [
            RemoteDetail {
                identifier: "com.a".into(),
                remote_version: 3,
            },
            RemoteDetail {
                identifier: "com.a".into(),
                remote_version: 3,
            },
        ];
        let candidates = select_candidates(&inventory, &remote);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].filename, "a.apk");
    }

    #[test]
    fn test_not_in_catalog_never_selected() {
        for lv in [-5, 0, 1, 1_000_000] {
            let candidates =
                select_candidates(&[local("com.x", lv, "x.apk")], &[RemoteDetail::missing("com.x")]);
            assert!(candidates.is_empty(), "local={lv}");
        }
    }
}
