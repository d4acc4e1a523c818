//! Download command

use anyhow::{Context as _, Result};
use playsync_core::{BatchReport, Catalog, Orchestrator};
use playsync_schema::PackageRef;
use std::path::Path;
use tracing::info;

use super::Context;

/// Read identifiers from `path`, one per line; blank lines are ignored.
pub fn load_from_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read package list {}", path.display()))?;
    Ok(parse_package_list(&content))
}

pub fn parse_package_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Download `ids` into `dest`.
pub async fn download<C: Catalog>(
    catalog: C,
    ids: Vec<String>,
    dest: &Path,
    ctx: &Context,
) -> Result<BatchReport> {
    info!(count = ids.len(), dest = %dest.display(), "Downloading packages");
    let requests = ids.into_iter().map(PackageRef::new).collect();
    let orchestrator = Orchestrator::new(
        catalog,
        ctx.reporter.clone(),
        ctx.orchestrator_options(dest),
    );
    let report = orchestrator.download_all(requests, &ctx.cancel).await?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::testing::{StubCatalog, context};
    use tempfile::TempDir;

    #[test]
    fn test_package_list_skips_blank_lines() {
        let ids = parse_package_list("com.a\n\n  com.b  \n\t\ncom.c");
        assert_eq!(ids, vec!["com.a", "com.b", "com.c"]);
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(load_from_file(&dir.path().join("nope.txt")).is_err());
    }

    #[tokio::test]
    async fn test_download_writes_into_dest() {
        let dir = TempDir::new().unwrap();
        let catalog = StubCatalog::default().with_version("com.a", 3);

        let report = download(
            &catalog,
            vec!["com.a".into(), "com.missing".into()],
            dir.path(),
            &context(),
        )
        .await
        .unwrap();

        assert_eq!(report.success().len(), 1);
        assert_eq!(report.unavailable().len(), 1);
        assert_eq!(
            std::fs::read(dir.path().join("com.a.apk")).unwrap(),
            b"apk:com.a"
        );
    }

    #[tokio::test]
    async fn test_audit_logs_when_enabled() {
        let dir = TempDir::new().unwrap();
        let logs = TempDir::new().unwrap();
        let catalog = StubCatalog::default().with_version("com.a", 3);
        let mut ctx = context();
        ctx.audit_dir = Some(logs.path().to_path_buf());

        download(&catalog, vec!["com.a".into()], dir.path(), &ctx)
            .await
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(logs.path().join("apps_downloaded.log")).unwrap(),
            "com.a\n"
        );
    }
}
