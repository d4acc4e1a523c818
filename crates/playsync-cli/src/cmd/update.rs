//! Update command

use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::{Context as _, Result};
use playsync_core::apk::ApkManifestExtractor;
use playsync_core::{Catalog, Orchestrator, Scanner, reconcile};
use playsync_schema::PackageRef;
use tracing::info;

use super::{Context, Flow};
use crate::confirm::{Gate, confirm};

/// Update every archive in `folder` that has a newer catalog version.
///
/// Downloads overwrite the stale archives in place. Returns
/// [`Flow::Stop`] when everything is already up to date.
pub async fn update<C: Catalog, R: BufRead, W: Write>(
    catalog: C,
    folder: &Path,
    yes: bool,
    ctx: &Context,
    input: R,
    mut output: W,
) -> Result<Flow> {
    let scanner = Scanner::new(ApkManifestExtractor, ctx.reporter.clone());
    let inventory = scanner.scan(folder)?;
    if inventory.packages.is_empty() {
        info!(folder = %folder.display(), "No apk to check");
        return Ok(Flow::Continue);
    }

    info!("Checking apks ...");
    let candidates = reconcile(&catalog, &inventory.packages).await?;

    match confirm(&candidates, yes, input, &mut output).context("Failed to read answer")? {
        Gate::UpToDate => return Ok(Flow::Stop),
        Gate::Declined => return Ok(Flow::Continue),
        Gate::Proceed => {}
    }

    info!("Downloading ...");
    let requests: Vec<PackageRef> = candidates.iter().map(|c| c.to_request()).collect();
    let orchestrator = Orchestrator::new(catalog, ctx.reporter.clone(), ctx.orchestrator_options(folder));
    let report = orchestrator.download_all(requests, &ctx.cancel).await?;

    let updated: Vec<String> = report.remaining().into_iter().collect();
    writeln!(output, "Updated: {}", updated.join(" "))?;
    Ok(Flow::Continue)
}
