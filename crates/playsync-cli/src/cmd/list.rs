//! List command

use anyhow::{Context, Result};
use playsync_core::scan::list_archives;
use std::path::Path;

/// Print every archive filename in `folder`, one per line.
pub fn list(folder: &Path) -> Result<()> {
    let names = list_archives(folder).context("Failed to list folder")?;
    for name in names {
        println!("{name}");
    }
    Ok(())
}
