//! Enrich command implementation.

use crate::config::Settings;
use anyhow::Result;
use quiver_lib::prelude::*;
use std::path::PathBuf;

/// Fill existing equity metadata sidecars with symbol search results.
pub(crate) async fn enrich(
    settings: &Settings,
    data_dir: Option<PathBuf>,
    symbols: &[String],
    quiet: bool,
) -> Result<()> {
    let refresher = Refresher::new(settings.executor()?, settings.store(data_dir)?);
    let written = refresher.enrich_metadata(symbols).await?;
    if !quiet {
        println!("Updated {written} metadata files");
    }
    Ok(())
}
