//! List command implementation.
//!
//! This module handles listing cached series with an optional asset class filter.

use crate::config::Settings;
use crate::display::ClassArg;
use anyhow::Result;
use quiver_lib::prelude::*;
use std::path::PathBuf;

/// List cached series, optionally restricted to one asset class.
pub(crate) async fn list_series(
    settings: &Settings,
    data_dir: Option<PathBuf>,
    class: Option<ClassArg>,
) -> Result<()> {
    let store = settings.store(data_dir)?;
    let class = class.map(AssetClass::from);
    let keys: Vec<_> = store
        .list_series()
        .await?
        .into_iter()
        .filter(|key| class.is_none_or(|c| key.category.asset_class() == c))
        .collect();

    if keys.is_empty() {
        println!("No cached series in {}", store.root().display());
        return Ok(());
    }

    println!("{:<20} {:<18} {:<8}", "FOLDER", "CATEGORY", "CLASS");
    println!("{}", "-".repeat(48));
    for key in &keys {
        println!(
            "{:<20} {:<18} {:<8}",
            key.instrument.folder_name(),
            key.category.as_str(),
            key.category.asset_class().as_str()
        );
    }

    println!("\nTotal: {} series in {}", keys.len(), store.root().display());
    Ok(())
}
