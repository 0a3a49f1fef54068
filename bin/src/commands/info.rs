//! Info command implementation.
//!
//! Prints the metadata sidecar of a cached series together with a short
//! summary of its rows.

use crate::config::Settings;
use crate::display::{opt, parse_key};
use anyhow::Result;
use std::path::PathBuf;

/// Show the metadata and row summary of a cached series.
pub(crate) async fn show_info(
    settings: &Settings,
    data_dir: Option<PathBuf>,
    instrument: &str,
    category: &str,
) -> Result<()> {
    let key = parse_key(instrument, category)?;
    let store = settings.store(data_dir)?;

    println!("Series:     {key}");
    println!("Folder:     {}", key.instrument.folder_name());
    println!("Endpoint:   {}", key.category.endpoint().function);
    println!("Granularity: {}", key.granularity());

    match store.read_series(&key).await? {
        Some(series) => {
            println!("Rows:       {}", series.len());
            println!("First:      {}", opt(series.first_date()));
            println!("Last:       {}", opt(series.last_date()));
        }
        None => println!("Rows:       not cached"),
    }

    match store.read_metadata(&key).await? {
        Some(record) if !record.is_empty() => {
            println!("\nMetadata:");
            for (field, value) in record.as_map() {
                let value = value.as_str().map_or_else(|| value.to_string(), str::to_string);
                println!("  {field:<24} {value}");
            }
        }
        _ => println!("\nNo metadata recorded."),
    }
    Ok(())
}
