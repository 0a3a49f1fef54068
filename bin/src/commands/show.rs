//! Show command implementation.

use crate::config::Settings;
use crate::display::{opt, parse_key, parse_window};
use anyhow::{Result, bail};
use std::path::PathBuf;

/// Print cached rows of one series inside an optional date window.
pub(crate) async fn show_series(
    settings: &Settings,
    data_dir: Option<PathBuf>,
    instrument: &str,
    category: &str,
    start: Option<&str>,
    end: Option<&str>,
    tail: Option<usize>,
) -> Result<()> {
    let key = parse_key(instrument, category)?;
    let window = parse_window(start, end)?;
    let store = settings.store(data_dir)?;

    let Some(series) = store.read_series(&key).await? else {
        bail!("No cached data for {key}");
    };

    let rows: Vec<_> = series.window(&window).collect();
    let skip = tail.map_or(0, |n| rows.len().saturating_sub(n));
    let schema = series.schema();

    println!("{}", schema.header().join("\t"));
    for row in &rows[skip..] {
        let mut cells = vec![
            row.date.to_string(),
            row.open.to_string(),
            row.high.to_string(),
            row.low.to_string(),
            row.close.to_string(),
        ];
        if schema.has_volume {
            cells.push(opt(row.volume));
        }
        cells.extend(row.extra.iter().map(|v| opt(*v)));
        println!("{}", cells.join("\t"));
    }

    println!("\n{} of {} rows ({window})", rows.len() - skip, series.len());
    Ok(())
}
