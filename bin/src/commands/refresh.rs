//! Refresh command implementation.
//!
//! Refreshes the named instruments, or the settings watch list, and prints a
//! per-series summary.

use crate::config::Settings;
use crate::display::{opt, parse_key, progress_bar};
use anyhow::{Context, Result, bail};
use futures::StreamExt;
use quiver_lib::prelude::*;
use std::path::PathBuf;

/// Refresh stale series and optionally write a JSON report.
pub(crate) async fn refresh(
    settings: &Settings,
    data_dir: Option<PathBuf>,
    instruments: &[String],
    category: &str,
    max_gap: u32,
    report_path: Option<PathBuf>,
    quiet: bool,
) -> Result<()> {
    let tasks = if instruments.is_empty() {
        settings.watch_tasks()?
    } else {
        instruments
            .iter()
            .map(|instrument| Ok(RefreshTask::new(parse_key(instrument, category)?, max_gap)))
            .collect::<Result<Vec<_>>>()?
    };
    if tasks.is_empty() {
        bail!("Nothing to refresh: pass instruments or add a watchlist to the settings file");
    }

    let store = settings.store(data_dir)?;
    let refresher = Refresher::new(settings.executor()?, store);

    let progress = progress_bar(tasks.len() as u64, quiet)?;
    let mut report = RefreshReport::start();
    {
        let mut outcomes = std::pin::pin!(refresher.refresh_stream(tasks));
        while let Some(outcome) = outcomes.next().await {
            progress.set_message(outcome.key.to_string());
            if let Some(error) = &outcome.error {
                progress.println(format!("{}: {error}", outcome.key));
            }
            progress.inc(1);
            report.record(outcome);
        }
    }
    progress.finish_with_message(format!(
        "{} created, {} updated, {} failed",
        report.count(RefreshStatus::Created),
        report.count(RefreshStatus::Updated),
        report.count(RefreshStatus::Failed)
    ));

    if !quiet {
        println!("{:<36} {:<11} {:>7} {:<10}", "SERIES", "STATUS", "ROWS", "LAST");
        println!("{}", "-".repeat(68));
        for outcome in &report.outcomes {
            println!(
                "{:<36} {:<11} {:>7} {:<10}",
                outcome.key.to_string(),
                outcome.status.as_str(),
                outcome.rows,
                opt(outcome.last_date)
            );
        }
    }

    if let Some(path) = report_path {
        let json = report.to_json()?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        if !quiet {
            println!("Report written to: {}", path.display());
        }
    }

    Ok(())
}
