//! Rate command implementation.

use crate::config::Settings;
use crate::display::{parse_granularity, parse_window};
use anyhow::Result;
use quiver_lib::prelude::*;
use quiver_lib::{RatePath, RateRow};
use std::path::PathBuf;

fn print_row(row: &RateRow) {
    println!(
        "{:<12} {:>14.6} {:>14.6} {:>14.6} {:>14.6}",
        row.date, row.open, row.high, row.low, row.close
    );
}

/// Print the latest rate, or a range of rates, between two currencies.
pub(crate) async fn show_rate(
    settings: &Settings,
    data_dir: Option<PathBuf>,
    from: &str,
    to: &str,
    granularity: &str,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<()> {
    let granularity = parse_granularity(granularity)?;
    let query = if start.is_none() && end.is_none() {
        RateQuery::Latest
    } else {
        RateQuery::Range(parse_window(start, end)?)
    };

    let store = settings.store(data_dir)?;
    let index = RateIndex::load(&store, granularity).await?;
    let pair = format!("{}/{}", from.to_uppercase(), to.to_uppercase());

    let Some(rates) = index.rate(from, to, query) else {
        println!("No {granularity} rate available for {pair} ({} pairs cached)", index.len());
        return Ok(());
    };
    let path = index.path(from, to).unwrap_or(RatePath::Identity);

    match rates {
        Rates::Identity => println!("{pair} = 1"),
        Rates::Latest(row) => {
            println!("{pair} {} ({path}): {}", row.date, row.close);
        }
        Rates::Range(rows) => {
            println!("{pair} {granularity} ({path})");
            println!(
                "{:<12} {:>14} {:>14} {:>14} {:>14}",
                "DATE", "OPEN", "HIGH", "LOW", "CLOSE"
            );
            println!("{}", "-".repeat(72));
            for row in &rows {
                print_row(row);
            }
            println!("\n{} rows", rows.len());
        }
    }
    Ok(())
}
