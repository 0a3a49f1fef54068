//! Argument parsing helpers and shared output formatting for the quiver CLI.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressStyle};
use quiver_lib::prelude::*;

/// Asset class filter accepted on the command line.
#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum ClassArg {
    Equity,
    Fx,
    Digital,
}

impl From<ClassArg> for AssetClass {
    fn from(arg: ClassArg) -> Self {
        match arg {
            ClassArg::Equity => Self::Equity,
            ClassArg::Fx => Self::Fx,
            ClassArg::Digital => Self::Digital,
        }
    }
}

/// Parse a category string into a Category enum.
pub(crate) fn parse_category(s: &str) -> Result<Category> {
    Ok(s.parse::<Category>()?)
}

/// Parse a granularity string.
pub(crate) fn parse_granularity(s: &str) -> Result<Granularity> {
    Ok(s.parse::<Granularity>()?)
}

/// Parse an optional YYYY-MM-DD date.
pub(crate) fn parse_date(s: Option<&str>) -> Result<Option<NaiveDate>> {
    s.map(|s| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{s}', expected YYYY-MM-DD"))
    })
    .transpose()
}

/// Parse an inclusive date window from optional bounds.
pub(crate) fn parse_window(start: Option<&str>, end: Option<&str>) -> Result<DateWindow> {
    Ok(DateWindow::new(parse_date(start)?, parse_date(end)?)?)
}

/// Resolve a command-line instrument for a category string.
pub(crate) fn parse_key(instrument: &str, category: &str) -> Result<SeriesKey> {
    let category = parse_category(category)?;
    let instrument = Instrument::resolve(&InstrumentInput::from(instrument), category)
        .with_context(|| format!("Invalid instrument '{instrument}' for {category}"))?;
    Ok(SeriesKey::new(instrument, category)?)
}

const PROGRESS_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} series {msg}";

/// A counting progress bar, hidden in quiet mode.
pub(crate) fn progress_bar(len: u64, quiet: bool) -> Result<ProgressBar> {
    if quiet {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(PROGRESS_TEMPLATE)?
            .progress_chars("=>-"),
    );
    Ok(pb)
}

/// Format an optional value, blank when absent.
pub(crate) fn opt<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(String::new, |v| v.to_string())
}
