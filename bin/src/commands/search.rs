//! Search command implementation.

use crate::config::Settings;
use anyhow::{Result, bail};
use quiver_lib::prelude::*;

/// Search the provider for symbols matching `keywords`.
pub(crate) async fn search(settings: &Settings, keywords: &str) -> Result<()> {
    if keywords.trim().is_empty() {
        bail!("Provide keywords to search for, e.g. a ticker, a name or an ISIN");
    }
    let executor = settings.executor()?;
    let provider = executor.config().provider.clone();

    let matches = match executor.search(keywords, &provider).await? {
        FetchOutcome::Ready(matches) => matches,
        FetchOutcome::Empty => {
            println!("No matches for '{keywords}'.");
            return Ok(());
        }
        FetchOutcome::Throttled { attempts } => {
            bail!("Provider still throttling after {attempts} attempts, try again later");
        }
    };

    let field = |m: &quiver_lib::SearchMatch, name: &str| {
        m.fields()
            .get(name)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    };

    println!(
        "{:<14} {:<40} {:<18} {:<6} {:>6}",
        "SYMBOL", "NAME", "REGION", "CCY", "SCORE"
    );
    println!("{}", "-".repeat(88));
    for m in &matches {
        println!(
            "{:<14} {:<40} {:<18} {:<6} {:>6.2}",
            m.symbol().unwrap_or_default(),
            m.name().unwrap_or_default(),
            field(m, "region"),
            field(m, "currency"),
            m.score().unwrap_or_default()
        );
    }
    Ok(())
}
