//! Currencies command implementation.

use crate::display::ClassArg;
use quiver_lib::prelude::*;
use quiver_lib::Currency;

/// List known currency codes, optionally filtered by class or pattern.
pub(crate) fn list_currencies(class: Option<ClassArg>, search: Option<&str>) {
    let registry = CurrencyRegistry::global();

    let mut currencies: Vec<&Currency> = match search {
        Some(pattern) => registry.search(pattern),
        None => registry.physical().chain(registry.digital()).collect(),
    };
    match class {
        Some(ClassArg::Fx) => currencies.retain(|c| !c.is_digital()),
        Some(ClassArg::Digital) => currencies.retain(|c| c.is_digital()),
        Some(ClassArg::Equity) => currencies.clear(),
        None => {}
    }
    currencies.sort_by(|a, b| a.code().cmp(b.code()));

    if currencies.is_empty() {
        println!("No currencies found.");
        return;
    }

    println!("{:<8} {:<32} {:<8}", "CODE", "NAME", "KIND");
    println!("{}", "-".repeat(50));
    for currency in &currencies {
        println!(
            "{:<8} {:<32} {:<8}",
            currency.code(),
            currency.name(),
            currency.kind().as_str()
        );
    }
    println!("\nTotal: {} currencies", currencies.len());
}
