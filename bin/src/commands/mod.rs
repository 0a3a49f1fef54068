//! CLI command implementations.

pub(crate) mod currencies;
pub(crate) mod enrich;
pub(crate) mod info;
pub(crate) mod list;
pub(crate) mod rate;
pub(crate) mod refresh;
pub(crate) mod search;
pub(crate) mod show;
