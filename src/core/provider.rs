//! Rate source abstractions

use crate::core::rates::{AssetClass, RateStore};
use async_trait::async_trait;
use thiserror::Error;

/// Failure to fetch or parse a rate source. Callers log this and degrade to
/// an empty picker; it never aborts the session and never leaves a partial
/// store behind.
#[derive(Debug, Error)]
#[error("rate data unavailable for {class}: {source}")]
pub struct DataUnavailable {
    pub class: AssetClass,
    #[source]
    pub source: anyhow::Error,
}

#[async_trait]
pub trait RateProvider: Send + Sync {
    /// The asset class this provider serves.
    fn class(&self) -> AssetClass;

    /// Fetches and normalizes the full rate list for this provider's class.
    async fn fetch_rates(&self) -> Result<RateStore, DataUnavailable>;
}
