use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::core::provider::{DataUnavailable, RateProvider};
use crate::core::rates::{AssetClass, RateStore};

/// Fiat rate source backed by the exchangerate-api `latest/USD` endpoint.
///
/// The response maps each currency code to units of that currency per 1 USD;
/// normalization to USD-per-unit happens in [`RateStore::from_fiat`].
pub struct ExchangeRateApiProvider {
    base_url: String,
    api_key: String,
}

impl ExchangeRateApiProvider {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        ExchangeRateApiProvider {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
        }
    }

    async fn fetch(&self) -> Result<RateStore> {
        let url = format!("{}/v6/{}/latest/USD", self.base_url, self.api_key);
        debug!("Requesting fiat rates from {}", self.base_url);

        let client = reqwest::Client::builder().user_agent("cambio/1.0").build()?;
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error fetching fiat rates: {}", e))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error fetching fiat rates: {}",
                response.status()
            ));
        }

        let text = response.text().await?;
        let data: FiatRatesResponse = serde_json::from_str(&text)
            .with_context(|| "Failed to parse fiat rates response".to_string())?;

        // serde_json's preserve_order keeps the provider's code ordering
        let store = RateStore::from_fiat(
            data.conversion_rates
                .into_iter()
                .filter_map(|(code, value)| value.as_f64().map(|rate| (code, rate))),
        );
        debug!("Fetched {} fiat rates", store.len());
        Ok(store)
    }
}

#[derive(Debug, Deserialize)]
struct FiatRatesResponse {
    conversion_rates: serde_json::Map<String, serde_json::Value>,
}

#[async_trait]
impl RateProvider for ExchangeRateApiProvider {
    fn class(&self) -> AssetClass {
        AssetClass::Fiat
    }

    async fn fetch_rates(&self) -> Result<RateStore, DataUnavailable> {
        self.fetch().await.map_err(|source| DataUnavailable {
            class: AssetClass::Fiat,
            source,
        })
    }
}
