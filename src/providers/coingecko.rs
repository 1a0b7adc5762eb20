use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::core::provider::{DataUnavailable, RateProvider};
use crate::core::rates::{AssetClass, RateStore};

/// Crypto rate source backed by the CoinGecko `coins/markets` endpoint.
///
/// Only the symbol and current USD price are retained from each market
/// record; everything else in the response is discarded.
pub struct CoinGeckoProvider {
    base_url: String,
    api_key: String,
}

impl CoinGeckoProvider {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        CoinGeckoProvider {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
        }
    }

    async fn fetch(&self) -> Result<RateStore> {
        let url = format!("{}/api/v3/coins/markets", self.base_url);
        debug!("Requesting crypto markets from {}", self.base_url);

        let client = reqwest::Client::builder().user_agent("cambio/1.0").build()?;
        let response = client
            .get(&url)
            .query(&[
                ("vs_currency", "usd"),
                ("order", "market_cap_desc"),
                ("per_page", "250"),
                ("page", "1"),
                ("x_cg_demo_api_key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| anyhow!("Request error fetching crypto markets: {}", e))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error fetching crypto markets: {}",
                response.status()
            ));
        }

        let text = response.text().await?;
        let coins: Vec<MarketCoin> = serde_json::from_str(&text)
            .with_context(|| "Failed to parse crypto markets response".to_string())?;

        let store = RateStore::from_crypto(
            coins
                .into_iter()
                .filter_map(|coin| coin.current_price.map(|price| (coin.symbol, price))),
        );
        debug!("Fetched {} crypto rates", store.len());
        Ok(store)
    }
}

#[derive(Debug, Deserialize)]
struct MarketCoin {
    symbol: String,
    current_price: Option<f64>,
}

#[async_trait]
impl RateProvider for CoinGeckoProvider {
    fn class(&self) -> AssetClass {
        AssetClass::Crypto
    }

    async fn fetch_rates(&self) -> Result<RateStore, DataUnavailable> {
        self.fetch().await.map_err(|source| DataUnavailable {
            class: AssetClass::Crypto,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn create_mock_server(response: ResponseTemplate) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v3/coins/markets"))
            .and(query_param("vs_currency", "usd"))
            .respond_with(response)
            .mount(&mock_server)
            .await;

        mock_server
    }

    #[tokio::test]
    async fn test_successful_crypto_fetch() {
        let mock_response = r#"[
            {"id": "bitcoin", "symbol": "btc", "name": "Bitcoin", "current_price": 50000.0},
            {"id": "ethereum", "symbol": "eth", "name": "Ethereum", "current_price": 2500.0}
        ]"#;
        let mock_server =
            create_mock_server(ResponseTemplate::new(200).set_body_string(mock_response)).await;

        let provider = CoinGeckoProvider::new(&mock_server.uri(), "demokey");
        let store = provider.fetch_rates().await.unwrap();

        assert_eq!(store.class(), AssetClass::Crypto);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("BTC").unwrap().usd_rate, 50000.0);
        assert_eq!(store.get("ETH").unwrap().usd_rate, 2500.0);
    }

    #[tokio::test]
    async fn test_crypto_null_prices_are_skipped() {
        let mock_response = r#"[
            {"id": "bitcoin", "symbol": "btc", "current_price": 50000.0},
            {"id": "dead", "symbol": "ded", "current_price": null}
        ]"#;
        let mock_server =
            create_mock_server(ResponseTemplate::new(200).set_body_string(mock_response)).await;

        let provider = CoinGeckoProvider::new(&mock_server.uri(), "demokey");
        let store = provider.fetch_rates().await.unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.get("DED").is_none());
    }

    #[tokio::test]
    async fn test_crypto_api_key_is_sent_as_query_param() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/coins/markets"))
            .and(query_param("x_cg_demo_api_key", "demokey"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = CoinGeckoProvider::new(&mock_server.uri(), "demokey");
        let store = provider.fetch_rates().await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_crypto_api_error_response() {
        let mock_server = create_mock_server(ResponseTemplate::new(429)).await;

        let provider = CoinGeckoProvider::new(&mock_server.uri(), "demokey");
        let err = provider.fetch_rates().await.unwrap_err();
        assert_eq!(err.class, AssetClass::Crypto);
        assert!(
            err.source
                .to_string()
                .contains("HTTP error fetching crypto markets: 429")
        );
    }

    #[tokio::test]
    async fn test_crypto_api_malformed_response() {
        let mock_response = r#"{"not": "an array"}"#;
        let mock_server =
            create_mock_server(ResponseTemplate::new(200).set_body_string(mock_response)).await;

        let provider = CoinGeckoProvider::new(&mock_server.uri(), "demokey");
        let err = provider.fetch_rates().await.unwrap_err();
        assert!(
            err.source
                .to_string()
                .contains("Failed to parse crypto markets response")
        );
    }
}
