pub mod coingecko;
pub mod exchange_rate_api;

pub use coingecko::CoinGeckoProvider;
pub use exchange_rate_api::ExchangeRateApiProvider;
