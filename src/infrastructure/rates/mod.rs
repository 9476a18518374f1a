//! Exchange-rate infrastructure - historical daily rates and caching

mod api_client;
mod cache;
mod provider;

pub use api_client::HistoricalRatesClient;
pub use cache::MemoizedRateProvider;
pub use provider::{ExchangeRateProvider, RateLookup};
