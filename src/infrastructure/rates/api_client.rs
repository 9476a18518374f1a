//! Historical exchange-rate API client

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::{ExchangeRateProvider, RateLookup};
use crate::shared::errors::RateError;

/// Response shape of exchangeratesapi.io-style historical endpoints
#[derive(Debug, Deserialize)]
struct RatesResponse {
    rates: HashMap<String, f64>,
}

/// Fetches the daily rate from `{base_url}/{date}?base={currency}&symbols={base_currency}`
/// and reads the base-currency entry out of the `rates` map.
pub struct HistoricalRatesClient {
    http_client: Client,
    base_url: String,
    base_currency: String,
}

impl HistoricalRatesClient {
    pub fn new(base_url: impl Into<String>, base_currency: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.into(),
            base_currency: base_currency.into(),
        }
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        base_currency: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RateError> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url: base_url.into(),
            base_currency: base_currency.into(),
        })
    }
}

#[async_trait]
impl ExchangeRateProvider for HistoricalRatesClient {
    async fn lookup(&self, date: NaiveDate, currency: &str) -> Result<RateLookup, RateError> {
        let url = format!(
            "{}/{}?base={}&symbols={}",
            self.base_url,
            date.format("%Y-%m-%d"),
            currency,
            self.base_currency
        );
        debug!("Fetching exchange rate from: {}", url);

        let response = self.http_client.get(&url).send().await?;
        let status = response.status();

        // the API answers 400/404 for unknown currencies and uncovered dates
        if status == StatusCode::BAD_REQUEST || status == StatusCode::NOT_FOUND {
            return Ok(RateLookup::NotAvailable);
        }
        if !status.is_success() {
            return Err(RateError::BadResponse(format!(
                "unexpected status {} for {}",
                status, url
            )));
        }

        let body: RatesResponse = response.json().await?;
        match body.rates.get(&self.base_currency) {
            Some(rate) if rate.is_finite() && *rate > 0.0 => Ok(RateLookup::Available(*rate)),
            Some(rate) => Err(RateError::BadResponse(format!(
                "non-positive rate {} for {}",
                rate, currency
            ))),
            None => Ok(RateLookup::NotAvailable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_lookup_reads_rate_from_response() {
        let _mock = mockito::mock("GET", Matcher::Regex(r"^/2019-01-04\?.*$".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"base":"EUR","date":"2019-01-04","rates":{"USD":1.1391}}"#)
            .create();

        let client = HistoricalRatesClient::new(mockito::server_url(), "USD");
        let result = client.lookup(date(2019, 1, 4), "EUR").await.unwrap();

        assert_eq!(result, RateLookup::Available(1.1391));
    }

    #[tokio::test]
    async fn test_lookup_missing_symbol_is_not_available() {
        let _mock = mockito::mock("GET", Matcher::Regex(r"^/2019-02-08\?.*$".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"base":"EUR","date":"2019-02-08","rates":{}}"#)
            .create();

        let client = HistoricalRatesClient::new(mockito::server_url(), "USD");
        let result = client.lookup(date(2019, 2, 8), "EUR").await.unwrap();

        assert_eq!(result, RateLookup::NotAvailable);
    }

    #[tokio::test]
    async fn test_lookup_client_error_is_not_available() {
        let _mock = mockito::mock("GET", Matcher::Regex(r"^/2019-01-05\?.*$".to_string()))
            .with_status(400)
            .with_body(r#"{"error":"Symbols 'ZZZ' are invalid"}"#)
            .create();

        let client = HistoricalRatesClient::new(mockito::server_url(), "USD");
        let result = client.lookup(date(2019, 1, 5), "ZZZ").await.unwrap();

        assert_eq!(result, RateLookup::NotAvailable);
    }

    #[tokio::test]
    async fn test_lookup_server_error_fails() {
        let _mock = mockito::mock("GET", Matcher::Regex(r"^/2019-01-06\?.*$".to_string()))
            .with_status(500)
            .create();

        let client = HistoricalRatesClient::new(mockito::server_url(), "USD");
        let err = client.lookup(date(2019, 1, 6), "EUR").await.unwrap_err();

        assert!(matches!(err, RateError::BadResponse(_)));
    }
}
