//! Exchange-rate provider interface

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::shared::errors::RateError;

/// Result of a single-day rate lookup
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateLookup {
    /// One unit of the quoted currency equals this many units of the base currency
    Available(f64),
    /// The provider has no data for this date (weekend, holiday, unknown currency)
    NotAvailable,
}

/// Historical daily exchange rates against a base currency fixed per run
#[async_trait]
pub trait ExchangeRateProvider: Send + Sync {
    async fn lookup(&self, date: NaiveDate, currency: &str) -> Result<RateLookup, RateError>;
}
