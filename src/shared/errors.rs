//! Error handling for the application

use thiserror::Error;

/// Row-level parse errors; the offending row is dropped
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Unparseable date: {0}")]
    BadDate(String),

    #[error("Unparseable amount: {0}")]
    BadAmount(String),

    #[error("Invalid currency code: {0}")]
    BadCurrency(String),
}

/// Exchange-rate lookup errors
#[derive(Error, Debug)]
pub enum RateError {
    #[error("Rate request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed rate response: {0}")]
    BadResponse(String),
}

/// Metrics aggregation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricsError {
    #[error("Segment months out of range: {0}")]
    InvalidRange(String),
}

/// General application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Input error: {0}")]
    InputError(String),

    #[error("Rates error: {0}")]
    RatesError(String),

    #[error("Metrics error: {0}")]
    MetricsError(String),
}

impl From<RateError> for AppError {
    fn from(err: RateError) -> Self {
        AppError::RatesError(err.to_string())
    }
}

impl From<MetricsError> for AppError {
    fn from(err: MetricsError) -> Self {
        AppError::MetricsError(err.to_string())
    }
}
