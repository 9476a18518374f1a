//! Raw MSR rows into normalized payment records

use chrono::{Duration, NaiveDate};
use tracing::debug;

use super::{PaymentRecord, RawRow};
use crate::infrastructure::rates::{ExchangeRateProvider, RateLookup};
use crate::shared::errors::RowError;

const DATE_FORMATS: [&str; 3] = ["%m/%d/%Y", "%m-%d-%Y", "%Y-%m-%d"];

/// Non-fatal degradation attached to an otherwise valid record
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionWarning {
    pub currency: String,
    pub date: NaiveDate,
    pub detail: String,
}

/// Outcome of normalizing one row
#[derive(Debug)]
pub struct NormalizedRow {
    pub record: PaymentRecord,
    pub warning: Option<ConversionWarning>,
}

/// Parses raw rows and converts amounts into the base currency
pub struct RecordNormalizer<'a> {
    provider: &'a dyn ExchangeRateProvider,
    base_currency: String,
    max_lookback_days: u32,
}

impl<'a> RecordNormalizer<'a> {
    pub fn new(
        provider: &'a dyn ExchangeRateProvider,
        base_currency: impl Into<String>,
        max_lookback_days: u32,
    ) -> Self {
        Self {
            provider,
            base_currency: base_currency.into(),
            max_lookback_days,
        }
    }

    pub fn base_currency(&self) -> &str {
        &self.base_currency
    }

    /// Parse one raw row. A malformed required field fails the row;
    /// a conversion failure only degrades it (normalized amount unset).
    pub async fn normalize(&self, row: &RawRow) -> Result<NormalizedRow, RowError> {
        let date = parse_date(required(&row.date, "date")?)?;
        let subscriber_id = required(&row.subscriber, "subscriber")?.to_string();
        let item_id = match &row.item {
            Some(value) => non_empty(value, "item")?.to_string(),
            None => String::new(),
        };
        let currency = parse_currency(required(&row.currency, "currency")?)?;
        let gross_amount = parse_amount(required(&row.gross, "gross")?)?;

        let (normalized_amount, warning) = self.convert(date, &currency, gross_amount).await;

        Ok(NormalizedRow {
            record: PaymentRecord {
                transaction_date: date,
                subscriber_id,
                item_id,
                currency,
                gross_amount,
                normalized_amount,
            },
            warning,
        })
    }

    /// Resolve a rate for the transaction date, walking back day by day
    /// up to the configured lookback when the exact date has no data.
    async fn convert(
        &self,
        date: NaiveDate,
        currency: &str,
        gross: f64,
    ) -> (Option<f64>, Option<ConversionWarning>) {
        if currency == self.base_currency {
            return (Some(gross), None);
        }

        for offset in 0..=self.max_lookback_days {
            let lookup_date = date - Duration::days(i64::from(offset));
            match self.provider.lookup(lookup_date, currency).await {
                Ok(RateLookup::Available(rate)) => {
                    if offset > 0 {
                        debug!(
                            "No rate for {} on {}, used {} instead",
                            currency, date, lookup_date
                        );
                    }
                    return (Some(gross * rate), None);
                }
                Ok(RateLookup::NotAvailable) => continue,
                Err(e) => {
                    return (
                        None,
                        Some(ConversionWarning {
                            currency: currency.to_string(),
                            date,
                            detail: e.to_string(),
                        }),
                    );
                }
            }
        }

        (
            None,
            Some(ConversionWarning {
                currency: currency.to_string(),
                date,
                detail: format!("no rate within {} days", self.max_lookback_days),
            }),
        )
    }
}

fn required<'v>(value: &'v Option<String>, field: &'static str) -> Result<&'v str, RowError> {
    match value {
        Some(v) => non_empty(v, field),
        None => Err(RowError::MissingField(field)),
    }
}

fn non_empty<'v>(value: &'v str, field: &'static str) -> Result<&'v str, RowError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RowError::MissingField(field));
    }
    Ok(trimmed)
}

/// MSR exports carry dates as M/D/YYYY, M-D-YYYY or YYYY-MM-DD
fn parse_date(value: &str) -> Result<NaiveDate, RowError> {
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Ok(date);
        }
    }
    Err(RowError::BadDate(value.to_string()))
}

/// Gross amounts may carry thousands separators ("1,234.56")
fn parse_amount(value: &str) -> Result<f64, RowError> {
    value
        .replace(',', "")
        .parse::<f64>()
        .map_err(|_| RowError::BadAmount(value.to_string()))
}

fn parse_currency(value: &str) -> Result<String, RowError> {
    if value.len() != 3 || !value.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(RowError::BadCurrency(value.to_string()));
    }
    Ok(value.to_ascii_uppercase())
}
