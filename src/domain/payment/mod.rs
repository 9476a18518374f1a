//! Payment domain - normalized payment records and their identity

mod normalizer;

pub use normalizer::{ConversionWarning, NormalizedRow, RecordNormalizer};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::shared::types::Month;

/// One raw MSR row after column mapping, before parsing.
/// `item` is None when no item column is configured for the run;
/// all payments then share an empty item identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    pub date: Option<String>,
    pub subscriber: Option<String>,
    pub item: Option<String>,
    pub currency: Option<String>,
    pub gross: Option<String>,
    pub source: String,
    pub line: u64,
}

/// Identity payments are matched under
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionKey {
    pub subscriber_id: String,
    pub item_id: String,
}

/// One normalized MSR payment row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub transaction_date: NaiveDate,
    pub subscriber_id: String,
    pub item_id: String,
    pub currency: String,
    pub gross_amount: f64,
    /// Base-currency amount, set only after a successful conversion
    pub normalized_amount: Option<f64>,
}

impl PaymentRecord {
    pub fn key(&self) -> SubscriptionKey {
        SubscriptionKey {
            subscriber_id: self.subscriber_id.clone(),
            item_id: self.item_id.clone(),
        }
    }

    pub fn month(&self) -> Month {
        Month::from_date(self.transaction_date)
    }
}
