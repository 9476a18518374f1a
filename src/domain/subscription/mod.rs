//! Subscription domain - lifecycle segments reconstructed from payments

mod matcher;

pub use matcher::SubscriptionMatcher;

use serde::{Deserialize, Serialize};

use crate::domain::payment::{PaymentRecord, SubscriptionKey};
use crate::shared::types::Month;

/// Segment state at the end of its interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentStatus {
    Active,
    Churned,
}

/// One continuous active interval of a subscription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionSegment {
    pub key: SubscriptionKey,
    /// 0 for the key's first segment, >0 for reactivations
    pub ordinal: u32,
    pub start_month: Month,
    pub end_month: Month,
    pub status: SegmentStatus,
    pub payments: Vec<PaymentRecord>,
}

impl SubscriptionSegment {
    pub fn covers(&self, month: Month) -> bool {
        self.start_month <= month && month <= self.end_month
    }

    pub fn length_months(&self) -> u32 {
        (self.end_month.index() - self.start_month.index() + 1) as u32
    }

    /// Sum of successfully converted payment amounts
    pub fn gross_total(&self) -> f64 {
        self.payments
            .iter()
            .filter_map(|p| p.normalized_amount)
            .sum()
    }
}
