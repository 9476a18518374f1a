// src/report.rs
use serde::{Deserialize, Serialize};

use crate::domain::metrics::MonthlyMetrics;
use crate::domain::subscription::{SegmentStatus, SubscriptionSegment};
use crate::math::{mean, mean_defined};

/// One subscription segment as an output row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRow {
    pub subscriber: String,
    pub item: String,
    /// 0 for a first subscription, >0 for a reactivation
    pub ordinal: u32,
    pub start_month: String,
    pub end_month: String,
    pub length_months: u32,
    pub payment_count: usize,
    /// Lifetime total in the base currency, converted payments only
    pub gross_total: f64,
    pub status: SegmentStatus,
}

/// Whole-run averages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub segment_count: usize,
    pub average_length_months: Option<f64>,
    pub average_gross: Option<f64>,
    pub average_growth_rate: Option<f64>,
    pub average_churn_rate: Option<f64>,
}

/// Everything one run hands to the consumer side; the monthly series is
/// the interface the visualization step works from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub base_currency: String,
    pub months: Vec<MonthlyMetrics>,
    pub subscriptions: Vec<SubscriptionRow>,
    pub summary: SummaryStats,
}

impl AnalysisReport {
    pub fn build(
        base_currency: impl Into<String>,
        segments: &[SubscriptionSegment],
        months: Vec<MonthlyMetrics>,
    ) -> Self {
        let subscriptions: Vec<SubscriptionRow> = segments
            .iter()
            .map(|segment| SubscriptionRow {
                subscriber: segment.key.subscriber_id.clone(),
                item: segment.key.item_id.clone(),
                ordinal: segment.ordinal,
                start_month: segment.start_month.to_string(),
                end_month: segment.end_month.to_string(),
                length_months: segment.length_months(),
                payment_count: segment.payments.len(),
                gross_total: segment.gross_total(),
                status: segment.status,
            })
            .collect();

        let lengths: Vec<f64> = subscriptions
            .iter()
            .map(|s| s.length_months as f64)
            .collect();
        let grosses: Vec<f64> = subscriptions.iter().map(|s| s.gross_total).collect();
        let summary = SummaryStats {
            segment_count: subscriptions.len(),
            average_length_months: mean(&lengths),
            average_gross: mean(&grosses),
            average_growth_rate: mean_defined(months.iter().map(|m| m.growth_rate)),
            average_churn_rate: mean_defined(months.iter().map(|m| m.churn_rate)),
        };

        Self {
            base_currency: base_currency.into(),
            months,
            subscriptions,
            summary,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
