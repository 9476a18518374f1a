//! Metrics domain - monthly aggregates over subscription segments

mod aggregator;

pub use aggregator::MetricsAggregator;

use serde::{Deserialize, Serialize};

use crate::shared::types::Month;

/// One row of the monthly output time series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyMetrics {
    pub month: Month,
    pub active_count: u32,
    pub new_count: u32,
    pub churned_count: u32,
    pub reactivated_count: u32,
    /// Sum of base-currency amounts of this month's payments;
    /// unconverted payments do not contribute
    pub revenue: f64,
    /// None for the first month and whenever the prior active count is zero
    pub growth_rate: Option<f64>,
    pub churn_rate: Option<f64>,
}
