//! Walking subscription segments into the monthly time series

use std::collections::HashMap;

use tracing::debug;

use super::MonthlyMetrics;
use crate::domain::subscription::{SegmentStatus, SubscriptionSegment};
use crate::math::{churn_rate, growth_rate};
use crate::shared::errors::MetricsError;
use crate::shared::types::Month;

/// Derives per-month counts, revenue and rates from the full segment set
pub struct MetricsAggregator;

impl MetricsAggregator {
    pub fn new() -> Self {
        Self
    }

    /// One MonthlyMetrics per calendar month from the earliest segment
    /// start to the latest segment end, chronological, no gaps.
    /// Empty input yields an empty series.
    pub fn aggregate(
        &self,
        segments: &[SubscriptionSegment],
    ) -> Result<Vec<MonthlyMetrics>, MetricsError> {
        validate(segments)?;

        let first = match segments.iter().map(|s| s.start_month).min() {
            Some(month) => month,
            None => return Ok(Vec::new()),
        };
        let last = segments
            .iter()
            .map(|s| s.end_month)
            .max()
            .unwrap_or(first);

        // revenue buckets by the payment's own transaction month,
        // so a payment never counts across segment boundaries
        let mut revenue: HashMap<Month, f64> = HashMap::new();
        for segment in segments {
            for payment in &segment.payments {
                if let Some(amount) = payment.normalized_amount {
                    *revenue.entry(payment.month()).or_insert(0.0) += amount;
                }
            }
        }

        let mut series = Vec::with_capacity((last.index() - first.index() + 1) as usize);
        let mut active_prev: Option<u32> = None;

        for index in first.index()..=last.index() {
            let month = Month::from_index(index);
            let mut active_count = 0;
            let mut new_count = 0;
            let mut reactivated_count = 0;
            let mut churned_count = 0;

            for segment in segments {
                if segment.covers(month) {
                    active_count += 1;
                }
                if segment.start_month == month {
                    if segment.ordinal == 0 {
                        new_count += 1;
                    } else {
                        reactivated_count += 1;
                    }
                }
                if segment.end_month == month && segment.status == SegmentStatus::Churned {
                    churned_count += 1;
                }
            }

            series.push(MonthlyMetrics {
                month,
                active_count,
                new_count,
                churned_count,
                reactivated_count,
                revenue: revenue.get(&month).copied().unwrap_or(0.0),
                growth_rate: active_prev.and_then(|prev| growth_rate(prev, active_count)),
                churn_rate: active_prev.and_then(|prev| churn_rate(churned_count, prev)),
            });
            active_prev = Some(active_count);
        }

        debug!("Aggregated {} months of metrics", series.len());
        Ok(series)
    }
}

impl Default for MetricsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// Upstream invariants: an inverted interval or a payment outside its
/// segment's interval cannot come from valid matcher output.
fn validate(segments: &[SubscriptionSegment]) -> Result<(), MetricsError> {
    for segment in segments {
        if segment.end_month < segment.start_month {
            return Err(MetricsError::InvalidRange(format!(
                "segment for {} ends {} before it starts {}",
                segment.key.subscriber_id, segment.end_month, segment.start_month
            )));
        }
        for payment in &segment.payments {
            if !segment.covers(payment.month()) {
                return Err(MetricsError::InvalidRange(format!(
                    "payment on {} outside segment {}..{}",
                    payment.transaction_date, segment.start_month, segment.end_month
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::domain::payment::{PaymentRecord, SubscriptionKey};
    use crate::domain::subscription::SubscriptionMatcher;

    fn payment(subscriber: &str, y: i32, m: u32, d: u32, amount: Option<f64>) -> PaymentRecord {
        PaymentRecord {
            transaction_date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            subscriber_id: subscriber.to_string(),
            item_id: "X".to_string(),
            currency: "USD".to_string(),
            gross_amount: amount.unwrap_or(10.0),
            normalized_amount: amount,
        }
    }

    fn matched(records: Vec<PaymentRecord>, latest: Month) -> Vec<SubscriptionSegment> {
        SubscriptionMatcher::default().match_records(records, Some(latest))
    }

    #[test]
    fn test_empty_input_yields_empty_series() {
        let series = MetricsAggregator::new().aggregate(&[]).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn test_steady_subscription_counts() {
        let segments = matched(
            vec![
                payment("a", 2019, 1, 1, Some(10.0)),
                payment("a", 2019, 2, 1, Some(10.0)),
                payment("a", 2019, 3, 1, Some(10.0)),
            ],
            Month::new(2019, 3),
        );

        let series = MetricsAggregator::new().aggregate(&segments).unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series[0].month, Month::new(2019, 1));
        assert_eq!(series[0].new_count, 1);
        assert_eq!(series[0].growth_rate, None);
        assert_eq!(series[0].churn_rate, None);
        for row in &series {
            assert_eq!(row.active_count, 1);
            assert_eq!(row.revenue, 10.0);
        }
        assert_eq!(series[1].growth_rate, Some(0.0));
        assert_eq!(series[1].churn_rate, Some(0.0));
    }

    #[test]
    fn test_churn_and_reactivation_land_on_the_right_months() {
        // Jan, Feb, then a gap until May
        let segments = matched(
            vec![
                payment("a", 2019, 1, 1, Some(10.0)),
                payment("a", 2019, 2, 1, Some(10.0)),
                payment("a", 2019, 5, 1, Some(10.0)),
            ],
            Month::new(2019, 5),
        );

        let series = MetricsAggregator::new().aggregate(&segments).unwrap();

        assert_eq!(series.len(), 5);
        let by_month = |m: u32| &series[(m - 1) as usize];
        assert_eq!(by_month(2).churned_count, 1);
        assert_eq!(by_month(5).reactivated_count, 1);
        assert_eq!(by_month(5).new_count, 0);
        assert_eq!(by_month(3).active_count, 0);
        assert_eq!(by_month(4).active_count, 0);
        // March: 0 active out of 1 at the start of the month
        assert_eq!(by_month(3).growth_rate, Some(-1.0));
        // May: no baseline, April had zero active
        assert_eq!(by_month(5).growth_rate, None);
        assert_eq!(by_month(5).churn_rate, None);
    }

    #[test]
    fn test_unconverted_payments_count_but_earn_nothing() {
        let segments = matched(
            vec![
                payment("a", 2019, 1, 1, Some(10.0)),
                payment("b", 2019, 1, 1, None),
            ],
            Month::new(2019, 1),
        );

        let series = MetricsAggregator::new().aggregate(&segments).unwrap();

        assert_eq!(series[0].active_count, 2);
        assert_eq!(series[0].revenue, 10.0);
    }

    #[test]
    fn test_refund_reduces_revenue() {
        let segments = matched(
            vec![
                payment("a", 2019, 1, 1, Some(10.0)),
                payment("a", 2019, 1, 20, Some(-10.0)),
            ],
            Month::new(2019, 1),
        );

        let series = MetricsAggregator::new().aggregate(&segments).unwrap();
        assert_eq!(series[0].revenue, 0.0);
    }

    #[test]
    fn test_active_count_reconciles_month_over_month() {
        let mut records = Vec::new();
        // a: Jan..Jun, b: Jan..Feb then gone, c: joins Apr, b returns May
        for m in 1..=6 {
            records.push(payment("a", 2019, m, 1, Some(10.0)));
        }
        records.push(payment("b", 2019, 1, 1, Some(5.0)));
        records.push(payment("b", 2019, 2, 1, Some(5.0)));
        for m in 5..=6 {
            records.push(payment("b", 2019, m, 1, Some(5.0)));
        }
        for m in 4..=6 {
            records.push(payment("c", 2019, m, 1, Some(7.0)));
        }

        let segments = matched(records, Month::new(2019, 6));
        let series = MetricsAggregator::new().aggregate(&segments).unwrap();

        for window in series.windows(2) {
            let (prev, curr) = (&window[0], &window[1]);
            assert_eq!(
                curr.active_count,
                prev.active_count + curr.new_count + curr.reactivated_count
                    - prev.churned_count,
                "reconciliation failed at {}",
                curr.month
            );
        }
    }

    #[test]
    fn test_idempotent_over_identical_input() {
        let records = vec![
            payment("a", 2019, 1, 1, Some(10.0)),
            payment("b", 2019, 2, 1, Some(5.0)),
            payment("a", 2019, 4, 1, Some(10.0)),
        ];
        let latest = Month::new(2019, 4);

        let first = MetricsAggregator::new()
            .aggregate(&matched(records.clone(), latest))
            .unwrap();
        let second = MetricsAggregator::new()
            .aggregate(&matched(records, latest))
            .unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_inverted_segment_is_rejected() {
        let segment = SubscriptionSegment {
            key: SubscriptionKey {
                subscriber_id: "a".to_string(),
                item_id: "X".to_string(),
            },
            ordinal: 0,
            start_month: Month::new(2019, 5),
            end_month: Month::new(2019, 1),
            status: SegmentStatus::Churned,
            payments: vec![],
        };

        let err = MetricsAggregator::new().aggregate(&[segment]).unwrap_err();
        assert!(matches!(err, MetricsError::InvalidRange(_)));
    }

    #[test]
    fn test_payment_outside_segment_is_rejected() {
        let segment = SubscriptionSegment {
            key: SubscriptionKey {
                subscriber_id: "a".to_string(),
                item_id: "X".to_string(),
            },
            ordinal: 0,
            start_month: Month::new(2019, 1),
            end_month: Month::new(2019, 2),
            status: SegmentStatus::Churned,
            payments: vec![payment("a", 2019, 7, 1, Some(10.0))],
        };

        let err = MetricsAggregator::new().aggregate(&[segment]).unwrap_err();
        assert!(matches!(err, MetricsError::InvalidRange(_)));
    }
}
