//! Grouping payments into subscription lifecycle segments

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::{SegmentStatus, SubscriptionSegment};
use crate::domain::payment::{PaymentRecord, SubscriptionKey};
use crate::math::month_gap;
use crate::shared::types::Month;

/// Builds lifecycle segments from an unordered set of payments.
/// Pure over its input; no state survives between runs.
pub struct SubscriptionMatcher {
    gap_tolerance_months: i32,
}

impl SubscriptionMatcher {
    pub fn new(gap_tolerance_months: u32) -> Self {
        Self {
            gap_tolerance_months: gap_tolerance_months as i32,
        }
    }

    /// Group payments by subscriber+item identity and split each ordered
    /// sequence wherever the month gap exceeds the tolerance.
    ///
    /// `latest_report_month` is the most recent month the input reports
    /// cover; a final segment whose last payment falls further back than
    /// the tolerance is closed as churned. When None, the latest payment
    /// month across all records is used.
    pub fn match_records(
        &self,
        records: Vec<PaymentRecord>,
        latest_report_month: Option<Month>,
    ) -> Vec<SubscriptionSegment> {
        let records = dedupe(records);
        let latest =
            match latest_report_month.or_else(|| records.iter().map(|r| r.month()).max()) {
                Some(month) => month,
                None => return Vec::new(),
            };

        let mut groups: HashMap<SubscriptionKey, Vec<PaymentRecord>> = HashMap::new();
        for record in records {
            groups.entry(record.key()).or_default().push(record);
        }

        let mut segments = Vec::new();
        for (key, mut group) in groups {
            // stable sort keeps the original input order on equal dates
            group.sort_by_key(|r| r.transaction_date);
            segments.extend(self.split_group(key, group, latest));
        }

        // group iteration order is not deterministic; the output order is
        segments.sort_by(|a, b| (&a.key, a.ordinal).cmp(&(&b.key, b.ordinal)));
        debug!("Matched {} subscription segments", segments.len());
        segments
    }

    fn split_group(
        &self,
        key: SubscriptionKey,
        group: Vec<PaymentRecord>,
        latest: Month,
    ) -> Vec<SubscriptionSegment> {
        let mut segments = Vec::new();
        let mut ordinal = 0u32;
        let mut open: Vec<PaymentRecord> = Vec::new();

        for record in group {
            if let Some(prev) = open.last() {
                if month_gap(prev.month(), record.month()) > self.gap_tolerance_months {
                    segments.push(close_segment(
                        key.clone(),
                        ordinal,
                        std::mem::take(&mut open),
                        SegmentStatus::Churned,
                    ));
                    ordinal += 1;
                }
            }
            open.push(record);
        }

        if let Some(last) = open.last() {
            let status = if month_gap(last.month(), latest) <= self.gap_tolerance_months {
                SegmentStatus::Active
            } else {
                SegmentStatus::Churned
            };
            segments.push(close_segment(key, ordinal, open, status));
        }

        segments
    }
}

impl Default for SubscriptionMatcher {
    fn default() -> Self {
        Self::new(1)
    }
}

fn close_segment(
    key: SubscriptionKey,
    ordinal: u32,
    payments: Vec<PaymentRecord>,
    status: SegmentStatus,
) -> SubscriptionSegment {
    let start_month = payments[0].month();
    let end_month = payments[payments.len() - 1].month();
    SubscriptionSegment {
        key,
        ordinal,
        start_month,
        end_month,
        status,
        payments,
    }
}

/// Overlapping reports may cover the same month twice; drop exact
/// duplicates, keep non-identical ones as distinct transactions.
fn dedupe(records: Vec<PaymentRecord>) -> Vec<PaymentRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| {
            seen.insert((
                r.subscriber_id.clone(),
                r.item_id.clone(),
                r.transaction_date,
                r.gross_amount.to_bits(),
            ))
        })
        .collect()
}
