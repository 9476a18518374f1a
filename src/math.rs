// src/math.rs
use crate::shared::types::Month;

/// Gap in whole calendar months between two payments
pub fn month_gap(prev: Month, curr: Month) -> i32 {
    curr.index() - prev.index()
}

/// Relative change of the active count against the prior month.
/// Undefined when there is no prior baseline.
pub fn growth_rate(active_prev: u32, active_curr: u32) -> Option<f64> {
    if active_prev == 0 {
        return None;
    }
    Some((active_curr as f64 - active_prev as f64) / active_prev as f64)
}

/// Churned subscriptions over the active count at the start of the month.
/// Undefined when there is no prior baseline.
pub fn churn_rate(churned: u32, active_prev: u32) -> Option<f64> {
    if active_prev == 0 {
        return None;
    }
    Some(churned as f64 / active_prev as f64)
}

/// Mean over the defined values of a rate series
pub fn mean_defined<I: IntoIterator<Item = Option<f64>>>(values: I) -> Option<f64> {
    let defined: Vec<f64> = values.into_iter().flatten().collect();
    mean(&defined)
}

/// Mean of a slice, None when empty
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_gap() {
        assert_eq!(month_gap(Month::new(2019, 1), Month::new(2019, 2)), 1);
        assert_eq!(month_gap(Month::new(2019, 2), Month::new(2019, 2)), 0);
        assert_eq!(month_gap(Month::new(2018, 12), Month::new(2019, 3)), 3);
        assert_eq!(month_gap(Month::new(2019, 3), Month::new(2019, 1)), -2);
    }

    #[test]
    fn test_growth_rate() {
        assert_eq!(growth_rate(10, 12), Some(0.2));
        assert_eq!(growth_rate(10, 8), Some(-0.2));
        assert_eq!(growth_rate(0, 5), None);
    }

    #[test]
    fn test_churn_rate() {
        assert_eq!(churn_rate(2, 10), Some(0.2));
        assert_eq!(churn_rate(0, 10), Some(0.0));
        assert_eq!(churn_rate(3, 0), None);
    }

    #[test]
    fn test_mean_defined_skips_undefined() {
        let values = vec![Some(0.1), None, Some(0.3)];
        let m = mean_defined(values).unwrap();
        assert!((m - 0.2).abs() < 1e-12);
        assert_eq!(mean_defined(vec![None, None]), None);
    }
}
