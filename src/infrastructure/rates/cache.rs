//! Per-run memoization of rate lookups

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;

use super::{ExchangeRateProvider, RateLookup};
use crate::shared::errors::RateError;

/// Wraps a provider with a cache keyed by (date, currency), scoped to one
/// pipeline run. Negative answers are memoized too; transport errors are
/// not, so a retried row may still resolve.
pub struct MemoizedRateProvider<P> {
    inner: P,
    cache: RwLock<HashMap<(NaiveDate, String), RateLookup>>,
}

impl<P: ExchangeRateProvider> MemoizedRateProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub async fn cached_lookups(&self) -> usize {
        self.cache.read().await.len()
    }
}

#[async_trait]
impl<P: ExchangeRateProvider> ExchangeRateProvider for MemoizedRateProvider<P> {
    async fn lookup(&self, date: NaiveDate, currency: &str) -> Result<RateLookup, RateError> {
        let key = (date, currency.to_string());
        if let Some(hit) = self.cache.read().await.get(&key) {
            return Ok(*hit);
        }

        let result = self.inner.lookup(date, currency).await?;
        self.cache.write().await.insert(key, result);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
    }

    impl CountingProvider {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ExchangeRateProvider for CountingProvider {
        async fn lookup(&self, _date: NaiveDate, currency: &str) -> Result<RateLookup, RateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match currency {
                "EUR" => Ok(RateLookup::Available(1.12)),
                _ => Ok(RateLookup::NotAvailable),
            }
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_repeated_lookups_hit_the_inner_provider_once() {
        let provider = MemoizedRateProvider::new(CountingProvider::new());

        for _ in 0..3 {
            let result = provider.lookup(date(2019, 1, 4), "EUR").await.unwrap();
            assert_eq!(result, RateLookup::Available(1.12));
        }

        assert_eq!(provider.inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(provider.cached_lookups().await, 1);
    }

    #[tokio::test]
    async fn test_negative_answers_are_memoized() {
        let provider = MemoizedRateProvider::new(CountingProvider::new());

        for _ in 0..3 {
            let result = provider.lookup(date(2019, 1, 4), "ZZZ").await.unwrap();
            assert_eq!(result, RateLookup::NotAvailable);
        }

        assert_eq!(provider.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_distinct_dates_are_distinct_entries() {
        let provider = MemoizedRateProvider::new(CountingProvider::new());

        provider.lookup(date(2019, 1, 4), "EUR").await.unwrap();
        provider.lookup(date(2019, 1, 5), "EUR").await.unwrap();

        assert_eq!(provider.inner.calls.load(Ordering::SeqCst), 2);
        assert_eq!(provider.cached_lookups().await, 2);
    }
}
