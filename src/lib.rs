//! Subtally - subscription analytics over PayPal Monthly Sales Reports
//! Built with Domain-Driven Design principles

pub mod app;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod math;
pub mod report;
pub mod shared;

// Re-export main types for convenience
pub use application::Pipeline;
pub use domain::metrics::MetricsAggregator;
pub use domain::payment::RecordNormalizer;
pub use domain::subscription::SubscriptionMatcher;
pub use infrastructure::rates::{ExchangeRateProvider, MemoizedRateProvider};
pub use report::AnalysisReport;
