use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::Path};

#[derive(Debug, Clone, Deserialize)]
pub struct InputCfg {
    pub folder: String,
    #[serde(default = "default_filename_pattern")]
    pub filename_pattern: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnsCfg {
    #[serde(default = "default_date_column")]
    pub date: String,
    #[serde(default = "default_subscriber_column")]
    pub subscriber: String,
    /// No item column means all payments share one item identity,
    /// i.e. subscriptions are matched per payer
    #[serde(default)]
    pub item: Option<String>,
    #[serde(default = "default_currency_column")]
    pub currency: String,
    #[serde(default = "default_gross_column")]
    pub gross: String,
    /// Transaction-type filter; empty column name disables it
    #[serde(default = "default_filter_column")]
    pub filter: Option<String>,
    #[serde(default = "default_filter_value")]
    pub filter_value: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ReportCfg {
    /// Reporting currency; None or empty means the first currency seen
    #[serde(default)]
    pub base_currency: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingCfg {
    #[serde(default = "default_gap_tolerance")]
    pub gap_tolerance_months: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RatesCfg {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_lookback")]
    pub max_lookback_days: u32,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub input: InputCfg,
    #[serde(default)]
    pub columns: ColumnsCfg,
    #[serde(default)]
    pub report: ReportCfg,
    #[serde(default)]
    pub matching: MatchingCfg,
    #[serde(default)]
    pub rates: RatesCfg,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = fs::read_to_string(path.as_ref())?;
        let cfg: Self = toml::from_str(&s).context("parse Config.toml")?;
        Ok(cfg)
    }
}

impl Default for ColumnsCfg {
    fn default() -> Self {
        Self {
            date: default_date_column(),
            subscriber: default_subscriber_column(),
            item: None,
            currency: default_currency_column(),
            gross: default_gross_column(),
            filter: default_filter_column(),
            filter_value: default_filter_value(),
        }
    }
}

impl Default for MatchingCfg {
    fn default() -> Self {
        Self {
            gap_tolerance_months: default_gap_tolerance(),
        }
    }
}

impl Default for RatesCfg {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            max_lookback_days: default_lookback(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_filename_pattern() -> String {
    "MSR-*.CSV".to_string()
}

fn default_date_column() -> String {
    "Date".to_string()
}

fn default_subscriber_column() -> String {
    "From Email Address".to_string()
}

fn default_currency_column() -> String {
    "Currency".to_string()
}

fn default_gross_column() -> String {
    "Gross".to_string()
}

fn default_filter_column() -> Option<String> {
    Some("Description".to_string())
}

fn default_filter_value() -> Option<String> {
    Some("Subscription Payment".to_string())
}

fn default_gap_tolerance() -> u32 {
    1
}

fn default_api_url() -> String {
    "https://api.exchangeratesapi.io".to_string()
}

fn default_lookback() -> u32 {
    7
}

fn default_timeout_ms() -> u64 {
    30000
}
