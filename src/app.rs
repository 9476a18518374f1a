// src/app.rs
use anyhow::Result;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::application::Pipeline;
use crate::config::{ColumnsCfg, Config};
use crate::infrastructure::msr::discover_files;
use crate::infrastructure::rates::{HistoricalRatesClient, MemoizedRateProvider};
use crate::report::AnalysisReport;
use crate::shared::types::DiagnosticKind;
use crate::shared::utils::{format_amount, format_rate};

#[derive(Debug, Clone)]
pub struct AppCfg {
    pub folder: String,
    pub filename_pattern: String,
    /// None or empty means the first currency seen in the data
    pub base_currency: Option<String>,
    pub gap_tolerance_months: u32,
    pub max_lookback_days: u32,
    pub rates_api_url: String,
    pub rates_timeout_ms: u64,
    pub columns: ColumnsCfg,
    pub json: bool,
}

impl AppCfg {
    pub fn from_config(cfg: Config, json: bool) -> Self {
        Self {
            folder: cfg.input.folder,
            filename_pattern: cfg.input.filename_pattern,
            base_currency: cfg.report.base_currency,
            gap_tolerance_months: cfg.matching.gap_tolerance_months,
            max_lookback_days: cfg.rates.max_lookback_days,
            rates_api_url: cfg.rates.api_url,
            rates_timeout_ms: cfg.rates.timeout_ms,
            columns: cfg.columns,
            json,
        }
    }
}

pub async fn run(app_cfg: AppCfg) -> Result<()> {
    info!("Starting MSR subscription analysis");
    info!("Configuration: {:?}", app_cfg);

    let files = discover_files(Path::new(&app_cfg.folder), &app_cfg.filename_pattern)?;
    if files.is_empty() {
        warn!(
            "No files matching {} under {}",
            app_cfg.filename_pattern, app_cfg.folder
        );
    }

    let pipeline = Pipeline::new(
        app_cfg.columns.clone(),
        app_cfg.gap_tolerance_months,
        app_cfg.max_lookback_days,
    );
    let batch = pipeline.read(&files)?;

    let base_currency = app_cfg
        .base_currency
        .clone()
        .filter(|c| !c.is_empty())
        .or_else(|| batch.first_currency())
        .unwrap_or_default();
    if base_currency.is_empty() {
        warn!("No payment rows found, nothing to convert");
    } else {
        info!("Reporting currency: {}", base_currency);
    }

    let client = HistoricalRatesClient::with_timeout(
        app_cfg.rates_api_url.clone(),
        base_currency.clone(),
        Duration::from_millis(app_cfg.rates_timeout_ms),
    )?;
    let provider = MemoizedRateProvider::new(client);

    let outcome = pipeline.analyze(batch, &base_currency, &provider).await?;
    info!(
        "Resolved {} distinct (date, currency) rate lookups",
        provider.cached_lookups().await
    );

    let malformed = outcome
        .diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::MalformedRow)
        .count();
    let degraded = outcome.diagnostics.len() - malformed;
    if malformed > 0 {
        warn!("{} rows were skipped as malformed", malformed);
    }
    if degraded > 0 {
        warn!("{} rows kept without a converted amount", degraded);
    }

    if app_cfg.json {
        println!("{}", outcome.report.to_json()?);
    } else {
        print_table(&outcome.report);
        print_summary(&outcome.report);
    }

    Ok(())
}

fn print_table(report: &AnalysisReport) {
    println!("Year: Month: Active: New: React: Cancel:  Growth:  Churn:  Revenue:");
    for m in &report.months {
        println!(
            "{:04}  {:02}     {:5}  {:4}  {:5}  {:6}  {}  {} {:>9} {}",
            m.month.year,
            m.month.month,
            m.active_count,
            m.new_count,
            m.reactivated_count,
            m.churned_count,
            format_rate(m.growth_rate),
            format_rate(m.churn_rate),
            format_amount(m.revenue),
            report.base_currency
        );
    }
}

fn print_summary(report: &AnalysisReport) {
    let summary = &report.summary;
    println!();
    println!("SUBSCRIPTION SEGMENTS: {}", summary.segment_count);
    if let Some(length) = summary.average_length_months {
        println!("AVERAGE SUBSCRIPTION LENGTH: {:.2} months", length);
    }
    if let Some(gross) = summary.average_gross {
        println!(
            "AVERAGE SUBSCRIPTION GROSS: {} {}",
            format_amount(gross),
            report.base_currency
        );
    }
    if let Some(growth) = summary.average_growth_rate {
        println!("AVERAGE GROWTH RATE: {:.2}%", growth * 100.0);
    }
    if let Some(churn) = summary.average_churn_rate {
        println!("AVERAGE CHURN RATE: {:.2}%", churn * 100.0);
    }
}
