//! Pipeline orchestration - MSR files to monthly metrics in one run

use tracing::{info, warn};

use crate::config::ColumnsCfg;
use crate::domain::metrics::MetricsAggregator;
use crate::domain::payment::{RawRow, RecordNormalizer};
use crate::domain::subscription::SubscriptionMatcher;
use crate::infrastructure::msr::{MsrFile, MsrReader};
use crate::infrastructure::rates::ExchangeRateProvider;
use crate::report::AnalysisReport;
use crate::shared::errors::AppError;
use crate::shared::types::{DiagnosticKind, Month, RowDiagnostic};

/// Batch-oriented run over a set of MSR files. Each stage fully consumes
/// the previous stage's output; nothing is carried across runs.
pub struct Pipeline {
    columns: ColumnsCfg,
    gap_tolerance_months: u32,
    max_lookback_days: u32,
}

/// Everything read from disk, before normalization
pub struct ReadBatch {
    pub rows: Vec<RawRow>,
    pub diagnostics: Vec<RowDiagnostic>,
    pub latest_report_month: Option<Month>,
}

impl ReadBatch {
    /// First currency value seen, for runs without a configured base currency
    pub fn first_currency(&self) -> Option<String> {
        self.rows.iter().find_map(|row| {
            row.currency
                .as_ref()
                .map(|c| c.trim().to_ascii_uppercase())
                .filter(|c| !c.is_empty())
        })
    }
}

/// The finished report plus every skipped or degraded row
pub struct PipelineOutcome {
    pub report: AnalysisReport,
    pub diagnostics: Vec<RowDiagnostic>,
}

impl Pipeline {
    pub fn new(columns: ColumnsCfg, gap_tolerance_months: u32, max_lookback_days: u32) -> Self {
        Self {
            columns,
            gap_tolerance_months,
            max_lookback_days,
        }
    }

    /// Read and column-map every file. The latest covered month is taken
    /// from the file names so churn can be judged at the report horizon.
    pub fn read(&self, files: &[MsrFile]) -> Result<ReadBatch, AppError> {
        let reader = MsrReader::new(&self.columns);
        let mut rows = Vec::new();
        let mut diagnostics = Vec::new();

        for file in files {
            let (file_rows, file_diagnostics) = reader.read_file(file)?;
            rows.extend(file_rows);
            diagnostics.extend(file_diagnostics);
        }

        let latest_report_month = files.iter().filter_map(|f| f.report_month).max();
        info!(
            "Read {} payment rows from {} files",
            rows.len(),
            files.len()
        );

        Ok(ReadBatch {
            rows,
            diagnostics,
            latest_report_month,
        })
    }

    /// Normalize, match and aggregate one batch against a base currency.
    /// Per-row failures become diagnostics; only an internal invariant
    /// violation in the aggregation is fatal.
    pub async fn analyze(
        &self,
        batch: ReadBatch,
        base_currency: &str,
        provider: &dyn ExchangeRateProvider,
    ) -> Result<PipelineOutcome, AppError> {
        let normalizer = RecordNormalizer::new(provider, base_currency, self.max_lookback_days);
        let mut diagnostics = batch.diagnostics;
        let mut records = Vec::with_capacity(batch.rows.len());

        for row in &batch.rows {
            match normalizer.normalize(row).await {
                Ok(normalized) => {
                    if let Some(warning) = normalized.warning {
                        warn!(
                            "No conversion for {} {} on {}: {}",
                            row.source, warning.currency, warning.date, warning.detail
                        );
                        diagnostics.push(RowDiagnostic {
                            source: row.source.clone(),
                            line: row.line,
                            kind: DiagnosticKind::ConversionFailed,
                            message: format!(
                                "{} on {}: {}",
                                warning.currency, warning.date, warning.detail
                            ),
                        });
                    }
                    records.push(normalized.record);
                }
                Err(e) => {
                    diagnostics.push(RowDiagnostic {
                        source: row.source.clone(),
                        line: row.line,
                        kind: DiagnosticKind::MalformedRow,
                        message: e.to_string(),
                    });
                }
            }
        }

        let matcher = SubscriptionMatcher::new(self.gap_tolerance_months);
        let segments = matcher.match_records(records, batch.latest_report_month);
        let months = MetricsAggregator::new().aggregate(&segments)?;
        let report = AnalysisReport::build(base_currency, &segments, months);

        Ok(PipelineOutcome {
            report,
            diagnostics,
        })
    }
}
