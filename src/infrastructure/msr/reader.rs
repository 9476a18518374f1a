//! MSR CSV reading and column mapping

use std::fs::File;
use std::io::Read;

use tracing::debug;

use super::MsrFile;
use crate::config::ColumnsCfg;
use crate::domain::payment::RawRow;
use crate::shared::errors::AppError;
use crate::shared::types::{DiagnosticKind, RowDiagnostic};

/// Reads MSR rows and maps the configured columns onto raw field values.
/// Rows failing the transaction-type filter are not subscription payments
/// and are skipped silently; rows the CSV layer cannot parse become
/// malformed-row diagnostics.
pub struct MsrReader<'a> {
    columns: &'a ColumnsCfg,
}

struct ColumnIndexes {
    date: usize,
    subscriber: usize,
    item: Option<usize>,
    currency: usize,
    gross: usize,
    filter: Option<usize>,
}

impl<'a> MsrReader<'a> {
    pub fn new(columns: &'a ColumnsCfg) -> Self {
        Self { columns }
    }

    pub fn read_file(&self, file: &MsrFile) -> Result<(Vec<RawRow>, Vec<RowDiagnostic>), AppError> {
        let source = file.path.display().to_string();
        let handle = File::open(&file.path)
            .map_err(|e| AppError::InputError(format!("cannot open {}: {}", source, e)))?;
        self.read_from(handle, &source)
    }

    /// Read from any CSV source; tests feed in-memory buffers
    pub fn read_from<R: Read>(
        &self,
        rdr: R,
        source: &str,
    ) -> Result<(Vec<RawRow>, Vec<RowDiagnostic>), AppError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(rdr);

        let headers = csv_reader
            .headers()
            .map_err(|e| AppError::InputError(format!("cannot read header of {}: {}", source, e)))?
            .clone();
        let indexes = self.resolve_columns(&headers, source)?;
        let filter_value = self.columns.filter_value.as_deref();

        let mut rows = Vec::new();
        let mut diagnostics = Vec::new();

        for result in csv_reader.records() {
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    diagnostics.push(RowDiagnostic {
                        source: source.to_string(),
                        line: e.position().map(|p| p.line()).unwrap_or(0),
                        kind: DiagnosticKind::MalformedRow,
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            if let (Some(idx), Some(expected)) = (indexes.filter, filter_value) {
                if record.get(idx).map(str::trim) != Some(expected) {
                    continue;
                }
            }

            rows.push(RawRow {
                date: field(&record, Some(indexes.date)),
                subscriber: field(&record, Some(indexes.subscriber)),
                item: field(&record, indexes.item),
                currency: field(&record, Some(indexes.currency)),
                gross: field(&record, Some(indexes.gross)),
                source: source.to_string(),
                line: record.position().map(|p| p.line()).unwrap_or(0),
            });
        }

        debug!(
            "Read {} subscription rows from {} ({} skipped as malformed)",
            rows.len(),
            source,
            diagnostics.len()
        );
        Ok((rows, diagnostics))
    }

    /// A configured column missing from the header is a configuration
    /// problem, not a data problem, and fails the whole file.
    fn resolve_columns(
        &self,
        headers: &csv::StringRecord,
        source: &str,
    ) -> Result<ColumnIndexes, AppError> {
        let find = |name: &str| headers.iter().position(|h| h == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| {
                AppError::ConfigError(format!("column \"{}\" not found in {}", name, source))
            })
        };

        let item = match self.columns.item.as_deref() {
            Some(name) => Some(require(name)?),
            None => None,
        };
        let filter = match self.columns.filter.as_deref() {
            Some(name) if !name.is_empty() => Some(require(name)?),
            _ => None,
        };

        Ok(ColumnIndexes {
            date: require(&self.columns.date)?,
            subscriber: require(&self.columns.subscriber)?,
            item,
            currency: require(&self.columns.currency)?,
            gross: require(&self.columns.gross)?,
            filter,
        })
    }
}

fn field(record: &csv::StringRecord, index: Option<usize>) -> Option<String> {
    record.get(index?).map(|v| v.to_string())
}
