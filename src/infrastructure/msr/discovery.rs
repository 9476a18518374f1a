//! Finding MSR exports on disk

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::shared::errors::AppError;
use crate::shared::types::Month;

/// One discovered MSR file
#[derive(Debug, Clone, PartialEq)]
pub struct MsrFile {
    pub path: PathBuf,
    /// Month the report covers, parsed from the file name; None when the
    /// name carries no usable YYYYMM run
    pub report_month: Option<Month>,
}

/// List the files under `folder` matching the PayPal export naming
/// pattern (single-`*` wildcard, e.g. "MSR-*.CSV"), sorted by file name.
pub fn discover_files(folder: &Path, pattern: &str) -> Result<Vec<MsrFile>, AppError> {
    let entries = fs::read_dir(folder)
        .map_err(|e| AppError::InputError(format!("cannot read {}: {}", folder.display(), e)))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry =
            entry.map_err(|e| AppError::InputError(format!("cannot read directory entry: {}", e)))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };
        if !matches_pattern(&name, pattern) {
            continue;
        }
        let report_month = report_month_from_name(&name);
        if report_month.is_none() {
            warn!("No report month in file name {}, will infer from data", name);
        }
        files.push(MsrFile { path, report_month });
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    debug!("Discovered {} MSR files in {}", files.len(), folder.display());
    Ok(files)
}

/// Case-insensitive match against a pattern with at most one `*`
fn matches_pattern(name: &str, pattern: &str) -> bool {
    let name = name.to_ascii_uppercase();
    let pattern = pattern.to_ascii_uppercase();
    match pattern.split_once('*') {
        Some((prefix, suffix)) => {
            name.len() >= prefix.len() + suffix.len()
                && name.starts_with(prefix)
                && name.ends_with(suffix)
        }
        None => name == pattern,
    }
}

/// Report month from the first YYYYMM digit run in the file name
/// ("MSR-201901.CSV" covers January 2019)
pub fn report_month_from_name(name: &str) -> Option<Month> {
    let bytes = name.as_bytes();
    let mut run_start = None;
    let mut run_len = 0;

    for (i, b) in bytes.iter().enumerate() {
        if b.is_ascii_digit() {
            if run_start.is_none() {
                run_start = Some(i);
            }
            run_len += 1;
        } else {
            if let Some(start) = run_start {
                if let Some(month) = month_from_digits(&name[start..start + run_len]) {
                    return Some(month);
                }
            }
            run_start = None;
            run_len = 0;
        }
    }
    if let Some(start) = run_start {
        return month_from_digits(&name[start..start + run_len]);
    }
    None
}

fn month_from_digits(digits: &str) -> Option<Month> {
    if digits.len() != 6 {
        return None;
    }
    let year: i32 = digits[..4].parse().ok()?;
    let month: u32 = digits[4..].parse().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    Some(Month::new(year, month))
}
