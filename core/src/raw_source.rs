//! Raw tabular source reader.
//!
//! The ledger the extraction pipeline started from: either the workbook
//! itself (`.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods`) or a delimited text
//! export of it. Only two facts are taken from it: how many data rows it
//! has and the account identifier in the first column of the first data
//! row. The first row is a header row. Blank rows are not counted.

use crate::{
    error::{TierError, TierResult},
    types::AccountId,
};
use calamine::{open_workbook_auto, Data, Reader};
use std::{fs::File, path::Path};

const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSourceSummary {
    pub row_count: usize,
    pub first_account: Option<AccountId>,
}

/// How to read the raw source. `sheet` applies to workbooks only,
/// `delimiter` to text exports only.
#[derive(Debug, Clone, Copy)]
pub struct RawSourceOptions<'a> {
    pub sheet: Option<&'a str>,
    pub delimiter: char,
}

impl Default for RawSourceOptions<'_> {
    fn default() -> Self {
        Self { sheet: None, delimiter: ',' }
    }
}

/// Read a raw source, picking the reader from the file extension.
pub fn read_raw_source(path: &Path, options: RawSourceOptions<'_>) -> TierResult<RawSourceSummary> {
    let summary = if is_workbook(path) {
        read_workbook(path, options.sheet)?
    } else {
        read_delimited(path, options.delimiter)?
    };
    log::debug!(
        "raw source {}: {} rows, first account {:?}",
        path.display(),
        summary.row_count,
        summary.first_account
    );
    Ok(summary)
}

pub fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .is_some_and(|e| WORKBOOK_EXTENSIONS.contains(&e.as_str()))
}

// ── Workbooks ──────────────────────────────────────────────────────

fn read_workbook(path: &Path, sheet: Option<&str>) -> TierResult<RawSourceSummary> {
    let mut workbook = open_workbook_auto(path).map_err(|e| {
        TierError::ExternalSource(format!("Failed to open workbook '{}': {e}", path.display()))
    })?;

    let sheet_names = workbook.sheet_names();
    let sheet_name = match sheet {
        Some(wanted) if sheet_names.iter().any(|s| s == wanted) => wanted.to_string(),
        Some(wanted) => {
            return Err(TierError::ExternalSource(format!(
                "{}: sheet '{wanted}' not found (available: [{}])",
                path.display(),
                sheet_names.join(", ")
            )))
        }
        None => sheet_names.first().cloned().ok_or_else(|| {
            TierError::ExternalSource(format!("{}: workbook has no sheets", path.display()))
        })?,
    };

    let range = workbook.worksheet_range(&sheet_name).map_err(|e| {
        TierError::ExternalSource(format!("{} sheet '{sheet_name}': {e}", path.display()))
    })?;

    let mut data_rows = range
        .rows()
        .filter(|row| !row.iter().all(|c| matches!(c, Data::Empty)))
        .skip(1);

    let first_account = data_rows
        .next()
        .map(|row| row.first().map(cell_text).unwrap_or_default());
    let row_count = first_account.as_ref().map_or(0, |_| 1 + data_rows.count());

    Ok(RawSourceSummary { row_count, first_account })
}

/// Account cells are often typed as numbers in the workbook; render
/// whole numbers without a fractional part so they compare as ids.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Int(n) => n.to_string(),
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        other => other.to_string().trim().to_string(),
    }
}

// ── Delimited text ─────────────────────────────────────────────────

fn read_delimited(path: &Path, delimiter: char) -> TierResult<RawSourceSummary> {
    let delimiter = u8::try_from(delimiter).map_err(|_| {
        TierError::InvalidArgument(format!("delimiter '{delimiter}' is not a single byte"))
    })?;
    let file = File::open(path).map_err(|e| {
        TierError::ExternalSource(format!("Failed to open '{}': {e}", path.display()))
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut row_count = 0usize;
    let mut first_account = None;

    for result in reader.records() {
        // csv errors carry their own record/line position
        let record = result
            .map_err(|e| TierError::ExternalSource(format!("{}: {e}", path.display())))?;
        if row_count == 0 {
            first_account = record.get(0).map(|s| s.trim().to_string());
        }
        row_count += 1;
    }

    Ok(RawSourceSummary { row_count, first_account })
}
