//! Table decoding for condition files.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use trial_core::errors::{ErrorInfo, TrialError};

/// A decoded table: row 0 holds the column names, later rows hold values.
pub type Rows = Vec<Vec<Value>>;

/// File formats a condition table may come in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    Csv,
    Xls,
    Xlsx,
    Odp,
    Ods,
}

impl TableFormat {
    /// Picks the format from the extension of `name`.
    pub fn from_resource_name(name: &str) -> Result<Self, TrialError> {
        let extension = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("csv") => Ok(TableFormat::Csv),
            Some("xls") => Ok(TableFormat::Xls),
            Some("xlsx") => Ok(TableFormat::Xlsx),
            Some("odp") => Ok(TableFormat::Odp),
            Some("ods") => Ok(TableFormat::Ods),
            other => Err(TrialError::UnsupportedFormat(
                ErrorInfo::new("unsupported-extension", "condition table format not supported")
                    .with_context("resource", name)
                    .with_context("extension", other.unwrap_or(""))
                    .with_hint("use a csv, xls, xlsx or odp file"),
            )),
        }
    }

    /// Lowercase extension.
    pub fn as_str(&self) -> &'static str {
        match self {
            TableFormat::Csv => "csv",
            TableFormat::Xls => "xls",
            TableFormat::Xlsx => "xlsx",
            TableFormat::Odp => "odp",
            TableFormat::Ods => "ods",
        }
    }

    /// Returns `true` for workbook formats read through the spreadsheet reader.
    pub fn is_spreadsheet(&self) -> bool {
        !matches!(self, TableFormat::Csv)
    }
}

impl fmt::Display for TableFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decodes raw resource bytes into rows.
pub trait TableParser {
    /// Parses `bytes` as `format`; only the first sheet of a workbook is read.
    fn parse_table(&self, bytes: &[u8], format: TableFormat) -> Result<Rows, TrialError>;
}

/// CSV through the `csv` crate, workbooks through `calamine`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTableParser;

impl TableParser for DefaultTableParser {
    fn parse_table(&self, bytes: &[u8], format: TableFormat) -> Result<Rows, TrialError> {
        match format {
            TableFormat::Csv => parse_csv(bytes),
            _ => parse_workbook(bytes, format),
        }
    }
}

fn parse_csv(bytes: &[u8]) -> Result<Rows, TrialError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| {
            TrialError::Import(
                ErrorInfo::new("csv-record", "failed to read CSV record").with_cause(err),
            )
        })?;
        rows.push(record.iter().map(csv_cell).collect());
    }
    Ok(rows)
}

/// Types a CSV cell: empty is null, then integer, float, boolean, string.
pub fn csv_cell(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    if let Ok(int) = raw.parse::<i64>() {
        return Value::from(int);
    }
    if let Ok(float) = raw.parse::<f64>() {
        if let Some(number) = Number::from_f64(float) {
            return Value::Number(number);
        }
    }
    match raw.to_ascii_lowercase().as_str() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}

#[cfg(feature = "spreadsheet")]
fn parse_workbook(bytes: &[u8], format: TableFormat) -> Result<Rows, TrialError> {
    use std::io::Cursor;

    use calamine::{open_workbook_auto_from_rs, Data, Reader};

    let workbook_error = |code: &str, message: &str, cause: &dyn fmt::Display| {
        TrialError::Import(
            ErrorInfo::new(code, message)
                .with_context("format", format.as_str())
                .with_cause(cause),
        )
    };

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|err| workbook_error("workbook-open", "failed to open workbook", &err))?;
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range
            .map_err(|err| workbook_error("workbook-sheet", "failed to read first sheet", &err))?,
        None => return Ok(Vec::new()),
    };

    let cell_value = |cell: &Data| -> Value {
        match cell {
            Data::Empty => Value::Null,
            Data::Int(int) => Value::from(*int),
            Data::Float(float) => float_value(*float),
            Data::Bool(flag) => Value::Bool(*flag),
            Data::String(text) | Data::DateTimeIso(text) | Data::DurationIso(text) => {
                Value::String(text.clone())
            }
            Data::DateTime(stamp) => float_value(stamp.as_f64()),
            Data::Error(err) => Value::String(format!("{err:?}")),
        }
    };
    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_value).collect())
        .collect())
}

#[cfg(not(feature = "spreadsheet"))]
fn parse_workbook(_bytes: &[u8], format: TableFormat) -> Result<Rows, TrialError> {
    Err(TrialError::UnsupportedFormat(
        ErrorInfo::new("spreadsheet-disabled", "workbook support is not compiled in")
            .with_context("format", format.as_str())
            .with_hint("enable the `spreadsheet` feature"),
    ))
}

/// Workbooks store every number as a float; integral values become integers.
#[cfg(feature = "spreadsheet")]
fn float_value(float: f64) -> Value {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    if float.fract() == 0.0 && float.abs() < MAX_EXACT {
        return Value::from(float as i64);
    }
    Number::from_f64(float)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
