use std::fs::File;
use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Date32Type};
use chrono::NaiveDate;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::{Map, Value as JsonValue};

use super::dates::parse_date;
use super::error::{DataLoadError, DateParseWarning};
use super::model::{Category, NewOpportunity, Opportunity, Table};

pub const AMOUNT_COLUMN: &str = "Amount";
pub const CREATED_DATE_COLUMN: &str = "Created Date";
pub const CLOSE_DATE_COLUMN: &str = "Close Date";

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load an opportunity table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.txt` – comma-delimited with a header row
/// * `.tsv` / `.tab` – tab-delimited
/// * `.psv`          – pipe-delimited
/// * `.json`         – `[{ "Account": "...", "Amount": 100, ... }, ...]`
/// * `.parquet`      – one column per field; date columns may be typed
///
/// Unparseable dates are logged and kept as unknown.
pub fn load_file(path: &Path) -> Result<Table, DataLoadError> {
    let (table, warnings) = load_file_with_warnings(path)?;
    if !warnings.is_empty() {
        log::warn!(
            "{}: {} date cell(s) could not be parsed and were treated as unknown",
            path.display(),
            warnings.len()
        );
        for warning in warnings.iter().take(5) {
            log::debug!("{warning}");
        }
    }
    log::info!("Loaded {} opportunities from {}", table.len(), path.display());
    Ok(table)
}

/// Like [`load_file`], but hands back every date-parse warning instead of
/// logging them.
pub fn load_file_with_warnings(
    path: &Path,
) -> Result<(Table, Vec<DateParseWarning>), DataLoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let collector = match ext.as_str() {
        "csv" | "txt" => load_delimited(path, b',')?,
        "tsv" | "tab" => load_delimited(path, b'\t')?,
        "psv" => load_delimited(path, b'|')?,
        "json" => load_json(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        other => return Err(DataLoadError::UnsupportedFormat(other.to_string())),
    };
    Ok(collector.finish())
}

fn open(path: &Path) -> Result<File, DataLoadError> {
    File::open(path).map_err(|source| DataLoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Format-independent row assembly
// ---------------------------------------------------------------------------

/// The seven source columns, one slot each.
#[derive(Debug, Clone)]
struct Columns<T> {
    account: T,
    owner: T,
    stage: T,
    kind: T,
    amount: T,
    created: T,
    close: T,
}

impl Columns<usize> {
    /// Find every required column among `headers` (trimmed), reporting all
    /// of the missing ones at once.
    fn locate<S: AsRef<str>>(headers: &[S]) -> Result<Self, DataLoadError> {
        let mut missing = Vec::new();
        let mut find = |name: &str| {
            headers
                .iter()
                .position(|h| h.as_ref().trim() == name)
                .unwrap_or_else(|| {
                    missing.push(name.to_string());
                    usize::MAX
                })
        };

        let columns = Columns {
            account: find(Category::Account.column_name()),
            owner: find(Category::Owner.column_name()),
            stage: find(Category::Stage.column_name()),
            kind: find(Category::Type.column_name()),
            amount: find(AMOUNT_COLUMN),
            created: find(CREATED_DATE_COLUMN),
            close: find(CLOSE_DATE_COLUMN),
        };

        if missing.is_empty() {
            Ok(columns)
        } else {
            Err(DataLoadError::MissingColumns { missing })
        }
    }
}

enum AmountCell {
    Number(f64),
    Text(String),
}

enum DateCell {
    Missing,
    Date(NaiveDate),
    Text(String),
}

struct RawRecord {
    account: Option<String>,
    owner: Option<String>,
    stage: Option<String>,
    kind: Option<String>,
    amount: AmountCell,
    created: DateCell,
    close: DateCell,
}

/// Accumulates rows and date warnings from any of the format readers.
#[derive(Default)]
struct Collector {
    rows: Vec<Opportunity>,
    warnings: Vec<DateParseWarning>,
}

impl Collector {
    fn push(&mut self, raw: RawRecord) -> Result<(), DataLoadError> {
        let row = self.rows.len();

        let amount = match raw.amount {
            AmountCell::Number(v) => Some(v),
            AmountCell::Text(ref s) => s.trim().parse::<f64>().ok(),
        }
        .filter(|v| v.is_finite())
        .ok_or_else(|| DataLoadError::InvalidAmount {
            row,
            value: match raw.amount {
                AmountCell::Number(v) => v.to_string(),
                AmountCell::Text(ref s) => s.clone(),
            },
        })?;

        let created_date = self.resolve_date(raw.created, row, CREATED_DATE_COLUMN);
        let close_date = self.resolve_date(raw.close, row, CLOSE_DATE_COLUMN);

        self.rows.push(
            NewOpportunity {
                account: raw.account,
                owner: raw.owner,
                stage: raw.stage,
                kind: raw.kind,
                amount,
                created_date,
                close_date,
            }
            .into(),
        );
        Ok(())
    }

    fn resolve_date(
        &mut self,
        cell: DateCell,
        row: usize,
        column: &'static str,
    ) -> Option<NaiveDate> {
        match cell {
            DateCell::Missing => None,
            DateCell::Date(d) => Some(d),
            DateCell::Text(s) if is_blank(&s) => None,
            DateCell::Text(s) => {
                let parsed = parse_date(&s);
                if parsed.is_none() {
                    self.warnings.push(DateParseWarning { row, column, value: s });
                }
                parsed
            }
        }
    }

    fn finish(self) -> (Table, Vec<DateParseWarning>) {
        (Table::from_rows(self.rows), self.warnings)
    }
}

/// Blank cells and the usual NA spellings count as missing values.
fn is_blank(s: &str) -> bool {
    let s = s.trim();
    s.is_empty()
        || s.eq_ignore_ascii_case("nan")
        || s.eq_ignore_ascii_case("nat")
        || s.eq_ignore_ascii_case("null")
        || s == "NA"
        || s == "N/A"
}

fn text_cell(s: &str) -> Option<String> {
    if is_blank(s) {
        None
    } else {
        Some(s.to_string())
    }
}

fn date_text_cell(s: &str) -> DateCell {
    if is_blank(s) {
        DateCell::Missing
    } else {
        DateCell::Text(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Delimited text loader
// ---------------------------------------------------------------------------

/// Header row with column names, then one opportunity per record.
/// Columns other than the required seven are ignored.
fn load_delimited(path: &Path, delimiter: u8) -> Result<Collector, DataLoadError> {
    let file = open(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_reader(file);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let cols = Columns::locate(&headers)?;

    let mut collector = Collector::default();
    for result in reader.records() {
        let record = result?;
        let get = |idx: usize| record.get(idx).unwrap_or("");

        collector.push(RawRecord {
            account: text_cell(get(cols.account)),
            owner: text_cell(get(cols.owner)),
            stage: text_cell(get(cols.stage)),
            kind: text_cell(get(cols.kind)),
            amount: AmountCell::Text(get(cols.amount).to_string()),
            created: date_text_cell(get(cols.created)),
            close: date_text_cell(get(cols.close)),
        })?;
    }
    Ok(collector)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `to_json(orient='records')`):
///
/// ```json
/// [
///   { "Account": "Acme", "Opportunity Owner": "Dana", "Stage": "Closed Won",
///     "Type": "New Business", "Amount": 1200.0,
///     "Created Date": "2023-01-04", "Close Date": null },
///   ...
/// ]
/// ```
///
/// A key absent from one record is a null cell; a key absent from every
/// record is a missing column, so `[]` reports all of them.
fn load_json(path: &Path) -> Result<Collector, DataLoadError> {
    let file = open(path)?;
    let root: JsonValue = serde_json::from_reader(std::io::BufReader::new(file))?;

    let records = root
        .as_array()
        .ok_or_else(|| DataLoadError::Shape("expected a top-level JSON array".into()))?;

    let objects = records
        .iter()
        .enumerate()
        .map(|(i, rec)| {
            rec.as_object()
                .ok_or_else(|| DataLoadError::Shape(format!("row {i} is not a JSON object")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut keys: Vec<&str> = Vec::new();
    for obj in &objects {
        for key in obj.keys() {
            if !keys.contains(&key.as_str()) {
                keys.push(key.as_str());
            }
        }
    }
    Columns::locate(&keys)?;

    let mut collector = Collector::default();
    for obj in objects {
        collector.push(RawRecord {
            account: json_text(obj, Category::Account.column_name()),
            owner: json_text(obj, Category::Owner.column_name()),
            stage: json_text(obj, Category::Stage.column_name()),
            kind: json_text(obj, Category::Type.column_name()),
            amount: match obj.get(AMOUNT_COLUMN) {
                Some(JsonValue::Number(n)) => n
                    .as_f64()
                    .map(AmountCell::Number)
                    .unwrap_or_else(|| AmountCell::Text(n.to_string())),
                Some(JsonValue::String(s)) => AmountCell::Text(s.clone()),
                Some(other) => AmountCell::Text(other.to_string()),
                None => AmountCell::Text(String::new()),
            },
            created: json_date(obj, CREATED_DATE_COLUMN),
            close: json_date(obj, CLOSE_DATE_COLUMN),
        })?;
    }
    Ok(collector)
}

fn json_text(obj: &Map<String, JsonValue>, key: &str) -> Option<String> {
    match obj.get(key)? {
        JsonValue::Null => None,
        JsonValue::String(s) => text_cell(s),
        other => Some(other.to_string()),
    }
}

fn json_date(obj: &Map<String, JsonValue>, key: &str) -> DateCell {
    match obj.get(key) {
        None | Some(JsonValue::Null) => DateCell::Missing,
        Some(JsonValue::String(s)) => date_text_cell(s),
        Some(other) => DateCell::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file containing one opportunity per row.
///
/// Categorical and amount columns may have any type Arrow can cast to text.
/// Date columns may be `Date32`, `Date64`, `Timestamp` or text; text dates go
/// through the same lenient parser as the CSV loader.
fn load_parquet(path: &Path) -> Result<Collector, DataLoadError> {
    let file = open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    let names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let cols = Columns::locate(&names)?;
    let reader = builder.build()?;

    let mut collector = Collector::default();
    for batch_result in reader {
        let batch = batch_result?;

        let text = |idx: usize| cast(batch.column(idx), &DataType::Utf8);
        let columns = Columns {
            account: text(cols.account)?,
            owner: text(cols.owner)?,
            stage: text(cols.stage)?,
            kind: text(cols.kind)?,
            amount: text(cols.amount)?,
            created: date_column(batch.column(cols.created))?,
            close: date_column(batch.column(cols.close))?,
        };

        for row in 0..batch.num_rows() {
            collector.push(RawRecord {
                account: arrow_text(&columns.account, row),
                owner: arrow_text(&columns.owner, row),
                stage: arrow_text(&columns.stage, row),
                kind: arrow_text(&columns.kind, row),
                amount: AmountCell::Text(arrow_text(&columns.amount, row).unwrap_or_default()),
                created: arrow_date(&columns.created, row),
                close: arrow_date(&columns.close, row),
            })?;
        }
    }
    Ok(collector)
}

// -- Parquet / Arrow helpers --

/// Normalise a date column to either `Date32` (typed sources) or `Utf8`.
fn date_column(col: &ArrayRef) -> Result<ArrayRef, DataLoadError> {
    let target = match col.data_type() {
        DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _) => DataType::Date32,
        _ => DataType::Utf8,
    };
    Ok(cast(col, &target)?)
}

fn arrow_text(col: &ArrayRef, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    text_cell(col.as_string::<i32>().value(row))
}

fn arrow_date(col: &ArrayRef, row: usize) -> DateCell {
    if col.is_null(row) {
        return DateCell::Missing;
    }
    match col.data_type() {
        DataType::Date32 => col
            .as_primitive::<Date32Type>()
            .value_as_date(row)
            .map(DateCell::Date)
            .unwrap_or(DateCell::Missing),
        _ => date_text_cell(col.as_string::<i32>().value(row)),
    }
}
