use std::io::Cursor;
use std::path::Path;

use tracing::{debug, info};

use crate::categorizer::RuleSet;
use crate::error::{Result, WalletError};
use crate::models::{RawRecord, Transaction, DEFAULT_CURRENCY, FIELD_COUNT};
use crate::normalizer::normalize;
use crate::reports::{aggregate, Summary};

#[cfg(any(feature = "xlsx", test))]
use crate::models::DATE_FORMAT;

// ---------------------------------------------------------------------------
// Input formats: enum dispatch, sniffed from the file name
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Spreadsheet,
}

impl InputFormat {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Spreadsheet => "xlsx",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Csv => "CSV text",
            Self::Spreadsheet => "Spreadsheet (first sheet)",
        }
    }

    /// `.csv` selects the text path; every other name goes to the spreadsheet reader.
    pub fn from_path(file_path: &Path) -> Self {
        let is_csv = file_path
            .extension()
            .map_or(false, |e| e.eq_ignore_ascii_case("csv"));
        if is_csv {
            Self::Csv
        } else {
            Self::Spreadsheet
        }
    }
}

const ALL_FORMATS: &[InputFormat] = &[InputFormat::Csv, InputFormat::Spreadsheet];

pub fn get_by_key(key: &str) -> Option<InputFormat> {
    ALL_FORMATS
        .iter()
        .find(|f| f.key().eq_ignore_ascii_case(key.trim()))
        .copied()
}

/// Resolve a `--format` key, listing the accepted keys when it is unknown.
pub fn format_from_key(key: &str) -> Result<InputFormat> {
    get_by_key(key).ok_or_else(|| {
        let known: Vec<String> = ALL_FORMATS
            .iter()
            .map(|f| format!("{} ({})", f.key(), f.name()))
            .collect();
        WalletError::UnknownFormat(format!("{key}; expected one of: {}", known.join(", ")))
    })
}

// ---------------------------------------------------------------------------
// Column separator strategy (CSV only)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Separator {
    /// Look at the first data line: `;`, then `|`, otherwise `,`.
    #[default]
    Detect,
    Fixed(u8),
}

impl Separator {
    pub fn from_char(c: char) -> Result<Self> {
        u8::try_from(c)
            .ok()
            .filter(u8::is_ascii)
            .map(Self::Fixed)
            .ok_or_else(|| WalletError::Other(format!("Separator must be a single ASCII character, got '{c}'")))
    }

    fn resolve(self, body: &str) -> u8 {
        match self {
            Self::Fixed(b) => b,
            Self::Detect => detect_separator(body),
        }
    }
}

/// Pick the separator from the first non-blank line of `body`.
pub fn detect_separator(body: &str) -> u8 {
    let first = body.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    if first.contains(';') {
        b';'
    } else if first.contains('|') {
        b'|'
    } else {
        b','
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Lazy sequence of six-field rows. The header row is never yielded.
pub struct RawRecords {
    inner: Source,
    dropped: usize,
}

enum Source {
    Empty,
    Delimited(csv::StringRecordsIntoIter<Cursor<Vec<u8>>>),
    Sheet(std::vec::IntoIter<RawRecord>),
}

impl RawRecords {
    fn empty() -> Self {
        Self { inner: Source::Empty, dropped: 0 }
    }

    /// Rows skipped so far for having fewer than six fields.
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

impl Iterator for RawRecords {
    type Item = Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            Source::Empty => None,
            Source::Sheet(rows) => rows.next().map(Ok),
            Source::Delimited(records) => loop {
                match records.next()? {
                    Ok(record) if record.len() >= FIELD_COUNT => {
                        return Some(Ok(RawRecord::from_fields(record.iter())));
                    }
                    Ok(_) => self.dropped += 1,
                    Err(e) => return Some(Err(e.into())),
                }
            },
        }
    }
}

/// Split statement bytes into raw rows according to `format`.
///
/// An empty payload yields no rows for either format. Malformed spreadsheet
/// content is a [`WalletError::Parse`].
pub fn extract(bytes: Vec<u8>, format: InputFormat, separator: Separator) -> Result<RawRecords> {
    if bytes.is_empty() {
        return Ok(RawRecords::empty());
    }
    match format {
        InputFormat::Csv => Ok(delimited_records(bytes, separator)),
        InputFormat::Spreadsheet => {
            let (rows, dropped) = spreadsheet_records(bytes)?;
            Ok(RawRecords {
                inner: Source::Sheet(rows.into_iter()),
                dropped,
            })
        }
    }
}

fn delimited_records(bytes: Vec<u8>, separator: Separator) -> RawRecords {
    let text = String::from_utf8_lossy(&bytes);
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    // The first line is the header, whatever it contains.
    let Some((_, body)) = text.split_once('\n') else {
        return RawRecords::empty();
    };

    let delimiter = separator.resolve(body);
    debug!(separator = %(delimiter as char), "csv separator");

    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(Cursor::new(body.as_bytes().to_vec()));

    RawRecords {
        inner: Source::Delimited(rdr.into_records()),
        dropped: 0,
    }
}

#[cfg(feature = "xlsx")]
fn spreadsheet_records(bytes: Vec<u8>) -> Result<(Vec<RawRecord>, usize)> {
    use calamine::Reader;

    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| WalletError::Parse(format!("failed to open spreadsheet: {e}")))?;

    let Some(range) = workbook.worksheet_range_at(0) else {
        return Ok((Vec::new(), 0));
    };
    let range = range.map_err(|e| WalletError::Parse(format!("failed to read first sheet: {e}")))?;
    Ok(sheet_records(&range))
}

#[cfg(not(feature = "xlsx"))]
fn spreadsheet_records(_bytes: Vec<u8>) -> Result<(Vec<RawRecord>, usize)> {
    Err(WalletError::Parse(
        "spreadsheet support requires the 'xlsx' feature".into(),
    ))
}

/// Convert every row after the first into a raw record, by cell position.
/// Returns the records and the number of rows that were too short.
#[cfg(feature = "xlsx")]
pub fn sheet_records(range: &calamine::Range<calamine::Data>) -> (Vec<RawRecord>, usize) {
    use calamine::Data;

    let mut records = Vec::new();
    let mut dropped = 0usize;
    for row in range.rows().skip(1) {
        let len = row
            .iter()
            .rposition(|c| !matches!(c, Data::Empty))
            .map_or(0, |i| i + 1);
        if len < FIELD_COUNT {
            if len > 0 {
                dropped += 1;
            }
            continue;
        }
        records.push(RawRecord::from_fields(row.iter().map(cell_text)));
    }
    (records, dropped)
}

#[cfg(feature = "xlsx")]
fn cell_text(cell: &calamine::Data) -> String {
    use calamine::Data;

    match cell {
        Data::String(s) => s.clone(),
        Data::Float(f) => decimal_text(*f),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64()).unwrap_or_default(),
        Data::DateTimeIso(s) => iso_to_date(s).unwrap_or_else(|| s.clone()),
        _ => String::new(),
    }
}

/// Numbers are written with a decimal comma so the Italian amount rule reads
/// them back unchanged.
#[cfg(any(feature = "xlsx", test))]
fn decimal_text(value: f64) -> String {
    format!("{value}").replace('.', ",")
}

#[cfg(any(feature = "xlsx", test))]
pub fn excel_serial_to_date(serial: f64) -> Option<String> {
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = chrono::NaiveDate::from_ymd_opt(1899, 12, 30)?;
    let days = chrono::Duration::try_days(serial.trunc() as i64)?;
    let date = base.checked_add_signed(days)?;
    Some(date.format(DATE_FORMAT).to_string())
}

#[cfg(any(feature = "xlsx", test))]
fn iso_to_date(raw: &str) -> Option<String> {
    let day = chrono::NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()?;
    Some(day.format(DATE_FORMAT).to_string())
}

// ---------------------------------------------------------------------------
// Pipeline: read → extract → normalize → aggregate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Overrides file-name sniffing when set.
    pub format: Option<InputFormat>,
    pub separator: Separator,
    pub default_currency: String,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            format: None,
            separator: Separator::Detect,
            default_currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

/// Extract and normalize, keeping only rows that pass the retention filter.
pub fn read_transactions(
    bytes: Vec<u8>,
    format: InputFormat,
    options: &ImportOptions,
) -> Result<Vec<Transaction>> {
    let mut records = extract(bytes, format, options.separator)?;
    let mut transactions = Vec::new();
    let mut rejected = 0usize;

    for record in records.by_ref() {
        match normalize(record?, &options.default_currency).into_transaction() {
            Some(txn) => transactions.push(txn),
            None => rejected += 1,
        }
    }

    debug!(
        kept = transactions.len(),
        rejected,
        short_rows = records.dropped(),
        "normalized statement rows"
    );
    Ok(transactions)
}

pub fn import_bytes(
    bytes: Vec<u8>,
    format: InputFormat,
    rules: &RuleSet,
    options: &ImportOptions,
) -> Result<Summary> {
    let transactions = read_transactions(bytes, format, options)?;
    let summary = aggregate(transactions, rules);
    info!(
        transactions = summary.transactions.len(),
        categories = summary.category_expenses.len(),
        "statement aggregated"
    );
    Ok(summary)
}

/// Read `file_path` once and run the whole pipeline on its content.
pub fn import_file(file_path: &Path, rules: &RuleSet, options: &ImportOptions) -> Result<Summary> {
    let bytes = std::fs::read(file_path)?;
    let format = options.format.unwrap_or_else(|| InputFormat::from_path(file_path));
    info!(
        file = %file_path.display(),
        format = format.key(),
        bytes = bytes.len(),
        "importing statement"
    );
    import_bytes(bytes, format, rules, options)
}
