//! Internal implementation for the dataset module
//!
//! Header resolution and per-cell parsing for the report metadata file.

use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{BenchError, Result};

// =============================================================================
// Column Names
// =============================================================================

pub const COL_NAME: &str = "name";
pub const COL_COUNTRY: &str = "country";
pub const COL_SECTOR: &str = "trbceconomicsectorname";
pub const COL_PAGES: &str = "pagespdf";
pub const COL_WORDS: &str = "words";
pub const COL_MARKET_CAP: &str = "market_cap_tercile";
pub const COL_EMPLOYEES: &str = "emp_tercile";
pub const COL_RATING: &str = "rating_tercile";

// =============================================================================
// Types
// =============================================================================

/// One company's report metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRecord {
    pub name: String,
    pub country: String,
    pub sector: String,
    pub market_cap_tercile: Option<u8>,
    pub emp_tercile: Option<u8>,
    pub rating_tercile: Option<u8>,
    pub pages: Option<f64>,
    pub words: Option<f64>,
}

/// Which optional columns the loaded file carried.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ColumnSet {
    pub words: bool,
    pub market_cap_tercile: bool,
    pub emp_tercile: bool,
    pub rating_tercile: bool,
}

/// Reader settings
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    pub delimiter: u8,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

/// Column positions resolved from the header row
struct Layout {
    name: usize,
    country: usize,
    sector: usize,
    pages: usize,
    words: Option<usize>,
    market_cap: Option<usize>,
    employees: Option<usize>,
    rating: Option<usize>,
}

impl Layout {
    fn resolve(headers: &csv::StringRecord) -> Result<Self> {
        let find = |column: &str| headers.iter().position(|h| h.trim() == column);
        let require = |column: &'static str| find(column).ok_or(BenchError::MissingColumn(column));

        Ok(Self {
            name: require(COL_NAME)?,
            country: require(COL_COUNTRY)?,
            sector: require(COL_SECTOR)?,
            pages: require(COL_PAGES)?,
            words: find(COL_WORDS),
            market_cap: find(COL_MARKET_CAP),
            employees: find(COL_EMPLOYEES),
            rating: find(COL_RATING),
        })
    }

    /// Stop reading an optional column; required columns are left alone.
    fn drop_optional(&mut self, column: &str) {
        match column {
            COL_WORDS => self.words = None,
            COL_MARKET_CAP => self.market_cap = None,
            COL_EMPLOYEES => self.employees = None,
            COL_RATING => self.rating = None,
            _ => {}
        }
    }

    fn columns(&self) -> ColumnSet {
        ColumnSet {
            words: self.words.is_some(),
            market_cap_tercile: self.market_cap.is_some(),
            emp_tercile: self.employees.is_some(),
            rating_tercile: self.rating.is_some(),
        }
    }
}

// =============================================================================
// Loading
// =============================================================================

pub fn load_path(path: &Path, options: LoadOptions) -> Result<(Vec<ReportRecord>, ColumnSet)> {
    let file = std::fs::File::open(path).map_err(|e| BenchError::DataUnavailable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    load_reader(file, path, options)
}

pub fn load_reader<R: Read>(
    reader: R,
    origin: &Path,
    options: LoadOptions,
) -> Result<(Vec<ReportRecord>, ColumnSet)> {
    let unavailable = |e: csv::Error| BenchError::DataUnavailable {
        path: origin.to_path_buf(),
        reason: e.to_string(),
    };

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = rdr.headers().map_err(unavailable)?.clone();
    let mut layout = Layout::resolve(&headers)?;

    let mut records = Vec::new();
    for (idx, row) in rdr.records().enumerate() {
        let row = row.map_err(unavailable)?;
        // header is line 1
        let line = row
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(idx + 2);
        let (record, rejected) = parse_row(&row, &layout, line)?;
        records.push(record);

        // a bad optional cell drops that column for the whole file
        for error in rejected {
            let BenchError::InvalidValue { column, .. } = &error else {
                continue;
            };
            warn!(%error, "ignoring optional column {}", column);
            layout.drop_optional(column);
            records.iter_mut().for_each(|r| clear_optional(r, column));
        }
    }

    debug!(
        origin = %origin.display(),
        rows = records.len(),
        "loaded report data"
    );
    Ok((records, layout.columns()))
}

fn parse_row(
    row: &csv::StringRecord,
    layout: &Layout,
    line: usize,
) -> Result<(ReportRecord, Vec<BenchError>)> {
    let text = |idx: usize| row.get(idx).unwrap_or("").to_string();
    let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i)).unwrap_or("");
    let mut rejected = Vec::new();

    let record = ReportRecord {
        name: text(layout.name),
        country: text(layout.country),
        sector: text(layout.sector),
        pages: parse_number(cell(Some(layout.pages)), COL_PAGES, line)?,
        market_cap_tercile: lenient(
            parse_tercile(cell(layout.market_cap), COL_MARKET_CAP, line),
            &mut rejected,
        ),
        emp_tercile: lenient(
            parse_tercile(cell(layout.employees), COL_EMPLOYEES, line),
            &mut rejected,
        ),
        rating_tercile: lenient(
            parse_tercile(cell(layout.rating), COL_RATING, line),
            &mut rejected,
        ),
        words: lenient(
            parse_number(cell(layout.words), COL_WORDS, line),
            &mut rejected,
        ),
    };
    Ok((record, rejected))
}

fn lenient<T>(parsed: Result<Option<T>>, rejected: &mut Vec<BenchError>) -> Option<T> {
    parsed.unwrap_or_else(|e| {
        rejected.push(e);
        None
    })
}

fn clear_optional(record: &mut ReportRecord, column: &str) {
    match column {
        COL_WORDS => record.words = None,
        COL_MARKET_CAP => record.market_cap_tercile = None,
        COL_EMPLOYEES => record.emp_tercile = None,
        COL_RATING => record.rating_tercile = None,
        _ => {}
    }
}

/// pandas' default NA tokens, matched case-sensitively
const NA_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn is_missing(raw: &str) -> bool {
    raw.trim().is_empty() || NA_TOKENS.contains(&raw)
}

pub fn parse_number(raw: &str, column: &'static str, row: usize) -> Result<Option<f64>> {
    if is_missing(raw) {
        return Ok(None);
    }
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(BenchError::InvalidValue {
            row,
            column,
            value: raw.to_string(),
        }),
    }
}

pub fn parse_tercile(raw: &str, column: &'static str, row: usize) -> Result<Option<u8>> {
    let invalid = || BenchError::InvalidValue {
        row,
        column,
        value: raw.to_string(),
    };
    match parse_number(raw, column, row)? {
        None => Ok(None),
        Some(v) if v.fract() == 0.0 && (1.0..=3.0).contains(&v) => Ok(Some(v as u8)),
        Some(_) => Err(invalid()),
    }
}

/// Placeholder origin used for in-memory readers
pub fn reader_origin() -> PathBuf {
    PathBuf::from("<reader>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number_missing() {
        assert_eq!(parse_number("", COL_WORDS, 2).unwrap(), None);
        assert_eq!(parse_number("NaN", COL_WORDS, 2).unwrap(), None);
        for token in ["n/a", "N/A", "NULL", "null", "#N/A", "None", "<NA>", "-nan", "1.#QNAN"] {
            assert_eq!(parse_number(token, COL_WORDS, 2).unwrap(), None, "{}", token);
        }
        assert!(parse_number("NAN", COL_WORDS, 2).is_err());
    }

    #[test]
    fn test_na_token_in_words_column_loads() {
        let data = "name,country,trbceconomicsectorname,pagespdf,words\nA,France,Energy,15,n/a\n";
        let (records, columns) =
            load_reader(data.as_bytes(), &reader_origin(), LoadOptions::default()).unwrap();
        assert!(columns.words);
        assert_eq!(records[0].words, None);
    }

    #[test]
    fn test_bad_optional_cell_drops_column() {
        let data = "\
name,country,trbceconomicsectorname,pagespdf,words,rating_tercile,emp_tercile
A,France,Energy,15,900,1,2
B,France,Energy,25,n.a.,0,3
C,Spain,Energy,35,700,2,1
";
        let (records, columns) =
            load_reader(data.as_bytes(), &reader_origin(), LoadOptions::default()).unwrap();
        assert_eq!(records.len(), 3);
        assert!(!columns.rating_tercile);
        assert!(!columns.words);
        assert!(columns.emp_tercile);
        assert!(records.iter().all(|r| r.rating_tercile.is_none() && r.words.is_none()));
        assert_eq!(records[2].emp_tercile, Some(1));
    }

    #[test]
    fn test_bad_pages_cell_stays_fatal() {
        let data = "name,country,trbceconomicsectorname,pagespdf\nA,France,Energy,ten\n";
        let err = load_reader(data.as_bytes(), &reader_origin(), LoadOptions::default())
            .unwrap_err();
        assert!(matches!(err, BenchError::InvalidValue { column: COL_PAGES, .. }));
    }

    #[test]
    fn test_text_cells_keep_whitespace() {
        let data = " name , country ,trbceconomicsectorname,pagespdf\n Acme,France,Energy, 12 \n";
        let (records, _) =
            load_reader(data.as_bytes(), &reader_origin(), LoadOptions::default()).unwrap();
        assert_eq!(records[0].name, " Acme");
        assert_eq!(records[0].pages, Some(12.0));
    }

    #[test]
    fn test_parse_number_rejects_text() {
        let err = parse_number("twelve", COL_PAGES, 7).unwrap_err();
        assert!(matches!(
            err,
            BenchError::InvalidValue { row: 7, column: "pagespdf", .. }
        ));
    }

    #[test]
    fn test_parse_tercile_accepts_float_form() {
        assert_eq!(parse_tercile("2.0", COL_RATING, 2).unwrap(), Some(2));
        assert_eq!(parse_tercile("3", COL_RATING, 2).unwrap(), Some(3));
    }

    #[test]
    fn test_parse_tercile_out_of_range() {
        assert!(parse_tercile("4", COL_RATING, 2).is_err());
        assert!(parse_tercile("1.5", COL_RATING, 2).is_err());
    }

    #[test]
    fn test_missing_required_column() {
        let data = "name,country,pagespdf\nA,France,10\n";
        let err = load_reader(data.as_bytes(), &reader_origin(), LoadOptions::default())
            .unwrap_err();
        assert!(matches!(err, BenchError::MissingColumn(COL_SECTOR)));
    }

    #[test]
    fn test_short_rows_are_padded() {
        let data = "name,country,trbceconomicsectorname,pagespdf,words\nA,France,Energy,10\n";
        let (records, columns) =
            load_reader(data.as_bytes(), &reader_origin(), LoadOptions::default()).unwrap();
        assert!(columns.words);
        assert_eq!(records[0].pages, Some(10.0));
        assert_eq!(records[0].words, None);
    }
}
