//! Dataset module - sustainability report metadata
//!
//! Loads the flat report file (one row per company) into memory. The table
//! is immutable once loaded; every render reads from a freshly loaded copy.
//!
//! # Example
//!
//! ```no_run
//! use peerbench::dataset::Dataset;
//!
//! let data = Dataset::load("report_data.csv")?;
//! let focal = data.find("Acme AG")?;
//! println!("{} published {:?} pages", focal.name, focal.pages);
//! # Ok::<(), peerbench::BenchError>(())
//! ```

mod internal;

use std::io::Read;
use std::path::Path;

use crate::error::{BenchError, Result};

pub use internal::{
    ColumnSet, LoadOptions, ReportRecord, COL_COUNTRY, COL_EMPLOYEES, COL_MARKET_CAP, COL_NAME,
    COL_PAGES, COL_RATING, COL_SECTOR, COL_WORDS,
};

/// In-memory report table
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<ReportRecord>,
    columns: ColumnSet,
}

impl Dataset {
    /// Load a comma-delimited report file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with(path, LoadOptions::default())
    }

    /// Load a report file with explicit reader settings.
    pub fn load_with(path: impl AsRef<Path>, options: LoadOptions) -> Result<Self> {
        let (records, columns) = internal::load_path(path.as_ref(), options)?;
        Ok(Self { records, columns })
    }

    /// Load from any reader (stdin, in-memory fixtures).
    pub fn from_reader(reader: impl Read, options: LoadOptions) -> Result<Self> {
        let (records, columns) =
            internal::load_reader(reader, &internal::reader_origin(), options)?;
        Ok(Self { records, columns })
    }

    pub fn records(&self) -> &[ReportRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn columns(&self) -> ColumnSet {
        self.columns
    }

    /// Distinct non-empty company names, in file order.
    pub fn company_names(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.records
            .iter()
            .map(|r| r.name.as_str())
            .filter(|name| !name.is_empty() && seen.insert(*name))
            .collect()
    }

    /// Exact-name lookup; the first row wins when names repeat.
    pub fn find(&self, name: &str) -> Result<&ReportRecord> {
        self.records
            .iter()
            .find(|r| !r.name.is_empty() && r.name == name)
            .ok_or_else(|| BenchError::FocalNotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "\
name,country,trbceconomicsectorname,pagespdf,words,market_cap_tercile
Alpha,France,Energy,15,5000,1
Beta,France,Industrials,25,,2
,Germany,Energy,40,9000,3
Gamma,Germany,Energy,,7000,
Alpha,Spain,Energy,99,1,1
";

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let data = Dataset::load(file.path()).unwrap();
        assert_eq!(data.len(), 5);
        assert!(data.columns().words);
        assert!(data.columns().market_cap_tercile);
        assert!(!data.columns().rating_tercile);
    }

    #[test]
    fn test_missing_file_is_data_unavailable() {
        let err = Dataset::load("/nonexistent/report_data.csv").unwrap_err();
        assert!(matches!(err, BenchError::DataUnavailable { .. }));
    }

    #[test]
    fn test_company_names_skip_blank_and_duplicates() {
        let data = Dataset::from_reader(SAMPLE.as_bytes(), LoadOptions::default()).unwrap();
        assert_eq!(data.company_names(), vec!["Alpha", "Beta", "Gamma"]);
    }

    #[test]
    fn test_find_first_match() {
        let data = Dataset::from_reader(SAMPLE.as_bytes(), LoadOptions::default()).unwrap();
        let alpha = data.find("Alpha").unwrap();
        assert_eq!(alpha.country, "France");
        assert_eq!(alpha.pages, Some(15.0));
    }

    #[test]
    fn test_find_unknown() {
        let data = Dataset::from_reader(SAMPLE.as_bytes(), LoadOptions::default()).unwrap();
        assert!(matches!(
            data.find("Nobody"),
            Err(BenchError::FocalNotFound(name)) if name == "Nobody"
        ));
        // blank names are never valid focal choices
        assert!(data.find("").is_err());
    }

    #[test]
    fn test_semicolon_delimiter() {
        let raw = "name;country;trbceconomicsectorname;pagespdf\nA;France;Energy;12\n";
        let data = Dataset::from_reader(raw.as_bytes(), LoadOptions { delimiter: b';' }).unwrap();
        assert_eq!(data.records()[0].pages, Some(12.0));
        assert!(!data.columns().words);
    }
}
