use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

use crate::dataset::schema::{self, DATE_COLUMN, SCENARIO_COLUMN, STATION_COLUMN};
use crate::dataset::MeasurementRecord;
use crate::utils::{is_missing_token, normalize_station_id};

#[derive(Error, Debug)]
pub enum CsvImportError {
    #[error("Failed to open measurement file {path}: {source}")]
    FileOpen {
        path: String,
        source: std::io::Error,
    },

    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),

    #[error("Invalid date at row {row}: {value:?}")]
    InvalidDate { row: usize, value: String },

    #[error("Invalid value at row {row}, column {column}: {value:?}")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Measurement rows plus the variable columns they carry
#[derive(Debug, Clone, Default)]
pub struct MeasurementTable {
    pub variables: Vec<String>,
    pub records: Vec<MeasurementRecord>,
}

/// Reader for the primary measurement table (ID_SIGA, Escenario, Fecha, variables...)
pub struct CsvImporter {
    path: PathBuf,
}

impl CsvImporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the measurement file from disk
    ///
    /// `has_metadata` selects which reserved columns are excluded from the
    /// variable set (basin columns are reserved only in the extended variant).
    pub fn read(&self, has_metadata: bool) -> Result<MeasurementTable, CsvImportError> {
        info!("Reading measurements from {}", self.path.display());

        let file = File::open(&self.path).map_err(|source| CsvImportError::FileOpen {
            path: self.path.display().to_string(),
            source,
        })?;

        Self::read_from(BufReader::new(file), has_metadata)
    }

    /// Parse measurements from any reader
    pub fn read_from<R: Read>(
        reader: R,
        has_metadata: bool,
    ) -> Result<MeasurementTable, CsvImportError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = rdr
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        let position = |name: &'static str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or(CsvImportError::MissingColumn(name))
        };
        let station_idx = position(STATION_COLUMN)?;
        let scenario_idx = position(SCENARIO_COLUMN)?;
        let date_idx = position(DATE_COLUMN)?;

        let variables = schema::variable_set(headers.iter().map(String::as_str), has_metadata);
        let variable_idx: Vec<usize> = variables
            .iter()
            .filter_map(|v| headers.iter().position(|h| h == v))
            .collect();
        debug!("Found {} variable columns: {:?}", variables.len(), variables);

        let mut records = Vec::new();
        for (i, row) in rdr.records().enumerate() {
            let row = row?;
            // Data starts on line 2, after the header
            let line = i + 2;

            let field = |idx: usize| row.get(idx).unwrap_or("");

            let raw_date = field(date_idx);
            let timestamp = parse_timestamp(raw_date).ok_or_else(|| CsvImportError::InvalidDate {
                row: line,
                value: raw_date.to_string(),
            })?;

            let mut values = Vec::with_capacity(variable_idx.len());
            for (&idx, name) in variable_idx.iter().zip(&variables) {
                values.push(parse_value(field(idx)).map_err(|value| {
                    CsvImportError::InvalidValue {
                        row: line,
                        column: name.clone(),
                        value,
                    }
                })?);
            }

            records.push(MeasurementRecord {
                station_id: normalize_station_id(field(station_idx)),
                scenario: field(scenario_idx).to_string(),
                timestamp,
                values,
                basin: None,
                sub_basin: None,
            });
        }

        info!(
            "Parsed {} measurement rows with {} variables",
            records.len(),
            variables.len()
        );
        Ok(MeasurementTable { variables, records })
    }
}

/// Parse a `Fecha` cell
///
/// Accepts ISO dates and datetimes, RFC 3339, slash dates (month-first, then
/// day-first when the month would be out of range), and the partial forms
/// `YYYY-MM` and `YYYY`, which fall on the first day of the period.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    const DATETIME_FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
    ];
    const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y"];

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_local());
    }

    parse_partial_date(trimmed).and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// `YYYY-MM`, `YYYY/MM` or a bare four-digit `YYYY`
fn parse_partial_date(value: &str) -> Option<NaiveDate> {
    if value.len() == 4 && value.bytes().all(|b| b.is_ascii_digit()) {
        return NaiveDate::parse_from_str(&format!("{value}-01-01"), "%Y-%m-%d").ok();
    }
    ["%Y-%m-%d", "%Y/%m/%d"]
        .into_iter()
        .zip(["-01", "/01"])
        .find_map(|(format, day)| NaiveDate::parse_from_str(&format!("{value}{day}"), format).ok())
}

/// Parse a variable cell; missing tokens become `None`, garbage is returned as `Err`
fn parse_value(value: &str) -> Result<Option<f64>, String> {
    if is_missing_token(value) {
        return Ok(None);
    }
    value
        .trim()
        .parse::<f64>()
        .map(Some)
        .map_err(|_| value.to_string())
}
