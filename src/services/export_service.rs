use serde::Serialize;
use utoipa::ToSchema;

use crate::aggregation::AggregatedResult;
use crate::selection::AggregationMode;

pub const FILE_PREFIX: &str = "promedios";
pub const ALL_VARIABLES: &str = "todas";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("Failed to flush CSV buffer: {0}")]
    Flush(String),
    #[error("CSV output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Aggregated table rendered for display (two decimals per numeric cell)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DisplayTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Downloadable CSV payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub file_name: String,
    pub content: String,
}

/// Normalize -0.0 to 0.0 so it never renders as "-0.00"
fn normalize_zero(value: f64) -> f64 {
    if value == 0.0 {
        0.0
    } else {
        value
    }
}

/// Display rendering: exactly two decimals, blank for missing
pub fn format_display(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}", normalize_zero(v)))
        .unwrap_or_default()
}

/// Export rendering: full precision (shortest round-trip text), blank for missing
///
/// Integral values keep a trailing `.0`.
pub fn format_export(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:?}", normalize_zero(v)))
        .unwrap_or_default()
}

/// Render cells in table order
///
/// `format` applies to every numeric cell; `format_year` only to the `Año`
/// grouping key.
fn render_rows(
    result: &AggregatedResult,
    format: fn(Option<f64>) -> String,
    format_year: fn(i32) -> String,
) -> Vec<Vec<String>> {
    match result {
        AggregatedResult::Total(total) => total
            .rows
            .iter()
            .map(|row| {
                std::iter::once(row.scenario.clone())
                    .chain(row.means.iter().map(|m| format(*m)))
                    .collect()
            })
            .collect(),
        AggregatedResult::PerYear(yearly) => yearly
            .rows
            .iter()
            .map(|row| vec![format_year(row.year), row.scenario.clone(), format(row.mean)])
            .collect(),
    }
}

/// Table for display: every numeric cell, the year included, with two decimals
pub fn display_table(result: &AggregatedResult) -> DisplayTable {
    DisplayTable {
        columns: result.columns(),
        rows: render_rows(result, format_display, |year| {
            format_display(Some(f64::from(year)))
        }),
    }
}

/// Serialize to comma-separated text: header row, no index column, `\n` line endings
///
/// The year is written as a plain integer.
pub fn to_csv(result: &AggregatedResult) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(result.columns())?;
    for row in render_rows(result, format_export, |year| year.to_string()) {
        writer.write_record(&row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Flush(e.to_string()))?;
    Ok(String::from_utf8(bytes)?)
}

/// `promedios_{station}_{variable|todas}_{mode slug}.csv`
///
/// Path separators in the station id or variable name become `_`, so the
/// name is always a single path component.
pub fn export_file_name(station: &str, mode: &AggregationMode) -> String {
    let variable = mode.variable().unwrap_or(ALL_VARIABLES);
    format!(
        "{FILE_PREFIX}_{}_{}_{}.csv",
        file_component(station),
        file_component(variable),
        mode.kind().slug()
    )
}

fn file_component(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect()
}

pub fn export(
    station: &str,
    mode: &AggregationMode,
    result: &AggregatedResult,
) -> Result<ExportFile, ExportError> {
    Ok(ExportFile {
        file_name: export_file_name(station, mode),
        content: to_csv(result)?,
    })
}

/// `Content-Disposition` value with an ASCII fallback and an RFC 5987 UTF-8 name
pub fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'ä' => 'a',
            'é' | 'è' | 'ë' => 'e',
            'í' | 'ì' | 'ï' => 'i',
            'ó' | 'ò' | 'ö' => 'o',
            'ú' | 'ù' | 'ü' => 'u',
            'ñ' => 'n',
            'Ñ' => 'N',
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();

    let mut encoded = String::with_capacity(file_name.len() * 3);
    for byte in file_name.bytes() {
        if byte.is_ascii_alphanumeric() || b"-._~".contains(&byte) {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }

    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}
