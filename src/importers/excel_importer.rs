use calamine::{open_workbook_auto, Data, Range, Reader};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::dataset::schema::{BASIN_COLUMN, STATION_COLUMN, SUB_BASIN_COLUMN};
use crate::dataset::StationMetadata;
use crate::utils::normalize_station_id;

#[derive(Error, Debug)]
pub enum MetadataImportError {
    #[error("Failed to open workbook: {0}")]
    WorkbookOpen(String),

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Workbook has no sheets")]
    NoSheets,

    #[error("Missing header row")]
    MissingHeader,

    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),
}

/// Reader for the station metadata workbook (ID_SIGA, Cuenca, Subcuenca)
///
/// Accepts any format calamine detects from the extension (xlsx, xlsm, xls, ods).
pub struct ExcelImporter {
    workbook_path: String,
    sheet: Option<String>,
}

impl ExcelImporter {
    pub fn new(workbook_path: impl Into<String>) -> Self {
        Self {
            workbook_path: workbook_path.into(),
            sheet: None,
        }
    }

    /// Read from a named sheet instead of the first one
    pub fn with_sheet(mut self, sheet: Option<String>) -> Self {
        self.sheet = sheet;
        self
    }

    /// Parse station metadata from the configured sheet
    ///
    /// # Expected Sheet Structure:
    /// ```text
    /// Row 1: Header (ID_SIGA | Cuenca | Subcuenca | ...any other columns)
    /// Row 2+: One station per row
    /// ```
    pub fn read(&self) -> Result<Vec<StationMetadata>, MetadataImportError> {
        info!("Reading station metadata from {}", self.workbook_path);

        // Synchronous; callers on the async runtime should use spawn_blocking
        let mut workbook = open_workbook_auto(&self.workbook_path)
            .map_err(|e| MetadataImportError::WorkbookOpen(e.to_string()))?;

        let sheet_name = match &self.sheet {
            Some(name) => name.clone(),
            None => workbook
                .sheet_names()
                .first()
                .cloned()
                .ok_or(MetadataImportError::NoSheets)?,
        };

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|_| MetadataImportError::SheetNotFound(sheet_name.clone()))?;

        let stations = parse_metadata_range(&range)?;
        info!(
            "Parsed {} station metadata rows from sheet {}",
            stations.len(),
            sheet_name
        );
        Ok(stations)
    }
}

/// Parse metadata rows from a worksheet range whose first row is the header
pub fn parse_metadata_range(
    range: &Range<Data>,
) -> Result<Vec<StationMetadata>, MetadataImportError> {
    let mut rows = range.rows();
    let header = rows.next().ok_or(MetadataImportError::MissingHeader)?;

    let column = |name: &'static str| {
        header
            .iter()
            .position(|cell| cell_text(cell).as_deref() == Some(name))
            .ok_or(MetadataImportError::MissingColumn(name))
    };
    let station_col = column(STATION_COLUMN)?;
    let basin_col = column(BASIN_COLUMN)?;
    let sub_basin_col = column(SUB_BASIN_COLUMN)?;

    let mut stations = Vec::new();
    for (i, row) in rows.enumerate() {
        let cell = |col: usize| row.get(col).and_then(cell_text);

        let Some(station_id) = cell(station_col) else {
            debug!("Skipping metadata row {} without station id", i + 2);
            continue;
        };

        stations.push(StationMetadata {
            station_id: normalize_station_id(&station_id),
            basin: cell(basin_col),
            sub_basin: cell(sub_basin_col),
        });
    }

    Ok(stations)
}

/// Text content of a cell, `None` for blanks and error cells
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) | Data::DateTimeIso(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                Some(format!("{f:.0}"))
            } else {
                Some(f.to_string())
            }
        }
        Data::Bool(b) => Some(b.to_string()),
        Data::Empty => None,
        other => {
            warn!("Unexpected metadata cell: {:?}", other);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(rows: &[&[Data]]) -> Range<Data> {
        let height = rows.len() as u32;
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(1) as u32;
        let mut range = Range::new((0, 0), (height - 1, width - 1));
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                range.set_value((r as u32, c as u32), value.clone());
            }
        }
        range
    }

    fn text(s: &str) -> Data {
        Data::String(s.to_string())
    }

    #[test]
    fn test_excel_importer_creation() {
        let importer = ExcelImporter::new("estaciones.xlsx").with_sheet(Some("Hoja1".into()));
        assert_eq!(importer.workbook_path, "estaciones.xlsx");
        assert_eq!(importer.sheet.as_deref(), Some("Hoja1"));
    }

    #[test]
    fn test_parse_metadata_range() {
        let range = sheet(&[
            &[text("Nombre"), text("ID_SIGA"), text("Cuenca"), text("Subcuenca")],
            &[text("Talca"), Data::Float(101.0), text("Maule"), text("Alto")],
            &[text("Linares"), Data::Int(102), text("Maule"), Data::Empty],
        ]);

        let stations = parse_metadata_range(&range).unwrap();
        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].station_id, "101");
        assert_eq!(stations[0].basin.as_deref(), Some("Maule"));
        assert_eq!(stations[0].sub_basin.as_deref(), Some("Alto"));
        assert_eq!(stations[1].station_id, "102");
        assert_eq!(stations[1].sub_basin, None);
    }

    #[test]
    fn test_parse_metadata_range_skips_blank_ids() {
        let range = sheet(&[
            &[text("ID_SIGA"), text("Cuenca"), text("Subcuenca")],
            &[Data::Empty, text("Maule"), text("Alto")],
            &[text("A1"), text("Maule"), text("Bajo")],
        ]);

        let stations = parse_metadata_range(&range).unwrap();
        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].station_id, "A1");
    }

    #[test]
    fn test_parse_metadata_range_missing_column() {
        let range = sheet(&[&[text("ID_SIGA"), text("Cuenca")]]);
        assert!(matches!(
            parse_metadata_range(&range),
            Err(MetadataImportError::MissingColumn("Subcuenca"))
        ));
    }

    #[test]
    fn test_workbook_not_found() {
        let importer = ExcelImporter::new("/nonexistent/estaciones.xlsx");
        assert!(matches!(
            importer.read(),
            Err(MetadataImportError::WorkbookOpen(_))
        ));
    }
}
