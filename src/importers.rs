//! Importers for the measurement table (CSV) and station metadata (spreadsheet)

pub mod csv_importer;
pub mod excel_importer;

// Re-export commonly used items
pub use csv_importer::{CsvImportError, CsvImporter, MeasurementTable};
pub use excel_importer::{ExcelImporter, MetadataImportError};
