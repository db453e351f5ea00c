// Shared fixtures for integration tests
#![allow(dead_code)]

use std::io::Write;
use std::sync::Arc;

use station_averages_service::dataset::{Dataset, StationMetadata};
use station_averages_service::importers::CsvImporter;
use tempfile::NamedTempFile;

/// A1 has two RCP45 rows (Temp 10 and 20) and three RCP85 rows across 2030-2031.
/// B2 has a NaN precipitation value. C3 has no metadata row.
pub const MEASUREMENTS_CSV: &str = "\
ID_SIGA,Escenario,Fecha,Temp,Pp
A1,RCP45,2030-01-01,10.0,1.0
A1,RCP45,2031-01-01,20.0,
A1,RCP85,2030-01-01,12.0,2.0
A1,RCP85,2030-07-01,14.0,4.0
A1,RCP85,2031-01-01,16.0,3.0
B2,RCP45,2030-01-01,5.0,0.5
B2,Historico,2031-06-15,7.0,NaN
C3,RCP85,2032-03-01,1.0,1.0
";

pub const VARIABLES: [&str; 2] = ["Temp", "Pp"];

pub fn station_metadata() -> Vec<StationMetadata> {
    vec![
        StationMetadata {
            station_id: "A1".to_string(),
            basin: Some("Maule".to_string()),
            sub_basin: Some("Alto".to_string()),
        },
        StationMetadata {
            station_id: "B2".to_string(),
            basin: Some("Maule".to_string()),
            sub_basin: Some("Bajo".to_string()),
        },
        StationMetadata {
            station_id: "D4".to_string(),
            basin: Some("Loa".to_string()),
            sub_basin: Some("Norte".to_string()),
        },
    ]
}

/// Dataset without station metadata
pub fn base_dataset() -> Arc<Dataset> {
    let table = CsvImporter::read_from(MEASUREMENTS_CSV.as_bytes(), false)
        .expect("Failed to parse fixture measurements");
    Arc::new(Dataset::from_parts(table, None))
}

/// Dataset joined with `station_metadata()`
pub fn extended_dataset() -> Arc<Dataset> {
    let table = CsvImporter::read_from(MEASUREMENTS_CSV.as_bytes(), true)
        .expect("Failed to parse fixture measurements");
    Arc::new(Dataset::from_parts(table, Some(station_metadata())))
}

/// Write `contents` to a temporary `.csv` file that lives as long as the handle
pub fn write_temp_csv(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(contents.as_bytes())
        .expect("Failed to write temp file");
    file
}
