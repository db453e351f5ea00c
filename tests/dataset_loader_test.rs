// Tests for loading the dataset from disk
// Covers fatal load errors and the measurement/metadata contract

mod common;

use chrono::Datelike;
use station_averages_service::dataset::{Dataset, DatasetSource, LoadError};
use station_averages_service::importers::{CsvImportError, CsvImporter, MetadataImportError};
use std::path::PathBuf;

fn source(measurements: PathBuf, metadata: Option<PathBuf>) -> DatasetSource {
    DatasetSource {
        measurements_path: measurements,
        metadata_path: metadata,
        metadata_sheet: None,
    }
}

#[test]
fn test_load_measurements_from_file() {
    let file = common::write_temp_csv(common::MEASUREMENTS_CSV);
    let dataset = Dataset::load(&source(file.path().to_path_buf(), None)).unwrap();

    assert!(!dataset.has_metadata());
    assert_eq!(dataset.records().len(), 8);
    assert_eq!(dataset.variables(), ["Temp", "Pp"]);
    assert_eq!(dataset.stations(), ["A1", "B2", "C3"]);
    assert_eq!(dataset.records()[0].timestamp.year(), 2030);
}

#[test]
fn test_missing_measurement_file_is_fatal() {
    let result = Dataset::load(&source(PathBuf::from("/nonexistent/medidas.csv"), None));

    match result {
        Err(LoadError::Measurements(CsvImportError::FileOpen { path, .. })) => {
            assert_eq!(path, "/nonexistent/medidas.csv");
        }
        other => panic!("Expected FileOpen error, got {other:?}"),
    }
}

#[test]
fn test_missing_metadata_file_is_fatal() {
    let file = common::write_temp_csv(common::MEASUREMENTS_CSV);
    let result = Dataset::load(&source(
        file.path().to_path_buf(),
        Some(PathBuf::from("/nonexistent/estaciones.xlsx")),
    ));

    assert!(matches!(
        result,
        Err(LoadError::Metadata(MetadataImportError::WorkbookOpen(_)))
    ));
}

#[test]
fn test_unparseable_date_is_fatal() {
    let file = common::write_temp_csv(
        "ID_SIGA,Escenario,Fecha,Temp\n\
         A1,RCP45,2030-01-01,1.0\n\
         A1,RCP45,enero,2.0\n",
    );
    let result = Dataset::load(&source(file.path().to_path_buf(), None));

    match result {
        Err(LoadError::Measurements(CsvImportError::InvalidDate { row, value })) => {
            assert_eq!(row, 3);
            assert_eq!(value, "enero");
        }
        other => panic!("Expected InvalidDate error, got {other:?}"),
    }
}

#[test]
fn test_year_only_dates_load() {
    let file = common::write_temp_csv(
        "ID_SIGA,Escenario,Fecha,Temp\n\
         A1,RCP45,2030,1.0\n\
         A1,RCP45,2031,3.0\n\
         A1,RCP85,2031-06,5.0\n",
    );
    let dataset = Dataset::load(&source(file.path().to_path_buf(), None)).unwrap();

    assert_eq!(dataset.records().len(), 3);
    let years: Vec<i32> = dataset.records().iter().map(|r| r.year()).collect();
    assert_eq!(years, vec![2030, 2031, 2031]);
    assert_eq!(dataset.records()[0].timestamp.month(), 1);
    assert_eq!(dataset.records()[2].timestamp.month(), 6);
}

#[test]
fn test_non_numeric_variable_is_fatal() {
    let data = "ID_SIGA,Escenario,Fecha,Temp\nA1,RCP45,2030-01-01,caliente\n";
    match CsvImporter::read_from(data.as_bytes(), false) {
        Err(CsvImportError::InvalidValue { row, column, value }) => {
            assert_eq!(row, 2);
            assert_eq!(column, "Temp");
            assert_eq!(value, "caliente");
        }
        other => panic!("Expected InvalidValue error, got {other:?}"),
    }
}

#[test]
fn test_missing_values_load_as_none() {
    let data = "ID_SIGA,Escenario,Fecha,Temp,Pp\n\
                A1,RCP45,2030-01-01,,nan\n\
                A1,RCP45,2030-01-02,NA,1.5\n";
    let table = CsvImporter::read_from(data.as_bytes(), false).unwrap();

    assert_eq!(table.records[0].values, vec![None, None]);
    assert_eq!(table.records[1].values, vec![None, Some(1.5)]);
}

#[test]
fn test_numeric_station_ids_sort_numerically() {
    let data = "ID_SIGA,Escenario,Fecha,Temp\n\
                1000,RCP45,2030-01-01,1\n\
                200,RCP45,2030-01-01,1\n\
                30,RCP45,2030-01-01,1\n";
    let table = CsvImporter::read_from(data.as_bytes(), false).unwrap();
    let dataset = Dataset::from_parts(table, None);

    assert_eq!(dataset.stations(), ["30", "200", "1000"]);
}

#[test]
fn test_extended_variant_reserves_basin_columns() {
    let data = "ID_SIGA,Escenario,Fecha,Cuenca,Subcuenca,Temp\n\
                A1,RCP45,2030-01-01,Maule,Alto,1\n";
    let table = CsvImporter::read_from(data.as_bytes(), true).unwrap();

    assert_eq!(table.variables, vec!["Temp"]);
}

#[test]
fn test_extended_join_from_parts() {
    let table = CsvImporter::read_from(common::MEASUREMENTS_CSV.as_bytes(), true).unwrap();
    let dataset = Dataset::from_parts(table, Some(common::station_metadata()));

    assert!(dataset.has_metadata());
    // D4 has metadata but no measurements, so Loa never shows up
    assert_eq!(dataset.basins(), ["Maule"]);

    let labels: Vec<String> = dataset
        .station_options(Some("Maule"))
        .into_iter()
        .map(|o| o.label)
        .collect();
    assert_eq!(labels, vec!["A1 - Alto", "B2 - Bajo"]);

    let all: Vec<String> = dataset
        .station_options(None)
        .into_iter()
        .map(|o| o.label)
        .collect();
    assert_eq!(all, vec!["A1 - Alto", "B2 - Bajo", "C3"]);
}
