// Dataset module
//
// The loaded measurement table, optionally joined with station metadata.
// Built once at startup and shared read-only (behind an Arc) for the life of
// the process; every derived table is recomputed from it per request.

pub mod error;
pub mod models;
pub mod schema;

pub use error::LoadError;
pub use models::*;

use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{info, instrument, warn};

use crate::importers::{CsvImporter, ExcelImporter, MeasurementTable};

/// Where to load the dataset from
#[derive(Debug, Clone)]
pub struct DatasetSource {
    pub measurements_path: PathBuf,
    pub metadata_path: Option<PathBuf>,
    pub metadata_sheet: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Dataset {
    variables: Vec<String>,
    records: Vec<MeasurementRecord>,
    has_metadata: bool,
    stations: Vec<String>,
    basins: Vec<String>,
}

impl Dataset {
    /// Load and join the inputs; any failure here is fatal for the session
    #[instrument(skip(source), fields(measurements = %source.measurements_path.display()))]
    pub fn load(source: &DatasetSource) -> Result<Self, LoadError> {
        let has_metadata = source.metadata_path.is_some();
        let table = CsvImporter::new(source.measurements_path.clone()).read(has_metadata)?;

        let metadata = match &source.metadata_path {
            Some(path) => Some(
                ExcelImporter::new(path.display().to_string())
                    .with_sheet(source.metadata_sheet.clone())
                    .read()?,
            ),
            None => None,
        };

        Ok(Self::from_parts(table, metadata))
    }

    /// Assemble a dataset from already-parsed parts
    ///
    /// Passing `Some(metadata)` enables the basin → station grouping and
    /// left-joins basin/sub-basin onto every record. Records whose station has
    /// no metadata row keep `None` for both fields.
    pub fn from_parts(table: MeasurementTable, metadata: Option<Vec<StationMetadata>>) -> Self {
        let MeasurementTable {
            variables,
            mut records,
        } = table;
        let has_metadata = metadata.is_some();

        if let Some(metadata) = metadata {
            let lookup = Self::metadata_lookup(&metadata);
            let mut unmatched = 0usize;
            for record in &mut records {
                match lookup.get(record.station_id.as_str()) {
                    Some(meta) => {
                        record.basin = meta.basin.clone();
                        record.sub_basin = meta.sub_basin.clone();
                    }
                    None => {
                        record.basin = None;
                        record.sub_basin = None;
                        unmatched += 1;
                    }
                }
            }
            if unmatched > 0 {
                warn!("{} measurement rows have no station metadata", unmatched);
            }
        }

        let stations = schema::station_keys(&records);
        let basins = schema::basin_keys(&records);

        info!(
            "Dataset ready: {} rows, {} variables, {} stations, {} basins",
            records.len(),
            variables.len(),
            stations.len(),
            basins.len()
        );

        Self {
            variables,
            records,
            has_metadata,
            stations,
            basins,
        }
    }

    /// Index metadata by station id; the first row for a station wins
    fn metadata_lookup(metadata: &[StationMetadata]) -> HashMap<&str, &StationMetadata> {
        let mut lookup = HashMap::with_capacity(metadata.len());
        for meta in metadata {
            if lookup.contains_key(meta.station_id.as_str()) {
                warn!(
                    "Duplicate metadata for station {}, keeping first row",
                    meta.station_id
                );
                continue;
            }
            lookup.insert(meta.station_id.as_str(), meta);
        }
        lookup
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn variable_index(&self, variable: &str) -> Option<usize> {
        self.variables.iter().position(|v| v == variable)
    }

    pub fn records(&self) -> &[MeasurementRecord] {
        &self.records
    }

    pub fn has_metadata(&self) -> bool {
        self.has_metadata
    }

    /// Sorted distinct station ids
    pub fn stations(&self) -> &[String] {
        &self.stations
    }

    /// Sorted distinct basins; always empty for the base variant
    pub fn basins(&self) -> &[String] {
        &self.basins
    }

    /// Station selector options, optionally narrowed to one basin
    pub fn station_options(&self, basin: Option<&str>) -> Vec<StationOption> {
        match basin {
            Some(basin) if self.has_metadata => schema::stations_in_basin(&self.records, basin),
            _ if self.has_metadata => {
                let mut subs: HashMap<&str, Option<&str>> = HashMap::new();
                for record in &self.records {
                    subs.entry(record.station_id.as_str())
                        .or_insert(record.sub_basin.as_deref());
                }
                self.stations
                    .iter()
                    .map(|id| {
                        let sub = subs.get(id.as_str()).copied().flatten();
                        StationOption::with_sub_basin(id.clone(), sub.map(str::to_string))
                    })
                    .collect()
            }
            _ => self.stations.iter().cloned().map(StationOption::plain).collect(),
        }
    }

    /// Rows recorded for one station
    pub fn records_for_station<'a>(
        &'a self,
        station_id: &'a str,
    ) -> impl Iterator<Item = &'a MeasurementRecord> + 'a {
        self.records
            .iter()
            .filter(move |r| r.station_id == station_id)
    }
}
