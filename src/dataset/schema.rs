//! Column contract and grouping-key derivation for the measurement table.

use std::collections::BTreeSet;

use super::models::{MeasurementRecord, StationOption};
use crate::utils::compare_keys;

pub const STATION_COLUMN: &str = "ID_SIGA";
pub const SCENARIO_COLUMN: &str = "Escenario";
pub const DATE_COLUMN: &str = "Fecha";
pub const BASIN_COLUMN: &str = "Cuenca";
pub const SUB_BASIN_COLUMN: &str = "Subcuenca";
pub const YEAR_COLUMN: &str = "Año";

const BASE_RESERVED: [&str; 3] = [SCENARIO_COLUMN, STATION_COLUMN, DATE_COLUMN];
const EXTENDED_RESERVED: [&str; 5] = [
    SCENARIO_COLUMN,
    STATION_COLUMN,
    DATE_COLUMN,
    BASIN_COLUMN,
    SUB_BASIN_COLUMN,
];

/// Identifier and label columns that never count as variables
pub fn reserved_columns(has_metadata: bool) -> &'static [&'static str] {
    if has_metadata {
        &EXTENDED_RESERVED
    } else {
        &BASE_RESERVED
    }
}

/// Every column that is not reserved, in header order
pub fn variable_set<'a, I>(columns: I, has_metadata: bool) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let reserved = reserved_columns(has_metadata);
    columns
        .into_iter()
        .filter(|c| !reserved.contains(c))
        .map(str::to_string)
        .collect()
}

/// Sorted distinct station identifiers
pub fn station_keys(records: &[MeasurementRecord]) -> Vec<String> {
    let distinct: BTreeSet<&str> = records.iter().map(|r| r.station_id.as_str()).collect();
    let mut keys: Vec<String> = distinct.into_iter().map(str::to_string).collect();
    keys.sort_by(|a, b| compare_keys(a, b));
    keys
}

/// Sorted distinct basins, nulls dropped
pub fn basin_keys(records: &[MeasurementRecord]) -> Vec<String> {
    let distinct: BTreeSet<&str> = records.iter().filter_map(|r| r.basin.as_deref()).collect();
    let mut keys: Vec<String> = distinct.into_iter().map(str::to_string).collect();
    keys.sort_by(|a, b| compare_keys(a, b));
    keys
}

/// Distinct (station, sub-basin) pairs recorded under `basin`
///
/// Returns an empty list for a basin with no stations, including unknown basins.
pub fn stations_in_basin(records: &[MeasurementRecord], basin: &str) -> Vec<StationOption> {
    let pairs: BTreeSet<(&str, Option<&str>)> = records
        .iter()
        .filter(|r| r.basin.as_deref() == Some(basin))
        .map(|r| (r.station_id.as_str(), r.sub_basin.as_deref()))
        .collect();

    let mut options: Vec<StationOption> = pairs
        .into_iter()
        .map(|(id, sub)| StationOption::with_sub_basin(id, sub.map(str::to_string)))
        .collect();
    options.sort_by(|a, b| compare_keys(&a.id, &b.id).then_with(|| a.sub_basin.cmp(&b.sub_basin)));
    options
}
