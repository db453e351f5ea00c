// Aggregation module
//
// Collapses one station's rows into scenario means, either over the whole
// period (Total) or per calendar year for a single variable (Por año).
// Groups come out sorted by key, so identical inputs always give identical
// output rows.

pub mod reshape;

pub use reshape::LongAverage;

use serde::Serialize;
use std::collections::BTreeMap;

use crate::dataset::schema::{SCENARIO_COLUMN, YEAR_COLUMN};
use crate::dataset::MeasurementRecord;

/// Running sum/count that skips missing values
#[derive(Debug, Clone, Copy, Default)]
struct MeanAccumulator {
    sum: f64,
    count: usize,
}

impl MeanAccumulator {
    fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Means of every variable for one scenario
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioAverages {
    pub scenario: String,
    /// Aligned with `TotalAverages::variables`; `None` when every value was missing
    pub means: Vec<Option<f64>>,
}

/// Total mode result: one row per scenario, one column per variable
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TotalAverages {
    pub variables: Vec<String>,
    pub rows: Vec<ScenarioAverages>,
}

impl TotalAverages {
    /// Cell lookup by scenario and variable name
    pub fn get(&self, scenario: &str, variable: &str) -> Option<Option<f64>> {
        let col = self.variables.iter().position(|v| v == variable)?;
        let row = self.rows.iter().find(|r| r.scenario == scenario)?;
        row.means.get(col).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyAverage {
    pub year: i32,
    pub scenario: String,
    pub mean: Option<f64>,
}

/// Per-year mode result: one row per (year, scenario) for a single variable
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyAverages {
    pub variable: String,
    pub rows: Vec<YearlyAverage>,
}

/// Output of one aggregation pass
#[derive(Debug, Clone, PartialEq)]
pub enum AggregatedResult {
    Total(TotalAverages),
    PerYear(YearlyAverages),
}

impl AggregatedResult {
    pub fn len(&self) -> usize {
        match self {
            AggregatedResult::Total(t) => t.rows.len(),
            AggregatedResult::PerYear(y) => y.rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Column headers, known even when there are no rows
    pub fn columns(&self) -> Vec<String> {
        match self {
            AggregatedResult::Total(t) => std::iter::once(SCENARIO_COLUMN.to_string())
                .chain(t.variables.iter().cloned())
                .collect(),
            AggregatedResult::PerYear(y) => vec![
                YEAR_COLUMN.to_string(),
                SCENARIO_COLUMN.to_string(),
                y.variable.clone(),
            ],
        }
    }
}

/// Mean of every variable per scenario
///
/// Each variable skips its own missing values, so a gap in one column does
/// not drop the row from the others. Scenarios absent from `records` do not
/// appear; an empty input gives an empty result.
pub fn aggregate_total<'a, I>(records: I, variables: &[String]) -> TotalAverages
where
    I: IntoIterator<Item = &'a MeasurementRecord>,
{
    let mut groups: BTreeMap<&'a str, Vec<MeanAccumulator>> = BTreeMap::new();

    for record in records {
        let accumulators = groups
            .entry(record.scenario.as_str())
            .or_insert_with(|| vec![MeanAccumulator::default(); variables.len()]);
        for (acc, value) in accumulators.iter_mut().zip(&record.values) {
            acc.push(*value);
        }
    }

    let rows = groups
        .into_iter()
        .map(|(scenario, accumulators)| ScenarioAverages {
            scenario: scenario.to_string(),
            means: accumulators.iter().map(MeanAccumulator::mean).collect(),
        })
        .collect();

    TotalAverages {
        variables: variables.to_vec(),
        rows,
    }
}

/// Mean of one variable per (calendar year, scenario)
///
/// `variable_index` addresses `MeasurementRecord::values`; `variable` is the
/// column name carried into the result.
pub fn aggregate_per_year<'a, I>(
    records: I,
    variable_index: usize,
    variable: &str,
) -> YearlyAverages
where
    I: IntoIterator<Item = &'a MeasurementRecord>,
{
    let mut groups: BTreeMap<(i32, &'a str), MeanAccumulator> = BTreeMap::new();

    for record in records {
        groups
            .entry((record.year(), record.scenario.as_str()))
            .or_default()
            .push(record.values.get(variable_index).copied().flatten());
    }

    let rows = groups
        .into_iter()
        .map(|((year, scenario), acc)| YearlyAverage {
            year,
            scenario: scenario.to_string(),
            mean: acc.mean(),
        })
        .collect();

    YearlyAverages {
        variable: variable.to_string(),
        rows,
    }
}
