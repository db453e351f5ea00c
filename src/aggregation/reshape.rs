//! Wide → long pivot of Total mode averages for grouped-bar charting.

use serde::Serialize;

use super::{ScenarioAverages, TotalAverages};

pub const VARIABLE_COLUMN: &str = "Variable";
pub const MEAN_COLUMN: &str = "Promedio";

/// One (scenario, variable) cell of the wide table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LongAverage {
    pub scenario: String,
    pub variable: String,
    pub mean: Option<f64>,
}

impl TotalAverages {
    /// Melt into (Escenario, Variable, Promedio) rows
    ///
    /// Rows are emitted variable by variable, scenarios in table order within
    /// each variable. Always yields `rows × variables` entries.
    pub fn melt(&self) -> Vec<LongAverage> {
        let mut long = Vec::with_capacity(self.rows.len() * self.variables.len());
        for (col, variable) in self.variables.iter().enumerate() {
            for row in &self.rows {
                long.push(LongAverage {
                    scenario: row.scenario.clone(),
                    variable: variable.clone(),
                    mean: row.means.get(col).copied().flatten(),
                });
            }
        }
        long
    }

    /// Pivot long rows back into the wide table
    ///
    /// Scenarios keep their first-seen order; entries naming a variable
    /// outside `variables` are ignored.
    pub fn from_long(variables: Vec<String>, long: &[LongAverage]) -> Self {
        let mut rows: Vec<ScenarioAverages> = Vec::new();
        for entry in long {
            let Some(col) = variables.iter().position(|v| *v == entry.variable) else {
                continue;
            };
            let idx = match rows.iter().position(|r| r.scenario == entry.scenario) {
                Some(idx) => idx,
                None => {
                    rows.push(ScenarioAverages {
                        scenario: entry.scenario.clone(),
                        means: vec![None; variables.len()],
                    });
                    rows.len() - 1
                }
            };
            rows[idx].means[col] = entry.mean;
        }
        Self { variables, rows }
    }
}
