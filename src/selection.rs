use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;
use utoipa::{IntoParams, ToSchema};

use crate::dataset::Dataset;
use crate::utils::normalize_station_id;

/// The two averaging modes offered to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ModeKind {
    #[serde(rename = "Total")]
    Total,
    #[serde(rename = "Por año")]
    PerYear,
}

impl ModeKind {
    pub const ALL: [ModeKind; 2] = [ModeKind::Total, ModeKind::PerYear];

    /// Label shown on the mode selector
    pub fn label(&self) -> &'static str {
        match self {
            ModeKind::Total => "Total",
            ModeKind::PerYear => "Por año",
        }
    }

    /// Lowercased label with spaces replaced by underscores, used in file names
    pub fn slug(&self) -> String {
        self.label().to_lowercase().replace(' ', "_")
    }
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ModeKind {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "total" => Ok(ModeKind::Total),
            "por año" | "por ano" => Ok(ModeKind::PerYear),
            _ => Err(SelectionError::UnknownMode(s.to_string())),
        }
    }
}

/// Averaging mode with its payload; only per-year mode carries a variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregationMode {
    Total,
    PerYear { variable: String },
}

impl AggregationMode {
    pub fn kind(&self) -> ModeKind {
        match self {
            AggregationMode::Total => ModeKind::Total,
            AggregationMode::PerYear { .. } => ModeKind::PerYear,
        }
    }

    pub fn variable(&self) -> Option<&str> {
        match self {
            AggregationMode::Total => None,
            AggregationMode::PerYear { variable } => Some(variable),
        }
    }
}

/// A fully resolved user selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Basin the station was picked from (extended variant only)
    pub basin: Option<String>,
    pub station: String,
    pub mode: AggregationMode,
}

impl Selection {
    pub fn total(station: impl Into<String>) -> Self {
        Self {
            basin: None,
            station: station.into(),
            mode: AggregationMode::Total,
        }
    }

    pub fn per_year(station: impl Into<String>, variable: impl Into<String>) -> Self {
        Self {
            basin: None,
            station: station.into(),
            mode: AggregationMode::PerYear {
                variable: variable.into(),
            },
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Unknown aggregation mode: {0}")]
    UnknownMode(String),
    #[error("Unknown variable: {0}")]
    UnknownVariable(String),
    #[error("Dataset has no variable columns")]
    NoVariables,
    #[error("Station {station} is not in basin {basin}")]
    StationNotInBasin { station: String, basin: String },
    #[error("Basin filtering requires station metadata")]
    MetadataUnavailable,
}

/// Raw selector values as they arrive from the UI shell or the CLI
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SelectionQuery {
    /// Basin to pick the station from (requires station metadata)
    pub basin: Option<String>,
    /// Station id; defaults to the first available station
    pub station: Option<String>,
    /// "Total" or "Por año"; defaults to "Total"
    pub mode: Option<String>,
    /// Variable for "Por año"; defaults to the first variable
    pub variable: Option<String>,
}

impl SelectionQuery {
    /// Resolve raw selector values against the dataset
    ///
    /// Unset selectors take their first option, the way a selection widget
    /// does. Returns `Ok(None)` when there is no station to choose from, in
    /// which case computation is skipped.
    pub fn resolve(&self, dataset: &Dataset) -> Result<Option<Selection>, SelectionError> {
        let kind = match self.mode.as_deref() {
            Some(mode) => mode.parse::<ModeKind>()?,
            None => ModeKind::Total,
        };

        let mode = match kind {
            ModeKind::Total => {
                if let Some(variable) = &self.variable {
                    debug!("Ignoring variable {} in Total mode", variable);
                }
                AggregationMode::Total
            }
            ModeKind::PerYear => {
                let variable = match &self.variable {
                    Some(v) if dataset.variable_index(v).is_some() => v.clone(),
                    Some(v) => return Err(SelectionError::UnknownVariable(v.clone())),
                    None => dataset
                        .variables()
                        .first()
                        .cloned()
                        .ok_or(SelectionError::NoVariables)?,
                };
                AggregationMode::PerYear { variable }
            }
        };

        let basin = match self.basin.as_deref().map(str::trim) {
            Some(basin) if !basin.is_empty() => {
                if !dataset.has_metadata() {
                    return Err(SelectionError::MetadataUnavailable);
                }
                Some(basin.to_string())
            }
            _ => None,
        };

        let options = dataset.station_options(basin.as_deref());
        let station = match self.station.as_deref().map(normalize_station_id) {
            Some(station) if !station.is_empty() => {
                if let Some(basin) = &basin {
                    if !options.iter().any(|o| o.id == station) {
                        return Err(SelectionError::StationNotInBasin {
                            station,
                            basin: basin.clone(),
                        });
                    }
                }
                station
            }
            _ => match options.into_iter().next() {
                Some(first) => first.id,
                None => {
                    debug!("No station available for basin {:?}", basin);
                    return Ok(None);
                }
            },
        };

        Ok(Some(Selection {
            basin,
            station,
            mode,
        }))
    }
}
