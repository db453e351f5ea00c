use chrono::{Datelike, NaiveDateTime};
use serde::Serialize;
use utoipa::ToSchema;

// Loaded entity models
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRecord {
    pub station_id: String,
    pub scenario: String,
    pub timestamp: NaiveDateTime,
    /// One entry per variable, aligned with the dataset's variable set
    pub values: Vec<Option<f64>>,
    /// Filled by the metadata join; `None` for the base variant or unmatched stations
    pub basin: Option<String>,
    pub sub_basin: Option<String>,
}

impl MeasurementRecord {
    /// Calendar year of the timestamp
    pub fn year(&self) -> i32 {
        self.timestamp.year()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationMetadata {
    pub station_id: String,
    pub basin: Option<String>,
    pub sub_basin: Option<String>,
}

// API response DTOs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StationOption {
    pub id: String,
    pub sub_basin: Option<String>,
    /// Selector label: "id - sub-basin" in the extended variant, the bare id otherwise
    pub label: String,
}

impl StationOption {
    pub fn plain(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            sub_basin: None,
        }
    }

    pub fn with_sub_basin(id: impl Into<String>, sub_basin: Option<String>) -> Self {
        let id = id.into();
        let label = match &sub_basin {
            Some(sub) => format!("{id} - {sub}"),
            None => id.clone(),
        };
        Self {
            id,
            sub_basin,
            label,
        }
    }
}
