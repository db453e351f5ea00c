use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

use crate::aggregation::{aggregate_per_year, aggregate_total, AggregatedResult};
use crate::chart::{chart_for, ChartSpec};
use crate::dataset::{Dataset, StationOption};
use crate::selection::{AggregationMode, ModeKind, Selection, SelectionError, SelectionQuery};
use crate::services::export_service::{self, DisplayTable, ExportError, ExportFile};

#[derive(Debug, thiserror::Error)]
pub enum AveragesError {
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SchemaResponse {
    pub has_metadata: bool,
    pub variables: Vec<String>,
    pub modes: Vec<ModeKind>,
}

/// Everything the UI shell renders for one selection
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AveragesView {
    /// `None` when no station was available and computation was skipped
    pub station: Option<String>,
    pub basin: Option<String>,
    pub mode: ModeKind,
    pub variable: Option<String>,
    pub table: DisplayTable,
    pub chart: Option<ChartSpec>,
    pub file_name: Option<String>,
}

#[derive(Clone)]
pub struct AveragesService {
    dataset: Arc<Dataset>,
}

impl AveragesService {
    pub fn new(dataset: Arc<Dataset>) -> Self {
        Self { dataset }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn schema(&self) -> SchemaResponse {
        SchemaResponse {
            has_metadata: self.dataset.has_metadata(),
            variables: self.dataset.variables().to_vec(),
            modes: ModeKind::ALL.to_vec(),
        }
    }

    /// Basins to choose from, `None` when no metadata was loaded
    pub fn basins(&self) -> Option<Vec<String>> {
        self.dataset
            .has_metadata()
            .then(|| self.dataset.basins().to_vec())
    }

    pub fn stations(&self, basin: Option<&str>) -> Vec<StationOption> {
        self.dataset.station_options(basin)
    }

    /// Run the aggregation for a resolved selection
    ///
    /// A station without records yields an empty result, not an error.
    #[instrument(skip(self), fields(station = %selection.station, mode = %selection.mode.kind()))]
    pub fn aggregate(&self, selection: &Selection) -> Result<AggregatedResult, SelectionError> {
        let records = self.dataset.records_for_station(&selection.station);

        let result = match &selection.mode {
            AggregationMode::Total => {
                AggregatedResult::Total(aggregate_total(records, self.dataset.variables()))
            }
            AggregationMode::PerYear { variable } => {
                let index = self
                    .dataset
                    .variable_index(variable)
                    .ok_or_else(|| SelectionError::UnknownVariable(variable.clone()))?;
                AggregatedResult::PerYear(aggregate_per_year(records, index, variable))
            }
        };

        if result.is_empty() {
            debug!("No records for station {}", selection.station);
        }
        info!("Computed {} average rows", result.len());
        Ok(result)
    }

    /// Resolve the query and build chart, table and file name
    #[instrument(skip(self))]
    pub fn averages(&self, query: &SelectionQuery) -> Result<AveragesView, SelectionError> {
        let Some(selection) = query.resolve(&self.dataset)? else {
            let mode = match query.mode.as_deref() {
                Some(mode) => mode.parse::<ModeKind>()?,
                None => ModeKind::Total,
            };
            return Ok(AveragesView {
                station: None,
                basin: query.basin.clone(),
                mode,
                variable: None,
                table: DisplayTable {
                    columns: Vec::new(),
                    rows: Vec::new(),
                },
                chart: None,
                file_name: None,
            });
        };

        let result = self.aggregate(&selection)?;

        Ok(AveragesView {
            chart: Some(chart_for(&selection.station, &result)),
            table: export_service::display_table(&result),
            file_name: Some(export_service::export_file_name(
                &selection.station,
                &selection.mode,
            )),
            mode: selection.mode.kind(),
            variable: selection.mode.variable().map(str::to_string),
            station: Some(selection.station),
            basin: selection.basin,
        })
    }

    /// Resolve the query and serialize the result; `None` when no station is available
    #[instrument(skip(self))]
    pub fn export(&self, query: &SelectionQuery) -> Result<Option<ExportFile>, AveragesError> {
        let Some(selection) = query.resolve(&self.dataset)? else {
            return Ok(None);
        };

        let result = self.aggregate(&selection)?;
        let file = export_service::export(&selection.station, &selection.mode, &result)?;
        info!("Prepared export {} ({} bytes)", file.file_name, file.content.len());
        Ok(Some(file))
    }
}
