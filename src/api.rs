use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use utoipa::{IntoParams, OpenApi, ToSchema};

use crate::chart::{ChartKind, ChartPoint, ChartSpec};
use crate::dataset::StationOption;
use crate::selection::{ModeKind, SelectionQuery};
use crate::services::export_service::content_disposition;
use crate::services::{AveragesError, AveragesService, AveragesView, DisplayTable, SchemaResponse};

#[derive(Clone)]
pub struct AppState {
    pub averages_service: AveragesService,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StationsQuery {
    /// Restrict to stations of this basin (requires station metadata); blank means all
    pub basin: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        get_schema,
        get_basins,
        get_stations,
        get_averages,
        export_averages
    ),
    components(schemas(
        HealthResponse,
        SchemaResponse,
        StationOption,
        AveragesView,
        DisplayTable,
        ChartSpec,
        ChartPoint,
        ChartKind,
        ModeKind
    )),
    tags(
        (name = "health", description = "Service health"),
        (name = "stations", description = "Station and basin selectors"),
        (name = "averages", description = "Scenario averages per station")
    )
)]
pub struct ApiDoc;

pub fn generate_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health))
        .route("/schema", get(get_schema))
        .route("/basins", get(get_basins))
        .route("/stations", get(get_stations))
        .route("/averages", get(get_averages))
        .route("/averages/export", get(export_averages))
        .with_state(state);

    Router::new().nest("/api/v1", api_routes)
}

#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses((status = 200, description = "Service is healthy", body = HealthResponse)),
    tag = "health"
)]
#[instrument(skip(_state))]
async fn health(State(_state): State<AppState>) -> impl IntoResponse {
    debug!("Health check requested");
    let response = HealthResponse {
        status: "healthy".to_string(),
    };
    (StatusCode::OK, Json(response))
}

#[utoipa::path(
    get,
    path = "/api/v1/schema",
    responses((status = 200, description = "Variables and averaging modes", body = SchemaResponse)),
    tag = "stations"
)]
#[instrument(skip(state))]
async fn get_schema(State(state): State<AppState>) -> Json<SchemaResponse> {
    let schema = state.averages_service.schema();
    debug!("Schema has {} variables", schema.variables.len());
    Json(schema)
}

#[utoipa::path(
    get,
    path = "/api/v1/basins",
    responses(
        (status = 200, description = "Sorted basin names", body = [String]),
        (status = 404, description = "No station metadata configured")
    ),
    tag = "stations"
)]
#[instrument(skip(state))]
async fn get_basins(State(state): State<AppState>) -> Result<Json<Vec<String>>, StatusCode> {
    let basins = state.averages_service.basins().ok_or_else(|| {
        warn!("Basins requested but no station metadata is loaded");
        StatusCode::NOT_FOUND
    })?;

    info!("Retrieved {} basins", basins.len());
    Ok(Json(basins))
}

#[utoipa::path(
    get,
    path = "/api/v1/stations",
    params(StationsQuery),
    responses(
        (status = 200, description = "Station selector options", body = [StationOption]),
        (status = 400, description = "Basin filter without station metadata")
    ),
    tag = "stations"
)]
#[instrument(skip(state))]
async fn get_stations(
    State(state): State<AppState>,
    Query(query): Query<StationsQuery>,
) -> Result<Json<Vec<StationOption>>, StatusCode> {
    let basin = query.basin.as_deref().map(str::trim).filter(|b| !b.is_empty());
    if basin.is_some() && !state.averages_service.dataset().has_metadata() {
        warn!("Basin filter {:?} requested without station metadata", basin);
        return Err(StatusCode::BAD_REQUEST);
    }

    let stations = state.averages_service.stations(basin);
    if stations.is_empty() {
        warn!("No stations available for basin {:?}", basin);
    }

    info!("Retrieved {} station options", stations.len());
    Ok(Json(stations))
}

#[utoipa::path(
    get,
    path = "/api/v1/averages",
    params(SelectionQuery),
    responses(
        (status = 200, description = "Chart, table and export name for the selection", body = AveragesView),
        (status = 400, description = "Invalid selection")
    ),
    tag = "averages"
)]
#[instrument(skip(state))]
async fn get_averages(
    State(state): State<AppState>,
    Query(query): Query<SelectionQuery>,
) -> Result<Json<AveragesView>, StatusCode> {
    let view = state.averages_service.averages(&query).map_err(|e| {
        warn!("Rejected selection {:?}: {}", query, e);
        StatusCode::BAD_REQUEST
    })?;

    info!(
        "Computed {} rows for station {:?} ({})",
        view.table.rows.len(),
        view.station,
        view.mode
    );

    Ok(Json(view))
}

#[utoipa::path(
    get,
    path = "/api/v1/averages/export",
    params(SelectionQuery),
    responses(
        (status = 200, description = "Averages as CSV", body = String, content_type = "text/csv"),
        (status = 400, description = "Invalid selection"),
        (status = 404, description = "No station available")
    ),
    tag = "averages"
)]
#[instrument(skip(state))]
async fn export_averages(
    State(state): State<AppState>,
    Query(query): Query<SelectionQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let file = state
        .averages_service
        .export(&query)
        .map_err(|e| match e {
            AveragesError::Selection(e) => {
                warn!("Rejected export selection {:?}: {}", query, e);
                StatusCode::BAD_REQUEST
            }
            AveragesError::Export(e) => {
                error!("Failed to serialize export: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        })?
        .ok_or_else(|| {
            warn!("No station available for export");
            StatusCode::NOT_FOUND
        })?;

    info!("Serving export {}", file.file_name);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                content_disposition(&file.file_name),
            ),
        ],
        file.content,
    ))
}
