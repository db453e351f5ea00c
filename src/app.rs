use std::sync::Arc;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::{create_router, AppState};
use crate::config::Config;
use crate::dataset::Dataset;
use crate::services::AveragesService;

/// Application with the loaded dataset and the spawned HTTP server
pub struct Application {
    pub dataset: Arc<Dataset>,
    pub server_handle: JoinHandle<Result<(), std::io::Error>>,
}

impl Application {
    /// Build and initialize the application
    ///
    /// Loads the dataset exactly once (a load failure aborts startup), then
    /// spawns the HTTP API server sharing it read-only.
    pub async fn build(config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        info!("Initializing application components");

        // Parsing is synchronous file I/O
        let source = config.dataset_source();
        let dataset = tokio::task::spawn_blocking(move || Dataset::load(&source)).await??;
        let dataset = Arc::new(dataset);

        let averages_service = AveragesService::new(dataset.clone());

        let app_state = AppState { averages_service };
        let app = create_router(app_state).layer(TraceLayer::new_for_http());

        let addr = config.server_addr();
        info!("Starting HTTP server on {}", addr);

        let server_handle = tokio::spawn(async move {
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            axum::serve(listener, app).await
        });

        info!("Application initialized successfully");

        Ok(Self {
            dataset,
            server_handle,
        })
    }

    /// Run until the server stops
    pub async fn run_until_stopped(self) -> Result<(), Box<dyn std::error::Error>> {
        self.server_handle.await??;
        Ok(())
    }
}
