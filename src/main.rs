use tracing::{info, instrument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use station_averages_service::app::Application;
use station_averages_service::config::Config;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing with environment filter support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,station_averages_service=debug")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    info!("Starting station averages service with config: {:?}", config);
    if config.has_metadata() {
        info!("Station metadata configured, grouping stations by basin");
    } else {
        info!("No station metadata configured, serving a flat station list");
    }

    let app = Application::build(config).await?;
    info!(
        "Serving {} variables across {} stations",
        app.dataset.variables().len(),
        app.dataset.stations().len()
    );

    app.run_until_stopped().await
}
