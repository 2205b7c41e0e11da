//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{RemoteAdapter, WorkbookAdapter},
    config::{Config, DataSourceKind},
    error::ApiError,
    web::{cors_layer, router, state::AppState},
};
use journey_core::ports::{LeadSink, StudentDataSource};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Initialize the Data Source Adapter ---
    let (data_source, leads): (Arc<dyn StudentDataSource>, Arc<dyn LeadSink>) =
        match &config.data_source {
            DataSourceKind::Workbook { path } => {
                info!("Loading workbook from {}", path.display());
                let adapter = Arc::new(WorkbookAdapter::load(path).await?);
                (
                    adapter.clone() as Arc<dyn StudentDataSource>,
                    adapter as Arc<dyn LeadSink>,
                )
            }
            DataSourceKind::Remote {
                backend_url,
                leads_url,
            } => {
                info!("Using remote backend at {}", backend_url);
                let adapter = Arc::new(RemoteAdapter::new(
                    backend_url.clone(),
                    leads_url.clone(),
                    config.request_timeout,
                )?);
                (
                    adapter.clone() as Arc<dyn StudentDataSource>,
                    adapter as Arc<dyn LeadSink>,
                )
            }
        };

    // --- 3. Build the Shared AppState ---
    let app_state = Arc::new(AppState { data_source, leads });

    // --- 4. Create the Web Router ---
    let app = router(app_state, cors_layer(&config.allowed_origin)?);

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
