use anyhow::Result;
use std::sync::Arc;

use tdr_analyzer::services::{AnalyzerService, BatchProcessor, ProviderFactory};
use tdr_analyzer::{app, config, logging};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = config::Settings::from_env()?;

    // Initialize logging
    logging::init_logging(&settings.env);

    tracing::info!(
        env = ?settings.env,
        server_addr = %settings.server_addr,
        provider = settings.default_provider.as_str(),
        model = settings.default_model(),
        batch_processing = settings.enable_batch_processing,
        max_concurrent_requests = settings.max_concurrent_requests,
        "Starting TDR analyzer service"
    );

    // Build the analysis pipeline
    let factory = ProviderFactory::new(settings.clone())?;
    let analyzer = Arc::new(AnalyzerService::new(&settings, factory)?);
    let batch = BatchProcessor::new(&settings, analyzer.clone());

    // Create application state
    let state = app::AppState::new(settings.clone(), analyzer, batch);

    // Build application
    let app = app::create_app(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&settings.server_addr).await?;
    tracing::info!("Listening on {}", settings.server_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
