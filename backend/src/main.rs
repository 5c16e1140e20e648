//! Delivery tracker server

use std::{net::SocketAddr, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use delivery_tracker::{
    create_app,
    external::{ReceiptRecognitionClient, WebhookClient},
    services::MigrationService,
    AppState, Config, DocumentStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "dt_server=debug,delivery_tracker=debug,tower_http=debug,sqlx=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting Delivery Tracker Server");
    tracing::info!("Environment: {}", config.environment);
    tracing::info!("Webhook mode: {:?}", config.webhook.mode);

    let store = DocumentStore::open(config.storage.options()).await;
    tracing::info!("Document store state: {:?}", store.state());

    // Legacy data moves once, before anything else touches the store
    match MigrationService::new(store.clone()).run().await {
        Ok(report) if !report.already_migrated => tracing::info!(
            "Legacy migration: {} migrated, {} skipped",
            report.migrated(),
            report.skipped()
        ),
        Ok(_) => {}
        Err(e) => tracing::error!("Legacy migration did not run: {}", e),
    }

    let state = AppState {
        store,
        submission_endpoint: Arc::new(WebhookClient::from_config(&config.webhook)?),
        recognizer: Arc::new(ReceiptRecognitionClient::from_config(&config.receipts)?),
        config: Arc::new(config.clone()),
    };

    // Build application
    let app = create_app(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
