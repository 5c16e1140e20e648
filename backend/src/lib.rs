//! Delivery tracker backend
//!
//! Local persistence and draft/inventory coordination for purchase,
//! unloading and delivery tracking, served to the browser over HTTP.

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod routes;
pub mod services;
pub mod store;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use store::DocumentStore;

use services::{ReceiptRecognizer, SubmissionEndpoint};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: DocumentStore,
    pub config: Arc<Config>,
    pub submission_endpoint: Arc<dyn SubmissionEndpoint>,
    pub recognizer: Arc<dyn ReceiptRecognizer>,
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Delivery Tracker API v1.0"
}
