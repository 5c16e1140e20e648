//! Route definitions for the delivery tracker API

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/drafts", draft_routes())
        .nest("/inventory", inventory_routes())
        .route(
            "/history",
            get(handlers::list_history)
                .post(handlers::save_direct)
                .delete(handlers::end_of_day_reset),
        )
        .route("/audit", get(handlers::list_audit_log))
        .nest("/receipts", receipt_routes())
}

/// Unloading and purchase drafts, addressed as /drafts/{unloading|purchase}/...
fn draft_routes() -> Router<AppState> {
    Router::new()
        .route("/:kind", get(handlers::list_drafts))
        .route(
            "/:kind/:key",
            get(handlers::get_draft).delete(handlers::delete_draft),
        )
        .route("/:kind/:key/items", post(handlers::add_item))
        .route(
            "/:kind/:key/items/:item_id",
            put(handlers::update_item).delete(handlers::remove_item),
        )
        .route("/:kind/:key/submit", post(handlers::submit_draft))
}

fn inventory_routes() -> Router<AppState> {
    Router::new()
        // Stock is only ever cleared together with history
        .route(
            "/",
            get(handlers::list_stock).delete(handlers::end_of_day_reset),
        )
        .route("/availability", get(handlers::check_availability))
        .route("/:product/:unit", get(handlers::get_stock))
}

fn receipt_routes() -> Router<AppState> {
    Router::new()
        .route("/scan", post(handlers::scan_receipt))
        .route("/confirm", post(handlers::confirm_receipt))
}
