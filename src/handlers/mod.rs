pub mod api;
pub mod export;
pub mod import;
pub mod params;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        // API (JSON for charts)
        .route("/api/charts/trend", get(api::trend))
        .route("/api/charts/area-trend", get(api::area_trend))
        .route("/api/charts/pie", get(api::pie))
        .route("/api/charts/sankey", get(api::sankey))
        .route("/api/records", get(api::records))
        // CSV export
        .route("/api/export/aggregates.csv", get(export::aggregates))
        .route("/api/export/trend.csv", get(export::trend))
        .route("/api/export/top.csv", get(export::top))
        .route("/api/export/records.csv", get(export::records))
        // Import
        .route("/api/records/import", post(import::upload))
        // Health check
        .route("/health", get(health))
}

async fn health() -> &'static str {
    "OK"
}
