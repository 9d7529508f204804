use axum::body::Bytes;
use axum::extract::State;
use axum::response::Json;
use serde::Serialize;
use tracing::info;

use crate::db::queries::observations;
use crate::error::AppResult;
use crate::services::csv_import;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub errors: Vec<String>,
}

/// Load observations from a CSV request body. Bad rows are reported back and
/// skipped; the good rows are stored in one transaction.
pub async fn upload(State(state): State<AppState>, body: Bytes) -> AppResult<Json<ImportSummary>> {
    let parsed = csv_import::parse_csv(&body)?;

    let mut conn = state.db.get()?;
    let imported = observations::insert_observations(&mut conn, &parsed.observations)?;

    info!(
        imported,
        rejected = parsed.errors.len(),
        "Imported mortality records"
    );

    Ok(Json(ImportSummary {
        imported,
        errors: parsed.errors,
    }))
}
