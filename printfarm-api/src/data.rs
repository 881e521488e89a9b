use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use printfarm_core::{CatalogSnapshot, SnapshotRepository};
use serde::Serialize;
use tracing::info;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Serialize)]
pub struct ImportSummary {
    pub success: bool,
    pub models: usize,
    pub printers: usize,
    pub packaging: usize,
    pub categories: usize,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/data/export", get(export_data))
        .route("/data/import", post(import_data))
}

async fn export_data(State(state): State<AppState>) -> Result<Json<CatalogSnapshot>, AppError> {
    let snapshot = state.catalog.export_snapshot().await?;
    info!("Exported {} models", snapshot.models.len());
    Ok(Json(snapshot))
}

/// Replaces the whole catalog. Nothing changes if any record is invalid.
async fn import_data(
    State(state): State<AppState>,
    Json(snapshot): Json<CatalogSnapshot>,
) -> Result<Json<ImportSummary>, AppError> {
    let summary = ImportSummary {
        success: true,
        models: snapshot.models.len(),
        printers: snapshot.printers.len(),
        packaging: snapshot.packaging.len(),
        categories: snapshot.categories.len(),
    };
    state.catalog.import_snapshot(snapshot).await?;
    Ok(Json(summary))
}
