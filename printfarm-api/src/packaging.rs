use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use printfarm_catalog::{Packaging, PackagingDraft};
use printfarm_core::PackagingRepository;
use tracing::info;
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/packaging", get(list_packaging).post(create_packaging))
        .route(
            "/packaging/{id}",
            get(get_packaging).put(update_packaging).delete(delete_packaging),
        )
}

async fn list_packaging(State(state): State<AppState>) -> Result<Json<Vec<Packaging>>, AppError> {
    Ok(Json(state.catalog.list_packaging().await?))
}

async fn get_packaging(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Packaging>, AppError> {
    state
        .catalog
        .get_packaging(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("packaging not found".to_string()))
}

async fn create_packaging(
    State(state): State<AppState>,
    Json(draft): Json<PackagingDraft>,
) -> Result<(StatusCode, Json<Packaging>), AppError> {
    draft.validate()?;
    let packaging = state.catalog.create_packaging(draft).await?;
    info!("Created packaging {} ({})", packaging.id, packaging.name);
    Ok((StatusCode::CREATED, Json(packaging)))
}

async fn update_packaging(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(draft): Json<PackagingDraft>,
) -> Result<Json<Packaging>, AppError> {
    draft.validate()?;
    Ok(Json(state.catalog.update_packaging(id, draft).await?))
}

async fn delete_packaging(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.catalog.delete_packaging(id).await?;
    info!("Deleted packaging {}", id);
    Ok(StatusCode::NO_CONTENT)
}
