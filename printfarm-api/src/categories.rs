use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use printfarm_catalog::{Category, CategoryDraft};
use printfarm_core::CategoryRepository;
use tracing::info;
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/{id}",
            get(get_category).put(update_category).delete(delete_category),
        )
}

async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>, AppError> {
    Ok(Json(state.catalog.list_categories().await?))
}

async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Category>, AppError> {
    state
        .catalog
        .get_category(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("category not found".to_string()))
}

async fn create_category(
    State(state): State<AppState>,
    Json(draft): Json<CategoryDraft>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    draft.validate()?;
    let category = state.catalog.create_category(draft).await?;
    info!("Created category {} ({})", category.id, category.name);
    Ok((StatusCode::CREATED, Json(category)))
}

async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(draft): Json<CategoryDraft>,
) -> Result<Json<Category>, AppError> {
    draft.validate()?;
    Ok(Json(state.catalog.update_category(id, draft).await?))
}

/// Refused with 409 while any model still points at the category.
async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.catalog.delete_category(id).await?;
    info!("Deleted category {}", id);
    Ok(StatusCode::NO_CONTENT)
}
