use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use printfarm_catalog::{ProductDetails, ProductFilter, Settings};
use printfarm_core::{ProductRepository, SettingsRepository};
use printfarm_store::{ContentKind, GenerationMode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::AppError,
    pricing::{Calculation, PricingContext, ProductView},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub kind: ContentKind,
    #[serde(default)]
    pub mode: GenerationMode,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub content: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/models", get(list_models).post(create_model))
        .route(
            "/models/{id}",
            get(get_model).put(update_model).delete(delete_model),
        )
        .route("/models/{id}/duplicate", post(duplicate_model))
        .route("/models/{id}/archive", post(toggle_archive))
        .route("/models/{id}/costs", get(model_costs))
        .route("/models/{id}/generate", post(generate_copy))
}

fn merge(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                merge(base.entry(key).or_insert(Value::Null), value);
            }
        }
        (base, patch) => *base = patch,
    }
}

/// Reads a product draft, filling omitted fields from the settings defaults.
pub fn draft_from_json(settings: &Settings, body: Value) -> Result<ProductDetails, AppError> {
    let mut draft = serde_json::to_value(ProductDetails::from_settings(settings))
        .map_err(|e| AppError::Anyhow(e.into()))?;
    merge(&mut draft, body);
    serde_json::from_value(draft).map_err(|e| AppError::Validation(e.to_string()))
}

fn not_found() -> AppError {
    AppError::NotFound("model not found".to_string())
}

async fn list_models(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<Vec<ProductView>>, AppError> {
    let context = PricingContext::load(&state).await?;
    let products = filter.apply(state.catalog.list_products().await?);
    Ok(Json(products.into_iter().map(|p| context.view(p)).collect()))
}

async fn get_model(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductView>, AppError> {
    let product = state.catalog.get_product(id).await?.ok_or_else(not_found)?;
    let context = PricingContext::load(&state).await?;
    Ok(Json(context.view(product)))
}

async fn create_model(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<ProductView>), AppError> {
    let context = PricingContext::load(&state).await?;
    let details = draft_from_json(&context.settings, body)?;
    details.validate()?;

    let product = state.catalog.create_product(details).await?;
    Ok((StatusCode::CREATED, Json(context.view(product))))
}

/// Full replacement of the editable fields.
async fn update_model(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(details): Json<ProductDetails>,
) -> Result<Json<ProductView>, AppError> {
    details.validate()?;
    let product = state.catalog.update_product(id, details).await?;
    info!("Updated model {} ({})", product.id, product.article);
    let context = PricingContext::load(&state).await?;
    Ok(Json(context.view(product)))
}

async fn delete_model(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.catalog.delete_product(id).await?;
    info!("Deleted model {}", id);
    Ok(StatusCode::NO_CONTENT)
}

async fn duplicate_model(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<ProductView>), AppError> {
    let copy = state.catalog.duplicate_product(id).await?;
    let context = PricingContext::load(&state).await?;
    Ok((StatusCode::CREATED, Json(context.view(copy))))
}

async fn toggle_archive(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductView>, AppError> {
    let product = state.catalog.get_product(id).await?.ok_or_else(not_found)?;
    let product = state.catalog.set_archived(id, !product.is_archived).await?;
    info!(
        "Model {} {}",
        product.article,
        if product.is_archived { "archived" } else { "restored" }
    );
    let context = PricingContext::load(&state).await?;
    Ok(Json(context.view(product)))
}

async fn model_costs(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Calculation>, AppError> {
    let product = state.catalog.get_product(id).await?.ok_or_else(not_found)?;
    let context = PricingContext::load(&state).await?;
    Ok(Json(context.calculate(&product.details)))
}

/// Drafts listing copy. The result is returned for review, not saved.
async fn generate_copy(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    let product = state.catalog.get_product(id).await?.ok_or_else(not_found)?;
    let settings = state.catalog.get_settings().await?;
    let content = state
        .copywriter
        .generate(&product.details, req.kind, req.mode, &settings)
        .await?;
    Ok(Json(GenerateResponse { content }))
}
