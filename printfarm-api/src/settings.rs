use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use printfarm_catalog::{Settings, SettingsPatch};
use printfarm_core::SettingsRepository;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidateKeyRequest {
    /// Checks the stored key when absent.
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ValidateKeyResponse {
    pub valid: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/settings", get(get_settings).put(update_settings))
        .route("/settings/validate-key", post(validate_key))
}

async fn get_settings(State(state): State<AppState>) -> Result<Json<Settings>, AppError> {
    Ok(Json(state.catalog.get_settings().await?))
}

async fn update_settings(
    State(state): State<AppState>,
    Json(patch): Json<SettingsPatch>,
) -> Result<Json<Settings>, AppError> {
    let settings = state.catalog.update_settings(patch).await?;
    info!("Settings updated");
    Ok(Json(settings))
}

async fn validate_key(
    State(state): State<AppState>,
    Json(req): Json<ValidateKeyRequest>,
) -> Result<Json<ValidateKeyResponse>, AppError> {
    let key = match req.api_key {
        Some(key) => key,
        None => state.catalog.get_settings().await?.kie_api_key.into_inner(),
    };
    let valid = state.copywriter.validate_key(&key).await;
    Ok(Json(ValidateKeyResponse { valid }))
}
