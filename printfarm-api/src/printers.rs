use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use printfarm_catalog::{Printer, PrinterDraft};
use printfarm_core::PrinterRepository;
use tracing::info;
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/printers", get(list_printers).post(create_printer))
        .route(
            "/printers/{id}",
            get(get_printer).put(update_printer).delete(delete_printer),
        )
}

async fn list_printers(State(state): State<AppState>) -> Result<Json<Vec<Printer>>, AppError> {
    Ok(Json(state.catalog.list_printers().await?))
}

async fn get_printer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Printer>, AppError> {
    state
        .catalog
        .get_printer(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("printer not found".to_string()))
}

async fn create_printer(
    State(state): State<AppState>,
    Json(draft): Json<PrinterDraft>,
) -> Result<(StatusCode, Json<Printer>), AppError> {
    draft.validate()?;
    let printer = state.catalog.create_printer(draft).await?;
    info!("Created printer {} ({})", printer.id, printer.name);
    Ok((StatusCode::CREATED, Json(printer)))
}

async fn update_printer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(draft): Json<PrinterDraft>,
) -> Result<Json<Printer>, AppError> {
    draft.validate()?;
    Ok(Json(state.catalog.update_printer(id, draft).await?))
}

async fn delete_printer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.catalog.delete_printer(id).await?;
    info!("Deleted printer {}", id);
    Ok(StatusCode::NO_CONTENT)
}
