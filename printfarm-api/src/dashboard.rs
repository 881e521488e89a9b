use axum::{extract::State, routing::get, Json, Router};
use printfarm_catalog::{dashboard_stats, DashboardStats};
use printfarm_core::ProductRepository;

use crate::{error::AppError, pricing::PricingContext, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/dashboard", get(dashboard))
}

async fn dashboard(State(state): State<AppState>) -> Result<Json<DashboardStats>, AppError> {
    let context = PricingContext::load(&state).await?;
    let products = state.catalog.list_products().await?;
    Ok(Json(dashboard_stats(
        &products,
        &context.packaging(),
        &context.printers(),
        &context.settings,
    )))
}
