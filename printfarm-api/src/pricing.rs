use axum::{extract::State, routing::post, Json, Router};
use printfarm_catalog::{
    compute_costs, estimate_logistics, CostBreakdown, LogisticsEstimate, LogisticsInput,
    Packaging, PricingIssue, Printer, Product, ProductDetails, Settings,
};
use printfarm_core::{PackagingRepository, PrinterRepository, SettingsRepository};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use crate::{error::AppError, models::draft_from_json, state::AppState};

/// Costs for one product plus anything that makes its prices unsafe to show.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Calculation {
    pub calculations: CostBreakdown,
    pub pricing_issues: Vec<PricingIssue>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    #[serde(flatten)]
    pub calculation: Calculation,
}

/// Printers, packaging and settings as of this request. Prices are never
/// stored; every view is computed from a fresh context.
pub struct PricingContext {
    pub settings: Settings,
    printers: HashMap<Uuid, Printer>,
    packaging: HashMap<Uuid, Packaging>,
}

impl PricingContext {
    pub async fn load(state: &AppState) -> Result<Self, AppError> {
        let settings = state.catalog.get_settings().await?;
        let printers = state
            .catalog
            .list_printers()
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        let packaging = state
            .catalog
            .list_packaging()
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        Ok(Self {
            settings,
            printers,
            packaging,
        })
    }

    pub fn printers(&self) -> Vec<Printer> {
        self.printers.values().cloned().collect()
    }

    pub fn packaging(&self) -> Vec<Packaging> {
        self.packaging.values().cloned().collect()
    }

    /// Unknown printer or packaging ids price as if none were chosen.
    pub fn calculate(&self, details: &ProductDetails) -> Calculation {
        let packaging = details.packaging_id.and_then(|id| self.packaging.get(&id));
        let printer = details.printer_id.and_then(|id| self.printers.get(&id));
        let calculations = compute_costs(details, packaging, printer, &self.settings);
        Calculation {
            pricing_issues: calculations.pricing_issues(),
            calculations,
        }
    }

    pub fn view(&self, product: Product) -> ProductView {
        ProductView {
            calculation: self.calculate(&product.details),
            product,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pricing/preview", post(preview))
        .route("/logistics/estimate", post(estimate))
}

/// Prices an unsaved draft. Missing fields take the settings defaults.
async fn preview(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<Calculation>, AppError> {
    let context = PricingContext::load(&state).await?;
    let details = draft_from_json(&context.settings, body)?;
    Ok(Json(context.calculate(&details)))
}

async fn estimate(Json(input): Json<LogisticsInput>) -> Result<Json<LogisticsEstimate>, AppError> {
    Ok(Json(estimate_logistics(&input)?))
}
