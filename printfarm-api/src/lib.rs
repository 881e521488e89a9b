use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod data;
pub mod error;
pub mod middleware;
pub mod models;
pub mod packaging;
pub mod pricing;
pub mod printers;
pub mod settings;
pub mod state;

pub use state::{AppState, AuthConfig};

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    // Cookies need an explicit origin.
    match origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => cors
            .allow_origin(AllowOrigin::exact(origin))
            .allow_credentials(true),
        Some(Err(_)) => {
            warn!("Ignoring invalid CORS origin, allowing any");
            cors.allow_origin(AllowOrigin::any())
        }
        None => cors.allow_origin(AllowOrigin::any()),
    }
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
    }))
}

pub fn app(state: AppState) -> Router {
    let protected = Router::new()
        .merge(settings::routes())
        .merge(printers::routes())
        .merge(packaging::routes())
        .merge(categories::routes())
        .merge(models::routes())
        .merge(pricing::routes())
        .merge(dashboard::routes())
        .merge(data::routes())
        .route_layer(from_fn_with_state(state.clone(), middleware::require_session));

    let api = Router::new()
        .route("/health", get(health))
        .merge(auth::routes())
        .merge(protected);

    Router::new()
        .nest("/api", api)
        .layer(cors_layer(state.cors_origin.as_deref()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
