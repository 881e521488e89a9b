use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    error::AppError,
    middleware::{session_token, SESSION_COOKIE},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserInfo>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/check", get(check))
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    if req.username != state.auth.username || req.password != *state.auth.password.expose() {
        warn!("Rejected login for {}", req.username);
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let session = state.sessions.login(&req.username).await?;
    let cookie = Cookie::build((SESSION_COOKIE, session.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.auth.cookie_secure);

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            success: true,
            token: session.token,
            user: UserInfo {
                username: session.username,
            },
        }),
    ))
}

async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<(CookieJar, Json<serde_json::Value>), AppError> {
    if let Some(token) = session_token(&headers) {
        state.sessions.logout(&token).await?;
        info!("Session closed");
    }
    Ok((
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        Json(serde_json::json!({ "success": true })),
    ))
}

async fn check(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(axum::http::StatusCode, Json<CheckResponse>), AppError> {
    let session = match session_token(&headers) {
        Some(token) => state.sessions.resolve(&token).await?,
        None => None,
    };

    Ok(match session {
        Some(session) => (
            axum::http::StatusCode::OK,
            Json(CheckResponse {
                authenticated: true,
                user: Some(UserInfo {
                    username: session.username,
                }),
            }),
        ),
        None => (
            axum::http::StatusCode::UNAUTHORIZED,
            Json(CheckResponse {
                authenticated: false,
                user: None,
            }),
        ),
    })
}
