use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::{error::AppError, state::AppState};

pub const SESSION_COOKIE: &str = "session";

/// Bearer token first, then the `session` cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(Authorization(bearer)) = headers.typed_get::<Authorization<Bearer>>() {
        return Some(bearer.token().to_string());
    }
    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

/// Rejects requests without a live session and exposes the `Session` to handlers.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = session_token(req.headers())
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

    let session = state
        .sessions
        .resolve(&token)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Session expired or invalid".to_string()))?;

    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}
