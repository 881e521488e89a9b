use printfarm_core::{CatalogStore, SessionManager};
use printfarm_shared::Secret;
use printfarm_store::Copywriter;
use std::sync::Arc;

/// Single admin login, taken from config at startup.
#[derive(Clone)]
pub struct AuthConfig {
    pub username: String,
    pub password: Secret<String>,
    pub cookie_secure: bool,
}

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogStore>,
    pub sessions: SessionManager,
    pub copywriter: Arc<Copywriter>,
    pub auth: AuthConfig,
    pub cors_origin: Option<String>,
}
