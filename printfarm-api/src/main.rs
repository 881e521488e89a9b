use anyhow::Context;
use printfarm_api::{app, AppState, AuthConfig};
use printfarm_core::SessionManager;
use printfarm_store::{build_session_store, Config, Copywriter, Database, SqliteCatalog};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "printfarm_api=debug,printfarm_store=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting PrintFarm API on port {}", config.server.port);

    let db = Database::connect(&config.database)
        .await
        .context("Failed to open database")?;
    db.migrate().await.context("Failed to run migrations")?;

    let sessions = build_session_store(&config.session).context("Failed to set up sessions")?;
    let copywriter = Copywriter::new(&config.copywriter).context("Failed to build AI client")?;

    let app_state = AppState {
        catalog: Arc::new(SqliteCatalog::new(db.pool.clone())),
        sessions: SessionManager::new(sessions),
        copywriter: Arc::new(copywriter),
        auth: AuthConfig {
            username: config.admin.username.clone(),
            password: config.admin.password.clone(),
            cookie_secure: config.session.cookie_secure,
        },
        cors_origin: config.server.cors_origin.clone(),
    };

    let app = app(app_state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
