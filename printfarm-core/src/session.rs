use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session backend error: {0}")]
    Backend(String),

    #[error("corrupt session record: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// Token-keyed session storage. The store owns the lifetime of a session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    fn ttl(&self) -> Duration;

    async fn get(&self, token: &str) -> Result<Option<Session>, SessionError>;
    async fn set(&self, session: &Session) -> Result<(), SessionError>;
    async fn delete(&self, token: &str) -> Result<(), SessionError>;

    fn is_expired(&self, session: &Session, now: DateTime<Utc>) -> bool {
        now - session.created_at > self.ttl()
    }
}

/// In-process session map, lost on restart.
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new(Duration::hours(DEFAULT_SESSION_TTL_HOURS))
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    fn ttl(&self) -> Duration {
        self.ttl
    }

    async fn get(&self, token: &str) -> Result<Option<Session>, SessionError> {
        Ok(self.sessions.read().await.get(token).cloned())
    }

    async fn set(&self, session: &Session) -> Result<(), SessionError> {
        self.sessions
            .write()
            .await
            .insert(session.token.clone(), session.clone());
        Ok(())
    }

    async fn delete(&self, token: &str) -> Result<(), SessionError> {
        self.sessions.write().await.remove(token);
        Ok(())
    }
}

/// Login/lookup/logout on top of whichever `SessionStore` is configured.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub fn ttl(&self) -> Duration {
        self.store.ttl()
    }

    pub async fn login(&self, username: &str) -> Result<Session, SessionError> {
        let session = Session {
            token: generate_token(),
            username: username.to_string(),
            created_at: Utc::now(),
        };
        self.store.set(&session).await?;
        info!("Session opened for {}", username);
        Ok(session)
    }

    /// Expired sessions are removed and reported as absent.
    pub async fn resolve(&self, token: &str) -> Result<Option<Session>, SessionError> {
        self.resolve_at(token, Utc::now()).await
    }

    pub async fn resolve_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, SessionError> {
        let Some(session) = self.store.get(token).await? else {
            return Ok(None);
        };
        if self.store.is_expired(&session, now) {
            debug!("Session for {} expired", session.username);
            self.store.delete(token).await?;
            return Ok(None);
        }
        Ok(Some(session))
    }

    pub async fn logout(&self, token: &str) -> Result<(), SessionError> {
        self.store.delete(token).await
    }
}

/// 32 random bytes, hex encoded.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
