use async_trait::async_trait;
use chrono::Duration;
use printfarm_core::session::{MemorySessionStore, Session, SessionError, SessionStore};
use redis::AsyncCommands;
use std::sync::Arc;
use tracing::info;

use crate::app_config::{SessionBackend, SessionConfig};

fn redis_error(err: redis::RedisError) -> SessionError {
    SessionError::Backend(err.to_string())
}

/// Sessions kept in Redis under `session:<token>`, expiring server-side.
#[derive(Clone)]
pub struct RedisSessionStore {
    client: redis::Client,
    ttl: Duration,
}

impl RedisSessionStore {
    pub fn new(connection_string: &str, ttl: Duration) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client, ttl })
    }

    fn key(token: &str) -> String {
        format!("session:{}", token)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    fn ttl(&self) -> Duration {
        self.ttl
    }

    async fn get(&self, token: &str) -> Result<Option<Session>, SessionError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(redis_error)?;
        let raw: Option<String> = conn.get(Self::key(token)).await.map_err(redis_error)?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, session: &Session) -> Result<(), SessionError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(redis_error)?;
        let value = serde_json::to_string(session)?;
        let ttl_seconds = self.ttl.num_seconds().max(1) as u64;
        conn.set_ex::<_, _, ()>(Self::key(&session.token), value, ttl_seconds)
            .await
            .map_err(redis_error)
    }

    async fn delete(&self, token: &str) -> Result<(), SessionError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(redis_error)?;
        conn.del::<_, ()>(Self::key(token))
            .await
            .map_err(redis_error)
    }
}

/// Picks the session backend named in config.
pub fn build_session_store(config: &SessionConfig) -> Result<Arc<dyn SessionStore>, SessionError> {
    let ttl = Duration::seconds(config.ttl_seconds as i64);
    match config.backend {
        SessionBackend::Memory => {
            info!("Using in-memory session store");
            Ok(Arc::new(MemorySessionStore::new(ttl)))
        }
        SessionBackend::Redis => {
            let url = config.redis_url.as_deref().ok_or_else(|| {
                SessionError::Backend("session.redis_url is required for the redis backend".into())
            })?;
            info!("Using Redis session store");
            Ok(Arc::new(RedisSessionStore::new(url, ttl).map_err(redis_error)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_backend_honours_ttl() {
        let config = SessionConfig {
            ttl_seconds: 60,
            ..SessionConfig::default()
        };
        let store = build_session_store(&config).unwrap();
        assert_eq!(store.ttl(), Duration::seconds(60));
    }

    #[test]
    fn test_redis_backend_requires_url() {
        let config = SessionConfig {
            backend: SessionBackend::Redis,
            ..SessionConfig::default()
        };
        assert!(build_session_store(&config).is_err());
    }

    #[test]
    fn test_redis_keys_are_namespaced() {
        assert_eq!(RedisSessionStore::key("abc"), "session:abc");
    }
}
