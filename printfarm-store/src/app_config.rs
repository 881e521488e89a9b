use printfarm_shared::Secret;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub session: SessionConfig,
    pub admin: AdminConfig,
    #[serde(default)]
    pub copywriter: CopywriterConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
    /// Allowed browser origin. `None` allows any.
    pub cors_origin: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".into()
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    #[default]
    Memory,
    Redis,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default)]
    pub backend: SessionBackend,
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
    pub redis_url: Option<String>,
    /// Mark the session cookie `Secure`; enable behind HTTPS.
    #[serde(default)]
    pub cookie_secure: bool,
}

fn default_ttl_seconds() -> u64 {
    24 * 60 * 60
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: SessionBackend::Memory,
            ttl_seconds: default_ttl_seconds(),
            redis_url: None,
            cookie_secure: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AdminConfig {
    pub username: String,
    pub password: Secret<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),

    #[error("admin credentials are not configured (set PRINTFARM__ADMIN__USERNAME and PRINTFARM__ADMIN__PASSWORD)")]
    MissingAdminCredentials,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CopywriterConfig {
    #[serde(default = "default_copywriter_url")]
    pub base_url: String,
    #[serde(default = "default_copywriter_model")]
    pub model: String,
    #[serde(default = "default_copywriter_timeout")]
    pub timeout_seconds: u64,
}

fn default_copywriter_url() -> String {
    "https://api.kie.ai/v1/".into()
}

fn default_copywriter_model() -> String {
    "gpt-4o-mini".into()
}

fn default_copywriter_timeout() -> u64 {
    60
}

impl Default for CopywriterConfig {
    fn default() -> Self {
        Self {
            base_url: default_copywriter_url(),
            model: default_copywriter_model(),
            timeout_seconds: default_copywriter_timeout(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("PRINTFARM").separator("__"))
            .build()?;

        let config: Config = s.try_deserialize()?;
        config.check()?;
        Ok(config)
    }

    /// There is no built-in fallback login.
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.admin.username.trim().is_empty() || self.admin.password.is_empty() {
            return Err(ConfigError::MissingAdminCredentials);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> Config {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults_fill_optional_sections() {
        let config = parse(
            r#"
            [server]
            port = 3001
            [database]
            url = "sqlite://printfarm.db"
            [admin]
            username = "admin"
            password = "secret"
            "#,
        );

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.session.backend, SessionBackend::Memory);
        assert_eq!(config.session.ttl_seconds, 86_400);
        assert_eq!(config.copywriter.model, "gpt-4o-mini");
        assert!(config.check().is_ok());
        assert_eq!(format!("{:?}", config.admin.password), "********");
    }

    #[test]
    fn test_empty_admin_password_is_rejected() {
        let config = parse(
            r#"
            [server]
            port = 3001
            [database]
            url = "sqlite::memory:"
            [admin]
            username = "admin"
            password = ""
            "#,
        );

        assert!(matches!(
            config.check(),
            Err(ConfigError::MissingAdminCredentials)
        ));
    }
}
