pub mod app_config;
pub mod catalog_repo;
pub mod copywriter;
pub mod database;
pub mod session_store;

pub use app_config::Config;
pub use catalog_repo::SqliteCatalog;
pub use copywriter::{ContentKind, Copywriter, CopywriterError, GenerationMode};
pub use database::Database;
pub use session_store::{build_session_store, RedisSessionStore};
