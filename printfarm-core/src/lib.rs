pub mod repository;
pub mod session;
pub mod snapshot;

pub use repository::{
    CatalogStore, CategoryRepository, PackagingRepository, PrinterRepository, ProductRepository,
    SettingsRepository, SnapshotRepository, StoreError, StoreResult,
};
pub use session::{MemorySessionStore, Session, SessionError, SessionManager, SessionStore};
pub use snapshot::CatalogSnapshot;
