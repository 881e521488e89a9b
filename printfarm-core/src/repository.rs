use async_trait::async_trait;
use printfarm_catalog::{
    Category, CategoryDraft, Packaging, PackagingDraft, Printer, PrinterDraft, Product,
    ProductDetails, Settings, SettingsPatch, ValidationError,
};
use uuid::Uuid;

use crate::snapshot::CatalogSnapshot;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    /// Deleting a row other rows still reference.
    #[error("{entity} is used by {count} product(s)")]
    InUse { entity: &'static str, count: i64 },

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Repository trait for products
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Newest first.
    async fn list_products(&self) -> StoreResult<Vec<Product>>;

    async fn get_product(&self, id: Uuid) -> StoreResult<Option<Product>>;

    /// Persists a new product under a freshly generated, unused article code.
    async fn create_product(&self, details: ProductDetails) -> StoreResult<Product>;

    async fn update_product(&self, id: Uuid, details: ProductDetails) -> StoreResult<Product>;

    async fn set_archived(&self, id: Uuid, archived: bool) -> StoreResult<Product>;

    async fn duplicate_product(&self, id: Uuid) -> StoreResult<Product>;

    async fn delete_product(&self, id: Uuid) -> StoreResult<()>;
}

#[async_trait]
pub trait PrinterRepository: Send + Sync {
    async fn list_printers(&self) -> StoreResult<Vec<Printer>>;
    async fn get_printer(&self, id: Uuid) -> StoreResult<Option<Printer>>;
    async fn create_printer(&self, draft: PrinterDraft) -> StoreResult<Printer>;
    async fn update_printer(&self, id: Uuid, draft: PrinterDraft) -> StoreResult<Printer>;
    /// Products pointing at the printer lose the reference.
    async fn delete_printer(&self, id: Uuid) -> StoreResult<()>;
}

#[async_trait]
pub trait PackagingRepository: Send + Sync {
    async fn list_packaging(&self) -> StoreResult<Vec<Packaging>>;
    async fn get_packaging(&self, id: Uuid) -> StoreResult<Option<Packaging>>;
    async fn create_packaging(&self, draft: PackagingDraft) -> StoreResult<Packaging>;
    async fn update_packaging(&self, id: Uuid, draft: PackagingDraft) -> StoreResult<Packaging>;
    async fn delete_packaging(&self, id: Uuid) -> StoreResult<()>;
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn list_categories(&self) -> StoreResult<Vec<Category>>;
    async fn get_category(&self, id: Uuid) -> StoreResult<Option<Category>>;
    async fn create_category(&self, draft: CategoryDraft) -> StoreResult<Category>;
    async fn update_category(&self, id: Uuid, draft: CategoryDraft) -> StoreResult<Category>;
    /// Refused with `StoreError::InUse` while any product references it.
    async fn delete_category(&self, id: Uuid) -> StoreResult<()>;
}

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn get_settings(&self) -> StoreResult<Settings>;

    /// Merges, validates and stores in one transaction. Returns what was stored.
    async fn update_settings(&self, patch: SettingsPatch) -> StoreResult<Settings>;
}

#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    async fn export_snapshot(&self) -> StoreResult<CatalogSnapshot>;

    /// Replaces the whole catalog with the snapshot contents.
    async fn import_snapshot(&self, snapshot: CatalogSnapshot) -> StoreResult<()>;
}

/// Everything the HTTP layer needs from persistence.
pub trait CatalogStore:
    ProductRepository
    + PrinterRepository
    + PackagingRepository
    + CategoryRepository
    + SettingsRepository
    + SnapshotRepository
{
}

impl<T> CatalogStore for T where
    T: ProductRepository
        + PrinterRepository
        + PackagingRepository
        + CategoryRepository
        + SettingsRepository
        + SnapshotRepository
{
}
