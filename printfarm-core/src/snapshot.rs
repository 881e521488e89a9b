use chrono::{DateTime, Utc};
use printfarm_catalog::{Category, Packaging, Printer, Product, Settings};
use serde::{Deserialize, Serialize};

pub const SNAPSHOT_VERSION: u32 = 1;

/// Full catalog dump used for backup and restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSnapshot {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "Utc::now")]
    pub exported_at: DateTime<Utc>,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub printers: Vec<Printer>,
    #[serde(default)]
    pub packaging: Vec<Packaging>,
    #[serde(default)]
    pub models: Vec<Product>,
}

fn default_version() -> u32 {
    SNAPSHOT_VERSION
}

impl CatalogSnapshot {
    pub fn new(
        settings: Settings,
        categories: Vec<Category>,
        printers: Vec<Printer>,
        packaging: Vec<Packaging>,
        models: Vec<Product>,
    ) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            exported_at: Utc::now(),
            settings,
            categories,
            printers,
            packaging,
            models,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_snapshot_fills_defaults() {
        let snapshot: CatalogSnapshot = serde_json::from_str(r#"{"printers": []}"#).unwrap();
        assert_eq!(snapshot.version, SNAPSHOT_VERSION);
        assert!(snapshot.models.is_empty());
        assert_eq!(snapshot.settings, Settings::default());
    }
}
