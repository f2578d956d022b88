//! Persisted catalog format.
//!
//! The catalog is written as pretty-printed JSON:
//!
//! ```json
//! {
//!   "search_date": "2026-01-05T09:00:00Z",
//!   "total_policies": 1,
//!   "source": "CMS Medicare Coverage Database",
//!   "search_method": "Seeded ID validation + Adaptive ID range probing",
//!   "policies": [
//!     { "lcd_id": "33822", "doc_id": "L33822", "title": "...", "url": "...", "found_date": "..." }
//!   ]
//! }
//! ```

use anyhow::{Context, Result};
use lcdscan_core::{DocumentCode, PolicyId, StrategyKind, Timestamp};
use lcdscan_scanner::Catalog;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default catalog file name.
pub const DEFAULT_CATALOG_FILE: &str = "All_urls.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogFile {
    pub search_date: Timestamp,
    pub total_policies: usize,
    pub source: String,
    pub search_method: String,
    pub policies: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub lcd_id: PolicyId,
    pub doc_id: DocumentCode,
    pub title: String,
    pub url: String,
    pub found_date: Timestamp,
}

impl CatalogFile {
    /// Build the persisted form of a merged catalog.
    ///
    /// `strategies` names the procedures that ran, in order.
    pub fn from_catalog(catalog: &Catalog, source: &str, strategies: &[StrategyKind]) -> Self {
        let policies: Vec<CatalogEntry> = catalog
            .policies()
            .iter()
            .map(|record| CatalogEntry {
                lcd_id: record.id,
                doc_id: record.doc_id.clone(),
                title: record.title.clone(),
                url: record.url.clone(),
                found_date: record.found_date,
            })
            .collect();

        Self {
            search_date: catalog.search_date(),
            total_policies: policies.len(),
            source: source.to_string(),
            search_method: search_method(strategies),
            policies,
        }
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("failed to serialize catalog")?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write catalog to {}", path.display()))?;
        Ok(())
    }

    pub fn read_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("{} is not a valid catalog file", path.display()))
    }
}

/// Human-readable names of the strategies that ran, joined with " + ".
pub fn search_method(strategies: &[StrategyKind]) -> String {
    strategies
        .iter()
        .map(StrategyKind::display_name)
        .collect::<Vec<_>>()
        .join(" + ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> CatalogFile {
        let id = PolicyId::new(33822).unwrap();
        CatalogFile {
            search_date: Timestamp::from_rfc3339("2026-01-05T09:00:00Z").unwrap(),
            total_policies: 1,
            source: "CMS Medicare Coverage Database".to_string(),
            search_method: search_method(&[StrategyKind::SeededValidation]),
            policies: vec![CatalogEntry {
                lcd_id: id,
                doc_id: DocumentCode::derived(id),
                title: "Glucose Monitors".to_string(),
                url: "https://www.cms.gov/medicare-coverage-database/view/lcd.aspx?LCDId=33822"
                    .to_string(),
                found_date: Timestamp::from_rfc3339("2026-01-05T09:01:00Z").unwrap(),
            }],
        }
    }

    #[test]
    fn test_field_names_and_string_ids() {
        let value = serde_json::to_value(sample()).unwrap();

        assert_eq!(value["total_policies"], 1);
        assert_eq!(value["source"], "CMS Medicare Coverage Database");
        assert_eq!(value["search_method"], "Seeded ID validation");
        assert_eq!(value["policies"][0]["lcd_id"], "33822");
        assert_eq!(value["policies"][0]["doc_id"], "L33822");
        assert!(value["search_date"]
            .as_str()
            .unwrap()
            .starts_with("2026-01-05T09:00:00"));
        assert!(value["policies"][0]["found_date"].is_string());
    }

    #[test]
    fn test_search_method_joins_in_order() {
        let method = search_method(&[
            StrategyKind::SeededValidation,
            StrategyKind::LinkHarvest,
            StrategyKind::RangeProbe,
        ]);
        assert_eq!(
            method,
            "Seeded ID validation + Report page link harvest + Adaptive ID range probing"
        );
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join(DEFAULT_CATALOG_FILE);

        let catalog = sample();
        catalog.write_to(&path).unwrap();
        let loaded = CatalogFile::read_from(&path).unwrap();

        assert_eq!(loaded, catalog);
    }

    #[test]
    fn test_read_rejects_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ \"policies\": [").unwrap();

        let err = CatalogFile::read_from(&path).unwrap_err();
        assert!(err.to_string().contains("not a valid catalog file"));
    }
}
