//! Display names for items and currencies, loaded from name_mapping.json.
//!
//! The file is read once at startup. Keys without an entry are shown as-is.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NameMapping {
    pub items: HashMap<String, String>,
    pub currencies: HashMap<String, String>,
}

impl NameMapping {
    /// Loads the mapping file, or returns empty mappings if it is missing or invalid.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            log::info!(
                "Name mapping {} not found, using raw keys",
                path.display()
            );
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(mapping) => {
                    log::info!("Name mapping loaded from {}", path.display());
                    mapping
                }
                Err(e) => {
                    log::warn!("Failed to parse {}: {}. Using raw keys.", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Failed to read {}: {}. Using raw keys.", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn item_display_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.items.get(key).map(String::as_str).unwrap_or(key)
    }

    pub fn currency_display_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.currencies.get(key).map(String::as_str).unwrap_or(key)
    }
}
