//! Resource Registry - Load resource kind definitions from JSON
//!
//! This module loads every Solum resource kind from an embedded JSON file
//! and provides lookup functions for the managers and the CLI.

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Embedded resource JSON files (compiled into the binary)
const RESOURCE_FILES: &[&str] = &[include_str!("../resources/solum.json")];

/// Column definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnDef {
    pub header: String,
    /// Dot-notation path into the resource
    pub json_path: String,
}

/// Wire format of request and response bodies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyFormat {
    #[default]
    Json,
    Yaml,
}

impl BodyFormat {
    /// Content type sent for documents in this format
    pub fn content_type(self) -> &'static str {
        match self {
            BodyFormat::Json => "application/json",
            BodyFormat::Yaml => "x-application/yaml",
        }
    }
}

fn default_name_field() -> String {
    "name".to_string()
}

/// Resource kind definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceKind {
    pub display_name: String,
    /// Plural JSON key, also the collection URL segment
    pub collection_key: String,
    /// Singular JSON key of a wrapped single resource
    pub key: String,
    /// Path prefix, may hold `{param}` placeholders
    pub base_path: String,
    #[serde(default)]
    pub format: BodyFormat,
    /// Attribute matched when resolving by name
    #[serde(default = "default_name_field")]
    pub name_field: String,
    #[serde(default)]
    pub list_columns: Vec<ColumnDef>,
    #[serde(default)]
    pub show_columns: Vec<ColumnDef>,
}

/// Root structure of resources/*.json
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceConfig {
    #[serde(default)]
    pub kinds: HashMap<String, ResourceKind>,
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<ResourceConfig> = OnceLock::new();

/// Get the resource registry (loads from embedded JSON on first access)
pub fn get_registry() -> &'static ResourceConfig {
    REGISTRY.get_or_init(|| {
        let mut final_config = ResourceConfig {
            kinds: HashMap::new(),
        };

        for content in RESOURCE_FILES {
            let partial: ResourceConfig = serde_json::from_str(content)
                .unwrap_or_else(|e| panic!("Failed to parse embedded resource JSON: {}", e));
            final_config.kinds.extend(partial.kinds);
        }

        final_config
    })
}

/// Get a resource kind by key
pub fn get_kind(key: &str) -> Option<&'static ResourceKind> {
    get_registry().kinds.get(key)
}

/// Get all resource kind keys, sorted
pub fn get_all_kind_keys() -> Vec<&'static str> {
    let mut keys: Vec<&'static str> = get_registry().kinds.keys().map(|s| s.as_str()).collect();
    keys.sort_unstable();
    keys
}
