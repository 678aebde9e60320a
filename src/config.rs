//! View configuration and server settings.
//!
//! View configs are loaded from the `configs/` directory (JSON, one per file)
//! and fall back to a built-in `default` when the directory is absent.
//! In-memory cache is backed by `RwLock` for runtime CRUD.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

use crate::natural_id::SortOrder;
use crate::schema::NodeType;
use crate::validate::DEFAULT_MAX_DEPTH;

/// Projection defaults for one deployment of the tree view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Dotted label paths offered the `addToDB` option.
    #[serde(default)]
    pub address_block_keys: Vec<String>,
    #[serde(default)]
    pub document_sort_order: SortOrder,
    /// Node types expanded when a tree is first loaded.
    #[serde(default = "default_expand_types")]
    pub expand_types: Vec<NodeType>,
}

fn default_expand_types() -> Vec<NodeType> {
    vec![NodeType::Root, NodeType::Batch]
}

/// In-memory store for all loaded configs, backed by `RwLock` for runtime mutations.
#[derive(Debug)]
pub struct ConfigStore {
    configs: Arc<RwLock<HashMap<String, ViewConfig>>>,
}

impl ConfigStore {
    /// Load all configs from the specified directory.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let mut configs = HashMap::new();

        if !dir.exists() {
            warn!("Config directory {:?} not found, using built-in default", dir);
            return Ok(Self::from_configs(vec![create_default_config()]));
        }

        for entry in std::fs::read_dir(dir).with_context(|| format!("Failed to list {:?}", dir))? {
            let entry = entry?;
            let path = entry.path();

            if path.extension().map(|e| e == "json").unwrap_or(false) {
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config: {:?}", path))?;

                let config: ViewConfig = serde_json::from_str(&content)
                    .with_context(|| format!("Failed to parse config: {:?}", path))?;

                info!("Loaded config: {} from {:?}", config.name, path);
                configs.insert(config.name.clone(), config);
            }
        }

        configs
            .entry("default".to_string())
            .or_insert_with(create_default_config);

        Ok(Self {
            configs: Arc::new(RwLock::new(configs)),
        })
    }

    pub fn from_configs(configs: Vec<ViewConfig>) -> Self {
        let map = configs.into_iter().map(|c| (c.name.clone(), c)).collect();
        Self {
            configs: Arc::new(RwLock::new(map)),
        }
    }

    /// Get a config by name (returns clone).
    pub fn get(&self, name: &str) -> Option<ViewConfig> {
        self.configs.read().unwrap().get(name).cloned()
    }

    /// The `default` config, or the built-in one if it was removed.
    pub fn default_config(&self) -> ViewConfig {
        self.get("default").unwrap_or_else(create_default_config)
    }

    /// List all available config names, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.configs.read().unwrap().keys().cloned().collect();
        names.sort();
        names
    }

    /// Insert or update a config in the in-memory cache.
    pub fn insert(&self, config: ViewConfig) {
        self.configs
            .write()
            .unwrap()
            .insert(config.name.clone(), config);
    }

    /// Remove a config from the in-memory cache. Returns true if it existed.
    pub fn remove(&self, name: &str) -> bool {
        self.configs.write().unwrap().remove(name).is_some()
    }
}

pub fn create_default_config() -> ViewConfig {
    ViewConfig {
        name: "default".to_string(),
        description: "Transaction tree with batches expanded".to_string(),
        address_block_keys: Vec::new(),
        document_sort_order: SortOrder::Asc,
        expand_types: default_expand_types(),
    }
}

/// Process settings read from the environment (after `.env` is loaded).
#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    pub bind: String,
    /// Root for media URLs; empty when unset.
    pub backend_url: String,
    pub max_depth: usize,
    pub config_dir: PathBuf,
}

impl ServerSettings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let max_depth = match lookup("PROJECTOR_MAX_DEPTH") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("PROJECTOR_MAX_DEPTH must be a positive integer, got {:?}", raw))?,
            None => DEFAULT_MAX_DEPTH,
        };
        if max_depth == 0 {
            anyhow::bail!("PROJECTOR_MAX_DEPTH must be greater than zero");
        }

        Ok(Self {
            bind: lookup("PROJECTOR_BIND").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            backend_url: lookup("BACKEND_URL").unwrap_or_default(),
            max_depth,
            config_dir: PathBuf::from(
                lookup("PROJECTOR_CONFIG_DIR").unwrap_or_else(|| "configs".to_string()),
            ),
        })
    }
}
