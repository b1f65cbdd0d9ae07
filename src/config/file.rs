//! File-based configuration loading
//!
//! Loads named client profiles from a JSON file

use super::settings::ClientConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Client profiles loaded from a JSON file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientProfiles {
    /// Client configurations by profile name
    #[serde(default)]
    pub clients: HashMap<String, ClientConfig>,
}

impl ClientProfiles {
    /// Load profiles from JSON file
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading client profiles from: {:?}", path);

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let profiles: ClientProfiles = serde_json::from_str(&content)
            .with_context(|| "Failed to parse client profiles JSON")?;

        profiles.validate()?;

        debug!("Loaded {} client profiles", profiles.clients.len());
        Ok(profiles)
    }

    /// Default file locations, in search order:
    /// 1. ~/.config/api-requests/clients.json
    /// 2. ./clients.json
    pub fn default_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".config").join("api-requests").join("clients.json"));
        }
        paths.push(PathBuf::from("clients.json"));
        paths
    }

    /// Load profiles from the first default location that exists
    pub fn load_default() -> Result<Self> {
        for path in Self::default_paths() {
            if path.exists() {
                return Self::load(&path);
            }
        }

        anyhow::bail!(
            "Client profiles file not found. Please create one at:\n\
             - ~/.config/api-requests/clients.json (recommended)\n\
             - ./clients.json (current directory)"
        )
    }

    fn validate(&self) -> Result<()> {
        for (name, config) in &self.clients {
            config
                .validate()
                .with_context(|| format!("Invalid configuration for client '{}'", name))?;
        }
        Ok(())
    }

    /// Configuration of one profile
    pub fn get(&self, name: &str) -> Option<&ClientConfig> {
        self.clients.get(name)
    }

    /// Sorted profile names
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.clients.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
