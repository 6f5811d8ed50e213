use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api: ApiSettings,
    pub network: NetworkSettings,
    pub force: ForceSettings,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid settings JSON in {}", path.display()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub account: String,
    pub timeout_secs: u64,
    /// Environment variable holding an optional API token. Read on every request.
    pub token_env: String,
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.github.com".to_owned(),
            account: "octocat".to_owned(),
            timeout_secs: 10,
            token_env: "GITHUB_TOKEN".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSettings {
    /// Repositories kept (by star count) before inference and simulation.
    pub max_nodes: usize,
    pub degree_cap: usize,
    pub dense_degree_cap: usize,
    /// Node counts above this use `dense_degree_cap`.
    pub dense_threshold: usize,
}

impl NetworkSettings {
    pub fn degree_cap_for(&self, node_count: usize) -> usize {
        if node_count > self.dense_threshold {
            self.dense_degree_cap
        } else {
            self.degree_cap
        }
    }
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            max_nodes: 48,
            degree_cap: 12,
            dense_degree_cap: 10,
            dense_threshold: 40,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceSettings {
    pub repulsion: f32,
    pub attraction: f32,
    pub link_distance: f32,
    pub center_gravity: f32,
    pub damping: f32,
    pub max_speed: f32,
    pub min_distance_sq: f32,
    pub max_dt: f32,
}

impl Default for ForceSettings {
    fn default() -> Self {
        Self {
            repulsion: 38.0,
            attraction: 0.06,
            link_distance: 9.0,
            center_gravity: 0.035,
            damping: 0.08,
            max_speed: 22.0,
            min_distance_sq: 0.01,
            max_dt: 0.12,
        }
    }
}
