//! hostgrid.toml configuration parser.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Default delay between a transient state and its completion.
pub const DEFAULT_TRANSITION_DELAY_MS: u64 = 2000;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct HostgridConfig {
    pub lifecycle: LifecycleSettings,
    pub placement: PlacementSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LifecycleSettings {
    /// Milliseconds between `starting`/`stopping` and the final state,
    /// and between a scale-up and replica placement.
    pub transition_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlacementSettings {
    /// Seed for replica name suffixes and node picks. Entropy when unset.
    pub seed: Option<u64>,
    pub nodes: Vec<NodeConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeConfig {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            transition_delay_ms: DEFAULT_TRANSITION_DELAY_MS,
        }
    }
}

impl LifecycleSettings {
    pub fn transition_delay(&self) -> Duration {
        Duration::from_millis(self.transition_delay_ms)
    }
}

impl Default for PlacementSettings {
    fn default() -> Self {
        Self {
            seed: None,
            nodes: default_nodes(),
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: "info,hostgrid=debug".to_string(),
        }
    }
}

/// The three-worker pool replicas are placed on when none is configured.
pub fn default_nodes() -> Vec<NodeConfig> {
    (1..=3)
        .map(|i| NodeConfig {
            id: format!("node-{i}"),
            name: format!("worker-{i:02}"),
        })
        .collect()
}

impl HostgridConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: HostgridConfig = toml::from_str(content)?;
        anyhow::ensure!(
            !config.placement.nodes.is_empty(),
            "placement.nodes must list at least one node"
        );
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
