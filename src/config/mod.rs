// ABOUTME: Configuration types and parsing for nodeswap.yml.
// ABOUTME: Handles YAML parsing, config discovery and replacement defaults.

mod cloud;
mod init;
mod kubernetes;
mod replacement;

pub use cloud::{CloudConfig, EnvSource};
pub use init::init_config;
pub use kubernetes::KubernetesConfig;
pub use replacement::ReplacementConfig;

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "nodeswap.yml";
pub const CONFIG_FILENAME_ALT: &str = "nodeswap.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".nodeswap/config.yml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Name of the managed cluster.
    #[serde(deserialize_with = "deserialize_cluster_name")]
    pub cluster: String,

    pub cloud: CloudConfig,

    #[serde(default)]
    pub kubernetes: KubernetesConfig,

    #[serde(default)]
    pub replacement: ReplacementConfig,
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let path = Self::find(dir).ok_or_else(|| Error::ConfigNotFound(dir.to_path_buf()))?;
        Self::load(&path)
    }

    /// First existing config file in `dir`, in lookup order.
    pub fn find(dir: &Path) -> Option<PathBuf> {
        [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ]
        .into_iter()
        .find(|path| path.exists())
    }

    /// kubeconfig context to use, falling back to the cluster name.
    pub fn kube_context(&self) -> &str {
        self.kubernetes.context.as_deref().unwrap_or(&self.cluster)
    }
}

fn deserialize_cluster_name<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    if s.trim().is_empty() {
        return Err(serde::de::Error::custom("cluster name is required"));
    }
    Ok(s)
}
