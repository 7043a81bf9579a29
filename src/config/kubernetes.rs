// ABOUTME: kubectl configuration for cluster-aware replacements.
// ABOUTME: Binary, context, kubeconfig and drain behaviour.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct KubernetesConfig {
    #[serde(default = "default_kubectl")]
    pub kubectl: String,

    /// kubeconfig context; defaults to the cluster name.
    #[serde(default)]
    pub context: Option<String>,

    #[serde(default)]
    pub kubeconfig: Option<PathBuf>,

    #[serde(default = "default_drain_args")]
    pub drain_args: Vec<String>,

    #[serde(default = "default_drain_timeout", with = "humantime_serde")]
    pub drain_timeout: Duration,

    /// Node label naming the instance group, used to scope validation failures.
    #[serde(default)]
    pub group_label: Option<String>,
}

fn default_kubectl() -> String {
    "kubectl".to_string()
}

fn default_drain_args() -> Vec<String> {
    vec![
        "--ignore-daemonsets".to_string(),
        "--delete-emptydir-data".to_string(),
        "--force".to_string(),
    ]
}

fn default_drain_timeout() -> Duration {
    Duration::from_secs(15 * 60)
}

impl Default for KubernetesConfig {
    fn default() -> Self {
        KubernetesConfig {
            kubectl: default_kubectl(),
            context: None,
            kubeconfig: None,
            drain_args: default_drain_args(),
            drain_timeout: default_drain_timeout(),
            group_label: None,
        }
    }
}
