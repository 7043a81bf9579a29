// ABOUTME: Kubernetes API operations trait.
// ABOUTME: List member nodes, cordon and drain a node.

use async_trait::async_trait;

use crate::inventory::ClusterMember;
use crate::types::NodeName;

/// Operations against the live cluster's API server.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// List the nodes currently registered with the cluster.
    async fn list_nodes(&self) -> Result<Vec<ClusterMember>, ClusterApiError>;

    /// Mark a node unschedulable.
    async fn cordon_node(&self, node: &NodeName) -> Result<(), ClusterApiError>;

    /// Evict workloads from a node.
    async fn drain_node(&self, node: &NodeName) -> Result<(), ClusterApiError>;
}

/// Errors from cluster API operations.
#[derive(Debug, thiserror::Error)]
pub enum ClusterApiError {
    #[error("unable to reach the kubernetes API: {0}")]
    Unreachable(String),

    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("eviction failed: {0}")]
    Eviction(String),

    #[error("kubernetes API error: {0}")]
    Api(String),
}
