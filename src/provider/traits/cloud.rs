// ABOUTME: Cloud provider operations trait.
// ABOUTME: List grouped instances, detach from a scaling group, terminate.

use async_trait::async_trait;

use crate::inventory::{CloudInstance, CloudInstanceGroup, ClusterMember};

/// Cloud-side operations on managed instance groups.
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// List every instance group with its ready and needs-update instances.
    ///
    /// `members` are the live cluster nodes used to correlate instances with
    /// cluster membership; empty in cloud-only mode.
    async fn list_groups(
        &self,
        members: &[ClusterMember],
    ) -> Result<Vec<CloudInstanceGroup>, CloudError>;

    /// Remove an instance from its scaling group so a replacement is launched.
    async fn detach_instance(&self, instance: &CloudInstance) -> Result<(), CloudError>;

    /// Destroy an instance.
    async fn terminate_instance(&self, instance: &CloudInstance) -> Result<(), CloudError>;
}

/// Errors from cloud operations.
#[derive(Debug, thiserror::Error)]
pub enum CloudError {
    #[error("instance not found: {0}")]
    InstanceNotFound(String),

    #[error("invalid inventory: {0}")]
    InvalidInventory(String),

    #[error("cloud API error: {0}")]
    Api(String),
}
