// ABOUTME: Builds the inventory snapshot from the live collaborators.
// ABOUTME: Lists cluster members first (unless cloud-only), then the cloud's instance groups.

use thiserror::Error;

use crate::provider::traits::{CloudError, CloudProvider, ClusterApi, ClusterApiError};

use super::{Inventory, InventoryError};

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("{0}; use --cloudonly to delete the instance without draining it")]
    ClusterUnreachable(#[source] ClusterApiError),

    #[error("listing cloud instances failed: {0}")]
    Cloud(#[from] CloudError),

    #[error(transparent)]
    Inventory(#[from] InventoryError),
}

/// Take a fresh snapshot of the cloud inventory.
///
/// With a cluster API, its nodes are listed and handed to the cloud so
/// instances can be correlated with cluster members. Without one (cloud-only
/// mode) no instance carries a member record.
pub async fn collect_inventory(
    cloud: &dyn CloudProvider,
    cluster: Option<&dyn ClusterApi>,
) -> Result<Inventory, CollectError> {
    let members = match cluster {
        Some(api) => api
            .list_nodes()
            .await
            .map_err(CollectError::ClusterUnreachable)?,
        None => Vec::new(),
    };
    tracing::debug!(members = members.len(), "listed cluster nodes");

    let inventory = Inventory::new(cloud.list_groups(&members).await?)?;
    tracing::debug!(
        groups = inventory.groups().len(),
        instances = inventory.instance_count(),
        "collected inventory"
    );
    if inventory.is_empty() {
        tracing::warn!("cloud reported no instances; check the configured list command");
    }
    Ok(inventory)
}
