// ABOUTME: Resolves a user-supplied instance ID or node name to one inventory entry.
// ABOUTME: Scans groups in order, ready before needs-update, and the first match wins.

use thiserror::Error;

use super::{CloudInstance, Inventory};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatchError {
    #[error("could not find instance {0}")]
    NotFound(String),
}

fn matches(instance: &CloudInstance, identifier: &str, cloud_only: bool) -> bool {
    instance.id == *identifier
        || (!cloud_only && instance.node_name().is_some_and(|name| *name == *identifier))
}

/// Find the instance an identifier refers to.
///
/// The identifier may be a cloud instance ID or, unless `cloud_only` is set,
/// the name of the cluster node correlated with the instance. Groups are
/// scanned in inventory order; within a group, ready instances come before
/// instances needing an update. The first match is returned.
///
/// If a later entry also matches (for example a node name equal to another
/// instance's ID) the first match is still returned, but a warning is logged.
pub fn find_instance<'a>(
    inventory: &'a Inventory,
    identifier: &str,
    cloud_only: bool,
) -> Result<&'a CloudInstance, MatchError> {
    let mut candidates = inventory
        .groups()
        .iter()
        .flat_map(|group| group.instances())
        .filter(|instance| matches(instance, identifier, cloud_only));

    let found = candidates
        .next()
        .ok_or_else(|| MatchError::NotFound(identifier.to_string()))?;

    let others: Vec<&str> = candidates.map(|i| i.id.as_str()).collect();
    if !others.is_empty() {
        tracing::warn!(
            identifier,
            chosen = %found.id,
            ignored = ?others,
            "identifier matches more than one instance; using the first"
        );
    }

    Ok(found)
}
