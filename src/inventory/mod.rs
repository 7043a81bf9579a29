// ABOUTME: Read-only snapshot of cloud instances grouped by instance group.
// ABOUTME: Each group partitions its instances into ready and needs-update sets.

mod collect;
mod matcher;

pub use collect::{CollectError, collect_inventory};
pub use matcher::{MatchError, find_instance};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

use crate::types::{GroupName, InstanceId, NodeName};

/// Role an instance group plays in the cluster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupRole {
    ControlPlane,
    #[default]
    Node,
    Bastion,
    ApiServer,
}

impl GroupRole {
    /// Whether instances in this role may be detached from their scaling group.
    pub fn can_surge(&self) -> bool {
        !matches!(self, GroupRole::ControlPlane)
    }
}

impl fmt::Display for GroupRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GroupRole::ControlPlane => "control-plane",
            GroupRole::Node => "node",
            GroupRole::Bastion => "bastion",
            GroupRole::ApiServer => "api-server",
        };
        f.write_str(s)
    }
}

/// Minimal projection of a live cluster node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterMember {
    pub name: NodeName,
    #[serde(default)]
    pub ready: bool,
}

/// A cloud-level compute resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudInstance {
    pub id: InstanceId,
    /// Name of the owning group. Filled in by [`Inventory::new`].
    #[serde(skip_deserializing)]
    pub group: Option<GroupName>,
    #[serde(default)]
    pub member: Option<ClusterMember>,
}

impl CloudInstance {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: InstanceId::new(id),
            group: None,
            member: None,
        }
    }

    /// Attach a correlated cluster member record.
    pub fn with_member(mut self, name: impl Into<String>, ready: bool) -> Self {
        self.member = Some(ClusterMember {
            name: NodeName::new(name),
            ready,
        });
        self
    }

    /// Node name of the correlated member, if any.
    pub fn node_name(&self) -> Option<&NodeName> {
        self.member.as_ref().map(|m| &m.name)
    }
}

/// One managed instance group and its instances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudInstanceGroup {
    pub name: GroupName,
    #[serde(default)]
    pub role: GroupRole,
    #[serde(default)]
    pub ready: Vec<CloudInstance>,
    #[serde(default)]
    pub needs_update: Vec<CloudInstance>,
}

impl CloudInstanceGroup {
    pub fn new(name: GroupName, role: GroupRole) -> Self {
        Self {
            name,
            role,
            ready: Vec::new(),
            needs_update: Vec::new(),
        }
    }

    /// Ready instances first, then instances needing an update.
    pub fn instances(&self) -> impl Iterator<Item = &CloudInstance> {
        self.ready.iter().chain(self.needs_update.iter())
    }
}

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("instance {0} appears more than once in the inventory")]
    DuplicateInstance(InstanceId),

    #[error("instance group {0} appears more than once in the inventory")]
    DuplicateGroup(GroupName),
}

/// Snapshot of every cloud instance in the cluster, in a stable order.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    groups: Vec<CloudInstanceGroup>,
}

impl Inventory {
    /// Build an inventory, stamping each instance with its owning group.
    ///
    /// Rejects snapshots where an instance ID shows up twice, whether within
    /// one group's two sets or across groups.
    pub fn new(mut groups: Vec<CloudInstanceGroup>) -> Result<Self, InventoryError> {
        let mut seen_groups = HashSet::new();
        let mut seen_instances = HashSet::new();

        for group in &mut groups {
            if !seen_groups.insert(group.name.clone()) {
                return Err(InventoryError::DuplicateGroup(group.name.clone()));
            }
            let name = group.name.clone();
            for instance in group.ready.iter_mut().chain(group.needs_update.iter_mut()) {
                if !seen_instances.insert(instance.id.clone()) {
                    return Err(InventoryError::DuplicateInstance(instance.id.clone()));
                }
                instance.group = Some(name.clone());
            }
        }

        Ok(Self { groups })
    }

    pub fn groups(&self) -> &[CloudInstanceGroup] {
        &self.groups
    }

    /// Look up the group owning an instance.
    pub fn group_of(&self, instance: &CloudInstance) -> Option<&CloudInstanceGroup> {
        let name = instance.group.as_ref()?;
        self.groups.iter().find(|g| &g.name == name)
    }

    pub fn instance_count(&self) -> usize {
        self.groups
            .iter()
            .map(|g| g.ready.len() + g.needs_update.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.instance_count() == 0
    }
}
