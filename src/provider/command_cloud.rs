// ABOUTME: CloudProvider backed by operator-configured shell commands.
// ABOUTME: The list command prints the inventory as JSON; context is passed via NODESWAP_* variables.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::CloudConfig;
use crate::error::Result;
use crate::inventory::{CloudInstance, CloudInstanceGroup, ClusterMember, GroupRole};
use crate::types::{GroupName, InstanceId, NodeName};

use super::error::ExecError;
use super::exec::Exec;
use super::traits::{CloudError, CloudProvider};

/// Instance groups as printed by the list command.
#[derive(Debug, Deserialize)]
struct GroupListing {
    name: GroupName,
    #[serde(default)]
    role: GroupRole,
    #[serde(default)]
    ready: Vec<InstanceListing>,
    #[serde(default)]
    needs_update: Vec<InstanceListing>,
}

#[derive(Debug, Deserialize)]
struct InstanceListing {
    id: InstanceId,
    /// Node name the instance registers as, when the cloud knows it.
    #[serde(default)]
    node: Option<NodeName>,
}

impl InstanceListing {
    /// Correlate with a live member by reported node name, else by instance ID.
    fn into_instance(self, members: &[ClusterMember]) -> CloudInstance {
        let member = members
            .iter()
            .find(|m| match &self.node {
                Some(node) => &m.name == node,
                None => m.name.as_str() == self.id.as_str(),
            })
            .cloned();
        CloudInstance {
            id: self.id,
            group: None,
            member,
        }
    }
}

/// Shell commands that talk to the cloud on nodeswap's behalf.
#[derive(Debug, Clone)]
pub struct CommandCloud {
    cluster: String,
    list: String,
    detach: String,
    terminate: String,
    env: Vec<(String, String)>,
}

impl CommandCloud {
    pub fn new(cluster: &str, config: &CloudConfig) -> Result<Self> {
        Ok(Self {
            cluster: cluster.to_string(),
            list: config.list.clone(),
            detach: config.detach.clone(),
            terminate: config.terminate.clone(),
            env: config.resolved_env()?,
        })
    }

    fn exec(&self, script: &str) -> Exec {
        Exec::shell(script)
            .envs(self.env.iter().map(|(k, v)| (k, v)))
            .env("NODESWAP_CLUSTER", &self.cluster)
    }

    fn for_instance(&self, script: &str, instance: &CloudInstance) -> Exec {
        self.exec(script)
            .env("NODESWAP_INSTANCE_ID", instance.id.as_str())
            .env(
                "NODESWAP_GROUP",
                instance.group.as_ref().map(GroupName::as_str).unwrap_or(""),
            )
            .env(
                "NODESWAP_NODE",
                instance.node_name().map(NodeName::as_str).unwrap_or(""),
            )
    }
}

fn api_error(e: ExecError) -> CloudError {
    CloudError::Api(e.to_string())
}

/// Parse list command output into groups, correlating instances with `members`.
fn parse_groups(
    json: &str,
    members: &[ClusterMember],
) -> std::result::Result<Vec<CloudInstanceGroup>, CloudError> {
    let listings: Vec<GroupListing> =
        serde_json::from_str(json).map_err(|e| CloudError::InvalidInventory(e.to_string()))?;

    Ok(listings
        .into_iter()
        .map(|g| {
            let mut group = CloudInstanceGroup::new(g.name, g.role);
            group.ready = g.ready.into_iter().map(|i| i.into_instance(members)).collect();
            group.needs_update = g
                .needs_update
                .into_iter()
                .map(|i| i.into_instance(members))
                .collect();
            group
        })
        .collect())
}

#[async_trait]
impl CloudProvider for CommandCloud {
    async fn list_groups(
        &self,
        members: &[ClusterMember],
    ) -> std::result::Result<Vec<CloudInstanceGroup>, CloudError> {
        let nodes = serde_json::to_string(members).map_err(|e| CloudError::Api(e.to_string()))?;
        let out = self
            .exec(&self.list)
            .env("NODESWAP_NODES", nodes)
            .output()
            .await
            .map_err(api_error)?;
        let groups = parse_groups(&out, members)?;
        tracing::debug!(groups = groups.len(), "listed instance groups");
        Ok(groups)
    }

    async fn detach_instance(&self, instance: &CloudInstance) -> std::result::Result<(), CloudError> {
        self.for_instance(&self.detach, instance)
            .output()
            .await
            .map(drop)
            .map_err(api_error)
    }

    async fn terminate_instance(
        &self,
        instance: &CloudInstance,
    ) -> std::result::Result<(), CloudError> {
        self.for_instance(&self.terminate, instance)
            .output()
            .await
            .map(drop)
            .map_err(|e| match e.stderr() {
                Some(stderr) if stderr.contains("NotFound") => {
                    CloudError::InstanceNotFound(instance.id.to_string())
                }
                _ => api_error(e),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CloudConfig;
    use std::collections::BTreeMap;

    const LISTING: &str = r#"[
        {"name": "control-plane-a", "role": "control-plane", "ready": [{"id": "i-cp"}]},
        {"name": "nodes", "ready": [{"id": "i-1", "node": "ip-10-0-0-1"}],
         "needs_update": [{"id": "i-2", "node": "ip-10-0-0-2"}]}
    ]"#;

    fn member(name: &str) -> ClusterMember {
        ClusterMember {
            name: NodeName::new(name),
            ready: true,
        }
    }

    fn cloud(list: &str, terminate: &str) -> CommandCloud {
        CommandCloud::new(
            "test.example.com",
            &CloudConfig {
                list: list.to_string(),
                detach: "true".to_string(),
                terminate: terminate.to_string(),
                env: BTreeMap::new(),
            },
        )
        .unwrap()
    }

    #[test]
    fn correlates_by_reported_node_name() {
        let groups = parse_groups(LISTING, &[member("ip-10-0-0-2")]).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].role, GroupRole::ControlPlane);
        assert!(groups[1].ready[0].member.is_none());
        assert_eq!(
            groups[1].needs_update[0].node_name().unwrap().as_str(),
            "ip-10-0-0-2"
        );
    }

    #[test]
    fn correlates_by_instance_id_without_node_name() {
        let groups = parse_groups(LISTING, &[member("i-cp")]).unwrap();
        assert_eq!(groups[0].ready[0].node_name().unwrap().as_str(), "i-cp");
    }

    #[test]
    fn no_members_means_no_correlation() {
        let groups = parse_groups(LISTING, &[]).unwrap();
        assert!(groups.iter().flat_map(|g| g.instances()).all(|i| i.member.is_none()));
    }

    #[test]
    fn garbage_is_invalid_inventory() {
        let err = parse_groups("not json", &[]).unwrap_err();
        assert!(matches!(err, CloudError::InvalidInventory(_)));
    }

    #[tokio::test]
    async fn list_command_sees_cluster_and_nodes() {
        let cloud = cloud(
            r#"test "$NODESWAP_CLUSTER" = test.example.com && printf '[{"name":"nodes","ready":[{"id":"i-1"}]}]'"#,
            "true",
        );
        let groups = cloud.list_groups(&[]).await.unwrap();
        assert_eq!(groups[0].ready[0].id.as_str(), "i-1");
    }

    #[tokio::test]
    async fn terminate_passes_instance_id() {
        let cloud = cloud("true", r#"test "$NODESWAP_INSTANCE_ID" = i-42"#);
        cloud.terminate_instance(&CloudInstance::new("i-42")).await.unwrap();
        let err = cloud
            .terminate_instance(&CloudInstance::new("i-43"))
            .await
            .unwrap_err();
        assert!(matches!(err, CloudError::Api(_)));
    }
}
