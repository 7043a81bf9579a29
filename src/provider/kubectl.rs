// ABOUTME: ClusterApi and ClusterValidator backed by the kubectl binary.
// ABOUTME: Lists nodes as JSON, cordons and drains, and treats NotReady nodes as validation failures.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::KubernetesConfig;
use crate::inventory::ClusterMember;
use crate::types::{GroupName, NodeName};

use super::error::ExecError;
use super::exec::Exec;
use super::traits::{
    ClusterApi, ClusterApiError, ClusterValidator, ValidationFailure, ValidationReport,
    ValidatorError,
};

/// Deadline for read-only and cordon calls.
const QUICK_CALL_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct NodeList {
    #[serde(default)]
    items: Vec<Node>,
}

#[derive(Debug, Deserialize)]
struct Node {
    metadata: NodeMetadata,
    #[serde(default)]
    status: NodeStatus,
}

#[derive(Debug, Deserialize)]
struct NodeMetadata {
    name: String,
    #[serde(default)]
    labels: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
struct NodeStatus {
    #[serde(default)]
    conditions: Vec<NodeCondition>,
}

#[derive(Debug, Deserialize)]
struct NodeCondition {
    #[serde(rename = "type")]
    kind: String,
    status: String,
    #[serde(default)]
    message: Option<String>,
}

impl Node {
    fn ready_condition(&self) -> Option<&NodeCondition> {
        self.status.conditions.iter().find(|c| c.kind == "Ready")
    }

    fn is_ready(&self) -> bool {
        self.ready_condition().is_some_and(|c| c.status == "True")
    }
}

/// Talks to the cluster through `kubectl`.
#[derive(Debug, Clone)]
pub struct Kubectl {
    binary: String,
    context: String,
    kubeconfig: Option<PathBuf>,
    drain_args: Vec<String>,
    drain_timeout: Duration,
    group_label: Option<String>,
}

impl Kubectl {
    pub fn new(context: &str, config: &KubernetesConfig) -> Self {
        Self {
            binary: config.kubectl.clone(),
            context: context.to_string(),
            kubeconfig: config.kubeconfig.clone(),
            drain_args: config.drain_args.clone(),
            drain_timeout: config.drain_timeout,
            group_label: config.group_label.clone(),
        }
    }

    fn command(&self) -> Exec {
        let exec = Exec::new(&self.binary).arg("--context").arg(&self.context);
        match &self.kubeconfig {
            Some(path) => exec.arg("--kubeconfig").arg(path),
            None => exec,
        }
    }

    async fn get_nodes(&self) -> Result<NodeList, ExecError> {
        let out = self
            .command()
            .args(["get", "nodes", "-o", "json"])
            .timeout(QUICK_CALL_TIMEOUT)
            .output()
            .await?;
        parse_nodes(&self.binary, &out)
    }

    /// kubectl enforces its own drain timeout; leave it room to report.
    fn drain_deadline(&self) -> Duration {
        self.drain_timeout.saturating_add(QUICK_CALL_TIMEOUT)
    }

    fn group_of(&self, node: &Node) -> Option<GroupName> {
        let label = self.group_label.as_ref()?;
        let value = node.metadata.labels.get(label)?;
        GroupName::new(value.as_str()).ok()
    }
}

fn parse_nodes(program: &str, json: &str) -> Result<NodeList, ExecError> {
    serde_json::from_str(json).map_err(|source| ExecError::Output {
        program: program.to_string(),
        source,
    })
}

/// kubectl parses Go durations, which have no unit above hours.
fn drain_timeout_arg(timeout: Duration) -> String {
    format!("--timeout={}s", timeout.as_secs())
}

/// Map a failed node-scoped call, recognising kubectl's not-found message.
fn node_error(node: &NodeName, e: ExecError, other: fn(String) -> ClusterApiError) -> ClusterApiError {
    match e.stderr() {
        Some(stderr) if stderr.contains("NotFound") || stderr.contains("not found") => {
            ClusterApiError::NodeNotFound(node.to_string())
        }
        _ => other(e.to_string()),
    }
}

#[async_trait]
impl ClusterApi for Kubectl {
    async fn list_nodes(&self) -> Result<Vec<ClusterMember>, ClusterApiError> {
        let nodes = self
            .get_nodes()
            .await
            .map_err(|e| ClusterApiError::Unreachable(e.to_string()))?;
        Ok(nodes
            .items
            .iter()
            .map(|n| ClusterMember {
                name: NodeName::new(n.metadata.name.as_str()),
                ready: n.is_ready(),
            })
            .collect())
    }

    async fn cordon_node(&self, node: &NodeName) -> Result<(), ClusterApiError> {
        self.command()
            .arg("cordon")
            .arg(node.as_str())
            .timeout(QUICK_CALL_TIMEOUT)
            .output()
            .await
            .map(drop)
            .map_err(|e| node_error(node, e, ClusterApiError::Api))
    }

    async fn drain_node(&self, node: &NodeName) -> Result<(), ClusterApiError> {
        self.command()
            .arg("drain")
            .arg(node.as_str())
            .args(&self.drain_args)
            .arg(drain_timeout_arg(self.drain_timeout))
            .timeout(self.drain_deadline())
            .output()
            .await
            .map(drop)
            .map_err(|e| node_error(node, e, ClusterApiError::Eviction))
    }
}

#[async_trait]
impl ClusterValidator for Kubectl {
    async fn validate(&self) -> Result<ValidationReport, ValidatorError> {
        let nodes = self
            .get_nodes()
            .await
            .map_err(|e| ValidatorError::Unavailable(e.to_string()))?;

        let failures = nodes
            .items
            .iter()
            .filter(|n| !n.is_ready())
            .map(|n| ValidationFailure {
                kind: "Node".to_string(),
                name: n.metadata.name.clone(),
                message: n
                    .ready_condition()
                    .and_then(|c| c.message.clone())
                    .unwrap_or_else(|| "node is not ready".to_string()),
                group: self.group_of(n),
            })
            .collect();

        Ok(ValidationReport { failures })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NODES: &str = r#"{
      "items": [
        {"metadata": {"name": "ip-10-0-0-1", "labels": {"group": "nodes"}},
         "status": {"conditions": [{"type": "Ready", "status": "True"}]}},
        {"metadata": {"name": "ip-10-0-0-2", "labels": {"group": "nodes"}},
         "status": {"conditions": [{"type": "Ready", "status": "False", "message": "kubelet stopped posting"}]}},
        {"metadata": {"name": "ip-10-0-0-3"}}
      ]
    }"#;

    #[test]
    fn readiness_comes_from_the_ready_condition() {
        let list = parse_nodes("kubectl", NODES).unwrap();
        let ready: Vec<bool> = list.items.iter().map(Node::is_ready).collect();
        assert_eq!(ready, vec![true, false, false]);
    }

    #[test]
    fn group_attribution_uses_configured_label() {
        let list = parse_nodes("kubectl", NODES).unwrap();
        let config = KubernetesConfig {
            group_label: Some("group".to_string()),
            ..KubernetesConfig::default()
        };
        let kubectl = Kubectl::new("test", &config);
        assert_eq!(kubectl.group_of(&list.items[1]).unwrap().as_str(), "nodes");
        assert!(kubectl.group_of(&list.items[2]).is_none());

        let unlabelled = Kubectl::new("test", &KubernetesConfig::default());
        assert!(unlabelled.group_of(&list.items[1]).is_none());
    }

    #[test]
    fn drain_timeout_is_passed_in_seconds() {
        assert_eq!(drain_timeout_arg(Duration::from_secs(15 * 60)), "--timeout=900s");
        assert_eq!(
            drain_timeout_arg(Duration::from_secs(26 * 3600)),
            "--timeout=93600s"
        );
    }

    #[test]
    fn huge_drain_timeout_does_not_overflow() {
        let config = KubernetesConfig {
            drain_timeout: Duration::MAX,
            ..KubernetesConfig::default()
        };
        assert_eq!(Kubectl::new("test", &config).drain_deadline(), Duration::MAX);
        assert_eq!(
            Kubectl::new("test", &KubernetesConfig::default()).drain_deadline(),
            Duration::from_secs(16 * 60)
        );
    }

    #[test]
    fn bad_json_is_an_output_error() {
        let err = parse_nodes("kubectl", "<html>").unwrap_err();
        assert!(matches!(err, ExecError::Output { .. }));
    }

    #[test]
    fn not_found_stderr_maps_to_node_not_found() {
        let node = NodeName::new("ip-10-0-0-9");
        let err = ExecError::Exit {
            program: "kubectl".to_string(),
            code: Some(1),
            stderr: "Error from server (NotFound): nodes \"ip-10-0-0-9\" not found".to_string(),
        };
        assert!(matches!(
            node_error(&node, err, ClusterApiError::Api),
            ClusterApiError::NodeNotFound(n) if n == "ip-10-0-0-9"
        ));
    }

    #[tokio::test]
    async fn missing_binary_is_unreachable() {
        let config = KubernetesConfig {
            kubectl: "nodeswap-test-no-such-kubectl".to_string(),
            ..KubernetesConfig::default()
        };
        let err = Kubectl::new("test", &config).list_nodes().await.unwrap_err();
        assert!(matches!(err, ClusterApiError::Unreachable(_)));
    }
}
