// ABOUTME: Config scaffolding for new clusters.
// ABOUTME: Creates nodeswap.yml template files.

use std::path::Path;

use crate::error::{Error, Result};

use super::CONFIG_FILENAME;

pub fn init_config(dir: &Path, cluster: Option<&str>, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let cluster = cluster.unwrap_or("my-cluster.example.com");
    if cluster.trim().is_empty() {
        return Err(Error::InvalidConfig("cluster name cannot be empty".to_string()));
    }

    std::fs::write(&config_path, generate_template_yaml(cluster))?;

    Ok(())
}

fn generate_template_yaml(cluster: &str) -> String {
    format!(
        r#"cluster: {cluster}

cloud:
  # Must print the instance groups as JSON:
  # [{{"name": "nodes", "role": "node", "ready": [{{"id": "i-..."}}], "needs_update": []}}]
  # Live nodes are passed in $NODESWAP_NODES (JSON) for correlation.
  list: ./scripts/list-instances.sh
  detach: >-
    aws autoscaling detach-instances
    --instance-ids "$NODESWAP_INSTANCE_ID"
    --auto-scaling-group-name "$NODESWAP_GROUP"
    --no-should-decrement-desired-capacity
  terminate: aws ec2 terminate-instances --instance-ids "$NODESWAP_INSTANCE_ID"

kubernetes:
  kubectl: kubectl
  # context: {cluster}

replacement:
  surge: true
  fail_on_drain_error: true
  fail_on_validate_error: true
  post_drain_delay: 5s
  validation_timeout: 15m
  validate_count: 2
"#
    )
}
