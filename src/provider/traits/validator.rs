// ABOUTME: Cluster validation trait and report types.
// ABOUTME: A report lists failures, each optionally attributed to an instance group.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::GroupName;

/// Reports whether the cluster is currently healthy.
#[async_trait]
pub trait ClusterValidator: Send + Sync {
    async fn validate(&self) -> Result<ValidationReport, ValidatorError>;
}

/// One reason the cluster is not healthy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFailure {
    /// What kind of object failed (e.g. `Node`, `Pod`).
    pub kind: String,
    pub name: String,
    pub message: String,
    /// Instance group the failure is attributed to, if known.
    #[serde(default)]
    pub group: Option<GroupName>,
}

impl ValidationFailure {
    /// Whether this failure should block an operation on `group`.
    ///
    /// Failures without a group attribution block every group.
    pub fn is_relevant_to(&self, group: Option<&GroupName>) -> bool {
        match (&self.group, group) {
            (None, _) | (_, None) => true,
            (Some(failed), Some(target)) => failed == target,
        }
    }
}

/// Result of one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    #[serde(default)]
    pub failures: Vec<ValidationFailure>,
}

impl ValidationReport {
    pub fn healthy() -> Self {
        Self::default()
    }

    pub fn failing(failure: ValidationFailure) -> Self {
        Self {
            failures: vec![failure],
        }
    }

    /// Failures that block an operation on `group`.
    pub fn failures_for<'a>(
        &'a self,
        group: Option<&'a GroupName>,
    ) -> impl Iterator<Item = &'a ValidationFailure> {
        self.failures.iter().filter(move |f| f.is_relevant_to(group))
    }
}

/// Errors from running a validation pass.
#[derive(Debug, thiserror::Error)]
pub enum ValidatorError {
    #[error("cluster validation could not run: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(group: Option<&str>) -> ValidationFailure {
        ValidationFailure {
            kind: "Node".to_string(),
            name: "ip-10-0-0-9".to_string(),
            message: "node is not ready".to_string(),
            group: group.map(|g| GroupName::new(g).unwrap()),
        }
    }

    #[test]
    fn unattributed_failures_block_every_group() {
        let nodes = GroupName::new("nodes").unwrap();
        assert!(failure(None).is_relevant_to(Some(&nodes)));
        assert!(failure(None).is_relevant_to(None));
    }

    #[test]
    fn attributed_failures_only_block_their_group() {
        let nodes = GroupName::new("nodes").unwrap();
        let other = GroupName::new("bastions").unwrap();
        assert!(failure(Some("nodes")).is_relevant_to(Some(&nodes)));
        assert!(!failure(Some("nodes")).is_relevant_to(Some(&other)));
    }

    #[test]
    fn report_filters_failures_for_group() {
        let nodes = GroupName::new("nodes").unwrap();
        let report = ValidationReport {
            failures: vec![failure(Some("bastions")), failure(Some("nodes"))],
        };
        assert_eq!(report.failures_for(Some(&nodes)).count(), 1);
        assert!(ValidationReport::healthy().failures_for(Some(&nodes)).next().is_none());
    }
}
