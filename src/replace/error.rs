// ABOUTME: Error types for the replacement workflow.
// ABOUTME: Every fatal error records the phase it happened in and whether anything was mutated.

use std::fmt;
use std::time::Duration;

use crate::provider::traits::{CloudError, ClusterApiError};
use crate::types::{InstanceId, NodeName};

/// Workflow phase an error is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Lookup and safety checks, before any phase runs.
    Start,
    Surge,
    Detach,
    Drain,
    PostDrainDelay,
    Validate,
    Terminate,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Start => "start",
            Phase::Surge => "surge",
            Phase::Detach => "detach",
            Phase::Drain => "drain",
            Phase::PostDrainDelay => "post-drain-delay",
            Phase::Validate => "validate",
            Phase::Terminate => "terminate",
        };
        f.write_str(s)
    }
}

/// What went wrong.
#[derive(Debug, thiserror::Error)]
pub enum ReplaceErrorKind {
    #[error("could not find instance {0}")]
    NotFound(String),

    #[error(
        "instance {instance} is not a member of the cluster; use --cloudonly to delete it without confirming progress with the kubernetes API"
    )]
    NotClusterMember { instance: InstanceId },

    #[error(
        "a kubernetes API client and cluster validator are required unless --cloudonly is set"
    )]
    ClusterUnavailable,

    #[error("failed to detach instance {instance} from its scaling group: {source}")]
    SurgeFailed {
        instance: InstanceId,
        source: CloudError,
    },

    #[error("failed to cordon node {node}: {source}")]
    DetachFailed {
        node: NodeName,
        source: ClusterApiError,
    },

    #[error("failed to drain node {node}: {source}")]
    DrainFailed {
        node: NodeName,
        source: ClusterApiError,
    },

    #[error("cluster did not validate within {}: {last_failure}", human_duration(.timeout))]
    ValidationTimedOut {
        timeout: Duration,
        last_failure: String,
    },

    #[error("cluster validation was cancelled")]
    ValidationCancelled,

    #[error("failed to terminate instance {instance}: {source}")]
    TerminateFailed {
        instance: InstanceId,
        source: CloudError,
    },

    #[error("operation cancelled")]
    Cancelled,
}

fn human_duration(d: &Duration) -> String {
    humantime::format_duration(*d).to_string()
}

fn cleanup_hint(mutated: &bool) -> &'static str {
    if *mutated {
        "; the instance was left partially removed and may need manual cleanup"
    } else {
        ""
    }
}

/// A fatal replacement failure.
#[derive(Debug, thiserror::Error)]
#[error("{kind} (phase: {phase}){}", cleanup_hint(.mutated))]
pub struct ReplaceError {
    phase: Phase,
    mutated: bool,
    kind: ReplaceErrorKind,
}

impl ReplaceError {
    pub fn new(phase: Phase, mutated: bool, kind: ReplaceErrorKind) -> Self {
        Self {
            phase,
            mutated,
            kind,
        }
    }

    /// Error raised before anything was mutated.
    pub fn before_mutation(kind: ReplaceErrorKind) -> Self {
        Self::new(Phase::Start, false, kind)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether a detach, cordon or drain had already been applied.
    pub fn is_partial(&self) -> bool {
        self.mutated
    }

    pub fn kind(&self) -> &ReplaceErrorKind {
        &self.kind
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(
            self.kind,
            ReplaceErrorKind::Cancelled | ReplaceErrorKind::ValidationCancelled
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_phase_and_cleanup() {
        let err = ReplaceError::new(
            Phase::Drain,
            true,
            ReplaceErrorKind::DrainFailed {
                node: NodeName::new("ip-10-0-0-5"),
                source: ClusterApiError::Eviction("pdb violated".to_string()),
            },
        );
        let msg = err.to_string();
        assert!(msg.contains("failed to drain node ip-10-0-0-5"));
        assert!(msg.contains("pdb violated"));
        assert!(msg.contains("phase: drain"));
        assert!(msg.contains("manual cleanup"));
    }

    #[test]
    fn kind_is_rendered_once_in_a_report() {
        let err = ReplaceError::new(
            Phase::Terminate,
            true,
            ReplaceErrorKind::NotFound("i-gone".to_string()),
        );
        let head: &(dyn std::error::Error + 'static) = &err;
        let chain: Vec<String> = std::iter::successors(Some(head), |e| e.source())
            .map(|e| e.to_string())
            .collect();
        let report = chain.join(": ");
        assert_eq!(report.matches("could not find instance i-gone").count(), 1);
    }

    #[test]
    fn display_omits_cleanup_without_mutation() {
        let err =
            ReplaceError::before_mutation(ReplaceErrorKind::NotFound("i-missing".to_string()));
        assert_eq!(err.to_string(), "could not find instance i-missing (phase: start)");
        assert!(!err.is_partial());
    }

    #[test]
    fn not_cluster_member_mentions_cloudonly() {
        let err = ReplaceErrorKind::NotClusterMember {
            instance: InstanceId::new("i-1"),
        };
        assert!(err.to_string().contains("--cloudonly"));
    }

    #[test]
    fn timeout_formats_duration() {
        let err = ReplaceErrorKind::ValidationTimedOut {
            timeout: Duration::from_secs(300),
            last_failure: "node ip-1 is not ready".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "cluster did not validate within 5m: node ip-1 is not ready"
        );
    }

    #[test]
    fn cancellation_kinds() {
        assert!(ReplaceError::new(Phase::Validate, true, ReplaceErrorKind::ValidationCancelled)
            .is_cancellation());
        assert!(ReplaceError::new(Phase::Drain, true, ReplaceErrorKind::Cancelled).is_cancellation());
        assert!(!ReplaceError::before_mutation(ReplaceErrorKind::ClusterUnavailable)
            .is_cancellation());
    }
}
