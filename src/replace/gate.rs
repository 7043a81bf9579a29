// ABOUTME: Safety gate checked before any mutation.
// ABOUTME: Existence, then cluster membership, then explicit confirmation.

use crate::inventory::{CloudInstance, GroupRole, Inventory, MatchError};

use super::error::{ReplaceError, ReplaceErrorKind};
use super::request::ReplacementRequest;

/// An instance that passed the existence and membership checks.
#[derive(Debug, Clone)]
pub struct Approved {
    pub instance: CloudInstance,
    pub role: GroupRole,
}

/// What the workflow should do with an approved instance.
#[derive(Debug, Clone)]
pub enum GateDecision {
    /// Confirmed: hand the instance to the state machine.
    Proceed(Approved),
    /// Not confirmed: report what would be affected and do nothing.
    ConfirmationRequired(Approved),
}

impl GateDecision {
    pub fn approved(&self) -> &Approved {
        match self {
            GateDecision::Proceed(a) | GateDecision::ConfirmationRequired(a) => a,
        }
    }
}

/// Decide whether a matched instance may be replaced.
///
/// Checks run in a fixed order so the operator always learns which instance
/// would be affected before being asked to confirm:
/// 1. the identifier matched an instance;
/// 2. in cluster-aware mode, the instance is correlated with a cluster node;
/// 3. the request is confirmed.
pub fn check_gate(
    inventory: &Inventory,
    found: Result<&CloudInstance, MatchError>,
    request: &ReplacementRequest,
) -> Result<GateDecision, ReplaceError> {
    let instance = found.map_err(|MatchError::NotFound(id)| {
        ReplaceError::before_mutation(ReplaceErrorKind::NotFound(id))
    })?;

    match (request.cloud_only(), instance.node_name()) {
        (true, _) => tracing::info!("Instance {} found for deletion", instance.id),
        (false, Some(node)) => {
            tracing::info!("Instance {} ({}) found for deletion", instance.id, node)
        }
        (false, None) => {
            return Err(ReplaceError::before_mutation(
                ReplaceErrorKind::NotClusterMember {
                    instance: instance.id.clone(),
                },
            ));
        }
    }

    let approved = Approved {
        instance: instance.clone(),
        role: inventory
            .group_of(instance)
            .map(|g| g.role)
            .unwrap_or_default(),
    };

    if request.confirmed() {
        Ok(GateDecision::Proceed(approved))
    } else {
        tracing::info!("confirmation not given, leaving instance {} untouched", instance.id);
        Ok(GateDecision::ConfirmationRequired(approved))
    }
}
