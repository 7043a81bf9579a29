// ABOUTME: Drives one replacement from identifier to outcome.
// ABOUTME: Matcher, safety gate, then the state machine in cloud-only or cluster-aware order.

use crate::clock::{CancelToken, Clock};
use crate::diagnostics::Warning;
use crate::inventory::{Inventory, find_instance};
use crate::provider::traits::{CloudProvider, ClusterApi, ClusterValidator};
use crate::types::{InstanceId, NodeName};

use super::error::{ReplaceError, ReplaceErrorKind};
use super::gate::{Approved, GateDecision, check_gate};
use super::machine::Replacement;
use super::request::ReplacementRequest;

/// The live-cluster collaborators, absent in cloud-only mode.
#[derive(Clone, Copy)]
pub struct ClusterSide<'a> {
    pub api: &'a dyn ClusterApi,
    pub validator: &'a dyn ClusterValidator,
}

/// Everything the workflow talks to. Borrowed, never owned.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub cloud: &'a dyn CloudProvider,
    pub cluster: Option<ClusterSide<'a>>,
    pub clock: &'a dyn Clock,
}

/// A completed replacement.
#[derive(Debug, Clone)]
pub struct Replaced {
    pub instance: InstanceId,
    pub node: Option<NodeName>,
    /// Whether the instance was detached from its scaling group first.
    pub surged: bool,
    /// Failures tolerated along the way.
    pub warnings: Vec<Warning>,
}

/// Terminal result of a replacement that did not fail.
#[derive(Debug, Clone)]
pub enum ReplacementOutcome {
    Replaced(Replaced),
    /// The request was not confirmed; nothing was changed.
    ConfirmationRequired {
        instance: InstanceId,
        node: Option<NodeName>,
    },
}

/// Resolve `request`'s identifier against `inventory` and apply the safety
/// gate. Nothing is mutated.
pub fn approve(
    inventory: &Inventory,
    request: &ReplacementRequest,
) -> Result<GateDecision, ReplaceError> {
    let found = find_instance(inventory, request.identifier(), request.cloud_only());
    check_gate(inventory, found, request)
}

/// Run the state machine on an approved, confirmed target.
///
/// In cloud-only mode the instance is terminated straight away; otherwise the
/// full surge → detach → drain → delay → validate → terminate sequence runs.
///
/// On cancellation the workflow stops where it is. Nothing already applied
/// is rolled back.
pub async fn execute(
    target: Approved,
    request: ReplacementRequest,
    collaborators: Collaborators<'_>,
    cancel: &CancelToken,
) -> Result<Replaced, ReplaceError> {
    let cloud_only = request.cloud_only();
    let replacement = Replacement::new(target, request, cancel.clone());

    let terminated = if cloud_only {
        replacement.skip_to_terminate(collaborators.cloud).await?
    } else {
        let cluster = collaborators
            .cluster
            .ok_or_else(|| ReplaceError::before_mutation(ReplaceErrorKind::ClusterUnavailable))?;

        replacement
            .surge(collaborators.cloud)
            .await?
            .detach(cluster.api)
            .await?
            .drain(cluster.api)
            .await?
            .settle(collaborators.clock)
            .await?
            .validate(cluster.validator, collaborators.clock)
            .await?
            .terminate(collaborators.cloud)
            .await?
    };

    let replaced = terminated.finish();
    tracing::info!("Instance {} deleted", replaced.instance);
    Ok(replaced)
}

/// Replace the instance `request` identifies: [`approve`], then [`execute`]
/// if the request was confirmed.
pub async fn replace_instance(
    inventory: &Inventory,
    request: ReplacementRequest,
    collaborators: Collaborators<'_>,
    cancel: &CancelToken,
) -> Result<ReplacementOutcome, ReplaceError> {
    match approve(inventory, &request)? {
        GateDecision::Proceed(target) => execute(target, request, collaborators, cancel)
            .await
            .map(ReplacementOutcome::Replaced),
        GateDecision::ConfirmationRequired(target) => Ok(ReplacementOutcome::ConfirmationRequired {
            node: target.instance.node_name().cloned(),
            instance: target.instance.id,
        }),
    }
}
