// ABOUTME: Replacement struct parameterized by state marker, with its phase transitions.
// ABOUTME: Each transition consumes self, checks for cancellation and applies the failure policy.

use crate::clock::{CancelToken, Clock, pause};
use crate::diagnostics::{Diagnostics, Warning};
use crate::provider::traits::{CloudProvider, ClusterApi, ClusterValidator};
use crate::types::NodeName;

use super::error::{Phase, ReplaceError, ReplaceErrorKind};
use super::gate::Approved;
use super::request::{PhaseOutcome, ReplacementRequest};
use super::run::Replaced;
use super::state::{Detached, Drained, Pending, Settled, Terminated, Validated};
use super::validation::{ValidationError, ValidationPoller};

/// Result type for a phase transition. Errors carry phase and mutation state.
pub type TransitionResult<T> = Result<Replacement<T>, ReplaceError>;

/// A replacement in progress, parameterized by its current state.
///
/// Only the transitions valid for state `S` are available, so phases cannot
/// run out of order. Tolerated failures are accumulated as the machine moves
/// forward and returned by [`Replacement::finish`].
#[derive(Debug)]
pub struct Replacement<S> {
    request: ReplacementRequest,
    target: Approved,
    cancel: CancelToken,
    mutated: bool,
    surged: bool,
    diagnostics: Diagnostics,
    state: S,
}

// =============================================================================
// Internal Helpers
// =============================================================================

impl<S> Replacement<S> {
    fn transition<T>(self, state: T) -> Replacement<T> {
        Replacement {
            request: self.request,
            target: self.target,
            cancel: self.cancel,
            mutated: self.mutated,
            surged: self.surged,
            diagnostics: self.diagnostics,
            state,
        }
    }

    fn fail(&self, phase: Phase, kind: ReplaceErrorKind) -> ReplaceError {
        ReplaceError::new(phase, self.mutated, kind)
    }

    /// Refuse to start `phase` once cancellation has been requested.
    fn checkpoint(&self, phase: Phase) -> Result<(), ReplaceError> {
        if self.cancel.is_cancelled() {
            tracing::warn!(%phase, "cancelled; no further changes will be made");
            return Err(self.fail(phase, ReplaceErrorKind::Cancelled));
        }
        Ok(())
    }

    fn node(&self) -> Result<NodeName, ReplaceError> {
        self.target.instance.node_name().cloned().ok_or_else(|| {
            self.fail(
                Phase::Start,
                ReplaceErrorKind::NotClusterMember {
                    instance: self.target.instance.id.clone(),
                },
            )
        })
    }

    async fn terminate_instance<C: CloudProvider + ?Sized>(
        self,
        cloud: &C,
    ) -> TransitionResult<Terminated> {
        self.checkpoint(Phase::Terminate)?;

        let instance = &self.target.instance;
        tracing::info!("Terminating instance {}", instance.id);
        if let Err(source) = cloud.terminate_instance(instance).await {
            return Err(self.fail(
                Phase::Terminate,
                ReplaceErrorKind::TerminateFailed {
                    instance: instance.id.clone(),
                    source,
                },
            ));
        }

        Ok(self.transition(Terminated))
    }
}

// =============================================================================
// Pending -> Detached (or straight to Terminated in cloud-only mode)
// =============================================================================

impl Replacement<Pending> {
    pub fn new(target: Approved, request: ReplacementRequest, cancel: CancelToken) -> Self {
        Replacement {
            request,
            target,
            cancel,
            mutated: false,
            surged: false,
            diagnostics: Diagnostics::default(),
            state: Pending,
        }
    }

    /// Detach the instance from its scaling group so a replacement launches
    /// before capacity is removed.
    ///
    /// A no-op when surge is disabled. Control-plane instances are never
    /// detached; a warning is recorded and the replacement continues in place.
    ///
    /// # Errors
    ///
    /// Surge failures are always fatal.
    #[must_use = "replacement state must be used"]
    pub async fn surge<C: CloudProvider + ?Sized>(mut self, cloud: &C) -> TransitionResult<Pending> {
        if !self.request.surge() {
            tracing::info!("surge disabled; replacing instance in place");
            return Ok(self);
        }
        if !self.target.role.can_surge() {
            self.diagnostics.warn(Warning::surge_skipped(format!(
                "cannot detach {} instances; assuming --surge=false",
                self.target.role
            )));
            return Ok(self);
        }

        self.checkpoint(Phase::Surge)?;

        let instance = &self.target.instance;
        tracing::info!("Detaching instance {} from its scaling group", instance.id);
        if let Err(source) = cloud.detach_instance(instance).await {
            return Err(self.fail(
                Phase::Surge,
                ReplaceErrorKind::SurgeFailed {
                    instance: instance.id.clone(),
                    source,
                },
            ));
        }

        self.mutated = true;
        self.surged = true;
        Ok(self)
    }

    /// Cordon the node so no new workload is scheduled on it.
    ///
    /// # Errors
    ///
    /// Fatal only if the drain-failure policy is `Fail`.
    #[must_use = "replacement state must be used"]
    pub async fn detach<K: ClusterApi + ?Sized>(mut self, cluster: &K) -> TransitionResult<Detached> {
        self.checkpoint(Phase::Detach)?;
        let node = self.node()?;

        tracing::info!("Cordoning node {}", node);
        match self.request.drain_policy().judge(cluster.cordon_node(&node).await) {
            PhaseOutcome::Completed => self.mutated = true,
            PhaseOutcome::Tolerated(e) => self.diagnostics.warn(Warning::detach_tolerated(
                format!("Ignoring error cordoning node {}: {}", node, e),
            )),
            PhaseOutcome::Fatal(source) => {
                return Err(self.fail(Phase::Detach, ReplaceErrorKind::DetachFailed { node, source }));
            }
        }

        Ok(self.transition(Detached))
    }

    /// Terminate immediately, skipping every cluster-facing phase.
    ///
    /// Used in cloud-only mode, where there is no live cluster state to
    /// protect.
    #[must_use = "replacement state must be used"]
    pub async fn skip_to_terminate<C: CloudProvider + ?Sized>(
        self,
        cloud: &C,
    ) -> TransitionResult<Terminated> {
        tracing::warn!("Not draining cluster nodes as 'cloudonly' flag is set.");
        self.terminate_instance(cloud).await
    }
}

// =============================================================================
// Detached -> Drained
// =============================================================================

impl Replacement<Detached> {
    /// Evict workload from the node.
    ///
    /// # Errors
    ///
    /// Fatal only if the drain-failure policy is `Fail`. The node stays
    /// cordoned either way.
    #[must_use = "replacement state must be used"]
    pub async fn drain<K: ClusterApi + ?Sized>(mut self, cluster: &K) -> TransitionResult<Drained> {
        self.checkpoint(Phase::Drain)?;
        let node = self.node()?;

        tracing::info!("Draining the node: {:?}.", node.as_str());
        // Evictions may have happened even if the call fails.
        self.mutated = true;
        match self.request.drain_policy().judge(cluster.drain_node(&node).await) {
            PhaseOutcome::Completed => {}
            PhaseOutcome::Tolerated(e) => self.diagnostics.warn(Warning::drain_tolerated(
                format!("Ignoring error draining node {}: {}", node, e),
            )),
            PhaseOutcome::Fatal(source) => {
                return Err(self.fail(Phase::Drain, ReplaceErrorKind::DrainFailed { node, source }));
            }
        }

        Ok(self.transition(Drained))
    }
}

// =============================================================================
// Drained -> Settled
// =============================================================================

impl Replacement<Drained> {
    /// Wait the post-drain delay so in-flight work can settle.
    ///
    /// # Errors
    ///
    /// Returns `Cancelled` if interrupted during the wait.
    #[must_use = "replacement state must be used"]
    pub async fn settle(self, clock: &dyn Clock) -> TransitionResult<Settled> {
        self.checkpoint(Phase::PostDrainDelay)?;

        let delay = self.request.post_drain_delay();
        if !delay.is_zero() {
            tracing::info!(
                "Waiting for {} for pods to stabilize after draining.",
                humantime::format_duration(delay)
            );
        }
        if pause(clock, &self.cancel, delay).await.is_err() {
            return Err(self.fail(Phase::PostDrainDelay, ReplaceErrorKind::Cancelled));
        }

        Ok(self.transition(Settled))
    }
}

// =============================================================================
// Settled -> Validated
// =============================================================================

impl Replacement<Settled> {
    /// Poll the validator until the cluster is stably healthy.
    ///
    /// # Errors
    ///
    /// A timeout is fatal only if the validation policy is `Fail`.
    /// Cancellation is always fatal.
    #[must_use = "replacement state must be used"]
    pub async fn validate<V: ClusterValidator + ?Sized>(
        mut self,
        validator: &V,
        clock: &dyn Clock,
    ) -> TransitionResult<Validated> {
        self.checkpoint(Phase::Validate)?;

        let result = ValidationPoller::new(validator, clock, *self.request.validation())
            .for_group(self.target.instance.group.as_ref())
            .run(&self.cancel)
            .await
            .map(|_| ());

        let result = match result {
            Err(ValidationError::Cancelled) => {
                return Err(self.fail(Phase::Validate, ReplaceErrorKind::ValidationCancelled));
            }
            other => other,
        };

        match self.request.validation_policy().judge(result) {
            PhaseOutcome::Completed => {}
            PhaseOutcome::Tolerated(e) => self.diagnostics.warn(Warning::validation_tolerated(
                format!("Ignoring validation failure, terminating anyway: {}", e),
            )),
            PhaseOutcome::Fatal(ValidationError::TimedOut {
                timeout,
                last_failure,
            }) => {
                return Err(self.fail(
                    Phase::Validate,
                    ReplaceErrorKind::ValidationTimedOut {
                        timeout,
                        last_failure,
                    },
                ));
            }
            PhaseOutcome::Fatal(ValidationError::Cancelled) => {
                return Err(self.fail(Phase::Validate, ReplaceErrorKind::ValidationCancelled));
            }
        }

        Ok(self.transition(Validated))
    }
}

// =============================================================================
// Validated -> Terminated
// =============================================================================

impl Replacement<Validated> {
    /// Destroy the instance.
    ///
    /// # Errors
    ///
    /// Termination failures are always fatal.
    #[must_use = "replacement state must be used"]
    pub async fn terminate<C: CloudProvider + ?Sized>(
        self,
        cloud: &C,
    ) -> TransitionResult<Terminated> {
        self.terminate_instance(cloud).await
    }
}

// =============================================================================
// Terminated - Terminal State
// =============================================================================

impl Replacement<Terminated> {
    /// Consume the replacement and report what happened.
    pub fn finish(self) -> Replaced {
        Replaced {
            instance: self.target.instance.id.clone(),
            node: self.target.instance.node_name().cloned(),
            surged: self.surged,
            warnings: self.diagnostics.into_warnings(),
        }
    }
}
