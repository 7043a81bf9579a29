// ABOUTME: Immutable configuration bundle for one replacement invocation.
// ABOUTME: Built from config-file defaults and CLI flags, plus the per-phase failure policy.

use std::time::Duration;

use crate::config::ReplacementConfig;

use super::validation::ValidationSettings;

/// What a failure in a policy-governed phase means for the workflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort the replacement.
    #[default]
    Fail,
    /// Record the failure and continue with the next phase.
    Tolerate,
}

impl FailurePolicy {
    /// Map a `--fail-on-*` flag to a policy.
    pub fn from_fail_flag(fail: bool) -> Self {
        if fail {
            FailurePolicy::Fail
        } else {
            FailurePolicy::Tolerate
        }
    }

    /// Judge the result of a phase under this policy.
    pub fn judge<E>(self, result: Result<(), E>) -> PhaseOutcome<E> {
        match (result, self) {
            (Ok(()), _) => PhaseOutcome::Completed,
            (Err(e), FailurePolicy::Fail) => PhaseOutcome::Fatal(e),
            (Err(e), FailurePolicy::Tolerate) => PhaseOutcome::Tolerated(e),
        }
    }
}

/// Result of a single phase, threaded to the next transition.
#[derive(Debug, PartialEq, Eq)]
pub enum PhaseOutcome<E> {
    Completed,
    /// The phase failed but policy allows continuing.
    Tolerated(E),
    /// The phase failed and the workflow must stop.
    Fatal(E),
}

/// Everything one invocation needs to know. Immutable once built.
#[derive(Debug, Clone)]
pub struct ReplacementRequest {
    identifier: String,
    cloud_only: bool,
    surge: bool,
    drain_policy: FailurePolicy,
    validation_policy: FailurePolicy,
    post_drain_delay: Duration,
    validation: ValidationSettings,
    confirmed: bool,
}

impl ReplacementRequest {
    /// Start building a request for an instance ID or node name.
    pub fn builder(identifier: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(identifier.into())
    }

    /// Instance ID or node name as given by the operator.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn cloud_only(&self) -> bool {
        self.cloud_only
    }

    pub fn surge(&self) -> bool {
        self.surge
    }

    pub fn drain_policy(&self) -> FailurePolicy {
        self.drain_policy
    }

    pub fn validation_policy(&self) -> FailurePolicy {
        self.validation_policy
    }

    pub fn post_drain_delay(&self) -> Duration {
        self.post_drain_delay
    }

    pub fn validation(&self) -> &ValidationSettings {
        &self.validation
    }

    /// Whether the operator passed `--yes`.
    pub fn confirmed(&self) -> bool {
        self.confirmed
    }
}

/// Builder for [`ReplacementRequest`], starting from built-in defaults.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    request: ReplacementRequest,
}

impl RequestBuilder {
    fn new(identifier: String) -> Self {
        let defaults = ReplacementConfig::default();
        Self {
            request: ReplacementRequest {
                identifier,
                cloud_only: false,
                surge: defaults.surge,
                drain_policy: FailurePolicy::from_fail_flag(defaults.fail_on_drain_error),
                validation_policy: FailurePolicy::from_fail_flag(defaults.fail_on_validate_error),
                post_drain_delay: defaults.post_drain_delay,
                validation: ValidationSettings::from(&defaults),
                confirmed: false,
            },
        }
    }

    /// Apply defaults from the `replacement` section of the config file.
    pub fn defaults(mut self, config: &ReplacementConfig) -> Self {
        let r = &mut self.request;
        r.surge = config.surge;
        r.drain_policy = FailurePolicy::from_fail_flag(config.fail_on_drain_error);
        r.validation_policy = FailurePolicy::from_fail_flag(config.fail_on_validate_error);
        r.post_drain_delay = config.post_drain_delay;
        r.validation = ValidationSettings::from(config);
        self
    }

    pub fn cloud_only(mut self, cloud_only: bool) -> Self {
        self.request.cloud_only = cloud_only;
        self
    }

    pub fn surge(mut self, surge: bool) -> Self {
        self.request.surge = surge;
        self
    }

    pub fn confirmed(mut self, confirmed: bool) -> Self {
        self.request.confirmed = confirmed;
        self
    }

    pub fn drain_policy(mut self, policy: FailurePolicy) -> Self {
        self.request.drain_policy = policy;
        self
    }

    pub fn validation_policy(mut self, policy: FailurePolicy) -> Self {
        self.request.validation_policy = policy;
        self
    }

    pub fn post_drain_delay(mut self, delay: Duration) -> Self {
        self.request.post_drain_delay = delay;
        self
    }

    pub fn validation_timeout(mut self, timeout: Duration) -> Self {
        self.request.validation.timeout = timeout;
        self
    }

    pub fn validate_count(mut self, count: u32) -> Self {
        self.request.validation.count = count;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.request.validation.poll_interval = interval;
        self
    }

    /// How long a healthy streak must last before validation passes.
    pub fn sustained_health(mut self, duration: Duration) -> Self {
        self.request.validation.success_interval = duration;
        self
    }

    pub fn build(self) -> ReplacementRequest {
        self.request
    }
}
