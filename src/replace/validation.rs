// ABOUTME: Polls the cluster validator until health is sustained or a timeout elapses.
// ABOUTME: A single unhealthy report resets the streak; cancellation is distinct from timeout.

use std::time::{Duration, Instant};

use crate::clock::{CancelToken, Clock, pause};
use crate::config::ReplacementConfig;
use crate::provider::traits::{ClusterValidator, ValidationReport};
use crate::types::GroupName;

/// Timing and acceptance parameters for the validation poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationSettings {
    /// Give up once this much time has passed without success.
    pub timeout: Duration,
    /// Consecutive healthy reports required. Zero skips validation.
    pub count: u32,
    /// Wait after an unhealthy report.
    pub poll_interval: Duration,
    /// Wait between healthy reports; also the minimum length of a healthy streak.
    pub success_interval: Duration,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self::from(&ReplacementConfig::default())
    }
}

impl From<&ReplacementConfig> for ValidationSettings {
    fn from(config: &ReplacementConfig) -> Self {
        Self {
            timeout: config.validation_timeout,
            count: config.validate_count,
            poll_interval: config.validate_interval,
            success_interval: config.validate_success,
        }
    }
}

/// Why the poller gave up.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("cluster did not validate within {}: {last_failure}", human(.timeout))]
    TimedOut {
        timeout: Duration,
        last_failure: String,
    },

    #[error("cluster validation was cancelled")]
    Cancelled,
}

fn human(d: &Duration) -> humantime::FormattedDuration {
    humantime::format_duration(*d)
}

/// How a successful validation went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationSummary {
    /// Validator queries issued.
    pub attempts: u32,
    /// Time from the first query to acceptance.
    pub elapsed: Duration,
    /// Validation was skipped because the required count was zero.
    pub skipped: bool,
}

/// Consecutive healthy reports and when the run started.
#[derive(Debug, Default)]
struct Streak {
    count: u32,
    started: Option<Instant>,
}

impl Streak {
    fn record_pass(&mut self, now: Instant) {
        self.count += 1;
        self.started.get_or_insert(now);
    }

    fn reset(&mut self) {
        self.count = 0;
        self.started = None;
    }

    fn duration(&self, now: Instant) -> Duration {
        self.started
            .map(|s| now.saturating_duration_since(s))
            .unwrap_or_default()
    }
}

/// Repeatedly queries a [`ClusterValidator`] until the cluster is stable.
pub struct ValidationPoller<'a, V: ?Sized> {
    validator: &'a V,
    clock: &'a dyn Clock,
    settings: ValidationSettings,
    group: Option<&'a GroupName>,
}

impl<'a, V: ClusterValidator + ?Sized> ValidationPoller<'a, V> {
    pub fn new(validator: &'a V, clock: &'a dyn Clock, settings: ValidationSettings) -> Self {
        Self {
            validator,
            clock,
            settings,
            group: None,
        }
    }

    /// Only failures relevant to this instance group block validation.
    pub fn for_group(mut self, group: Option<&'a GroupName>) -> Self {
        self.group = group;
        self
    }

    /// Poll until `count` consecutive healthy reports span at least
    /// `success_interval`, or until `timeout` elapses.
    ///
    /// The validator is always queried at least once, even with a zero
    /// timeout.
    pub async fn run(&self, cancel: &CancelToken) -> Result<ValidationSummary, ValidationError> {
        let settings = self.settings;
        let start = self.clock.now();

        if settings.count == 0 {
            tracing::warn!("skipping cluster validation because validate-count was 0");
            return Ok(ValidationSummary {
                attempts: 0,
                elapsed: Duration::ZERO,
                skipped: true,
            });
        }

        // Timeouts too large to represent mean no deadline at all.
        let deadline = start.checked_add(settings.timeout);
        let mut streak = Streak::default();
        let mut attempts = 0;
        let mut last_failure = String::new();

        loop {
            if cancel.is_cancelled() {
                return Err(ValidationError::Cancelled);
            }

            attempts += 1;
            let result = self.validator.validate().await;
            let now = self.clock.now();

            let wait = match result {
                Ok(report) if self.problems(&report).is_none() => {
                    streak.record_pass(now);
                    let sustained = streak.duration(now);

                    if streak.count >= settings.count && sustained >= settings.success_interval {
                        tracing::info!(attempts, "Cluster validated.");
                        return Ok(ValidationSummary {
                            attempts,
                            elapsed: now.saturating_duration_since(start),
                            skipped: false,
                        });
                    }

                    let wait = if streak.count >= settings.count {
                        settings.success_interval - sustained
                    } else {
                        settings.success_interval
                    };
                    tracing::info!(
                        "Cluster validated; revalidating in {} to make sure it does not flap.",
                        humantime::format_duration(wait)
                    );
                    wait
                }
                Ok(report) => {
                    streak.reset();
                    last_failure = self.problems(&report).unwrap_or_default();
                    tracing::info!(
                        "Cluster did not pass validation, will retry in {}: {}",
                        humantime::format_duration(settings.poll_interval),
                        last_failure
                    );
                    settings.poll_interval
                }
                Err(e) => {
                    streak.reset();
                    last_failure = e.to_string();
                    tracing::info!(
                        "Cluster did not validate, will retry in {}: {}",
                        humantime::format_duration(settings.poll_interval),
                        last_failure
                    );
                    settings.poll_interval
                }
            };

            let now = self.clock.now();
            if deadline.is_some_and(|d| now >= d) {
                if streak.count > 0 {
                    last_failure = format!(
                        "cluster was healthy for only {} consecutive validation(s)",
                        streak.count
                    );
                }
                return Err(ValidationError::TimedOut {
                    timeout: settings.timeout,
                    last_failure,
                });
            }

            let wait = match deadline {
                Some(d) => wait.min(d - now),
                None => wait,
            };
            tracing::debug!(attempts, ?wait, streak = streak.count, "waiting before next validation");
            pause(self.clock, cancel, wait)
                .await
                .map_err(|_| ValidationError::Cancelled)?;
        }
    }

    /// Describe the failures blocking this group, or `None` if there are none.
    fn problems(&self, report: &ValidationReport) -> Option<String> {
        let messages: Vec<String> = report
            .failures_for(self.group)
            .map(|f| format!("{} {}: {}", f.kind, f.name, f.message))
            .collect();
        if messages.is_empty() {
            None
        } else {
            Some(messages.join("; "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streak_tracks_first_pass() {
        let origin = Instant::now();
        let mut streak = Streak::default();
        streak.record_pass(origin);
        streak.record_pass(origin + Duration::from_secs(10));
        assert_eq!(streak.count, 2);
        assert_eq!(
            streak.duration(origin + Duration::from_secs(10)),
            Duration::from_secs(10)
        );

        streak.reset();
        assert_eq!(streak.count, 0);
        assert_eq!(streak.duration(origin), Duration::ZERO);
    }

    #[test]
    fn default_settings_match_config_defaults() {
        let settings = ValidationSettings::default();
        assert_eq!(settings.count, 2);
        assert_eq!(settings.poll_interval, Duration::from_secs(30));
        assert_eq!(settings.success_interval, Duration::from_secs(10));
        assert_eq!(settings.timeout, Duration::from_secs(15 * 60));
    }
}
