// ABOUTME: Defaults for replacement requests from the config file.
// ABOUTME: Surge, failure policies, post-drain delay and validation timings.

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReplacementConfig {
    #[serde(default = "default_true")]
    pub surge: bool,

    #[serde(default = "default_true")]
    pub fail_on_drain_error: bool,

    #[serde(default = "default_true")]
    pub fail_on_validate_error: bool,

    #[serde(default = "default_post_drain_delay", with = "humantime_serde")]
    pub post_drain_delay: Duration,

    #[serde(default = "default_validation_timeout", with = "humantime_serde")]
    pub validation_timeout: Duration,

    #[serde(default = "default_validate_count")]
    pub validate_count: u32,

    /// Wait between validation attempts after a failure.
    #[serde(default = "default_validate_interval", with = "humantime_serde")]
    pub validate_interval: Duration,

    /// Wait between validation attempts after a success.
    #[serde(default = "default_validate_success", with = "humantime_serde")]
    pub validate_success: Duration,
}

fn default_true() -> bool {
    true
}

fn default_post_drain_delay() -> Duration {
    Duration::from_secs(5)
}

fn default_validation_timeout() -> Duration {
    Duration::from_secs(15 * 60)
}

fn default_validate_count() -> u32 {
    2
}

fn default_validate_interval() -> Duration {
    Duration::from_secs(30)
}

fn default_validate_success() -> Duration {
    Duration::from_secs(10)
}

impl Default for ReplacementConfig {
    fn default() -> Self {
        ReplacementConfig {
            surge: default_true(),
            fail_on_drain_error: default_true(),
            fail_on_validate_error: default_true(),
            post_drain_delay: default_post_drain_delay(),
            validation_timeout: default_validation_timeout(),
            validate_count: default_validate_count(),
            validate_interval: default_validate_interval(),
            validate_success: default_validate_success(),
        }
    }
}
