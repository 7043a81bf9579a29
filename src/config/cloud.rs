// ABOUTME: Cloud command configuration.
// ABOUTME: Shell commands used to list, detach and terminate instances, plus their environment.

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct CloudConfig {
    /// Prints the instance groups as JSON on stdout.
    pub list: String,

    /// Detaches `$NODESWAP_INSTANCE_ID` from its scaling group.
    pub detach: String,

    /// Terminates `$NODESWAP_INSTANCE_ID`.
    pub terminate: String,

    /// Extra environment for every cloud command.
    #[serde(default)]
    pub env: BTreeMap<String, EnvSource>,
}

/// Where a cloud command environment variable gets its value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EnvSource {
    Value(String),
    /// Copied from the invoking environment, e.g. `{ env: AWS_PROFILE }`.
    Inherit {
        env: String,
        #[serde(default)]
        default: Option<String>,
    },
}

impl EnvSource {
    pub fn resolve(&self) -> Result<String> {
        match self {
            EnvSource::Value(v) => Ok(v.clone()),
            EnvSource::Inherit { env, default } => std::env::var(env)
                .ok()
                .or_else(|| default.clone())
                .ok_or_else(|| Error::MissingEnvVar(env.clone())),
        }
    }
}

impl CloudConfig {
    /// Resolve every configured variable, failing on the first missing one.
    pub fn resolved_env(&self) -> Result<Vec<(String, String)>> {
        self.env
            .iter()
            .map(|(name, source)| Ok((name.clone(), source.resolve()?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cloud(yaml: &str) -> CloudConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn literal_and_inherited_values() {
        let config = cloud(
            r#"
list: list
detach: detach
terminate: terminate
env:
  REGION: eu-west-1
  PROFILE:
    env: NODESWAP_TEST_SURELY_UNSET_PROFILE
    default: ops
"#,
        );
        let env = config.resolved_env().unwrap();
        assert_eq!(
            env,
            vec![
                ("PROFILE".to_string(), "ops".to_string()),
                ("REGION".to_string(), "eu-west-1".to_string()),
            ]
        );
    }

    #[test]
    fn inherited_value_comes_from_the_environment() {
        let source = EnvSource::Inherit {
            env: "NODESWAP_TEST_AWS_PROFILE".to_string(),
            default: Some("fallback".to_string()),
        };
        temp_env::with_var("NODESWAP_TEST_AWS_PROFILE", Some("prod"), || {
            assert_eq!(source.resolve().unwrap(), "prod");
        });
        temp_env::with_var_unset("NODESWAP_TEST_AWS_PROFILE", || {
            assert_eq!(source.resolve().unwrap(), "fallback");
        });
    }

    #[test]
    fn missing_inherited_value_is_an_error() {
        let config = cloud(
            r#"
list: list
detach: detach
terminate: terminate
env:
  TOKEN:
    env: NODESWAP_TEST_SURELY_UNSET_TOKEN
"#,
        );
        let err = config.resolved_env().unwrap_err();
        assert!(matches!(err, Error::MissingEnvVar(v) if v == "NODESWAP_TEST_SURELY_UNSET_TOKEN"));
    }
}
