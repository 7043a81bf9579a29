// ABOUTME: DNS-compatible instance group name validation.
// ABOUTME: Ensures group names are lowercase labels separated by dots.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GroupNameError {
    #[error("instance group name cannot be empty")]
    Empty,

    #[error("instance group name exceeds maximum length of 253 characters")]
    TooLong,

    #[error("instance group name cannot start with a hyphen")]
    StartsWithHyphen,

    #[error("instance group name cannot end with a hyphen")]
    EndsWithHyphen,

    #[error("instance group name must be lowercase")]
    NotLowercase,

    #[error("invalid character in instance group name: '{0}'")]
    InvalidChar(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct GroupName(String);

impl GroupName {
    pub fn new(value: &str) -> Result<Self, GroupNameError> {
        if value.is_empty() {
            return Err(GroupNameError::Empty);
        }

        if value.len() > 253 {
            return Err(GroupNameError::TooLong);
        }

        if value.starts_with('-') {
            return Err(GroupNameError::StartsWithHyphen);
        }

        if value.ends_with('-') {
            return Err(GroupNameError::EndsWithHyphen);
        }

        for c in value.chars() {
            if c.is_ascii_uppercase() {
                return Err(GroupNameError::NotLowercase);
            }
            if !c.is_ascii_lowercase() && !c.is_ascii_digit() && c != '-' && c != '.' {
                return Err(GroupNameError::InvalidChar(c));
            }
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for GroupName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        GroupName::new(&s).map_err(serde::de::Error::custom)
    }
}
