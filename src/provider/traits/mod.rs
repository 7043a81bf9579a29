// ABOUTME: Narrow capability traits for the collaborators the replacement workflow drives.
// ABOUTME: Defines CloudProvider, ClusterApi and ClusterValidator.

mod cloud;
mod cluster;
mod validator;

pub use cloud::{CloudError, CloudProvider};
pub use cluster::{ClusterApi, ClusterApiError};
pub use validator::{ClusterValidator, ValidationFailure, ValidationReport, ValidatorError};
