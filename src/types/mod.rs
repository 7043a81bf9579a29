// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Uses phantom types so instance IDs and node names never get mixed up.

mod group_name;
mod id;

pub use group_name::{GroupName, GroupNameError};
pub use id::{InstanceId, NodeName};
