// ABOUTME: Collaborators the replacement workflow drives.
// ABOUTME: Capability traits plus the shell-command and kubectl adapters used by the binary.

mod command_cloud;
pub mod error;
mod exec;
mod kubectl;
pub mod traits;

pub use command_cloud::CommandCloud;
pub use error::{ExecError, ExecErrorKind};
pub use exec::Exec;
pub use kubectl::Kubectl;
