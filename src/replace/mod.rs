// ABOUTME: Single-instance replacement workflow using the type state pattern.
// ABOUTME: Exports the request, safety gate, state machine, validation poller and driver.

mod error;
mod gate;
mod machine;
mod request;
mod run;
mod state;
mod validation;

pub use error::{Phase, ReplaceError, ReplaceErrorKind};
pub use gate::{Approved, GateDecision, check_gate};
pub use machine::{Replacement, TransitionResult};
pub use request::{FailurePolicy, PhaseOutcome, ReplacementRequest, RequestBuilder};
pub use run::{
    ClusterSide, Collaborators, Replaced, ReplacementOutcome, approve, execute,
    replace_instance,
};
pub use state::{Detached, Drained, Pending, Settled, Terminated, Validated};
pub use validation::{ValidationError, ValidationPoller, ValidationSettings, ValidationSummary};
