// ABOUTME: Replacement state marker types for the type state pattern.
// ABOUTME: Zero-sized types enforce the phase order at compile time.

/// Initial state: the safety gate passed, nothing has been mutated yet.
/// Available actions: `surge()`, `detach()`, `skip_to_terminate()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Pending;

/// Detached: the node is cordoned, no new workload will land on it.
/// Available actions: `drain()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Detached;

/// Drained: workload evicted (or the failure tolerated).
/// Available actions: `settle()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Drained;

/// Settled: the post-drain delay has elapsed.
/// Available actions: `validate()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Settled;

/// Validated: the cluster passed validation (or the failure was tolerated).
/// Available actions: `terminate()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Validated;

/// Terminated: the instance has been destroyed.
/// Available actions: `finish()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Terminated;
