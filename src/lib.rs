// ABOUTME: Library root for nodeswap - exposes the replacement workflow and its collaborators.
// ABOUTME: The main binary is in main.rs.

pub mod clock;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod inventory;
pub mod output;
pub mod provider;
pub mod replace;
pub mod types;
