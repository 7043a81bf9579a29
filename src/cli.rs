// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands, their arguments and the global output flags.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "nodeswap")]
#[command(about = "Safely replace a single instance of a managed Kubernetes cluster")]
#[command(version)]
pub struct Cli {
    /// Path to the config file (default: nodeswap.yml in the current directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print results, warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print JSON lines instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new nodeswap.yml configuration file
    Init {
        /// Cluster name to put in the config
        #[arg(long)]
        cluster: Option<String>,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Delete an instance, draining it first unless --cloudonly is given
    DeleteInstance(DeleteInstanceArgs),
}

#[derive(Args, Debug)]
pub struct DeleteInstanceArgs {
    /// Cloud instance ID or cluster node name
    pub instance: String,

    /// Delete the instance without consulting the Kubernetes API
    #[arg(long)]
    pub cloudonly: bool,

    /// Detach the instance from its group first so a replacement starts immediately
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub surge: Option<bool>,

    /// Actually delete the instance
    #[arg(short, long)]
    pub yes: bool,

    /// Abort if the node cannot be drained
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub fail_on_drain_error: Option<bool>,

    /// Abort if the cluster does not validate after draining
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub fail_on_validate_error: Option<bool>,

    /// Time to wait after draining, e.g. 5s
    #[arg(long, value_parser = humantime::parse_duration)]
    pub post_drain_delay: Option<Duration>,

    /// Maximum time to wait for the cluster to validate, e.g. 15m
    #[arg(long, value_parser = humantime::parse_duration)]
    pub validation_timeout: Option<Duration>,

    /// Consecutive successful validations required (0 skips validation)
    #[arg(long)]
    pub validate_count: Option<u32>,
}
