// ABOUTME: Command module aggregator for the nodeswap CLI.
// ABOUTME: Re-exports the delete-instance command handler.

mod delete_instance;

pub use delete_instance::delete_instance;
