// Listing watcher - core library
//
// Follows a set of accounts on the filtered stream and texts an alert when a
// post contains one of the trigger phrases.
//
// Startup syncs the stream rules, then the stream supervisor runs until shutdown.

pub mod app;
pub mod config;
pub mod domains;
pub mod kernel;

pub use config::*;
