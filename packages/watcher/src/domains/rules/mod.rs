pub mod synchronizer;

pub use synchronizer::{RuleSynchronizer, SyncError};
