pub mod backoff;
pub mod supervisor;

pub use backoff::{Backoff, BackoffPolicy, MAX_JITTER};
pub use supervisor::{Disconnect, StreamSupervisor, SupervisorConfig};
