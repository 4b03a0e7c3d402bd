//! Kernel module - infrastructure traits, production adapters, and test doubles.

pub mod deps;
pub mod test_dependencies;
pub mod traits;

pub use deps::{TwilioAdapter, TwitterAdapter, WatcherDeps};
pub use test_dependencies::{
    MockRulesApi, MockSmsService, MockStreamConnector, RulesCall, ScriptedConnection, SmsCall,
    TestDependencies,
};
pub use traits::*;
