//! Domain logic: rule sync, matching and alerting, stream supervision.

pub mod alerts;
pub mod rules;
pub mod stream;
