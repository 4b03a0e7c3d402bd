pub mod dispatcher;
pub mod matcher;

pub use dispatcher::{AlertDispatcher, DeliveryId};
pub use matcher::{first_match, matches};

/// Phrases that announce a new listing.
pub const DEFAULT_TRIGGER_PHRASES: &[&str] = &[
    "testcode",
    "launching on",
    "in the next 15 minutes",
    "You may need to refresh your app",
    "is now live at",
    "buy, sell, convert, send, receive, or store",
];
