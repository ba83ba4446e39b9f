//! Handlers for the four job kinds.

pub mod detect_spam;
pub mod expire;
pub mod parse_geo;
pub mod remove_pending;

pub use detect_spam::{DETECT_SPAM_BATCH_SIZE, DetectSpamHandler};
pub use expire::ExpireHandler;
pub use parse_geo::ParseGeoHandler;
pub use remove_pending::RemovePendingHandler;
