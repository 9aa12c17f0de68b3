//! Watching job boards: table extraction, snapshot diffing, persistence,
//! and the per-cycle orchestration service.

pub mod diff;
pub mod extractor;
pub mod fetch;
pub mod notify;
pub mod record;
pub mod service;
pub mod store;

pub use record::{Posting, PostingKey, Snapshot, SourceSnapshot};
pub use service::{CycleOutcome, PollService};
