//! Core library for the posting watch service: configuration, telemetry,
//! and the `watch` domain module that extracts postings from board
//! documents, diffs them against the persisted snapshot, and dispatches
//! notifications for new openings.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod watch;
