//! Project-rooted file access for generated artifacts.
//!
//! Every write quarry performs goes through [`FileManager`]: writes are
//! all-or-nothing per file (temp file + rename), skipped entirely when the
//! on-disk content is already identical, and recorded in a bounded journal so
//! callers can verify that a regeneration pass touched nothing.

#![warn(missing_docs)]

mod error;
mod manager;

pub use error::FileError;
pub use manager::{FileChange, FileEvent, FileManager, JOURNAL_LIMIT};
