//! Offline queue replay.

mod processor;

pub use processor::{QueueProcessor, ReplaySummary};
