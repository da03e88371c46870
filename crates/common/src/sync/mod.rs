//! Durable offline queue for mutating requests.
//!
//! Mutations attempted while the device is offline are appended here and
//! replayed in enqueue order once connectivity returns. The queue owns
//! only the bookkeeping: persistence, FIFO order, retry counters, and the
//! drop ceiling. Actually re-issuing the requests is the replay
//! processor's job (`ajo-infra::sync`), which keeps this module free of
//! any network dependency.

mod queue;
mod types;

pub use queue::{OfflineQueue, QueueError, QueueResult};
pub use types::{
    ActionKind, FailureOutcome, QueueConfig, QueueEvent, QueueStatus, QueuedAction,
};
