//! Domain types shared across Ajo crates.
//!
//! Pure data: request/response DTOs for the REST API and the normalized
//! error type that crosses the core/host boundary. No I/O, no runtime
//! dependencies.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod errors;
pub mod types;

pub use errors::{ApiError, ApiResult, CODE_NETWORK_ERROR, CODE_QUEUED};
pub use types::auth::{
    AuthResponse, LoginRequest, RefreshRequest, RefreshResponse, RegisterRequest, UserProfile,
};
pub use types::banking::{BankAccount, LinkAccountRequest};
pub use types::groups::{
    ContributionRequest, Group, GroupMember, GroupStatus, JoinGroupResponse, NewGroup,
};
pub use types::notifications::{Notification, NotificationKind};
pub use types::payments::{Payment, PaymentMethod, PaymentRequest, PaymentStatus};
