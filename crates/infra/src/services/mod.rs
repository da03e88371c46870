//! Typed domain services.
//!
//! Thin wrappers that pair endpoints with their `ajo-domain` DTOs.
//! Screens talk to these; every resilience concern (cache, queue,
//! refresh) lives in the underlying [`ApiClient`](crate::api::ApiClient).

mod auth;
mod banking;
mod groups;
mod notifications;
mod payments;

pub use auth::AuthService;
pub use banking::BankingService;
pub use groups::GroupsService;
pub use notifications::NotificationsService;
pub use payments::PaymentsService;
