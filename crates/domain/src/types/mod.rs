//! Request/response DTOs for the Ajo REST API.

pub mod auth;
pub mod banking;
pub mod groups;
pub mod notifications;
pub mod payments;
