//! API handlers for the identity broker.
//!
//! The auth module carries the broker core (login, company selection,
//! registration, gate); health and root are operational endpoints.

pub mod auth;
pub mod health;
pub mod root;
