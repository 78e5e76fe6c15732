//! # Courtier (Multi-tenant Identity Broker)
//!
//! `courtier` converts an externally-issued identity assertion into an
//! internal, role- and tenant-scoped session token, and enforces that every
//! subsequent request carries the correct tenant and role context.
//!
//! ## Tenant Model (Companies, Offices, Entities)
//!
//! Companies (tenants) are the primary isolation boundary of the brokerage
//! platform. A subject may hold memberships in several companies; each
//! membership binds one role and, optionally, an office and a business entity.
//!
//! - **Single membership:** login resolves directly to a fully scoped session.
//! - **Multiple memberships:** login yields a pending session that only
//!   authorizes the company-selection step.
//! - **Superadmin:** a platform-level identity configured out of band, exempt
//!   from tenant scoping and never stored as a membership row.
//!
//! ## Session Tokens
//!
//! Sessions are stateless, signed tokens (HMAC-SHA256). Claims are immutable
//! once issued; the only way to change scope is to issue a new token through
//! the login or company-selection flows.
//!
//! ## Authorization
//!
//! Roles form a closed set (`superadmin`, `admin`, `supervisor`, `agent`,
//! `viewer`). Registration is restricted to elevated roles and can never mint
//! a superadmin. Unknown role strings in membership rows fall back to
//! `viewer` at login time rather than failing the flow.

pub mod api;
pub mod cli;
pub mod directory;
pub mod entities;
pub mod membership;
pub mod roles;
pub mod token;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
