//! Broker auth flows: login, company selection, registration, and the
//! per-request gate.
//!
//! ## Session State Machine
//!
//! Login verifies an external assertion, resolves the subject's company
//! memberships, and mints one of three session shapes: resolved (one
//! company), pending (several companies, selection required), or superadmin
//! (configured platform identity, no membership row needed). Company
//! selection upgrades a pending session; registration creates a new subject
//! plus its first membership with best-effort compensation on partial
//! failure.
//!
//! Sessions are stateless signed tokens; nothing here keeps per-request
//! mutable state, so every flow is safe under horizontal scaling.

pub mod error;
pub mod login;
pub mod register;
pub mod select;
pub mod session;
pub mod state;
pub mod types;

pub use error::BrokerError;
pub use login::perform_login;
pub use register::perform_registration;
pub use select::perform_selection;
pub use state::{BrokerConfig, BrokerState};

#[cfg(test)]
pub(crate) mod test_support;

use tracing::{error, warn};

use crate::{
    membership::TenantMembership,
    roles::Role,
    token::{self, SessionClaims, unix_now},
};

/// Sign session claims with the broker's configured signer.
pub(crate) fn issue_token(
    state: &BrokerState,
    claims: &SessionClaims,
) -> Result<String, BrokerError> {
    state.signer().issue(claims, unix_now()).map_err(|err| {
        error!("Token issuance failed: {err}");
        match err {
            token::Error::MissingSecret | token::Error::InvalidTtl => BrokerError::Config,
            _ => BrokerError::Internal,
        }
    })
}

/// Build resolved claims from a membership row.
///
/// Role strings that do not normalize fall back to `viewer`; the membership
/// keeps working with the lowest privilege instead of locking the user out.
pub(crate) fn resolved_claims(
    subject_id: &str,
    email: &str,
    membership: &TenantMembership,
) -> SessionClaims {
    let role = Role::normalize(Some(membership.role.as_str())).unwrap_or_else(|| {
        warn!(
            "Membership {} carries unknown role {:?}, falling back to viewer",
            membership.id, membership.role
        );
        Role::Viewer
    });
    SessionClaims::Resolved {
        subject_id: subject_id.to_string(),
        email: email.to_string(),
        role,
        tenant_id: membership.tenant_id.clone(),
        office_id: membership.office_id.clone(),
        entity_id: membership.entity_id.clone(),
    }
}
