//! Closed role vocabulary and normalization for membership role strings.
//!
//! Membership rows store roles as free text; everything that makes an
//! authorization decision goes through [`Role::normalize`] first. Unknown
//! strings normalize to `None` so the caller owns the fallback policy.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Platform roles, serialized lowercase on the wire and in token claims.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Superadmin,
    Admin,
    Supervisor,
    Agent,
    Viewer,
}

/// Roles allowed to register new users.
pub const REGISTRAR_ROLES: [Role; 3] = [Role::Superadmin, Role::Admin, Role::Supervisor];

/// Roles a registration may assign. Superadmin is deliberately absent: no
/// caller can mint a new superadmin through the registration path.
pub const ASSIGNABLE_ROLES: [Role; 4] = [Role::Admin, Role::Supervisor, Role::Agent, Role::Viewer];

impl Role {
    /// Normalize a free-text role string against the closed vocabulary.
    ///
    /// Returns `None` for absent, empty, or unknown input. Never panics and
    /// never coerces to a default; callers decide the fallback.
    #[must_use]
    pub fn normalize(raw: Option<&str>) -> Option<Self> {
        let trimmed = raw?.trim();
        if trimmed.is_empty() {
            return None;
        }
        match trimmed.to_lowercase().as_str() {
            "superadmin" => Some(Self::Superadmin),
            "admin" => Some(Self::Admin),
            "supervisor" => Some(Self::Supervisor),
            "agent" => Some(Self::Agent),
            "viewer" => Some(Self::Viewer),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Superadmin => "superadmin",
            Self::Admin => "admin",
            Self::Supervisor => "supervisor",
            Self::Agent => "agent",
            Self::Viewer => "viewer",
        }
    }

    /// `true` when this role may register new users.
    #[must_use]
    pub fn can_register(self) -> bool {
        REGISTRAR_ROLES.contains(&self)
    }

    /// `true` when a registration may assign this role.
    #[must_use]
    pub fn is_assignable(self) -> bool {
        ASSIGNABLE_ROLES.contains(&self)
    }
}
