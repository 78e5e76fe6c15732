//! Access-control gate: bearer token decoding and scope checks.
//!
//! Every protected request goes through [`bearer_claims`]; tenant-scoped
//! handlers then call [`require_tenant`]. A pending session is only ever
//! accepted by the company-selection endpoint: the gate rejects it for
//! everything tenant-scoped, and the registrar check rejects it outright.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::debug;

use super::{
    error::{BrokerError, ErrorBody},
    state::BrokerState,
    types::SessionResponse,
};
use crate::{
    roles::Role,
    token::{SessionClaims, unix_now},
};

pub(crate) fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Decode and verify the bearer token into session claims.
///
/// # Errors
///
/// `InvalidToken` when the header is missing or the token fails
/// verification; `ExpiredToken` past expiry; `Config` if the signer is
/// misconfigured.
pub fn bearer_claims(
    headers: &HeaderMap,
    state: &BrokerState,
) -> Result<SessionClaims, BrokerError> {
    let token = extract_bearer_token(headers).ok_or(BrokerError::InvalidToken)?;
    state
        .signer()
        .verify(&token, unix_now())
        .map_err(|err| {
            debug!("Token verification failed: {err}");
            BrokerError::from_token(&err)
        })
}

/// Enforce tenant ownership for a tenant-scoped operation.
///
/// Tenant-scoped route handlers call this with the tenant id from their path
/// parameters. Superadmin sessions bypass the check; resolved sessions must
/// match the tenant exactly; pending sessions are never accepted here.
///
/// # Errors
///
/// `Forbidden` when the session does not own the tenant.
pub fn require_tenant(claims: &SessionClaims, tenant_id: &str) -> Result<(), BrokerError> {
    match claims {
        SessionClaims::Superadmin { .. } => Ok(()),
        SessionClaims::Resolved {
            tenant_id: session_tenant,
            ..
        } if session_tenant == tenant_id => Ok(()),
        SessionClaims::Resolved { .. } | SessionClaims::Pending { .. } => {
            Err(BrokerError::Forbidden)
        }
    }
}

/// Caller context for the registration flow: effective role plus the
/// session tenant a non-superadmin caller is pinned to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RegistrarContext {
    pub(crate) role: Role,
    pub(crate) tenant_id: Option<String>,
}

/// Resolve the caller's registrar context from their session claims.
///
/// # Errors
///
/// `Forbidden` for pending sessions: an undecided identity has no role to
/// act with.
pub(crate) fn registrar_context(claims: &SessionClaims) -> Result<RegistrarContext, BrokerError> {
    match claims {
        SessionClaims::Superadmin { .. } => Ok(RegistrarContext {
            role: Role::Superadmin,
            tenant_id: None,
        }),
        SessionClaims::Resolved {
            role, tenant_id, ..
        } => Ok(RegistrarContext {
            role: *role,
            tenant_id: Some(tenant_id.clone()),
        }),
        SessionClaims::Pending { .. } => Err(BrokerError::Forbidden),
    }
}

#[utoipa::path(
    get,
    path = "/v1/auth/session",
    responses(
        (status = 200, description = "Decoded session claims", body = SessionResponse),
        (status = 401, description = "Missing, invalid, or expired token", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn session(
    headers: HeaderMap,
    state: Extension<Arc<BrokerState>>,
) -> impl IntoResponse {
    match bearer_claims(&headers, &state) {
        Ok(claims) => (StatusCode::OK, Json(SessionResponse::from(&claims))).into_response(),
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn resolved(tenant: &str) -> SessionClaims {
        SessionClaims::Resolved {
            subject_id: "u1".to_string(),
            email: "a@example.com".to_string(),
            role: Role::Agent,
            tenant_id: tenant.to_string(),
            office_id: None,
            entity_id: None,
        }
    }

    #[test]
    fn extract_bearer_token_handles_casing_and_blanks() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(extract_bearer_token(&headers), Some("abc".to_string()));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer xyz"));
        assert_eq!(extract_bearer_token(&headers), Some("xyz".to_string()));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_bearer_token(&headers), None);
    }

    #[test]
    fn require_tenant_matches_exactly() {
        assert!(require_tenant(&resolved("T1"), "T1").is_ok());
        assert!(matches!(
            require_tenant(&resolved("T1"), "T2"),
            Err(BrokerError::Forbidden)
        ));
    }

    #[test]
    fn require_tenant_superadmin_bypasses() {
        let claims = SessionClaims::Superadmin {
            subject_id: "root".to_string(),
            email: "root@example.com".to_string(),
        };
        assert!(require_tenant(&claims, "T1").is_ok());
        assert!(require_tenant(&claims, "T2").is_ok());
    }

    #[test]
    fn require_tenant_rejects_pending() {
        let claims = SessionClaims::Pending {
            subject_id: "u1".to_string(),
            email: "a@example.com".to_string(),
        };
        assert!(matches!(
            require_tenant(&claims, "T1"),
            Err(BrokerError::Forbidden)
        ));
    }

    #[test]
    fn registrar_context_rejects_pending() {
        let claims = SessionClaims::Pending {
            subject_id: "u1".to_string(),
            email: "a@example.com".to_string(),
        };
        assert!(matches!(
            registrar_context(&claims),
            Err(BrokerError::Forbidden)
        ));

        let context = registrar_context(&resolved("T1"));
        assert_eq!(
            context.ok(),
            Some(RegistrarContext {
                role: Role::Agent,
                tenant_id: Some("T1".to_string()),
            })
        );
    }
}
