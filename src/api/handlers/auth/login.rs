//! Login flow: external assertion in, session token out.

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use std::sync::Arc;
use tracing::{debug, error, instrument};

use super::{
    error::{BrokerError, ErrorBody},
    issue_token, resolved_claims,
    state::BrokerState,
    types::{LoginRequest, LoginResponse, MembershipSummary},
};
use crate::{
    membership::{MembershipResolution, resolve_memberships},
    token::SessionClaims,
};

/// Run the login state machine for one external assertion.
///
/// 1. Verify the assertion with the identity provider.
/// 2. Short-circuit the configured superadmin pair (no membership needed).
/// 3. Classify the subject's active memberships: none is a 403, one resolves
///    directly, several yield a pending session for company selection.
///
/// # Errors
///
/// `InvalidExternalCredential` for a rejected assertion,
/// `NoTenantsAssigned` when the subject has no active membership, `Internal`
/// for store failures, `Config`/`Internal` for signing failures.
pub async fn perform_login(
    state: &BrokerState,
    assertion: &str,
) -> Result<LoginResponse, BrokerError> {
    let identity = state
        .verifier()
        .verify_assertion(assertion)
        .await
        .map_err(|err| {
            debug!("Assertion verification failed: {err}");
            BrokerError::InvalidExternalCredential
        })?;

    if state
        .config()
        .is_superadmin(&identity.email, &identity.subject_id)
    {
        // The superadmin identity is not required to have any membership row.
        let claims = SessionClaims::Superadmin {
            subject_id: identity.subject_id,
            email: identity.email,
        };
        let token = issue_token(state, &claims)?;
        return Ok(LoginResponse {
            token,
            companies: vec![],
            needs_selection: false,
            is_super_admin: true,
        });
    }

    let resolution = resolve_memberships(state.memberships(), &identity.subject_id)
        .await
        .map_err(|err| {
            error!("Membership lookup failed: {err}");
            BrokerError::Internal
        })?;

    match resolution {
        MembershipResolution::None => Err(BrokerError::NoTenantsAssigned),
        MembershipResolution::Single(membership) => {
            let claims = resolved_claims(&identity.subject_id, &identity.email, &membership);
            let token = issue_token(state, &claims)?;
            Ok(LoginResponse {
                token,
                companies: vec![MembershipSummary::from(&membership)],
                needs_selection: false,
                is_super_admin: false,
            })
        }
        MembershipResolution::Multiple(memberships) => {
            let claims = SessionClaims::Pending {
                subject_id: identity.subject_id,
                email: identity.email,
            };
            let token = issue_token(state, &claims)?;
            Ok(LoginResponse {
                token,
                companies: memberships.iter().map(MembershipSummary::from).collect(),
                needs_selection: true,
                is_super_admin: false,
            })
        }
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid external credential", body = ErrorBody),
        (status = 403, description = "No companies assigned", body = ErrorBody),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn login(
    state: Extension<Arc<BrokerState>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return BrokerError::MissingField("externalAssertion").into_response();
    };

    match perform_login(&state, &request.external_assertion).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => err.into_response(),
    }
}
