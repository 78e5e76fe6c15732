//! Company selection: upgrade a pending session to a resolved one.

use axum::{Json, extract::Extension, http::HeaderMap, http::StatusCode, response::IntoResponse};
use std::sync::Arc;
use tracing::{error, instrument};

use super::{
    error::{BrokerError, ErrorBody},
    issue_token, resolved_claims,
    session::bearer_claims,
    state::BrokerState,
    types::{SelectCompanyRequest, SelectCompanyResponse},
};
use crate::token::SessionClaims;

/// Commit a pending session to one company.
///
/// Membership is re-validated server-side against the store, not against the
/// candidate list the client was shown; the list is advisory and can be
/// tampered with. The old pending token is not revoked (sessions are
/// stateless) but is never accepted for tenant-scoped work.
///
/// # Errors
///
/// `CompanyAlreadySelected` when the session is not pending,
/// `InvalidCompanySelection` when the subject is not an active member of the
/// chosen company, `Internal` for store failures.
pub async fn perform_selection(
    state: &BrokerState,
    claims: &SessionClaims,
    tenant_id: &str,
) -> Result<SelectCompanyResponse, BrokerError> {
    let SessionClaims::Pending { subject_id, email } = claims else {
        return Err(BrokerError::CompanyAlreadySelected);
    };

    let membership = state
        .memberships()
        .membership_for(subject_id, tenant_id)
        .await
        .map_err(|err| {
            error!("Membership lookup failed: {err}");
            BrokerError::Internal
        })?
        .ok_or(BrokerError::InvalidCompanySelection)?;

    let claims = resolved_claims(subject_id, email, &membership);
    let token = issue_token(state, &claims)?;
    Ok(SelectCompanyResponse { token })
}

#[utoipa::path(
    post,
    path = "/v1/auth/select-company",
    request_body = SelectCompanyRequest,
    responses(
        (status = 200, description = "Company selected", body = SelectCompanyResponse),
        (status = 400, description = "Session already resolved", body = ErrorBody),
        (status = 401, description = "Missing, invalid, or expired token", body = ErrorBody),
        (status = 403, description = "Not a member of the chosen company", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn select_company(
    headers: HeaderMap,
    state: Extension<Arc<BrokerState>>,
    payload: Option<Json<SelectCompanyRequest>>,
) -> impl IntoResponse {
    let claims = match bearer_claims(&headers, &state) {
        Ok(claims) => claims,
        Err(err) => return err.into_response(),
    };

    let Some(Json(request)) = payload else {
        return BrokerError::MissingField("tenantId").into_response();
    };

    match perform_selection(&state, &claims, &request.tenant_id).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => err.into_response(),
    }
}
