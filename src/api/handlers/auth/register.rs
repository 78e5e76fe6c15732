//! Registration flow: create an external identity plus its first membership.
//!
//! The two writes span two systems, so the flow is a small saga: if the
//! membership insert fails after the identity was created, the identity is
//! deleted best-effort. A failed cleanup is logged and swallowed; surfacing
//! it would mask the original failure.

use axum::{Json, extract::Extension, http::HeaderMap, http::StatusCode, response::IntoResponse};
use std::sync::Arc;
use tracing::{error, instrument, warn};

use super::{
    error::{BrokerError, ErrorBody},
    session::{bearer_claims, registrar_context},
    state::BrokerState,
    types::{RegisterRequest, RegisterResponse},
};
use crate::{membership::NewMembership, roles::Role, token::SessionClaims};

/// Run the registration preconditions and the create-identity /
/// create-membership saga.
///
/// Preconditions, checked in order, each with its own failure:
/// caller role, target role (superadmin can never be assigned), mandatory
/// entity reference, tenant resolution (superadmin chooses, everyone else is
/// pinned to their session tenant), entity existence/ownership/email, and an
/// advisory email-uniqueness pre-check. The identity provider's own
/// uniqueness constraint remains the final authority under concurrent
/// registrations.
///
/// # Errors
///
/// See [`BrokerError`]; every precondition maps to a distinct variant.
pub async fn perform_registration(
    state: &BrokerState,
    caller: &SessionClaims,
    request: &RegisterRequest,
) -> Result<RegisterResponse, BrokerError> {
    let registrar = registrar_context(caller)?;
    if !registrar.role.can_register() {
        return Err(BrokerError::Forbidden);
    }

    let role = Role::normalize(request.role.as_deref())
        .filter(|role| role.is_assignable())
        .ok_or(BrokerError::InvalidRole)?;

    let entity_id = request
        .entity_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(BrokerError::MissingField("entityId"))?;

    let tenant_id = if registrar.role == Role::Superadmin {
        request
            .tenant_id
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or(BrokerError::MissingField("tenantId"))?
    } else {
        // Non-superadmin callers are pinned to their session tenant.
        let own = registrar.tenant_id.ok_or(BrokerError::Forbidden)?;
        if let Some(requested) = &request.tenant_id {
            if requested != &own {
                return Err(BrokerError::Forbidden);
            }
        }
        own
    };

    let entity = state
        .entities()
        .entity(entity_id)
        .await
        .map_err(|err| {
            error!("Entity lookup failed: {err}");
            BrokerError::Internal
        })?
        .ok_or(BrokerError::EntityNotFound)?;

    if entity.tenant_id != tenant_id {
        return Err(BrokerError::EntityInvalid(
            "entity belongs to a different company",
        ));
    }
    let email = entity
        .email
        .clone()
        .filter(|email| !email.trim().is_empty())
        .ok_or(BrokerError::EntityInvalid("entity has no email address"))?;

    match state.directory().find_by_email(&email).await {
        Ok(Some(_)) => return Err(BrokerError::EmailInUse),
        // Not registered yet: the expected case.
        Ok(None) => {}
        Err(err) => {
            error!("Identity lookup failed: {err}");
            return Err(BrokerError::UserLookupFailed);
        }
    }

    let password = state.config().registration_password().to_string();
    let subject_id = state
        .directory()
        .create_identity(&email, &password, &entity.display_name)
        .await
        .map_err(|err| {
            error!("Identity creation failed: {err}");
            BrokerError::IdentityCreationFailed
        })?;

    let new_membership = NewMembership {
        subject_id: subject_id.clone(),
        tenant_id,
        role,
        entity_id: entity.id,
        office_id: request.office_id.clone(),
    };
    let membership = match state.memberships().insert_membership(new_membership).await {
        Ok(membership) => membership,
        Err(err) => {
            error!("Membership creation failed: {err}");
            if let Err(cleanup) = state.directory().delete_identity(&subject_id).await {
                // Swallowed; the membership failure stays the surfaced error.
                warn!("Compensation failed, orphan identity {subject_id}: {cleanup}");
            }
            return Err(BrokerError::AssociationCreationFailed);
        }
    };

    Ok(RegisterResponse {
        subject_id,
        email,
        default_password: password,
        membership_id: membership.id.to_string(),
    })
}

#[utoipa::path(
    post,
    path = "/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Identity and membership created", body = RegisterResponse),
        (status = 400, description = "Invalid role, missing field, or unusable entity", body = ErrorBody),
        (status = 401, description = "Missing, invalid, or expired token", body = ErrorBody),
        (status = 403, description = "Caller may not register into this company", body = ErrorBody),
        (status = 404, description = "Entity not found", body = ErrorBody),
        (status = 409, description = "Email already registered", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn register(
    headers: HeaderMap,
    state: Extension<Arc<BrokerState>>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let claims = match bearer_claims(&headers, &state) {
        Ok(claims) => claims,
        Err(err) => return err.into_response(),
    };

    let Some(Json(request)) = payload else {
        return BrokerError::MissingField("entityId").into_response();
    };

    match perform_registration(&state, &claims, &request).await {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(err) => err.into_response(),
    }
}
