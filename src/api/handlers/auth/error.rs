//! Broker error taxonomy and its HTTP mapping.
//!
//! Every failure in the login, selection, registration, and gate flows is a
//! typed variant here, mapped to a stable `{ code, message }` body. Internal
//! causes (sqlx, reqwest) are logged server-side and never forwarded.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

use crate::token;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("invalid external credential")]
    InvalidExternalCredential,
    #[error("missing or invalid session token")]
    InvalidToken,
    #[error("session token expired")]
    ExpiredToken,
    #[error("no companies assigned to this identity")]
    NoTenantsAssigned,
    #[error("forbidden")]
    Forbidden,
    #[error("not a member of the selected company")]
    InvalidCompanySelection,
    #[error("company already selected for this session")]
    CompanyAlreadySelected,
    #[error("role is not assignable")]
    InvalidRole,
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("entity not found")]
    EntityNotFound,
    #[error("entity is not usable for registration: {0}")]
    EntityInvalid(&'static str),
    #[error("email already registered")]
    EmailInUse,
    #[error("identity lookup failed")]
    UserLookupFailed,
    #[error("identity creation failed")]
    IdentityCreationFailed,
    #[error("membership creation failed")]
    AssociationCreationFailed,
    #[error("broker misconfigured")]
    Config,
    #[error("internal error")]
    Internal,
}

/// Stable error body; `message` is safe to show to a human.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl BrokerError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidExternalCredential | Self::InvalidToken | Self::ExpiredToken => {
                StatusCode::UNAUTHORIZED
            }
            Self::NoTenantsAssigned | Self::Forbidden | Self::InvalidCompanySelection => {
                StatusCode::FORBIDDEN
            }
            Self::CompanyAlreadySelected
            | Self::InvalidRole
            | Self::MissingField(_)
            | Self::EntityInvalid(_) => StatusCode::BAD_REQUEST,
            Self::EntityNotFound => StatusCode::NOT_FOUND,
            Self::EmailInUse => StatusCode::CONFLICT,
            Self::UserLookupFailed
            | Self::IdentityCreationFailed
            | Self::AssociationCreationFailed
            | Self::Config
            | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidExternalCredential => "INVALID_EXTERNAL_CREDENTIAL",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::ExpiredToken => "EXPIRED_TOKEN",
            Self::NoTenantsAssigned => "NO_TENANTS_ASSIGNED",
            Self::Forbidden => "FORBIDDEN",
            Self::InvalidCompanySelection => "INVALID_COMPANY_SELECTION",
            Self::CompanyAlreadySelected => "COMPANY_ALREADY_SELECTED",
            Self::InvalidRole => "INVALID_ROLE",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::EntityNotFound => "ENTITY_NOT_FOUND",
            Self::EntityInvalid(_) => "ENTITY_INVALID",
            Self::EmailInUse => "EMAIL_IN_USE",
            Self::UserLookupFailed => "USER_LOOKUP_FAILED",
            Self::IdentityCreationFailed => "IDENTITY_CREATION_FAILED",
            Self::AssociationCreationFailed => "ASSOCIATION_CREATION_FAILED",
            Self::Config => "CONFIG_ERROR",
            Self::Internal => "INTERNAL",
        }
    }

    /// Map token verification failures onto the broker taxonomy.
    pub(crate) fn from_token(err: &token::Error) -> Self {
        match err {
            token::Error::Expired => Self::ExpiredToken,
            token::Error::MissingSecret | token::Error::InvalidTtl => Self::Config,
            _ => Self::InvalidToken,
        }
    }
}

impl IntoResponse for BrokerError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Broker failure: {self}");
        }
        let body = ErrorBody {
            code: self.code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_matches_taxonomy() {
        assert_eq!(
            BrokerError::InvalidExternalCredential.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            BrokerError::NoTenantsAssigned.status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            BrokerError::CompanyAlreadySelected.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            BrokerError::InvalidCompanySelection.status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(BrokerError::EntityNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(BrokerError::EmailInUse.status(), StatusCode::CONFLICT);
        assert_eq!(
            BrokerError::AssociationCreationFailed.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn token_errors_stay_distinct() {
        assert!(matches!(
            BrokerError::from_token(&token::Error::Expired),
            BrokerError::ExpiredToken
        ));
        assert!(matches!(
            BrokerError::from_token(&token::Error::InvalidSignature),
            BrokerError::InvalidToken
        ));
        assert!(matches!(
            BrokerError::from_token(&token::Error::MissingSecret),
            BrokerError::Config
        ));
    }

    #[test]
    fn error_body_shape() {
        let err = BrokerError::MissingField("entityId");
        assert_eq!(err.code(), "MISSING_FIELD");
        assert_eq!(err.to_string(), "missing required field: entityId");
    }
}
