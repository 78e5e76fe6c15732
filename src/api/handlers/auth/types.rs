//! Request/response types for the broker endpoints.
//!
//! The wire format is camelCase JSON; token claims and storage stay
//! snake_case internally.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{membership::TenantMembership, roles::Role, token::SessionClaims};

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub external_assertion: String,
}

/// One company the caller may act in, as presented for selection.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MembershipSummary {
    pub tenant_id: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub office_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
}

impl From<&TenantMembership> for MembershipSummary {
    fn from(membership: &TenantMembership) -> Self {
        Self {
            tenant_id: membership.tenant_id.clone(),
            role: membership.role.clone(),
            office_id: membership.office_id.clone(),
            entity_id: membership.entity_id.clone(),
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub companies: Vec<MembershipSummary>,
    pub needs_selection: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_super_admin: bool,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SelectCompanyRequest {
    pub tenant_id: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SelectCompanyResponse {
    pub token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub entity_id: Option<String>,
    pub role: Option<String>,
    pub tenant_id: Option<String>,
    pub office_id: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub subject_id: String,
    pub email: String,
    pub default_password: String,
    pub membership_id: String,
}

/// Decoded session summary returned by the introspection endpoint.
#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub kind: String,
    pub subject_id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub office_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
}

impl From<&SessionClaims> for SessionResponse {
    fn from(claims: &SessionClaims) -> Self {
        match claims {
            SessionClaims::Resolved {
                subject_id,
                email,
                role,
                tenant_id,
                office_id,
                entity_id,
            } => Self {
                kind: "resolved".to_string(),
                subject_id: subject_id.clone(),
                email: email.clone(),
                role: Some(*role),
                tenant_id: Some(tenant_id.clone()),
                office_id: office_id.clone(),
                entity_id: entity_id.clone(),
            },
            SessionClaims::Pending { subject_id, email } => Self {
                kind: "pending".to_string(),
                subject_id: subject_id.clone(),
                email: email.clone(),
                role: None,
                tenant_id: None,
                office_id: None,
                entity_id: None,
            },
            SessionClaims::Superadmin { subject_id, email } => Self {
                kind: "superadmin".to_string(),
                subject_id: subject_id.clone(),
                email: email.clone(),
                role: Some(Role::Superadmin),
                tenant_id: None,
                office_id: None,
                entity_id: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};

    #[test]
    fn login_response_uses_camel_case() -> Result<()> {
        let response = LoginResponse {
            token: "t".to_string(),
            companies: vec![],
            needs_selection: true,
            is_super_admin: false,
        };
        let value = serde_json::to_value(&response)?;
        assert!(value.get("needsSelection").is_some());
        // isSuperAdmin is omitted when false.
        assert!(value.get("isSuperAdmin").is_none());
        Ok(())
    }

    #[test]
    fn superadmin_login_response_flags() -> Result<()> {
        let response = LoginResponse {
            token: "t".to_string(),
            companies: vec![],
            needs_selection: false,
            is_super_admin: true,
        };
        let value = serde_json::to_value(&response)?;
        assert_eq!(
            value.get("isSuperAdmin").and_then(serde_json::Value::as_bool),
            Some(true)
        );
        Ok(())
    }

    #[test]
    fn register_request_accepts_partial_payload() -> Result<()> {
        let request: RegisterRequest =
            serde_json::from_value(serde_json::json!({ "role": "agent" }))?;
        assert_eq!(request.role.as_deref(), Some("agent"));
        assert!(request.entity_id.is_none());
        Ok(())
    }

    #[test]
    fn session_response_from_pending_claims() -> Result<()> {
        let claims = SessionClaims::Pending {
            subject_id: "u1".to_string(),
            email: "a@example.com".to_string(),
        };
        let response = SessionResponse::from(&claims);
        let value = serde_json::to_value(&response)?;
        let kind = value
            .get("kind")
            .and_then(serde_json::Value::as_str)
            .context("missing kind")?;
        assert_eq!(kind, "pending");
        assert!(value.get("tenantId").is_none());
        Ok(())
    }
}
