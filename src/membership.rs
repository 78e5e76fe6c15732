//! Tenant membership model, resolution, and storage.
//!
//! A membership binds one subject to one company with a role and optional
//! office/entity scoping. At most one *active* membership may exist per
//! `(subject_id, tenant_id)` pair; Postgres enforces this with a partial
//! unique index, and the broker never re-checks it.
//!
//! Memberships are read-only to login and company selection; the only write
//! path in this service is the registration flow. Activation changes happen
//! through external administrative tooling.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use thiserror::Error;
use tracing::{Instrument, info_span};
use uuid::Uuid;

use crate::roles::Role;

/// One subject-to-company association as stored.
///
/// `role` stays free text here; authorization decisions normalize it through
/// [`Role::normalize`] at the point of use.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TenantMembership {
    pub id: Uuid,
    pub subject_id: String,
    pub tenant_id: String,
    pub role: String,
    pub office_id: Option<String>,
    pub entity_id: Option<String>,
    pub active: bool,
}

/// Input for the registration write path.
#[derive(Debug, Clone)]
pub struct NewMembership {
    pub subject_id: String,
    pub tenant_id: String,
    pub role: Role,
    pub entity_id: String,
    pub office_id: Option<String>,
}

/// Classification of a subject's active memberships.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipResolution {
    /// No active membership: authenticated but not authorized for any company.
    None,
    /// Exactly one active membership: login resolves directly.
    Single(TenantMembership),
    /// Two or more, in store order. Order is for UI listing only and must not
    /// drive authorization decisions.
    Multiple(Vec<TenantMembership>),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error")]
    Database(#[from] sqlx::Error),
    #[error("membership store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// All *active* memberships for a subject, in store order.
    async fn active_memberships(
        &self,
        subject_id: &str,
    ) -> Result<Vec<TenantMembership>, StoreError>;

    /// The active membership for one `(subject, tenant)` pair, if any.
    async fn membership_for(
        &self,
        subject_id: &str,
        tenant_id: &str,
    ) -> Result<Option<TenantMembership>, StoreError>;

    /// Insert a new active membership and return the stored row.
    async fn insert_membership(
        &self,
        new: NewMembership,
    ) -> Result<TenantMembership, StoreError>;
}

/// Classify a subject's active memberships for the login flow.
///
/// # Errors
///
/// Propagates the store error unchanged.
pub async fn resolve_memberships(
    store: &dyn MembershipStore,
    subject_id: &str,
) -> Result<MembershipResolution, StoreError> {
    let mut memberships = store.active_memberships(subject_id).await?;
    Ok(match memberships.len() {
        0 => MembershipResolution::None,
        1 => MembershipResolution::Single(memberships.remove(0)),
        _ => MembershipResolution::Multiple(memberships),
    })
}

/// Postgres-backed membership store.
#[derive(Clone)]
pub struct PgMembershipStore {
    pool: PgPool,
}

impl PgMembershipStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn membership_from_row(row: &sqlx::postgres::PgRow) -> TenantMembership {
    TenantMembership {
        id: row.get("id"),
        subject_id: row.get("subject_id"),
        tenant_id: row.get("tenant_id"),
        role: row.get("role"),
        office_id: row.get("office_id"),
        entity_id: row.get("entity_id"),
        active: row.get("active"),
    }
}

#[async_trait]
impl MembershipStore for PgMembershipStore {
    async fn active_memberships(
        &self,
        subject_id: &str,
    ) -> Result<Vec<TenantMembership>, StoreError> {
        let query = r"
            SELECT id, subject_id, tenant_id, role, office_id, entity_id, active
            FROM tenant_memberships
            WHERE subject_id = $1 AND active
            ORDER BY created_at
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let rows = sqlx::query(query)
            .bind(subject_id)
            .fetch_all(&self.pool)
            .instrument(span)
            .await?;

        Ok(rows.iter().map(membership_from_row).collect())
    }

    async fn membership_for(
        &self,
        subject_id: &str,
        tenant_id: &str,
    ) -> Result<Option<TenantMembership>, StoreError> {
        let query = r"
            SELECT id, subject_id, tenant_id, role, office_id, entity_id, active
            FROM tenant_memberships
            WHERE subject_id = $1 AND tenant_id = $2 AND active
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(subject_id)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await?;

        Ok(row.as_ref().map(membership_from_row))
    }

    async fn insert_membership(
        &self,
        new: NewMembership,
    ) -> Result<TenantMembership, StoreError> {
        let query = r"
            INSERT INTO tenant_memberships
                (subject_id, tenant_id, role, entity_id, office_id, active)
            VALUES ($1, $2, $3, $4, $5, TRUE)
            RETURNING id
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(&new.subject_id)
            .bind(&new.tenant_id)
            .bind(new.role.as_str())
            .bind(&new.entity_id)
            .bind(&new.office_id)
            .fetch_one(&self.pool)
            .instrument(span)
            .await?;

        Ok(TenantMembership {
            id: row.get("id"),
            subject_id: new.subject_id,
            tenant_id: new.tenant_id,
            role: new.role.as_str().to_string(),
            office_id: new.office_id,
            entity_id: Some(new.entity_id),
            active: true,
        })
    }
}
