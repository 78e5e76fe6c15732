//! Read-only access to business entities for registration checks.
//!
//! Registration links every new user to an existing entity; the broker only
//! needs the entity's company, display name, and email. Entity CRUD lives
//! elsewhere.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::{Instrument, info_span};

use crate::membership::StoreError;

/// The slice of an entity the registration flow cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRecord {
    pub id: String,
    pub tenant_id: String,
    pub display_name: String,
    pub email: Option<String>,
}

#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Fetch an entity by id, if it exists.
    async fn entity(&self, entity_id: &str) -> Result<Option<EntityRecord>, StoreError>;
}

/// Postgres-backed entity lookup.
#[derive(Clone)]
pub struct PgEntityStore {
    pool: PgPool,
}

impl PgEntityStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntityStore for PgEntityStore {
    async fn entity(&self, entity_id: &str) -> Result<Option<EntityRecord>, StoreError> {
        let query = r"
            SELECT id, tenant_id, display_name, email
            FROM entities
            WHERE id = $1
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(entity_id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await?;

        Ok(row.map(|row| EntityRecord {
            id: row.get("id"),
            tenant_id: row.get("tenant_id"),
            display_name: row.get("display_name"),
            email: row.get("email"),
        }))
    }
}
