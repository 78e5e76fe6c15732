//! In-memory fakes for exercising the broker flows without a database or an
//! identity provider.

use async_trait::async_trait;
use secrecy::SecretString;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::state::{BrokerConfig, BrokerState};
use crate::{
    directory::{DirectoryError, IdentityDirectory, IdentityVerifier, VerifiedIdentity},
    entities::{EntityRecord, EntityStore},
    membership::{MembershipStore, NewMembership, StoreError, TenantMembership},
    token::SessionSigner,
};

pub(crate) fn membership(subject: &str, tenant: &str, role: &str) -> TenantMembership {
    TenantMembership {
        id: Uuid::new_v4(),
        subject_id: subject.to_string(),
        tenant_id: tenant.to_string(),
        role: role.to_string(),
        office_id: None,
        entity_id: None,
        active: true,
    }
}

pub(crate) fn entity(id: &str, tenant: &str, email: Option<&str>) -> EntityRecord {
    EntityRecord {
        id: id.to_string(),
        tenant_id: tenant.to_string(),
        display_name: "Jane Broker".to_string(),
        email: email.map(ToString::to_string),
    }
}

/// Verifier that accepts any assertion for one fixed identity, or rejects
/// everything when unset.
pub(crate) struct FakeVerifier {
    identity: Option<VerifiedIdentity>,
}

#[async_trait]
impl IdentityVerifier for FakeVerifier {
    async fn verify_assertion(
        &self,
        _assertion: &str,
    ) -> Result<VerifiedIdentity, DirectoryError> {
        self.identity.clone().ok_or(DirectoryError::Unauthorized)
    }
}

/// Identity provider fake that records creations and deletions so tests can
/// assert on compensation behavior.
pub(crate) struct FakeDirectory {
    existing: Vec<VerifiedIdentity>,
    pub(crate) created: Mutex<Vec<VerifiedIdentity>>,
    pub(crate) deleted: Mutex<Vec<String>>,
    fail_lookup: bool,
    fail_delete: bool,
}

#[async_trait]
impl IdentityDirectory for FakeDirectory {
    async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<VerifiedIdentity>, DirectoryError> {
        if self.fail_lookup {
            return Err(DirectoryError::Transport("lookup offline".to_string()));
        }
        if let Some(found) = self.existing.iter().find(|i| i.email == email) {
            return Ok(Some(found.clone()));
        }
        let created = self
            .created
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let deleted = self
            .deleted
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(created
            .iter()
            .find(|i| i.email == email && !deleted.contains(&i.subject_id))
            .cloned())
    }

    async fn create_identity(
        &self,
        email: &str,
        _password: &str,
        _display_name: &str,
    ) -> Result<String, DirectoryError> {
        let mut created = self
            .created
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let subject_id = format!("sub-{}", created.len() + 1);
        created.push(VerifiedIdentity {
            subject_id: subject_id.clone(),
            email: email.to_string(),
        });
        Ok(subject_id)
    }

    async fn delete_identity(&self, subject_id: &str) -> Result<(), DirectoryError> {
        if self.fail_delete {
            return Err(DirectoryError::Transport("delete offline".to_string()));
        }
        self.deleted
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(subject_id.to_string());
        Ok(())
    }
}

pub(crate) struct InMemoryMemberships {
    rows: Mutex<Vec<TenantMembership>>,
    fail_insert: bool,
}

#[async_trait]
impl MembershipStore for InMemoryMemberships {
    async fn active_memberships(
        &self,
        subject_id: &str,
    ) -> Result<Vec<TenantMembership>, StoreError> {
        let rows = self
            .rows
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(rows
            .iter()
            .filter(|m| m.subject_id == subject_id && m.active)
            .cloned()
            .collect())
    }

    async fn membership_for(
        &self,
        subject_id: &str,
        tenant_id: &str,
    ) -> Result<Option<TenantMembership>, StoreError> {
        let rows = self
            .rows
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(rows
            .iter()
            .find(|m| m.subject_id == subject_id && m.tenant_id == tenant_id && m.active)
            .cloned())
    }

    async fn insert_membership(
        &self,
        new: NewMembership,
    ) -> Result<TenantMembership, StoreError> {
        if self.fail_insert {
            return Err(StoreError::Unavailable("insert disabled".to_string()));
        }
        let row = TenantMembership {
            id: Uuid::new_v4(),
            subject_id: new.subject_id,
            tenant_id: new.tenant_id,
            role: new.role.as_str().to_string(),
            office_id: new.office_id,
            entity_id: Some(new.entity_id),
            active: true,
        };
        self.rows
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(row.clone());
        Ok(row)
    }
}

pub(crate) struct InMemoryEntities {
    rows: Vec<EntityRecord>,
}

#[async_trait]
impl EntityStore for InMemoryEntities {
    async fn entity(&self, entity_id: &str) -> Result<Option<EntityRecord>, StoreError> {
        Ok(self.rows.iter().find(|e| e.id == entity_id).cloned())
    }
}

pub(crate) struct BrokerStateBuilder {
    identity: Option<VerifiedIdentity>,
    memberships: Vec<TenantMembership>,
    entities: Vec<EntityRecord>,
    existing: Vec<VerifiedIdentity>,
    superadmin: Option<(String, String)>,
    fail_membership_insert: bool,
    fail_directory_lookup: bool,
    fail_directory_delete: bool,
}

impl BrokerStateBuilder {
    pub(crate) fn new() -> Self {
        Self {
            identity: None,
            memberships: vec![],
            entities: vec![],
            existing: vec![],
            superadmin: None,
            fail_membership_insert: false,
            fail_directory_lookup: false,
            fail_directory_delete: false,
        }
    }

    pub(crate) fn identity(mut self, subject: &str, email: &str) -> Self {
        self.identity = Some(VerifiedIdentity {
            subject_id: subject.to_string(),
            email: email.to_string(),
        });
        self
    }

    pub(crate) fn membership(mut self, membership: TenantMembership) -> Self {
        self.memberships.push(membership);
        self
    }

    pub(crate) fn entity(mut self, entity: EntityRecord) -> Self {
        self.entities.push(entity);
        self
    }

    pub(crate) fn existing_identity(mut self, subject: &str, email: &str) -> Self {
        self.existing.push(VerifiedIdentity {
            subject_id: subject.to_string(),
            email: email.to_string(),
        });
        self
    }

    pub(crate) fn superadmin(mut self, email: &str, subject: &str) -> Self {
        self.superadmin = Some((email.to_string(), subject.to_string()));
        self
    }

    pub(crate) fn fail_membership_insert(mut self) -> Self {
        self.fail_membership_insert = true;
        self
    }

    pub(crate) fn fail_directory_lookup(mut self) -> Self {
        self.fail_directory_lookup = true;
        self
    }

    pub(crate) fn fail_directory_delete(mut self) -> Self {
        self.fail_directory_delete = true;
        self
    }

    pub(crate) fn build(self) -> BrokerState {
        self.build_with_directory().0
    }

    pub(crate) fn build_with_directory(self) -> (BrokerState, Arc<FakeDirectory>) {
        let directory = Arc::new(FakeDirectory {
            existing: self.existing,
            created: Mutex::new(vec![]),
            deleted: Mutex::new(vec![]),
            fail_lookup: self.fail_directory_lookup,
            fail_delete: self.fail_directory_delete,
        });
        let mut config = BrokerConfig::new();
        if let Some((email, subject)) = self.superadmin {
            config = config.with_superadmin(Some(email), Some(subject));
        }
        let signer = SessionSigner::new(SecretString::from("test-signing-secret".to_string()), 600)
            .unwrap_or_else(|_| unreachable!("test signer config is valid"));
        let state = BrokerState::new(
            config,
            signer,
            Arc::new(FakeVerifier {
                identity: self.identity,
            }),
            directory.clone(),
            Arc::new(InMemoryMemberships {
                rows: Mutex::new(self.memberships),
                fail_insert: self.fail_membership_insert,
            }),
            Arc::new(InMemoryEntities {
                rows: self.entities,
            }),
        );
        (state, directory)
    }
}
