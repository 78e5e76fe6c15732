//! Broker configuration and shared request state.
//!
//! Everything the orchestrators need (signer, verifier, stores, policy
//! knobs) is injected here at startup and carried through handlers as an
//! `Extension<Arc<BrokerState>>`. Business logic never reads the process
//! environment.

use std::sync::Arc;

use crate::{
    directory::{IdentityDirectory, IdentityVerifier},
    entities::EntityStore,
    membership::MembershipStore,
    token::SessionSigner,
};

const DEFAULT_TOKEN_TTL_SECONDS: i64 = 12 * 60 * 60;
const DEFAULT_REGISTRATION_PASSWORD: &str = "ChangeMeNow1!";

/// Policy configuration for the broker core.
#[derive(Clone, Debug)]
pub struct BrokerConfig {
    superadmin_email: Option<String>,
    superadmin_subject: Option<String>,
    token_ttl_seconds: i64,
    registration_password: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl BrokerConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            superadmin_email: None,
            superadmin_subject: None,
            token_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
            registration_password: DEFAULT_REGISTRATION_PASSWORD.to_string(),
        }
    }

    #[must_use]
    pub fn with_superadmin(mut self, email: Option<String>, subject: Option<String>) -> Self {
        self.superadmin_email = email;
        self.superadmin_subject = subject;
        self
    }

    #[must_use]
    pub fn with_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_registration_password(mut self, password: String) -> Self {
        self.registration_password = password;
        self
    }

    #[must_use]
    pub fn token_ttl_seconds(&self) -> i64 {
        self.token_ttl_seconds
    }

    /// The fixed bootstrap password for newly registered identities.
    /// Rotation is assumed to happen out of band.
    pub(crate) fn registration_password(&self) -> &str {
        &self.registration_password
    }

    /// `true` only when both halves of the configured superadmin pair match
    /// exactly. A matching email with a different subject (or vice versa)
    /// never triggers the bypass.
    pub(crate) fn is_superadmin(&self, email: &str, subject_id: &str) -> bool {
        match (&self.superadmin_email, &self.superadmin_subject) {
            (Some(configured_email), Some(configured_subject)) => {
                configured_email == email && configured_subject == subject_id
            }
            _ => false,
        }
    }
}

/// Shared, immutable state for all auth handlers.
pub struct BrokerState {
    config: BrokerConfig,
    signer: SessionSigner,
    verifier: Arc<dyn IdentityVerifier>,
    directory: Arc<dyn IdentityDirectory>,
    memberships: Arc<dyn MembershipStore>,
    entities: Arc<dyn EntityStore>,
}

impl BrokerState {
    pub fn new(
        config: BrokerConfig,
        signer: SessionSigner,
        verifier: Arc<dyn IdentityVerifier>,
        directory: Arc<dyn IdentityDirectory>,
        memberships: Arc<dyn MembershipStore>,
        entities: Arc<dyn EntityStore>,
    ) -> Self {
        Self {
            config,
            signer,
            verifier,
            directory,
            memberships,
            entities,
        }
    }

    #[must_use]
    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    #[must_use]
    pub fn signer(&self) -> &SessionSigner {
        &self.signer
    }

    pub(crate) fn verifier(&self) -> &dyn IdentityVerifier {
        self.verifier.as_ref()
    }

    pub(crate) fn directory(&self) -> &dyn IdentityDirectory {
        self.directory.as_ref()
    }

    pub(crate) fn memberships(&self) -> &dyn MembershipStore {
        self.memberships.as_ref()
    }

    pub(crate) fn entities(&self) -> &dyn EntityStore {
        self.entities.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broker_config_defaults_and_overrides() {
        let config = BrokerConfig::new();
        assert_eq!(config.token_ttl_seconds(), DEFAULT_TOKEN_TTL_SECONDS);
        assert_eq!(
            config.registration_password(),
            DEFAULT_REGISTRATION_PASSWORD
        );
        assert!(!config.is_superadmin("root@example.com", "root-1"));

        let config = config
            .with_token_ttl_seconds(600)
            .with_registration_password("Rotate.Me".to_string())
            .with_superadmin(
                Some("root@example.com".to_string()),
                Some("root-1".to_string()),
            );
        assert_eq!(config.token_ttl_seconds(), 600);
        assert_eq!(config.registration_password(), "Rotate.Me");
        assert!(config.is_superadmin("root@example.com", "root-1"));
    }

    #[test]
    fn superadmin_requires_exact_pair() {
        let config = BrokerConfig::new().with_superadmin(
            Some("root@example.com".to_string()),
            Some("root-1".to_string()),
        );
        assert!(!config.is_superadmin("root@example.com", "someone-else"));
        assert!(!config.is_superadmin("other@example.com", "root-1"));

        // A half-configured pair never matches.
        let partial = BrokerConfig::new().with_superadmin(Some("root@example.com".to_string()), None);
        assert!(!partial.is_superadmin("root@example.com", "root-1"));
    }
}
