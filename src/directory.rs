//! External identity provider client.
//!
//! The broker never stores credentials. Assertion verification, email
//! lookup, and identity create/delete all go to the provider over HTTPS;
//! this module defines the traits the orchestrators consume and the
//! `reqwest`-backed implementation used in production.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{Instrument, error, info_span};
use url::Url;

/// A verified `(subject, email)` pair from the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub subject_id: String,
    pub email: String,
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The provider rejected the assertion or credentials.
    #[error("assertion rejected by identity provider")]
    Unauthorized,
    /// The provider could not be reached or returned a transport failure.
    #[error("identity provider request failed: {0}")]
    Transport(String),
    /// The provider answered with something the broker cannot interpret.
    #[error("unexpected identity provider response: {0}")]
    Protocol(String),
}

impl From<reqwest::Error> for DirectoryError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Verifies externally-issued identity assertions.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify an opaque assertion and return the identity it proves.
    async fn verify_assertion(&self, assertion: &str)
        -> Result<VerifiedIdentity, DirectoryError>;
}

/// Administrative operations against the identity provider.
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Look up an identity by email. `Ok(None)` means "not registered",
    /// which the registration flow treats as the expected case.
    async fn find_by_email(&self, email: &str)
        -> Result<Option<VerifiedIdentity>, DirectoryError>;

    /// Create a new identity and return its subject id.
    async fn create_identity(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<String, DirectoryError>;

    /// Delete an identity. Used only as registration compensation.
    async fn delete_identity(&self, subject_id: &str) -> Result<(), DirectoryError>;
}

/// HTTP client for the identity provider API.
pub struct HttpDirectory {
    base_url: String,
    api_key: Option<SecretString>,
    client: Client,
}

impl HttpDirectory {
    /// Build a client for the given provider base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed or the HTTP client fails
    /// to initialize.
    pub fn new(base_url: &str, api_key: Option<SecretString>) -> anyhow::Result<Self> {
        Url::parse(base_url)?;
        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{path}", self.base_url);
        let request = self.client.request(method, url);
        match &self.api_key {
            Some(key) => request.bearer_auth(key.expose_secret()),
            None => request,
        }
    }
}

fn string_field(json: &Value, field: &str) -> Result<String, DirectoryError> {
    json.get(field)
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| DirectoryError::Protocol(format!("missing field: {field}")))
}

#[async_trait]
impl IdentityVerifier for HttpDirectory {
    async fn verify_assertion(
        &self,
        assertion: &str,
    ) -> Result<VerifiedIdentity, DirectoryError> {
        let span = info_span!(
            "directory.verify",
            http.method = "POST",
            otel.kind = "client"
        );
        let response = self
            .request(reqwest::Method::POST, "/v1/assertions/verify")
            .json(&json!({ "assertion": assertion }))
            .send()
            .instrument(span)
            .await?;

        match response.status() {
            status if status.is_success() => {
                let body: Value = response.json().await?;
                Ok(VerifiedIdentity {
                    subject_id: string_field(&body, "subjectId")?,
                    email: string_field(&body, "email")?,
                })
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(DirectoryError::Unauthorized),
            status => {
                let body = response.text().await.unwrap_or_default();
                error!("Assertion verification failed: {status} {body}");
                Err(DirectoryError::Protocol(format!("status {status}")))
            }
        }
    }
}

#[async_trait]
impl IdentityDirectory for HttpDirectory {
    async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<VerifiedIdentity>, DirectoryError> {
        let span = info_span!(
            "directory.lookup",
            http.method = "GET",
            otel.kind = "client"
        );
        let response = self
            .request(reqwest::Method::GET, "/v1/identities")
            .query(&[("email", email)])
            .send()
            .instrument(span)
            .await?;

        match response.status() {
            // "not found" is the expected outcome for a fresh registration.
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body: Value = response.json().await?;
                Ok(Some(VerifiedIdentity {
                    subject_id: string_field(&body, "subjectId")?,
                    email: string_field(&body, "email")?,
                }))
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                error!("Identity lookup failed: {status} {body}");
                Err(DirectoryError::Protocol(format!("status {status}")))
            }
        }
    }

    async fn create_identity(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<String, DirectoryError> {
        let span = info_span!(
            "directory.create",
            http.method = "POST",
            otel.kind = "client"
        );
        let response = self
            .request(reqwest::Method::POST, "/v1/identities")
            .json(&json!({
                "email": email,
                "password": password,
                "displayName": display_name,
            }))
            .send()
            .instrument(span)
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Identity creation failed: {status} {body}");
            return Err(DirectoryError::Protocol(format!("status {status}")));
        }

        let body: Value = response.json().await?;
        string_field(&body, "subjectId")
    }

    async fn delete_identity(&self, subject_id: &str) -> Result<(), DirectoryError> {
        let span = info_span!(
            "directory.delete",
            http.method = "DELETE",
            otel.kind = "client"
        );
        let response = self
            .request(
                reqwest::Method::DELETE,
                &format!("/v1/identities/{subject_id}"),
            )
            .send()
            .instrument(span)
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(DirectoryError::Protocol(format!("status {status}")));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_invalid_base_url() {
        assert!(HttpDirectory::new("not a url", None).is_err());
    }

    #[test]
    fn new_trims_trailing_slash() -> anyhow::Result<()> {
        let directory = HttpDirectory::new("https://id.example.com/", None)?;
        assert_eq!(directory.base_url, "https://id.example.com");
        Ok(())
    }

    #[test]
    fn string_field_extracts_or_errors() {
        let body = json!({ "subjectId": "u1" });
        assert_eq!(string_field(&body, "subjectId").ok().as_deref(), Some("u1"));
        assert!(matches!(
            string_field(&body, "email"),
            Err(DirectoryError::Protocol(_))
        ));
    }
}
