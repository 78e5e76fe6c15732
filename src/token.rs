//! Session token codec: claims model plus HS256 sign/verify.
//!
//! Tokens are compact `header.claims.signature` strings with unpadded
//! base64url JSON segments and an HMAC-SHA256 signature. The broker is both
//! issuer and verifier, so a shared secret replaces an asymmetric keyset.
//!
//! Claims are immutable once issued; changing scope means issuing a new
//! token through login or company selection. Expiry and signature failures
//! are distinct error kinds so the gate can tell "log in again" apart from
//! "token was tampered with".

use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use crate::roles::Role;

pub const TOKEN_VERSION: u8 = 1;

type HmacSha256 = Hmac<Sha256>;

/// Session scope carried inside a token, tagged by resolution state.
///
/// The gate pattern-matches on the variant instead of probing optional
/// fields: a `Pending` session can never look like a `Resolved` one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionClaims {
    /// Fully scoped to one company; authorizes ordinary requests.
    Resolved {
        subject_id: String,
        email: String,
        role: Role,
        tenant_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        office_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        entity_id: Option<String>,
    },
    /// Identified but not yet committed to a company; authorizes only the
    /// company-selection step.
    Pending { subject_id: String, email: String },
    /// Platform-level identity, exempt from tenant scoping.
    Superadmin { subject_id: String, email: String },
}

impl SessionClaims {
    #[must_use]
    pub fn subject_id(&self) -> &str {
        match self {
            Self::Resolved { subject_id, .. }
            | Self::Pending { subject_id, .. }
            | Self::Superadmin { subject_id, .. } => subject_id,
        }
    }

    #[must_use]
    pub fn email(&self) -> &str {
        match self {
            Self::Resolved { email, .. }
            | Self::Pending { email, .. }
            | Self::Superadmin { email, .. } => email,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct TokenHeader {
    alg: String,
    typ: String,
}

impl TokenHeader {
    fn hs256() -> Self {
        Self {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct TokenClaims {
    v: u8,
    iat: i64,
    exp: i64,
    #[serde(flatten)]
    session: SessionClaims,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid token format")]
    TokenFormat,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlg(String),
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("invalid token version")]
    InvalidVersion,
    #[error("signing secret is not configured")]
    MissingSecret,
    #[error("invalid token ttl")]
    InvalidTtl,
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, Error> {
    let json = serde_json::to_vec(value)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T, Error> {
    let bytes = Base64UrlUnpadded::decode_vec(s).map_err(|_| Error::Base64)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Current unix time in seconds, used at the request edge. Orchestrators and
/// tests pass explicit timestamps into [`SessionSigner::issue`]/[`verify`].
///
/// [`verify`]: SessionSigner::verify
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs() as i64)
}

/// Signs and verifies session tokens with a shared secret and fixed TTL.
pub struct SessionSigner {
    secret: SecretString,
    ttl_seconds: i64,
}

impl SessionSigner {
    /// Build a signer from the configured secret and TTL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingSecret`] for an empty secret and
    /// [`Error::InvalidTtl`] for a non-positive TTL. Callers treat either as
    /// a fatal misconfiguration at startup.
    pub fn new(secret: SecretString, ttl_seconds: i64) -> Result<Self, Error> {
        if secret.expose_secret().trim().is_empty() {
            return Err(Error::MissingSecret);
        }
        if ttl_seconds <= 0 {
            return Err(Error::InvalidTtl);
        }
        Ok(Self {
            secret,
            ttl_seconds,
        })
    }

    #[must_use]
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    fn mac(&self) -> Result<HmacSha256, Error> {
        HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| Error::MissingSecret)
    }

    /// Issue a signed token for the given session claims.
    ///
    /// Deterministic for fixed claims and `now`; `exp = now + ttl`.
    ///
    /// # Errors
    ///
    /// Returns an error if claims cannot be encoded or the secret is unusable.
    pub fn issue(&self, session: &SessionClaims, now: i64) -> Result<String, Error> {
        let header_b64 = b64e_json(&TokenHeader::hs256())?;
        let claims = TokenClaims {
            v: TOKEN_VERSION,
            iat: now,
            exp: now + self.ttl_seconds,
            session: session.clone(),
        };
        let claims_b64 = b64e_json(&claims)?;
        let signing_input = format!("{header_b64}.{claims_b64}");

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature_b64 = Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes());

        Ok(format!("{signing_input}.{signature_b64}"))
    }

    /// Verify a token and return its decoded session claims.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the token is malformed or contains invalid base64/json,
    /// - the signature does not match,
    /// - the claims fail validation (`v`, `exp`).
    pub fn verify(&self, token: &str, now: i64) -> Result<SessionClaims, Error> {
        let mut parts = token.split('.');
        let header_b64 = parts.next().ok_or(Error::TokenFormat)?;
        let claims_b64 = parts.next().ok_or(Error::TokenFormat)?;
        let sig_b64 = parts.next().ok_or(Error::TokenFormat)?;
        if parts.next().is_some() {
            return Err(Error::TokenFormat);
        }

        let header: TokenHeader = b64d_json(header_b64)?;
        if header.alg != "HS256" {
            return Err(Error::UnsupportedAlg(header.alg));
        }

        let signing_input = format!("{header_b64}.{claims_b64}");
        let signature = Base64UrlUnpadded::decode_vec(sig_b64).map_err(|_| Error::Base64)?;
        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        // verify_slice is constant-time over the expected tag.
        mac.verify_slice(&signature)
            .map_err(|_| Error::InvalidSignature)?;

        let claims: TokenClaims = b64d_json(claims_b64)?;
        if claims.v != TOKEN_VERSION {
            return Err(Error::InvalidVersion);
        }
        if claims.exp <= now {
            return Err(Error::Expired);
        }

        Ok(claims.session)
    }
}
