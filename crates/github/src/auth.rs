//! GitHub App authentication: the RS256 JWT that proves the App's identity.
//!
//! The JWT is only ever used to look up installations and to mint
//! installation tokens. Scripts never see it.

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use pipeline::{AppId, SecretString, Timestamp};
use serde::{Deserialize, Serialize};

use crate::errors::GitHubError;

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;

/// Clock drift allowance: `iat` is backdated by this many seconds.
pub const ISSUED_AT_SKEW_SECS: i64 = 60;

/// JWT lifetime from now. GitHub rejects anything over ten minutes.
pub const JWT_LIFETIME_SECS: i64 = 9 * 60;

/// Claims of a GitHub App JWT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppClaims {
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

impl AppClaims {
    pub fn new(app_id: AppId, now: Timestamp) -> Self {
        let now = now.unix_seconds();
        Self {
            iat: now - ISSUED_AT_SKEW_SECS,
            exp: now + JWT_LIFETIME_SECS,
            iss: app_id.to_string(),
        }
    }
}

/// Signs App JWTs with the App private key.
#[derive(Clone)]
pub struct AppJwtSigner {
    app_id: AppId,
    key: EncodingKey,
}

impl std::fmt::Debug for AppJwtSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppJwtSigner")
            .field("app_id", &self.app_id)
            .field("key", &"***")
            .finish()
    }
}

impl AppJwtSigner {
    /// Parses a PKCS#1 or PKCS#8 RSA private key in PEM form.
    pub fn from_pem(app_id: AppId, pem: &SecretString) -> Result<Self, GitHubError> {
        let key = EncodingKey::from_rsa_pem(pem.expose().as_bytes()).map_err(|e| {
            GitHubError::InvalidPrivateKey {
                message: e.to_string(),
            }
        })?;
        Ok(Self { app_id, key })
    }

    pub fn app_id(&self) -> AppId {
        self.app_id
    }

    /// Signs a JWT valid from one minute before `now` to nine minutes after.
    pub fn sign_at(&self, now: Timestamp) -> Result<SecretString, GitHubError> {
        let claims = AppClaims::new(self.app_id, now);
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .map(SecretString::new)
            .map_err(|e| GitHubError::Signing {
                message: e.to_string(),
            })
    }

    pub fn sign(&self) -> Result<SecretString, GitHubError> {
        self.sign_at(Timestamp::now())
    }
}
