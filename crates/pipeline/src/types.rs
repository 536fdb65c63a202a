//! Shared value types for the Steward domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! values with invariants (secrets never print, exit statuses distinguish
//! signals from codes) and participate in domain decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;

// ---------------------------------------------------------------------------
// Secrets
// ---------------------------------------------------------------------------

/// A secret string value (App private key, webhook secret, installation token).
///
/// `Debug` and `Display` are redacted. The raw value is only reachable through
/// [`SecretString::expose`], which keeps every read site greppable.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    /// Wraps a secret value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw secret.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the secret is the empty string.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretString(***)")
    }
}

impl std::fmt::Display for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("***")
    }
}

// ---------------------------------------------------------------------------

/// A short-lived GitHub App installation access token.
///
/// Held only by the job run that minted it; passed to the child process as an
/// environment variable and revoked once the child exits.
#[derive(Debug, Clone)]
pub struct InstallationToken {
    /// The token value.
    pub token: SecretString,

    /// When GitHub will stop accepting the token.
    pub expires_at: Timestamp,
}

impl InstallationToken {
    /// Returns `true` if the token has expired at `now`.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }
}

// ---------------------------------------------------------------------------
// Process exit
// ---------------------------------------------------------------------------

/// How an external script terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScriptExit {
    /// The process exited with an exit code.
    Code {
        /// The raw exit code.
        code: i32,
    },
    /// The process was terminated by a signal and produced no exit code.
    Signal,
}

impl ScriptExit {
    /// Returns `true` if the process exited with code 0.
    pub fn success(self) -> bool {
        matches!(self, ScriptExit::Code { code: 0 })
    }

    /// Exit code to propagate as the job status.
    ///
    /// Codes are passed through verbatim; signal termination maps to `1`.
    pub fn propagated_code(self) -> i32 {
        match self {
            ScriptExit::Code { code } => code,
            ScriptExit::Signal => 1,
        }
    }
}

impl std::fmt::Display for ScriptExit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScriptExit::Code { code } => write!(f, "exit code {code}"),
            ScriptExit::Signal => f.write_str("terminated by signal"),
        }
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly; the underlying representation can change without affecting the
/// domain API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }

    /// Seconds since the Unix epoch.
    pub fn unix_seconds(self) -> i64 {
        self.0.timestamp()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
