//! Steward GitHub infrastructure adapter.
//!
//! Implements the GitHub-facing ports defined in the [`pipeline`] crate
//! ([`pipeline::CredentialProvider`], [`pipeline::ChangedFileSource`]) over
//! the GitHub REST API using `reqwest` and `jsonwebtoken`.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules.
//! All GitHub API details (App authentication, pagination, status mapping) are
//! handled here; the [`pipeline`] crate never sees them.
//!
//! ## Authentication flow
//!
//! 1. Sign an RS256 App JWT ([`auth::AppJwtSigner`]).
//! 2. Look up the installation on the repository owner
//!    (`/orgs/{owner}/installation`, then `/users/{owner}/installation`).
//! 3. Exchange the JWT for an installation token
//!    (`POST /app/installations/{id}/access_tokens`).
//! 4. Revoke the token when the job is done (`DELETE /installation/token`).
//!
//! Nothing is retried; failures surface to the job outcome.

pub mod auth;
pub mod client;
pub mod errors;

pub use auth::AppJwtSigner;
pub use client::{GitHubAppClient, DEFAULT_API_URL};
pub use errors::GitHubError;
