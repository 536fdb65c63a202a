//! Newtype domain identifiers.
//!
//! Every domain concept that has an identity is represented as a distinct newtype
//! wrapping a primitive. This prevents accidentally interchanging, for example,
//! an [`IssueNumber`] with a [`PullRequestNumber`] even though both are `u64`
//! under the hood.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(test)]
#[path = "identifiers_tests.rs"]
mod tests;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, from_static(), as_str(),
// Display, and a serde representation that rejects empty strings.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Wraps a built-in literal. Literals passed here are checked to be
            /// non-empty by a `const` assertion next to their definition.
            #[allow(dead_code)]
            pub(crate) fn from_static(value: &'static str) -> Self {
                debug_assert!(!value.is_empty(), "built-in identifiers are non-empty");
                Self(value.to_string())
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = String;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
                    .ok_or_else(|| format!("{} must not be empty", stringify!($name)))
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Macro for u64-wrapped newtypes (GitHub-assigned integers).
// Generates: struct (Copy), new(), as_u64(), Display.
// ---------------------------------------------------------------------------
macro_rules! u64_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Creates a new identifier from a raw integer.
            pub fn new(value: u64) -> Self {
                Self(value)
            }

            /// Returns the underlying integer value.
            pub fn as_u64(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: GitHub-integer-backed
// ---------------------------------------------------------------------------

u64_id! {
    /// The number of a GitHub issue within its repository.
    ///
    /// Passed to the repository-creation script as `ISSUE_NUMBER`.
    IssueNumber
}

u64_id! {
    /// The number of a GitHub pull request within its repository.
    PullRequestNumber
}

u64_id! {
    /// Identifies one installation of the GitHub App on an account.
    InstallationId
}

u64_id! {
    /// The numeric identifier GitHub assigns to a GitHub App.
    ///
    /// Used as the `iss` claim of the App JWT.
    AppId
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single job run (one workflow reacting to one event).
///
/// Generated fresh for every scheduled job; propagated through spans so all
/// activity from one run, including the token exchange, can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    /// Generates a new random run identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a [`RunId`] from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers: String-backed (GitHub names / configuration keys)
// ---------------------------------------------------------------------------

string_id! {
    /// The login of the account (organisation or user) that owns a repository.
    ///
    /// Passed to both scripts as `GITHUB_ORGANIZATION`.
    OrganizationLogin
}

string_id! {
    /// A repository name without its owner (e.g. `"sample-svc"`).
    RepositoryName
}

string_id! {
    /// Identifies a GitHub repository in `"owner/repo"` format.
    RepositoryId
}

string_id! {
    /// The name of an issue or pull request label.
    LabelName
}

string_id! {
    /// The unique name of a workflow definition (e.g. `"config-validation"`).
    WorkflowName
}

string_id! {
    /// A file-system path relative to the repository root, `/`-separated.
    FilePath
}

string_id! {
    /// A fully qualified Git ref (e.g. `"refs/heads/main"`).
    GitRef
}

string_id! {
    /// A full Git commit SHA.
    CommitSha
}

string_id! {
    /// The `X-GitHub-Delivery` GUID identifying one webhook delivery.
    DeliveryId
}

string_id! {
    /// The `id` of an issue-form field (e.g. `"repo-name"`).
    FieldId
}

impl GitRef {
    /// Returns `true` if this ref names a tag (`refs/tags/...`).
    pub fn is_tag(&self) -> bool {
        self.0.starts_with("refs/tags/")
    }
}

impl RepositoryId {
    /// Builds an `owner/repo` identifier from its two halves.
    pub fn from_parts(owner: &OrganizationLogin, name: &RepositoryName) -> Self {
        Self(format!("{owner}/{name}"))
    }

    /// Splits the identifier into owner and repository name.
    ///
    /// Returns `None` if the identifier is not of the form `owner/repo`.
    pub fn split(&self) -> Option<(OrganizationLogin, RepositoryName)> {
        let (owner, name) = self.0.split_once('/')?;
        if name.contains('/') {
            return None;
        }
        Some((OrganizationLogin::new(owner)?, RepositoryName::new(name)?))
    }
}
