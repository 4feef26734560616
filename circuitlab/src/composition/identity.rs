//! Placement and wire identities.
//!
//! Items created on the client carry a [`LocalToken`] until the first
//! successful save hands back a [`PersistedId`]. Both live inside
//! [`Identity`] so that every consumer has to say what it does with each case.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Client-side identity, valid only until the next successful save.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalToken(String);

impl LocalToken {
    /// Mint a fresh, collision-free token.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LocalToken {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for LocalToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for LocalToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server-assigned, stable identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersistedId(String);

impl PersistedId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PersistedId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for PersistedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a placement or wire connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Identity {
    /// Not yet saved.
    Local(LocalToken),
    /// Saved at least once.
    Persisted(PersistedId),
}

impl Identity {
    /// A fresh local identity.
    pub fn new_local() -> Self {
        Identity::Local(LocalToken::generate())
    }

    pub fn local(token: impl Into<LocalToken>) -> Self {
        Identity::Local(token.into())
    }

    pub fn persisted(id: impl Into<String>) -> Self {
        Identity::Persisted(PersistedId::new(id))
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Identity::Local(_))
    }

    pub fn is_persisted(&self) -> bool {
        matches!(self, Identity::Persisted(_))
    }

    pub fn as_persisted(&self) -> Option<&PersistedId> {
        match self {
            Identity::Persisted(id) => Some(id),
            Identity::Local(_) => None,
        }
    }
}

impl From<PersistedId> for Identity {
    fn from(id: PersistedId) -> Self {
        Identity::Persisted(id)
    }
}

impl From<LocalToken> for Identity {
    fn from(token: LocalToken) -> Self {
        Identity::Local(token)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Local(token) => write!(f, "local:{}", token),
            Identity::Persisted(id) => write!(f, "{}", id),
        }
    }
}
