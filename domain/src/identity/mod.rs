//! Agent identity: secret credentials and the keys derived from them.
//!
//! An agent proves who it is with a secret [`Credential`]. The public
//! [`IdentityHash`] is a one-way SHA-256 digest of that secret, so it is
//! stable for the credential's lifetime and cannot be reversed into it.
//!
//! Registry records are keyed by [`AgentKey`] = (identity hash, display name).
//! The display name can change (a rename), the hash cannot.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Secret credential held by a running agent.
///
/// `Debug` is redacted so credentials never end up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Derive the public identity hash.
    pub fn identity(&self) -> IdentityHash {
        let digest = Sha256::digest(self.0.as_bytes());
        IdentityHash(hex::encode(digest))
    }

    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Hex-encoded SHA-256 digest of a credential.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityHash(String);

impl IdentityHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight hex digits, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(8)]
    }
}

impl std::fmt::Display for IdentityHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Composite registry key: (identity hash, display name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentKey {
    pub identity: IdentityHash,
    pub name: String,
}

impl AgentKey {
    pub fn new(identity: IdentityHash, name: impl Into<String>) -> Self {
        Self {
            identity,
            name: name.into(),
        }
    }

    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self::new(self.identity.clone(), name)
    }
}

impl std::fmt::Display for AgentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.name, self.identity.short())
    }
}

/// The acting party of a Shared Interface operation: a display name plus
/// the credential that proves the identity behind it.
#[derive(Debug, Clone)]
pub struct Participant {
    name: String,
    credential: Credential,
    identity: IdentityHash,
}

impl Participant {
    pub fn new(name: impl Into<String>, credential: Credential) -> Self {
        let identity = credential.identity();
        Self {
            name: name.into(),
            credential,
            identity,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn identity(&self) -> &IdentityHash {
        &self.identity
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Both a non-empty secret and a non-blank name are present.
    pub fn has_credentials(&self) -> bool {
        !self.credential.is_empty() && !self.name.trim().is_empty()
    }

    /// Registry key, or a credential error if credentials are absent.
    pub fn key(&self) -> Result<AgentKey, DomainError> {
        if !self.has_credentials() {
            return Err(DomainError::MissingCredentials);
        }
        Ok(AgentKey::new(self.identity.clone(), self.name.clone()))
    }

    /// Label used as author/sender on forum and chat entries.
    pub fn author_label(&self) -> String {
        format!("[Agent] {}", self.name)
    }

    /// Change the display name; the identity hash is untouched.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }
}
