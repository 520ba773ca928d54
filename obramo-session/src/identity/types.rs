//! Identity domain types — PrincipalId, Principal, PrincipalEvent

use serde::{Deserialize, Serialize};

/// Opaque identifier issued by the identity provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(String);

impl PrincipalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PrincipalId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PrincipalId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A signed-in identity as reported by the provider
///
/// Any field may change between reports without a new `id` being issued,
/// most notably `email_verified` flipping to `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    #[serde(rename = "uid")]
    pub id: PrincipalId,
    pub email: String,
    pub email_verified: bool,
}

impl Principal {
    pub fn new(id: impl Into<PrincipalId>, email: impl Into<String>, email_verified: bool) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            email_verified,
        }
    }
}

/// Normalized identity stream event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrincipalEvent {
    SignedIn(Principal),
    SignedOut,
}

impl PrincipalEvent {
    /// The principal carried by a `SignedIn` event
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Self::SignedIn(principal) => Some(principal),
            Self::SignedOut => None,
        }
    }
}

impl From<Option<Principal>> for PrincipalEvent {
    fn from(current: Option<Principal>) -> Self {
        match current {
            Some(principal) => Self::SignedIn(principal),
            None => Self::SignedOut,
        }
    }
}
