//! Session domain types — SessionState, SessionIssue, SessionSnapshot

use serde::{Deserialize, Serialize};

use crate::identity::{Principal, PrincipalId};
use crate::profile::{ProfileRecord, Role};
use crate::routing::NavigationFlow;

/// Who is signed in, and in what capacity. Exactly one variant holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the first identity report or an in-flight profile fetch
    #[default]
    Resolving,
    Unauthenticated,
    PendingVerification(Principal),
    Authenticated(Principal, Role),
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Resolving => "resolving",
            Self::Unauthenticated => "unauthenticated",
            Self::PendingVerification(_) => "pending_verification",
            Self::Authenticated(..) => "authenticated",
        }
    }

    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Self::PendingVerification(p) | Self::Authenticated(p, _) => Some(p),
            Self::Resolving | Self::Unauthenticated => None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            Self::Authenticated(_, role) => Some(*role),
            _ => None,
        }
    }

    pub fn is_resolving(&self) -> bool {
        matches!(self, Self::Resolving)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PendingVerification(p) => write!(f, "pending_verification({})", p.id),
            Self::Authenticated(p, role) => write!(f, "authenticated({}, {role})", p.id),
            other => f.write_str(other.name()),
        }
    }
}

/// Problem shown next to the session state, never instead of it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionIssue {
    /// Profile fetch failed; the state stayed where it was
    FetchFailed {
        principal_id: PrincipalId,
        message: String,
        attempts: u32,
    },
    /// A verified principal has no profile document
    ProfileMissing { principal_id: PrincipalId },
}

/// Published view of the session, one per change
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    /// Flow selected for `state`; `None` while resolving
    pub flow: Option<NavigationFlow>,
    /// Profile backing an `Authenticated` state
    pub profile: Option<ProfileRecord>,
    pub issue: Option<SessionIssue>,
    /// Whether the loading screen should offer a manual retry
    pub retry_available: bool,
    /// Increases on every published change
    pub revision: u64,
}
