//! Flow selection

use serde::{Deserialize, Serialize};

use crate::profile::Role;
use crate::session::SessionState;

/// Top-level screen tree shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NavigationFlow {
    AuthFlow,
    VerificationFlow,
    ClientFlow,
    ProfessionalFlow,
}

impl NavigationFlow {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthFlow => "auth",
            Self::VerificationFlow => "verification",
            Self::ClientFlow => "client",
            Self::ProfessionalFlow => "professional",
        }
    }
}

impl std::fmt::Display for NavigationFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a session state to the flow to mount.
///
/// `None` while resolving: the caller shows a neutral loading indicator.
pub fn select_flow(state: &SessionState) -> Option<NavigationFlow> {
    match state {
        SessionState::Resolving => None,
        SessionState::Unauthenticated => Some(NavigationFlow::AuthFlow),
        SessionState::PendingVerification(_) => Some(NavigationFlow::VerificationFlow),
        SessionState::Authenticated(_, Role::Client) => Some(NavigationFlow::ClientFlow),
        SessionState::Authenticated(_, Role::Professional) => Some(NavigationFlow::ProfessionalFlow),
    }
}
