//! Screen trees mounted for each flow

use super::route::NavigationFlow;

/// Static description of the navigator mounted for a flow
///
/// `tabs` form the bottom tab bar (empty for plain stacks); `stack` holds
/// the screens pushed on top of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenTree {
    pub flow: NavigationFlow,
    pub initial_route: &'static str,
    pub tabs: &'static [&'static str],
    pub stack: &'static [&'static str],
}

const AUTH: ScreenTree = ScreenTree {
    flow: NavigationFlow::AuthFlow,
    initial_route: "Welcome",
    tabs: &[],
    stack: &["Welcome", "Login", "SignUp"],
};

const VERIFICATION: ScreenTree = ScreenTree {
    flow: NavigationFlow::VerificationFlow,
    initial_route: "VerifyEmail",
    tabs: &[],
    stack: &["VerifyEmail"],
};

const CLIENT: ScreenTree = ScreenTree {
    flow: NavigationFlow::ClientFlow,
    initial_route: "Home",
    tabs: &["Home", "Projects", "Messages", "Profile"],
    stack: &[
        "CreateProject",
        "FindProfessionals",
        "ProfessionalProfile",
        "Chat",
        "Payments",
        "PayProject",
        "SelectPaymentMethod",
        "AddCard",
        "Invoice",
        "PendingReviews",
        "Review",
    ],
};

const PROFESSIONAL: ScreenTree = ScreenTree {
    flow: NavigationFlow::ProfessionalFlow,
    initial_route: "Home",
    tabs: &["Home", "Proposals", "Messages", "Profile"],
    stack: &["PostService", "CompletedProjects", "Earnings", "MyReviews", "Chat"],
};

impl ScreenTree {
    pub fn for_flow(flow: NavigationFlow) -> Self {
        match flow {
            NavigationFlow::AuthFlow => AUTH,
            NavigationFlow::VerificationFlow => VERIFICATION,
            NavigationFlow::ClientFlow => CLIENT,
            NavigationFlow::ProfessionalFlow => PROFESSIONAL,
        }
    }

    /// Every route name, tabs first
    pub fn routes(&self) -> impl Iterator<Item = &'static str> {
        let (tabs, stack) = (self.tabs, self.stack);
        tabs.iter().chain(stack.iter()).copied()
    }

    pub fn contains(&self, route: &str) -> bool {
        self.routes().any(|r| r == route)
    }
}
