//! Property tests for SessionMachine — the settled state depends only on
//! the latest identity report, whatever order fetches complete in.

use proptest::prelude::*;
use proptest::sample::Index;

use obramo_session::identity::{Principal, PrincipalEvent};
use obramo_session::profile::{NewProfile, Role};
use obramo_session::routing::select_flow;
use obramo_session::session::{
    FetchOutcome, FetchTicket, SessionCommand, SessionInput, SessionMachine, SessionState,
};
use obramo_session::SessionConfig;

const IDS: [&str; 3] = ["ana", "bia", "caio"];

#[derive(Debug, Clone)]
enum Step {
    SignIn { who: usize, verified: bool },
    SignOut,
    /// Complete one of the outstanding fetches
    Settle(Index),
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => (0..IDS.len(), any::<bool>()).prop_map(|(who, verified)| Step::SignIn { who, verified }),
        1 => Just(Step::SignOut),
        2 => any::<Index>().prop_map(Step::Settle),
    ]
}

fn principal(who: usize, verified: bool) -> Principal {
    Principal::new(IDS[who], format!("{}@example.com", IDS[who]), verified)
}

/// "caio" never finished sign-up
fn role_of(id: &str) -> Option<Role> {
    match id {
        "ana" => Some(Role::Client),
        "bia" => Some(Role::Professional),
        _ => None,
    }
}

fn outcome_for(ticket: &FetchTicket) -> FetchOutcome {
    let id = ticket.principal_id.as_str();
    match role_of(id) {
        Some(role) => FetchOutcome::Found(
            NewProfile::new(id, format!("{id}@example.com"), role).into_record(id.into()),
        ),
        None => FetchOutcome::NotFound,
    }
}

fn collect_fetches(commands: Vec<SessionCommand>, outstanding: &mut Vec<FetchTicket>) {
    for command in commands {
        if let SessionCommand::Fetch(ticket) = command {
            outstanding.push(ticket);
        }
    }
}

/// `None` when the provider never reported; `Some(None)` after a sign-out
fn expected_state(last: Option<Option<&Principal>>) -> SessionState {
    let Some(last) = last else {
        return SessionState::Resolving;
    };
    match last {
        None => SessionState::Unauthenticated,
        Some(p) if !p.email_verified => SessionState::PendingVerification(p.clone()),
        Some(p) => match role_of(p.id.as_str()) {
            Some(role) => SessionState::Authenticated(p.clone(), role),
            None => SessionState::Unauthenticated,
        },
    }
}

proptest! {
    #[test]
    fn settled_state_follows_last_report(steps in prop::collection::vec(step(), 1..40)) {
        let mut machine = SessionMachine::new(&SessionConfig::default());
        let mut outstanding: Vec<FetchTicket> = Vec::new();
        let mut last: Option<Option<Principal>> = None;
        let mut revision = machine.revision();

        for step in steps {
            let commands = match step {
                Step::SignIn { who, verified } => {
                    let p = principal(who, verified);
                    last = Some(Some(p.clone()));
                    machine.apply(SessionInput::Identity(PrincipalEvent::SignedIn(p)))
                }
                Step::SignOut => {
                    last = Some(None);
                    machine.apply(SessionInput::Identity(PrincipalEvent::SignedOut))
                }
                Step::Settle(index) => {
                    if outstanding.is_empty() {
                        continue;
                    }
                    let ticket = outstanding.remove(index.index(outstanding.len()));
                    let outcome = outcome_for(&ticket);
                    machine.apply(SessionInput::FetchSettled { ticket, outcome })
                }
            };
            collect_fetches(commands, &mut outstanding);

            let snapshot = machine.snapshot();
            prop_assert!(snapshot.revision >= revision);
            prop_assert_eq!(snapshot.flow, select_flow(&snapshot.state));
            revision = snapshot.revision;
        }

        // Drain the remaining fetches, oldest first
        while !outstanding.is_empty() {
            let ticket = outstanding.remove(0);
            let outcome = outcome_for(&ticket);
            let commands = machine.apply(SessionInput::FetchSettled { ticket, outcome });
            collect_fetches(commands, &mut outstanding);
        }

        prop_assert_eq!(machine.state(), &expected_state(last.as_ref().map(Option::as_ref)));
        prop_assert!(machine.in_flight().is_none());
    }

    #[test]
    fn sign_out_is_immediate(steps in prop::collection::vec(step(), 0..20)) {
        let mut machine = SessionMachine::new(&SessionConfig::default());
        let mut outstanding: Vec<FetchTicket> = Vec::new();

        for step in steps {
            let commands = match step {
                Step::SignIn { who, verified } => machine.apply(SessionInput::Identity(
                    PrincipalEvent::SignedIn(principal(who, verified)),
                )),
                Step::SignOut => machine.apply(SessionInput::Identity(PrincipalEvent::SignedOut)),
                Step::Settle(index) => {
                    if outstanding.is_empty() {
                        continue;
                    }
                    let ticket = outstanding.remove(index.index(outstanding.len()));
                    let outcome = outcome_for(&ticket);
                    machine.apply(SessionInput::FetchSettled { ticket, outcome })
                }
            };
            collect_fetches(commands, &mut outstanding);
        }

        let commands = machine.apply(SessionInput::Identity(PrincipalEvent::SignedOut));
        prop_assert!(commands.is_empty());
        prop_assert_eq!(machine.state(), &SessionState::Unauthenticated);

        // Nothing issued before the sign-out can bring a session back
        for ticket in outstanding {
            let outcome = outcome_for(&ticket);
            machine.apply(SessionInput::FetchSettled { ticket, outcome });
            prop_assert_eq!(machine.state(), &SessionState::Unauthenticated);
            prop_assert!(machine.snapshot().profile.is_none());
        }
    }
}
