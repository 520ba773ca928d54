//! SessionMachine — pure reducer from ordered inputs to `SessionState`
//!
//! The machine performs no I/O. Each call to [`SessionMachine::apply`]
//! returns the commands (fetches, timers) the driver must execute; their
//! completions come back as further inputs.
//!
//! Every fetch carries a [`FetchTicket`] naming the principal and the
//! resolution cycle it was issued for. A completion is applied only when
//! its ticket is exactly the one currently awaited; anything else is a
//! stale result and is dropped without touching state.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::{RetryPolicy, SessionConfig};
use crate::identity::{Principal, PrincipalEvent, PrincipalId};
use crate::profile::ProfileRecord;
use crate::routing::select_flow;

use super::state::{SessionIssue, SessionSnapshot, SessionState};

/// Tag attached to every profile fetch
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchTicket {
    pub principal_id: PrincipalId,
    /// Resolution cycle; bumped on every identity change that restarts resolution
    pub cycle: u64,
    /// 1-based attempt within the cycle
    pub attempt: u32,
}

/// Settled profile fetch, as reported back to the machine
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Found(ProfileRecord),
    NotFound,
    Failed { message: String, retryable: bool },
}

/// Everything that can move the machine
#[derive(Debug, Clone, PartialEq)]
pub enum SessionInput {
    Identity(PrincipalEvent),
    FetchSettled { ticket: FetchTicket, outcome: FetchOutcome },
    /// Backoff delay for `ticket` elapsed
    RetryDue { ticket: FetchTicket },
    /// Resolve timer `timer` elapsed
    ResolveTimedOut { timer: u64 },
    /// User asked to retry from the loading screen
    RetryRequested,
}

/// Work the driver must carry out on the machine's behalf
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Fetch(FetchTicket),
    ScheduleRetry { ticket: FetchTicket, delay: Duration },
    ArmResolveTimer { timer: u64, after: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchPhase {
    InFlight,
    AwaitingRetry,
    /// Automatic retries used up; waits for `RetryRequested`
    Exhausted,
}

#[derive(Debug, Clone)]
struct PendingFetch {
    ticket: FetchTicket,
    phase: FetchPhase,
}

/// Session resolution state machine
#[derive(Debug, Clone)]
pub struct SessionMachine {
    retry: RetryPolicy,
    resolve_timeout: Duration,
    state: SessionState,
    principal: Option<Principal>,
    profile: Option<ProfileRecord>,
    pending: Option<PendingFetch>,
    issue: Option<SessionIssue>,
    retry_available: bool,
    cycle: u64,
    timer: u64,
    revision: u64,
}

impl SessionMachine {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            retry: config.retry.clone(),
            resolve_timeout: config.resolve_timeout,
            state: SessionState::Resolving,
            principal: None,
            profile: None,
            pending: None,
            issue: None,
            retry_available: false,
            cycle: 0,
            timer: 0,
            revision: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Latest principal reported by the identity stream
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Ticket of the fetch currently awaited, if one is in flight
    pub fn in_flight(&self) -> Option<&FetchTicket> {
        self.pending
            .as_ref()
            .filter(|p| p.phase == FetchPhase::InFlight)
            .map(|p| &p.ticket)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state.clone(),
            flow: select_flow(&self.state),
            profile: self.profile.clone(),
            issue: self.issue.clone(),
            retry_available: self.retry_available,
            revision: self.revision,
        }
    }

    /// Apply one input and return the commands it produced
    pub fn apply(&mut self, input: SessionInput) -> Vec<SessionCommand> {
        let before = self.observable();
        let previous = self.state.name();

        let commands = match input {
            SessionInput::Identity(PrincipalEvent::SignedOut) => self.on_signed_out(),
            SessionInput::Identity(PrincipalEvent::SignedIn(principal)) => self.on_signed_in(principal),
            SessionInput::FetchSettled { ticket, outcome } => self.on_fetch_settled(ticket, outcome),
            SessionInput::RetryDue { ticket } => self.on_retry_due(ticket),
            SessionInput::ResolveTimedOut { timer } => self.on_resolve_timed_out(timer),
            SessionInput::RetryRequested => self.on_retry_requested(),
        };

        if self.observable() != before {
            self.revision += 1;
            if self.state.name() != previous {
                info!(from = previous, to = %self.state, revision = self.revision, "Session transition");
            }
        }
        commands
    }

    // ─── Input Handlers ───

    fn on_signed_out(&mut self) -> Vec<SessionCommand> {
        self.cycle += 1;
        if let Some(pending) = self.pending.take() {
            debug!(principal_id = %pending.ticket.principal_id, "Pending profile fetch abandoned on sign-out");
        }
        self.principal = None;
        self.clear_resolution();
        self.state = SessionState::Unauthenticated;
        Vec::new()
    }

    fn on_signed_in(&mut self, principal: Principal) -> Vec<SessionCommand> {
        let same_principal = self
            .principal
            .as_ref()
            .is_some_and(|current| current.id == principal.id);

        if !same_principal {
            self.cycle += 1;
            self.pending = None;
            self.clear_resolution();
        }
        self.principal = Some(principal.clone());

        if !principal.email_verified {
            if self.pending.take().is_some() {
                self.cycle += 1;
            }
            self.clear_resolution();
            self.state = SessionState::PendingVerification(principal);
            return Vec::new();
        }

        if same_principal {
            if let SessionState::Authenticated(_, role) = self.state {
                // Refresh principal fields; the role is cached for the session
                self.state = SessionState::Authenticated(principal, role);
                return Vec::new();
            }
            // A fetch still in progress covers this report; an exhausted one
            // is restarted by the fresh sign-in
            if self
                .pending
                .as_ref()
                .is_some_and(|p| p.phase != FetchPhase::Exhausted)
            {
                return Vec::new();
            }
        }

        self.begin_resolution(principal.id)
    }

    fn on_fetch_settled(&mut self, ticket: FetchTicket, outcome: FetchOutcome) -> Vec<SessionCommand> {
        if self.in_flight() != Some(&ticket) {
            debug!(
                principal_id = %ticket.principal_id,
                cycle = ticket.cycle,
                attempt = ticket.attempt,
                "Discarding stale profile fetch"
            );
            return Vec::new();
        }
        let Some(principal) = self.principal.clone() else {
            self.pending = None;
            return Vec::new();
        };

        match outcome {
            FetchOutcome::Found(record) => {
                self.pending = None;
                self.issue = None;
                self.retry_available = false;
                self.state = SessionState::Authenticated(principal, record.role);
                self.profile = Some(record);
                Vec::new()
            }
            FetchOutcome::NotFound => {
                warn!(principal_id = %principal.id, "Verified principal has no profile, falling back to sign-in");
                self.pending = None;
                self.profile = None;
                self.retry_available = false;
                self.issue = Some(SessionIssue::ProfileMissing {
                    principal_id: principal.id,
                });
                self.state = SessionState::Unauthenticated;
                Vec::new()
            }
            FetchOutcome::Failed { message, retryable } => {
                let failures = ticket.attempt;
                warn!(
                    principal_id = %ticket.principal_id,
                    attempt = failures,
                    retryable,
                    error = %message,
                    "Profile fetch failed"
                );
                self.issue = Some(SessionIssue::FetchFailed {
                    principal_id: ticket.principal_id.clone(),
                    message,
                    attempts: failures,
                });
                let next = FetchTicket {
                    attempt: failures + 1,
                    ..ticket
                };

                if retryable && self.retry.allows_retry(failures) {
                    let delay = self.retry.delay_for(failures);
                    debug!(attempt = next.attempt, delay_ms = delay.as_millis() as u64, "Scheduling profile retry");
                    self.pending = Some(PendingFetch {
                        ticket: next.clone(),
                        phase: FetchPhase::AwaitingRetry,
                    });
                    vec![SessionCommand::ScheduleRetry { ticket: next, delay }]
                } else {
                    self.pending = Some(PendingFetch {
                        ticket: next,
                        phase: FetchPhase::Exhausted,
                    });
                    self.retry_available = true;
                    Vec::new()
                }
            }
        }
    }

    fn on_retry_due(&mut self, ticket: FetchTicket) -> Vec<SessionCommand> {
        match self.pending.as_mut() {
            Some(pending) if pending.phase == FetchPhase::AwaitingRetry && pending.ticket == ticket => {
                pending.phase = FetchPhase::InFlight;
                vec![SessionCommand::Fetch(ticket)]
            }
            _ => {
                debug!(principal_id = %ticket.principal_id, attempt = ticket.attempt, "Dropping stale retry timer");
                Vec::new()
            }
        }
    }

    fn on_resolve_timed_out(&mut self, timer: u64) -> Vec<SessionCommand> {
        if timer == self.timer && self.state.is_resolving() && self.pending.is_some() {
            warn!(timeout_ms = self.resolve_timeout.as_millis() as u64, "Session still resolving, offering retry");
            self.retry_available = true;
        }
        Vec::new()
    }

    fn on_retry_requested(&mut self) -> Vec<SessionCommand> {
        let Some(pending) = self.pending.as_mut() else {
            debug!("Retry requested with nothing to resolve");
            return Vec::new();
        };

        let ticket = match pending.phase {
            FetchPhase::InFlight => FetchTicket {
                attempt: pending.ticket.attempt + 1,
                ..pending.ticket.clone()
            },
            FetchPhase::AwaitingRetry | FetchPhase::Exhausted => pending.ticket.clone(),
        };
        pending.ticket = ticket.clone();
        pending.phase = FetchPhase::InFlight;

        info!(principal_id = %ticket.principal_id, attempt = ticket.attempt, "Manual profile retry");
        self.retry_available = false;
        vec![SessionCommand::Fetch(ticket), self.arm_resolve_timer()]
    }

    // ─── Helpers ───

    fn begin_resolution(&mut self, principal_id: PrincipalId) -> Vec<SessionCommand> {
        self.cycle += 1;
        let ticket = FetchTicket {
            principal_id,
            cycle: self.cycle,
            attempt: 1,
        };
        debug!(principal_id = %ticket.principal_id, cycle = ticket.cycle, "Resolving profile");

        self.pending = Some(PendingFetch {
            ticket: ticket.clone(),
            phase: FetchPhase::InFlight,
        });
        self.clear_resolution();
        self.state = SessionState::Resolving;
        vec![SessionCommand::Fetch(ticket), self.arm_resolve_timer()]
    }

    fn arm_resolve_timer(&mut self) -> SessionCommand {
        self.timer += 1;
        SessionCommand::ArmResolveTimer {
            timer: self.timer,
            after: self.resolve_timeout,
        }
    }

    fn clear_resolution(&mut self) {
        self.profile = None;
        self.issue = None;
        self.retry_available = false;
    }

    fn observable(&self) -> (SessionState, Option<SessionIssue>, bool, Option<ProfileRecord>) {
        (
            self.state.clone(),
            self.issue.clone(),
            self.retry_available,
            self.profile.clone(),
        )
    }
}
