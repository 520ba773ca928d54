//! SessionActor — Tokio actor driving the session machine
//!
//! The actor is the single owner of `SessionMachine`. Identity events,
//! fetch completions, timers and handle requests are all processed
//! sequentially in its loop, so the state itself needs no locking. Fetches
//! and timers run as child tasks and report back through an internal queue;
//! the machine decides whether their results are still current.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use obramo_session::identity::InMemoryIdentityProvider;
//! use obramo_session::profile::{InMemoryProfileStore, ProfileResolver};
//! use obramo_session::session::SessionActor;
//! use obramo_session::SessionConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let identity = InMemoryIdentityProvider::new();
//!     let resolver = ProfileResolver::new(Arc::new(InMemoryProfileStore::new()));
//!
//!     let handle = SessionActor::spawn(identity.clone(), resolver, SessionConfig::new()).await?;
//!
//!     // Screens talk to the provider; the session follows on its own
//!     identity.sign_up("ana@example.com", "secret1")?;
//!     let snapshot = handle.wait_for(|s| !s.state.is_resolving()).await?;
//!     println!("{} -> {:?}", snapshot.state, snapshot.flow);
//!
//!     handle.shutdown().await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::identity::{IdentityChannel, IdentityProvider};
use crate::profile::{ProfileLookup, ProfileResolver};

use super::machine::{FetchOutcome, FetchTicket, SessionCommand, SessionInput, SessionMachine};
use super::state::SessionSnapshot;

// ─── Actor Messages ───

enum SessionMsg {
    Retry,
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

// ─── Actor ───

/// Session actor — owns the machine and the identity subscription
pub struct SessionActor {
    machine: SessionMachine,
    identity: IdentityChannel,
    resolver: ProfileResolver,
    rx: mpsc::Receiver<SessionMsg>,
    inputs_tx: mpsc::UnboundedSender<SessionInput>,
    inputs_rx: mpsc::UnboundedReceiver<SessionInput>,
    snapshots: watch::Sender<SessionSnapshot>,
    tasks: JoinSet<()>,
}

impl SessionActor {
    /// Subscribe to `provider` and spawn the actor.
    ///
    /// The identity subscription lives exactly as long as the actor: it is
    /// released when the actor stops, whether through `shutdown` or because
    /// every handle was dropped.
    pub async fn spawn(
        provider: Arc<dyn IdentityProvider>,
        resolver: ProfileResolver,
        config: SessionConfig,
    ) -> Result<SessionHandle> {
        config.validate()?;

        let machine = SessionMachine::new(&config);
        let (snapshots, snapshot_rx) = watch::channel(machine.snapshot());
        let (tx, rx) = mpsc::channel(config.mailbox_capacity);
        let (inputs_tx, inputs_rx) = mpsc::unbounded_channel();
        let identity = IdentityChannel::subscribe(provider);

        let actor = Self {
            machine,
            identity,
            resolver,
            rx,
            inputs_tx,
            inputs_rx,
            snapshots,
            tasks: JoinSet::new(),
        };

        tokio::spawn(actor.run());
        info!("SessionActor spawned");
        Ok(SessionHandle {
            tx,
            snapshots: snapshot_rx,
        })
    }

    /// Main event loop
    async fn run(mut self) {
        let mut identity_open = true;
        let mut shutdown_reply = None;

        loop {
            tokio::select! {
                msg = self.rx.recv() => match msg {
                    Some(SessionMsg::Retry) => self.dispatch(SessionInput::RetryRequested),
                    Some(SessionMsg::Snapshot { reply }) => {
                        let _ = reply.send(self.machine.snapshot());
                    }
                    Some(SessionMsg::Shutdown { reply }) => {
                        shutdown_reply = Some(reply);
                        break;
                    }
                    None => break,
                },
                event = self.identity.next_event(), if identity_open => match event {
                    Some(event) => self.dispatch(SessionInput::Identity(event)),
                    None => {
                        warn!("Identity stream ended");
                        identity_open = false;
                    }
                },
                Some(input) = self.inputs_rx.recv() => self.dispatch(input),
                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            warn!(error = ?e, "Session task panicked");
                        }
                    }
                }
            }
        }

        self.rx.close();
        self.tasks.abort_all();
        self.identity.unsubscribe();
        info!("SessionActor stopped");
        if let Some(reply) = shutdown_reply {
            let _ = reply.send(());
        }
    }

    // ─── Handler Implementations ───

    fn dispatch(&mut self, input: SessionInput) {
        let revision = self.machine.revision();
        for command in self.machine.apply(input) {
            self.execute(command);
        }
        if self.machine.revision() != revision {
            self.snapshots.send_replace(self.machine.snapshot());
        }
    }

    fn execute(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Fetch(ticket) => {
                let resolver = self.resolver.clone();
                let inputs = self.inputs_tx.clone();
                debug!(principal_id = %ticket.principal_id, attempt = ticket.attempt, "Profile fetch issued");
                self.tasks.spawn(async move {
                    let outcome = fetch_outcome(&resolver, &ticket).await;
                    let _ = inputs.send(SessionInput::FetchSettled { ticket, outcome });
                });
            }
            SessionCommand::ScheduleRetry { ticket, delay } => {
                let inputs = self.inputs_tx.clone();
                self.tasks.spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = inputs.send(SessionInput::RetryDue { ticket });
                });
            }
            SessionCommand::ArmResolveTimer { timer, after } => {
                let inputs = self.inputs_tx.clone();
                self.tasks.spawn(async move {
                    tokio::time::sleep(after).await;
                    let _ = inputs.send(SessionInput::ResolveTimedOut { timer });
                });
            }
        }
    }
}

async fn fetch_outcome(resolver: &ProfileResolver, ticket: &FetchTicket) -> FetchOutcome {
    match resolver.resolve(&ticket.principal_id).await {
        Ok(ProfileLookup::Found(record)) => FetchOutcome::Found(record),
        Ok(ProfileLookup::NotFound) => FetchOutcome::NotFound,
        Err(e) => FetchOutcome::Failed {
            retryable: e.is_retryable(),
            message: e.to_string(),
        },
    }
}

// ─── Handle (client-facing API) ───

/// Cloneable handle to the SessionActor
///
/// The actor stops once every handle is dropped.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionMsg>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    /// Latest published snapshot
    pub fn current(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified on every published change
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Snapshot taken inside the actor, after everything queued before it
    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SessionMsg::Snapshot { reply })
            .await
            .map_err(|_| SessionError::ActorUnavailable("SessionActor".into()))?;
        rx.await
            .map_err(|_| SessionError::ActorUnavailable("SessionActor dropped".into()))
    }

    /// Wait until a published snapshot satisfies `predicate`
    pub async fn wait_for<F>(&self, mut predicate: F) -> Result<SessionSnapshot>
    where
        F: FnMut(&SessionSnapshot) -> bool,
    {
        let mut rx = self.snapshots.clone();
        let snapshot = rx
            .wait_for(|s| predicate(s))
            .await
            .map_err(|_| SessionError::ActorUnavailable("SessionActor stopped".into()))?;
        Ok(snapshot.clone())
    }

    /// Ask for another profile fetch attempt for the current principal
    pub async fn retry(&self) -> Result<()> {
        self.tx
            .send(SessionMsg::Retry)
            .await
            .map_err(|_| SessionError::ActorUnavailable("SessionActor".into()))
    }

    /// Stop the actor and release the identity subscription
    pub async fn shutdown(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SessionMsg::Shutdown { reply })
            .await
            .map_err(|_| SessionError::ActorUnavailable("SessionActor".into()))?;
        rx.await
            .map_err(|_| SessionError::ActorUnavailable("SessionActor dropped".into()))
    }

    /// Whether the actor is still running
    pub fn is_running(&self) -> bool {
        !self.tx.is_closed()
    }
}
