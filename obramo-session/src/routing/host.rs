//! NavigationHost — mounts the flow selected for each session snapshot
//!
//! The host owns the session actor, and with it the single identity
//! subscription, for its whole lifetime. It keeps no session state of its
//! own: it compares the flow in each published snapshot against what is
//! mounted and remounts on change. A remount always starts from a fresh
//! screen tree; nothing from the previous flow survives.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::identity::{IdentityProvider, PrincipalId};
use crate::profile::ProfileResolver;
use crate::session::{SessionActor, SessionHandle, SessionSnapshot};

use super::route::NavigationFlow;
use super::screens::ScreenTree;

/// Boundary to the UI navigation framework
pub trait Navigator: Send + 'static {
    /// Replace whatever is mounted with `tree`, starting at its initial route
    fn mount(&mut self, tree: &ScreenTree);

    /// Replace whatever is mounted with the neutral loading indicator
    fn show_loading(&mut self, retry_available: bool);
}

/// What a [`RecordingNavigator`] was asked to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigatorAction {
    Mounted(NavigationFlow),
    Loading { retry_available: bool },
}

/// Navigator that records every call; useful headless and in tests
#[derive(Debug, Clone, Default)]
pub struct RecordingNavigator {
    actions: Arc<Mutex<Vec<NavigatorAction>>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actions(&self) -> Vec<NavigatorAction> {
        self.actions.lock().clone()
    }

    /// Flow most recently mounted, unless loading replaced it
    pub fn mounted(&self) -> Option<NavigationFlow> {
        match self.actions.lock().last() {
            Some(NavigatorAction::Mounted(flow)) => Some(*flow),
            _ => None,
        }
    }
}

impl Navigator for RecordingNavigator {
    fn mount(&mut self, tree: &ScreenTree) {
        self.actions.lock().push(NavigatorAction::Mounted(tree.flow));
    }

    fn show_loading(&mut self, retry_available: bool) {
        self.actions
            .lock()
            .push(NavigatorAction::Loading { retry_available });
    }
}

/// Tracks what is on screen so the navigator is only called on change
///
/// A mounted tree belongs to one principal: a different principal in the
/// same flow gets a fresh tree.
#[derive(Debug, Default)]
struct Mounted {
    flow: Option<NavigationFlow>,
    principal: Option<PrincipalId>,
    loading: Option<bool>,
}

impl Mounted {
    fn sync<N: Navigator>(&mut self, navigator: &mut N, snapshot: &SessionSnapshot) {
        let principal = snapshot.state.principal().map(|p| p.id.clone());
        match snapshot.flow {
            Some(flow) if self.flow == Some(flow) && self.principal == principal => {}
            Some(flow) => {
                navigator.mount(&ScreenTree::for_flow(flow));
                info!(flow = %flow, revision = snapshot.revision, "Navigation flow mounted");
                self.flow = Some(flow);
                self.principal = principal;
                self.loading = None;
            }
            None => {
                if self.loading != Some(snapshot.retry_available) {
                    navigator.show_loading(snapshot.retry_available);
                    debug!(retry_available = snapshot.retry_available, "Loading indicator shown");
                    self.flow = None;
                    self.principal = None;
                    self.loading = Some(snapshot.retry_available);
                }
            }
        }
    }
}

/// Top-level host: session actor plus the task keeping the navigator in sync
pub struct NavigationHost {
    session: SessionHandle,
    current: watch::Receiver<Option<NavigationFlow>>,
    driver: JoinHandle<()>,
}

impl NavigationHost {
    /// Start the session actor and begin following it with `navigator`
    pub async fn start<N: Navigator>(
        provider: Arc<dyn IdentityProvider>,
        resolver: ProfileResolver,
        mut navigator: N,
        config: SessionConfig,
    ) -> Result<Self> {
        let session = SessionActor::spawn(provider, resolver, config).await?;
        let mut snapshots = session.subscribe();
        let (current_tx, current) = watch::channel(None);

        let driver = tokio::spawn(async move {
            let mut mounted = Mounted::default();
            loop {
                let snapshot = snapshots.borrow_and_update().clone();
                mounted.sync(&mut navigator, &snapshot);
                current_tx.send_replace(mounted.flow);
                if snapshots.changed().await.is_err() {
                    break;
                }
            }
            debug!("Navigation driver stopped");
        });

        info!("NavigationHost started");
        Ok(Self {
            session,
            current,
            driver,
        })
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Flow currently mounted; `None` while the loading indicator is shown
    pub fn current_flow(&self) -> Option<NavigationFlow> {
        *self.current.borrow()
    }

    /// Wait until the mounted flow equals `flow`
    pub async fn wait_for_flow(&self, flow: Option<NavigationFlow>) -> Result<()> {
        let mut current = self.current.clone();
        current
            .wait_for(|mounted| *mounted == flow)
            .await
            .map_err(|_| SessionError::ActorUnavailable("NavigationHost".into()))?;
        Ok(())
    }

    /// Stop the session actor, release the identity subscription and wait
    /// for the navigation driver to finish
    pub async fn shutdown(self) -> Result<()> {
        self.session.shutdown().await?;
        if let Err(e) = self.driver.await {
            warn!(error = ?e, "Navigation driver failed");
        }
        info!("NavigationHost stopped");
        Ok(())
    }
}
