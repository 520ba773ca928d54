//! IdentityChannel — normalized view over the provider's principal stream
//!
//! The provider reports `Option<Principal>` through a registered listener.
//! `IdentityChannel::subscribe` registers exactly one listener, forwards
//! every report as a `PrincipalEvent` into an unbounded queue, and releases
//! the listener when the channel is dropped or explicitly unsubscribed.
//! Repeated reports are forwarded too: a second sign-in as the same
//! principal is a real event and the session machine decides what it means.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use super::types::{Principal, PrincipalEvent};

/// Callback invoked by a provider with the current principal (or `None`)
pub type PrincipalListener = Arc<dyn Fn(Option<Principal>) + Send + Sync>;

/// Registration token returned by [`IdentityProvider::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Boundary to the external identity provider
pub trait IdentityProvider: Send + Sync {
    /// Register `listener`.
    ///
    /// Implementations must invoke the listener with the current principal
    /// before returning, and again on every later change.
    fn subscribe(&self, listener: PrincipalListener) -> ListenerId;

    /// Remove a listener previously registered with `subscribe`.
    fn unsubscribe(&self, id: ListenerId);
}

/// Live subscription to an identity provider
pub struct IdentityChannel {
    events: mpsc::UnboundedReceiver<PrincipalEvent>,
    provider: Arc<dyn IdentityProvider>,
    listener: Option<ListenerId>,
}

impl IdentityChannel {
    /// Subscribe to `provider`.
    ///
    /// The provider's replay of the current status is already queued when
    /// this returns.
    pub fn subscribe(provider: Arc<dyn IdentityProvider>) -> Self {
        let (tx, events) = mpsc::unbounded_channel();

        let listener: PrincipalListener = Arc::new(move |current: Option<Principal>| {
            if tx.send(PrincipalEvent::from(current)).is_err() {
                debug!("Identity report dropped, channel closed");
            }
        });

        let id = provider.subscribe(listener);
        info!(listener = id.0, "Identity listener registered");

        Self {
            events,
            provider,
            listener: Some(id),
        }
    }

    /// Wait for the next event. `None` once the provider stopped reporting.
    pub async fn next_event(&mut self) -> Option<PrincipalEvent> {
        self.events.recv().await
    }

    /// Take an already-queued event without waiting
    pub fn try_next_event(&mut self) -> Option<PrincipalEvent> {
        self.events.try_recv().ok()
    }

    pub fn is_subscribed(&self) -> bool {
        self.listener.is_some()
    }

    /// Release the provider listener now
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(id) = self.listener.take() {
            self.provider.unsubscribe(id);
            self.events.close();
            info!(listener = id.0, "Identity listener released");
        }
    }
}

impl Drop for IdentityChannel {
    fn drop(&mut self) {
        self.release();
    }
}
