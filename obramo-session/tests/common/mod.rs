//! Shared fixtures: a scriptable identity provider and a profile store whose
//! reads stay pending until the test answers them.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot};

use obramo_session::identity::{IdentityProvider, ListenerId, Principal, PrincipalListener};
use obramo_session::profile::{ProfileStore, Role};
use obramo_session::{PrincipalId, Result, SessionError};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn verified(id: &str) -> Principal {
    Principal::new(id, format!("{id}@example.com"), true)
}

pub fn unverified(id: &str) -> Principal {
    Principal::new(id, format!("{id}@example.com"), false)
}

/// Document body as the sign-up screen writes it
pub fn profile_doc(name: &str, role: Role) -> Value {
    json!({
        "name": name,
        "email": format!("{}@example.com", name.to_lowercase()),
        "phone": "+55 11 90000-0000",
        "location": "São Paulo",
        "userType": role.document_value(),
        "createdAt": "2024-03-01T12:00:00Z",
    })
}

// ─── Identity ───

/// Provider whose current principal is set directly by the test
#[derive(Default)]
pub struct ScriptedIdentityProvider {
    current: Mutex<Option<Principal>>,
    listeners: Mutex<Vec<(ListenerId, PrincipalListener)>>,
    next_id: AtomicU64,
}

impl ScriptedIdentityProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set(&self, principal: Option<Principal>) {
        *self.current.lock() = principal.clone();
        let listeners: Vec<PrincipalListener> =
            self.listeners.lock().iter().map(|(_, l)| Arc::clone(l)).collect();
        for listener in listeners {
            listener(principal.clone());
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }
}

impl IdentityProvider for ScriptedIdentityProvider {
    fn subscribe(&self, listener: PrincipalListener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.listeners.lock().push((id, Arc::clone(&listener)));
        listener(self.current.lock().clone());
        id
    }

    fn unsubscribe(&self, id: ListenerId) {
        self.listeners.lock().retain(|(lid, _)| *lid != id);
    }
}

// ─── Profile store ───

/// A read waiting for the test to answer it
pub struct GatedRead {
    pub principal_id: PrincipalId,
    reply: oneshot::Sender<Result<Option<Value>>>,
}

impl GatedRead {
    pub fn found(self, document: Value) {
        let _ = self.reply.send(Ok(Some(document)));
    }

    pub fn not_found(self) {
        let _ = self.reply.send(Ok(None));
    }

    pub fn fail(self, message: &str) {
        let _ = self.reply.send(Err(SessionError::StoreUnavailable(message.into())));
    }
}

/// Store that forwards every read to the test and waits for its answer
pub struct GatedProfileStore {
    reads: mpsc::UnboundedSender<GatedRead>,
}

impl GatedProfileStore {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<GatedRead>) {
        let (reads, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { reads }), rx)
    }
}

#[async_trait]
impl ProfileStore for GatedProfileStore {
    async fn get_document(&self, _collection: &str, id: &PrincipalId) -> Result<Option<Value>> {
        let (reply, rx) = oneshot::channel();
        self.reads
            .send(GatedRead {
                principal_id: id.clone(),
                reply,
            })
            .map_err(|_| SessionError::StoreUnavailable("test gate closed".into()))?;
        rx.await
            .map_err(|_| SessionError::StoreUnavailable("read abandoned".into()))?
    }

    async fn put_document(&self, _collection: &str, _id: &PrincipalId, _document: Value) -> Result<()> {
        Ok(())
    }
}
