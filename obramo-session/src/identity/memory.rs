//! In-memory identity provider
//!
//! Reference implementation of the provider boundary plus the account
//! operations screens call directly (sign-up, sign-in, sign-out,
//! verification email, reload). Every operation reports back through the
//! registered listeners; none of them touch session state.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use parking_lot::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Result, SessionError};

use super::channel::{IdentityProvider, ListenerId, PrincipalListener};
use super::types::{Principal, PrincipalId};

const MIN_PASSWORD_LEN: usize = 6;

struct Account {
    principal: Principal,
    password_hash: String,
    verification_emails: usize,
}

#[derive(Default)]
struct ProviderState {
    /// Keyed by lowercased email
    accounts: HashMap<String, Account>,
    /// Principal as last reported to listeners; may lag behind `accounts`
    /// until `reload_principal` is called.
    current: Option<Principal>,
    listeners: Vec<(ListenerId, PrincipalListener)>,
}

/// Identity provider backed by process memory
///
/// Listeners are called with `delivery` held, so reports reach every
/// listener in the order the state changed. A listener must not call back
/// into the provider.
#[derive(Default)]
pub struct InMemoryIdentityProvider {
    state: Mutex<ProviderState>,
    delivery: Mutex<()>,
    next_listener: AtomicU64,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Create an account and sign it in, unverified
    pub fn sign_up(&self, email: &str, password: &str) -> Result<Principal> {
        if !email.contains('@') {
            return Err(SessionError::InvalidEmail(email.to_string()));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(SessionError::PasswordTooWeak(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let key = email.to_lowercase();
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| SessionError::Internal(e.to_string()))?
            .to_string();

        let principal = Principal::new(Uuid::new_v4().to_string(), email, false);
        {
            let mut state = self.state.lock();
            if state.accounts.contains_key(&key) {
                return Err(SessionError::AccountAlreadyExists(email.to_string()));
            }
            state.accounts.insert(
                key,
                Account {
                    principal: principal.clone(),
                    password_hash,
                    verification_emails: 0,
                },
            );
            state.current = Some(principal.clone());
        }

        info!(principal_id = %principal.id, "Account created");
        self.notify();
        Ok(principal)
    }

    pub fn sign_in(&self, email: &str, password: &str) -> Result<Principal> {
        let principal = {
            let mut state = self.state.lock();
            let account = state
                .accounts
                .get(&email.to_lowercase())
                .ok_or(SessionError::InvalidCredentials)?;

            let parsed = PasswordHash::new(&account.password_hash)
                .map_err(|e| SessionError::Internal(e.to_string()))?;
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .map_err(|_| SessionError::InvalidCredentials)?;

            let principal = account.principal.clone();
            state.current = Some(principal.clone());
            principal
        };

        info!(principal_id = %principal.id, "Signed in");
        self.notify();
        Ok(principal)
    }

    pub fn sign_out(&self) {
        let previous = self.state.lock().current.take();
        if let Some(principal) = previous {
            info!(principal_id = %principal.id, "Signed out");
            self.notify();
        }
    }

    /// Send (record) a verification email for the current principal
    pub fn send_verification_email(&self) -> Result<()> {
        let mut state = self.state.lock();
        let current = state.current.clone().ok_or(SessionError::NotSignedIn)?;
        let account = state
            .accounts
            .get_mut(&current.email.to_lowercase())
            .ok_or_else(|| SessionError::PrincipalNotFound(current.id.to_string()))?;
        account.verification_emails += 1;
        info!(principal_id = %current.id, sent = account.verification_emails, "Verification email sent");
        Ok(())
    }

    /// Mark an account's email as verified, as following the emailed link would.
    ///
    /// Like the hosted provider, listeners are not told until the signed-in
    /// client calls [`Self::reload_principal`].
    pub fn confirm_email(&self, id: &PrincipalId) -> Result<()> {
        let mut state = self.state.lock();
        let account = state
            .accounts
            .values_mut()
            .find(|a| &a.principal.id == id)
            .ok_or_else(|| SessionError::PrincipalNotFound(id.to_string()))?;
        account.principal.email_verified = true;
        debug!(principal_id = %id, "Email confirmed");
        Ok(())
    }

    /// Re-read the current principal from the account table
    pub fn reload_principal(&self) -> Result<Principal> {
        let (fresh, changed) = {
            let mut state = self.state.lock();
            let current = state.current.clone().ok_or(SessionError::NotSignedIn)?;
            let fresh = state
                .accounts
                .get(&current.email.to_lowercase())
                .map(|a| a.principal.clone())
                .ok_or_else(|| SessionError::PrincipalNotFound(current.id.to_string()))?;
            let changed = fresh != current;
            state.current = Some(fresh.clone());
            (fresh, changed)
        };

        if changed {
            info!(principal_id = %fresh.id, verified = fresh.email_verified, "Principal reloaded");
            self.notify();
        }
        Ok(fresh)
    }

    pub fn current_principal(&self) -> Option<Principal> {
        self.state.lock().current.clone()
    }

    pub fn verification_emails_sent(&self, id: &PrincipalId) -> usize {
        self.state
            .lock()
            .accounts
            .values()
            .find(|a| &a.principal.id == id)
            .map(|a| a.verification_emails)
            .unwrap_or(0)
    }

    pub fn listener_count(&self) -> usize {
        self.state.lock().listeners.len()
    }

    fn notify(&self) {
        let _delivery = self.delivery.lock();
        let (current, listeners) = {
            let state = self.state.lock();
            let listeners: Vec<PrincipalListener> =
                state.listeners.iter().map(|(_, l)| Arc::clone(l)).collect();
            (state.current.clone(), listeners)
        };
        for listener in listeners {
            listener(current.clone());
        }
    }
}

impl IdentityProvider for InMemoryIdentityProvider {
    fn subscribe(&self, listener: PrincipalListener) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::SeqCst));
        let _delivery = self.delivery.lock();
        let current = {
            let mut state = self.state.lock();
            state.listeners.push((id, Arc::clone(&listener)));
            state.current.clone()
        };
        listener(current);
        id
    }

    fn unsubscribe(&self, id: ListenerId) {
        self.state.lock().listeners.retain(|(lid, _)| *lid != id);
    }
}
