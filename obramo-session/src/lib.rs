//! # Obramo Session
//!
//! Session resolution and navigation routing for the Obramo marketplace
//! client: decides, from the identity provider's stream and the user's
//! profile document, which top-level flow the app shows.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐        ┌──────────────────┐
//! │ IdentityProvider │        │   ProfileStore   │
//! │ (sign-in, verify)│        │ (users/{uid} doc)│
//! └────────┬─────────┘        └────────┬─────────┘
//!          │ Option<Principal>         │ get_document
//! ┌────────▼─────────┐        ┌────────▼─────────┐
//! │ IdentityChannel  │        │ ProfileResolver  │
//! └────────┬─────────┘        └────────┬─────────┘
//!          │ PrincipalEvent            │ FetchOutcome (tagged)
//! ┌────────▼───────────────────────────▼─────────┐
//! │     SessionActor  ──owns──  SessionMachine    │
//! └────────────────────┬─────────────────────────┘
//!                      │ SessionSnapshot (watch)
//! ┌────────────────────▼─────────────────────────┐
//! │ select_flow ─► NavigationHost ─► Navigator   │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use obramo_session::identity::InMemoryIdentityProvider;
//! use obramo_session::profile::{InMemoryProfileStore, NewProfile, ProfileResolver, Role};
//! use obramo_session::routing::{NavigationFlow, NavigationHost, RecordingNavigator};
//! use obramo_session::SessionConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let identity = InMemoryIdentityProvider::new();
//!     let resolver = ProfileResolver::new(Arc::new(InMemoryProfileStore::new()));
//!     let navigator = RecordingNavigator::new();
//!
//!     let host = NavigationHost::start(
//!         identity.clone(), resolver.clone(), navigator.clone(), SessionConfig::new(),
//!     ).await?;
//!
//!     // Sign-up screen: account + profile document
//!     let principal = identity.sign_up("ana@example.com", "secret1")?;
//!     resolver
//!         .create_profile(&principal.id, NewProfile::new("Ana", "ana@example.com", Role::Client))
//!         .await?;
//!     host.wait_for_flow(Some(NavigationFlow::VerificationFlow)).await?;
//!
//!     // The user follows the emailed link, the verify screen reloads
//!     identity.confirm_email(&principal.id)?;
//!     identity.reload_principal()?;
//!     host.wait_for_flow(Some(NavigationFlow::ClientFlow)).await?;
//!
//!     host.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Guarantees
//!
//! - **One state**: `SessionState` is a single tagged union, never a set of
//!   independently settable flags
//! - **Stale results dropped**: every profile fetch is tagged with the
//!   principal and cycle it was issued for
//! - **Sign-out wins**: `SignedOut` yields `Unauthenticated` immediately
//! - **One listener**: the identity subscription lives exactly as long as
//!   the session actor
//! - **Railway Programming**: fallible operations return
//!   `Result<T, SessionError>`; fetch failures surface as a `SessionIssue`

pub mod config;
pub mod error;
pub mod identity;
pub mod profile;
pub mod routing;
pub mod session;

// Re-exports for convenience
pub use config::{RetryPolicy, SessionConfig};
pub use error::{Result, SessionError};
pub use identity::{IdentityChannel, IdentityProvider, Principal, PrincipalEvent, PrincipalId};
pub use profile::{ProfileLookup, ProfileRecord, ProfileResolver, ProfileStore, Role};
pub use routing::{select_flow, NavigationFlow, NavigationHost, Navigator, ScreenTree};
pub use session::{SessionActor, SessionHandle, SessionIssue, SessionSnapshot, SessionState};

#[cfg(feature = "memory")]
pub use identity::InMemoryIdentityProvider;

#[cfg(feature = "memory")]
pub use profile::InMemoryProfileStore;
