//! Identity module — principal types and the provider subscription

pub mod types;
pub mod channel;

#[cfg(feature = "memory")]
pub mod memory;

pub use channel::{IdentityChannel, IdentityProvider, ListenerId, PrincipalListener};
pub use types::{Principal, PrincipalEvent, PrincipalId};

#[cfg(feature = "memory")]
pub use memory::InMemoryIdentityProvider;
