//! Profile module — profile documents and their resolution

pub mod types;
pub mod store;
pub mod resolver;

#[cfg(feature = "memory")]
pub mod memory;

pub use resolver::{ProfileLookup, ProfileResolver};
pub use store::{ProfileStore, PROFILES_COLLECTION};
pub use types::{NewProfile, ProfileRecord, Role};

#[cfg(feature = "memory")]
pub use memory::InMemoryProfileStore;
