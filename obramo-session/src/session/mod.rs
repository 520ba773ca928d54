//! Session module — the state machine and the actor that drives it

pub mod state;
pub mod machine;
pub mod actor;

pub use actor::{SessionActor, SessionHandle};
pub use machine::{FetchOutcome, FetchTicket, SessionCommand, SessionInput, SessionMachine};
pub use state::{SessionIssue, SessionSnapshot, SessionState};
