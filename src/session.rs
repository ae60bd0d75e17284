//! Browser session state and turn-taking lifecycle
//!
//! The session is a plain value: handlers take it, apply one turn, and hand
//! it back. The lifecycle policy is pure over that value.

mod log;
mod policy;
mod state;


pub use policy::{LifecyclePolicy, TurnRejected};
pub use state::{Notice, Phase, Role, SessionState, Turn, FAREWELL_TEXT};
