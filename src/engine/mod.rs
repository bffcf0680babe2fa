//! Turbo simulation engine: one generic state machine per button group, and
//! the per-channel state that ties the groups together.

pub mod channel;
pub mod turbo;

pub use channel::{ChannelState, ExtensionState, Notice};
pub use turbo::{ButtonBits, Step, TurboChange, TurboState};
