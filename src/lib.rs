//! Turbo-button poll interceptor for the Wii U GamePad (VPAD) and the Wii
//! Remote family (WPAD).
//!
//! The interceptors wrap the real poll calls: they always read the hardware
//! first, then rewrite the returned button words so that buttons with turbo
//! armed toggle on and off while held. A configurable button chord puts a
//! channel into assignment mode, where the next pressed button has its turbo
//! flag flipped.

pub mod buttons;
pub mod combo;
pub mod config;
pub mod edge;
pub mod engine;
pub mod error;
pub mod notify;
pub mod pad;
pub mod plugin;
pub mod replay;

pub use combo::Combo;
pub use config::{SharedConfig, TurboConfig};
pub use error::{ConfigError, NotifyError, TurboError};
pub use plugin::Plugin;
