//! User-visible notifications.
//!
//! Delivery is best effort: a failing sink is logged and otherwise ignored,
//! it never reaches the poll path.

use std::sync::{Mutex, PoisonError};

use tracing::{info, warn};

use crate::buttons::Button;
use crate::error::NotifyError;

pub const PREFIX: &str = concat!("[", env!("CARGO_PKG_NAME"), "] ");

/// Sink for short on-screen style messages.
pub trait Notifier: Send + Sync {
    fn info(&self, message: &str) -> Result<(), NotifyError>;
}

/// Send a message, logging (never propagating) delivery failures.
pub fn send(notifier: &dyn Notifier, message: &str) {
    if let Err(e) = notifier.info(message) {
        warn!("[NOTIFY] Notification error: {e}");
    }
}

pub fn turbo_message(button: &Button, enabled: bool) -> String {
    format!(
        "{} = {}",
        button.name,
        if enabled { "turbo" } else { "normal" }
    )
}

pub fn toggling_message(active: bool) -> &'static str {
    if active {
        "Turbo assignment: press the buttons to toggle"
    } else {
        "Turbo assignment finished"
    }
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn info(&self, message: &str) -> Result<(), NotifyError> {
        info!("{PREFIX}{message}");
        Ok(())
    }
}

/// Keeps notifications in memory, in delivery order.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    messages: Mutex<Vec<String>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything delivered so far.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.messages.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Notifier for MemoryNotifier {
    fn info(&self, message: &str) -> Result<(), NotifyError> {
        self.messages
            .lock()
            .map_err(|_| NotifyError::Unavailable("message store poisoned".into()))?
            .push(format!("{PREFIX}{message}"));
        Ok(())
    }
}
