//! Message bus
//!
//! User-visible diagnostics are posted with a severity and fanned out to
//! every registered handler in registration order. The runtime reports
//! fatal errors here before the run loop exits, so an on-screen overlay
//! handler gets a chance to render them.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::error::OsError;

/// Message severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Fatal,
}

impl Severity {
    /// Upper-case display name
    pub const fn name(self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Failure reported by a message handler
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HandlerError(pub String);

/// Identifies a registered handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HandlerId(u32);

type Handler = Box<dyn FnMut(&str, Severity) -> Result<(), HandlerError>>;

/// Ordered set of message subscribers
pub struct MessageBus {
    handlers: Vec<(HandlerId, Handler)>,
    next_id: u32,
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MessageBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageBus")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl MessageBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            next_id: 0,
        }
    }

    /// Register a handler
    ///
    /// No duplicate check is made; handlers are invoked in the order
    /// they were added.
    pub fn add_handler<F>(&mut self, handler: F) -> HandlerId
    where
        F: FnMut(&str, Severity) -> Result<(), HandlerError> + 'static,
    {
        let id = HandlerId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.handlers.push((id, Box::new(handler)));
        id
    }

    /// Remove a previously registered handler
    pub fn remove_handler(&mut self, id: HandlerId) -> Result<(), OsError> {
        let pos = self
            .handlers
            .iter()
            .position(|(h, _)| *h == id)
            .ok_or(OsError::NotRegistered)?;
        self.handlers.remove(pos);
        Ok(())
    }

    /// Currently registered handlers, in call order
    pub fn handlers(&self) -> Vec<HandlerId> {
        self.handlers.iter().map(|(id, _)| *id).collect()
    }

    /// Deliver a message to every handler
    ///
    /// A failing handler is skipped; delivery continues with the next.
    pub fn post(&mut self, msg: &str, severity: Severity) {
        #[cfg(feature = "defmt")]
        match severity {
            Severity::Debug => defmt::debug!("{=str}", msg),
            Severity::Info => defmt::info!("{=str}", msg),
            Severity::Warning => defmt::warn!("{=str}", msg),
            Severity::Fatal => defmt::error!("{=str}", msg),
        }

        for (_id, handler) in self.handlers.iter_mut() {
            if let Err(_e) = handler(msg, severity) {
                #[cfg(feature = "defmt")]
                defmt::warn!("Message handler {} failed: {}", _id, _e);
            }
        }
    }

    /// Deliver an `Info` message
    pub fn post_info(&mut self, msg: &str) {
        self.post(msg, Severity::Info);
    }
}
