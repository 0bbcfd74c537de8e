//! Board-agnostic runtime for single-board touchscreen devices
//!
//! This crate contains everything between the hardware traits and the
//! application pages:
//!
//! - Cooperative task scheduler with per-task frequencies
//! - Display phase controller (backlight / glow LED dimming and sleep)
//! - Message bus for user-visible diagnostics
//! - The `Os` run loop tying them together
//! - Configuration type definitions

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

pub mod config;
pub mod display;
pub mod error;
pub mod messages;
pub mod runtime;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{InvalidArgument, OsError, TaskError};
pub use messages::{HandlerError, HandlerId, MessageBus, Severity};
pub use runtime::{Os, StopHandle};
pub use scheduler::{
    Dispatch, ExecutionInterval, PendingWork, Scheduler, TaskFn, TaskHandle, TaskOptions,
    TaskTarget, MAX_PERIOD_US,
};
