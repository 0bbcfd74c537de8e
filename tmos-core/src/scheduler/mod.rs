//! Cooperative task scheduler
//!
//! Runs registered callbacks at independent preferred frequencies while
//! staying responsive to touch. Everything runs on one logical thread;
//! asynchronous task bodies are driven between dispatches.

pub mod executor;
pub mod task;

pub use executor::{Scheduler, TaskTarget};
pub use task::{
    Dispatch, ExecutionInterval, PendingWork, TaskFn, TaskHandle, TaskOptions, MAX_PERIOD_US,
};
