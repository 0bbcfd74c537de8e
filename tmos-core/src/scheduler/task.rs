//! Task definitions
//!
//! A task pairs a body ([`TaskFn`]) with its scheduling state, shared with
//! callers through a [`TaskHandle`] so pages can toggle or refresh their
//! own task without holding the scheduler.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};
use core::fmt;
use core::future::Future;
use core::pin::Pin;

use tmos_hal::Ticks;

use crate::error::{InvalidArgument, TaskError};

/// Asynchronous work started by a task invocation
pub type PendingWork = Pin<Box<dyn Future<Output = Result<(), TaskError>>>>;

/// Result of invoking a task body
pub enum Dispatch {
    /// The invocation ran to completion
    Done,
    /// The invocation started work that completes later
    Pending(PendingWork),
}

impl fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dispatch::Done => f.write_str("Done"),
            Dispatch::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

type Body = RefCell<dyn FnMut() -> Result<Dispatch, TaskError>>;

/// A task body
///
/// Cloning shares the same body; equality is identity, so a clone can be
/// used to remove every registration of the body later.
#[derive(Clone)]
pub struct TaskFn(Rc<Body>);

impl TaskFn {
    /// Wrap a synchronous body
    pub fn new<F>(body: F) -> Self
    where
        F: FnMut() -> Result<Dispatch, TaskError> + 'static,
    {
        Self(Rc::new(RefCell::new(body)))
    }

    /// Wrap a body that returns a future for each invocation
    pub fn from_async<F, Fut>(mut body: F) -> Self
    where
        F: FnMut() -> Fut + 'static,
        Fut: Future<Output = Result<(), TaskError>> + 'static,
    {
        Self::new(move || Ok(Dispatch::Pending(Box::pin(body()))))
    }

    pub(crate) fn invoke(&self) -> Result<Dispatch, TaskError> {
        (&mut *self.0.borrow_mut())()
    }

    fn addr(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }
}

impl PartialEq for TaskFn {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for TaskFn {}

impl fmt::Debug for TaskFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaskFn({:p})", self.addr())
    }
}

/// Longest period the wrapping tick counter can measure, about 35.8 minutes
pub const MAX_PERIOD_US: u32 = i32::MAX as u32;

/// How often a task wants to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExecutionInterval {
    /// Every tick, unthrottled
    EveryTick,
    /// At most once per period (microseconds, at most [`MAX_PERIOD_US`])
    Every(u32),
    /// Never from the timer; only touch-forced or enqueued runs
    Manual,
}

impl ExecutionInterval {
    /// Convert an optional frequency (Hz) to an interval
    ///
    /// `None` runs every tick, `0` is manual-only, positive values become
    /// a period of `round(1_000_000 / hz)` microseconds (at least 1).
    /// Frequencies whose period exceeds [`MAX_PERIOD_US`] are rejected.
    pub fn from_frequency(hz: Option<f32>) -> Result<Self, InvalidArgument> {
        match hz {
            None => Ok(Self::EveryTick),
            Some(hz) if !hz.is_finite() || hz < 0.0 => Err(InvalidArgument::Frequency(hz)),
            Some(hz) if hz == 0.0 => Ok(Self::Manual),
            Some(hz) => {
                let period = 1_000_000.0 / f64::from(hz) + 0.5;
                if period >= f64::from(MAX_PERIOD_US) + 1.0 {
                    return Err(InvalidArgument::Frequency(hz));
                }
                Ok(Self::Every((period as u32).max(1)))
            }
        }
    }

    /// Whether the timer makes a task due
    pub(crate) fn elapsed(self, now: Ticks, last: Ticks) -> bool {
        match self {
            Self::EveryTick => true,
            Self::Manual => false,
            Self::Every(period) => i64::from(now.diff(last)) >= i64::from(period),
        }
    }
}

impl fmt::Display for ExecutionInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EveryTick => f.write_str("every tick"),
            Self::Every(us) => write!(f, "{us}us"),
            Self::Manual => f.write_str("manual"),
        }
    }
}

/// Registration options for [`Scheduler::add_task`](super::Scheduler::add_task)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskOptions {
    /// Insert position; negative appends
    pub index: isize,
    /// Preferred frequency in Hz (see [`ExecutionInterval::from_frequency`])
    pub frequency: Option<f32>,
    /// Run every tick while a touch is active
    pub touch_forces_execution: bool,
    /// Initial active state
    pub active: bool,
}

impl Default for TaskOptions {
    fn default() -> Self {
        Self {
            index: -1,
            frequency: None,
            touch_forces_execution: true,
            active: true,
        }
    }
}

impl TaskOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index(mut self, index: isize) -> Self {
        self.index = index;
        self
    }

    pub fn frequency(mut self, hz: f32) -> Self {
        self.frequency = Some(hz);
        self
    }

    pub fn touch_forces_execution(mut self, forces: bool) -> Self {
        self.touch_forces_execution = forces;
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }
}

#[derive(Debug)]
struct TaskState {
    id: u32,
    interval: Cell<ExecutionInterval>,
    last_execution: Cell<Option<Ticks>>,
    touch_forces_execution: Cell<bool>,
    active: Cell<bool>,
    in_flight: Cell<bool>,
}

/// Shared view of a registered task
///
/// Handles compare by identity: two registrations of the same body have
/// distinct handles.
#[derive(Debug, Clone)]
pub struct TaskHandle(Rc<TaskState>);

impl TaskHandle {
    pub(crate) fn new(id: u32, interval: ExecutionInterval, options: &TaskOptions) -> Self {
        Self(Rc::new(TaskState {
            id,
            interval: Cell::new(interval),
            last_execution: Cell::new(None),
            touch_forces_execution: Cell::new(options.touch_forces_execution),
            active: Cell::new(options.active),
            in_flight: Cell::new(false),
        }))
    }

    /// Registration id, unique per scheduler
    pub fn id(&self) -> u32 {
        self.0.id
    }

    /// Whether the task is considered for dispatch
    pub fn active(&self) -> bool {
        self.0.active.get()
    }

    /// Activate or deactivate the task
    ///
    /// Any change of state re-enqueues the task, so a re-activated task
    /// runs on the next tick instead of waiting out its interval.
    pub fn set_active(&self, active: bool) {
        if self.0.active.replace(active) != active {
            self.enqueue();
        }
    }

    /// Make the task run at the next opportunity
    ///
    /// Clears the last execution time rather than recording a pending
    /// request; [`set_active`](Self::set_active) relies on this.
    pub fn enqueue(&self) {
        self.0.last_execution.set(None);
    }

    pub fn interval(&self) -> ExecutionInterval {
        self.0.interval.get()
    }

    /// Replace the interval; periods above [`MAX_PERIOD_US`] are clamped
    pub fn set_interval(&self, interval: ExecutionInterval) {
        let interval = match interval {
            ExecutionInterval::Every(us) => ExecutionInterval::Every(us.min(MAX_PERIOD_US)),
            other => other,
        };
        self.0.interval.set(interval);
    }

    /// Change the preferred frequency, leaving the task untouched on error
    pub fn set_frequency(&self, hz: Option<f32>) -> Result<(), InvalidArgument> {
        self.set_interval(ExecutionInterval::from_frequency(hz)?);
        Ok(())
    }

    pub fn touch_forces_execution(&self) -> bool {
        self.0.touch_forces_execution.get()
    }

    pub fn set_touch_forces_execution(&self, forces: bool) {
        self.0.touch_forces_execution.set(forces);
    }

    /// Tick count of the last dispatch, `None` if not run since enqueued
    pub fn last_execution(&self) -> Option<Ticks> {
        self.0.last_execution.get()
    }

    /// Whether asynchronous work from the last dispatch is outstanding
    pub fn is_in_flight(&self) -> bool {
        self.0.in_flight.get()
    }

    pub(crate) fn mark_executed(&self, now: Ticks) {
        self.0.last_execution.set(Some(now));
    }

    pub(crate) fn set_in_flight(&self, in_flight: bool) {
        self.0.in_flight.set(in_flight);
    }

    /// Dispatch decision for this tick
    pub(crate) fn is_due(&self, now: Ticks, touch_active: bool) -> bool {
        if !self.active() || self.is_in_flight() {
            return false;
        }
        if touch_active && self.touch_forces_execution() {
            return true;
        }
        match self.last_execution() {
            None => true,
            Some(last) => self.interval().elapsed(now, last),
        }
    }
}

impl PartialEq for TaskHandle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for TaskHandle {}
