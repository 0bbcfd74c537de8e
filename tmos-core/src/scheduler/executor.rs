//! Task dispatch
//!
//! Runs registered tasks in list order, each at its preferred rate. A
//! touch forces responsive tasks to run every tick, and asynchronous work
//! is driven between dispatches without ever starting a second invocation
//! of the same task while one is outstanding.

use alloc::vec::Vec;
use core::future::{poll_fn, Future};
use core::task::{Context, Poll};

use embassy_futures::yield_now;
use tmos_hal::Ticks;

use super::task::{Dispatch, ExecutionInterval, PendingWork, TaskFn, TaskHandle, TaskOptions};
use crate::error::{OsError, TaskError};

/// Selects registrations for removal
#[derive(Debug, Clone)]
pub enum TaskTarget {
    /// Every registration of this body; no-op when none match
    Fn(TaskFn),
    /// Exactly this registration; `NotRegistered` when absent
    Handle(TaskHandle),
}

impl From<TaskFn> for TaskTarget {
    fn from(body: TaskFn) -> Self {
        TaskTarget::Fn(body)
    }
}

impl From<&TaskFn> for TaskTarget {
    fn from(body: &TaskFn) -> Self {
        TaskTarget::Fn(body.clone())
    }
}

impl From<TaskHandle> for TaskTarget {
    fn from(handle: TaskHandle) -> Self {
        TaskTarget::Handle(handle)
    }
}

impl From<&TaskHandle> for TaskTarget {
    fn from(handle: &TaskHandle) -> Self {
        TaskTarget::Handle(handle.clone())
    }
}

#[derive(Debug)]
struct Entry {
    body: TaskFn,
    handle: TaskHandle,
}

struct InFlight {
    handle: TaskHandle,
    work: PendingWork,
}

/// Cooperative task scheduler
///
/// Order is significant: tasks run in list order within a pass, which
/// lets a privileged task (e.g. the window manager) go first.
pub struct Scheduler {
    tasks: Vec<Entry>,
    in_flight: Vec<InFlight>,
    touch_was_active: bool,
    next_id: u32,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Scheduler")
            .field("tasks", &self.tasks)
            .field("in_flight", &self.in_flight.len())
            .field("touch_was_active", &self.touch_was_active)
            .finish()
    }
}

impl Scheduler {
    /// Create an empty scheduler
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            in_flight: Vec::new(),
            touch_was_active: false,
            next_id: 0,
        }
    }

    /// Register a task
    ///
    /// No duplicate check is made; a body registered twice runs twice per
    /// tick. Invalid frequencies are rejected before anything changes.
    pub fn add_task(&mut self, body: TaskFn, options: TaskOptions) -> Result<TaskHandle, OsError> {
        let interval = ExecutionInterval::from_frequency(options.frequency)?;

        let handle = TaskHandle::new(self.next_id, interval, &options);
        self.next_id = self.next_id.wrapping_add(1);

        let entry = Entry {
            body,
            handle: handle.clone(),
        };
        if options.index < 0 {
            self.tasks.push(entry);
        } else {
            let index = (options.index as usize).min(self.tasks.len());
            self.tasks.insert(index, entry);
        }

        Ok(handle)
    }

    /// Remove registrations
    ///
    /// By body, every matching registration goes and a miss is not an
    /// error. By handle, the handle must still be registered.
    pub fn remove_task(&mut self, target: impl Into<TaskTarget>) -> Result<(), OsError> {
        match target.into() {
            TaskTarget::Fn(body) => {
                self.tasks.retain(|e| e.body != body);
            }
            TaskTarget::Handle(handle) => {
                let pos = self
                    .tasks
                    .iter()
                    .position(|e| e.handle == handle)
                    .ok_or(OsError::NotRegistered)?;
                self.tasks.remove(pos);
            }
        }

        // Work owned by a dropped registration goes with it
        let tasks = &self.tasks;
        self.in_flight
            .retain(|f| tasks.iter().any(|e| e.handle == f.handle));

        Ok(())
    }

    /// Snapshot of the registered tasks in dispatch order
    pub fn tasks(&self) -> Vec<TaskHandle> {
        self.tasks.iter().map(|e| e.handle.clone()).collect()
    }

    /// Number of registrations
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Number of tasks with outstanding asynchronous work
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Run one dispatch pass
    ///
    /// `touch_active` is sampled once by the caller for the whole pass.
    /// Touch-forced tasks also run on the first tick after a touch ends
    /// so they can draw the released state without waiting an interval.
    ///
    /// Returns the number of tasks dispatched. A task failure aborts the
    /// pass; remaining tasks do not run this tick.
    pub async fn run_due_tasks(&mut self, now: Ticks, touch_active: bool) -> Result<usize, TaskError> {
        let touch_considered_active = touch_active || self.touch_was_active;
        self.touch_was_active = touch_active;

        // Outstanding work gets a turn even if nothing is due this pass
        self.drive_in_flight().await?;

        let mut dispatched = 0;
        for i in 0..self.tasks.len() {
            let (body, handle) = {
                let entry = &self.tasks[i];
                (entry.body.clone(), entry.handle.clone())
            };

            if !handle.is_due(now, touch_considered_active) {
                continue;
            }

            // Recorded first so a slow or re-entrant body is not re-triggered
            handle.mark_executed(now);
            if let Dispatch::Pending(work) = body.invoke()? {
                handle.set_in_flight(true);
                self.in_flight.push(InFlight { handle, work });
            }
            dispatched += 1;

            self.drive_in_flight().await?;
            yield_now().await;
        }

        Ok(dispatched)
    }

    async fn drive_in_flight(&mut self) -> Result<(), TaskError> {
        if self.in_flight.is_empty() {
            return Ok(());
        }
        poll_fn(|cx| Poll::Ready(self.poll_in_flight(cx))).await
    }

    /// Poll every outstanding unit once, clearing the flag of finished ones
    ///
    /// Returns the first failure in dispatch order; later failures in
    /// the same poll are only logged.
    fn poll_in_flight(&mut self, cx: &mut Context<'_>) -> Result<(), TaskError> {
        let mut result = Ok(());
        self.in_flight.retain_mut(|f| match f.work.as_mut().poll(cx) {
            Poll::Pending => true,
            Poll::Ready(outcome) => {
                f.handle.set_in_flight(false);
                match outcome {
                    Err(e) if result.is_ok() => result = Err(e),
                    Err(_e) => {
                        #[cfg(feature = "defmt")]
                        defmt::warn!("Task #{} also failed: {}", f.handle.id(), _e);
                    }
                    Ok(()) => {}
                }
                false
            }
        });
        result
    }
}
