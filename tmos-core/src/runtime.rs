//! Run loop
//!
//! The `Os` owns the scheduler, the display phase controller and the
//! message bus, and sequences them each tick:
//!
//! 1. Poll the touch controller once
//! 2. Update the display phase (may consume a wake touch)
//! 3. Dispatch due tasks with the settled touch state
//!
//! Any task failure is posted as a fatal message and ends the loop; there
//! is no supervisor to restart individual tasks.

use alloc::format;
use alloc::rc::Rc;
use alloc::string::ToString;
use alloc::vec::Vec;
use core::cell::Cell;

use tmos_hal::{Board, Clock};

use crate::config::OsConfig;
use crate::display::BacklightManager;
use crate::error::OsError;
use crate::messages::{HandlerError, HandlerId, MessageBus, Severity};
use crate::scheduler::{Scheduler, TaskFn, TaskHandle, TaskOptions, TaskTarget};

/// Stops a running loop at the next tick boundary
///
/// Clone it into tasks that need to end the run loop.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Rc<Cell<bool>>);

impl StopHandle {
    /// Request the run loop to stop
    pub fn stop(&self) {
        self.0.set(false);
    }

    /// Whether the run loop is running
    pub fn is_running(&self) -> bool {
        self.0.get()
    }

    fn start(&self) {
        self.0.set(true);
    }
}

/// The runtime
pub struct Os<H, C> {
    clock: C,
    scheduler: Scheduler,
    backlight: BacklightManager<H>,
    messages: MessageBus,
    running: StopHandle,
}

impl<H: Board, C: Clock> Os<H, C> {
    /// Create a runtime with default settings
    ///
    /// The board is bound to the display phase controller; adjust
    /// [`backlight_mut`](Self::backlight_mut) before running.
    pub fn new(hardware: H, clock: C) -> Self {
        let mut backlight = BacklightManager::new();
        backlight.attach(hardware);

        Self {
            clock,
            scheduler: Scheduler::new(),
            backlight,
            messages: MessageBus::new(),
            running: StopHandle::default(),
        }
    }

    /// Create a runtime and apply `config`
    pub fn with_config(hardware: H, clock: C, config: &OsConfig) -> Self {
        let mut os = Self::new(hardware, clock);
        config.backlight.apply(&mut os.backlight);

        // The ambient light feature overrides anything written to the LEDs
        if config.ambient_light {
            os.post_message(
                "Disabling phase_controls_glow_leds as ambient_light is set",
                Severity::Debug,
            );
            os.backlight.phase_controls_glow_leds = false;
        }

        os
    }

    /// Register a task (see [`Scheduler::add_task`])
    pub fn add_task(&mut self, body: TaskFn, options: TaskOptions) -> Result<TaskHandle, OsError> {
        let handle = self.scheduler.add_task(body, options)?;
        self.post_message(
            &format!(
                "Added task: #{} (index {}, interval: {})",
                handle.id(),
                options.index,
                handle.interval()
            ),
            Severity::Debug,
        );
        Ok(handle)
    }

    /// Remove tasks (see [`Scheduler::remove_task`])
    pub fn remove_task(&mut self, target: impl Into<TaskTarget>) -> Result<(), OsError> {
        let target = target.into();
        let description = match &target {
            TaskTarget::Fn(body) => format!("{body:?}"),
            TaskTarget::Handle(handle) => format!("#{}", handle.id()),
        };
        self.scheduler.remove_task(target)?;
        self.post_message(&format!("Removed task: {description}"), Severity::Debug);
        Ok(())
    }

    /// Snapshot of the registered tasks
    pub fn tasks(&self) -> Vec<TaskHandle> {
        self.scheduler.tasks()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Register a message handler, called in registration order
    pub fn add_message_handler<F>(&mut self, handler: F) -> HandlerId
    where
        F: FnMut(&str, Severity) -> Result<(), HandlerError> + 'static,
    {
        let id = self.messages.add_handler(handler);
        self.post_message(&format!("Added message handler: {id:?}"), Severity::Debug);
        id
    }

    pub fn remove_message_handler(&mut self, id: HandlerId) -> Result<(), OsError> {
        self.messages.remove_handler(id)?;
        self.post_message(&format!("Removed message handler: {id:?}"), Severity::Debug);
        Ok(())
    }

    pub fn message_handlers(&self) -> Vec<HandlerId> {
        self.messages.handlers()
    }

    /// Post a message to every handler
    pub fn post_message(&mut self, msg: &str, severity: Severity) {
        self.messages.post(msg, severity);
    }

    pub fn backlight(&self) -> &BacklightManager<H> {
        &self.backlight
    }

    pub fn backlight_mut(&mut self) -> &mut BacklightManager<H> {
        &mut self.backlight
    }

    /// Set the glow LEDs, subject to display phase scaling
    pub fn set_glow_leds(&mut self, r: u8, g: u8, b: u8) {
        self.backlight.set_glow_leds(r, g, b);
    }

    /// Handle for stopping the loop from inside a task
    pub fn stop_handle(&self) -> StopHandle {
        self.running.clone()
    }

    /// Stop the run loop at the next tick boundary
    pub fn stop(&self) {
        self.running.stop();
    }

    pub fn is_running(&self) -> bool {
        self.running.is_running()
    }

    /// One pass of the run loop
    ///
    /// Returns the number of tasks dispatched.
    pub async fn tick(&mut self) -> Result<usize, OsError> {
        if let Some(hw) = self.backlight.hardware_mut() {
            hw.poll();
        }

        let now_us = self.clock.ticks_us();
        let now_s = self.clock.now_s();

        // Before tasks, so a wake touch can be consumed
        self.backlight.tick(now_s);

        // Sampled after the controller settled; tasks may poll themselves
        let touch_active = self
            .backlight
            .hardware()
            .is_some_and(|hw| hw.is_active());

        Ok(self.scheduler.run_due_tasks(now_us, touch_active).await?)
    }

    /// Run until stopped or a task fails
    ///
    /// Failures are posted as [`Severity::Fatal`] before being returned.
    pub async fn run_async(&mut self) -> Result<(), OsError> {
        self.post_message("Starting tasks", Severity::Info);
        self.running.start();

        while self.running.is_running() {
            if let Err(e) = self.tick().await {
                self.running.stop();
                self.post_message(&e.to_string(), Severity::Fatal);
                return Err(e);
            }
        }

        self.post_message("System stopped", Severity::Info);
        Ok(())
    }

    /// Blocking equivalent of [`run_async`](Self::run_async)
    pub fn run(&mut self) -> Result<(), OsError> {
        embassy_futures::block_on(self.run_async())
    }
}
