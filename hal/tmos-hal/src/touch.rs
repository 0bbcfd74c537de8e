//! Touch controller abstraction
//!
//! Touch state is sampled explicitly. Readers see the result of the most
//! recent [`TouchSensor::poll`] until the next one, which keeps every
//! decision within one runtime tick consistent.

/// A touch location in display pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TouchPoint {
    pub x: u16,
    pub y: u16,
}

/// Polled touch controller
pub trait TouchSensor {
    /// Sample the controller, updating the cached state
    fn poll(&mut self);

    /// Whether a touch was active at the last poll
    fn is_active(&self) -> bool;

    /// Location of the active touch, if any
    fn position(&self) -> Option<TouchPoint>;
}
