//! Display phase control
//!
//! Timeout-based backlight and glow LED dimming. Runs every tick ahead of
//! task dispatch so a touch that wakes the display can be consumed before
//! any page sees it.

pub mod backlight;
pub mod phase;

pub use backlight::{BacklightManager, TOUCH_RELEASE_POLL_MS};
pub use phase::{next_phase, BrightnessSettings, DisplayPhase, PhaseSettings, TimeoutSettings};
