//! tmos Hardware Abstraction Layer
//!
//! This crate defines the hardware traits the runtime core consumes. A
//! board support crate implements them for the concrete touch controller,
//! backlight and glow LED drivers, so the scheduler and display phase
//! logic can be exercised on the host against mocks.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application pages / window manager     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  tmos-core (scheduler, backlight, Os)   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  tmos-hal (this crate - traits)         │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  board support (touch, PWM, WS2812)     │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`touch::TouchSensor`] - Polled touch controller
//! - [`backlight::Backlight`] - Display backlight brightness
//! - [`leds::GlowLeds`] - Addressable glow LED strip
//! - [`clock::Clock`] - Monotonic microsecond ticks and wall-clock seconds
//! - [`Board`] - Everything the display phase controller drives

#![no_std]
#![deny(unsafe_code)]

pub mod backlight;
pub mod clock;
pub mod leds;
pub mod touch;

pub use backlight::Backlight;
pub use clock::{Clock, Ticks};
pub use embedded_hal::delay::DelayNs;
pub use leds::GlowLeds;
pub use touch::{TouchPoint, TouchSensor};

/// Hardware bundle driven by the display phase controller
///
/// A board needs a touch sensor to detect interaction, a backlight and
/// glow LEDs to dim, and a delay source for polling touch release.
pub trait Board: TouchSensor + Backlight + GlowLeds + DelayNs {}

// Blanket implementation for types that provide every capability
impl<T: TouchSensor + Backlight + GlowLeds + DelayNs> Board for T {}
