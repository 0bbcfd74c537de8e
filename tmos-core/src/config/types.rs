//! Configuration type definitions
//!
//! Every field has a default matching the runtime's built-in behaviour,
//! so a config file only needs the values it changes.

use alloc::string::String;
use core::fmt;

use crate::display::{BacklightManager, BrightnessSettings, DisplayPhase, TimeoutSettings};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration errors
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// TOML was malformed or had wrongly typed values
    Parse(String),
    /// A brightness was outside 0.0..=1.0
    Brightness(DisplayPhase),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse(msg) => write!(f, "config parse error: {msg}"),
            ConfigError::Brightness(phase) => {
                write!(f, "{} brightness must be within 0.0..=1.0", phase.name())
            }
        }
    }
}

/// Inactivity timeouts (seconds), 0 disables the phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TimeoutConfig {
    pub dim: u32,
    pub sleep: u32,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        let t = TimeoutSettings::default();
        Self {
            dim: t.dim,
            sleep: t.sleep,
        }
    }
}

impl From<TimeoutConfig> for TimeoutSettings {
    fn from(c: TimeoutConfig) -> Self {
        TimeoutSettings::new(0, c.dim, c.sleep)
    }
}

/// Brightness per phase, 0.0 to 1.0
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BrightnessConfig {
    pub on: f32,
    pub dim: f32,
    pub sleep: f32,
}

impl Default for BrightnessConfig {
    fn default() -> Self {
        let b = BrightnessSettings::default();
        Self {
            on: b.on,
            dim: b.dim,
            sleep: b.sleep,
        }
    }
}

impl From<BrightnessConfig> for BrightnessSettings {
    fn from(c: BrightnessConfig) -> Self {
        BrightnessSettings::new(c.on, c.dim, c.sleep)
    }
}

impl BrightnessConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let settings = BrightnessSettings::from(*self);
        for phase in [DisplayPhase::On, DisplayPhase::Dim, DisplayPhase::Sleep] {
            if !(0.0..=1.0).contains(&settings.for_phase(phase)) {
                return Err(ConfigError::Brightness(phase));
            }
        }
        Ok(())
    }
}

/// Display phase controller configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BacklightConfig {
    pub wake_consumes_touch: bool,
    pub phase_controls_glow_leds: bool,
    pub timeouts: TimeoutConfig,
    pub display_brightness: BrightnessConfig,
    pub glow_led_brightness: BrightnessConfig,
}

impl Default for BacklightConfig {
    fn default() -> Self {
        Self {
            wake_consumes_touch: true,
            phase_controls_glow_leds: true,
            timeouts: TimeoutConfig::default(),
            display_brightness: BrightnessConfig::default(),
            glow_led_brightness: BrightnessConfig::default(),
        }
    }
}

impl BacklightConfig {
    /// Check brightness ranges
    ///
    /// Timeout ordering is deliberately not checked; a dim timeout at or
    /// above the sleep timeout is a documented caller responsibility.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.display_brightness.validate()?;
        self.glow_led_brightness.validate()
    }

    /// Copy the settings into a controller
    pub fn apply<H>(&self, manager: &mut BacklightManager<H>) {
        manager.wake_consumes_touch = self.wake_consumes_touch;
        manager.phase_controls_glow_leds = self.phase_controls_glow_leds;
        manager.display_timeouts = self.timeouts.into();
        manager.display_brightnesses = self.display_brightness.into();
        manager.glow_led_brightnesses = self.glow_led_brightness.into();
    }
}

/// Runtime configuration
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OsConfig {
    pub backlight: BacklightConfig,
    /// The board's ambient light feature drives the glow LEDs itself
    pub ambient_light: bool,
}

impl OsConfig {
    /// Parse and validate a TOML document
    #[cfg(feature = "toml")]
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        use alloc::string::ToString;

        let config: OsConfig =
            toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.backlight.validate()?;
        Ok(config)
    }
}
