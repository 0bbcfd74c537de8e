//! Display phases and per-phase settings

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Display phase, derived from time since the last interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DisplayPhase {
    On,
    Dim,
    Sleep,
}

impl DisplayPhase {
    pub const fn name(self) -> &'static str {
        match self {
            DisplayPhase::On => "on",
            DisplayPhase::Dim => "dim",
            DisplayPhase::Sleep => "sleep",
        }
    }
}

/// One value per display phase
///
/// Every controller owns its own copies; mutate the fields directly and
/// the change applies on the next tick.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PhaseSettings<T> {
    pub on: T,
    pub dim: T,
    pub sleep: T,
}

impl<T: Copy> PhaseSettings<T> {
    pub const fn new(on: T, dim: T, sleep: T) -> Self {
        Self { on, dim, sleep }
    }

    /// Value for `phase`
    pub fn for_phase(&self, phase: DisplayPhase) -> T {
        match phase {
            DisplayPhase::On => self.on,
            DisplayPhase::Dim => self.dim,
            DisplayPhase::Sleep => self.sleep,
        }
    }

    /// Replace the value for `phase`
    pub fn set(&mut self, phase: DisplayPhase, value: T) {
        match phase {
            DisplayPhase::On => self.on = value,
            DisplayPhase::Dim => self.dim = value,
            DisplayPhase::Sleep => self.sleep = value,
        }
    }
}

/// Backlight and glow LED brightness, 0.0 to 1.0
pub type BrightnessSettings = PhaseSettings<f32>;

/// Seconds of inactivity before entering a phase, 0 disables the phase
///
/// `on` is unused. `dim` should be less than `sleep`; this is not
/// enforced, and a misordered pair skips straight to sleep.
pub type TimeoutSettings = PhaseSettings<u32>;

impl Default for BrightnessSettings {
    fn default() -> Self {
        Self::new(1.0, 0.3, 0.0)
    }
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self::new(0, 30, 600)
    }
}

/// Phase for the given elapsed time
///
/// Sleep is checked before dim and the first enabled phase whose timeout
/// is strictly exceeded wins.
pub fn next_phase(now_s: u32, last_interaction_s: u32, timeouts: &TimeoutSettings) -> DisplayPhase {
    let delta_s = i64::from(now_s) - i64::from(last_interaction_s);

    for phase in [DisplayPhase::Sleep, DisplayPhase::Dim] {
        let timeout_s = timeouts.for_phase(phase);
        if timeout_s == 0 {
            continue;
        }
        if delta_s > i64::from(timeout_s) {
            return phase;
        }
    }

    DisplayPhase::On
}
