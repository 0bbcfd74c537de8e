//! Time sources
//!
//! Provides the microsecond tick counter used for task scheduling and the
//! coarse wall-clock seconds used for human-scale display timeouts.

use core::fmt;

/// Wrapping microsecond tick counter
///
/// The counter wraps every ~71 minutes. Always compare ticks with
/// [`Ticks::diff`], which yields the correct signed distance as long as
/// the two samples are less than half the range apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ticks(pub u32);

impl Ticks {
    /// Create from a raw counter value
    pub const fn from_micros(us: u32) -> Self {
        Self(us)
    }

    /// Raw counter value
    pub const fn as_micros(self) -> u32 {
        self.0
    }

    /// Signed microseconds elapsed from `earlier` to `self`
    pub const fn diff(self, earlier: Ticks) -> i32 {
        self.0.wrapping_sub(earlier.0) as i32
    }

    /// Advance by `us` microseconds, wrapping
    pub const fn add_micros(self, us: u32) -> Self {
        Self(self.0.wrapping_add(us))
    }
}

impl fmt::Display for Ticks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}us", self.0)
    }
}

/// Monotonic time source
pub trait Clock {
    /// Current microsecond tick counter
    fn ticks_us(&self) -> Ticks;

    /// Current wall-clock time in whole seconds
    fn now_s(&self) -> u32;
}
