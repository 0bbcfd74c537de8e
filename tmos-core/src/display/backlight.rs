//! Backlight / glow LED dimming
//!
//! Tracks the time since the last touch and moves the display between
//! on, dim and sleep phases, pushing the phase brightness to the
//! backlight and glow LEDs on each transition.

use tmos_hal::Board;

use super::phase::{next_phase, BrightnessSettings, DisplayPhase, TimeoutSettings};

/// Poll period while waiting for a wake touch to be released
pub const TOUCH_RELEASE_POLL_MS: u32 = 5;

/// Display phase controller
///
/// Settings fields are public and read on every tick, so changes take
/// effect at the next update. Brightness changes are only pushed to the
/// hardware on the next phase transition.
#[derive(Debug)]
pub struct BacklightManager<H> {
    hardware: Option<H>,
    /// `None` until the first update
    phase: Option<DisplayPhase>,
    /// Raw color requested through `set_glow_leds`, before phase scaling
    requested_glow_rgb: Option<(u8, u8, u8)>,
    last_interaction_s: Option<u32>,

    /// Swallow the touch that wakes the display so pages never see it
    pub wake_consumes_touch: bool,
    /// Scale glow LED colors by the phase brightness
    pub phase_controls_glow_leds: bool,
    pub display_timeouts: TimeoutSettings,
    pub display_brightnesses: BrightnessSettings,
    pub glow_led_brightnesses: BrightnessSettings,
}

impl<H> Default for BacklightManager<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> BacklightManager<H> {
    /// Create a controller with default settings and no hardware
    pub fn new() -> Self {
        Self {
            hardware: None,
            phase: None,
            requested_glow_rgb: None,
            last_interaction_s: None,
            wake_consumes_touch: true,
            phase_controls_glow_leds: true,
            display_timeouts: TimeoutSettings::default(),
            display_brightnesses: BrightnessSettings::default(),
            glow_led_brightnesses: BrightnessSettings::default(),
        }
    }

    /// Bind hardware, returning any previously bound board
    pub fn attach(&mut self, hardware: H) -> Option<H> {
        self.hardware.replace(hardware)
    }

    /// Unbind the hardware
    pub fn detach(&mut self) -> Option<H> {
        self.hardware.take()
    }

    pub fn hardware(&self) -> Option<&H> {
        self.hardware.as_ref()
    }

    pub fn hardware_mut(&mut self) -> Option<&mut H> {
        self.hardware.as_mut()
    }

    /// Current phase, `None` before the first update
    pub fn phase(&self) -> Option<DisplayPhase> {
        self.phase
    }

    /// Time of the last recorded interaction (seconds)
    pub fn last_interaction(&self) -> Option<u32> {
        self.last_interaction_s
    }

    /// Color last requested through `set_glow_leds`, unscaled
    pub fn requested_glow_leds(&self) -> Option<(u8, u8, u8)> {
        self.requested_glow_rgb
    }
}

impl<H: Board> BacklightManager<H> {
    /// Set every glow LED to one color
    ///
    /// The LEDs have no independent brightness control, so while phase
    /// control is enabled the color is scaled by the current phase's glow
    /// brightness. The unscaled color is kept and re-scaled on each
    /// transition. Does nothing without hardware.
    pub fn set_glow_leds(&mut self, r: u8, g: u8, b: u8) {
        let Some(hw) = self.hardware.as_mut() else {
            return;
        };

        self.requested_glow_rgb = Some((r, g, b));

        let (r, g, b) = match self.phase {
            Some(phase) if self.phase_controls_glow_leds => {
                scale_rgb((r, g, b), self.glow_led_brightnesses.for_phase(phase))
            }
            _ => (r, g, b),
        };

        hw.fill(r, g, b);
    }

    /// Per-frame update
    ///
    /// Records an interaction when the touch is active, updates the phase
    /// and, if the phase changed and `wake_consumes_touch` is set, waits
    /// for the touch to be released. Returns whether the phase changed.
    pub fn tick(&mut self, now_s: u32) -> bool {
        let Some(hw) = self.hardware.as_mut() else {
            return false;
        };

        if self.last_interaction_s.is_none() || hw.is_active() {
            self.last_interaction_s = Some(now_s);
        }
        let last_interaction_s = self.last_interaction_s.unwrap_or(now_s);

        let changed = self.update_phase(now_s, last_interaction_s);

        if changed && self.wake_consumes_touch {
            if let Some(hw) = self.hardware.as_mut() {
                // Bounded by the user lifting their finger
                while hw.is_active() {
                    hw.delay_ms(TOUCH_RELEASE_POLL_MS);
                    hw.poll();
                }
            }
        }

        changed
    }

    /// Recompute the phase from the elapsed time since the last interaction
    ///
    /// Hardware is only written on a transition. The first update after
    /// construction sets the phase but reports no change, so start-up
    /// never looks like a wake.
    pub fn update_phase(&mut self, now_s: u32, last_interaction_s: u32) -> bool {
        let initial_update = self.phase.is_none();

        let new_phase = next_phase(now_s, last_interaction_s, &self.display_timeouts);
        if self.phase == Some(new_phase) {
            return false;
        }
        self.phase = Some(new_phase);

        if let Some(hw) = self.hardware.as_mut() {
            hw.set_brightness(self.display_brightnesses.for_phase(new_phase));
        }

        if self.phase_controls_glow_leds {
            if let Some((r, g, b)) = self.requested_glow_rgb {
                self.set_glow_leds(r, g, b);
            }
        }

        !initial_update
    }
}

/// Scale each channel, truncating
fn scale_rgb((r, g, b): (u8, u8, u8), brightness: f32) -> (u8, u8, u8) {
    let scale = |v: u8| (f32::from(v) * brightness) as u8;
    (scale(r), scale(g), scale(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBoard;

    fn manager() -> BacklightManager<MockBoard> {
        let mut bm = BacklightManager::new();
        bm.attach(MockBoard::new());
        bm
    }

    fn board(bm: &BacklightManager<MockBoard>) -> &MockBoard {
        bm.hardware().unwrap()
    }

    fn board_mut(bm: &mut BacklightManager<MockBoard>) -> &mut MockBoard {
        bm.hardware_mut().unwrap()
    }

    #[test]
    fn test_settings_are_per_instance() {
        let bm_1: BacklightManager<MockBoard> = BacklightManager::new();
        let mut bm_2: BacklightManager<MockBoard> = BacklightManager::new();

        bm_2.display_timeouts.dim = 70;
        bm_2.display_brightnesses.dim = 0.0;
        bm_2.glow_led_brightnesses.dim = 1.0;

        assert_ne!(bm_1.display_timeouts.dim, bm_2.display_timeouts.dim);
        assert_ne!(bm_1.display_brightnesses.dim, bm_2.display_brightnesses.dim);
        assert_ne!(bm_1.glow_led_brightnesses.dim, bm_2.glow_led_brightnesses.dim);
    }

    #[test]
    fn test_no_hardware_is_noop() {
        let mut bm: BacklightManager<MockBoard> = BacklightManager::new();
        bm.set_glow_leds(255, 255, 255);
        assert!(!bm.tick(100));
        assert_eq!(bm.phase(), None);
        assert_eq!(bm.requested_glow_leds(), None);

        // Phase tracking still works without hardware
        assert!(!bm.update_phase(100, 100));
        assert_eq!(bm.phase(), Some(DisplayPhase::On));
    }

    #[test]
    fn test_initial_phase_is_none() {
        let bm = manager();
        assert_eq!(bm.phase(), None);
        assert_eq!(bm.last_interaction(), None);
    }

    #[test]
    fn test_first_update_reports_no_change() {
        let mut bm = manager();
        assert!(!bm.update_phase(1234, 1234));
        assert_eq!(bm.phase(), Some(DisplayPhase::On));
        assert_eq!(board(&bm).brightness, [1.0]);
    }

    #[test]
    fn test_first_update_into_sleep_still_silent() {
        let mut bm = manager();
        bm.display_timeouts.sleep = 20;
        assert!(!bm.update_phase(1234, 1000));
        assert_eq!(bm.phase(), Some(DisplayPhase::Sleep));
        assert!(bm.update_phase(1234, 1234));
    }

    #[test]
    fn test_repeated_update_is_idempotent() {
        let mut bm = manager();
        bm.display_timeouts.dim = 10;
        bm.display_timeouts.sleep = 20;

        bm.update_phase(1234, 1220);
        assert_eq!(bm.phase(), Some(DisplayPhase::Dim));
        let writes = board(&bm).brightness.len();

        for _ in 0..5 {
            assert!(!bm.update_phase(1234, 1220));
        }
        assert_eq!(board(&bm).brightness.len(), writes);
    }

    #[test]
    fn test_phase_reflects_time_interval() {
        let mut bm = manager();
        bm.display_timeouts.dim = 10;
        bm.display_timeouts.sleep = 20;
        bm.display_brightnesses.on = 0.9;
        bm.display_brightnesses.dim = 0.5;
        bm.display_brightnesses.sleep = 0.1;

        let now = 1234;
        for (elapsed, expected) in [
            (4, DisplayPhase::On),
            (14, DisplayPhase::Dim),
            (24, DisplayPhase::Sleep),
        ] {
            bm.update_phase(now, now - elapsed);
            assert_eq!(bm.phase(), Some(expected));
            assert_eq!(
                board(&bm).brightness.last().copied(),
                Some(bm.display_brightnesses.for_phase(expected))
            );
        }
    }

    #[test]
    fn test_transitions_report_change() {
        let mut bm = manager();
        bm.display_timeouts.dim = 10;
        bm.display_timeouts.sleep = 20;

        assert!(!bm.update_phase(100, 100));
        assert!(bm.update_phase(115, 100));
        assert!(bm.update_phase(125, 100));
        assert!(bm.update_phase(125, 125));
    }

    #[test]
    fn test_glow_leds_scaled_by_phase() {
        let mut bm = manager();
        bm.display_timeouts.dim = 10;
        bm.display_timeouts.sleep = 20;
        bm.glow_led_brightnesses.on = 0.9;
        bm.glow_led_brightnesses.dim = 0.5;
        bm.glow_led_brightnesses.sleep = 0.3;

        let rgb = (200, 100, 10);
        let now = 1234;
        for (elapsed, brightness) in [(4, 0.9f32), (14, 0.5), (24, 0.3)] {
            bm.update_phase(now, now - elapsed);
            bm.set_glow_leds(rgb.0, rgb.1, rgb.2);
            assert_eq!(board(&bm).last_fill(), Some(scale_rgb(rgb, brightness)));
        }
        assert_eq!(board(&bm).leds.len() % 7, 0);
    }

    #[test]
    fn test_glow_leds_before_first_phase_are_raw() {
        let mut bm = manager();
        bm.set_glow_leds(200, 100, 10);
        assert_eq!(board(&bm).last_fill(), Some((200, 100, 10)));
    }

    #[test]
    fn test_glow_leds_raw_when_control_disabled() {
        let mut bm = manager();
        bm.phase_controls_glow_leds = false;
        bm.glow_led_brightnesses.dim = 0.5;
        bm.display_timeouts.dim = 10;

        bm.update_phase(1234, 1220);
        bm.set_glow_leds(200, 100, 10);
        assert_eq!(board(&bm).last_fill(), Some((200, 100, 10)));

        // And transitions leave the LEDs alone
        board_mut(&mut bm).leds.clear();
        bm.update_phase(1234, 1234);
        assert!(board(&bm).leds.is_empty());
    }

    #[test]
    fn test_glow_leds_rescaled_from_raw_on_transition() {
        let mut bm = manager();
        bm.display_timeouts.dim = 10;
        bm.display_timeouts.sleep = 20;
        bm.glow_led_brightnesses.on = 0.9;
        bm.glow_led_brightnesses.dim = 0.5;

        bm.update_phase(1000, 1000);
        bm.set_glow_leds(200, 100, 10);
        assert_eq!(board(&bm).last_fill(), Some((180, 90, 9)));

        bm.update_phase(1015, 1000);
        assert_eq!(bm.phase(), Some(DisplayPhase::Dim));
        assert_eq!(board(&bm).last_fill(), Some((100, 50, 5)));
        assert_eq!(bm.requested_glow_leds(), Some((200, 100, 10)));

        // Back on and dim again: no compounding
        bm.update_phase(1015, 1015);
        bm.update_phase(1030, 1015);
        assert_eq!(board(&bm).last_fill(), Some((100, 50, 5)));
    }

    #[test]
    fn test_glow_leds_updated_on_each_transition() {
        let mut bm = manager();
        bm.display_timeouts.dim = 10;
        bm.display_timeouts.sleep = 20;
        bm.glow_led_brightnesses.on = 0.9;
        bm.glow_led_brightnesses.dim = 0.5;
        bm.glow_led_brightnesses.sleep = 0.1;

        let rgb = (100, 100, 100);
        bm.set_glow_leds(rgb.0, rgb.1, rgb.2);

        let now = 1234;
        for (elapsed, expected) in [
            (4, DisplayPhase::On),
            (14, DisplayPhase::Dim),
            (24, DisplayPhase::Sleep),
        ] {
            board_mut(&mut bm).leds.clear();
            bm.update_phase(now, now - elapsed);
            let brightness = bm.glow_led_brightnesses.for_phase(expected);
            let (r, g, b) = scale_rgb(rgb, brightness);
            assert_eq!(board(&bm).leds.last().copied(), Some((6, r, g, b)));
        }
    }

    fn check_wake_touch_handling(should_consume: bool) {
        let mut bm = manager();
        bm.wake_consumes_touch = should_consume;
        bm.display_timeouts.dim = 5;
        bm.display_timeouts.sleep = 0;

        // Touch on the first tick sets the interaction time and initial phase
        let mut now = 1234;
        board_mut(&mut bm).touch_active = true;
        assert!(!bm.tick(now));
        assert_eq!(bm.phase(), Some(DisplayPhase::On));

        // Within the timeout nothing changes and the touch is left alone
        now += 4;
        assert!(!bm.tick(now));
        assert!(board(&bm).touch_active);
        assert_eq!(board(&bm).polls, 0);

        // Untouched past the timeout dims
        board_mut(&mut bm).touch_active = false;
        now += 6;
        assert!(bm.tick(now));
        assert_eq!(bm.phase(), Some(DisplayPhase::Dim));
        assert_eq!(board(&bm).polls, 0);

        // A touch wakes the display; the next poll reports it released
        board_mut(&mut bm).touch_active = true;
        board_mut(&mut bm).touch_script.push_back(false);
        now += 1;
        assert!(bm.tick(now));
        assert_eq!(bm.phase(), Some(DisplayPhase::On));
        if should_consume {
            assert_eq!(board(&bm).polls, 1);
            assert!(!board(&bm).touch_active);
            assert_eq!(board(&bm).delayed_ns, 5_000_000);
        } else {
            assert_eq!(board(&bm).polls, 0);
            assert!(board(&bm).touch_active);
        }
    }

    #[test]
    fn test_wake_consumes_touch() {
        check_wake_touch_handling(true);
    }

    #[test]
    fn test_wake_does_not_consume_touch_when_disabled() {
        check_wake_touch_handling(false);
    }

    #[test]
    fn test_touch_keeps_display_on() {
        let mut bm = manager();
        bm.display_timeouts.dim = 5;
        board_mut(&mut bm).touch_active = true;

        for now in 0..60 {
            assert!(!bm.tick(now));
        }
        assert_eq!(bm.last_interaction(), Some(59));
        assert_eq!(bm.phase(), Some(DisplayPhase::On));
    }
}
