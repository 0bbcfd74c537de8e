//! Mock hardware for host tests

use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::Cell;

use tmos_hal::{Backlight, Clock, DelayNs, GlowLeds, Ticks, TouchPoint, TouchSensor};

/// Records every hardware write and replays a scripted touch sequence
#[derive(Debug)]
pub struct MockBoard {
    /// Touch state reported until the next poll
    pub touch_active: bool,
    /// Touch state applied by each successive poll; empty keeps the last
    pub touch_script: VecDeque<bool>,
    pub polls: usize,
    pub delayed_ns: u64,
    pub brightness: Vec<f32>,
    pub leds: Vec<(usize, u8, u8, u8)>,
    pub led_count: usize,
}

impl MockBoard {
    pub fn new() -> Self {
        Self {
            touch_active: false,
            touch_script: VecDeque::new(),
            polls: 0,
            delayed_ns: 0,
            brightness: Vec::new(),
            leds: Vec::new(),
            led_count: 7,
        }
    }

    pub fn with_touch_script(script: &[bool]) -> Self {
        let mut board = Self::new();
        board.touch_script.extend(script.iter().copied());
        board
    }

    /// Color of the last write to every LED, if all agree
    pub fn last_fill(&self) -> Option<(u8, u8, u8)> {
        let tail = self.leds.get(self.leds.len().checked_sub(self.led_count)?..)?;
        let (_, r, g, b) = *tail.first()?;
        let uniform = tail
            .iter()
            .enumerate()
            .all(|(i, &(idx, tr, tg, tb))| idx == i && (tr, tg, tb) == (r, g, b));
        uniform.then_some((r, g, b))
    }
}

impl TouchSensor for MockBoard {
    fn poll(&mut self) {
        self.polls += 1;
        if let Some(next) = self.touch_script.pop_front() {
            self.touch_active = next;
        }
    }

    fn is_active(&self) -> bool {
        self.touch_active
    }

    fn position(&self) -> Option<TouchPoint> {
        self.touch_active.then_some(TouchPoint { x: 120, y: 240 })
    }
}

impl Backlight for MockBoard {
    fn set_brightness(&mut self, level: f32) {
        self.brightness.push(level);
    }
}

impl GlowLeds for MockBoard {
    fn led_count(&self) -> usize {
        self.led_count
    }

    fn set_rgb(&mut self, index: usize, r: u8, g: u8, b: u8) {
        self.leds.push((index, r, g, b));
    }
}

impl DelayNs for MockBoard {
    fn delay_ns(&mut self, ns: u32) {
        self.delayed_ns += u64::from(ns);
    }
}

/// Manually advanced clock, shared with the test body
#[derive(Debug, Clone, Default)]
pub struct MockClock {
    pub us: Rc<Cell<u32>>,
    pub s: Rc<Cell<u32>>,
}

impl MockClock {
    pub fn advance_us(&self, us: u32) {
        self.us.set(self.us.get().wrapping_add(us));
    }

    pub fn advance_s(&self, s: u32) {
        self.s.set(self.s.get() + s);
    }
}

impl Clock for MockClock {
    fn ticks_us(&self) -> Ticks {
        Ticks(self.us.get())
    }

    fn now_s(&self) -> u32 {
        self.s.get()
    }
}
