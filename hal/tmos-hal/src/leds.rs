//! Glow LED strip abstraction

/// Addressable RGB LED strip
pub trait GlowLeds {
    /// Number of addressable LEDs
    fn led_count(&self) -> usize;

    /// Set a single LED color
    ///
    /// - `index`: LED address, 0..led_count()
    fn set_rgb(&mut self, index: usize, r: u8, g: u8, b: u8);

    /// Set every LED to the same color
    fn fill(&mut self, r: u8, g: u8, b: u8) {
        for i in 0..self.led_count() {
            self.set_rgb(i, r, g, b);
        }
    }
}
