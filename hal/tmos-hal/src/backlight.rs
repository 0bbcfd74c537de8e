//! Display backlight abstraction

/// Display backlight
///
/// Implementations map the normalised level onto whatever the panel
/// supports (PWM duty, DCS brightness register, ...).
pub trait Backlight {
    /// Set the backlight brightness
    ///
    /// - `level`: 0.0 (off) to 1.0 (full brightness)
    fn set_brightness(&mut self, level: f32);
}
