//! Hue wheel to RGB conversion.
//!
//! The color wheel is split into six 60° regions. Inside a region one channel
//! sits at full scale, one is off, and the third ramps linearly. Everything is
//! integer arithmetic so the same code runs unchanged on the MCU.

use core::fmt;

/// Number of degrees on the hue wheel.
pub const HUE_DEGREES: i32 = 360;

const REGION_DEGREES: i32 = 60;
const FULL_SCALE: u8 = u8::MAX;

/// Normalizes an arbitrary angle into `[0, 360)`.
///
/// Negative inputs wrap the way a mathematical modulo does, so `-15` becomes
/// `345` rather than `-15`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub const fn normalize_hue(hue: i32) -> u16 {
    // In [0, 360) after the double modulo, so the narrowing is exact.
    let wrapped = (hue % HUE_DEGREES + HUE_DEGREES) % HUE_DEGREES;
    wrapped as u16
}

/// Converts a hue angle into the RGB triple driven onto the LED.
///
/// Out-of-range input is normalized first, so every `i32` maps to a color.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub const fn hue_to_rgb(hue: i32) -> Rgb {
    let hue = normalize_hue(hue) as i32;
    let region = hue / REGION_DEGREES;
    // Offset in [0, 60) scaled by 255 / 60 stays within [0, 250].
    let t = ((hue % REGION_DEGREES) * FULL_SCALE as i32 / REGION_DEGREES) as u8;
    let full = FULL_SCALE;

    match region {
        0 => Rgb::new(full, t, 0),
        1 => Rgb::new(full - t, full, 0),
        2 => Rgb::new(0, full, t),
        3 => Rgb::new(0, full - t, full),
        4 => Rgb::new(t, 0, full),
        // Region 5 and anything past it clamp to magenta -> red.
        _ => Rgb::new(full, 0, full - t),
    }
}

/// 8-bit duty cycles for the three LED channels.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// All channels off.
    pub const OFF: Self = Self::new(0, 0, 0);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Returns `true` when every channel is dark.
    #[must_use]
    pub const fn is_off(self) -> bool {
        self.r == 0 && self.g == 0 && self.b == 0
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::new(r, g, b)
    }
}

impl From<Rgb> for (u8, u8, u8) {
    fn from(color: Rgb) -> Self {
        (color.r, color.g, color.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Hue angle guaranteed to lie in `[0, 360)`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Hue(u16);

impl Hue {
    /// Pure red.
    pub const RED: Self = Self(0);

    /// Builds a hue from any angle, normalizing it.
    #[must_use]
    pub const fn new(degrees: i32) -> Self {
        Self(normalize_hue(degrees))
    }

    /// Returns the angle in degrees.
    #[must_use]
    pub const fn degrees(self) -> u16 {
        self.0
    }

    /// Returns the hue moved by `step` degrees, wrapping in both directions.
    #[must_use]
    pub const fn rotated(self, step: i16) -> Self {
        Self::new(self.0 as i32 + step as i32)
    }

    /// Returns the LED color for this hue.
    #[must_use]
    pub const fn to_rgb(self) -> Rgb {
        hue_to_rgb(self.0 as i32)
    }
}

impl fmt::Display for Hue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}deg", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_boundaries_hit_primary_and_secondary_colors() {
        assert_eq!(hue_to_rgb(0), Rgb::new(255, 0, 0));
        assert_eq!(hue_to_rgb(60), Rgb::new(255, 255, 0));
        assert_eq!(hue_to_rgb(120), Rgb::new(0, 255, 0));
        assert_eq!(hue_to_rgb(180), Rgb::new(0, 255, 255));
        assert_eq!(hue_to_rgb(240), Rgb::new(0, 0, 255));
        assert_eq!(hue_to_rgb(300), Rgb::new(255, 0, 255));
    }

    #[test]
    fn mid_region_values_use_truncating_integer_scale() {
        assert_eq!(hue_to_rgb(30), Rgb::new(255, 127, 0));
        assert_eq!(hue_to_rgb(359), Rgb::new(255, 0, 5));
        assert_eq!(hue_to_rgb(15), Rgb::new(255, 63, 0));
    }

    #[test]
    fn encoder_detents_ramp_through_each_region() {
        let ramp: [u8; 4] = [0, 63, 127, 191];
        for region in 0..6 {
            for (offset, expected) in (0..).step_by(15).zip(ramp) {
                let hue = region * 60 + offset;
                let color = hue_to_rgb(hue);
                let rising = match region {
                    0 => color.g,
                    1 => 255 - color.r,
                    2 => color.b,
                    3 => 255 - color.g,
                    4 => color.r,
                    _ => 255 - color.b,
                };
                assert_eq!(rising, expected, "hue {hue}");
            }
        }
        assert_eq!(hue_to_rgb(45), Rgb::new(255, 191, 0));
        assert_eq!(hue_to_rgb(75), Rgb::new(192, 255, 0));
    }

    #[test]
    fn out_of_range_input_is_normalized_before_lookup() {
        assert_eq!(hue_to_rgb(360), hue_to_rgb(0));
        assert_eq!(hue_to_rgb(-60), hue_to_rgb(300));
        assert_eq!(hue_to_rgb(i32::MIN), hue_to_rgb(normalize_hue(i32::MIN).into()));
        assert_eq!(hue_to_rgb(i32::MAX), hue_to_rgb(normalize_hue(i32::MAX).into()));
    }

    #[test]
    fn normalize_keeps_in_range_values() {
        assert_eq!(normalize_hue(0), 0);
        assert_eq!(normalize_hue(180), 180);
        assert_eq!(normalize_hue(359), 359);
    }

    #[test]
    fn normalize_wraps_positive_overflow() {
        assert_eq!(normalize_hue(360), 0);
        assert_eq!(normalize_hue(375), 15);
        assert_eq!(normalize_hue(735), 15);
    }

    #[test]
    fn normalize_wraps_negative_input() {
        assert_eq!(normalize_hue(-15), 345);
        assert_eq!(normalize_hue(-30), 330);
        assert_eq!(normalize_hue(-375), 345);
    }

    #[test]
    fn normalize_is_periodic_over_full_turns() {
        for hue in [-1_000, -361, -1, 0, 1, 59, 359, 720, 9_999] {
            let base = normalize_hue(hue);
            assert!(base < 360);
            for turns in -3..=3 {
                assert_eq!(normalize_hue(hue + 360 * turns), base);
            }
        }
        assert!(normalize_hue(i32::MIN) < 360);
        assert!(normalize_hue(i32::MAX) < 360);
    }

    #[test]
    fn hue_rotation_wraps_both_directions() {
        assert_eq!(Hue::RED.rotated(15).degrees(), 15);
        assert_eq!(Hue::RED.rotated(-15).degrees(), 345);
        assert_eq!(Hue::new(345).rotated(15), Hue::RED);
        assert_eq!(Hue::new(15).to_rgb(), hue_to_rgb(15));
    }
}
