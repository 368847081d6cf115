#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Board wiring for the STM32G0 night light.
//!
//! | Signal            | Pin  | Peripheral               |
//! |-------------------|------|--------------------------|
//! | PIR output        | PA0  | EXTI0, rising            |
//! | Encoder CLK       | PA1  | EXTI1, both edges        |
//! | Encoder DT        | PA4  | GPIO input               |
//! | Photoresistor     | PA5  | ADC1                     |
//! | Sensor supply     | PA8  | GPIO output (divider)    |
//! | RGB red/green/blue| PA6/PA7/PB0 | TIM3 CH1..CH3     |
//! | Status LED        | PC6  | GPIO output              |
//!
//! Both wake lines share the `EXTI0_1` vector. The register-free helpers in
//! this module decide which handler a pending mask belongs to so that logic
//! can be exercised on the host.

use nightlight_core::Millis;
use nightlight_core::platform::WakeSource;

#[cfg(target_os = "none")]
mod board;

#[cfg(target_os = "none")]
pub use board::{EncoderPins, NightLightBoard};

/// EXTI line carrying the PIR output.
pub const MOTION_LINE: usize = 0;
/// EXTI line carrying the encoder CLK phase.
pub const ENCODER_LINE: usize = 1;

/// PWM carrier for the RGB channels, in hertz.
pub const PWM_FREQUENCY_HZ: u32 = 1_000;

#[must_use]
pub const fn exti_line(source: WakeSource) -> usize {
    match source {
        WakeSource::Motion => MOTION_LINE,
        WakeSource::Encoder => ENCODER_LINE,
    }
}

#[must_use]
pub const fn line_bit(line: usize) -> u32 {
    1 << line
}

/// Wake lines that need servicing in one `EXTI0_1` invocation.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct PendingLines {
    pub motion: bool,
    pub encoder: bool,
}

impl PendingLines {
    /// Decodes the combined rising/falling pending mask against the
    /// interrupt mask. A line that latched an edge while masked stays
    /// latched; it is delivered when the line is armed again or dropped by
    /// `clear_latched_pending`.
    #[must_use]
    pub const fn decode(pending: u32, armed: u32) -> Self {
        let live = pending & armed;
        Self {
            motion: live & line_bit(MOTION_LINE) != 0,
            encoder: live & line_bit(ENCODER_LINE) != 0,
        }
    }

    /// Pending bits to acknowledge for the lines being serviced.
    #[must_use]
    pub const fn mask(self) -> u32 {
        let mut mask = 0;
        if self.motion {
            mask |= line_bit(MOTION_LINE);
        }
        if self.encoder {
            mask |= line_bit(ENCODER_LINE);
        }
        mask
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        !self.motion && !self.encoder
    }
}

/// Narrows the 64-bit tick clock to the wrapping millisecond counter the
/// controller compares against.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn millis_from_ticks(millis: u64) -> Millis {
    Millis::new(millis as u32)
}

/// Duty fraction for one 8-bit color channel as `(numerator, denominator)`.
#[must_use]
pub fn channel_duty(level: u8) -> (u16, u16) {
    (u16::from(level), u16::from(u8::MAX))
}
