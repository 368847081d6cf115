//! Hardware capabilities consumed by the controller.
//!
//! The core never touches registers. Firmware implements these traits on top
//! of the HAL, the emulator implements them over a simulated board, and the
//! tests implement them with recording mocks. Sleep entry and the
//! illumination hold are separate methods so each can be faked on its own.

use crate::color::Rgb;
use crate::time::Millis;

/// Logic level of a digital input.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum Level {
    #[default]
    Low,
    High,
}

impl Level {
    /// Converts a boolean pin reading (`true` == high).
    #[must_use]
    pub const fn from_high(high: bool) -> Self {
        if high { Level::High } else { Level::Low }
    }

    #[must_use]
    pub const fn is_high(self) -> bool {
        matches!(self, Level::High)
    }
}

/// Interrupt sources able to wake the device.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum WakeSource {
    /// PIR output, rising edge.
    Motion,
    /// Encoder primary phase, both edges.
    Encoder,
}

/// Monotonic millisecond clock. Frozen while the MCU is in the low-power state.
pub trait Clock {
    fn now(&self) -> Millis;
}

/// PWM-driven tri-color LED.
pub trait RgbOutput {
    /// Drives the three channels with the given duty cycles.
    fn write(&mut self, color: Rgb);

    /// Turns every channel off.
    fn off(&mut self) {
        self.write(Rgb::OFF);
    }
}

/// Photoresistor behind a power-gated analog front end.
pub trait LightSensor {
    fn enable_front_end(&mut self);

    fn disable_front_end(&mut self);

    /// Samples the ambient light level; lower is darker.
    fn read(&mut self) -> u16;
}

/// Interrupt arming and latch control.
pub trait WakeControl {
    /// Enables interrupt delivery for `source`.
    fn arm(&mut self, source: WakeSource);

    /// Disables interrupt delivery for `source`.
    fn disarm(&mut self, source: WakeSource);

    /// Drops a latched pending indication for `source` without running its
    /// handler.
    fn clear_latched_pending(&mut self, source: WakeSource);
}

/// Low-power primitive.
pub trait LowPower {
    /// Halts until an armed interrupt fires. Returns only after that
    /// interrupt's handler has run to completion.
    fn enter_low_power(&mut self);
}

/// Blocking waits taken by the cooperative loop.
pub trait Timing {
    /// Short bounded pause: poll interval, sensor settle, cooldown.
    fn pause(&mut self, millis: u32);

    /// Holds the LED on for the illumination period.
    fn hold_illumination(&mut self, millis: u32) {
        self.pause(millis);
    }
}

/// On-board status LED that shows whether the MCU is awake.
pub trait StatusIndicator {
    fn set_status(&mut self, on: bool);
}

/// Everything the cooperative loop needs from the board.
pub trait Board:
    Clock + RgbOutput + LightSensor + WakeControl + LowPower + Timing + StatusIndicator
{
}

impl<T> Board for T where
    T: Clock + RgbOutput + LightSensor + WakeControl + LowPower + Timing + StatusIndicator
{
}
