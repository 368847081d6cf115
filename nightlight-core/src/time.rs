//! Wrapping millisecond timestamps.
//!
//! The platform clock is a free-running `u32` millisecond counter that rolls
//! over roughly every 49.7 days and stops advancing while the MCU is in the
//! low-power state. Every elapsed-time comparison in the controller goes
//! through [`Millis::elapsed_since`] so rollover never produces a bogus
//! timeout.

use core::fmt;
use core::ops::Add;

/// Millisecond timestamp taken from the platform clock.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Millis(u32);

impl Millis {
    pub const ZERO: Self = Self(0);

    /// Wraps a raw counter value.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw counter value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Milliseconds from `earlier` to `self`, valid across a single rollover.
    #[must_use]
    pub const fn elapsed_since(self, earlier: Millis) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }
}

impl Add<u32> for Millis {
    type Output = Self;

    fn add(self, rhs: u32) -> Self::Output {
        Self(self.0.wrapping_add(rhs))
    }
}

impl From<u32> for Millis {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for Millis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}
