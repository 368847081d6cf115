//! Sleep entry and wake classification.
//!
//! Entering the low-power state is a fixed sequence. The encoder debounce
//! timestamp is forgotten first, because the clock stops while the MCU sleeps
//! and a pre-sleep timestamp would make the first post-wake edge look like
//! chatter. The motion source's latched pending bit is cleared before it is
//! armed, because a PIR edge seen while the source was disabled (during
//! illumination, say) would otherwise wake the device the instant it is
//! re-armed. After wake the motion source is disarmed again until the next
//! sleep cycle.

use core::fmt;

use crate::platform::{Clock, LowPower, StatusIndicator, WakeControl, WakeSource};
use crate::shared::SharedState;
use crate::time::Millis;

/// Why the low-power state ended.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum WakeReason {
    /// The encoder produced a qualifying detent.
    Encoder,
    /// The PIR reported motion.
    Motion,
    /// An interrupt fired but left nothing for the loop to do.
    Spurious,
}

impl fmt::Display for WakeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WakeReason::Encoder => "encoder",
            WakeReason::Motion => "motion",
            WakeReason::Spurious => "spurious",
        })
    }
}

/// Result of one sleep cycle.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct WakeReport {
    pub reason: WakeReason,
    /// Clock reading right after resume.
    pub at: Millis,
}

/// Drives the sleep/wake protocol over the shared store.
#[derive(Copy, Clone)]
pub struct SleepCycleController<'a> {
    store: &'a SharedState,
}

impl<'a> SleepCycleController<'a> {
    #[must_use]
    pub const fn new(store: &'a SharedState) -> Self {
        Self { store }
    }

    /// Puts the device to sleep and returns once an armed interrupt has woken
    /// it and its handler has completed.
    pub fn enter_sleep<B>(&self, board: &mut B) -> WakeReport
    where
        B: Clock + WakeControl + LowPower + StatusIndicator + ?Sized,
    {
        self.store.reset_debounce();
        board.clear_latched_pending(WakeSource::Motion);
        board.arm(WakeSource::Motion);
        board.set_status(false);

        board.enter_low_power();

        board.disarm(WakeSource::Motion);
        board.set_status(true);

        WakeReport {
            reason: self.classify(),
            at: board.now(),
        }
    }

    /// Classifies the work the store currently announces. A color request
    /// outranks motion when both arrived during one sleep.
    #[must_use]
    pub fn classify(&self) -> WakeReason {
        if self.store.color_adjust_requested() || self.store.color_change_pending() {
            WakeReason::Encoder
        } else if self.store.motion_pending() {
            WakeReason::Motion
        } else {
            WakeReason::Spurious
        }
    }
}
