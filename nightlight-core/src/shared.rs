//! State shared between the edge interrupts and the cooperative loop.
//!
//! Values wider than a single machine access (the hue, millisecond
//! timestamps, the debounce window) sit behind `critical_section::Mutex` and
//! are only ever copied in or out while interrupt delivery is suspended, so
//! the loop can never observe a half-written value. The pending flags are
//! single-bit atomics: interrupts set them, and the loop clears them only
//! after it has finished acting on the event they announce. There is no
//! queue behind a flag; several sets before the loop looks collapse into one
//! response.

use core::cell::Cell;

use critical_section::{CriticalSection, Mutex};
use portable_atomic::{AtomicBool, Ordering};

use crate::color::Hue;
use crate::platform::Level;
use crate::time::Millis;

/// Debounce bookkeeping owned by the encoder edge handler.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct DebounceWindow {
    /// Time of the last transition that passed the debounce check; `None`
    /// means no recent activity and the next edge is accepted unconditionally.
    pub last_transition: Option<Millis>,
    /// Level of the primary phase seen on the last accepted transition.
    pub last_level: Level,
}

impl DebounceWindow {
    /// Power-on state: no recent activity, primary phase assumed low.
    pub const IDLE: Self = Self {
        last_transition: None,
        last_level: Level::Low,
    };
}

/// Point-in-time copy of every shared field, taken in one critical section.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct StoreSnapshot {
    pub hue: Hue,
    pub last_activity: Millis,
    pub debounce: DebounceWindow,
    pub motion_pending: bool,
    pub color_change_pending: bool,
    pub color_adjust_requested: bool,
}

/// Cross-context store handed by reference to the interrupt layer and the
/// controller.
pub struct SharedState {
    hue: Mutex<Cell<Hue>>,
    last_activity: Mutex<Cell<Millis>>,
    debounce: Mutex<Cell<DebounceWindow>>,
    motion_pending: AtomicBool,
    color_change_pending: AtomicBool,
    color_adjust_requested: AtomicBool,
}

/// Borrowed view of the encoder-owned cells, valid for one critical section.
pub(crate) struct EncoderCells<'cs> {
    pub(crate) hue: &'cs Cell<Hue>,
    pub(crate) last_activity: &'cs Cell<Millis>,
    pub(crate) debounce: &'cs Cell<DebounceWindow>,
}

impl SharedState {
    /// Creates the zeroed power-on state.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_hue(Hue::RED)
    }

    /// Creates the power-on state with a specific starting hue.
    #[must_use]
    pub const fn with_hue(hue: Hue) -> Self {
        Self {
            hue: Mutex::new(Cell::new(hue)),
            last_activity: Mutex::new(Cell::new(Millis::ZERO)),
            debounce: Mutex::new(Cell::new(DebounceWindow::IDLE)),
            motion_pending: AtomicBool::new(false),
            color_change_pending: AtomicBool::new(false),
            color_adjust_requested: AtomicBool::new(false),
        }
    }

    /// Copies the current hue out of the store.
    #[must_use]
    pub fn hue(&self) -> Hue {
        critical_section::with(|cs| self.hue.borrow(cs).get())
    }

    /// Replaces the hue from the loop side.
    pub fn set_hue(&self, hue: Hue) {
        critical_section::with(|cs| self.hue.borrow(cs).set(hue));
    }

    /// Copies the time of the last qualifying encoder rotation.
    #[must_use]
    pub fn last_activity(&self) -> Millis {
        critical_section::with(|cs| self.last_activity.borrow(cs).get())
    }

    /// Copies the encoder debounce window.
    #[must_use]
    pub fn debounce_window(&self) -> DebounceWindow {
        critical_section::with(|cs| self.debounce.borrow(cs).get())
    }

    /// Forgets the last accepted encoder transition time.
    ///
    /// The clock does not advance while the MCU sleeps, so a timestamp taken
    /// before sleep would make the first edge after wake look like chatter.
    /// The last primary level is kept; it still describes the pin.
    pub fn reset_debounce(&self) {
        critical_section::with(|cs| {
            let cell = self.debounce.borrow(cs);
            let mut window = cell.get();
            window.last_transition = None;
            cell.set(window);
        });
    }

    /// Returns `true` while a motion edge is waiting to be handled.
    #[must_use]
    pub fn motion_pending(&self) -> bool {
        self.motion_pending.load(Ordering::Acquire)
    }

    /// Acknowledges the pending motion event.
    pub fn clear_motion(&self) {
        self.motion_pending.store(false, Ordering::Release);
    }

    /// Returns `true` while a hue change has not yet been rendered.
    #[must_use]
    pub fn color_change_pending(&self) -> bool {
        self.color_change_pending.load(Ordering::Acquire)
    }

    /// Acknowledges a rendered hue change.
    pub fn clear_color_change(&self) {
        self.color_change_pending.store(false, Ordering::Release);
    }

    /// Returns `true` when the encoder has asked for color adjustment.
    #[must_use]
    pub fn color_adjust_requested(&self) -> bool {
        self.color_adjust_requested.load(Ordering::Acquire)
    }

    /// Consumes the color adjustment request, returning whether one was set.
    pub fn take_color_adjust_request(&self) -> bool {
        self.color_adjust_requested.swap(false, Ordering::AcqRel)
    }

    /// Copies every field inside a single critical section.
    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        critical_section::with(|cs| StoreSnapshot {
            hue: self.hue.borrow(cs).get(),
            last_activity: self.last_activity.borrow(cs).get(),
            debounce: self.debounce.borrow(cs).get(),
            motion_pending: self.motion_pending.load(Ordering::Acquire),
            color_change_pending: self.color_change_pending.load(Ordering::Acquire),
            color_adjust_requested: self.color_adjust_requested.load(Ordering::Acquire),
        })
    }

    pub(crate) fn signal_motion(&self) {
        self.motion_pending.store(true, Ordering::Release);
    }

    pub(crate) fn signal_color_change(&self) {
        self.color_change_pending.store(true, Ordering::Release);
        self.color_adjust_requested.store(true, Ordering::Release);
    }

    pub(crate) fn encoder_cells<'cs>(&'cs self, cs: CriticalSection<'cs>) -> EncoderCells<'cs> {
        EncoderCells {
            hue: self.hue.borrow(cs),
            last_activity: self.last_activity.borrow(cs),
            debounce: self.debounce.borrow(cs),
        }
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
