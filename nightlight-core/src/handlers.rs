//! Interrupt-context edge handlers.
//!
//! Both handlers are tiny objects over [`SharedState`]. They never block,
//! never allocate and never call back into the loop; all they do is update
//! the store and raise a pending flag. The loop decides what the flag means
//! for the current mode.

use crate::color::Hue;
use crate::config::NightLightConfig;
use crate::platform::Level;
use crate::shared::SharedState;
use crate::time::Millis;

/// Reads the two quadrature phases of the rotary encoder.
pub trait EncoderLines {
    /// Phase wired to the edge interrupt (CLK).
    fn primary(&mut self) -> Level;

    /// Phase sampled to decode direction (DT).
    fn secondary(&mut self) -> Level;
}

/// Rotation direction decoded from the secondary phase.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Direction {
    Clockwise,
    CounterClockwise,
}

impl Direction {
    /// Secondary low on a primary rising edge means clockwise.
    #[must_use]
    pub const fn from_secondary(level: Level) -> Self {
        match level {
            Level::Low => Direction::Clockwise,
            Level::High => Direction::CounterClockwise,
        }
    }

    /// Signed hue delta for a detent of `step` degrees.
    #[must_use]
    pub const fn signed_step(self, step: i16) -> i16 {
        match self {
            Direction::Clockwise => step,
            Direction::CounterClockwise => -step,
        }
    }
}

/// What the encoder handler decided about one transition.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EncoderOutcome {
    /// Inside the debounce window; nothing in the store changed.
    Debounced,
    /// Accepted, but not a primary rising edge; only the debounce window moved.
    NoRotation,
    /// A qualifying detent moved the hue.
    Rotated { direction: Direction, hue: Hue },
}

/// Reacts to a PIR rising edge.
#[derive(Copy, Clone)]
pub struct MotionEdgeHandler<'a> {
    store: &'a SharedState,
}

impl<'a> MotionEdgeHandler<'a> {
    #[must_use]
    pub const fn new(store: &'a SharedState) -> Self {
        Self { store }
    }

    /// Marks motion as pending. No debounce: the source is only armed while
    /// the device sleeps.
    pub fn on_rising_edge(&self) {
        self.store.signal_motion();
    }
}

/// Reacts to every transition on the encoder's primary phase.
#[derive(Copy, Clone)]
pub struct EncoderEdgeHandler<'a> {
    store: &'a SharedState,
    debounce_ms: u32,
    step: i16,
}

impl<'a> EncoderEdgeHandler<'a> {
    #[must_use]
    pub const fn new(store: &'a SharedState, config: &NightLightConfig) -> Self {
        Self {
            store,
            debounce_ms: config.debounce_ms,
            step: config.hue_step,
        }
    }

    /// Debounces the transition, decodes direction on a primary rising edge
    /// and applies the detent to the hue.
    ///
    /// The activity timestamp moves only on a qualifying rotation. Chatter and
    /// the falling half of a detent leave it alone, otherwise the color
    /// timeout could be held off (or restarted) by electrical noise.
    pub fn on_transition<L>(&self, now: Millis, lines: &mut L) -> EncoderOutcome
    where
        L: EncoderLines + ?Sized,
    {
        critical_section::with(|cs| {
            let cells = self.store.encoder_cells(cs);
            let mut window = cells.debounce.get();

            if let Some(last) = window.last_transition
                && now.elapsed_since(last) < self.debounce_ms
            {
                return EncoderOutcome::Debounced;
            }
            window.last_transition = Some(now);

            let primary = lines.primary();
            let secondary = lines.secondary();

            let outcome = if window.last_level == Level::Low && primary == Level::High {
                let direction = Direction::from_secondary(secondary);
                let hue = cells.hue.get().rotated(direction.signed_step(self.step));
                cells.hue.set(hue);
                cells.last_activity.set(now);
                self.store.signal_color_change();
                EncoderOutcome::Rotated { direction, hue }
            } else {
                EncoderOutcome::NoRotation
            };

            window.last_level = primary;
            cells.debounce.set(window);
            outcome
        })
    }
}
