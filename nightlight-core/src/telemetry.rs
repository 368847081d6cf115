//! Telemetry events recorded by the mode controller.
//!
//! The core never logs directly. The controller appends structured records to
//! a fixed-capacity ring, and each target decides how to surface them: the
//! firmware forwards new records to `defmt`, the emulator prints them and
//! writes a transcript.

use core::fmt;

use heapless::{HistoryBuf, OldestOrdered};

use crate::color::Hue;
use crate::controller::Mode;
use crate::sleep::WakeReason;
use crate::time::Millis;

/// Total number of telemetry entries retained in memory.
pub const TELEMETRY_RING_CAPACITY: usize = 64;

/// Identifier assigned to each recorded event, wrapping on overflow.
pub type EventId = u32;

/// Discriminated telemetry events emitted by the controller.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TelemetryEvent {
    Booted,
    WarmupComplete,
    EnteringSleep,
    Woke(WakeReason),
    ModeChanged { from: Mode, to: Mode },
    ColorRendered(Hue),
    AmbientSample { reading: u16, dark: bool },
    IlluminationComplete,
    CooldownComplete,
    ColorTimeout,
}

impl TelemetryEvent {
    /// Returns `true` for events that describe something the operator may
    /// want to look into rather than routine progress.
    #[must_use]
    pub const fn is_notable(&self) -> bool {
        matches!(self, TelemetryEvent::Woke(WakeReason::Spurious))
    }
}

impl fmt::Display for TelemetryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryEvent::Booted => f.write_str("booted"),
            TelemetryEvent::WarmupComplete => f.write_str("warmup-complete"),
            TelemetryEvent::EnteringSleep => f.write_str("entering-sleep"),
            TelemetryEvent::Woke(reason) => write!(f, "woke {reason}"),
            TelemetryEvent::ModeChanged { from, to } => write!(f, "mode {from} -> {to}"),
            TelemetryEvent::ColorRendered(hue) => {
                write!(f, "color-rendered {hue} {}", hue.to_rgb())
            }
            TelemetryEvent::AmbientSample { reading, dark } => {
                let verdict = if *dark { "dark" } else { "bright" };
                write!(f, "ambient {reading} ({verdict})")
            }
            TelemetryEvent::IlluminationComplete => f.write_str("illumination-complete"),
            TelemetryEvent::CooldownComplete => f.write_str("cooldown-complete"),
            TelemetryEvent::ColorTimeout => f.write_str("color-timeout"),
        }
    }
}

/// Telemetry record stored in the ring buffer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TelemetryRecord {
    pub id: EventId,
    pub timestamp: Millis,
    pub event: TelemetryEvent,
}

impl fmt::Display for TelemetryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] #{} {}", self.timestamp, self.id, self.event)
    }
}

/// Records telemetry events into a fixed-size ring buffer.
pub struct TelemetryLog<const CAPACITY: usize = TELEMETRY_RING_CAPACITY> {
    ring: HistoryBuf<TelemetryRecord, CAPACITY>,
    next_event_id: EventId,
}

impl<const CAPACITY: usize> TelemetryLog<CAPACITY> {
    /// Creates a new telemetry log with an empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ring: HistoryBuf::new(),
            next_event_id: 0,
        }
    }

    /// Returns an iterator over the recorded telemetry in chronological order.
    pub fn oldest_first(&self) -> OldestOrdered<'_, TelemetryRecord> {
        self.ring.oldest_ordered()
    }

    /// Returns the most recent telemetry record, if available.
    #[must_use]
    pub fn latest(&self) -> Option<&TelemetryRecord> {
        self.ring.recent()
    }

    /// Returns the number of records currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Returns `true` when no telemetry records are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Identifier the next recorded event will receive.
    ///
    /// Consumers remember this value and later drain everything recorded
    /// since with [`since`](Self::since).
    #[must_use]
    pub const fn next_id(&self) -> EventId {
        self.next_event_id
    }

    /// Iterates over the retained records whose id is at or after `first`.
    pub fn since(&self, first: EventId) -> impl Iterator<Item = &TelemetryRecord> + '_ {
        self.oldest_first()
            .filter(move |record| record.id.wrapping_sub(first) < (1 << 31))
    }

    /// Records an event and returns its identifier.
    pub fn record(&mut self, event: TelemetryEvent, timestamp: Millis) -> EventId {
        let id = self.next_event_id;
        self.next_event_id = self.next_event_id.wrapping_add(1);

        self.ring.write(TelemetryRecord {
            id,
            timestamp,
            event,
        });

        id
    }
}

impl<const CAPACITY: usize> Default for TelemetryLog<CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::string::ToString;
    use std::vec::Vec;

    #[test]
    fn records_in_chronological_order_with_ids() {
        let mut log = TelemetryLog::<8>::new();
        assert!(log.is_empty());

        let first = log.record(TelemetryEvent::Booted, Millis::new(0));
        let second = log.record(TelemetryEvent::WarmupComplete, Millis::new(30_000));

        assert_eq!((first, second), (0, 1));
        assert_eq!(log.len(), 2);
        let events: Vec<_> = log.oldest_first().map(|record| record.event).collect();
        assert_eq!(
            events,
            [TelemetryEvent::Booted, TelemetryEvent::WarmupComplete]
        );
        assert_eq!(log.latest().map(|record| record.id), Some(1));
    }

    #[test]
    fn ring_drops_oldest_when_full() {
        let mut log = TelemetryLog::<3>::new();
        for at in 0..5 {
            log.record(TelemetryEvent::EnteringSleep, Millis::new(at));
        }

        assert_eq!(log.len(), 3);
        let ids: Vec<_> = log.oldest_first().map(|record| record.id).collect();
        assert_eq!(ids, [2, 3, 4]);
    }

    #[test]
    fn since_returns_only_new_records() {
        let mut log = TelemetryLog::<8>::new();
        log.record(TelemetryEvent::Booted, Millis::new(0));
        let mark = log.next_id();
        log.record(TelemetryEvent::EnteringSleep, Millis::new(5));
        log.record(TelemetryEvent::Woke(WakeReason::Motion), Millis::new(5));

        let fresh: Vec<_> = log.since(mark).map(|record| record.event).collect();
        assert_eq!(
            fresh,
            [
                TelemetryEvent::EnteringSleep,
                TelemetryEvent::Woke(WakeReason::Motion)
            ]
        );
        assert_eq!(log.since(log.next_id()).count(), 0);
    }

    #[test]
    fn events_render_for_transcripts() {
        assert_eq!(
            TelemetryEvent::ModeChanged {
                from: Mode::Sleeping,
                to: Mode::ColorAdjust
            }
            .to_string(),
            "mode sleeping -> color-adjust"
        );
        assert_eq!(
            TelemetryEvent::AmbientSample {
                reading: 12,
                dark: true
            }
            .to_string(),
            "ambient 12 (dark)"
        );
        assert_eq!(
            TelemetryEvent::Woke(WakeReason::Spurious).to_string(),
            "woke spurious"
        );
        assert!(TelemetryEvent::Woke(WakeReason::Spurious).is_notable());
        assert!(!TelemetryEvent::ColorTimeout.is_notable());
    }
}
