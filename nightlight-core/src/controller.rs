//! Cooperative main loop.
//!
//! The controller owns the board and the mode. Interrupt handlers only ever
//! raise flags in [`SharedState`]; every visible effect (LED, sensor power,
//! interrupt arming, sleep) happens here, one pass at a time.
//!
//! In color adjustment the change flag is acknowledged before the hue is
//! copied out. A detent that lands after the copy leaves the flag set again,
//! so the newer hue is always rendered on a later pass; clearing after the
//! render could swallow it.

use core::fmt;

use crate::config::NightLightConfig;
use crate::platform::{Board, WakeSource};
use crate::shared::SharedState;
use crate::sleep::{SleepCycleController, WakeReason};
use crate::telemetry::{TelemetryEvent, TelemetryLog, TelemetryRecord};

/// Operating mode of the night light.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Mode {
    /// Low-power state; the next pass sleeps until an interrupt.
    #[default]
    Sleeping,
    /// The encoder is being turned; the LED previews the hue.
    ColorAdjust,
    /// Motion woke the device; the next pass runs the illumination sequence.
    MotionLit,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Sleeping => "sleeping",
            Mode::ColorAdjust => "color-adjust",
            Mode::MotionLit => "motion-lit",
        })
    }
}

/// Drives the night light over a [`Board`].
pub struct ModeController<'a, B> {
    store: &'a SharedState,
    board: B,
    config: NightLightConfig,
    mode: Mode,
    sleep: SleepCycleController<'a>,
    telemetry: TelemetryLog,
}

impl<'a, B> ModeController<'a, B>
where
    B: Board,
{
    #[must_use]
    pub fn new(store: &'a SharedState, board: B, config: NightLightConfig) -> Self {
        Self {
            store,
            board,
            config,
            mode: Mode::Sleeping,
            sleep: SleepCycleController::new(store),
            telemetry: TelemetryLog::new(),
        }
    }

    /// Boot sequence: LED off, encoder armed, PIR warm-up blink.
    ///
    /// Returns with the controller in [`Mode::Sleeping`]; the first call to
    /// [`poll`](Self::poll) enters the first sleep.
    pub fn start(&mut self) {
        self.board.off();
        self.board.arm(WakeSource::Encoder);
        self.record(TelemetryEvent::Booted);

        if self.config.warmup_ms > 0 {
            self.warm_up();
            self.record(TelemetryEvent::WarmupComplete);
        }
    }

    /// Runs one pass of the loop and returns the mode after it.
    pub fn poll(&mut self) -> Mode {
        match self.mode {
            Mode::Sleeping => self.sleep_pass(),
            Mode::ColorAdjust => self.color_adjust_pass(),
            Mode::MotionLit => self.motion_lit_sequence(),
        }
        self.mode
    }

    /// Boots and loops forever.
    pub fn run(&mut self) -> ! {
        self.run_with(|_| {})
    }

    /// Boots and loops forever, handing every new telemetry record to `sink`
    /// after the pass that produced it.
    pub fn run_with<F>(&mut self, mut sink: F) -> !
    where
        F: FnMut(&TelemetryRecord),
    {
        let mut cursor = self.telemetry.next_id();
        self.start();
        loop {
            self.telemetry.since(cursor).for_each(&mut sink);
            cursor = self.telemetry.next_id();
            self.poll();
        }
    }

    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub const fn store(&self) -> &'a SharedState {
        self.store
    }

    #[must_use]
    pub const fn config(&self) -> &NightLightConfig {
        &self.config
    }

    #[must_use]
    pub const fn board(&self) -> &B {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut B {
        &mut self.board
    }

    #[must_use]
    pub const fn telemetry(&self) -> &TelemetryLog {
        &self.telemetry
    }

    fn warm_up(&mut self) {
        let mut remaining = self.config.warmup_ms;
        let mut lit = false;
        while remaining > 0 {
            lit = !lit;
            self.board.set_status(lit);
            let step = remaining.min(self.config.warmup_blink_ms);
            self.board.pause(step);
            remaining -= step;
        }
        self.board.set_status(false);
    }

    fn sleep_pass(&mut self) {
        // Work that arrived while the loop was busy is served without
        // sleeping first; the interrupt that raised it has already fired.
        let reason = match self.sleep.classify() {
            WakeReason::Spurious => {
                self.record(TelemetryEvent::EnteringSleep);
                let report = self.sleep.enter_sleep(&mut self.board);
                self.telemetry
                    .record(TelemetryEvent::Woke(report.reason), report.at);
                report.reason
            }
            pending => pending,
        };

        match reason {
            WakeReason::Encoder => {
                self.store.take_color_adjust_request();
                self.transition(Mode::ColorAdjust);
            }
            WakeReason::Motion => self.transition(Mode::MotionLit),
            WakeReason::Spurious => {}
        }
    }

    fn color_adjust_pass(&mut self) {
        self.store.take_color_adjust_request();

        if self.store.color_change_pending() {
            self.store.clear_color_change();
            let hue = self.store.hue();
            self.board.write(hue.to_rgb());
            self.record(TelemetryEvent::ColorRendered(hue));
        }

        // Motion is ignored while the user is choosing a color.
        self.store.clear_motion();

        // Timestamp before clock: a detent landing between the two reads
        // then only shortens the idle time instead of wrapping it.
        let last = self.store.last_activity();
        let idle = self.board.now().elapsed_since(last);
        if idle > self.config.color_timeout_ms {
            self.board.off();
            self.record(TelemetryEvent::ColorTimeout);
            self.transition(Mode::Sleeping);
        } else {
            self.board.pause(self.config.poll_interval_ms);
        }
    }

    fn motion_lit_sequence(&mut self) {
        self.board.disarm(WakeSource::Encoder);

        self.board.enable_front_end();
        self.board.pause(self.config.sensor_settle_ms);
        let reading = self.board.read();
        let dark = reading < self.config.dark_threshold;
        self.record(TelemetryEvent::AmbientSample { reading, dark });

        if dark {
            let hue = self.store.hue();
            self.board.write(hue.to_rgb());
            self.record(TelemetryEvent::ColorRendered(hue));
            self.board.hold_illumination(self.config.led_on_ms);
            self.record(TelemetryEvent::IlluminationComplete);
        } else {
            self.board.pause(self.config.bright_skip_ms);
        }

        self.board.off();
        self.board.disable_front_end();

        self.board.pause(self.config.cooldown_ms);
        self.record(TelemetryEvent::CooldownComplete);

        self.board.clear_latched_pending(WakeSource::Encoder);
        self.board.arm(WakeSource::Encoder);
        self.store.clear_motion();
        self.transition(Mode::Sleeping);
    }

    fn transition(&mut self, to: Mode) {
        let from = self.mode;
        if from != to {
            self.mode = to;
            self.record(TelemetryEvent::ModeChanged { from, to });
        }
    }

    fn record(&mut self, event: TelemetryEvent) {
        let now = self.board.now();
        self.telemetry.record(event, now);
    }
}
