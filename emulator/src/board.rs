use std::collections::VecDeque;

use nightlight_core::handlers::Direction;
use nightlight_core::platform::{
    Clock, Level, LightSensor, LowPower, RgbOutput, StatusIndicator, Timing, WakeControl,
    WakeSource,
};
use nightlight_core::{
    EncoderEdgeHandler, EncoderLines, Millis, MotionEdgeHandler, NightLightConfig, Rgb,
    SharedState,
};

/// Pin-level event waiting to be delivered to the simulated MCU.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Stimulus {
    /// CLK changes to `clk` while DT reads `dt`.
    ClkEdge { clk: Level, dt: Level },
    /// PIR output rises.
    Motion,
    /// Virtual time passes between two edges.
    Gap(u32),
}

/// Interrupt line model shared by both wake sources. An edge on a disarmed
/// line latches its pending bit; arming a line with the bit set delivers the
/// interrupt at once.
#[derive(Copy, Clone, Debug, Default)]
struct Line {
    armed: bool,
    latched: bool,
}

struct Pins {
    clk: Level,
    dt: Level,
}

impl EncoderLines for Pins {
    fn primary(&mut self) -> Level {
        self.clk
    }

    fn secondary(&mut self) -> Level {
        self.dt
    }
}

/// Simulated night-light board over a virtual millisecond clock.
///
/// Stimuli queue up between REPL commands and are delivered the next time
/// the controller blocks (sleep entry, a pause, the illumination hold), the
/// same points at which the real MCU would take the interrupt.
pub struct SimulatedBoard<'a> {
    store: &'a SharedState,
    config: NightLightConfig,
    now: Millis,
    led: Rgb,
    status: bool,
    sensor_powered: bool,
    ambient: u16,
    motion: Line,
    encoder: Line,
    clk: Level,
    dt: Level,
    queue: VecDeque<Stimulus>,
    sleeps: u32,
}

impl<'a> SimulatedBoard<'a> {
    pub fn new(store: &'a SharedState, config: NightLightConfig) -> Self {
        Self {
            store,
            config,
            now: Millis::ZERO,
            led: Rgb::OFF,
            status: false,
            sensor_powered: false,
            ambient: 0,
            motion: Line::default(),
            encoder: Line::default(),
            clk: Level::Low,
            dt: Level::Low,
            queue: VecDeque::new(),
            sleeps: 0,
        }
    }

    /// Queues one full detent: CLK rises, then falls, each edge separated
    /// by more than the debounce window.
    pub fn queue_detent(&mut self, direction: Direction) {
        let dt = match direction {
            Direction::Clockwise => Level::Low,
            Direction::CounterClockwise => Level::High,
        };
        let settle = self.config.debounce_ms + 1;
        self.queue.extend([
            Stimulus::ClkEdge { clk: Level::High, dt },
            Stimulus::Gap(settle),
            Stimulus::ClkEdge { clk: Level::Low, dt },
            Stimulus::Gap(settle),
        ]);
    }

    /// Queues a clockwise rising edge that chatters twice inside the
    /// debounce window before settling.
    pub fn queue_bounce(&mut self) {
        let settle = self.config.debounce_ms + 1;
        let dt = Level::Low;
        self.queue.extend([
            Stimulus::ClkEdge { clk: Level::High, dt },
            Stimulus::Gap(1),
            Stimulus::ClkEdge { clk: Level::Low, dt },
            Stimulus::Gap(1),
            Stimulus::ClkEdge { clk: Level::High, dt },
            Stimulus::Gap(settle),
            Stimulus::ClkEdge { clk: Level::Low, dt },
            Stimulus::Gap(settle),
        ]);
    }

    pub fn queue_motion(&mut self) {
        self.queue.push_back(Stimulus::Motion);
    }

    pub fn set_ambient(&mut self, level: u16) {
        self.ambient = level;
    }

    pub fn has_queued(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn led(&self) -> Rgb {
        self.led
    }

    pub fn status_led(&self) -> bool {
        self.status
    }

    pub fn ambient(&self) -> u16 {
        self.ambient
    }

    pub fn sensor_powered(&self) -> bool {
        self.sensor_powered
    }

    pub fn armed(&self, source: WakeSource) -> bool {
        self.line(source).armed
    }

    pub fn sleeps(&self) -> u32 {
        self.sleeps
    }

    fn line(&self, source: WakeSource) -> &Line {
        match source {
            WakeSource::Motion => &self.motion,
            WakeSource::Encoder => &self.encoder,
        }
    }

    fn line_mut(&mut self, source: WakeSource) -> &mut Line {
        match source {
            WakeSource::Motion => &mut self.motion,
            WakeSource::Encoder => &mut self.encoder,
        }
    }

    fn drain(&mut self) {
        while let Some(stimulus) = self.queue.pop_front() {
            match stimulus {
                Stimulus::ClkEdge { clk, dt } => {
                    self.clk = clk;
                    self.dt = dt;
                    self.raise(WakeSource::Encoder);
                }
                Stimulus::Motion => self.raise(WakeSource::Motion),
                Stimulus::Gap(millis) => self.now = self.now + millis,
            }
        }
    }

    fn raise(&mut self, source: WakeSource) {
        let line = self.line_mut(source);
        if line.armed {
            self.dispatch(source);
        } else {
            line.latched = true;
        }
    }

    fn dispatch(&mut self, source: WakeSource) {
        match source {
            WakeSource::Motion => MotionEdgeHandler::new(self.store).on_rising_edge(),
            WakeSource::Encoder => {
                let mut pins = Pins {
                    clk: self.clk,
                    dt: self.dt,
                };
                EncoderEdgeHandler::new(self.store, &self.config).on_transition(self.now, &mut pins);
            }
        }
    }
}

impl Clock for SimulatedBoard<'_> {
    fn now(&self) -> Millis {
        self.now
    }
}

impl RgbOutput for SimulatedBoard<'_> {
    fn write(&mut self, color: Rgb) {
        self.led = color;
    }
}

impl LightSensor for SimulatedBoard<'_> {
    fn enable_front_end(&mut self) {
        self.sensor_powered = true;
    }

    fn disable_front_end(&mut self) {
        self.sensor_powered = false;
    }

    fn read(&mut self) -> u16 {
        if self.sensor_powered { self.ambient } else { 0 }
    }
}

impl WakeControl for SimulatedBoard<'_> {
    fn arm(&mut self, source: WakeSource) {
        let line = self.line_mut(source);
        line.armed = true;
        if std::mem::take(&mut line.latched) {
            self.dispatch(source);
        }
    }

    fn disarm(&mut self, source: WakeSource) {
        self.line_mut(source).armed = false;
    }

    fn clear_latched_pending(&mut self, source: WakeSource) {
        self.line_mut(source).latched = false;
    }
}

impl LowPower for SimulatedBoard<'_> {
    fn enter_low_power(&mut self) {
        self.sleeps += 1;
        self.drain();
    }
}

impl Timing for SimulatedBoard<'_> {
    fn pause(&mut self, millis: u32) {
        self.drain();
        self.now = self.now + millis;
    }
}

impl StatusIndicator for SimulatedBoard<'_> {
    fn set_status(&mut self, on: bool) {
        self.status = on;
    }
}
