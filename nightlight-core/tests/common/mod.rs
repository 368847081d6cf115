#![allow(dead_code)]

use std::cell::Cell;
use std::collections::VecDeque;
use std::vec::Vec;

use nightlight_core::handlers::Direction;
use nightlight_core::platform::{
    Clock, Level, LightSensor, LowPower, RgbOutput, StatusIndicator, Timing, WakeControl,
    WakeSource,
};
use nightlight_core::{
    EncoderEdgeHandler, EncoderLines, Millis, MotionEdgeHandler, NightLightConfig, Rgb,
    SharedState,
};

/// External event injected into the simulated board.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Stimulus {
    Detent(Direction),
    Motion,
}

/// Loop call during which a stimulus arrives.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Phase {
    Sleep,
    Hold,
    Pause(u32),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Trace {
    Led(u32, Rgb),
    SensorPower(u32, bool),
    Sleep(u32),
    Wake(u32),
    Pause(u32, u32),
    Hold(u32, u32),
    Arm(u32, WakeSource),
    Disarm(u32, WakeSource),
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

/// Board model with EXTI-like semantics: an edge on a disarmed source sets a
/// latched pending bit, and arming a source with its bit set fires the
/// handler immediately.
pub struct SimBoard<'a> {
    pub store: &'a SharedState,
    pub config: NightLightConfig,
    pub now: u32,
    pub ambient: u16,
    pub led: Rgb,
    pub status: bool,
    pub sensor_powered: bool,
    pub motion_armed: bool,
    pub encoder_armed: bool,
    pub motion_latched: bool,
    pub encoder_latched: bool,
    pub clk: Level,
    pub trace: Vec<Trace>,
    /// Rising CLK edge fired from inside the next clock read, landing one
    /// millisecond after the value that read returns.
    pub edge_on_clock_read: Cell<Option<Direction>>,
    scheduled: VecDeque<(Phase, Stimulus)>,
}

impl<'a> SimBoard<'a> {
    pub fn new(store: &'a SharedState, config: NightLightConfig, ambient: u16) -> Self {
        Self {
            store,
            config,
            now: 10_000,
            ambient,
            led: Rgb::OFF,
            status: false,
            sensor_powered: false,
            motion_armed: false,
            encoder_armed: false,
            motion_latched: false,
            encoder_latched: false,
            clk: Level::Low,
            trace: Vec::new(),
            edge_on_clock_read: Cell::new(None),
            scheduled: VecDeque::new(),
        }
    }

    pub fn schedule(&mut self, phase: Phase, stimulus: Stimulus) {
        self.scheduled.push_back((phase, stimulus));
    }

    pub fn pending_stimuli(&self) -> usize {
        self.scheduled.len()
    }

    pub fn sleeps(&self) -> usize {
        self.trace
            .iter()
            .filter(|entry| matches!(entry, Trace::Sleep(_)))
            .count()
    }

    pub fn lit_colors(&self) -> Vec<(u32, Rgb)> {
        self.trace
            .iter()
            .filter_map(|entry| match entry {
                Trace::Led(at, color) if !color.is_off() => Some((*at, *color)),
                _ => None,
            })
            .collect()
    }

    fn deliver_for(&mut self, phase: Phase) {
        while let Some(index) = self.scheduled.iter().position(|(at, _)| *at == phase) {
            if let Some((_, stimulus)) = self.scheduled.remove(index) {
                self.deliver(stimulus);
            }
        }
    }

    /// Delivers a stimulus immediately, as if it arrived between loop passes.
    pub fn inject(&mut self, stimulus: Stimulus) {
        self.deliver(stimulus);
    }

    fn deliver(&mut self, stimulus: Stimulus) {
        match stimulus {
            Stimulus::Motion => {
                if self.motion_armed {
                    MotionEdgeHandler::new(self.store).on_rising_edge();
                } else {
                    self.motion_latched = true;
                }
            }
            Stimulus::Detent(direction) => {
                let dt = match direction {
                    Direction::Clockwise => Level::Low,
                    Direction::CounterClockwise => Level::High,
                };
                self.encoder_edge(Level::High, dt);
                self.now += self.config.debounce_ms + 1;
                self.encoder_edge(Level::Low, dt);
                self.now += self.config.debounce_ms + 1;
            }
        }
    }

    fn encoder_edge(&mut self, clk: Level, dt: Level) {
        self.clk = clk;
        if self.encoder_armed {
            EncoderEdgeHandler::new(self.store, &self.config)
                .on_transition(Millis::new(self.now), &mut Pins { clk, dt });
        } else {
            self.encoder_latched = true;
        }
    }
}

impl Clock for SimBoard<'_> {
    fn now(&self) -> Millis {
        if let Some(direction) = self.edge_on_clock_read.take() {
            let dt = match direction {
                Direction::Clockwise => Level::Low,
                Direction::CounterClockwise => Level::High,
            };
            if self.encoder_armed {
                EncoderEdgeHandler::new(self.store, &self.config).on_transition(
                    Millis::new(self.now + 1),
                    &mut Pins {
                        clk: Level::High,
                        dt,
                    },
                );
            }
        }
        Millis::new(self.now)
    }
}

impl RgbOutput for SimBoard<'_> {
    fn write(&mut self, color: Rgb) {
        self.led = color;
        self.trace.push(Trace::Led(self.now, color));
    }
}

impl LightSensor for SimBoard<'_> {
    fn enable_front_end(&mut self) {
        self.sensor_powered = true;
        self.trace.push(Trace::SensorPower(self.now, true));
    }

    fn disable_front_end(&mut self) {
        self.sensor_powered = false;
        self.trace.push(Trace::SensorPower(self.now, false));
    }

    fn read(&mut self) -> u16 {
        assert!(self.sensor_powered, "sampled an unpowered sensor");
        self.ambient
    }
}

impl WakeControl for SimBoard<'_> {
    fn arm(&mut self, source: WakeSource) {
        self.trace.push(Trace::Arm(self.now, source));
        match source {
            WakeSource::Motion => {
                self.motion_armed = true;
                if std::mem::take(&mut self.motion_latched) {
                    MotionEdgeHandler::new(self.store).on_rising_edge();
                }
            }
            WakeSource::Encoder => {
                self.encoder_armed = true;
                if std::mem::take(&mut self.encoder_latched) {
                    EncoderEdgeHandler::new(self.store, &self.config).on_transition(
                        Millis::new(self.now),
                        &mut Pins {
                            clk: Level::High,
                            dt: Level::Low,
                        },
                    );
                }
            }
        }
    }

    fn disarm(&mut self, source: WakeSource) {
        self.trace.push(Trace::Disarm(self.now, source));
        match source {
            WakeSource::Motion => self.motion_armed = false,
            WakeSource::Encoder => self.encoder_armed = false,
        }
    }

    fn clear_latched_pending(&mut self, source: WakeSource) {
        match source {
            WakeSource::Motion => self.motion_latched = false,
            WakeSource::Encoder => self.encoder_latched = false,
        }
    }
}

impl LowPower for SimBoard<'_> {
    fn enter_low_power(&mut self) {
        // With nothing scheduled the model wakes spuriously.
        self.trace.push(Trace::Sleep(self.now));
        self.deliver_for(Phase::Sleep);
        self.trace.push(Trace::Wake(self.now));
    }
}

impl Timing for SimBoard<'_> {
    fn pause(&mut self, millis: u32) {
        self.trace.push(Trace::Pause(self.now, millis));
        self.deliver_for(Phase::Pause(millis));
        self.now += millis;
    }

    fn hold_illumination(&mut self, millis: u32) {
        self.trace.push(Trace::Hold(self.now, millis));
        self.deliver_for(Phase::Hold);
        self.now += millis;
    }
}

impl StatusIndicator for SimBoard<'_> {
    fn set_status(&mut self, on: bool) {
        self.status = on;
    }
}

pub fn quiet_config() -> NightLightConfig {
    NightLightConfig::DEFAULT.without_warmup()
}
