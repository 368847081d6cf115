use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use nightlight_core::platform::WakeSource;
use nightlight_core::repl::{self, COMMANDS, Command};
use nightlight_core::telemetry::EventId;
use nightlight_core::{Millis, Mode, ModeController, NightLightConfig, SharedState};

use crate::board::SimulatedBoard;

/// Upper bound on loop passes taken to absorb one stimulus command.
const SETTLE_PASS_LIMIT: usize = 64;

pub const DEFAULT_TRANSCRIPT: &str = "transcripts/nightlight-session.log";

pub struct Session<'a> {
    controller: ModeController<'a, SimulatedBoard<'a>>,
    transcript: TranscriptLogger,
    cursor: EventId,
}

impl<'a> Session<'a> {
    /// Boots a controller over a fresh simulated board and records the boot
    /// telemetry in the transcript.
    pub fn new(
        store: &'a SharedState,
        config: NightLightConfig,
        transcript: &Path,
        header: &str,
    ) -> io::Result<Self> {
        let board = SimulatedBoard::new(store, config);
        let mut session = Self {
            controller: ModeController::new(store, board, config),
            transcript: TranscriptLogger::new(transcript, header)?,
            cursor: 0,
        };

        session.controller.start();
        let mut lines = Vec::new();
        session.collect_telemetry(&mut lines);
        session.record_output(&lines)?;
        Ok(session)
    }

    /// Applies one REPL line and returns the lines to show the operator.
    pub fn handle_command(&mut self, line: &str) -> io::Result<Vec<String>> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        let at = self.now();
        self.transcript
            .append_line(at, TranscriptRole::Host, trimmed)?;

        let mut lines = Vec::new();
        match repl::parse(trimmed) {
            Ok(command) => self.execute(command, &mut lines),
            Err(err) => lines.push(format!("ERR {err}")),
        }

        self.record_output(&lines)?;
        Ok(lines)
    }

    pub fn mode(&self) -> Mode {
        self.controller.mode()
    }

    fn execute(&mut self, command: Command, lines: &mut Vec<String>) {
        match command {
            Command::Rotate { direction, detents } => {
                for _ in 0..detents {
                    self.controller.board_mut().queue_detent(direction);
                }
                self.settle(lines);
            }
            Command::Bounce => {
                self.controller.board_mut().queue_bounce();
                self.settle(lines);
            }
            Command::Motion => {
                self.controller.board_mut().queue_motion();
                self.settle(lines);
            }
            Command::Light(level) => {
                self.controller.board_mut().set_ambient(level);
                let verdict = if level < self.controller.config().dark_threshold {
                    "dark"
                } else {
                    "bright"
                };
                lines.push(format!("OK ambient {level} ({verdict})"));
            }
            Command::Wait(millis) => self.run_for(millis, lines),
            Command::Status => self.describe(lines),
            Command::Help => {
                lines.push("Available commands:".to_string());
                for spec in COMMANDS {
                    lines.push(format!("  {:<14} - {}", spec.usage, spec.summary));
                }
            }
            Command::Exit => lines.push("Session closed.".to_string()),
        }
    }

    /// Polls until the queued stimuli have been delivered and every flag
    /// they raised has been served.
    fn settle(&mut self, lines: &mut Vec<String>) {
        for _ in 0..SETTLE_PASS_LIMIT {
            if !self.has_work() {
                return;
            }
            self.step(lines);
        }
        lines.push(format!(
            "WARN still busy after {SETTLE_PASS_LIMIT} passes in {}",
            self.controller.mode()
        ));
    }

    fn run_for(&mut self, millis: u32, lines: &mut Vec<String>) {
        let start = self.now();
        while self.now().elapsed_since(start) < millis {
            if self.controller.mode() == Mode::Sleeping && !self.has_work() {
                lines.push(format!(
                    "asleep at {}; clock frozen until the next interrupt",
                    self.now()
                ));
                return;
            }
            self.step(lines);
        }
        lines.push(format!("OK now {} ({})", self.now(), self.controller.mode()));
    }

    fn has_work(&self) -> bool {
        let snapshot = self.controller.store().snapshot();
        self.controller.mode() == Mode::MotionLit
            || self.controller.board().has_queued()
            || snapshot.motion_pending
            || snapshot.color_change_pending
            || snapshot.color_adjust_requested
    }

    fn step(&mut self, lines: &mut Vec<String>) {
        self.controller.poll();
        self.collect_telemetry(lines);
    }

    fn collect_telemetry(&mut self, lines: &mut Vec<String>) {
        let telemetry = self.controller.telemetry();
        lines.extend(telemetry.since(self.cursor).map(|record| {
            if record.event.is_notable() {
                format!("WARN {record}")
            } else {
                format!("EVT {record}")
            }
        }));
        self.cursor = telemetry.next_id();
    }

    fn describe(&self, lines: &mut Vec<String>) {
        let snapshot = self.controller.store().snapshot();
        let board = self.controller.board();
        lines.push(format!(
            "mode={} now={} sleeps={}",
            self.controller.mode(),
            self.now(),
            board.sleeps()
        ));
        lines.push(format!(
            "hue={} preview={} led={} status-led={}",
            snapshot.hue,
            snapshot.hue.to_rgb(),
            board.led(),
            on_off(board.status_led())
        ));
        lines.push(format!(
            "ambient={} sensor={} motion-armed={} encoder-armed={}",
            board.ambient(),
            on_off(board.sensor_powered()),
            board.armed(WakeSource::Motion),
            board.armed(WakeSource::Encoder)
        ));
        lines.push(format!(
            "pending motion={} color-change={} color-request={} last-activity={}",
            snapshot.motion_pending,
            snapshot.color_change_pending,
            snapshot.color_adjust_requested,
            snapshot.last_activity
        ));
    }

    fn now(&self) -> Millis {
        use nightlight_core::platform::Clock;
        self.controller.board().now()
    }

    fn record_output(&mut self, lines: &[String]) -> io::Result<()> {
        let at = self.now();
        for line in lines {
            self.transcript
                .append_line(at, TranscriptRole::Emulator, line)?;
        }
        Ok(())
    }
}

fn on_off(on: bool) -> &'static str {
    if on { "on" } else { "off" }
}

struct TranscriptLogger {
    writer: BufWriter<fs::File>,
}

impl TranscriptLogger {
    fn new(path: &Path, header: &str) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut logger = Self {
            writer: BufWriter::new(file),
        };

        logger.write_header(header)?;
        Ok(logger)
    }

    fn write_header(&mut self, header: &str) -> io::Result<()> {
        writeln!(self.writer, "# {header}")?;
        writeln!(
            self.writer,
            "# Timestamps are virtual milliseconds since power-on"
        )?;
        writeln!(self.writer)?;
        self.writer.flush()
    }

    fn append_line(&mut self, at: Millis, role: TranscriptRole, line: &str) -> io::Result<()> {
        writeln!(
            self.writer,
            "[{:>8} ms] {} {}",
            at.as_u32(),
            role.prefix(),
            line
        )?;
        self.writer.flush()
    }
}

enum TranscriptRole {
    Host,
    Emulator,
}

impl TranscriptRole {
    fn prefix(&self) -> &'static str {
        match self {
            TranscriptRole::Host => "HOST>",
            TranscriptRole::Emulator => "EMU <",
        }
    }
}
