mod common;

use common::{Phase, SimBoard, Stimulus, Trace, quiet_config};
use nightlight_core::handlers::Direction;
use nightlight_core::platform::WakeSource;
use nightlight_core::telemetry::TelemetryEvent;
use nightlight_core::{Hue, Mode, ModeController, Rgb, SharedState, hue_to_rgb};

fn motion_controller<'a>(
    store: &'a SharedState,
    ambient: u16,
) -> ModeController<'a, SimBoard<'a>> {
    let mut board = SimBoard::new(store, quiet_config(), ambient);
    board.schedule(Phase::Sleep, Stimulus::Motion);
    let mut controller = ModeController::new(store, board, quiet_config());
    controller.start();
    controller
}

#[test]
fn motion_in_the_dark_lights_the_stored_hue() {
    let store = SharedState::with_hue(Hue::new(240));
    let mut controller = motion_controller(&store, 10);

    assert_eq!(controller.poll(), Mode::MotionLit);
    assert_eq!(controller.poll(), Mode::Sleeping);

    let board = controller.board();
    assert_eq!(board.lit_colors(), [(10_100, hue_to_rgb(240))]);
    let sequence: Vec<Trace> = board
        .trace
        .iter()
        .copied()
        .skip_while(|entry| *entry != Trace::Disarm(10_000, WakeSource::Encoder))
        .collect();
    assert_eq!(
        sequence,
        [
            Trace::Disarm(10_000, WakeSource::Encoder),
            Trace::SensorPower(10_000, true),
            Trace::Pause(10_000, 100),
            Trace::Led(10_100, Rgb::new(0, 0, 255)),
            Trace::Hold(10_100, 20_000),
            Trace::Led(30_100, Rgb::OFF),
            Trace::SensorPower(30_100, false),
            Trace::Pause(30_100, 3_000),
            Trace::Arm(33_100, WakeSource::Encoder),
        ]
    );
    assert!(board.encoder_armed);
    assert!(!board.sensor_powered);
    assert!(!store.motion_pending());
}

#[test]
fn motion_in_daylight_keeps_the_led_off() {
    let store = SharedState::new();
    let mut controller = motion_controller(&store, 800);

    controller.poll();
    assert_eq!(controller.poll(), Mode::Sleeping);

    let board = controller.board();
    assert!(board.lit_colors().is_empty());
    assert!(board.trace.contains(&Trace::Pause(10_100, 10)));
    assert!(board.trace.contains(&Trace::Pause(10_110, 3_000)));
    assert!(
        !board
            .trace
            .iter()
            .any(|entry| matches!(entry, Trace::Hold(..)))
    );
    assert!(
        controller
            .telemetry()
            .oldest_first()
            .any(|record| record.event
                == TelemetryEvent::AmbientSample {
                    reading: 800,
                    dark: false
                })
    );
}

#[test]
fn threshold_reading_counts_as_bright() {
    let store = SharedState::new();
    let mut controller = motion_controller(&store, 50);

    controller.poll();
    controller.poll();

    assert!(controller.board().lit_colors().is_empty());
}

#[test]
fn encoder_is_inert_while_lit() {
    let store = SharedState::new();
    let mut controller = motion_controller(&store, 10);
    controller
        .board_mut()
        .schedule(Phase::Hold, Stimulus::Detent(Direction::Clockwise));
    controller
        .board_mut()
        .schedule(Phase::Pause(3_000), Stimulus::Detent(Direction::Clockwise));

    controller.poll();
    assert_eq!(controller.poll(), Mode::Sleeping);

    let snapshot = store.snapshot();
    assert_eq!(snapshot.hue.degrees(), 0);
    assert!(!snapshot.color_change_pending);
    assert!(!snapshot.color_adjust_requested);
    assert!(!controller.board().encoder_latched);

    // Nothing left to wake for: the next pass sleeps and stays asleep.
    assert_eq!(controller.poll(), Mode::Sleeping);
    assert_eq!(store.hue().degrees(), 0);
}

#[test]
fn motion_cannot_retrigger_before_cooldown_ends() {
    let store = SharedState::new();
    let mut controller = motion_controller(&store, 10);
    controller
        .board_mut()
        .schedule(Phase::Hold, Stimulus::Motion);
    controller
        .board_mut()
        .schedule(Phase::Pause(3_000), Stimulus::Motion);

    controller.poll();
    controller.poll();
    assert!(controller.board().motion_latched);

    assert_eq!(controller.poll(), Mode::Sleeping);

    let board = controller.board();
    assert_eq!(board.sleeps(), 2);
    let rearmed_at = board.trace.iter().rev().find_map(|entry| match entry {
        Trace::Arm(at, WakeSource::Motion) => Some(*at),
        _ => None,
    });
    assert_eq!(rearmed_at, Some(33_100));
    assert!(!store.motion_pending());
    assert_eq!(board.lit_colors().len(), 1);
}

#[test]
fn motion_after_cooldown_lights_again() {
    let store = SharedState::new();
    let mut controller = motion_controller(&store, 10);
    controller.poll();
    controller.poll();

    controller
        .board_mut()
        .schedule(Phase::Sleep, Stimulus::Motion);
    assert_eq!(controller.poll(), Mode::MotionLit);
    assert_eq!(controller.poll(), Mode::Sleeping);

    assert_eq!(controller.board().lit_colors().len(), 2);
}

#[test]
fn rotation_wins_over_motion_on_the_same_wake() {
    let store = SharedState::new();
    let mut controller = motion_controller(&store, 10);
    controller
        .board_mut()
        .schedule(Phase::Sleep, Stimulus::Detent(Direction::Clockwise));

    assert_eq!(controller.poll(), Mode::ColorAdjust);
}
