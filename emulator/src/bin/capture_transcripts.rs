use std::io;
use std::path::Path;

#[allow(dead_code)]
#[path = "../board.rs"]
mod board;
#[allow(dead_code)]
#[path = "../session.rs"]
mod session;

use nightlight_core::{NightLightConfig, SharedState};
use session::Session;

/// Scripted sessions replayed into `transcripts/`.
const SCENARIOS: &[(&str, &str, &[&str])] = &[
    (
        "color-adjust",
        "Night light emulator color adjustment transcript",
        &["status", "cw 3", "ccw", "bounce", "status", "wait 6000", "status"],
    ),
    (
        "motion-dark",
        "Night light emulator motion (dark) transcript",
        &["light 12", "motion", "status", "motion", "wait 100"],
    ),
    (
        "motion-daylight",
        "Night light emulator motion (daylight) transcript",
        &["light 900", "motion", "status"],
    ),
];

fn main() -> io::Result<()> {
    for (name, header, commands) in SCENARIOS {
        record(name, header, commands)?;
    }
    Ok(())
}

fn record(name: &str, header: &str, commands: &[&str]) -> io::Result<()> {
    let store = SharedState::new();
    let path = format!("transcripts/emulator-{name}.log");
    let mut session = Session::new(
        &store,
        NightLightConfig::DEFAULT,
        Path::new(&path),
        header,
    )?;

    for command in commands {
        let _ = session.handle_command(command)?;
    }
    println!("wrote {path}");
    Ok(())
}
