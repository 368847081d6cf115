mod board;
mod session;

use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

use nightlight_core::repl::{self, Command};
use nightlight_core::{NightLightConfig, SharedState};
use session::{DEFAULT_TRANSCRIPT, Session};

struct Options {
    config: NightLightConfig,
    transcript: PathBuf,
}

fn main() -> io::Result<()> {
    let options = parse_options().unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!("Usage: nightlight-emulator [--transcript=<path>] [--<key>=<value>]...");
        eprintln!("Keys: {}", nightlight_core::config::FIELDS.join(", "));
        process::exit(2);
    });

    let store = SharedState::new();
    let mut session = Session::new(
        &store,
        options.config,
        &options.transcript,
        "Night light emulator transcript",
    )?;

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let stdout = io::stdout();
    let mut writer = stdout.lock();
    let mut line = String::new();

    writeln!(
        writer,
        "Night light emulator ready (transcript: {}). Type `help` for commands or `exit` to quit.",
        options.transcript.display()
    )?;

    loop {
        line.clear();
        write!(writer, "[{}] > ", session.mode())?;
        writer.flush()?;

        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            writeln!(writer)?;
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let responses = session.handle_command(trimmed)?;
        for response in responses {
            writeln!(writer, "{response}")?;
        }

        if should_terminate(trimmed) {
            break;
        }
    }

    Ok(())
}

fn should_terminate(input: &str) -> bool {
    repl::parse(input) == Ok(Command::Exit)
}

fn parse_options() -> Result<Options, String> {
    let mut config = NightLightConfig::DEFAULT;
    let mut transcript = PathBuf::from(DEFAULT_TRANSCRIPT);

    for arg in env::args().skip(1) {
        if let Some(path) = arg.strip_prefix("--transcript=") {
            transcript = PathBuf::from(path);
            continue;
        }

        let (key, value) = repl::parse_override(&arg).map_err(|err| err.to_string())?;
        config
            .set(key, value)
            .map_err(|err| format!("--{key}: {err}"))?;
    }

    config.validate().map_err(|err| err.to_string())?;
    Ok(Options { config, transcript })
}
