//! Command grammar for the host emulator.
//!
//! Lines are split into whitespace-separated words with `winnow`; the first
//! word selects an entry in [`COMMANDS`] and the entry's [`Argument`] shape
//! decides how the rest of the line is read. Numbers must fill their word
//! completely, so `wait 10x` is rejected instead of silently waiting 10 ms.

use core::fmt;

use winnow::ascii::{dec_int, dec_uint, space0};
use winnow::combinator::{opt, preceded, separated_pair};
use winnow::error::ContextError;
use winnow::prelude::*;
use winnow::token::take_while;

use crate::handlers::Direction;

/// Structured commands produced by the parser.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Command {
    /// Turn the encoder by `detents` full detents.
    Rotate { direction: Direction, detents: u32 },
    /// Emit a chattering edge pair inside the debounce window.
    Bounce,
    /// Raise the PIR output.
    Motion,
    /// Set the light sensor reading.
    Light(u16),
    /// Advance virtual time by the given number of milliseconds.
    Wait(u32),
    Status,
    Help,
    Exit,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Verb {
    Clockwise,
    CounterClockwise,
    Bounce,
    Motion,
    Light,
    Wait,
    Status,
    Help,
    Exit,
}

/// Shape of the words following a command keyword.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Argument {
    None,
    /// Optional positive count, `1` when omitted.
    OptionalCount,
    /// Required unsigned value no larger than `max`.
    Required { expected: &'static str, max: u32 },
}

/// Catalog entry shared by the parser and the help text.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub usage: &'static str,
    pub summary: &'static str,
    pub argument: Argument,
    pub aliases: &'static [&'static str],
    verb: Verb,
}

/// Every command understood by the emulator, in help order.
pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "cw",
        usage: "cw [n]",
        summary: "rotate the encoder n detents clockwise",
        argument: Argument::OptionalCount,
        aliases: &[],
        verb: Verb::Clockwise,
    },
    CommandSpec {
        name: "ccw",
        usage: "ccw [n]",
        summary: "rotate the encoder n detents counter-clockwise",
        argument: Argument::OptionalCount,
        aliases: &[],
        verb: Verb::CounterClockwise,
    },
    CommandSpec {
        name: "bounce",
        usage: "bounce",
        summary: "chatter the encoder clock line inside the debounce window",
        argument: Argument::None,
        aliases: &[],
        verb: Verb::Bounce,
    },
    CommandSpec {
        name: "motion",
        usage: "motion",
        summary: "raise the PIR output",
        argument: Argument::None,
        aliases: &[],
        verb: Verb::Motion,
    },
    CommandSpec {
        name: "light",
        usage: "light <level>",
        summary: "set the ambient light reading (below the threshold is dark)",
        argument: Argument::Required {
            expected: "a light level",
            max: 65_535,
        },
        aliases: &[],
        verb: Verb::Light,
    },
    CommandSpec {
        name: "wait",
        usage: "wait <ms>",
        summary: "advance virtual time, running the controller",
        argument: Argument::Required {
            expected: "a duration in milliseconds",
            max: u32::MAX,
        },
        aliases: &[],
        verb: Verb::Wait,
    },
    CommandSpec {
        name: "status",
        usage: "status",
        summary: "show mode, hue, color and pending flags",
        argument: Argument::None,
        aliases: &[],
        verb: Verb::Status,
    },
    CommandSpec {
        name: "help",
        usage: "help",
        summary: "list commands",
        argument: Argument::None,
        aliases: &[],
        verb: Verb::Help,
    },
    CommandSpec {
        name: "exit",
        usage: "exit",
        summary: "leave the emulator",
        argument: Argument::None,
        aliases: &["quit"],
        verb: Verb::Exit,
    },
];

/// Reasons a line or override is rejected.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CommandError<'a> {
    /// The line holds nothing but whitespace.
    Empty,
    UnknownCommand(&'a str),
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },
    InvalidNumber {
        command: &'static str,
        lexeme: &'a str,
    },
    TrailingInput(&'a str),
    /// A `--key=value` override without the `--`, the `=` or a numeric value.
    MalformedOverride(&'a str),
}

impl fmt::Display for CommandError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Empty => f.write_str("empty command"),
            CommandError::UnknownCommand(word) => {
                write!(f, "unknown command `{word}` (try `help`)")
            }
            CommandError::MissingArgument { command, expected } => {
                write!(f, "`{command}` expects {expected}")
            }
            CommandError::InvalidNumber { command, lexeme } => {
                write!(f, "`{command}`: `{lexeme}` is not a valid number")
            }
            CommandError::TrailingInput(rest) => write!(f, "unexpected `{rest}` after command"),
            CommandError::MalformedOverride(arg) => {
                write!(f, "override `{arg}` must look like --key=value")
            }
        }
    }
}

/// Parses one REPL line.
///
/// # Errors
///
/// Returns a [`CommandError`] describing the first problem in the line.
pub fn parse(line: &str) -> Result<Command, CommandError<'_>> {
    let mut input = line;
    let Some(keyword) = next_word(&mut input) else {
        return Err(CommandError::Empty);
    };
    let spec = find(keyword).ok_or(CommandError::UnknownCommand(keyword))?;

    let value = match spec.argument {
        Argument::None => 0,
        Argument::OptionalCount => match next_word(&mut input) {
            None => 1,
            Some(word) => match unsigned::<u32>(word) {
                Some(count) if count > 0 => count,
                _ => return Err(invalid(spec, word)),
            },
        },
        Argument::Required { expected, max } => {
            let word = next_word(&mut input).ok_or(CommandError::MissingArgument {
                command: spec.name,
                expected,
            })?;
            unsigned::<u32>(word)
                .filter(|value| *value <= max)
                .ok_or_else(|| invalid(spec, word))?
        }
    };

    if let Some(rest) = next_word(&mut input) {
        return Err(CommandError::TrailingInput(rest));
    }

    let command = match spec.verb {
        Verb::Clockwise => Command::Rotate {
            direction: Direction::Clockwise,
            detents: value,
        },
        Verb::CounterClockwise => Command::Rotate {
            direction: Direction::CounterClockwise,
            detents: value,
        },
        Verb::Bounce => Command::Bounce,
        Verb::Motion => Command::Motion,
        Verb::Light => Command::Light(u16::try_from(value).unwrap_or(u16::MAX)),
        Verb::Wait => Command::Wait(value),
        Verb::Status => Command::Status,
        Verb::Help => Command::Help,
        Verb::Exit => Command::Exit,
    };
    Ok(command)
}

/// Splits a `--key=value` command-line override into its key and signed value.
///
/// # Errors
///
/// Returns [`CommandError::MalformedOverride`] when the argument does not have
/// that shape.
pub fn parse_override(arg: &str) -> Result<(&str, i64), CommandError<'_>> {
    let key = take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    preceded("--", separated_pair(key, '=', dec_int::<_, i64, ContextError>))
        .parse(arg)
        .map_err(|_| CommandError::MalformedOverride(arg))
}

/// Looks up a command keyword, ignoring ASCII case.
#[must_use]
pub fn find(keyword: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| {
        spec.name.eq_ignore_ascii_case(keyword)
            || spec
                .aliases
                .iter()
                .any(|alias| alias.eq_ignore_ascii_case(keyword))
    })
}

fn word<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    preceded(space0, take_while(1.., |c: char| !c.is_whitespace())).parse_next(input)
}

fn next_word<'a>(input: &mut &'a str) -> Option<&'a str> {
    opt(word).parse_next(input).ok().flatten()
}

fn unsigned<T>(word: &str) -> Option<T>
where
    T: winnow::ascii::Uint,
{
    dec_uint::<_, T, ContextError>.parse(word).ok()
}

fn invalid<'a>(spec: &CommandSpec, lexeme: &'a str) -> CommandError<'a> {
    CommandError::InvalidNumber {
        command: spec.name,
        lexeme,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_count_defaults_to_one() {
        assert_eq!(
            parse("cw"),
            Ok(Command::Rotate {
                direction: Direction::Clockwise,
                detents: 1
            })
        );
        assert_eq!(
            parse("  CCW   4 "),
            Ok(Command::Rotate {
                direction: Direction::CounterClockwise,
                detents: 4
            })
        );
    }

    #[test]
    fn zero_detents_are_rejected() {
        assert_eq!(
            parse("cw 0"),
            Err(CommandError::InvalidNumber {
                command: "cw",
                lexeme: "0"
            })
        );
    }

    #[test]
    fn required_arguments_are_enforced() {
        assert_eq!(
            parse("wait"),
            Err(CommandError::MissingArgument {
                command: "wait",
                expected: "a duration in milliseconds"
            })
        );
        assert_eq!(parse("wait 6000"), Ok(Command::Wait(6_000)));
        assert_eq!(parse("light 42"), Ok(Command::Light(42)));
    }

    #[test]
    fn numbers_must_fill_their_word() {
        assert_eq!(
            parse("wait 10x"),
            Err(CommandError::InvalidNumber {
                command: "wait",
                lexeme: "10x"
            })
        );
        assert!(matches!(
            parse("light 70000"),
            Err(CommandError::InvalidNumber { command: "light", .. })
        ));
    }

    #[test]
    fn rejects_unknown_and_trailing_words() {
        assert_eq!(parse("   "), Err(CommandError::Empty));
        assert_eq!(parse("jump"), Err(CommandError::UnknownCommand("jump")));
        assert_eq!(parse("motion now"), Err(CommandError::TrailingInput("now")));
    }

    #[test]
    fn quit_is_an_alias_for_exit() {
        assert_eq!(parse("quit"), Ok(Command::Exit));
        assert_eq!(parse("exit"), Ok(Command::Exit));
    }

    #[test]
    fn overrides_split_key_and_signed_value() {
        assert_eq!(parse_override("--hue_step=-30"), Ok(("hue_step", -30)));
        assert_eq!(parse_override("--led-on-ms=500"), Ok(("led-on-ms", 500)));
        assert_eq!(
            parse_override("hue_step=5"),
            Err(CommandError::MalformedOverride("hue_step=5"))
        );
        assert_eq!(
            parse_override("--hue_step=fast"),
            Err(CommandError::MalformedOverride("--hue_step=fast"))
        );
    }
}
