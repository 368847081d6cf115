#![no_std]

// Shared logic for the motion-activated night light.
//
// This crate stays portable across MCU firmware and host tooling by avoiding the
// Rust standard library. Hardware access is expressed through the traits in
// `platform`; the firmware and the emulator provide the implementations.

pub mod color;
pub mod config;
pub mod controller;
pub mod handlers;
pub mod platform;
pub mod repl;
pub mod shared;
pub mod sleep;
pub mod telemetry;
pub mod time;

pub use color::{Hue, Rgb, hue_to_rgb, normalize_hue};
pub use config::{ConfigError, NightLightConfig};
pub use controller::{Mode, ModeController};
pub use handlers::{EncoderEdgeHandler, EncoderLines, EncoderOutcome, MotionEdgeHandler};
pub use shared::{SharedState, StoreSnapshot};
pub use sleep::{SleepCycleController, WakeReason, WakeReport};
pub use time::Millis;
