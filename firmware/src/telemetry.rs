#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Mirrors controller telemetry onto the debug probe.
//!
//! On target every record goes out over RTT through `defmt`; a host build
//! prints the same line so the formatting can be checked without a probe.

use nightlight_core::telemetry::{TelemetryEvent, TelemetryRecord};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Severity {
    Info,
    Warn,
}

#[must_use]
pub const fn severity(event: TelemetryEvent) -> Severity {
    if event.is_notable() {
        Severity::Warn
    } else {
        Severity::Info
    }
}

/// Sink handed to `ModeController::run_with`.
pub fn emit(record: &TelemetryRecord) {
    emit_log(severity(record.event), record);
}

#[cfg(target_os = "none")]
fn emit_log(severity: Severity, record: &TelemetryRecord) {
    match severity {
        Severity::Info => defmt::info!("telemetry {}", defmt::Display2Format(record)),
        Severity::Warn => defmt::warn!("telemetry {}", defmt::Display2Format(record)),
    }
}

#[cfg(not(target_os = "none"))]
fn emit_log(severity: Severity, record: &TelemetryRecord) {
    match severity {
        Severity::Info => println!("telemetry {record}"),
        Severity::Warn => println!("telemetry WARN {record}"),
    }
}
