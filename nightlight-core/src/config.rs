//! Timing and threshold constants for the night light.
//!
//! Firmware builds use [`NightLightConfig::DEFAULT`] verbatim; the emulator
//! lets the operator override individual values and runs [`validate`] before
//! handing the config to the controller.
//!
//! [`validate`]: NightLightConfig::validate

use core::fmt;

/// Encoder chatter rejection window.
pub const DEBOUNCE_MS: u32 = 5;
/// Inactivity period after which color adjustment ends.
pub const COLOR_TIMEOUT_MS: u32 = 5_000;
/// How long the LED stays lit after motion in the dark.
pub const LED_ON_MS: u32 = 20_000;
/// Quiet period after illumination while the PIR output settles.
pub const COOLDOWN_MS: u32 = 3_000;
/// Hue change per encoder detent (24 detents per turn).
pub const HUE_STEP_DEGREES: i16 = 15;
/// Light sensor readings below this value count as dark.
pub const DARK_THRESHOLD: u16 = 50;
/// PIR calibration period after power-on.
pub const PIR_WARMUP_MS: u32 = 30_000;
/// Status LED toggle period during the PIR warm-up.
pub const WARMUP_BLINK_MS: u32 = 500;
/// Settling time after powering the light sensor's analog front end.
pub const SENSOR_SETTLE_MS: u32 = 100;
/// Pause taken instead of the illumination hold when it is bright.
pub const BRIGHT_SKIP_MS: u32 = 10;
/// Delay between cooperative loop passes.
pub const POLL_INTERVAL_MS: u32 = 1;

/// Complete set of tunables consumed by the controller and the edge handlers.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct NightLightConfig {
    pub debounce_ms: u32,
    pub color_timeout_ms: u32,
    pub led_on_ms: u32,
    pub cooldown_ms: u32,
    pub hue_step: i16,
    pub dark_threshold: u16,
    pub warmup_ms: u32,
    pub warmup_blink_ms: u32,
    pub sensor_settle_ms: u32,
    pub bright_skip_ms: u32,
    pub poll_interval_ms: u32,
}

impl NightLightConfig {
    /// Values used by the shipped firmware.
    pub const DEFAULT: Self = Self {
        debounce_ms: DEBOUNCE_MS,
        color_timeout_ms: COLOR_TIMEOUT_MS,
        led_on_ms: LED_ON_MS,
        cooldown_ms: COOLDOWN_MS,
        hue_step: HUE_STEP_DEGREES,
        dark_threshold: DARK_THRESHOLD,
        warmup_ms: PIR_WARMUP_MS,
        warmup_blink_ms: WARMUP_BLINK_MS,
        sensor_settle_ms: SENSOR_SETTLE_MS,
        bright_skip_ms: BRIGHT_SKIP_MS,
        poll_interval_ms: POLL_INTERVAL_MS,
    };

    /// Returns the default configuration with the PIR warm-up skipped.
    #[must_use]
    pub const fn without_warmup(mut self) -> Self {
        self.warmup_ms = 0;
        self
    }

    /// Overrides one field by name. Keys are the field names, with `-`
    /// accepted in place of `_`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownKey`] for an unrecognized name and
    /// [`ConfigError::ValueOutOfRange`] when `value` does not fit the field.
    pub fn set(&mut self, key: &str, value: i64) -> Result<(), ConfigError> {
        let field = FIELDS
            .iter()
            .find(|name| key_matches(name, key))
            .copied()
            .ok_or(ConfigError::UnknownKey)?;
        let out_of_range = ConfigError::ValueOutOfRange { key: field };

        match field {
            "hue_step" => self.hue_step = i16::try_from(value).map_err(|_| out_of_range)?,
            "dark_threshold" => {
                self.dark_threshold = u16::try_from(value).map_err(|_| out_of_range)?;
            }
            _ => {
                let millis = u32::try_from(value).map_err(|_| out_of_range)?;
                *self.millis_field(field).ok_or(ConfigError::UnknownKey)? = millis;
            }
        }
        Ok(())
    }

    fn millis_field(&mut self, field: &str) -> Option<&mut u32> {
        Some(match field {
            "debounce_ms" => &mut self.debounce_ms,
            "color_timeout_ms" => &mut self.color_timeout_ms,
            "led_on_ms" => &mut self.led_on_ms,
            "cooldown_ms" => &mut self.cooldown_ms,
            "warmup_ms" => &mut self.warmup_ms,
            "warmup_blink_ms" => &mut self.warmup_blink_ms,
            "sensor_settle_ms" => &mut self.sensor_settle_ms,
            "bright_skip_ms" => &mut self.bright_skip_ms,
            "poll_interval_ms" => &mut self.poll_interval_ms,
            _ => return None,
        })
    }

    /// Checks that the values describe a usable device.
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hue_step == 0 || self.hue_step.unsigned_abs() >= 360 {
            return Err(ConfigError::HueStepOutOfRange(self.hue_step));
        }
        if self.debounce_ms >= self.color_timeout_ms {
            return Err(ConfigError::DebounceExceedsTimeout {
                debounce_ms: self.debounce_ms,
                color_timeout_ms: self.color_timeout_ms,
            });
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.warmup_ms > 0 && self.warmup_blink_ms == 0 {
            return Err(ConfigError::ZeroBlinkPeriod);
        }
        Ok(())
    }
}

/// Names accepted by [`NightLightConfig::set`].
pub const FIELDS: &[&str] = &[
    "debounce_ms",
    "color_timeout_ms",
    "led_on_ms",
    "cooldown_ms",
    "hue_step",
    "dark_threshold",
    "warmup_ms",
    "warmup_blink_ms",
    "sensor_settle_ms",
    "bright_skip_ms",
    "poll_interval_ms",
];

fn key_matches(field: &str, key: &str) -> bool {
    field.len() == key.len()
        && field
            .bytes()
            .zip(key.bytes())
            .all(|(f, k)| f == k.to_ascii_lowercase() || (f == b'_' && k == b'-'))
}

impl Default for NightLightConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Reasons a [`NightLightConfig`] is rejected.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConfigError {
    /// The hue step must move the hue and must not wrap a full turn.
    HueStepOutOfRange(i16),
    /// A debounce window as long as the color timeout would swallow every edge.
    DebounceExceedsTimeout {
        debounce_ms: u32,
        color_timeout_ms: u32,
    },
    /// The cooperative loop needs a non-zero pause between passes.
    ZeroPollInterval,
    /// The warm-up blink needs a non-zero period.
    ZeroBlinkPeriod,
    /// No field has the given name.
    UnknownKey,
    /// The value does not fit the named field.
    ValueOutOfRange { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::HueStepOutOfRange(step) => {
                write!(f, "hue step {step} must be non-zero and below 360 degrees")
            }
            ConfigError::DebounceExceedsTimeout {
                debounce_ms,
                color_timeout_ms,
            } => write!(
                f,
                "debounce window {debounce_ms}ms must be shorter than color timeout {color_timeout_ms}ms"
            ),
            ConfigError::ZeroPollInterval => f.write_str("poll interval must be non-zero"),
            ConfigError::ZeroBlinkPeriod => f.write_str("warm-up blink period must be non-zero"),
            ConfigError::UnknownKey => f.write_str("unknown configuration key"),
            ConfigError::ValueOutOfRange { key } => write!(f, "value out of range for {key}"),
        }
    }
}
