//! Author-facing configuration.
//!
//! `ChargeParams` and `FlashlightSettings` carry raw values as they were
//! written (by hand or from a settings file). `FlashlightConfig` is the
//! validated form the state machine consumes; once built it is read-only.

use crate::constants::*;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be non-negative (got {value})")]
    Negative { field: &'static str, value: f32 },
    #[error("{field} must be greater than zero (got {value})")]
    NotPositive { field: &'static str, value: f32 },
    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },
    #[error("control binding must not be empty")]
    EmptyBinding,
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ChargeParams {
    pub max_intensity: f32,
    pub charge_chunk: f32,
    pub charge_rate: f32,
    pub decay_rate: f32,
}

impl Default for ChargeParams {
    fn default() -> Self {
        Self {
            max_intensity: DEFAULT_MAX_INTENSITY,
            charge_chunk: DEFAULT_CHARGE_CHUNK,
            charge_rate: DEFAULT_CHARGE_RATE,
            decay_rate: DEFAULT_DECAY_RATE,
        }
    }
}

impl ChargeParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check("max_intensity", self.max_intensity)?;
        check("charge_chunk", self.charge_chunk)?;
        check("charge_rate", self.charge_rate)?;
        check("decay_rate", self.decay_rate)?;
        Ok(())
    }
}

fn check(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NonFinite { field });
    }
    if value < 0.0 {
        return Err(ConfigError::Negative { field, value });
    }
    Ok(())
}

/// Timing guards for wind-up scrubbing, in seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ScrubTuning {
    pub end_guard_sec: f32,
    pub hysteresis_sec: f32,
}

impl ScrubTuning {
    /// The end guard must be strictly positive so a scrub never lands on the
    /// last instant of the clip.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check("end_guard_sec", self.end_guard_sec)?;
        if self.end_guard_sec == 0.0 {
            return Err(ConfigError::NotPositive {
                field: "end_guard_sec",
                value: self.end_guard_sec,
            });
        }
        check("hysteresis_sec", self.hysteresis_sec)?;
        Ok(())
    }
}

impl Default for ScrubTuning {
    fn default() -> Self {
        Self {
            end_guard_sec: SCRUB_END_GUARD_SEC,
            hysteresis_sec: SCRUB_HYSTERESIS_SEC,
        }
    }
}

/// Raw settings as an author writes them.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FlashlightSettings {
    pub control: String,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub charge: ChargeParams,
    pub scrub: ScrubTuning,
}

impl Default for FlashlightSettings {
    fn default() -> Self {
        Self {
            control: DEFAULT_CONTROL_BINDING.to_string(),
            charge: ChargeParams::default(),
            scrub: ScrubTuning::default(),
        }
    }
}

/// Validated, immutable configuration for one flashlight session.
#[derive(Clone, Debug, PartialEq)]
pub struct FlashlightConfig {
    control: String,
    charge: ChargeParams,
    scrub: ScrubTuning,
}

impl FlashlightConfig {
    pub fn new(control: impl Into<String>, charge: ChargeParams) -> Result<Self, ConfigError> {
        let control = control.into();
        if control.trim().is_empty() {
            return Err(ConfigError::EmptyBinding);
        }
        charge.validate()?;
        Ok(Self {
            control,
            charge,
            scrub: ScrubTuning::default(),
        })
    }

    pub fn with_scrub(mut self, scrub: ScrubTuning) -> Result<Self, ConfigError> {
        scrub.validate()?;
        self.scrub = scrub;
        Ok(self)
    }

    pub fn from_settings(settings: &FlashlightSettings) -> Result<Self, ConfigError> {
        Self::new(settings.control.clone(), settings.charge)?.with_scrub(settings.scrub)
    }

    pub fn control(&self) -> &str {
        &self.control
    }
    pub fn max_intensity(&self) -> f32 {
        self.charge.max_intensity
    }
    pub fn charge_chunk(&self) -> f32 {
        self.charge.charge_chunk
    }
    pub fn charge_rate(&self) -> f32 {
        self.charge.charge_rate
    }
    pub fn decay_rate(&self) -> f32 {
        self.charge.decay_rate
    }
    pub fn scrub(&self) -> ScrubTuning {
        self.scrub
    }
}

impl Default for FlashlightConfig {
    fn default() -> Self {
        Self {
            control: DEFAULT_CONTROL_BINDING.to_string(),
            charge: ChargeParams::default(),
            scrub: ScrubTuning::default(),
        }
    }
}
