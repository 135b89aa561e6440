//! JSON-shaped configuration documents (spec §6 "Settings updates",
//! "Driver config (persisted)"). Parsing is decoupled from validation:
//! `serde_json` gets us a typed document, [`InstanceSettings::validate`]
//! enforces the domain invariants.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::color::LedCalibration;
use crate::error::ConfigError;
use crate::smoothing::{SmoothingConfig, SmoothingKind};

use super::layout::{parse_led_indices, LedLayout};

/// Driver configuration, persisted as JSON. Unknown keys are ignored;
/// missing keys fall back to device defaults (spec §6).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DriverConfig {
    #[serde(rename = "type")]
    pub kind: String,
    pub output: String,
    #[serde(default = "default_rate")]
    pub rate: u32,
    #[serde(default)]
    pub color_order: String,
    #[serde(default)]
    pub rewrite_time_ms: u32,
    #[serde(default)]
    pub latch_time_ms: u32,
    /// Device-specific keys not modeled above; carried through unexamined.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

fn default_rate() -> u32 {
    115_200
}

/// Which [`crate::reducer::BorderDetector`] strategy an instance runs,
/// generalizing the teacher's fixed zero-border DXGI capture (no border
/// handling at all) to the manual/automatic pair `reducer/border.rs`
/// implements.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum BorderDetectionSettings {
    Manual {
        #[serde(default)]
        h_border: u32,
        #[serde(default)]
        v_border: u32,
    },
    Automatic,
}

impl Default for BorderDetectionSettings {
    fn default() -> Self {
        BorderDetectionSettings::Manual { h_border: 0, v_border: 0 }
    }
}

/// One color-transform entry in a `COLOR` settings update: applies a
/// calibration override to a range of LED indices, generalizing the
/// teacher's `Transform` (which only carried gamma/level/HSV fields) to the
/// full [`LedCalibration`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ColorTransform {
    /// Indices or ranges this transform applies to, e.g. `"0-5, 9, 11-17"`.
    pub leds: String,
    pub calibration: LedCalibration,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ColorSettings {
    #[serde(default)]
    pub transforms: Vec<ColorTransform>,
}

impl ColorSettings {
    /// Expand the transform list into one [`LedCalibration`] per LED,
    /// falling back to the identity calibration for LEDs no transform
    /// covers. Later transforms win on overlap, matching how the teacher's
    /// `led_transformers` folds later entries over earlier ones.
    pub fn expand(&self, led_count: usize) -> Vec<LedCalibration> {
        let mut out = vec![LedCalibration::default(); led_count];
        for transform in &self.transforms {
            for range in parse_led_indices(&transform.leds, led_count) {
                for slot in out.get_mut(range).into_iter().flatten() {
                    *slot = transform.calibration.clone();
                }
            }
        }
        out
    }
}

/// Smoothing settings document, replacing the teacher's hand-written
/// `Decodable` impl for `Smoothing` with a plain derive (the only reason the
/// teacher hand-rolled it was `rustc-serialize`'s lack of `#[serde(rename)]`
/// equivalents).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SmoothingSettings {
    #[serde(rename = "type")]
    pub kind: SmoothingKind,
    pub time_ms: u32,
    #[serde(rename = "updateFrequency")]
    pub update_frequency_hz: f64,
    #[serde(default)]
    pub smoothing_factor: f32,
    #[serde(default)]
    pub stiffness: f32,
    #[serde(default)]
    pub damping: f32,
    #[serde(default)]
    pub y_limit: f32,
    #[serde(default)]
    pub pause: bool,
}

impl From<&SmoothingSettings> for SmoothingConfig {
    fn from(s: &SmoothingSettings) -> Self {
        let update_interval_ms = if s.update_frequency_hz > 0.0 {
            (1000.0 / s.update_frequency_hz).round() as u32
        } else {
            20
        };
        SmoothingConfig {
            settling_time_ms: s.time_ms,
            update_interval_ms: update_interval_ms.max(5),
            kind: s.kind,
            smoothing_factor: s.smoothing_factor,
            stiffness: s.stiffness,
            damping: s.damping,
            y_limit: s.y_limit,
            pause: s.pause,
        }
    }
}

/// Full per-instance settings document, parsed once at instance
/// construction and re-read per-slice on `Settings updates` (spec §6).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InstanceSettings {
    pub name: String,
    pub device: DriverConfig,
    #[serde(default)]
    pub color: ColorSettings,
    pub leds: LedLayout,
    pub smoothing: SmoothingSettings,
    #[serde(default)]
    pub background_effect: Option<String>,
    #[serde(default)]
    pub foreground_effect: Option<String>,
    #[serde(default)]
    pub border: BorderDetectionSettings,
}

impl InstanceSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.leds.is_empty() {
            return Err(ConfigError::InvalidLayout("layout has zero leds".into()));
        }
        for led in &self.leds.leds {
            if !led.rect.is_valid() {
                return Err(ConfigError::InvalidLayout(format!("invalid scan rect: {:?}", led.rect)));
            }
        }
        if self.smoothing.update_frequency_hz <= 0.0 {
            return Err(ConfigError::InvalidLayout("update frequency must be positive".into()));
        }
        Ok(())
    }
}

/// Typed settings-update tags dispatched to the owning component (spec §6).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SettingsKind {
    InstCapture,
    Color,
    Smoothing,
    Device,
    Leds,
    BgEffect,
    FgEffect,
    /// Pause/resume the user smoothing slot without re-supplying a full
    /// `SmoothingSettings` document (payload: `{"pause": bool}`).
    Pause,
}

/// A `(type, json)` settings update as described in spec §6.
#[derive(Clone, Debug)]
pub struct SettingsUpdate {
    pub kind: SettingsKind,
    pub payload: serde_json::Value,
}
