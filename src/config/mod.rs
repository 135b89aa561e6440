//! On-disk/over-the-wire JSON configuration (spec §6).

mod layout;
mod schema;

pub use layout::{parse_led_indices, Led, LedLayout, ScanRect};
pub use schema::{
    BorderDetectionSettings, ColorSettings, ColorTransform, DriverConfig, InstanceSettings,
    SettingsKind, SettingsUpdate, SmoothingSettings,
};

use std::path::Path;

use crate::error::ConfigError;

/// Load and validate an [`InstanceSettings`] document from a JSON file on
/// disk. Comments are not supported (the teacher's hand-rolled `//`
/// stripping is dropped along with `rustc-serialize`; standard JSON has no
/// comments and `serde_json` rejects them, which is the right behavior for
/// a config format other tools also write).
pub fn load_instance_settings(path: impl AsRef<Path>) -> Result<InstanceSettings, ConfigError> {
    let raw = std::fs::read_to_string(path)?;
    let settings: InstanceSettings = serde_json::from_str(&raw)?;
    settings.validate()?;
    Ok(settings)
}
