//! Color types and the tone-mapping / calibration stages of the color
//! pipeline (spec §4.3). Temporal smoothing lives in [`crate::smoothing`].

mod calibration;
mod hsv;
mod lut;
mod rgb;
mod yuv;

pub use calibration::{CompensationKind, LedCalibration};
pub use hsv::Hsv;
pub use lut::{AutomaticToneMapping, Lut, LutVariant, ToneMappingMode, ToneMappingThresholds};
pub use rgb::{lerp_rgb8, rgbs_as_bytes, Rgb8};
pub use yuv::{rgb_to_yuv, yuv_to_rgb, Yuv, YuvMatrix};

/// Run the two fixed pipeline stages ahead of smoothing: LUT tone-mapping
/// (when bound) followed by per-LED calibration, in that order (spec §4.3).
pub struct ColorPipeline {
    pub lut: Option<Lut>,
    pub tone_mapping_mode: ToneMappingMode,
    pub auto_tone_mapping: Option<AutomaticToneMapping>,
    pub calibration: Vec<LedCalibration>,
}

impl ColorPipeline {
    pub fn new(led_count: usize) -> Self {
        ColorPipeline {
            lut: None,
            tone_mapping_mode: ToneMappingMode::Off,
            auto_tone_mapping: None,
            calibration: vec![LedCalibration::default(); led_count],
        }
    }

    /// Apply tone-mapping (if bound) then per-LED calibration to one frame's
    /// worth of reducer output. `colors.len()` must equal `self.calibration.len()`.
    pub fn process(&mut self, colors: &mut [Rgb8]) {
        debug_assert_eq!(colors.len(), self.calibration.len());

        let lut = match self.tone_mapping_mode {
            ToneMappingMode::Off => None,
            ToneMappingMode::Manual(variant) => self.lut.as_ref().filter(|l| l.variant() == variant),
            ToneMappingMode::Auto => self.lut.as_ref(),
        };

        for (color, calib) in colors.iter_mut().zip(self.calibration.iter()) {
            if let Some(lut) = lut {
                *color = lut.lookup(*color);
            }
            *color = calib.apply(*color);
        }
    }
}
