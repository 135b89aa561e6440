//! Per-LED color calibration: gamma, primary-target matrix, saturation/
//! luminance gain, backlight floor and brightness compensation.
//!
//! The stage order mirrors the teacher's `RgbTransformer`/`HSVTransformer`
//! split (gamma+levels in RGB, gain in HSV), generalized with a primary-color
//! target matrix and a backlight floor.

use serde::{Deserialize, Serialize};

use super::hsv::Hsv;
use super::rgb::Rgb8;

/// How brightness compensation scales RGB vs. white/CMY sub-pixels. Most
/// strips are plain RGB, but the field exists so a driver for an RGBW strip
/// can read a different scale for its white channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompensationKind {
    Rgb,
    Rgbw,
}

/// Per-channel gamma curve and level remapping, directly generalizing the
/// teacher's `AdditiveColorConf` (threshold/gamma/blacklevel/whitelevel) from
/// one channel to a full 3x3 primary-target matrix.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LedCalibration {
    /// Per-channel gamma correction factor, applied before the matrix.
    pub gamma: [f32; 3],
    /// White point scale applied after gamma, before the matrix.
    pub white_point: [f32; 3],
    /// Row-major 3x3 matrix mapping source primaries to the strip's actual
    /// primary colors; identity reproduces the input unchanged.
    pub rgb_target: [[f32; 3]; 3],
    pub saturation_gain: f32,
    pub luminance_gain: f32,
    /// Lift dark values to this minimum brightness (0..1), applied last.
    pub backlight_threshold: f32,
    pub brightness: f32,
    pub compensation: CompensationKind,
}

impl Default for LedCalibration {
    fn default() -> Self {
        LedCalibration {
            gamma: [1.0, 1.0, 1.0],
            white_point: [1.0, 1.0, 1.0],
            rgb_target: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            saturation_gain: 1.0,
            luminance_gain: 1.0,
            backlight_threshold: 0.0,
            brightness: 1.0,
            compensation: CompensationKind::Rgb,
        }
    }
}

impl LedCalibration {
    /// `gamma=(1,1,1)` with every other field at its default (identity
    /// matrix, unit gains, no backlight floor, full brightness) must be a
    /// pass-through, per the pipeline's gamma-identity invariant.
    pub fn is_identity(&self) -> bool {
        self.gamma == [1.0, 1.0, 1.0]
            && self.white_point == [1.0, 1.0, 1.0]
            && self.rgb_target == LedCalibration::default().rgb_target
            && self.saturation_gain == 1.0
            && self.luminance_gain == 1.0
            && self.backlight_threshold == 0.0
            && self.brightness == 1.0
    }

    pub fn apply(&self, input: Rgb8) -> Rgb8 {
        if self.is_identity() {
            return input;
        }

        let mut channels = [input.r as f32 / 255.0, input.g as f32 / 255.0, input.b as f32 / 255.0];
        for (c, (&gamma, &wp)) in channels.iter_mut().zip(self.gamma.iter().zip(self.white_point.iter())) {
            *c = c.powf(gamma) * wp;
        }

        let matrix = &self.rgb_target;
        let mixed = [
            matrix[0][0] * channels[0] + matrix[0][1] * channels[1] + matrix[0][2] * channels[2],
            matrix[1][0] * channels[0] + matrix[1][1] * channels[1] + matrix[1][2] * channels[2],
            matrix[2][0] * channels[0] + matrix[2][1] * channels[1] + matrix[2][2] * channels[2],
        ];

        let rgb = Rgb8::new(
            (mixed[0].clamp(0.0, 1.0) * 255.0).round() as u8,
            (mixed[1].clamp(0.0, 1.0) * 255.0).round() as u8,
            (mixed[2].clamp(0.0, 1.0) * 255.0).round() as u8,
        );

        let hsv = rgb.to_hsv();
        let gained = Hsv {
            hue: hsv.hue,
            saturation: (hsv.saturation * self.saturation_gain).min(1.0),
            value: (hsv.value * self.luminance_gain).min(1.0),
        };
        let gained_rgb = gained.to_rgb();

        let lift = |c: u8| -> u8 {
            let floor = (self.backlight_threshold * 255.0).round() as u8;
            c.max(floor)
        };

        let floored = Rgb8::new(lift(gained_rgb.r), lift(gained_rgb.g), lift(gained_rgb.b));

        let scale = |c: u8| -> u8 { (c as f32 * self.brightness).clamp(0.0, 255.0).round() as u8 };
        match self.compensation {
            CompensationKind::Rgb => Rgb8::new(scale(floored.r), scale(floored.g), scale(floored.b)),
            CompensationKind::Rgbw => {
                // The shared white/CMY sub-pixel is the common minimum across
                // channels; leave it unscaled and only dim the colored
                // remainder, so brightness changes don't shift color temperature.
                let white = floored.r.min(floored.g).min(floored.b);
                let scale_channel = |c: u8| -> u8 { white.saturating_add(scale(c.saturating_sub(white))) };
                Rgb8::new(scale_channel(floored.r), scale_channel(floored.g), scale_channel(floored.b))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_calibration_is_pass_through() {
        let calib = LedCalibration::default();
        for &rgb in &[Rgb8::new(10, 200, 40), Rgb8::BLACK, Rgb8::WHITE] {
            assert_eq!(calib.apply(rgb), rgb);
        }
    }

    #[test]
    fn backlight_threshold_lifts_dark_values() {
        let mut calib = LedCalibration::default();
        calib.backlight_threshold = 0.1;
        let lifted = calib.apply(Rgb8::BLACK);
        let floor = (0.1_f32 * 255.0).round() as u8;
        assert_eq!(lifted, Rgb8::new(floor, floor, floor));
    }

    #[test]
    fn brightness_scales_down_uniformly() {
        let mut calib = LedCalibration::default();
        calib.brightness = 0.5;
        let scaled = calib.apply(Rgb8::new(200, 200, 200));
        assert_eq!(scaled, Rgb8::new(100, 100, 100));
    }

    #[test]
    fn rgbw_compensation_leaves_the_shared_white_floor_unscaled() {
        let mut calib = LedCalibration::default();
        calib.brightness = 0.5;
        calib.compensation = CompensationKind::Rgbw;
        // white component is min(200, 100, 100) = 100; only the remaining
        // 100 of red gets dimmed, the shared 100 floor does not.
        let scaled = calib.apply(Rgb8::new(200, 100, 100));
        assert_eq!(scaled, Rgb8::new(150, 100, 100));
    }

    #[test]
    fn rgbw_compensation_clamps_instead_of_overflowing_at_high_brightness() {
        let mut calib = LedCalibration::default();
        calib.brightness = 2.0;
        calib.compensation = CompensationKind::Rgbw;
        let scaled = calib.apply(Rgb8::new(200, 100, 100));
        assert_eq!(scaled, Rgb8::new(255, 100, 100));
    }

    #[test]
    fn rgb_compensation_scales_every_channel_including_the_shared_floor() {
        let mut calib = LedCalibration::default();
        calib.brightness = 0.5;
        let scaled = calib.apply(Rgb8::new(200, 100, 100));
        assert_eq!(scaled, Rgb8::new(100, 50, 50));
    }
}
