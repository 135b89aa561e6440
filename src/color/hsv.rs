//! HSV color space, used for saturation/luminance gain adjustments in the
//! per-LED calibration stage.

use super::rgb::Rgb8;

/// A pixel in the [HSV](http://en.wikipedia.org/wiki/HSL_and_HSV) color model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsv {
    pub hue: f32,
    pub saturation: f32,
    pub value: f32,
}

impl Hsv {
    pub fn to_rgb(&self) -> Rgb8 {
        if self.saturation <= 0.0 {
            let v = (self.value.clamp(0.0, 1.0) * 255.0).round() as u8;
            return Rgb8::new(v, v, v);
        }

        let hue = self.hue.rem_euclid(1.0) * 6.0;
        let sector = hue.floor() as u32 % 6;
        let frac = hue - hue.floor();
        let value = self.value.clamp(0.0, 1.0);
        let sat = self.saturation.clamp(0.0, 1.0);

        let p = value * (1.0 - sat);
        let q = value * (1.0 - sat * frac);
        let t = value * (1.0 - sat * (1.0 - frac));

        let (r, g, b) = match sector {
            0 => (value, t, p),
            1 => (q, value, p),
            2 => (p, value, t),
            3 => (p, q, value),
            4 => (t, p, value),
            _ => (value, p, q),
        };

        let to_u8 = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        Rgb8::new(to_u8(r), to_u8(g), to_u8(b))
    }
}

impl Rgb8 {
    pub fn to_hsv(&self) -> Hsv {
        let (r, g, b) = (self.r as f32 / 255.0, self.g as f32 / 255.0, self.b as f32 / 255.0);
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let chroma = max - min;

        let hue = if chroma == 0.0 {
            0.0
        } else if max == r {
            ((g - b) / chroma).rem_euclid(6.0)
        } else if max == g {
            (b - r) / chroma + 2.0
        } else {
            (r - g) / chroma + 4.0
        } / 6.0;

        let saturation = if max == 0.0 { 0.0 } else { chroma / max };

        Hsv { hue, saturation, value: max }
    }
}
