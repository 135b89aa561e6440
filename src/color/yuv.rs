//! Y'UV color space used by the YUV/hybrid smoothing interpolators and the
//! automatic SDR/HDR tone-mapping threshold check.

use super::rgb::Rgb8;

/// Selects which standard matrix is used to convert between RGB and Y'UV.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum YuvMatrix {
    Bt601,
    Bt709,
    Bt2020,
}

impl YuvMatrix {
    /// (Kr, Kb) luma coefficients for this matrix; Kg is derived as `1 - Kr - Kb`.
    const fn coefficients(self) -> (f32, f32) {
        match self {
            YuvMatrix::Bt601 => (0.299, 0.114),
            YuvMatrix::Bt709 => (0.2126, 0.0722),
            YuvMatrix::Bt2020 => (0.2627, 0.0593),
        }
    }
}

/// A Y'UV triplet, each component normalized to `[0, 1]` (U/V are centered
/// around `0.5` rather than signed, matching the 8-bit-friendly convention
/// used by the source frame's pixel format tag).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Yuv {
    pub y: f32,
    pub u: f32,
    pub v: f32,
}

pub fn rgb_to_yuv(rgb: Rgb8, matrix: YuvMatrix) -> Yuv {
    let (kr, kb) = matrix.coefficients();
    let kg = 1.0 - kr - kb;
    let (r, g, b) = (rgb.r as f32 / 255.0, rgb.g as f32 / 255.0, rgb.b as f32 / 255.0);

    let y = kr * r + kg * g + kb * b;
    let u = (b - y) / (2.0 * (1.0 - kb));
    let v = (r - y) / (2.0 * (1.0 - kr));

    Yuv { y, u: u + 0.5, v: v + 0.5 }
}

pub fn yuv_to_rgb(yuv: Yuv, matrix: YuvMatrix) -> Rgb8 {
    let (kr, kb) = matrix.coefficients();
    let kg = 1.0 - kr - kb;
    let u = yuv.u - 0.5;
    let v = yuv.v - 0.5;

    let r = yuv.y + v * 2.0 * (1.0 - kr);
    let b = yuv.y + u * 2.0 * (1.0 - kb);
    let g = (yuv.y - kr * r - kb * b) / kg;

    let to_u8 = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    Rgb8::new(to_u8(r), to_u8(g), to_u8(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Rgb8, b: Rgb8, tol: i16) {
        let d = |x: u8, y: u8| (x as i16 - y as i16).abs();
        assert!(d(a.r, b.r) <= tol && d(a.g, b.g) <= tol && d(a.b, b.b) <= tol, "{a:?} != {b:?}");
    }

    #[test]
    fn round_trip_within_one_255th_for_all_matrices() {
        let samples = [
            Rgb8::new(255, 0, 0),
            Rgb8::new(0, 255, 0),
            Rgb8::new(0, 0, 255),
            Rgb8::new(128, 128, 128),
            Rgb8::new(17, 201, 64),
            Rgb8::BLACK,
            Rgb8::WHITE,
        ];
        for matrix in [YuvMatrix::Bt601, YuvMatrix::Bt709, YuvMatrix::Bt2020] {
            for &rgb in &samples {
                let back = yuv_to_rgb(rgb_to_yuv(rgb, matrix), matrix);
                assert_close(rgb, back, 1);
            }
        }
    }
}
