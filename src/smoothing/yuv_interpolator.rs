//! Exponential decay in Y'UV space with an explicit per-step luminance-change
//! limit, so a sudden brightness jump doesn't pop (spec §4.3.1
//! "YuvInterpolator").

use std::time::Duration;

use crate::color::{rgb_to_yuv, yuv_to_rgb, Rgb8, Yuv, YuvMatrix};

use super::interpolator::Interpolator;

pub struct YuvInterpolator {
    tau_ms: f32,
    y_limit: f32,
    matrix: YuvMatrix,
}

impl YuvInterpolator {
    pub fn new(settling_time_ms: u32, smoothing_factor: f32, y_limit: f32) -> Self {
        let factor = smoothing_factor.max(0.01);
        YuvInterpolator {
            tau_ms: settling_time_ms as f32 * factor,
            y_limit: y_limit.max(0.0),
            matrix: YuvMatrix::Bt709,
        }
    }
}

impl Interpolator for YuvInterpolator {
    fn step(&mut self, current: &[Rgb8], target: &[Rgb8], dt: Duration) -> Vec<Rgb8> {
        let dt_ms = dt.as_secs_f32() * 1000.0;
        let decay = (-dt_ms / self.tau_ms.max(1.0)).exp();

        current
            .iter()
            .zip(target.iter())
            .map(|(&c, &t)| {
                let cy = rgb_to_yuv(c, self.matrix);
                let ty = rgb_to_yuv(t, self.matrix);

                let decayed = |cur: f32, tgt: f32| tgt - (tgt - cur) * decay;
                let mut y = decayed(cy.y, ty.y);

                if self.y_limit > 0.0 {
                    let delta = y - cy.y;
                    let capped = delta.clamp(-self.y_limit, self.y_limit);
                    y = cy.y + capped;
                }

                let u = decayed(cy.u, ty.u);
                let v = decayed(cy.v, ty.v);

                yuv_to_rgb(Yuv { y, u, v }, self.matrix)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luminance_change_is_capped_per_step() {
        let mut interp = YuvInterpolator::new(100, 1.0, 0.02);
        let current = vec![Rgb8::BLACK];
        let target = vec![Rgb8::WHITE];
        let out = interp.step(&current, &target, Duration::from_millis(20));
        let y_before = rgb_to_yuv(Rgb8::BLACK, YuvMatrix::Bt709).y;
        let y_after = rgb_to_yuv(out[0], YuvMatrix::Bt709).y;
        assert!((y_after - y_before).abs() <= 0.021, "delta-Y must respect y_limit");
    }
}
