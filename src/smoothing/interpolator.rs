//! The `Stepper`, `RgbInterpolator` and `ExponentialInterpolator` temporal
//! filters (spec §4.3.1). The remaining three variants live in
//! [`super::yuv_interpolator`] and [`super::hybrid`].

use std::time::Duration;

use crate::color::{lerp_rgb8, Rgb8};

/// A temporal filter turning an irregular stream of targets into a smooth
/// per-tick output. `on_new_target` is called whenever the upstream target
/// vector changes (not on every tick — only when it actually changes), so a
/// stateful interpolator can reset timers without losing its place between
/// unchanged ticks.
pub trait Interpolator: Send {
    fn on_new_target(&mut self) {}
    fn step(&mut self, current: &[Rgb8], target: &[Rgb8], dt: Duration) -> Vec<Rgb8>;
}

/// Linear ramp that reaches the target exactly at `settling_time_ms` and
/// never overshoots past it (spec §4.3.1 "Stepper").
pub struct Stepper {
    settling_time_ms: f32,
    remaining_ms: f32,
}

impl Stepper {
    pub fn new(settling_time_ms: u32) -> Self {
        let settling_time_ms = settling_time_ms as f32;
        Stepper { settling_time_ms, remaining_ms: settling_time_ms }
    }
}

impl Interpolator for Stepper {
    fn on_new_target(&mut self) {
        self.remaining_ms = self.settling_time_ms;
    }

    fn step(&mut self, current: &[Rgb8], target: &[Rgb8], dt: Duration) -> Vec<Rgb8> {
        if self.remaining_ms <= 0.0 {
            return target.to_vec();
        }
        let dt_ms = dt.as_secs_f32() * 1000.0;
        let fraction = (dt_ms / self.remaining_ms).clamp(0.0, 1.0);
        self.remaining_ms = (self.remaining_ms - dt_ms).max(0.0);
        current.iter().zip(target.iter()).map(|(&c, &t)| lerp_rgb8(c, t, fraction)).collect()
    }
}

/// Exponential decay per channel with a time constant derived from the
/// configured settling time and `smoothing_factor` (spec §4.3.1
/// "RgbInterpolator"): `new = target - (target - current) * exp(-dt / tau)`.
pub struct RgbInterpolator {
    tau_ms: f32,
}

impl RgbInterpolator {
    pub fn new(settling_time_ms: u32, smoothing_factor: f32) -> Self {
        let factor = smoothing_factor.max(0.01);
        RgbInterpolator { tau_ms: settling_time_ms as f32 * factor }
    }
}

impl Interpolator for RgbInterpolator {
    fn step(&mut self, current: &[Rgb8], target: &[Rgb8], dt: Duration) -> Vec<Rgb8> {
        let dt_ms = dt.as_secs_f32() * 1000.0;
        let decay = (-dt_ms / self.tau_ms.max(1.0)).exp();
        current
            .iter()
            .zip(target.iter())
            .map(|(&c, &t)| {
                let blend = |cc: u8, tt: u8| -> u8 {
                    (tt as f32 - (tt as f32 - cc as f32) * decay).round().clamp(0.0, 255.0) as u8
                };
                Rgb8::new(blend(c.r, t.r), blend(c.g, t.g), blend(c.b, t.b))
            })
            .collect()
    }
}

/// Plain single-pole exponential smoothing with a fixed per-tick blend
/// factor, independent of `dt` (spec §4.3.1 "ExponentialInterpolator" — the
/// simplest of the six variants).
pub struct ExponentialInterpolator {
    alpha: f32,
}

impl ExponentialInterpolator {
    pub fn new(smoothing_factor: f32) -> Self {
        ExponentialInterpolator { alpha: smoothing_factor.clamp(0.0, 1.0) }
    }
}

impl Interpolator for ExponentialInterpolator {
    fn step(&mut self, current: &[Rgb8], target: &[Rgb8], _dt: Duration) -> Vec<Rgb8> {
        current.iter().zip(target.iter()).map(|(&c, &t)| lerp_rgb8(c, t, self.alpha)).collect()
    }
}
