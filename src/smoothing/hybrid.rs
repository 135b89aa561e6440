//! Spring-damper interpolators: [`HybridInterpolator`] runs the spring in
//! Y'UV space with a per-step luminance cap, [`HybridRgbInterpolator`] runs
//! the same physics directly in RGB (spec §4.3.1).

use std::time::Duration;

use crate::color::{rgb_to_yuv, yuv_to_rgb, Rgb8, Yuv, YuvMatrix};

use super::interpolator::Interpolator;

/// Critically-damped spring-mass state shared by both hybrid variants:
/// `acceleration = stiffness * (target - position) - damping * velocity`.
#[derive(Clone, Copy, Default)]
struct SpringState3 {
    velocity: [f32; 3],
}

fn spring_step(position: [f32; 3], target: [f32; 3], state: &mut SpringState3, stiffness: f32, damping: f32, dt: f32) -> [f32; 3] {
    let mut next = position;
    for i in 0..3 {
        let accel = stiffness * (target[i] - position[i]) - damping * state.velocity[i];
        state.velocity[i] += accel * dt;
        next[i] = position[i] + state.velocity[i] * dt;
    }
    next
}

pub struct HybridInterpolator {
    stiffness: f32,
    damping: f32,
    y_limit: f32,
    matrix: YuvMatrix,
    velocities: Vec<SpringState3>,
}

impl HybridInterpolator {
    pub fn new(stiffness: f32, damping: f32, y_limit: f32) -> Self {
        HybridInterpolator { stiffness, damping, y_limit: y_limit.max(0.0), matrix: YuvMatrix::Bt709, velocities: Vec::new() }
    }
}

impl Interpolator for HybridInterpolator {
    fn step(&mut self, current: &[Rgb8], target: &[Rgb8], dt: Duration) -> Vec<Rgb8> {
        if self.velocities.len() != current.len() {
            self.velocities = vec![SpringState3::default(); current.len()];
        }
        let dt_s = dt.as_secs_f32();

        current
            .iter()
            .zip(target.iter())
            .zip(self.velocities.iter_mut())
            .map(|((&c, &t), state)| {
                let cy = rgb_to_yuv(c, self.matrix);
                let ty = rgb_to_yuv(t, self.matrix);
                let pos = [cy.y, cy.u, cy.v];
                let tgt = [ty.y, ty.u, ty.v];
                let mut next = spring_step(pos, tgt, state, self.stiffness, self.damping, dt_s);

                if self.y_limit > 0.0 {
                    let delta = (next[0] - pos[0]).clamp(-self.y_limit, self.y_limit);
                    next[0] = pos[0] + delta;
                }

                yuv_to_rgb(Yuv { y: next[0], u: next[1], v: next[2] }, self.matrix)
            })
            .collect()
    }
}

pub struct HybridRgbInterpolator {
    stiffness: f32,
    damping: f32,
    velocities: Vec<SpringState3>,
}

impl HybridRgbInterpolator {
    pub fn new(stiffness: f32, damping: f32) -> Self {
        HybridRgbInterpolator { stiffness, damping, velocities: Vec::new() }
    }
}

impl Interpolator for HybridRgbInterpolator {
    fn step(&mut self, current: &[Rgb8], target: &[Rgb8], dt: Duration) -> Vec<Rgb8> {
        if self.velocities.len() != current.len() {
            self.velocities = vec![SpringState3::default(); current.len()];
        }
        let dt_s = dt.as_secs_f32();

        current
            .iter()
            .zip(target.iter())
            .zip(self.velocities.iter_mut())
            .map(|((&c, &t), state)| {
                let pos = [c.r as f32, c.g as f32, c.b as f32];
                let tgt = [t.r as f32, t.g as f32, t.b as f32];
                let next = spring_step(pos, tgt, state, self.stiffness, self.damping, dt_s);
                let to_u8 = |v: f32| v.clamp(0.0, 255.0).round() as u8;
                Rgb8::new(to_u8(next[0]), to_u8(next[1]), to_u8(next[2]))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hybrid_rgb_moves_toward_target_without_diverging() {
        let mut interp = HybridRgbInterpolator::new(40.0, 12.0);
        let mut current = vec![Rgb8::BLACK];
        let target = vec![Rgb8::new(200, 200, 200)];
        for _ in 0..50 {
            current = interp.step(&current, &target, Duration::from_millis(16));
        }
        assert!(current[0].r > 150, "spring should have converged close to target, got {:?}", current[0]);
    }

    #[test]
    fn hybrid_yuv_caps_luminance_delta_per_step() {
        let mut interp = HybridInterpolator::new(80.0, 20.0, 0.015);
        let current = vec![Rgb8::BLACK];
        let target = vec![Rgb8::WHITE];
        let out = interp.step(&current, &target, Duration::from_millis(16));
        let y_before = rgb_to_yuv(Rgb8::BLACK, YuvMatrix::Bt709).y;
        let y_after = rgb_to_yuv(out[0], YuvMatrix::Bt709).y;
        assert!((y_after - y_before).abs() <= 0.016);
    }
}
