//! Temporal smoothing: six interpolator variants behind one [`Interpolator`]
//! trait, a registry of configs keyed by owner id, an anti-flicker guard and
//! pause/resume handling (spec §4.3.1).

mod hybrid;
mod interpolator;
mod yuv_interpolator;

pub use hybrid::{HybridInterpolator, HybridRgbInterpolator};
pub use interpolator::{ExponentialInterpolator, Interpolator, RgbInterpolator, Stepper};
pub use yuv_interpolator::YuvInterpolator;

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::color::Rgb8;

/// Which [`Interpolator`] implementation a [`SmoothingConfig`] selects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmoothingKind {
    Stepper,
    RgbInterpolator,
    YuvInterpolator,
    HybridInterpolator,
    ExponentialInterpolator,
    HybridRgbInterpolator,
}

/// Id of the config owned by the user's own settings document rather than by
/// a running effect (spec §4.3.1 "index 0 is the user config").
pub const USER_CONFIG_ID: u32 = 0;

/// Parameters for one smoothing slot. `update_interval_ms` is derived from
/// the settings document's update frequency, not user-supplied directly.
#[derive(Clone, Copy, Debug)]
pub struct SmoothingConfig {
    pub settling_time_ms: u32,
    pub update_interval_ms: u32,
    pub kind: SmoothingKind,
    pub smoothing_factor: f32,
    pub stiffness: f32,
    pub damping: f32,
    pub y_limit: f32,
    pub pause: bool,
}

impl SmoothingConfig {
    /// `update_interval_ms` must land in `[5, settling_time_ms]` whenever
    /// there's any settling time at all; otherwise the smoother would either
    /// busy-loop below its own clock resolution or never catch up to a
    /// moving target within its own settling window.
    pub fn is_valid(&self) -> bool {
        if self.update_interval_ms < 5 {
            return false;
        }
        if self.settling_time_ms > 0 && self.update_interval_ms > self.settling_time_ms {
            return false;
        }
        true
    }

    fn build_interpolator(&self) -> Box<dyn Interpolator> {
        match self.kind {
            SmoothingKind::Stepper => Box::new(Stepper::new(self.settling_time_ms)),
            SmoothingKind::RgbInterpolator => {
                Box::new(RgbInterpolator::new(self.settling_time_ms, self.smoothing_factor))
            }
            SmoothingKind::YuvInterpolator => {
                Box::new(YuvInterpolator::new(self.settling_time_ms, self.smoothing_factor, self.y_limit))
            }
            SmoothingKind::HybridInterpolator => {
                Box::new(HybridInterpolator::new(self.stiffness, self.damping, self.y_limit))
            }
            SmoothingKind::ExponentialInterpolator => {
                Box::new(ExponentialInterpolator::new(self.smoothing_factor))
            }
            SmoothingKind::HybridRgbInterpolator => {
                Box::new(HybridRgbInterpolator::new(self.stiffness, self.damping))
            }
        }
    }
}

/// One smoothing slot: an interpolator instance plus the anti-flicker and
/// pause state layered on top of it. Effects get their own slot so they
/// don't fight the user's own smoothing settings; releasing the slot when
/// the effect stops hands the LEDs back to the user config.
struct Slot {
    config: SmoothingConfig,
    interpolator: Box<dyn Interpolator>,
    current: Vec<Rgb8>,
    target: Vec<Rgb8>,
    drift: Vec<f32>,
    paused: bool,
}

/// Threshold, expressed as a per-channel delta, below which an output change
/// is swallowed rather than written through (spec §4.3.1 "Anti-flicker").
const ANTI_FLICKER_THRESHOLD: f32 = 1.5;
/// Cumulative drift above which a swallowed delta is forced through anyway,
/// so a slow ramp of sub-threshold changes still eventually reaches target.
const ANTI_FLICKER_DRIFT_LIMIT: f32 = 6.0;

impl Slot {
    fn new(config: SmoothingConfig, led_count: usize) -> Self {
        Slot {
            interpolator: config.build_interpolator(),
            config,
            current: vec![Rgb8::BLACK; led_count],
            target: vec![Rgb8::BLACK; led_count],
            drift: vec![0.0; led_count],
            paused: config.pause,
        }
    }

    fn set_target(&mut self, target: Vec<Rgb8>) {
        if target != self.target {
            self.target = target;
            self.interpolator.on_new_target();
        }
    }

    fn set_paused(&mut self, paused: bool) {
        if self.paused && !paused {
            // Resume: fast-forward straight to the latest target rather than
            // replaying the ramp the scheduler missed while suspended.
            self.current = self.target.clone();
            self.drift = vec![0.0; self.current.len()];
        }
        self.paused = paused;
    }

    fn tick(&mut self, dt: Duration) -> Option<&[Rgb8]> {
        if self.paused {
            return None;
        }
        if self.target.len() != self.current.len() {
            self.current = self.target.clone();
            self.drift = vec![0.0; self.current.len()];
        }
        let stepped = self.interpolator.step(&self.current, &self.target, dt);
        let mut next = stepped;

        for (i, prev) in self.current.iter().enumerate() {
            let delta = channel_distance(*prev, next[i]);
            self.drift[i] += delta;
            if delta < ANTI_FLICKER_THRESHOLD && self.drift[i] < ANTI_FLICKER_DRIFT_LIMIT {
                next[i] = *prev;
                continue;
            }
            self.drift[i] = 0.0;
        }
        self.current = next;
        Some(&self.current)
    }
}

fn channel_distance(a: Rgb8, b: Rgb8) -> f32 {
    let dr = a.r as f32 - b.r as f32;
    let dg = a.g as f32 - b.g as f32;
    let db = a.b as f32 - b.b as f32;
    (dr * dr + dg * dg + db * db).sqrt()
}

/// Registry of smoothing slots keyed by owner id: [`USER_CONFIG_ID`] for the
/// instance's own settings, any other id for an effect that temporarily owns
/// the output (spec §4.3.1).
pub struct SmoothingEngine {
    led_count: usize,
    slots: HashMap<u32, Slot>,
    last_tick: Option<Instant>,
}

impl SmoothingEngine {
    pub fn new(led_count: usize, user_config: SmoothingConfig) -> Self {
        let mut slots = HashMap::new();
        slots.insert(USER_CONFIG_ID, Slot::new(user_config, led_count));
        SmoothingEngine { led_count, slots, last_tick: None }
    }

    pub fn update_interval(&self) -> Duration {
        let ms = self.slots.get(&USER_CONFIG_ID).map(|s| s.config.update_interval_ms).unwrap_or(20);
        Duration::from_millis(ms as u64)
    }

    /// Replace the user config, e.g. on a `SMOOTHING` settings update.
    pub fn set_user_config(&mut self, config: SmoothingConfig) {
        self.slots.insert(USER_CONFIG_ID, Slot::new(config, self.led_count));
    }

    /// Acquire (or reconfigure) the slot owned by `effect_id`.
    pub fn acquire(&mut self, effect_id: u32, config: SmoothingConfig) {
        self.slots.insert(effect_id, Slot::new(config, self.led_count));
    }

    /// Release an effect-owned slot, handing control back to the user config.
    pub fn release(&mut self, effect_id: u32) {
        if effect_id != USER_CONFIG_ID {
            self.slots.remove(&effect_id);
        }
    }

    pub fn set_target(&mut self, owner: u32, target: Vec<Rgb8>) {
        if let Some(slot) = self.slots.get_mut(&owner) {
            slot.set_target(target);
        }
    }

    pub fn set_paused(&mut self, owner: u32, paused: bool) {
        if let Some(slot) = self.slots.get_mut(&owner) {
            slot.set_paused(paused);
        }
    }

    /// Advance every active slot by the elapsed wall-clock time since the
    /// previous tick and return the current owner's output, if any is owned
    /// by an effect; falls back to the user config otherwise.
    pub fn tick(&mut self, now: Instant, active_owner: u32) -> Option<Vec<Rgb8>> {
        let dt = self.last_tick.map(|t| now.saturating_duration_since(t)).unwrap_or(self.update_interval());
        self.last_tick = Some(now);

        for slot in self.slots.values_mut() {
            slot.tick(dt);
        }

        let slot = self.slots.get(&active_owner).or_else(|| self.slots.get(&USER_CONFIG_ID))?;
        if slot.paused {
            return None;
        }
        Some(slot.current.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(kind: SmoothingKind) -> SmoothingConfig {
        SmoothingConfig {
            settling_time_ms: 100,
            update_interval_ms: 20,
            kind,
            smoothing_factor: 0.5,
            stiffness: 40.0,
            damping: 12.0,
            y_limit: 0.05,
            pause: false,
        }
    }

    #[test]
    fn config_validity_rejects_interval_below_resolution_floor() {
        let mut cfg = config(SmoothingKind::Stepper);
        cfg.update_interval_ms = 1;
        assert!(!cfg.is_valid());
    }

    #[test]
    fn config_validity_rejects_interval_longer_than_settling_time() {
        let mut cfg = config(SmoothingKind::Stepper);
        cfg.update_interval_ms = 200;
        assert!(!cfg.is_valid());
    }

    #[test]
    fn engine_ticks_toward_target_and_reaches_it() {
        let mut engine = SmoothingEngine::new(1, config(SmoothingKind::Stepper));
        engine.set_target(USER_CONFIG_ID, vec![Rgb8::new(100, 100, 100)]);
        let mut now = Instant::now();
        let mut last = None;
        for _ in 0..10 {
            now += Duration::from_millis(20);
            last = engine.tick(now, USER_CONFIG_ID);
        }
        assert_eq!(last.unwrap()[0], Rgb8::new(100, 100, 100));
    }

    #[test]
    fn effect_slot_is_independent_of_user_config() {
        let mut engine = SmoothingEngine::new(1, config(SmoothingKind::Stepper));
        engine.acquire(7, config(SmoothingKind::ExponentialInterpolator));
        engine.set_target(USER_CONFIG_ID, vec![Rgb8::new(10, 10, 10)]);
        engine.set_target(7, vec![Rgb8::new(250, 250, 250)]);

        let now = Instant::now() + Duration::from_millis(20);
        let effect_out = engine.tick(now, 7).unwrap();
        assert_ne!(effect_out[0], Rgb8::BLACK);

        engine.release(7);
        let user_out = engine.tick(now + Duration::from_millis(20), 7).unwrap();
        assert!(user_out[0].r <= 10, "after release, output should come from the user slot");
    }

    #[test]
    fn pause_suspends_emission_then_fast_forwards_on_resume() {
        let mut engine = SmoothingEngine::new(1, config(SmoothingKind::Stepper));
        engine.set_target(USER_CONFIG_ID, vec![Rgb8::new(200, 200, 200)]);
        engine.set_paused(USER_CONFIG_ID, true);

        let mut now = Instant::now();
        for _ in 0..5 {
            now += Duration::from_millis(20);
            assert!(engine.tick(now, USER_CONFIG_ID).is_none());
        }

        engine.set_paused(USER_CONFIG_ID, false);
        now += Duration::from_millis(20);
        let out = engine.tick(now, USER_CONFIG_ID).unwrap();
        assert_eq!(out[0], Rgb8::new(200, 200, 200));
    }

    #[test]
    fn anti_flicker_holds_output_steady_below_threshold_then_snaps_through_on_drift_limit() {
        let cfg = SmoothingConfig {
            settling_time_ms: 100,
            update_interval_ms: 20,
            kind: SmoothingKind::ExponentialInterpolator,
            smoothing_factor: 0.1,
            stiffness: 0.0,
            damping: 0.0,
            y_limit: 0.0,
            pause: false,
        };
        let mut engine = SmoothingEngine::new(1, cfg);
        engine.set_target(USER_CONFIG_ID, vec![Rgb8::new(5, 0, 0)]);

        let mut now = Instant::now();
        for _ in 0..5 {
            now += Duration::from_millis(20);
            let out = engine.tick(now, USER_CONFIG_ID).unwrap();
            assert_eq!(out[0], Rgb8::BLACK, "sub-threshold deltas must be held, not applied every tick");
        }

        now += Duration::from_millis(20);
        let out = engine.tick(now, USER_CONFIG_ID).unwrap();
        assert_eq!(out[0].r, 1, "accumulated drift must eventually force the change through");
    }
}
