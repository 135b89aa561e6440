//! Black-box coverage of [`SmoothingEngine::tick`] driving a `Stepper`
//! through the public crate API: the engine's orchestration (dt tracking,
//! slot selection) on top of the interpolator itself.

use std::time::{Duration, Instant};

use hyperhdr_core::color::Rgb8;
use hyperhdr_core::smoothing::{SmoothingConfig, SmoothingEngine, SmoothingKind, USER_CONFIG_ID};

fn stepper_config(settling_time_ms: u32, update_interval_ms: u32) -> SmoothingConfig {
    SmoothingConfig {
        settling_time_ms,
        update_interval_ms,
        kind: SmoothingKind::Stepper,
        smoothing_factor: 0.0,
        stiffness: 0.0,
        damping: 0.0,
        y_limit: 0.0,
        pause: false,
    }
}

#[test]
fn stepper_ramps_linearly_then_holds_at_target_without_overshoot() {
    let mut engine = SmoothingEngine::new(1, stepper_config(100, 20));
    engine.set_target(USER_CONFIG_ID, vec![Rgb8::new(100, 100, 100)]);

    let t0 = Instant::now();
    let at20 = engine.tick(t0 + Duration::from_millis(20), USER_CONFIG_ID).unwrap();
    assert!((at20[0].r as i32 - 20).abs() <= 1, "expected ~20 at t=20ms, got {}", at20[0].r);

    let at100 = engine.tick(t0 + Duration::from_millis(100), USER_CONFIG_ID).unwrap();
    assert_eq!(at100[0], Rgb8::new(100, 100, 100));

    let at120 = engine.tick(t0 + Duration::from_millis(120), USER_CONFIG_ID).unwrap();
    assert_eq!(at120[0], Rgb8::new(100, 100, 100), "must not overshoot past settling time");
}
