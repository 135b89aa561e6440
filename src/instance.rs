//! A single independent pixel pipeline: one muxer, one reducer, one color
//! pipeline, one output scheduler, one effect engine, driven by a single
//! cooperative task (spec §3 "Instance", §5; `run` grounded in
//! `alixinne-hyperion.rs::Instance::run`'s `select!` shape).

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::warn;
use tokio::sync::{broadcast, mpsc};

use crate::capture::CaptureEvent;
use crate::color::{ColorPipeline, Rgb8};
use crate::component::{Component, ComponentController};
use crate::config::{BorderDetectionSettings, ColorSettings, InstanceSettings, SettingsKind, SettingsUpdate, SmoothingSettings};
use crate::driver::{Driver, OutputScheduler};
use crate::effects::{EffectEngine, EffectOutput, EffectRegistry, EffectSlot};
use crate::error::{ConfigError, InstanceError};
use crate::forwarder::Forwarder;
use crate::muxer::{ComponentKind, Muxer};
use crate::reducer::{AutomaticDetector, BorderDetector, ManualDetector, ReduceMode, Reducer};
use crate::smoothing::{SmoothingConfig, SmoothingEngine, USER_CONFIG_ID};

/// Priority a running effect registers at in the Muxer; background effects
/// sit behind any real input, foreground effects preempt everything else.
const BACKGROUND_EFFECT_PRIORITY: u8 = 254;
const FOREGROUND_EFFECT_PRIORITY: u8 = 0;
/// Priority the instance's own video capture registers at: above the
/// background effect (video wins over idle animation) but below any
/// foreground override or external client input.
const CAPTURE_PRIORITY: u8 = 240;
/// Refreshed on every captured/effect frame; a source that stops posting
/// goes inactive this long after its last update, letting the muxer fall
/// through to the next priority without an explicit `set_input_inactive`.
const CAPTURE_TIMEOUT_MS: i64 = 1000;
const EFFECT_TIMEOUT_MS: i64 = 1000;
/// Id the background/foreground effect's smoothing config is registered
/// under in the [`SmoothingEngine`] (spec §4.3.1 "index >= 1 owned by
/// effects").
const BACKGROUND_SMOOTHING_ID: u32 = 1;
const FOREGROUND_SMOOTHING_ID: u32 = 2;

pub struct Instance {
    pub index: u8,
    pub name: String,
    muxer: Muxer,
    reducer: Reducer,
    color_pipeline: ColorPipeline,
    smoothing: SmoothingEngine,
    scheduler: OutputScheduler,
    effects: EffectEngine,
    components: ComponentController,
    led_count: usize,
    capture_rx: broadcast::Receiver<CaptureEvent>,
    settings_rx: mpsc::Receiver<SettingsUpdate>,
    effect_output_rx: mpsc::Receiver<EffectOutput>,
    effect_output_tx: mpsc::Sender<EffectOutput>,
    forwarder: Arc<Forwarder>,
    /// Config a newly-started effect's smoothing slot is acquired with;
    /// effects share the user's own settling time rather than get a separate
    /// tunable, matching the teacher's single `LINSMOOTH` knob.
    effect_smoothing_config: SmoothingConfig,
    /// Retained so a later `SettingsKind::Leds` update can re-expand
    /// calibration to the new LED count without losing the transform list.
    color_settings: ColorSettings,
    /// Bumped every time a slot is (re)started; tags outgoing `EffectOutput`
    /// messages so a message from a task a later `start` has already
    /// replaced doesn't tear down the replacement's state (stopping a
    /// running effect task is asynchronous, so the old one can still post
    /// after the new one has started).
    background_generation: u64,
    foreground_generation: u64,
}

impl Instance {
    pub fn new(
        index: u8,
        settings: InstanceSettings,
        driver: Box<dyn Driver>,
        effects: EffectRegistry,
        capture_rx: broadcast::Receiver<CaptureEvent>,
        settings_rx: mpsc::Receiver<SettingsUpdate>,
        disable_on_startup: bool,
    ) -> Self {
        let led_count = settings.leds.len();
        let mut muxer = Muxer::new();
        muxer.register_input(BACKGROUND_EFFECT_PRIORITY, ComponentKind::Effect, "bg-effect", Rgb8::BLACK, BACKGROUND_SMOOTHING_ID, "engine");
        muxer.register_input(FOREGROUND_EFFECT_PRIORITY, ComponentKind::Effect, "fg-effect", Rgb8::BLACK, FOREGROUND_SMOOTHING_ID, "engine");
        muxer.register_input(CAPTURE_PRIORITY, ComponentKind::VideoGrabber, "capture", Rgb8::BLACK, USER_CONFIG_ID, "capture");

        let mut color_pipeline = ColorPipeline::new(led_count);
        color_pipeline.calibration = settings.color.expand(led_count);

        let smoothing_config: SmoothingConfig = (&settings.smoothing).into();
        let smoothing = SmoothingEngine::new(led_count, smoothing_config);

        let border: Box<dyn BorderDetector> = match settings.border {
            BorderDetectionSettings::Manual { h_border, v_border } => Box::new(ManualDetector::new(h_border, v_border)),
            BorderDetectionSettings::Automatic => Box::new(AutomaticDetector::new()),
        };
        let reducer = Reducer::new(settings.leds.clone(), ReduceMode::Mean, false, border);

        let (effect_output_tx, effect_output_rx) = mpsc::channel(8);
        let forwarder = Arc::new(Forwarder::new());

        Instance {
            index,
            name: settings.name.clone(),
            muxer,
            reducer,
            color_pipeline,
            smoothing,
            scheduler: OutputScheduler::new(driver, led_count, forwarder.clone()),
            effects: EffectEngine::new(effects),
            components: ComponentController::new(disable_on_startup),
            led_count,
            capture_rx,
            settings_rx,
            effect_output_rx,
            effect_output_tx,
            forwarder,
            effect_smoothing_config: smoothing_config,
            color_settings: settings.color,
            background_generation: 0,
            foreground_generation: 0,
        }
    }

    /// Subscribe to this instance's outbound color/image mirror (spec §5
    /// "Shared resources"); used by downstream viewers, not the pixel
    /// pipeline itself.
    pub fn subscribe_forwarder(&self) -> broadcast::Receiver<crate::forwarder::ForwardedUpdate> {
        self.forwarder.subscribe()
    }

    fn effect_slot_ids(slot: EffectSlot) -> (u8, u32) {
        match slot {
            EffectSlot::Background => (BACKGROUND_EFFECT_PRIORITY, BACKGROUND_SMOOTHING_ID),
            EffectSlot::Foreground => (FOREGROUND_EFFECT_PRIORITY, FOREGROUND_SMOOTHING_ID),
        }
    }

    fn current_generation(&self, slot: EffectSlot) -> u64 {
        match slot {
            EffectSlot::Background => self.background_generation,
            EffectSlot::Foreground => self.foreground_generation,
        }
    }

    fn handle_capture_event(&mut self, event: CaptureEvent, now: Instant) {
        match event {
            CaptureEvent::NewFrame(frame) => {
                if !self.components.is_enabled(Component::VideoGrabber) {
                    return;
                }
                let mut colors = self.reducer.reduce(&frame, now).to_vec();
                self.color_pipeline.process(&mut colors);
                if self.forwarder.client_count() > 0 {
                    self.forwarder.publish_image(frame.clone());
                }

                let _ = self.muxer.set_input_image(CAPTURE_PRIORITY, frame, CAPTURE_TIMEOUT_MS, now);
                self.muxer.tick(now);
                if self.muxer.current_priority() == CAPTURE_PRIORITY {
                    self.smoothing.set_target(USER_CONFIG_ID, colors);
                }
            }
            CaptureEvent::StateChanged { device, active } => {
                warn!("capture device {device} active={active}");
                if !active {
                    self.muxer.set_input_inactive(CAPTURE_PRIORITY);
                    self.muxer.tick(now);
                }
            }
        }
    }

    fn handle_effect_output(&mut self, output: EffectOutput, now: Instant) {
        match output {
            EffectOutput::Colors(slot, generation, colors) => {
                if generation != self.current_generation(slot) {
                    return;
                }
                let (priority, smoothing_id) = Self::effect_slot_ids(slot);
                let representative = colors.first().copied().unwrap_or(Rgb8::BLACK);
                let _ = self.muxer.set_input(priority, representative, EFFECT_TIMEOUT_MS, now);
                self.muxer.tick(now);
                self.smoothing.set_target(smoothing_id, colors);
            }
            EffectOutput::Stopped(slot, generation) => {
                if generation != self.current_generation(slot) {
                    return;
                }
                let (priority, smoothing_id) = Self::effect_slot_ids(slot);
                self.muxer.set_input_inactive(priority);
                self.muxer.tick(now);
                self.smoothing.release(smoothing_id);
            }
        }
    }

    /// Dispatch a settings update to the owning component (spec §6).
    pub fn apply_settings(&mut self, update: SettingsUpdate) -> Result<(), InstanceError> {
        match update.kind {
            SettingsKind::Smoothing => {
                let settings: SmoothingSettings = serde_json::from_value(update.payload).map_err(ConfigError::Json)?;
                let config: SmoothingConfig = (&settings).into();
                self.smoothing.set_user_config(config);
                self.effect_smoothing_config = config;
            }
            SettingsKind::Color => {
                let color: ColorSettings = serde_json::from_value(update.payload).map_err(ConfigError::Json)?;
                self.color_pipeline.calibration = color.expand(self.led_count);
                self.color_settings = color;
            }
            SettingsKind::Leds => {
                let layout: crate::config::LedLayout = serde_json::from_value(update.payload).map_err(ConfigError::Json)?;
                self.led_count = layout.len();
                self.reducer.set_layout(layout);
                self.color_pipeline.calibration = self.color_settings.expand(self.led_count);
            }
            SettingsKind::Pause => {
                let pause = update.payload.get("pause").and_then(serde_json::Value::as_bool).ok_or(ConfigError::MissingField("pause"))?;
                self.smoothing.set_paused(USER_CONFIG_ID, pause);
            }
            SettingsKind::Device | SettingsKind::InstCapture | SettingsKind::BgEffect | SettingsKind::FgEffect => {
                // Device reconfiguration and capture/effect slot selection
                // are handled at the manager level, which owns the shared
                // driver/capture producers this instance borrows.
            }
        }
        Ok(())
    }

    pub fn set_background_effect(&mut self, name: Option<String>) {
        self.effects.set_background(name.clone());
        if let Some(name) = name {
            self.background_generation += 1;
            self.smoothing.acquire(BACKGROUND_SMOOTHING_ID, self.effect_smoothing_config);
            self.effects.start(EffectSlot::Background, self.background_generation, &name, self.led_count, self.effect_output_tx.clone(), None);
        } else {
            self.background_generation += 1;
            self.effects.clear(EffectSlot::Background);
            self.muxer.set_input_inactive(BACKGROUND_EFFECT_PRIORITY);
            self.muxer.tick(Instant::now());
            self.smoothing.release(BACKGROUND_SMOOTHING_ID);
        }
    }

    pub fn set_foreground_effect(&mut self, name: Option<String>, timeout: Option<Duration>) {
        self.effects.set_foreground(name.clone());
        if let Some(name) = name {
            self.foreground_generation += 1;
            self.smoothing.acquire(FOREGROUND_SMOOTHING_ID, self.effect_smoothing_config);
            self.effects.start(EffectSlot::Foreground, self.foreground_generation, &name, self.led_count, self.effect_output_tx.clone(), timeout);
        } else {
            self.foreground_generation += 1;
            self.effects.clear(EffectSlot::Foreground);
            self.muxer.set_input_inactive(FOREGROUND_EFFECT_PRIORITY);
            self.muxer.tick(Instant::now());
            self.smoothing.release(FOREGROUND_SMOOTHING_ID);
        }
    }

    /// The instance's cooperative task loop: capture events, the muxer's
    /// ~100ms steady tick, the smoothing/emission tick, effect output, and
    /// settings updates all arrive on this one `select!`.
    pub async fn run(mut self) -> Result<(), InstanceError> {
        let mut muxer_ticker = tokio::time::interval(Duration::from_millis(100));
        let mut smoothing_ticker = tokio::time::interval(self.smoothing.update_interval());

        loop {
            tokio::select! {
                _ = muxer_ticker.tick() => {
                    self.muxer.tick(Instant::now());
                }
                event = self.capture_rx.recv() => {
                    match event {
                        Ok(event) => self.handle_capture_event(event, Instant::now()),
                        Err(broadcast::error::RecvError::Closed) => return Ok(()),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!("instance {} skipped {skipped} capture frames", self.index);
                        }
                    }
                }
                Some(output) = self.effect_output_rx.recv() => {
                    self.handle_effect_output(output, Instant::now());
                }
                Some(update) = self.settings_rx.recv() => {
                    if let Err(e) = self.apply_settings(update) {
                        warn!("instance {} rejected settings update: {e}", self.index);
                    }
                }
                _ = smoothing_ticker.tick() => {
                    let owner = if self.components.is_enabled(Component::LedDevice) {
                        match self.muxer.current_priority() {
                            FOREGROUND_EFFECT_PRIORITY => FOREGROUND_SMOOTHING_ID,
                            BACKGROUND_EFFECT_PRIORITY => BACKGROUND_SMOOTHING_ID,
                            _ => USER_CONFIG_ID,
                        }
                    } else {
                        USER_CONFIG_ID
                    };
                    if let Some(colors) = self.smoothing.tick(Instant::now(), owner) {
                        if let Some(wait) = self.scheduler.emit(&colors).await {
                            tokio::time::sleep(wait).await;
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DriverConfig, Led, LedLayout, ScanRect, SettingsKind, SmoothingSettings};
    use crate::smoothing::SmoothingKind;
    use crate::driver::NullDriver;
    use std::collections::HashMap;

    fn test_settings() -> InstanceSettings {
        InstanceSettings {
            name: "test".into(),
            device: DriverConfig { kind: "null".into(), output: String::new(), rate: 115_200, color_order: String::new(), rewrite_time_ms: 0, latch_time_ms: 0, extra: HashMap::new() },
            color: Default::default(),
            leds: LedLayout { leds: vec![Led { rect: ScanRect { x1: 0.0, x2: 1.0, y1: 0.0, y2: 1.0 }, group: None, disabled: false }] },
            smoothing: SmoothingSettings {
                kind: SmoothingKind::Stepper,
                time_ms: 100,
                update_frequency_hz: 25.0,
                smoothing_factor: 0.5,
                stiffness: 0.0,
                damping: 0.0,
                y_limit: 0.0,
                pause: false,
            },
            background_effect: None,
            foreground_effect: None,
            border: Default::default(),
        }
    }

    fn test_instance() -> Instance {
        let (_capture_tx, capture_rx) = broadcast::channel(2);
        let (_settings_tx, settings_rx) = mpsc::channel(8);
        Instance::new(0, test_settings(), Box::new(NullDriver::new("test")), EffectRegistry::new(), capture_rx, settings_rx, false)
    }

    #[test]
    fn color_settings_update_expands_into_one_calibration_per_led() {
        let mut instance = test_instance();
        let payload = serde_json::json!({ "transforms": [{ "leds": "0", "calibration": { "brightness": 0.5 } }] });
        instance.apply_settings(SettingsUpdate { kind: SettingsKind::Color, payload }).unwrap();
        assert_eq!(instance.color_pipeline.calibration[0].brightness, 0.5);
    }

    #[test]
    fn leds_settings_update_resizes_the_reducer_layout() {
        let mut instance = test_instance();
        let payload = serde_json::to_value(LedLayout {
            leds: vec![
                Led { rect: ScanRect { x1: 0.0, x2: 0.5, y1: 0.0, y2: 1.0 }, group: None, disabled: false },
                Led { rect: ScanRect { x1: 0.5, x2: 1.0, y1: 0.0, y2: 1.0 }, group: None, disabled: false },
            ],
        })
        .unwrap();
        instance.apply_settings(SettingsUpdate { kind: SettingsKind::Leds, payload }).unwrap();
        assert_eq!(instance.led_count, 2);
        assert_eq!(instance.color_pipeline.calibration.len(), 2, "calibration must track the new LED count, not just the reducer layout");
    }

    #[test]
    fn leds_settings_update_preserves_previously_applied_color_transforms() {
        let mut instance = test_instance();
        let color_payload = serde_json::json!({
            "transforms": [{ "leds": "0", "calibration": { "brightness": 0.25 } }]
        });
        instance.apply_settings(SettingsUpdate { kind: SettingsKind::Color, payload: color_payload }).unwrap();
        assert_eq!(instance.color_pipeline.calibration[0].brightness, 0.25);

        let leds_payload = serde_json::to_value(LedLayout {
            leds: vec![
                Led { rect: ScanRect { x1: 0.0, x2: 0.5, y1: 0.0, y2: 1.0 }, group: None, disabled: false },
                Led { rect: ScanRect { x1: 0.5, x2: 1.0, y1: 0.0, y2: 1.0 }, group: None, disabled: false },
            ],
        })
        .unwrap();
        instance.apply_settings(SettingsUpdate { kind: SettingsKind::Leds, payload: leds_payload }).unwrap();
        assert_eq!(instance.color_pipeline.calibration.len(), 2);
        assert_eq!(instance.color_pipeline.calibration[0].brightness, 0.25, "the transform applying to LED 0 must survive a resize");
    }

    #[test]
    fn smoothing_settings_update_refreshes_the_config_new_effects_acquire_their_slot_with() {
        let mut instance = test_instance();
        let payload = serde_json::to_value(SmoothingSettings {
            kind: crate::smoothing::SmoothingKind::RgbInterpolator,
            time_ms: 500,
            update_frequency_hz: 20.0,
            smoothing_factor: 0.2,
            stiffness: 0.0,
            damping: 0.0,
            y_limit: 0.0,
            pause: false,
        })
        .unwrap();
        instance.apply_settings(SettingsUpdate { kind: SettingsKind::Smoothing, payload }).unwrap();
        assert_eq!(instance.effect_smoothing_config.settling_time_ms, 500, "effects must acquire with the refreshed user smoothing config, not the one captured at startup");
    }

    #[test]
    fn malformed_settings_payload_is_rejected_not_panicked_on() {
        let mut instance = test_instance();
        let payload = serde_json::json!({ "not": "a color settings document at all, but still valid json for an unrelated shape" });
        let update = SettingsUpdate { kind: SettingsKind::Leds, payload };
        assert!(instance.apply_settings(update).is_err());
    }

    #[test]
    fn capture_frame_registers_with_the_muxer_and_becomes_visible() {
        use crate::capture::{Frame, PixelFormat};

        let mut instance = test_instance();
        assert_eq!(instance.muxer.current_priority(), crate::muxer::SENTINEL_PRIORITY);

        let frame = Frame::new(1, 1, PixelFormat::Rgb24, vec![Rgb8::new(255, 0, 0)]);
        instance.handle_capture_event(CaptureEvent::NewFrame(frame), Instant::now());

        assert_eq!(instance.muxer.current_priority(), CAPTURE_PRIORITY);
    }

    #[test]
    fn capture_frame_is_mirrored_to_forwarder_subscribers() {
        use crate::capture::{Frame, PixelFormat};
        use crate::forwarder::ForwardedUpdate;

        let mut instance = test_instance();
        let mut rx = instance.subscribe_forwarder();

        let frame = Frame::new(1, 1, PixelFormat::Rgb24, vec![Rgb8::new(1, 2, 3)]);
        instance.handle_capture_event(CaptureEvent::NewFrame(frame), Instant::now());

        match rx.try_recv().unwrap() {
            ForwardedUpdate::Image(frame) => assert_eq!(frame.pixels(), &[Rgb8::new(1, 2, 3)]),
            ForwardedUpdate::Colors(_) => panic!("expected an image update"),
        }
    }

    #[test]
    fn foreground_effect_output_preempts_capture_and_drives_its_own_smoothing_slot() {
        use crate::capture::{Frame, PixelFormat};

        let mut instance = test_instance();
        let now = Instant::now();

        let frame = Frame::new(1, 1, PixelFormat::Rgb24, vec![Rgb8::new(0, 0, 255)]);
        instance.handle_capture_event(CaptureEvent::NewFrame(frame), now);
        assert_eq!(instance.muxer.current_priority(), CAPTURE_PRIORITY);

        instance.smoothing.acquire(FOREGROUND_SMOOTHING_ID, instance.effect_smoothing_config);
        instance.handle_effect_output(EffectOutput::Colors(EffectSlot::Foreground, 0, vec![Rgb8::new(9, 9, 9)]), now);

        assert_eq!(instance.muxer.current_priority(), FOREGROUND_EFFECT_PRIORITY);

        let tick_time = now + Duration::from_millis(20);
        let output = instance.smoothing.tick(tick_time, FOREGROUND_SMOOTHING_ID).unwrap();
        assert_ne!(output[0], Rgb8::BLACK, "foreground effect output must reach its own smoothing slot");
    }

    #[test]
    fn effect_stop_releases_the_muxer_priority_and_smoothing_slot() {
        let mut instance = test_instance();
        let now = Instant::now();

        instance.smoothing.acquire(BACKGROUND_SMOOTHING_ID, instance.effect_smoothing_config);
        instance.handle_effect_output(EffectOutput::Colors(EffectSlot::Background, 0, vec![Rgb8::new(5, 5, 5)]), now);
        assert_eq!(instance.muxer.current_priority(), BACKGROUND_EFFECT_PRIORITY);

        instance.handle_effect_output(EffectOutput::Stopped(EffectSlot::Background, 0), now + Duration::from_millis(5));
        assert_eq!(instance.muxer.current_priority(), crate::muxer::SENTINEL_PRIORITY);
    }

    #[test]
    fn a_stale_stopped_from_a_replaced_effect_does_not_tear_down_the_new_one() {
        let mut instance = test_instance();
        let now = Instant::now();

        // "a" was running (generation 0); it was replaced by "b" (generation
        // 1) before "a" observed its own cancellation.
        instance.background_generation = 1;
        instance.smoothing.acquire(BACKGROUND_SMOOTHING_ID, instance.effect_smoothing_config);
        instance.handle_effect_output(EffectOutput::Colors(EffectSlot::Background, 1, vec![Rgb8::new(8, 8, 8)]), now);
        assert_eq!(instance.muxer.current_priority(), BACKGROUND_EFFECT_PRIORITY);

        // "a"'s belated Stopped(generation 0) must be ignored, not tear down
        // "b"'s still-live slot and muxer priority.
        instance.handle_effect_output(EffectOutput::Stopped(EffectSlot::Background, 0), now + Duration::from_millis(1));
        assert_eq!(instance.muxer.current_priority(), BACKGROUND_EFFECT_PRIORITY, "a stale Stopped must not preempt the current effect");

        let tick_time = now + Duration::from_millis(20);
        assert!(instance.smoothing.tick(tick_time, BACKGROUND_SMOOTHING_ID).is_some(), "the current generation's smoothing slot must survive the stale Stopped");
    }

    #[test]
    fn pause_settings_update_pauses_without_needing_a_full_smoothing_document() {
        let mut instance = test_instance();
        instance.smoothing.set_target(USER_CONFIG_ID, vec![Rgb8::new(100, 100, 100)]);

        let payload = serde_json::json!({ "pause": true });
        instance.apply_settings(SettingsUpdate { kind: SettingsKind::Pause, payload }).unwrap();

        let now = Instant::now() + Duration::from_millis(20);
        assert!(instance.smoothing.tick(now, USER_CONFIG_ID).is_none(), "paused slot must not emit");
    }

    #[test]
    fn pause_settings_update_with_missing_field_is_rejected() {
        let mut instance = test_instance();
        let update = SettingsUpdate { kind: SettingsKind::Pause, payload: serde_json::json!({}) };
        assert!(instance.apply_settings(update).is_err());
    }

    #[tokio::test]
    async fn starting_a_background_effect_acquires_its_smoothing_slot_before_any_output_arrives() {
        let mut registry = EffectRegistry::new();
        registry.register("noop", |led_count| {
            struct Noop(usize);
            impl crate::effects::Effect for Noop {
                fn play(&mut self, canvas: &mut crate::effects::Canvas) -> bool {
                    canvas.colors.iter_mut().for_each(|c| *c = Rgb8::new(7, 7, 7));
                    true
                }
            }
            Box::new(Noop(led_count)) as Box<dyn crate::effects::Effect>
        });

        let (_capture_tx, capture_rx) = broadcast::channel(2);
        let (_settings_tx, settings_rx) = mpsc::channel(8);
        let mut instance = Instance::new(0, test_settings(), Box::new(NullDriver::new("test")), registry, capture_rx, settings_rx, false);

        instance.set_background_effect(Some("noop".into()));
        let now = Instant::now() + Duration::from_millis(20);
        assert!(instance.smoothing.tick(now, BACKGROUND_SMOOTHING_ID).is_some(), "slot must exist the instant the effect is started");

        instance.set_background_effect(None);
        assert_eq!(instance.muxer.current_priority(), crate::muxer::SENTINEL_PRIORITY);
    }
}
