//! Time-driven animations as first-class Muxer inputs (spec §4.4).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;

use crate::color::Rgb8;

/// One frame of an effect's output: a canvas the effect paints into before
/// [`Effect::led_data`] reads it back, or LED colors returned directly for
/// effects that don't need per-pixel compositing.
pub struct Canvas {
    pub colors: Vec<Rgb8>,
}

impl Canvas {
    pub fn new(led_count: usize) -> Self {
        Canvas { colors: vec![Rgb8::BLACK; led_count] }
    }
}

/// A named animation instance (spec §4.4 "Effect definition"). `play`
/// advances one tick and returns `false` when the effect wants to stop on
/// its own (natural completion, not external cancellation).
pub trait Effect: Send {
    fn play(&mut self, canvas: &mut Canvas) -> bool;
    fn led_data(&mut self) -> Option<&[Rgb8]> {
        None
    }
    fn settling_time_ms(&self) -> u32 {
        200
    }
    fn update_interval_ms(&self) -> u32 {
        50
    }
}

/// Which effect engine position produced an [`EffectOutput`]. Background
/// effects sit behind any real input; foreground effects preempt everything.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectSlot {
    Background,
    Foreground,
}

/// Output posted from a running effect task back to the owning instance,
/// tagged with the slot it was started under (so the instance can tell which
/// Muxer priority produced it — both slots share one output channel) and the
/// generation it was started with, so a message from a task that has since
/// been replaced in the same slot can be told apart from the current one;
/// stopping a running effect is asynchronous (see `RunningEffect::stop`), so
/// the replaced task can still post after its replacement has started.
pub enum EffectOutput {
    Colors(EffectSlot, u64, Vec<Rgb8>),
    Stopped(EffectSlot, u64),
}

type Factory = Box<dyn Fn(usize) -> Box<dyn Effect> + Send + Sync>;

/// Named factory registry effects are started from (spec §4.4).
#[derive(Default)]
pub struct EffectRegistry {
    factories: HashMap<String, Factory>,
}

impl EffectRegistry {
    pub fn new() -> Self {
        EffectRegistry { factories: HashMap::new() }
    }

    pub fn register(&mut self, name: impl Into<String>, factory: impl Fn(usize) -> Box<dyn Effect> + Send + Sync + 'static) {
        self.factories.insert(name.into(), Box::new(factory));
    }

    pub fn create(&self, name: &str, led_count: usize) -> Option<Box<dyn Effect>> {
        self.factories.get(name).map(|f| f(led_count))
    }
}

/// A running effect: the task handle and the token used to cancel it
/// synchronously with respect to its next tick (spec §4.4 "Cancellation").
pub struct RunningEffect {
    handle: JoinHandle<()>,
    cancel: Arc<Notify>,
}

impl RunningEffect {
    /// Signal cancellation and wait for the task to observe it. Once this
    /// returns, no further tick of the effect's `play` will execute.
    pub async fn stop(self) {
        self.cancel.notify_waiters();
        let _ = self.handle.await;
    }
}

/// Spawn `effect` on its own cooperative task, ticking at its requested
/// interval and posting output through `tx` until it stops itself, its
/// timeout elapses, or [`RunningEffect::stop`] is called.
pub fn spawn_effect(slot: EffectSlot, generation: u64, name: String, mut effect: Box<dyn Effect>, led_count: usize, tx: mpsc::Sender<EffectOutput>, timeout: Option<Duration>) -> RunningEffect {
    let cancel = Arc::new(Notify::new());
    let cancel_task = cancel.clone();
    let interval_ms = effect.update_interval_ms().max(1) as u64;

    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
        let deadline = timeout.map(|d| tokio::time::Instant::now() + d);
        let mut canvas = Canvas::new(led_count);

        loop {
            tokio::select! {
                biased;
                _ = cancel_task.notified() => {
                    debug!("effect {name} cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    if let Some(deadline) = deadline {
                        if tokio::time::Instant::now() >= deadline {
                            break;
                        }
                    }
                    let keep_going = effect.play(&mut canvas);
                    let colors = effect.led_data().map(|c| c.to_vec()).unwrap_or_else(|| canvas.colors.clone());
                    if tx.send(EffectOutput::Colors(slot, generation, colors)).await.is_err() {
                        break;
                    }
                    if !keep_going {
                        break;
                    }
                }
            }
        }
        let _ = tx.send(EffectOutput::Stopped(slot, generation)).await;
    });

    RunningEffect { handle, cancel: cancel }
}

/// Background/foreground effect selection (spec §6 `BGEFFECT`/`FGEFFECT`
/// tags), grounded in the original engine's `BGEffectHandler`.
pub struct EffectEngine {
    registry: EffectRegistry,
    background: Option<String>,
    foreground: Option<String>,
    running: HashMap<EffectSlot, RunningEffect>,
}

impl EffectEngine {
    pub fn new(registry: EffectRegistry) -> Self {
        EffectEngine { registry, background: None, foreground: None, running: HashMap::new() }
    }

    pub fn set_background(&mut self, name: Option<String>) {
        self.background = name;
    }

    pub fn set_foreground(&mut self, name: Option<String>) {
        self.foreground = name;
    }

    pub fn background(&self) -> Option<&str> {
        self.background.as_deref()
    }

    pub fn foreground(&self) -> Option<&str> {
        self.foreground.as_deref()
    }

    pub fn start(&mut self, slot: EffectSlot, generation: u64, effect_name: &str, led_count: usize, tx: mpsc::Sender<EffectOutput>, timeout: Option<Duration>) -> bool {
        let Some(effect) = self.registry.create(effect_name, led_count) else {
            warn!("unknown effect {effect_name}");
            return false;
        };
        let running = spawn_effect(slot, generation, effect_name.to_string(), effect, led_count, tx, timeout);
        if let Some(previous) = self.running.insert(slot, running) {
            tokio::spawn(previous.stop());
        }
        true
    }

    pub async fn stop(&mut self, slot: EffectSlot) {
        if let Some(running) = self.running.remove(&slot) {
            running.stop().await;
        }
    }

    /// Cancel whatever is running in `slot` without waiting for it: the task
    /// finishes on its own time and posts `EffectOutput::Stopped` through the
    /// same channel `start` used, same as the implicit stop on replacement.
    pub fn clear(&mut self, slot: EffectSlot) {
        if let Some(running) = self.running.remove(&slot) {
            tokio::spawn(running.stop());
        }
    }
}
