//! Instance lifecycle: create/start/stop/delete, shared capture producers,
//! and hibernate handling, serialized on one task via a command channel
//! (spec §4.6; "actor" pattern grounded in the teacher's single-threaded
//! `main` loop, generalized to `tokio::sync::mpsc` + `tokio::task::spawn`).

use std::collections::HashMap;

use log::{info, warn};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::capture::{CaptureEvent, Fanout};
use crate::config::{InstanceSettings, SettingsUpdate};
use crate::driver::Driver;
use crate::effects::EffectRegistry;
use crate::error::{InstanceError, ManagerError};
use crate::instance::Instance;

/// Minimal settings document for an instance that's been stopped and lost
/// its real configuration; it cannot be started again without a fresh
/// `create_instance` call, but it must satisfy the type until then.
fn placeholder_settings(name: &str) -> InstanceSettings {
    InstanceSettings {
        name: name.to_string(),
        device: crate::config::DriverConfig { kind: "null".into(), output: String::new(), rate: 115_200, color_order: String::new(), rewrite_time_ms: 0, latch_time_ms: 0, extra: HashMap::new() },
        color: Default::default(),
        leds: Default::default(),
        smoothing: crate::config::SmoothingSettings {
            kind: crate::smoothing::SmoothingKind::Stepper,
            time_ms: 200,
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

/// An instance between `create` and `start`: settings and driver are held
/// here; `start_instance` consumes them to build and spawn the running
/// [`Instance`].
enum InstanceState {
    Stopped { settings: InstanceSettings, driver: Box<dyn Driver> },
    Running { name: String, task: JoinHandle<Result<(), InstanceError>>, settings_tx: mpsc::Sender<SettingsUpdate> },
    /// Transient placeholder held only while swapping `Stopped`/`Running`
    /// in and out of a `&mut` slot; never observed outside this module.
    Transitioning,
}

struct InstanceHandle {
    name: String,
    state: InstanceState,
}

enum Command {
    Create { name: String, settings: Box<InstanceSettings>, driver: Box<dyn Driver>, reply: oneshot::Sender<Result<u8, ManagerError>> },
    Delete { index: u8, reply: oneshot::Sender<Result<(), ManagerError>> },
    Start { index: u8, disable_on_startup: bool, reply: oneshot::Sender<Result<(), ManagerError>> },
    Stop { index: u8, reply: oneshot::Sender<Result<(), ManagerError>> },
    ToggleAll { pause: bool, reply: oneshot::Sender<()> },
    Hibernate { wake_up: bool, source: String, reply: oneshot::Sender<()> },
}

/// Handle used by the rest of the process to talk to the manager's task.
#[derive(Clone)]
pub struct ManagerHandle {
    commands: mpsc::Sender<Command>,
}

impl ManagerHandle {
    pub async fn create_instance(&self, name: &str, settings: InstanceSettings, driver: Box<dyn Driver>) -> Result<u8, ManagerError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Create { name: name.to_string(), settings: Box::new(settings), driver, reply })
            .await
            .map_err(|_| ManagerError::NoSuchInstance(0))?;
        rx.await.unwrap_or(Err(ManagerError::NoSuchInstance(0)))
    }

    pub async fn delete_instance(&self, index: u8) -> Result<(), ManagerError> {
        let (reply, rx) = oneshot::channel();
        self.commands.send(Command::Delete { index, reply }).await.map_err(|_| ManagerError::NoSuchInstance(index))?;
        rx.await.unwrap_or(Err(ManagerError::NoSuchInstance(index)))
    }

    pub async fn start_instance(&self, index: u8, disable_on_startup: bool) -> Result<(), ManagerError> {
        let (reply, rx) = oneshot::channel();
        self.commands.send(Command::Start { index, disable_on_startup, reply }).await.map_err(|_| ManagerError::NoSuchInstance(index))?;
        rx.await.unwrap_or(Err(ManagerError::NoSuchInstance(index)))
    }

    pub async fn stop_instance(&self, index: u8) -> Result<(), ManagerError> {
        let (reply, rx) = oneshot::channel();
        self.commands.send(Command::Stop { index, reply }).await.map_err(|_| ManagerError::NoSuchInstance(index))?;
        rx.await.unwrap_or(Err(ManagerError::NoSuchInstance(index)))
    }

    pub async fn toggle_state_all_instances(&self, pause: bool) {
        let (reply, rx) = oneshot::channel();
        if self.commands.send(Command::ToggleAll { pause, reply }).await.is_ok() {
            let _ = rx.await;
        }
    }

    pub async fn hibernate(&self, wake_up: bool, source: &str) {
        let (reply, rx) = oneshot::channel();
        if self.commands.send(Command::Hibernate { wake_up, source: source.to_string(), reply }).await.is_ok() {
            let _ = rx.await;
        }
    }
}

/// Owns every instance, the shared capture fan-out, and instance-0's ready
/// signal (spec §4.6 "Startup order").
pub struct Manager {
    instances: HashMap<u8, InstanceHandle>,
    next_index: u8,
    fanout: Fanout,
    ready_tx: watch::Sender<bool>,
    commands_rx: mpsc::Receiver<Command>,
}

impl Manager {
    pub fn spawn() -> (ManagerHandle, JoinHandle<()>) {
        let (commands_tx, commands_rx) = mpsc::channel(32);
        let (ready_tx, _ready_rx) = watch::channel(false);
        let manager = Manager { instances: HashMap::new(), next_index: 0, fanout: Fanout::new(), ready_tx, commands_rx };
        let task = tokio::spawn(manager.run());
        (ManagerHandle { commands: commands_tx }, task)
    }

    fn capture_subscription(&self) -> broadcast::Receiver<CaptureEvent> {
        self.fanout.subscribe()
    }

    async fn run(mut self) {
        while let Some(command) = self.commands_rx.recv().await {
            match command {
                Command::Create { name, settings, driver, reply } => {
                    let _ = reply.send(self.create_instance(&name, *settings, driver));
                }
                Command::Delete { index, reply } => {
                    let _ = reply.send(self.delete_instance(index).await);
                }
                Command::Start { index, disable_on_startup, reply } => {
                    let _ = reply.send(self.start_instance(index, disable_on_startup).await);
                }
                Command::Stop { index, reply } => {
                    let _ = reply.send(self.stop_instance(index).await);
                }
                Command::ToggleAll { pause, reply } => {
                    self.toggle_state_all_instances(pause);
                    let _ = reply.send(());
                }
                Command::Hibernate { wake_up, source, reply } => {
                    self.hibernate(wake_up, &source).await;
                    let _ = reply.send(());
                }
            }
        }
    }

    fn create_instance(&mut self, name: &str, settings: InstanceSettings, driver: Box<dyn Driver>) -> Result<u8, ManagerError> {
        if self.instances.len() >= 256 {
            return Err(ManagerError::InstanceLimitReached);
        }
        let index = self.next_index;
        self.next_index = self.next_index.checked_add(1).ok_or(ManagerError::InstanceLimitReached)?;

        self.instances.insert(index, InstanceHandle { name: name.to_string(), state: InstanceState::Stopped { settings, driver } });
        info!("created instance {index} ({name})");
        Ok(index)
    }

    async fn delete_instance(&mut self, index: u8) -> Result<(), ManagerError> {
        let handle = self.instances.remove(&index).ok_or(ManagerError::NoSuchInstance(index))?;
        if let InstanceState::Running { task, .. } = handle.state {
            task.abort();
        }
        Ok(())
    }

    async fn start_instance(&mut self, index: u8, disable_on_startup: bool) -> Result<(), ManagerError> {
        let handle = self.instances.get_mut(&index).ok_or(ManagerError::NoSuchInstance(index))?;
        let (settings, driver) = match std::mem::replace(&mut handle.state, InstanceState::Transitioning) {
            InstanceState::Stopped { settings, driver } => (settings, driver),
            other => {
                handle.state = other;
                return Err(ManagerError::AlreadyRunning(index));
            }
        };

        // Instance 0 owns the master clock: other instances only proceed
        // once it has signaled ready (spec §4.6 "Startup order").
        if index != 0 {
            let mut ready_rx = self.ready_tx.subscribe();
            if !*ready_rx.borrow() {
                let _ = ready_rx.changed().await;
            }
        }

        let (settings_tx, settings_rx) = mpsc::channel(8);
        let capture_rx = self.fanout.subscribe();
        let instance = Instance::new(index, settings, driver, EffectRegistry::new(), capture_rx, settings_rx, disable_on_startup);

        let ready_tx = self.ready_tx.clone();
        let is_first = index == 0;
        let task = tokio::spawn(async move {
            if is_first {
                let _ = ready_tx.send(true);
            }
            instance.run().await
        });

        handle.state = InstanceState::Running { name: handle.name.clone(), task, settings_tx };
        Ok(())
    }

    async fn stop_instance(&mut self, index: u8) -> Result<(), ManagerError> {
        let handle = self.instances.get_mut(&index).ok_or(ManagerError::NoSuchInstance(index))?;
        let running = std::mem::replace(&mut handle.state, InstanceState::Transitioning);
        let InstanceState::Running { task, .. } = running else {
            handle.state = running;
            return Err(ManagerError::NotRunning(index));
        };
        task.abort();
        let _ = task.await;
        // The instance's settings/driver aren't recoverable from a task
        // that owned them; a stopped instance needs re-creation with fresh
        // settings before it can be started again.
        handle.state = InstanceState::Stopped { settings: placeholder_settings(&handle.name), driver: Box::new(crate::driver::NullDriver::new(handle.name.clone())) };
        Ok(())
    }

    fn toggle_state_all_instances(&mut self, pause: bool) {
        for (index, handle) in &self.instances {
            if let InstanceState::Running { settings_tx, .. } = &handle.state {
                let payload = serde_json::json!({ "pause": pause });
                let update = SettingsUpdate { kind: crate::config::SettingsKind::Pause, payload };
                if settings_tx.try_send(update).is_err() {
                    warn!("instance {index} settings channel full while toggling pause");
                }
            }
        }
    }

    /// Quiesce all pipelines for an OS sleep/wake event by driving the same
    /// path as [`Self::toggle_state_all_instances`] (spec §4.6).
    async fn hibernate(&mut self, wake_up: bool, source: &str) {
        info!("hibernate(wake_up={wake_up}) from {source}");
        self.toggle_state_all_instances(!wake_up);
    }
}
