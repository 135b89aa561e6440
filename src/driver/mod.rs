//! LED output: the device-facing `Driver` trait, two concrete drivers, and
//! the steady-clock scheduler that drives them (spec §4.5).

mod null;
mod scheduler;
mod serial;

pub use null::NullDriver;
pub use scheduler::OutputScheduler;
pub use serial::SerialDriver;

use async_trait::async_trait;

use crate::color::Rgb8;
use crate::config::DriverConfig;
use crate::error::DriverError;

/// Device-facing contract every LED output implements (spec §4.5 "Driver
/// contract"). `async-trait` is used here and nowhere else in the crate —
/// this is the one genuinely async, object-safe interface.
#[async_trait]
pub trait Driver: Send {
    async fn init(&mut self, config: DriverConfig) -> Result<(), DriverError>;
    async fn open(&mut self) -> Result<(), DriverError>;
    async fn close(&mut self);
    async fn write(&mut self, colors: &[Rgb8]) -> Result<(), DriverError>;
    fn identify(&self, params: &serde_json::Value) -> serde_json::Value;
    /// Enumerate connected devices this driver kind could open. Excluded
    /// from the trait's object-safety requirements (`Self: Sized`) since it
    /// has no receiver; callers go through the concrete type to discover.
    fn discover(_params: &serde_json::Value) -> Vec<serde_json::Value>
    where
        Self: Sized,
    {
        Vec::new()
    }
}
