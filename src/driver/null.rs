//! Logging test-double driver: accepts writes, never talks to hardware.

use async_trait::async_trait;
use log::info;

use crate::color::Rgb8;
use crate::config::DriverConfig;
use crate::error::DriverError;

use super::Driver;

pub struct NullDriver {
    name: String,
    open: bool,
    led_count: usize,
    pub last_write: Vec<Rgb8>,
}

impl NullDriver {
    pub fn new(name: impl Into<String>) -> Self {
        NullDriver { name: name.into(), open: false, led_count: 0, last_write: Vec::new() }
    }
}

#[async_trait]
impl Driver for NullDriver {
    async fn init(&mut self, config: DriverConfig) -> Result<(), DriverError> {
        info!("{} init: {:?}", self.name, config.kind);
        Ok(())
    }

    async fn open(&mut self) -> Result<(), DriverError> {
        self.open = true;
        Ok(())
    }

    async fn close(&mut self) {
        self.open = false;
    }

    async fn write(&mut self, colors: &[Rgb8]) -> Result<(), DriverError> {
        if !self.open {
            return Err(DriverError::NotOpen);
        }
        self.led_count = colors.len();
        self.last_write = colors.to_vec();
        Ok(())
    }

    fn identify(&self, _params: &serde_json::Value) -> serde_json::Value {
        serde_json::json!({ "driver": "null", "name": self.name, "leds": self.led_count })
    }
}
