//! Adalight-style serial driver: a fixed 6-byte magic-word/checksum header
//! followed by raw RGB bytes, directly generalizing the teacher's
//! `init_pixel_buffer` framing to the `Driver` trait.

use async_trait::async_trait;
use log::info;

use crate::color::{rgbs_as_bytes, Rgb8};
use crate::config::DriverConfig;
use crate::error::DriverError;

use super::Driver;

const HEADER_SIZE: usize = 6;

/// Build the fixed Adalight header for `n_leds` LEDs: `"Ada"` magic word,
/// LED-count-minus-one split into high/low bytes, then an XOR checksum —
/// the counting convention LEDstream firmware expects.
fn build_header(n_leds: u16) -> [u8; HEADER_SIZE] {
    let count_minus_one = n_leds.wrapping_sub(1);
    let hi = (count_minus_one >> 8) as u8;
    let lo = (count_minus_one & 0xff) as u8;
    [b'A', b'd', b'a', hi, lo, hi ^ lo ^ 0x55]
}

pub struct SerialDriver {
    port_name: String,
    baud_rate: u32,
    port: Option<Box<dyn serialport::SerialPort>>,
    header: [u8; HEADER_SIZE],
    led_count: usize,
}

impl SerialDriver {
    pub fn new() -> Self {
        SerialDriver { port_name: String::new(), baud_rate: 115_200, port: None, header: [0; HEADER_SIZE], led_count: 0 }
    }
}

impl Default for SerialDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Driver for SerialDriver {
    async fn init(&mut self, config: DriverConfig) -> Result<(), DriverError> {
        self.port_name = config.output;
        self.baud_rate = config.rate;
        Ok(())
    }

    async fn open(&mut self) -> Result<(), DriverError> {
        let port = serialport::new(&self.port_name, self.baud_rate)
            .timeout(std::time::Duration::from_millis(500))
            .open()
            .map_err(|e| DriverError::Transient(e.to_string()))?;
        info!("opened serial device {} at {} baud", self.port_name, self.baud_rate);
        self.port = Some(port);
        Ok(())
    }

    async fn close(&mut self) {
        self.port = None;
    }

    async fn write(&mut self, colors: &[Rgb8]) -> Result<(), DriverError> {
        let Some(port) = self.port.as_mut() else {
            return Err(DriverError::NotOpen);
        };

        if colors.len() != self.led_count {
            self.led_count = colors.len();
            self.header = build_header(self.led_count.min(u16::MAX as usize) as u16);
        }

        std::io::Write::write_all(port, &self.header).map_err(DriverError::Io)?;
        std::io::Write::write_all(port, rgbs_as_bytes(colors)).map_err(DriverError::Io)?;
        Ok(())
    }

    fn identify(&self, _params: &serde_json::Value) -> serde_json::Value {
        serde_json::json!({ "driver": "serial", "port": self.port_name, "rate": self.baud_rate })
    }

    fn discover(_params: &serde_json::Value) -> Vec<serde_json::Value> {
        serialport::available_ports()
            .unwrap_or_default()
            .into_iter()
            .map(|p| serde_json::json!({ "port": p.port_name }))
            .collect()
    }
}
