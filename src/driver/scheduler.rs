//! Steady-clock emission: pulls the latest colors off the pipeline at
//! `update_interval_ms` and writes them to the driver, with exponential
//! backoff on failure and power-gating on disable (spec §4.5).

use std::sync::Arc;
use std::time::Duration;

use log::{error, warn};

use crate::color::Rgb8;
use crate::forwarder::Forwarder;

use super::Driver;

const BASE_BACKOFF: Duration = Duration::from_millis(100);
const MAX_BACKOFF: Duration = Duration::from_secs(1);
const MAX_CONSECUTIVE_FAILURES: u32 = 5;

pub struct OutputScheduler {
    driver: Box<dyn Driver>,
    led_count: usize,
    enabled: bool,
    disabled_by_failures: bool,
    consecutive_failures: u32,
    backoff: Duration,
    wrote_black_since_disable: bool,
    forwarder: Arc<Forwarder>,
}

impl OutputScheduler {
    pub fn new(driver: Box<dyn Driver>, led_count: usize, forwarder: Arc<Forwarder>) -> Self {
        OutputScheduler {
            driver,
            led_count,
            enabled: true,
            disabled_by_failures: false,
            consecutive_failures: 0,
            backoff: BASE_BACKOFF,
            wrote_black_since_disable: false,
            forwarder,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled && !self.enabled {
            self.consecutive_failures = 0;
            self.disabled_by_failures = false;
            self.backoff = BASE_BACKOFF;
        }
        if !enabled {
            self.wrote_black_since_disable = false;
        }
        self.enabled = enabled;
    }

    pub fn is_disabled_by_failures(&self) -> bool {
        self.disabled_by_failures
    }

    /// Emit one frame. When the component is disabled, write a single black
    /// frame then stop (spec §4.5 "Power / enable gating"); on failure,
    /// returns the backoff to wait before the next attempt.
    pub async fn emit(&mut self, colors: &[Rgb8]) -> Option<Duration> {
        if self.disabled_by_failures {
            return None;
        }

        let payload: Vec<Rgb8>;
        let to_write: &[Rgb8] = if self.enabled {
            colors
        } else {
            if self.wrote_black_since_disable {
                return None;
            }
            payload = vec![Rgb8::BLACK; self.led_count];
            &payload
        };

        match self.driver.write(to_write).await {
            Ok(()) => {
                self.consecutive_failures = 0;
                self.backoff = BASE_BACKOFF;
                if !self.enabled {
                    self.wrote_black_since_disable = true;
                }
                if self.forwarder.client_count() > 0 {
                    self.forwarder.publish_colors(to_write.to_vec());
                }
                None
            }
            Err(e) => {
                self.consecutive_failures += 1;
                warn!("driver write failed ({}/{}): {e}", self.consecutive_failures, MAX_CONSECUTIVE_FAILURES);
                if self.consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                    error!("driver disabled after {MAX_CONSECUTIVE_FAILURES} consecutive failures");
                    self.disabled_by_failures = true;
                    return None;
                }
                let wait = self.backoff;
                self.backoff = (self.backoff * 2).min(MAX_BACKOFF);
                Some(wait)
            }
        }
    }
}
