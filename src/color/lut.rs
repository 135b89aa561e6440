//! 3D lookup table for tone-mapping and the automatic SDR/HDR dwell-timer
//! state machine that selects which table variant is bound.
//!
//! Grounded in `include/base/AutomaticToneMapping.h` from the original
//! implementation: a running per-frame max of Y/U/V drives a hysteresis
//! switch between two table variants, with separate "enter" and "leave"
//! dwell times so a single bright frame doesn't flap the mode.

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::rgb::Rgb8;

const LUT_SIDE: usize = 256;
const LUT_BYTES: usize = LUT_SIDE * LUT_SIDE * LUT_SIDE * 3;

/// Which table a [`Lut`] was built for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LutVariant {
    Sdr,
    Hdr,
}

/// A 256^3 x 3-byte lookup table mapping source YUV/RGB to corrected RGB.
/// Loaded once per pixel format at pipeline start and shared read-only
/// across instances via `Arc`.
#[derive(Clone)]
pub struct Lut {
    table: Arc<[u8]>,
    variant: LutVariant,
}

impl Lut {
    /// Build a LUT from a raw 256^3*3 byte table (as produced by the
    /// out-of-scope calibration wizard). Returns `None` if the table is the
    /// wrong size.
    pub fn from_bytes(bytes: Vec<u8>, variant: LutVariant) -> Option<Self> {
        if bytes.len() != LUT_BYTES {
            return None;
        }
        Some(Lut { table: Arc::from(bytes), variant })
    }

    /// The identity LUT: every input maps to itself. Used when no
    /// calibrated table has been loaded for a format.
    pub fn identity(variant: LutVariant) -> Self {
        let mut bytes = vec![0u8; LUT_BYTES];
        for r in 0..LUT_SIDE {
            for g in 0..LUT_SIDE {
                for b in 0..LUT_SIDE {
                    let idx = (r * LUT_SIDE * LUT_SIDE + g * LUT_SIDE + b) * 3;
                    bytes[idx] = r as u8;
                    bytes[idx + 1] = g as u8;
                    bytes[idx + 2] = b as u8;
                }
            }
        }
        Lut { table: Arc::from(bytes), variant }
    }

    pub fn variant(&self) -> LutVariant {
        self.variant
    }

    pub fn lookup(&self, rgb: Rgb8) -> Rgb8 {
        let idx = (rgb.r as usize * LUT_SIDE * LUT_SIDE + rgb.g as usize * LUT_SIDE + rgb.b as usize) * 3;
        Rgb8::new(self.table[idx], self.table[idx + 1], self.table[idx + 2])
    }
}

/// Which tone-mapping table binding mode is active.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToneMappingMode {
    Off,
    Manual(LutVariant),
    Auto,
}

/// Per-frame Y/U/V maxima thresholds that drive the SDR/HDR dwell switch.
#[derive(Clone, Copy, Debug)]
pub struct ToneMappingThresholds {
    pub y: u8,
    pub u: u8,
    pub v: u8,
}

/// Dwell-timer state machine selecting between the SDR and HDR LUT variants
/// in [`ToneMappingMode::Auto`]. A frame above `thresholds` for at least
/// `enter_after` keeps HDR engaged; once below threshold it must stay below
/// for `leave_after` before falling back to SDR.
pub struct AutomaticToneMapping {
    enabled: bool,
    thresholds: ToneMappingThresholds,
    enter_after: Duration,
    leave_after: Duration,
    running: ToneMappingThresholds,
    hdr_active: bool,
    above_since: Option<Instant>,
    below_since: Option<Instant>,
}

impl AutomaticToneMapping {
    pub fn new(thresholds: ToneMappingThresholds, enter_after: Duration, leave_after: Duration) -> Self {
        AutomaticToneMapping {
            enabled: true,
            thresholds,
            enter_after,
            leave_after,
            running: ToneMappingThresholds { y: 0, u: 0, v: 0 },
            hdr_active: false,
            above_since: None,
            below_since: None,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.hdr_active = false;
            self.above_since = None;
            self.below_since = None;
        }
    }

    /// Feed one frame's running Y/U/V maxima and advance the dwell timers.
    /// Returns the LUT variant that should be bound for the *next* frame.
    pub fn observe(&mut self, y: u8, u: u8, v: u8, now: Instant) -> LutVariant {
        self.running.y = self.running.y.max(y);
        self.running.u = self.running.u.max(u);
        self.running.v = self.running.v.max(v);

        if !self.enabled {
            return LutVariant::Sdr;
        }

        let above = self.running.y > self.thresholds.y
            || self.running.u > self.thresholds.u
            || self.running.v > self.thresholds.v;

        if above {
            self.below_since = None;
            let since = *self.above_since.get_or_insert(now);
            if !self.hdr_active && now.duration_since(since) >= self.enter_after {
                self.hdr_active = true;
            }
        } else {
            self.above_since = None;
            let since = *self.below_since.get_or_insert(now);
            if self.hdr_active && now.duration_since(since) >= self.leave_after {
                self.hdr_active = false;
            }
        }

        if self.hdr_active {
            LutVariant::Hdr
        } else {
            LutVariant::Sdr
        }
    }

    /// Reset the running per-frame maxima; called once a frame has been
    /// fully processed.
    pub fn finalize_frame(&mut self) {
        self.running = ToneMappingThresholds { y: 0, u: 0, v: 0 };
    }
}
