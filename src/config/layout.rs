//! LED layout: an ordered list of fractional scan rectangles describing
//! which portion of a captured frame each LED represents (spec §3 "LED
//! layout"). Directly generalizes the teacher's `Region`/`LedAxisPos`.

use serde::{Deserialize, Serialize};

/// A fractional scanning rectangle in `[0, 1]^2`. Invariant: `x1 < x2` and
/// `y1 < y2`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScanRect {
    pub x1: f32,
    pub x2: f32,
    pub y1: f32,
    pub y2: f32,
}

impl ScanRect {
    pub fn is_valid(&self) -> bool {
        (0.0..=1.0).contains(&self.x1)
            && (0.0..=1.0).contains(&self.x2)
            && (0.0..=1.0).contains(&self.y1)
            && (0.0..=1.0).contains(&self.y2)
            && self.x1 < self.x2
            && self.y1 < self.y2
    }
}

/// One LED in the layout: its scan rectangle, an optional group for
/// uniform-zone averaging, and whether it is currently disabled.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Led {
    pub rect: ScanRect,
    pub group: Option<u16>,
    #[serde(default)]
    pub disabled: bool,
}

/// Ordered list of LEDs belonging to one instance. Owned by the instance;
/// the reducer holds a snapshot and must be rebuilt on mutation (spec §3).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LedLayout {
    pub leds: Vec<Led>,
}

impl LedLayout {
    pub fn len(&self) -> usize {
        self.leds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leds.is_empty()
    }
}

/// Parse a comma-separated list of indices or index ranges (e.g.
/// `"3, 4-8, 0, 20-24"`) into half-open `Range`s, as used by color
/// transforms and effect target selections. `"*"` means the whole layout.
/// Directly ported from the teacher's `parse_led_indices`.
pub fn parse_led_indices(indices_str: &str, total_n_leds: usize) -> Vec<std::ops::Range<usize>> {
    if indices_str.trim() == "*" {
        return vec![0..total_n_leds];
    }

    indices_str
        .split(',')
        .map(|part| part.trim().split('-').collect::<Vec<_>>())
        .filter(|parts| !parts.is_empty() && parts.len() <= 2)
        .filter_map(|parts| match parts.len() {
            1 => parts[0].parse::<usize>().ok().map(|i| i..(i + 1)),
            2 => match (parts[0].parse::<usize>(), parts[1].parse::<usize>()) {
                (Ok(i), Ok(j)) => Some(i..(j + 1)),
                _ => None,
            },
            _ => None,
        })
        .collect()
}
