//! Image→LED reduction: turns a captured frame into exactly one color per
//! LED in the layout (spec §4.2).

mod border;
mod index;

pub use border::{AutomaticDetector, BorderDetector, ManualDetector};
pub use index::{ReduceMode, ReducerIndex, MAX_PIXELS_PER_LED};

use std::collections::HashMap;
use std::time::Instant;

use crate::capture::Frame;
use crate::color::Rgb8;
use crate::config::LedLayout;

/// 256-entry perceptual weighting curve applied to each pixel's luma before
/// summation in [`ReduceMode::WeightedMean`] (spec §4.2 "approximates
/// perceptual averaging"). A plain gamma-like curve; replace with a
/// calibrated table if one becomes available.
fn weight_lut() -> [u32; 256] {
    let mut lut = [0u32; 256];
    for (i, w) in lut.iter_mut().enumerate() {
        let x = i as f32 / 255.0;
        *w = (x.powf(1.6) * 255.0).round() as u32 + 1;
    }
    lut
}

fn luma(p: Rgb8) -> u8 {
    ((77 * p.r as u32 + 150 * p.g as u32 + 29 * p.b as u32) >> 8) as u8
}

pub struct Reducer {
    layout: LedLayout,
    index: ReducerIndex,
    border: Box<dyn BorderDetector>,
    mode: ReduceMode,
    sparse: bool,
    last_colors: Vec<Rgb8>,
    weights: [u32; 256],
}

impl Reducer {
    pub fn new(layout: LedLayout, mode: ReduceMode, sparse: bool, border: Box<dyn BorderDetector>) -> Self {
        let led_count = layout.len();
        Reducer {
            index: ReducerIndex::default(),
            layout,
            border,
            mode,
            sparse,
            last_colors: vec![Rgb8::BLACK; led_count],
            weights: weight_lut(),
        }
    }

    pub fn set_layout(&mut self, layout: LedLayout) {
        self.last_colors = vec![Rgb8::BLACK; layout.len()];
        self.layout = layout;
        self.index = ReducerIndex::default();
    }

    pub fn set_mode(&mut self, mode: ReduceMode) {
        self.mode = mode;
        self.index = ReducerIndex::default();
    }

    /// Reduce one frame to `layout.len()` colors. Returns the last-known
    /// colors unchanged for an empty frame (spec §4.2 "Failure").
    pub fn reduce(&mut self, frame: &Frame, now: Instant) -> &[Rgb8] {
        if frame.is_empty() {
            return &self.last_colors;
        }

        if let Some((h, v)) = self.border.process(frame, now) {
            self.rebuild(frame, h, v);
        } else if !self.index.matches(frame.width, frame.height) {
            let (h, v) = self.border.current();
            self.rebuild(frame, h, v);
        }

        let pixels = frame.pixels();
        let mut sums: Vec<[u64; 3]> = vec![[0, 0, 0]; self.layout.len()];
        let mut counts: Vec<u64> = vec![0; self.layout.len()];

        match self.mode {
            ReduceMode::Unicolor => {
                let (mut r, mut g, mut b, mut n) = (0u64, 0u64, 0u64, 0u64);
                for &p in pixels {
                    r += p.r as u64;
                    g += p.g as u64;
                    b += p.b as u64;
                    n += 1;
                }
                let avg = if n > 0 { Rgb8::new((r / n) as u8, (g / n) as u8, (b / n) as u8) } else { Rgb8::BLACK };
                self.last_colors.iter_mut().for_each(|c| *c = avg);
                return &self.last_colors;
            }
            ReduceMode::Mean => {
                for (led_idx, indices) in self.index.pixel_indices.iter().enumerate() {
                    for &pi in indices {
                        if let Some(&p) = pixels.get(pi as usize) {
                            sums[led_idx][0] += p.r as u64;
                            sums[led_idx][1] += p.g as u64;
                            sums[led_idx][2] += p.b as u64;
                            counts[led_idx] += 1;
                        }
                    }
                }
            }
            ReduceMode::WeightedMean => {
                for (led_idx, indices) in self.index.pixel_indices.iter().enumerate() {
                    for &pi in indices {
                        if let Some(&p) = pixels.get(pi as usize) {
                            let w = self.weights[luma(p) as usize] as u64;
                            sums[led_idx][0] += p.r as u64 * w;
                            sums[led_idx][1] += p.g as u64 * w;
                            sums[led_idx][2] += p.b as u64 * w;
                            counts[led_idx] += w;
                        }
                    }
                }
            }
        }

        merge_groups(&self.layout, &mut sums, &mut counts);

        for (i, color) in self.last_colors.iter_mut().enumerate() {
            if counts[i] > 0 {
                *color = Rgb8::new((sums[i][0] / counts[i]) as u8, (sums[i][1] / counts[i]) as u8, (sums[i][2] / counts[i]) as u8);
            }
        }

        &self.last_colors
    }

    fn rebuild(&mut self, frame: &Frame, h_border: u32, v_border: u32) {
        self.index = ReducerIndex::build(&self.layout, frame.width, frame.height, h_border, v_border, self.mode, self.sparse);
    }
}

/// Merge sampled sums for LEDs sharing a non-zero group id, then let every
/// member read the merged total (spec §4.2 "Grouped averaging").
fn merge_groups(layout: &LedLayout, sums: &mut [[u64; 3]], counts: &mut [u64]) {
    let mut groups: HashMap<u16, ([u64; 3], u64)> = HashMap::new();
    for (i, led) in layout.leds.iter().enumerate() {
        if let Some(group) = led.group.filter(|g| *g != 0) {
            let entry = groups.entry(group).or_insert(([0, 0, 0], 0));
            entry.0[0] += sums[i][0];
            entry.0[1] += sums[i][1];
            entry.0[2] += sums[i][2];
            entry.1 += counts[i];
        }
    }
    for (i, led) in layout.leds.iter().enumerate() {
        if let Some(group) = led.group.filter(|g| *g != 0) {
            let (sum, count) = groups[&group];
            sums[i] = sum;
            counts[i] = count;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::PixelFormat;
    use crate::config::{Led, ScanRect};

    fn led(x1: f32, x2: f32, y1: f32, y2: f32, group: Option<u16>) -> Led {
        Led { rect: ScanRect { x1, x2, y1, y2 }, group, disabled: false }
    }

    fn quadrant_layout() -> LedLayout {
        LedLayout {
            leds: vec![
                led(0.0, 0.5, 0.0, 0.5, None),
                led(0.5, 1.0, 0.0, 0.5, None),
                led(0.0, 0.5, 0.5, 1.0, None),
                led(0.5, 1.0, 0.5, 1.0, None),
            ],
        }
    }

    #[test]
    fn mean_reduction_matches_quadrant_colors() {
        let mut reducer = Reducer::new(quadrant_layout(), ReduceMode::Mean, false, Box::new(ManualDetector::new(0, 0)));
        let pixels = vec![Rgb8::new(255, 0, 0), Rgb8::new(0, 255, 0), Rgb8::new(0, 0, 255), Rgb8::new(255, 255, 255)];
        let frame = Frame::new(2, 2, PixelFormat::Rgb24, pixels);
        let out = reducer.reduce(&frame, Instant::now()).to_vec();
        assert_eq!(out, vec![Rgb8::new(255, 0, 0), Rgb8::new(0, 255, 0), Rgb8::new(0, 0, 255), Rgb8::new(255, 255, 255)]);
    }

    #[test]
    fn unicolor_mode_emits_the_same_color_to_every_led() {
        let mut reducer = Reducer::new(quadrant_layout(), ReduceMode::Unicolor, false, Box::new(ManualDetector::new(0, 0)));
        let pixels = vec![Rgb8::new(100, 100, 100); 4];
        let frame = Frame::new(2, 2, PixelFormat::Rgb24, pixels);
        let out = reducer.reduce(&frame, Instant::now()).to_vec();
        assert!(out.iter().all(|&c| c == Rgb8::new(100, 100, 100)));
    }

    #[test]
    fn grouped_leds_end_up_with_identical_colors() {
        let layout = LedLayout {
            leds: vec![led(0.0, 0.5, 0.0, 1.0, Some(1)), led(0.5, 1.0, 0.0, 1.0, Some(1))],
        };
        let mut reducer = Reducer::new(layout, ReduceMode::Mean, false, Box::new(ManualDetector::new(0, 0)));
        let pixels = vec![Rgb8::new(255, 0, 0), Rgb8::new(0, 0, 255)];
        let frame = Frame::new(2, 1, PixelFormat::Rgb24, pixels);
        let out = reducer.reduce(&frame, Instant::now()).to_vec();
        assert_eq!(out[0], out[1], "grouped leds must share a single averaged color");
    }

    #[test]
    fn empty_frame_returns_last_known_colors() {
        let mut reducer = Reducer::new(quadrant_layout(), ReduceMode::Mean, false, Box::new(ManualDetector::new(0, 0)));
        let frame = Frame::new(2, 2, PixelFormat::Rgb24, vec![Rgb8::new(9, 9, 9); 4]);
        let first = reducer.reduce(&frame, Instant::now()).to_vec();

        let empty = Frame::new(0, 0, PixelFormat::Rgb24, vec![]);
        let second = reducer.reduce(&empty, Instant::now()).to_vec();
        assert_eq!(first, second);
    }

    #[test]
    fn reduction_is_idempotent_for_the_same_inputs() {
        let mut reducer = Reducer::new(quadrant_layout(), ReduceMode::Mean, false, Box::new(ManualDetector::new(0, 0)));
        let pixels = vec![Rgb8::new(10, 20, 30); 4];
        let frame = Frame::new(2, 2, PixelFormat::Rgb24, pixels);
        let first = reducer.reduce(&frame, Instant::now()).to_vec();
        let second = reducer.reduce(&frame, Instant::now()).to_vec();
        assert_eq!(first, second);
    }
}
