//! Black-bar border detection. Two strategies behind one trait: a manual
//! detector trusting user-supplied threshold rectangles, and an automatic
//! one that scans the frame edges for sustained black borders (spec §4.2
//! "Border detection"; debounce strategy grounded in `DetectionManual.h`'s
//! `_noSignalCounterThreshold` pattern, since the original engine's border
//! scan itself uses the same stabilize-then-commit shape).

use std::time::{Duration, Instant};

use crate::capture::Frame;
use crate::color::Rgb8;

/// Minimum time between two border changes, to stop the inset from hunting
/// back and forth on noisy frames (spec §4.2 "50-ms minimum inter-change
/// interval").
const MIN_CHANGE_INTERVAL: Duration = Duration::from_millis(50);

/// How many *consecutive* frames must agree on the same inset before it is
/// committed (spec §4.2 "two consecutive agreeing measurements").
const AGREEMENT_COUNT: u32 = 2;

/// Brightness below which a row/column is considered part of a black bar.
const BLACK_THRESHOLD: u8 = 8;

pub trait BorderDetector: Send {
    /// Inspect a frame and return the committed `(h_border, v_border)` if it
    /// just changed, or `None` if nothing changed this call.
    fn process(&mut self, frame: &Frame, now: Instant) -> Option<(u32, u32)>;
    fn current(&self) -> (u32, u32);
}

/// Scans inward from each edge looking for rows/columns whose pixels are all
/// below [`BLACK_THRESHOLD`], grounded in `DetectionAutomatic`'s
/// calibrate-then-commit state machine.
pub struct AutomaticDetector {
    committed: (u32, u32),
    pending: Option<(u32, u32)>,
    agreement: u32,
    last_change: Option<Instant>,
}

impl AutomaticDetector {
    pub fn new() -> Self {
        AutomaticDetector { committed: (0, 0), pending: None, agreement: 0, last_change: None }
    }

    fn measure(frame: &Frame) -> (u32, u32) {
        let w = frame.width as usize;
        let h = frame.height as usize;
        if w == 0 || h == 0 {
            return (0, 0);
        }
        let pixels = frame.pixels();

        let row_is_black = |y: usize| (0..w).all(|x| is_black(pixels[y * w + x]));
        let col_is_black = |x: usize| (0..h).all(|y| is_black(pixels[y * w + x]));

        let mut v_border = 0usize;
        while v_border < h / 2 && row_is_black(v_border) {
            v_border += 1;
        }
        let mut h_border = 0usize;
        while h_border < w / 2 && col_is_black(h_border) {
            h_border += 1;
        }

        (h_border as u32, v_border as u32)
    }
}

fn is_black(p: Rgb8) -> bool {
    p.r <= BLACK_THRESHOLD && p.g <= BLACK_THRESHOLD && p.b <= BLACK_THRESHOLD
}

impl BorderDetector for AutomaticDetector {
    fn process(&mut self, frame: &Frame, now: Instant) -> Option<(u32, u32)> {
        let measured = Self::measure(frame);

        if measured == self.committed {
            self.pending = None;
            self.agreement = 0;
            return None;
        }

        match self.pending {
            Some(p) if p == measured => self.agreement += 1,
            _ => {
                self.pending = Some(measured);
                self.agreement = 1;
            }
        }

        if self.agreement < AGREEMENT_COUNT {
            return None;
        }
        if let Some(last) = self.last_change {
            if now.duration_since(last) < MIN_CHANGE_INTERVAL {
                return None;
            }
        }

        self.committed = measured;
        self.pending = None;
        self.agreement = 0;
        self.last_change = Some(now);
        Some(self.committed)
    }

    fn current(&self) -> (u32, u32) {
        self.committed
    }
}

/// Fixed, user-supplied inset with no scanning (spec's "manual" mode,
/// grounded in `DetectionManual`'s fixed-threshold configuration style).
pub struct ManualDetector {
    border: (u32, u32),
}

impl ManualDetector {
    pub fn new(h_border: u32, v_border: u32) -> Self {
        ManualDetector { border: (h_border, v_border) }
    }

    pub fn set(&mut self, h_border: u32, v_border: u32) {
        self.border = (h_border, v_border);
    }
}

impl BorderDetector for ManualDetector {
    fn process(&mut self, _frame: &Frame, _now: Instant) -> Option<(u32, u32)> {
        None
    }

    fn current(&self) -> (u32, u32) {
        self.border
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::PixelFormat;

    fn framed_with_black_border(w: u32, h: u32, border: u32) -> Frame {
        let mut pixels = vec![Rgb8::new(200, 200, 200); (w * h) as usize];
        for y in 0..h {
            for x in 0..w {
                if y < border || y >= h - border || x < border || x >= w - border {
                    pixels[(y * w + x) as usize] = Rgb8::BLACK;
                }
            }
        }
        Frame::new(w, h, PixelFormat::Rgb24, pixels)
    }

    #[test]
    fn automatic_detector_requires_two_agreeing_frames_before_committing() {
        let mut detector = AutomaticDetector::new();
        let frame = framed_with_black_border(20, 20, 3);
        let t0 = Instant::now();

        assert_eq!(detector.process(&frame, t0), None, "first measurement must not commit immediately");
        let committed = detector.process(&frame, t0 + Duration::from_millis(60));
        assert_eq!(committed, Some((3, 3)));
        assert_eq!(detector.current(), (3, 3));
    }

    #[test]
    fn automatic_detector_respects_minimum_change_interval() {
        let mut detector = AutomaticDetector::new();
        let frame = framed_with_black_border(20, 20, 2);
        let t0 = Instant::now();
        detector.process(&frame, t0);
        detector.process(&frame, t0 + Duration::from_millis(1));

        let other = framed_with_black_border(20, 20, 4);
        detector.process(&other, t0 + Duration::from_millis(2));
        let too_soon = detector.process(&other, t0 + Duration::from_millis(10));
        assert_eq!(too_soon, None, "a change within 50ms of the last commit must be held back");
    }

    #[test]
    fn manual_detector_never_changes_on_its_own() {
        let mut detector = ManualDetector::new(5, 5);
        let frame = framed_with_black_border(20, 20, 0);
        assert_eq!(detector.process(&frame, Instant::now()), None);
        assert_eq!(detector.current(), (5, 5));
    }
}
