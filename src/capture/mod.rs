//! Capture producers and the fan-out that routes frames to every
//! subscribed instance (spec §6, §5).

mod analyzer;
mod fanout;
mod frame;
mod producer;
mod source;

pub use analyzer::ImageAnalyzer;
pub use fanout::{Fanout, FANOUT_DEPTH};
pub use frame::{Frame, PixelFormat};
pub use producer::TestPatternSource;
pub use source::{subscribe, CaptureEvent, CaptureSource, Cropping};
