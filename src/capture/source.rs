//! The capture source interface (spec §6 "Capture source (inbound)").
//!
//! A producer is anything that can emit frames: screen capture, a USB
//! capture device, or a network image producer. This crate treats all three
//! as external collaborators behind this trait; no concrete OS capture
//! backend is implemented here.

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::frame::Frame;

/// Crop margins in pixels, applied by the producer before a frame is handed
/// to the fan-out (distinct from the reducer's black-border compensation,
/// which operates on the already-captured frame).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cropping {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

/// Emitted by a capture source as it runs.
#[derive(Clone, Debug)]
pub enum CaptureEvent {
    NewFrame(Frame),
    StateChanged { device: String, active: bool },
}

/// A capture producer: screen grabber, USB capture card, or network image
/// source. Implementations publish [`CaptureEvent::NewFrame`] onto the
/// broadcast sender they were constructed with; the manager owns the
/// sender/fan-out (see [`super::fanout::Fanout`]).
#[async_trait]
pub trait CaptureSource: Send {
    fn json_info(&self) -> serde_json::Value;

    async fn start(&mut self) -> Result<(), crate::error::CaptureError>;

    async fn stop(&mut self);

    fn set_signal_threshold(&mut self, threshold: f32);

    fn set_cropping(&mut self, crop: Cropping);

    fn set_hdr_tone_mapping_enabled(&mut self, enabled: bool);
}

/// Handle returned to a consumer that wants to observe a capture source's
/// events without owning it.
pub fn subscribe(sender: &broadcast::Sender<CaptureEvent>) -> broadcast::Receiver<CaptureEvent> {
    sender.subscribe()
}
