//! A synthetic capture source used by the manager's demo wiring and by
//! integration tests. Real screen/USB/network producers are external
//! collaborators (spec §1) implemented outside this crate against the
//! [`CaptureSource`] trait; this one exists so the pipeline is exercisable
//! end to end without any platform-specific capture backend.

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::time::{self, Duration};

use crate::color::Rgb8;
use crate::error::CaptureError;

use super::frame::{Frame, PixelFormat};
use super::source::{CaptureEvent, CaptureSource, Cropping};

/// Emits a solid-color frame of a fixed size at a fixed interval, cycling
/// through a small palette. Useful as a stand-in producer and as the
/// backbone of the muxer/reducer integration tests.
pub struct TestPatternSource {
    name: String,
    width: u32,
    height: u32,
    interval: Duration,
    palette: Vec<Rgb8>,
    sender: broadcast::Sender<CaptureEvent>,
    task: Option<tokio::task::JoinHandle<()>>,
    cropping: Cropping,
    signal_threshold: f32,
    hdr_tone_mapping: bool,
}

impl TestPatternSource {
    pub fn new(
        name: impl Into<String>,
        width: u32,
        height: u32,
        interval: Duration,
        palette: Vec<Rgb8>,
        sender: broadcast::Sender<CaptureEvent>,
    ) -> Self {
        TestPatternSource {
            name: name.into(),
            width,
            height,
            interval,
            palette,
            sender,
            task: None,
            cropping: Cropping::default(),
            signal_threshold: 0.0,
            hdr_tone_mapping: false,
        }
    }
}

#[async_trait]
impl CaptureSource for TestPatternSource {
    fn json_info(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "width": self.width,
            "height": self.height,
            "kind": "test-pattern",
        })
    }

    async fn start(&mut self) -> Result<(), CaptureError> {
        if self.task.is_some() {
            return Err(CaptureError::AlreadyStarted);
        }

        let width = self.width;
        let height = self.height;
        let interval = self.interval;
        let palette = self.palette.clone();
        let sender = self.sender.clone();
        let name = self.name.clone();

        let _ = sender.send(CaptureEvent::StateChanged { device: name, active: true });

        self.task = Some(tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            let mut index = 0usize;
            loop {
                ticker.tick().await;
                if palette.is_empty() {
                    continue;
                }
                let color = palette[index % palette.len()];
                index = index.wrapping_add(1);
                let pixels = vec![color; (width * height) as usize];
                let frame = Frame::new(width, height, PixelFormat::Rgb24, pixels);
                if sender.send(CaptureEvent::NewFrame(frame)).is_err() {
                    // No subscribers left; keep ticking, a future subscriber may still connect.
                }
            }
        }));

        Ok(())
    }

    async fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        let _ = self.sender.send(CaptureEvent::StateChanged { device: self.name.clone(), active: false });
    }

    fn set_signal_threshold(&mut self, threshold: f32) {
        self.signal_threshold = threshold;
    }

    fn set_cropping(&mut self, crop: Cropping) {
        self.cropping = crop;
    }

    fn set_hdr_tone_mapping_enabled(&mut self, enabled: bool) {
        self.hdr_tone_mapping = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emits_frames_at_the_configured_interval() {
        let (sender, mut rx) = broadcast::channel(4);
        let mut source =
            TestPatternSource::new("test", 2, 2, Duration::from_millis(5), vec![Rgb8::new(1, 2, 3)], sender);
        source.start().await.unwrap();

        let event = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await.unwrap().unwrap();
        match event {
            CaptureEvent::StateChanged { active, .. } => assert!(active),
            _ => panic!("expected state change first"),
        }

        let event = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await.unwrap().unwrap();
        match event {
            CaptureEvent::NewFrame(frame) => assert_eq!(frame.pixels()[0], Rgb8::new(1, 2, 3)),
            _ => panic!("expected a frame"),
        }

        source.stop().await;
    }
}
