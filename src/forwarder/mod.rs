//! Outbound mirror: republishes an instance's computed LED colors (and, for
//! image-stream clients, its final image) to downstream sinks. Client
//! protocol framing (JSON / flatbuffer-style) is out of scope (spec §4's
//! data-flow note); this is the fan-out and backpressure policy those
//! protocols would sit behind.

use tokio::sync::broadcast;

use crate::capture::Frame;
use crate::color::Rgb8;

/// Depth kept small: a forwarder mirrors the latest state to live viewers,
/// it is not a durable log. A slow client should lose frames, not backlog.
const FORWARD_DEPTH: usize = 4;

#[derive(Clone)]
pub enum ForwardedUpdate {
    Colors(Vec<Rgb8>),
    Image(Frame),
}

/// One producer, many best-effort consumers (spec §5 "Shared resources").
/// A client that can't keep up sees `RecvError::Lagged` and drops whole
/// frames rather than receiving partial ones.
pub struct Forwarder {
    sender: broadcast::Sender<ForwardedUpdate>,
}

impl Forwarder {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(FORWARD_DEPTH);
        Forwarder { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ForwardedUpdate> {
        self.sender.subscribe()
    }

    pub fn publish_colors(&self, colors: Vec<Rgb8>) {
        let _ = self.sender.send(ForwardedUpdate::Colors(colors));
    }

    pub fn publish_image(&self, frame: Frame) {
        let _ = self.sender.send(ForwardedUpdate::Image(frame));
    }

    pub fn client_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for Forwarder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn a_slow_subscriber_drops_whole_frames_not_partial_ones() {
        let forwarder = Forwarder::new();
        let mut rx = forwarder.subscribe();

        for i in 0..(FORWARD_DEPTH + 2) {
            forwarder.publish_colors(vec![Rgb8::new(i as u8, 0, 0)]);
        }

        let mut saw_lagged = false;
        loop {
            match rx.try_recv() {
                Ok(_) => continue,
                Err(broadcast::error::TryRecvError::Lagged(_)) => {
                    saw_lagged = true;
                    continue;
                }
                Err(_) => break,
            }
        }
        assert!(saw_lagged, "overflowing the channel must surface as Lagged, not a partial update");
    }

    #[test]
    fn client_count_tracks_active_subscribers() {
        let forwarder = Forwarder::new();
        assert_eq!(forwarder.client_count(), 0);
        let _rx = forwarder.subscribe();
        assert_eq!(forwarder.client_count(), 1);
    }
}
