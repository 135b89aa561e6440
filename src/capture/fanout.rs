//! Shared capture fan-out: one producer, many instance consumers.
//!
//! Backed by a [`tokio::sync::broadcast`] channel with a small fixed
//! capacity. A slow consumer that falls behind the capacity receives
//! `RecvError::Lagged` on its next read rather than blocking the producer or
//! the other consumers — the bounded-queue, drop-oldest-on-overflow policy
//! spec §5 asks for, implemented with the channel the ecosystem already uses
//! for this shape of problem (see `alixinne-hyperion.rs`'s muxer, which
//! handles `Lagged` the same way).

use tokio::sync::broadcast;

use super::source::CaptureEvent;

/// Frame queue depth per spec §5: two frames in flight before a lagging
/// consumer starts dropping the oldest.
pub const FANOUT_DEPTH: usize = 2;

/// Owns the broadcast sender for one capture producer and hands out
/// receivers to instances that subscribe to it.
pub struct Fanout {
    sender: broadcast::Sender<CaptureEvent>,
}

impl Fanout {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(FANOUT_DEPTH);
        Fanout { sender }
    }

    pub fn sender(&self) -> broadcast::Sender<CaptureEvent> {
        self.sender.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CaptureEvent> {
        self.sender.subscribe()
    }
}

impl Default for Fanout {
    fn default() -> Self {
        Self::new()
    }
}
