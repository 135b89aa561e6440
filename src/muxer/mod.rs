//! Priority-based input arbiter: picks the single visible source among
//! registered priorities, expires timed-out inputs, and reports visibility
//! changes to the owning instance (spec §4.1; grounded in the steady-tick
//! `PriorityMuxer::run` shape of `alixinne-hyperion.rs::Instance`).

use std::collections::BTreeMap;
use std::time::Instant;

use log::warn;

use crate::capture::Frame;
use crate::color::Rgb8;
use crate::error::MuxerError;

/// Mirrors `hyperhdr::Components`: which kind of producer owns an input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComponentKind {
    Color,
    Image,
    Effect,
    VideoGrabber,
    SystemGrabber,
}

/// Priority reserved for the always-registered black sentinel; never
/// removable, never expires (spec §4.1).
pub const SENTINEL_PRIORITY: u8 = 255;

#[derive(Clone)]
enum Payload {
    Color(Rgb8),
    Image(Frame),
}

struct Input {
    component: ComponentKind,
    origin: String,
    owner: String,
    static_color: Rgb8,
    smoothing_cfg: u32,
    active: bool,
    deadline: Option<Instant>,
    payload: Payload,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MuxerEvent {
    VisiblePriorityChanged(u8),
    VisibleComponentChanged(ComponentKind),
}

pub struct Muxer {
    inputs: BTreeMap<u8, Input>,
    current_priority: u8,
    current_component: ComponentKind,
    auto_select: bool,
}

impl Muxer {
    pub fn new() -> Self {
        let mut inputs = BTreeMap::new();
        inputs.insert(
            SENTINEL_PRIORITY,
            Input {
                component: ComponentKind::Color,
                origin: "sentinel".into(),
                owner: "muxer".into(),
                static_color: Rgb8::BLACK,
                smoothing_cfg: 0,
                active: true,
                deadline: None,
                payload: Payload::Color(Rgb8::BLACK),
            },
        );
        Muxer { inputs, current_priority: SENTINEL_PRIORITY, current_component: ComponentKind::Color, auto_select: true }
    }

    /// Idempotent on `priority`; a re-registration overwrites origin/owner
    /// without disturbing visibility unless it's the current highest active
    /// priority (spec §4.1).
    pub fn register_input(&mut self, priority: u8, component: ComponentKind, origin: &str, static_color: Rgb8, smoothing_cfg: u32, owner: &str) {
        if let Some(input) = self.inputs.get_mut(&priority) {
            input.component = component;
            input.origin = origin.to_string();
            input.owner = owner.to_string();
            input.static_color = static_color;
            input.smoothing_cfg = smoothing_cfg;
            return;
        }
        self.inputs.insert(
            priority,
            Input {
                component,
                origin: origin.to_string(),
                owner: owner.to_string(),
                static_color,
                smoothing_cfg,
                active: false,
                deadline: None,
                payload: Payload::Color(static_color),
            },
        );
    }

    fn deadline_for(now: Instant, timeout_ms: i64) -> Option<Instant> {
        if timeout_ms <= 0 {
            None
        } else {
            Some(now + std::time::Duration::from_millis(timeout_ms as u64))
        }
    }

    pub fn set_input(&mut self, priority: u8, colors: Rgb8, timeout_ms: i64, now: Instant) -> Result<(), MuxerError> {
        if priority == SENTINEL_PRIORITY {
            return Err(MuxerError::ReservedPriority(priority));
        }
        let Some(input) = self.inputs.get_mut(&priority) else {
            warn!("setInput on unregistered priority {priority}");
            return Err(MuxerError::NotRegistered(priority));
        };
        input.payload = Payload::Color(colors);
        input.active = true;
        input.deadline = Self::deadline_for(now, timeout_ms);
        Ok(())
    }

    pub fn set_input_image(&mut self, priority: u8, image: Frame, timeout_ms: i64, now: Instant) -> Result<(), MuxerError> {
        if priority == SENTINEL_PRIORITY {
            return Err(MuxerError::ReservedPriority(priority));
        }
        let Some(input) = self.inputs.get_mut(&priority) else {
            warn!("setInputImage on unregistered priority {priority}");
            return Err(MuxerError::NotRegistered(priority));
        };
        input.payload = Payload::Image(image);
        input.active = true;
        input.deadline = Self::deadline_for(now, timeout_ms);
        Ok(())
    }

    pub fn set_input_inactive(&mut self, priority: u8) {
        if let Some(input) = self.inputs.get_mut(&priority) {
            input.active = false;
        }
    }

    pub fn clear_input(&mut self, priority: u8) {
        if priority != SENTINEL_PRIORITY {
            self.inputs.remove(&priority);
        }
    }

    pub fn set_source_auto_select_enabled(&mut self, enabled: bool) {
        self.auto_select = enabled;
    }

    pub fn current_priority(&self) -> u8 {
        self.current_priority
    }

    pub fn current_color(&self) -> Rgb8 {
        match self.inputs.get(&self.current_priority) {
            Some(Input { payload: Payload::Color(c), .. }) => *c,
            _ => Rgb8::BLACK,
        }
    }

    pub fn current_image(&self) -> Option<&Frame> {
        match self.inputs.get(&self.current_priority) {
            Some(Input { payload: Payload::Image(f), .. }) => Some(f),
            _ => None,
        }
    }

    /// Run the scheduling rule: expire stale inputs, recompute visibility,
    /// and report a [`MuxerEvent`] if anything changed. Called on the
    /// ~100ms steady timer and after every `set_input*` (spec §4.1).
    pub fn tick(&mut self, now: Instant) -> Option<MuxerEvent> {
        for input in self.inputs.values_mut() {
            if let Some(deadline) = input.deadline {
                if deadline < now {
                    input.active = false;
                }
            }
        }

        let visible_priority = if !self.auto_select {
            self.current_priority
        } else {
            self.inputs
                .iter()
                .find(|(&p, input)| input.active && p != SENTINEL_PRIORITY)
                .map(|(&p, _)| p)
                .unwrap_or(SENTINEL_PRIORITY)
        };

        if visible_priority != self.current_priority {
            self.current_priority = visible_priority;
            let component = self.inputs.get(&visible_priority).map(|i| i.component).unwrap_or(ComponentKind::Color);
            let component_changed = component != self.current_component;
            self.current_component = component;

            if component_changed {
                return Some(MuxerEvent::VisibleComponentChanged(component));
            }
            return Some(MuxerEvent::VisiblePriorityChanged(visible_priority));
        }

        None
    }
}

impl Default for Muxer {
    fn default() -> Self {
        Self::new()
    }
}
