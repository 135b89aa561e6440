//! Per-instance component enable/disable registry, grounded in
//! `ComponentController.h`'s `_componentStates`/`_prevComponentStates` pair:
//! toggling the `ALL` pseudo-component snapshots and restores the
//! individual states rather than collapsing them to a single flag.

use std::collections::HashMap;

use crate::muxer::ComponentKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Component {
    Smoothing,
    BlackBorder,
    Forwarder,
    VideoGrabber,
    SystemGrabber,
    Color,
    Effect,
    LedDevice,
}

impl From<ComponentKind> for Component {
    fn from(kind: ComponentKind) -> Self {
        match kind {
            ComponentKind::Color => Component::Color,
            ComponentKind::Image => Component::Color,
            ComponentKind::Effect => Component::Effect,
            ComponentKind::VideoGrabber => Component::VideoGrabber,
            ComponentKind::SystemGrabber => Component::SystemGrabber,
        }
    }
}

/// Tracks whether each named component is currently enabled, with a
/// save/restore pair so toggling everything off and back on (the `ALL`
/// pseudo-component) doesn't clobber individual states that were already
/// off beforehand.
pub struct ComponentController {
    states: HashMap<Component, bool>,
    saved_states: Option<HashMap<Component, bool>>,
}

const ALL_COMPONENTS: [Component; 8] = [
    Component::Smoothing,
    Component::BlackBorder,
    Component::Forwarder,
    Component::VideoGrabber,
    Component::SystemGrabber,
    Component::Color,
    Component::Effect,
    Component::LedDevice,
];

impl ComponentController {
    pub fn new(disable_on_startup: bool) -> Self {
        let states = ALL_COMPONENTS.iter().map(|&c| (c, !disable_on_startup)).collect();
        ComponentController { states, saved_states: None }
    }

    pub fn is_enabled(&self, component: Component) -> bool {
        self.states.get(&component).copied().unwrap_or(true)
    }

    pub fn set_state(&mut self, component: Component, enabled: bool) {
        self.states.insert(component, enabled);
    }

    pub fn states(&self) -> &HashMap<Component, bool> {
        &self.states
    }

    /// Toggle every component at once. Disabling snapshots the current
    /// per-component states; re-enabling restores exactly that snapshot
    /// rather than flipping everything to `true`.
    pub fn set_all(&mut self, enabled: bool) {
        if enabled {
            if let Some(saved) = self.saved_states.take() {
                self.states = saved;
                return;
            }
        } else if self.saved_states.is_none() {
            self.saved_states = Some(self.states.clone());
        }
        for value in self.states.values_mut() {
            *value = enabled;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_all_disable_then_enable_restores_prior_individual_states() {
        let mut controller = ComponentController::new(false);
        controller.set_state(Component::Effect, false);

        controller.set_all(false);
        assert!(!controller.is_enabled(Component::Color));
        assert!(!controller.is_enabled(Component::Effect));

        controller.set_all(true);
        assert!(controller.is_enabled(Component::Color));
        assert!(!controller.is_enabled(Component::Effect), "effect was off before the blanket disable and must stay off");
    }
}
