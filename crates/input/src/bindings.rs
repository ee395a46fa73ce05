use crate::action::Action;
use crate::event::{InputEvent, InputState, Key, Modifiers};

/// One shortcut: a key plus whether Ctrl must be held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Shortcut {
    key: Key,
    ctrl: bool,
    action: Action,
}

/// Shortcut table mapping key presses to editor actions.
#[derive(Debug, Clone)]
pub struct Bindings {
    shortcuts: Vec<Shortcut>,
}

impl Default for Bindings {
    fn default() -> Self {
        let shortcut = |key, ctrl, action| Shortcut { key, ctrl, action };
        Self {
            shortcuts: vec![
                shortcut(Key::Character('s'), true, Action::SaveScene),
                shortcut(Key::Character('o'), true, Action::LoadScene),
                shortcut(Key::Character('n'), false, Action::SpawnCube),
                shortcut(Key::Delete, false, Action::DeleteSelected),
                shortcut(Key::Escape, false, Action::Deselect),
                shortcut(Key::F1, false, Action::ToggleHierarchy),
            ],
        }
    }
}

impl Bindings {
    /// Resolve a key press into an action. Modifiers are taken from the event
    /// and from the held-key state, whichever reports them.
    pub fn action_for(&self, event: &InputEvent, state: &InputState) -> Option<Action> {
        let InputEvent::KeyPressed { key, modifiers } = *event else {
            return None;
        };
        let key = match key {
            Key::Character(c) => Key::Character(c.to_ascii_lowercase()),
            other => other,
        };
        let held = state.modifiers();
        let mods = Modifiers {
            ctrl: modifiers.ctrl || held.ctrl,
            shift: modifiers.shift || held.shift,
            alt: modifiers.alt || held.alt,
        };
        let action = self
            .shortcuts
            .iter()
            .find(|s| s.key == key && s.ctrl == mods.ctrl)
            .map(|s| s.action);
        if let Some(action) = action {
            tracing::debug!(?action, "shortcut");
        }
        action
    }
}
