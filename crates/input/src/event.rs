use std::collections::BTreeSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Keys the editor reacts to. Anything else arrives as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Key {
    Character(char),
    Escape,
    Delete,
    F1,
    Control,
    Shift,
    Alt,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys held when an event was produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

/// Input event as seen by every editor subsystem.
///
/// Cursor positions are in window pixels with a top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    KeyPressed { key: Key, modifiers: Modifiers },
    KeyReleased { key: Key },
    MouseMoved { position: Vec2 },
    MouseButton { button: MouseButton, pressed: bool },
    /// Scroll amount in lines; positive is away from the user.
    Scrolled { delta: f32 },
    Resized { width: u32, height: u32 },
}

/// Held keys, buttons and the last cursor position.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    keys: BTreeSet<Key>,
    buttons: BTreeSet<MouseButton>,
    cursor: Option<Vec2>,
    cursor_delta: Vec2,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::KeyPressed { key, .. } => {
                self.keys.insert(key);
            }
            InputEvent::KeyReleased { key } => {
                self.keys.remove(&key);
            }
            InputEvent::MouseMoved { position } => {
                self.cursor_delta = self.cursor.map_or(Vec2::ZERO, |last| position - last);
                self.cursor = Some(position);
            }
            InputEvent::MouseButton { button, pressed } => {
                if pressed {
                    self.buttons.insert(button);
                } else {
                    self.buttons.remove(&button);
                }
            }
            InputEvent::Scrolled { .. } | InputEvent::Resized { .. } => {}
        }
    }

    pub fn is_key_down(&self, key: Key) -> bool {
        self.keys.contains(&key)
    }

    pub fn is_button_down(&self, button: MouseButton) -> bool {
        self.buttons.contains(&button)
    }

    pub fn cursor(&self) -> Option<Vec2> {
        self.cursor
    }

    /// Cursor movement carried by the last `MouseMoved` event.
    pub fn cursor_delta(&self) -> Vec2 {
        self.cursor_delta
    }

    pub fn modifiers(&self) -> Modifiers {
        Modifiers {
            ctrl: self.is_key_down(Key::Control),
            shift: self.is_key_down(Key::Shift),
            alt: self.is_key_down(Key::Alt),
        }
    }
}
