//! Translation from winit window events to editor input events.

use easel_input::{InputEvent, Key, Modifiers, MouseButton};
use glam::Vec2;
use winit::event::{ElementState, KeyEvent, MouseScrollDelta, WindowEvent};
use winit::keyboard::{Key as LogicalKey, ModifiersState, NamedKey};

/// Pixels per scroll line for touchpads that report pixel deltas.
const PIXELS_PER_LINE: f32 = 50.0;

pub fn modifiers_from(state: ModifiersState) -> Modifiers {
    Modifiers {
        ctrl: state.control_key(),
        shift: state.shift_key(),
        alt: state.alt_key(),
    }
}

pub fn key_from(key: &LogicalKey) -> Key {
    match key {
        LogicalKey::Character(text) => text.chars().next().map_or(Key::Other, Key::Character),
        LogicalKey::Named(NamedKey::Escape) => Key::Escape,
        LogicalKey::Named(NamedKey::Delete) => Key::Delete,
        LogicalKey::Named(NamedKey::F1) => Key::F1,
        LogicalKey::Named(NamedKey::Control) => Key::Control,
        LogicalKey::Named(NamedKey::Shift) => Key::Shift,
        LogicalKey::Named(NamedKey::Alt) => Key::Alt,
        _ => Key::Other,
    }
}

fn key_event(event: &KeyEvent, modifiers: Modifiers) -> InputEvent {
    let key = key_from(&event.logical_key);
    match event.state {
        ElementState::Pressed => InputEvent::KeyPressed { key, modifiers },
        ElementState::Released => InputEvent::KeyReleased { key },
    }
}

fn button_from(button: winit::event::MouseButton) -> Option<MouseButton> {
    match button {
        winit::event::MouseButton::Left => Some(MouseButton::Left),
        winit::event::MouseButton::Right => Some(MouseButton::Right),
        winit::event::MouseButton::Middle => Some(MouseButton::Middle),
        _ => None,
    }
}

pub fn scroll_lines(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y,
        MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_LINE,
    }
}

/// Map a window event to an editor event. Window resizes are handled by the
/// host, since the viewport panel and the window differ in size.
pub fn translate(event: &WindowEvent, modifiers: Modifiers) -> Option<InputEvent> {
    match event {
        WindowEvent::KeyboardInput { event, .. } => Some(key_event(event, modifiers)),
        WindowEvent::CursorMoved { position, .. } => Some(InputEvent::MouseMoved {
            position: Vec2::new(position.x as f32, position.y as f32),
        }),
        WindowEvent::MouseInput { state, button, .. } => {
            button_from(*button).map(|button| InputEvent::MouseButton {
                button,
                pressed: *state == ElementState::Pressed,
            })
        }
        WindowEvent::MouseWheel { delta, .. } => Some(InputEvent::Scrolled {
            delta: scroll_lines(*delta),
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;

    #[test]
    fn logical_keys_map_to_editor_keys() {
        assert_eq!(key_from(&LogicalKey::Character("S".into())), Key::Character('S'));
        assert_eq!(key_from(&LogicalKey::Named(NamedKey::Escape)), Key::Escape);
        assert_eq!(key_from(&LogicalKey::Named(NamedKey::F1)), Key::F1);
        assert_eq!(key_from(&LogicalKey::Named(NamedKey::Tab)), Key::Other);
    }

    #[test]
    fn modifiers_follow_winit_state() {
        let mods = modifiers_from(ModifiersState::CONTROL | ModifiersState::ALT);
        assert!(mods.ctrl && mods.alt && !mods.shift);
    }

    #[test]
    fn scroll_deltas_become_lines() {
        assert_eq!(scroll_lines(MouseScrollDelta::LineDelta(0.0, 2.0)), 2.0);
        assert_eq!(
            scroll_lines(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 100.0))),
            2.0
        );
    }
}
