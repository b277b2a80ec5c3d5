//! Key bindings and their footer rendering.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::style::{Style, Stylize};
use ratatui::text::Span;

const CTRL_PREFIX: &str = "ctrl + ";
const SHIFT_PREFIX: &str = "shift + ";
const ALT_PREFIX: &str = "alt + ";

/// A keyboard binding with key and modifiers.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct KeyBinding {
    key: KeyCode,
    modifiers: KeyModifiers,
}

impl KeyBinding {
    pub const fn new(key: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { key, modifiers }
    }

    /// Check if this binding matches the given key event (press or repeat).
    pub fn is_press(&self, event: KeyEvent) -> bool {
        let (code, modifiers) = normalize(event.code, event.modifiers);
        self.key == code
            && self.modifiers == modifiers
            && (event.kind == KeyEventKind::Press || event.kind == KeyEventKind::Repeat)
    }

    pub fn key(&self) -> KeyCode {
        self.key
    }

    pub fn modifiers(&self) -> KeyModifiers {
        self.modifiers
    }
}

/// Terminals disagree on how shifted characters arrive: `Ctrl+Shift+D` may
/// be `'D'` or `'d'` with SHIFT set, and `+` may or may not carry SHIFT.
/// Letters are lowered with SHIFT kept; other characters drop SHIFT.
fn normalize(code: KeyCode, modifiers: KeyModifiers) -> (KeyCode, KeyModifiers) {
    match code {
        KeyCode::Char(c) if c.is_ascii_alphabetic() => {
            let modifiers = if c.is_ascii_uppercase() {
                modifiers | KeyModifiers::SHIFT
            } else {
                modifiers
            };
            (KeyCode::Char(c.to_ascii_lowercase()), modifiers)
        }
        KeyCode::Char(c) => (KeyCode::Char(c), modifiers - KeyModifiers::SHIFT),
        other => (other, modifiers),
    }
}

pub const fn plain(key: KeyCode) -> KeyBinding {
    KeyBinding::new(key, KeyModifiers::NONE)
}

pub const fn shift(key: KeyCode) -> KeyBinding {
    KeyBinding::new(key, KeyModifiers::SHIFT)
}

pub const fn ctrl(key: KeyCode) -> KeyBinding {
    KeyBinding::new(key, KeyModifiers::CONTROL)
}

pub const fn ctrl_shift(key: KeyCode) -> KeyBinding {
    KeyBinding::new(key, KeyModifiers::CONTROL.union(KeyModifiers::SHIFT))
}

fn modifiers_to_string(modifiers: KeyModifiers) -> String {
    let mut result = String::new();
    if modifiers.contains(KeyModifiers::CONTROL) {
        result.push_str(CTRL_PREFIX);
    }
    if modifiers.contains(KeyModifiers::SHIFT) {
        result.push_str(SHIFT_PREFIX);
    }
    if modifiers.contains(KeyModifiers::ALT) {
        result.push_str(ALT_PREFIX);
    }
    result
}

impl From<KeyBinding> for Span<'static> {
    fn from(binding: KeyBinding) -> Self {
        (&binding).into()
    }
}

impl From<&KeyBinding> for Span<'static> {
    fn from(binding: &KeyBinding) -> Self {
        let KeyBinding { key, modifiers } = binding;
        let modifiers = modifiers_to_string(*modifiers);
        let key = match key {
            KeyCode::F(n) => format!("F{n}"),
            KeyCode::Enter => "enter".to_string(),
            KeyCode::Esc => "esc".to_string(),
            _ => format!("{key}").to_ascii_lowercase(),
        };
        Span::styled(format!("{modifiers}{key}"), key_hint_style())
    }
}

fn key_hint_style() -> Style {
    Style::default().bold()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new_with_kind(code, modifiers, KeyEventKind::Press)
    }

    #[test]
    fn function_keys_render_upper_case() {
        assert_eq!(Span::from(plain(KeyCode::F(10))).content.as_ref(), "F10");
        assert_eq!(
            Span::from(shift(KeyCode::F(11))).content.as_ref(),
            "shift + F11"
        );
        assert_eq!(Span::from(plain(KeyCode::Esc)).content.as_ref(), "esc");
    }

    #[test]
    fn ctrl_shift_letter_matches_either_case() {
        let binding = ctrl_shift(KeyCode::Char('d'));
        assert_eq!(
            Span::from(binding).content.as_ref(),
            "ctrl + shift + d"
        );
        assert!(binding.is_press(press(
            KeyCode::Char('D'),
            KeyModifiers::CONTROL | KeyModifiers::SHIFT
        )));
        assert!(binding.is_press(press(
            KeyCode::Char('D'),
            KeyModifiers::CONTROL
        )));
        assert!(!binding.is_press(press(KeyCode::Char('d'), KeyModifiers::CONTROL)));
    }

    #[test]
    fn shifted_symbols_match_plain_bindings() {
        let binding = plain(KeyCode::Char('+'));
        assert!(binding.is_press(press(KeyCode::Char('+'), KeyModifiers::SHIFT)));
        assert!(binding.is_press(press(KeyCode::Char('+'), KeyModifiers::NONE)));
    }

    #[test]
    fn releases_do_not_match() {
        let binding = plain(KeyCode::F(5));
        let release =
            KeyEvent::new_with_kind(KeyCode::F(5), KeyModifiers::NONE, KeyEventKind::Release);
        assert!(!binding.is_press(release));
        assert!(binding.is_press(press(KeyCode::F(5), KeyModifiers::NONE)));
    }
}
