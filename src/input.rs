//! Key and mouse bindings: arrows and vim-style hjkl, mouse hover/click.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Left,
    Right,
    Up,
    Down,
    Pop,
    Restart,
    Pause,
    Quit,
    None,
}

/// Map key event to game action. Supports both normal (arrows, Enter) and vim (hjkl) keys.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod && modifiers != KeyModifiers::CONTROL {
        return Action::None;
    }
    match code {
        KeyCode::Char('c') if modifiers == KeyModifiers::CONTROL => Action::Quit,
        KeyCode::Char('q') | KeyCode::Esc if no_mod => Action::Quit,
        KeyCode::Char('p') if no_mod => Action::Pause,
        KeyCode::Char('r') | KeyCode::Char('R') if no_mod => Action::Restart,
        KeyCode::Left | KeyCode::Char('h') if no_mod => Action::Left,
        KeyCode::Right | KeyCode::Char('l') if no_mod => Action::Right,
        KeyCode::Up | KeyCode::Char('k') if no_mod => Action::Up,
        KeyCode::Down | KeyCode::Char('j') if no_mod => Action::Down,
        KeyCode::Enter | KeyCode::Char(' ') if no_mod => Action::Pop,
        _ => Action::None,
    }
}

/// What the pointer asks for at a terminal position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerAction {
    /// Select the group under the pointer.
    Hover { x: u16, y: u16 },
    /// Select and pop the group under the pointer.
    Click { x: u16, y: u16 },
    None,
}

pub fn mouse_to_action(mouse: MouseEvent) -> PointerAction {
    let (x, y) = (mouse.column, mouse.row);
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => PointerAction::Click { x, y },
        MouseEventKind::Moved | MouseEventKind::Drag(MouseButton::Left) => {
            PointerAction::Hover { x, y }
        }
        _ => PointerAction::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn test_arrows_and_vim_keys_match() {
        let none = KeyModifiers::NONE;
        assert_eq!(key_to_action(key(KeyCode::Left, none)), Action::Left);
        assert_eq!(key_to_action(key(KeyCode::Char('h'), none)), Action::Left);
        assert_eq!(key_to_action(key(KeyCode::Down, none)), Action::Down);
        assert_eq!(key_to_action(key(KeyCode::Char('j'), none)), Action::Down);
        assert_eq!(key_to_action(key(KeyCode::Enter, none)), Action::Pop);
        assert_eq!(key_to_action(key(KeyCode::Char(' '), none)), Action::Pop);
    }

    #[test]
    fn test_modifiers_filter_keys() {
        assert_eq!(
            key_to_action(key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Quit
        );
        assert_eq!(
            key_to_action(key(KeyCode::Char('h'), KeyModifiers::ALT)),
            Action::None
        );
        assert_eq!(
            key_to_action(key(KeyCode::Char('R'), KeyModifiers::SHIFT)),
            Action::Restart
        );
    }

    #[test]
    fn test_mouse_left_click_pops_and_move_hovers() {
        assert_eq!(
            mouse_to_action(mouse(MouseEventKind::Down(MouseButton::Left), 4, 7)),
            PointerAction::Click { x: 4, y: 7 }
        );
        assert_eq!(
            mouse_to_action(mouse(MouseEventKind::Moved, 1, 2)),
            PointerAction::Hover { x: 1, y: 2 }
        );
        assert_eq!(
            mouse_to_action(mouse(MouseEventKind::Down(MouseButton::Right), 1, 2)),
            PointerAction::None
        );
    }
}
