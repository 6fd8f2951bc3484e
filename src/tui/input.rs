//! Global key routing for the tracker list.
//!
//! Keys are resolved with fixed precedence: interrupt, escape, then list
//! navigation gated by the focus lock. Navigation does not consume the key:
//! when it leaves focus where it was (e.g. down on the last row), the focused
//! widget still receives it.

#![allow(missing_docs)]

use super::focus::FocusLock;
use super::keys::{Arrow, KeyEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputContext {
    pub lock: FocusLock,
    /// The new-timer row is selected; it has no columns.
    pub on_new_row: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    Quit,
    /// Empty the focused text field.
    ClearField,
    /// Move the selected tracker by this many rows.
    MoveSelection(isize),
    /// Move the focused column left (`-1`) or right (`1`).
    MoveColumn(isize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputResolution {
    pub action: Option<InputAction>,
    /// Whether the focused widget must not see the key.
    pub consumed: bool,
}

impl InputResolution {
    const fn action(action: InputAction) -> Self {
        Self {
            action: Some(action),
            consumed: true,
        }
    }

    const fn navigate(action: InputAction) -> Self {
        Self {
            action: Some(action),
            consumed: false,
        }
    }

    const fn passthrough() -> Self {
        Self {
            action: None,
            consumed: false,
        }
    }
}

/// Resolve `key` against global bindings.
#[must_use]
pub fn resolve_key_event(key: &KeyEvent, context: InputContext) -> InputResolution {
    if key.is_interrupt() {
        return InputResolution::action(InputAction::Quit);
    }
    if key.escape {
        return InputResolution::action(InputAction::ClearField);
    }

    let Some(arrow) = key.arrow() else {
        return InputResolution::passthrough();
    };
    if context.lock.is_blocked(arrow, key) {
        return InputResolution::passthrough();
    }
    match arrow {
        Arrow::Up => InputResolution::navigate(InputAction::MoveSelection(-1)),
        Arrow::Down => InputResolution::navigate(InputAction::MoveSelection(1)),
        Arrow::Left | Arrow::Right if context.on_new_row => InputResolution::passthrough(),
        Arrow::Left => InputResolution::navigate(InputAction::MoveColumn(-1)),
        Arrow::Right => InputResolution::navigate(InputAction::MoveColumn(1)),
    }
}
