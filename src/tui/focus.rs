//! Focus ownership and the arrow-key lock that gates list navigation.
//!
//! The tracker list moves its selection with the arrow keys, but text fields
//! and suggestion lists nested in a row need those keys too. Whoever owns
//! focus publishes a [`LockState`] claiming the arrows it consumes; the list
//! ignores claimed arrows.

#![allow(missing_docs)]

use super::keys::{Arrow, KeyEvent};

/// Arrow claims. `None` and `Some(false)` both leave an arrow free.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LockState {
    pub all: Option<bool>,
    pub x: Option<bool>,
    pub y: Option<bool>,
    pub left_arrow: Option<bool>,
    pub right_arrow: Option<bool>,
    pub up_arrow: Option<bool>,
    pub down_arrow: Option<bool>,
}

impl LockState {
    /// Claim every arrow, or release all of them.
    #[must_use]
    pub fn all(locked: bool) -> Self {
        Self {
            all: Some(locked),
            ..Self::default()
        }
    }

    /// Claim up and down only.
    #[must_use]
    pub fn vertical() -> Self {
        Self {
            y: Some(true),
            ..Self::default()
        }
    }

    fn claims(&self, arrow: Arrow) -> bool {
        let (axis, specific) = match arrow {
            Arrow::Left => (self.x, self.left_arrow),
            Arrow::Right => (self.x, self.right_arrow),
            Arrow::Up => (self.y, self.up_arrow),
            Arrow::Down => (self.y, self.down_arrow),
        };
        [self.all, axis, specific].contains(&Some(true))
    }
}

/// The single lock instance consulted before list navigation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FocusLock {
    state: LockState,
}

impl FocusLock {
    /// Replace the whole lock state. Fields absent from `partial` are unset.
    pub fn set_lock(&mut self, partial: LockState) {
        self.state = partial;
    }

    #[must_use]
    pub const fn state(&self) -> LockState {
        self.state
    }

    /// Whether `event` is a press of `arrow` that the lock claims.
    #[must_use]
    pub fn is_blocked(&self, arrow: Arrow, event: &KeyEvent) -> bool {
        event.arrow() == Some(arrow) && self.state.claims(arrow)
    }

    /// Whether `event` is any arrow press the lock claims.
    #[must_use]
    pub fn blocks_event(&self, event: &KeyEvent) -> bool {
        event
            .arrow()
            .is_some_and(|arrow| self.is_blocked(arrow, event))
    }
}

// ──────────────────── rows ────────────────────

/// Columns of a tracker row, left to right.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Row {
    SelectTime,
    #[default]
    SelectRow,
    Log,
    Delete,
    ChangeIssue,
}

/// Horizontal order used by left/right navigation.
pub const ROW_ORDER: [Row; 5] = [
    Row::SelectTime,
    Row::SelectRow,
    Row::Log,
    Row::Delete,
    Row::ChangeIssue,
];

impl Row {
    #[must_use]
    pub fn index(self) -> usize {
        ROW_ORDER.iter().position(|row| *row == self).unwrap_or(0)
    }

    /// Column to the left, staying put at the first one.
    #[must_use]
    pub fn prev(self) -> Self {
        ROW_ORDER[self.index().saturating_sub(1)]
    }

    /// Column to the right, staying put at the last one.
    #[must_use]
    pub fn next(self) -> Self {
        ROW_ORDER[(self.index() + 1).min(ROW_ORDER.len() - 1)]
    }
}

// ──────────────────── focus ────────────────────

/// Which widget currently owns keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusTarget {
    /// A column of an existing tracker.
    Session { index: usize, row: Row },
    /// The "create a new timer" row; `list` is set while its suggestions
    /// have focus.
    NewTimer { list: bool },
}

/// Facts about the focused widget that decide its lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusContext {
    pub target: FocusTarget,
    /// The focused tracker already has an issue.
    pub has_issue: bool,
    /// The focused text field holds non-blank text.
    pub has_text: bool,
}

/// Lock published on every focus transition.
///
/// Non-blank text claims every arrow. The issue column also claims the
/// vertical axis while it shows suggestions, which happens when typing or
/// when the tracker has no issue yet. A focused suggestion list under the
/// new-timer row claims everything.
#[must_use]
pub fn lock_for_focus(context: FocusContext) -> LockState {
    match context.target {
        FocusTarget::Session {
            row: Row::ChangeIssue,
            ..
        } => LockState {
            all: Some(context.has_text),
            y: Some(context.has_text || !context.has_issue),
            ..LockState::default()
        },
        FocusTarget::Session { .. } => LockState::all(context.has_text),
        FocusTarget::NewTimer { list } => LockState::all(context.has_text || list),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::keys::decode;

    const UP: &[u8] = b"\x1b[A";
    const DOWN: &[u8] = b"\x1b[B";
    const LEFT: &[u8] = b"\x1b[D";
    const RIGHT: &[u8] = b"\x1b[C";

    const OPTIONS: [Option<bool>; 3] = [None, Some(false), Some(true)];

    fn lock(state: LockState) -> FocusLock {
        let mut lock = FocusLock::default();
        lock.set_lock(state);
        lock
    }

    #[test]
    fn blocking_truth_table_for_every_arrow() {
        let arrows = [
            (Arrow::Left, LEFT),
            (Arrow::Right, RIGHT),
            (Arrow::Up, UP),
            (Arrow::Down, DOWN),
        ];
        for (arrow, bytes) in arrows {
            let event = decode(bytes);
            for all in OPTIONS {
                for axis in OPTIONS {
                    for specific in OPTIONS {
                        let mut state = LockState {
                            all,
                            ..LockState::default()
                        };
                        match arrow {
                            Arrow::Left => {
                                state.x = axis;
                                state.left_arrow = specific;
                            }
                            Arrow::Right => {
                                state.x = axis;
                                state.right_arrow = specific;
                            }
                            Arrow::Up => {
                                state.y = axis;
                                state.up_arrow = specific;
                            }
                            Arrow::Down => {
                                state.y = axis;
                                state.down_arrow = specific;
                            }
                        }
                        let expected = [all, axis, specific].contains(&Some(true));
                        assert_eq!(
                            lock(state).is_blocked(arrow, &event),
                            expected,
                            "{arrow:?} {state:?}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn axis_lock_only_covers_its_axis() {
        let vertical = lock(LockState::vertical());
        assert!(vertical.blocks_event(&decode(UP)));
        assert!(vertical.blocks_event(&decode(DOWN)));
        assert!(!vertical.blocks_event(&decode(LEFT)));
        assert!(!vertical.blocks_event(&decode(RIGHT)));
    }

    #[test]
    fn mismatched_arrow_is_not_blocked() {
        let locked = lock(LockState::all(true));
        assert!(!locked.is_blocked(Arrow::Up, &decode(DOWN)));
    }

    #[test]
    fn non_directional_events_are_never_blocked() {
        let locked = lock(LockState::all(true));
        let others: [&[u8]; 4] = [b"\r", b"\x1b", b"a", b"\x03"];
        for bytes in others {
            assert!(!locked.blocks_event(&decode(bytes)));
        }
    }

    #[test]
    fn set_lock_replaces_instead_of_merging() {
        let mut lock = FocusLock::default();
        lock.set_lock(LockState::all(true));
        lock.set_lock(LockState::vertical());
        assert_eq!(lock.state().all, None);
        assert!(!lock.blocks_event(&decode(LEFT)));

        lock.set_lock(LockState::default());
        assert!(!lock.blocks_event(&decode(UP)));
    }

    #[test]
    fn row_order_clamps_at_ends() {
        assert_eq!(Row::SelectTime.prev(), Row::SelectTime);
        assert_eq!(Row::SelectTime.next(), Row::SelectRow);
        assert_eq!(Row::SelectRow.prev(), Row::SelectTime);
        assert_eq!(Row::Delete.next(), Row::ChangeIssue);
        assert_eq!(Row::ChangeIssue.next(), Row::ChangeIssue);
        assert_eq!(Row::default(), Row::SelectRow);
    }

    #[test]
    fn row_order_visits_every_row_once() {
        let mut row = ROW_ORDER[0];
        let mut seen = vec![row];
        while row.next() != row {
            row = row.next();
            seen.push(row);
        }
        assert_eq!(seen, ROW_ORDER);
    }

    fn context(target: FocusTarget, has_issue: bool, has_text: bool) -> FocusContext {
        FocusContext {
            target,
            has_issue,
            has_text,
        }
    }

    #[test]
    fn issue_column_without_issue_claims_vertical() {
        let target = FocusTarget::Session {
            index: 0,
            row: Row::ChangeIssue,
        };
        let state = lock_for_focus(context(target, false, false));
        assert_eq!(state.y, Some(true));
        assert_eq!(state.all, Some(false));

        let state = lock_for_focus(context(target, true, false));
        assert_eq!(state.y, Some(false));
    }

    #[test]
    fn typing_claims_every_arrow() {
        for row in ROW_ORDER {
            let target = FocusTarget::Session { index: 1, row };
            assert_eq!(lock_for_focus(context(target, true, true)).all, Some(true));
        }
        let target = FocusTarget::NewTimer { list: false };
        assert_eq!(lock_for_focus(context(target, false, true)).all, Some(true));
    }

    #[test]
    fn other_columns_release_the_lock() {
        let target = FocusTarget::Session {
            index: 0,
            row: Row::Log,
        };
        let released = lock(lock_for_focus(context(target, false, false)));
        for bytes in [UP, DOWN, LEFT, RIGHT] {
            assert!(!released.blocks_event(&decode(bytes)));
        }
    }

    #[test]
    fn focused_suggestion_list_claims_everything() {
        let state = lock_for_focus(context(FocusTarget::NewTimer { list: true }, false, false));
        assert_eq!(state, LockState::all(true));
    }
}
