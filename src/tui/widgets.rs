//! Single-line text field used for time adjustments and issue search.

#![allow(missing_docs)]

use super::keys::KeyEvent;

/// Result of feeding one key to a [`TextField`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldEvent {
    /// The key is not for this field.
    Ignored,
    /// Only the cursor moved.
    Moved,
    /// The value changed; the owner should recompute its lock.
    Changed,
    /// Enter was pressed.
    Submit,
}

/// Editable value with a character-indexed cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextField {
    value: String,
    cursor: usize,
}

impl TextField {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Cursor position in characters, `0..=len`.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether the field holds anything besides whitespace.
    #[must_use]
    pub fn has_text(&self) -> bool {
        !self.value.trim().is_empty()
    }

    /// Empty the field. Returns whether anything was removed.
    pub fn clear(&mut self) -> bool {
        let had_value = !self.value.is_empty();
        self.value.clear();
        self.cursor = 0;
        had_value
    }

    pub fn handle(&mut self, key: &KeyEvent) -> FieldEvent {
        if key.up_arrow || key.down_arrow || key.is_interrupt() {
            return FieldEvent::Ignored;
        }
        if key.enter {
            return FieldEvent::Submit;
        }

        let len = self.char_len();
        if key.left_arrow {
            self.cursor = self.cursor.saturating_sub(1);
            return FieldEvent::Moved;
        }
        if key.right_arrow {
            self.cursor = (self.cursor + 1).min(len);
            return FieldEvent::Moved;
        }
        if key.is_backspace() {
            if self.cursor == 0 {
                return FieldEvent::Ignored;
            }
            let at = self.byte_offset(self.cursor - 1);
            self.value.remove(at);
            self.cursor -= 1;
            return FieldEvent::Changed;
        }
        let Some(text) = key.printable() else {
            return FieldEvent::Ignored;
        };
        let at = self.byte_offset(self.cursor);
        self.value.insert_str(at, text);
        self.cursor += text.chars().count();
        FieldEvent::Changed
    }

    /// Value split around the cursor for drawing: before, under, after.
    #[must_use]
    pub fn split_at_cursor(&self) -> (&str, Option<char>, &str) {
        let at = self.byte_offset(self.cursor);
        let (before, rest) = self.value.split_at(at);
        let mut chars = rest.chars();
        let under = chars.next();
        (before, under, chars.as_str())
    }

    fn char_len(&self) -> usize {
        self.value.chars().count()
    }

    fn byte_offset(&self, chars: usize) -> usize {
        self.value
            .char_indices()
            .nth(chars)
            .map_or(self.value.len(), |(index, _)| index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::keys::decode;

    fn typed(text: &str) -> TextField {
        let mut field = TextField::new();
        for ch in text.chars() {
            field.handle(&KeyEvent::text(&ch.to_string()));
        }
        field
    }

    #[test]
    fn typing_appends_at_cursor() {
        let field = typed("1h 5m");
        assert_eq!(field.value(), "1h 5m");
        assert_eq!(field.cursor(), 5);
    }

    #[test]
    fn arrows_move_cursor_within_bounds() {
        let mut field = typed("ab");
        assert_eq!(field.handle(&decode(b"\x1b[C")), FieldEvent::Moved);
        assert_eq!(field.cursor(), 2);
        field.handle(&decode(b"\x1b[D"));
        field.handle(&decode(b"\x1b[D"));
        field.handle(&decode(b"\x1b[D"));
        assert_eq!(field.cursor(), 0);
    }

    #[test]
    fn inserts_in_the_middle() {
        let mut field = typed("ac");
        field.handle(&decode(b"\x1b[D"));
        assert_eq!(field.handle(&KeyEvent::text("b")), FieldEvent::Changed);
        assert_eq!(field.value(), "abc");
        assert_eq!(field.cursor(), 2);
    }

    #[test]
    fn backspace_deletes_before_cursor() {
        let mut field = typed("abc");
        field.handle(&decode(b"\x1b[D"));
        assert_eq!(field.handle(&decode(b"\x7f")), FieldEvent::Changed);
        assert_eq!(field.value(), "ac");
        assert_eq!(field.cursor(), 1);
    }

    #[test]
    fn backspace_at_start_is_ignored() {
        let mut field = typed("a");
        field.handle(&decode(b"\x1b[D"));
        assert_eq!(field.handle(&decode(b"\x08")), FieldEvent::Ignored);
        assert_eq!(field.value(), "a");
    }

    #[test]
    fn multibyte_text_is_edited_by_character() {
        let mut field = typed("čaj");
        field.handle(&decode(b"\x1b[D"));
        field.handle(&decode(b"\x1b[D"));
        field.handle(&decode(b"\x7f"));
        assert_eq!(field.value(), "aj");
        assert_eq!(field.split_at_cursor(), ("", Some('a'), "j"));
    }

    #[test]
    fn vertical_arrows_and_interrupt_are_ignored() {
        let mut field = typed("x");
        for bytes in [&b"\x1b[A"[..], &b"\x1b[B"[..], &b"\x03"[..]] {
            assert_eq!(field.handle(&decode(bytes)), FieldEvent::Ignored);
        }
        assert_eq!(field.value(), "x");
    }

    #[test]
    fn enter_submits_without_editing() {
        let mut field = typed("15m");
        assert_eq!(field.handle(&decode(b"\r")), FieldEvent::Submit);
        assert_eq!(field.value(), "15m");
    }

    #[test]
    fn control_and_meta_keys_do_not_insert() {
        let mut field = TextField::new();
        assert_eq!(field.handle(&decode(b"\x01")), FieldEvent::Ignored);
        assert_eq!(field.handle(&decode(b"\x1bx")), FieldEvent::Ignored);
        assert_eq!(field.handle(&decode(b"\x1b")), FieldEvent::Ignored);
        assert_eq!(field.value(), "");
    }

    #[test]
    fn pasted_chunk_inserts_whole() {
        let mut field = TextField::new();
        field.handle(&KeyEvent::text("ABC-123"));
        assert_eq!(field.value(), "ABC-123");
        assert_eq!(field.cursor(), 7);
    }

    #[test]
    fn blank_text_does_not_count() {
        let mut field = typed("   ");
        assert!(!field.has_text());
        assert!(field.clear());
        assert!(!field.clear());
        assert_eq!(field.cursor(), 0);
    }

    #[test]
    fn split_at_end_has_no_char_under_cursor() {
        let field = typed("ab");
        assert_eq!(field.split_at_cursor(), ("ab", None, ""));
    }
}
