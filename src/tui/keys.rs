//! Raw terminal bytes to key events.
//!
//! The terminal runs in raw mode and every `read()` yields one chunk. A chunk
//! is normally one key press; [`split_chunk`] separates the rare reads where
//! several arrow or enter presses were coalesced.

#![allow(missing_docs)]

const ESC: u8 = 0x1b;
const CR: u8 = b'\r';
const LAST_CONTROL: u8 = 0x1a;

const ARROW_UP: &[u8] = b"\x1b[A";
const ARROW_DOWN: &[u8] = b"\x1b[B";
const ARROW_RIGHT: &[u8] = b"\x1b[C";
const ARROW_LEFT: &[u8] = b"\x1b[D";

/// Direction of an arrow key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arrow {
    Up,
    Down,
    Left,
    Right,
}

impl Arrow {
    /// Whether the arrow moves along the horizontal axis.
    #[must_use]
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }
}

/// One decoded key press.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyEvent {
    /// The chunk as received, lossily decoded.
    pub raw: String,
    /// Text the key produced after control and meta handling.
    pub character: String,
    pub up_arrow: bool,
    pub down_arrow: bool,
    pub left_arrow: bool,
    pub right_arrow: bool,
    pub enter: bool,
    pub escape: bool,
    pub ctrl: bool,
    pub shift: bool,
    pub meta: bool,
}

impl KeyEvent {
    /// A plain text key, as typed.
    #[must_use]
    pub fn text(text: &str) -> Self {
        decode(text.as_bytes())
    }

    #[must_use]
    pub const fn arrow(&self) -> Option<Arrow> {
        if self.up_arrow {
            Some(Arrow::Up)
        } else if self.down_arrow {
            Some(Arrow::Down)
        } else if self.left_arrow {
            Some(Arrow::Left)
        } else if self.right_arrow {
            Some(Arrow::Right)
        } else {
            None
        }
    }

    /// Backspace arrives as BS on some terminals and DEL on most.
    #[must_use]
    pub fn is_backspace(&self) -> bool {
        self.raw == "\x08" || self.raw == "\x7f"
    }

    /// Ctrl+C.
    #[must_use]
    pub fn is_interrupt(&self) -> bool {
        self.ctrl && self.character == "c"
    }

    /// Enter or a literal space.
    #[must_use]
    pub fn is_activate(&self) -> bool {
        self.enter || self.raw == " "
    }

    /// Text to insert into a field, if this key produces any.
    #[must_use]
    pub fn printable(&self) -> Option<&str> {
        let usable = !self.ctrl
            && !self.meta
            && !self.character.is_empty()
            && !self.character.chars().any(char::is_control);
        usable.then_some(self.character.as_str())
    }
}

/// Decode one chunk. Never fails; invalid UTF-8 is replaced.
#[must_use]
pub fn decode(chunk: &[u8]) -> KeyEvent {
    let raw = String::from_utf8_lossy(chunk).into_owned();
    let mut event = KeyEvent {
        raw,
        ..KeyEvent::default()
    };

    match chunk {
        ARROW_UP => event.up_arrow = true,
        ARROW_DOWN => event.down_arrow = true,
        ARROW_LEFT => event.left_arrow = true,
        ARROW_RIGHT => event.right_arrow = true,
        [CR] => event.enter = true,
        [ESC] => event.escape = true,
        _ => {}
    }
    if event.arrow().is_some() || event.enter || event.escape {
        return event;
    }

    let mut value = event.raw.clone();
    if let Some(&first) = chunk.first() {
        if first <= LAST_CONTROL {
            value = char::from(first + b'a' - 1).to_string();
            event.ctrl = true;
        }
    }

    if let Some(stripped) = value.strip_prefix('\x1b') {
        value = stripped.to_string();
        event.meta = true;
    }

    let mut chars = value.chars();
    if let (Some(only), None) = (chars.next(), chars.next()) {
        event.shift = only.is_ascii_uppercase() || ('А'..='Я').contains(&only);
    }

    event.character = value;
    event
}

/// Split a read holding several coalesced arrow or enter presses.
///
/// Only chunks made up entirely of two or more recognized sequences are
/// split; anything else, including pasted text, is returned whole.
#[must_use]
pub fn split_chunk(chunk: &[u8]) -> Vec<&[u8]> {
    let mut parts = Vec::new();
    let mut rest = chunk;
    while !rest.is_empty() {
        let len = match rest {
            [CR, ..] => 1,
            [ESC, b'[', b'A' | b'B' | b'C' | b'D', ..] => 3,
            _ => return vec![chunk],
        };
        let (head, tail) = rest.split_at(len);
        parts.push(head);
        rest = tail;
    }
    if parts.len() < 2 {
        return vec![chunk];
    }
    parts
}
