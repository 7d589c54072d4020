// SPDX-License-Identifier: MIT
//
// Terminal input decoder.
//
// Turns raw stdin bytes into structured events: keys, mouse actions,
// paste content, and focus changes. Handles every protocol the session
// can enable in `terminal.rs`:
//
// - Legacy CSI sequences (arrows, function keys, editing keys) with
//   xterm modifier parameters
// - SS3 sequences (`ESC O P` style F1-F4 and application-mode arrows)
// - rxvt/linux console F1-F5 (`ESC [ [ A` .. `ESC [ [ E`)
// - SGR mouse protocol (press / release / drag / move / scroll)
// - Kitty keyboard protocol (CSI-u codepoints + modifiers)
// - Bracketed paste (accumulates pasted bytes between delimiters)
// - Focus reporting (terminal gained / lost focus)
// - Alt+key (ESC followed by a key)
// - UTF-8 multi-byte characters
//
// # Design
//
// The decoder keeps a small byte buffer because sequences can span
// several `read()` calls. Feed bytes with [`InputDecoder::parse`]; bytes
// that form the start of a sequence stay buffered until the rest arrives.
//
// A lone ESC at the very end of the bytes seen so far is reported as the
// Escape key right away. The platform reads with a short timeout, so an
// escape sequence arrives in one read in practice. `ESC [` and `ESC O`
// are the exceptions: they only ever start a sequence and are held until
// more bytes arrive or [`InputDecoder::flush`] is called.
//
// Anything unrecognised is dropped and decoding resumes at the next byte.
// Number parsing works directly on `&[u8]`.

use bitflags::bitflags;
use tracing::trace;

use crate::config::DecoderConfig;

// ─── Event Types ────────────────────────────────────────────────────────────

/// A terminal input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A key press.
    Key(KeyEvent),
    /// A mouse button, wheel, or motion report.
    Mouse(MouseEvent),
    /// The terminal changed size. Produced by the session, not the decoder.
    Resize { cols: u16, rows: u16 },
    /// Terminal window gained focus (`CSI I`).
    FocusIn,
    /// Terminal window lost focus (`CSI O`).
    FocusOut,
    /// Bracketed paste content.
    ///
    /// The raw bytes between `CSI 200~` and `CSI 201~`, delivered as one
    /// event so pasted text can be told apart from typing. Not guaranteed
    /// to be valid UTF-8.
    Paste(Vec<u8>),
    /// Idle timeout elapsed with no input. Produced by the app loop.
    Tick,
}

/// A key with its modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    #[must_use]
    pub const fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    /// Shorthand for an unmodified character key.
    #[must_use]
    pub const fn char(c: char) -> Self {
        Self::new(Key::Char(c), Modifiers::empty())
    }

    /// Shorthand for an unmodified named key.
    #[must_use]
    pub const fn named(key: NamedKey) -> Self {
        Self::new(Key::Named(key), Modifiers::empty())
    }

    /// Is this `c` pressed together with Ctrl?
    #[must_use]
    pub fn is_ctrl(&self, c: char) -> bool {
        self.key == Key::Char(c) && self.modifiers.contains(Modifiers::CTRL)
    }
}

/// Identity of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A printable character.
    Char(char),
    Named(NamedKey),
}

/// Keys without a printable character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedKey {
    Enter,
    Tab,
    Backspace,
    Escape,
    Space,
    // ── Navigation ──────────────────────────────────────────────
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Delete,
    /// F1 through F12.
    F(u8),
}

bitflags! {
    /// Keyboard modifier flags.
    ///
    /// Same bit layout as the xterm CSI modifier parameter, where
    /// `param = 1 + bitmask`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b001;
        const ALT   = 0b010;
        const CTRL  = 0b100;
    }
}

/// A mouse report at a 0-based cell position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    /// 0-based column.
    pub x: u16,
    /// 0-based row.
    pub y: u16,
    pub button: MouseButton,
    pub action: MouseAction,
    pub modifiers: Modifiers,
}

/// Mouse button identity. Wheel and plain motion carry `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    None,
}

/// What the mouse did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseAction {
    Press,
    Release,
    /// Moved with a button held.
    Drag,
    /// Moved with no button held.
    Move,
    ScrollUp,
    ScrollDown,
}

// ─── Decoder ────────────────────────────────────────────────────────────────

/// Bracketed paste closing delimiter: `ESC [ 201 ~`
const PASTE_END: &[u8] = b"\x1b[201~";

/// Terminal input decoder.
///
/// Feed raw bytes via [`parse`](InputDecoder::parse) and collect the
/// resulting [`Event`]s. Incomplete sequences are buffered internally and
/// completed by later calls.
///
/// ```
/// use tessel_term::input::{Event, InputDecoder, KeyEvent, NamedKey};
///
/// let mut decoder = InputDecoder::new();
/// assert_eq!(decoder.parse(b"\x1b["), vec![]);
/// assert_eq!(decoder.parse(b"A"), vec![Event::Key(KeyEvent::named(NamedKey::Up))]);
/// ```
#[derive(Debug)]
pub struct InputDecoder {
    /// Raw bytes not yet decoded.
    buf: Vec<u8>,
    /// `Some` while inside a bracketed paste.
    paste: Option<Vec<u8>>,
    /// The current paste already hit `max_paste_len`.
    paste_truncated: bool,
    /// Dropping the tail of an overlong CSI sequence.
    discarding: bool,
    config: DecoderConfig,
}

impl InputDecoder {
    /// Create a decoder with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DecoderConfig::default())
    }

    #[must_use]
    pub fn with_config(config: DecoderConfig) -> Self {
        Self {
            buf: Vec::with_capacity(64),
            paste: None,
            paste_truncated: false,
            discarding: false,
            config,
        }
    }

    /// Feed raw bytes and return every event they complete.
    ///
    /// Bytes that start a sequence without finishing it are kept and
    /// combined with the next call. A single call can return any number
    /// of events, including none.
    pub fn parse(&mut self, data: &[u8]) -> Vec<Event> {
        self.buf.extend_from_slice(data);
        let mut events = Vec::new();
        let mut pos = 0;

        while pos < self.buf.len() {
            if self.paste.is_some() {
                let consumed = self.feed_paste(pos, &mut events);
                if consumed == 0 {
                    break;
                }
                pos += consumed;
                continue;
            }

            if self.discarding {
                pos += self.skip_overlong(pos);
                continue;
            }

            match try_parse(&self.buf[pos..], self.config.max_sequence_len) {
                Parsed::Event(event, consumed) => {
                    events.push(event);
                    pos += consumed;
                }
                Parsed::PasteStart(consumed) => {
                    self.paste = Some(Vec::new());
                    self.paste_truncated = false;
                    pos += consumed;
                }
                Parsed::Incomplete => break,
                Parsed::Skip(n) => {
                    trace!(bytes = ?&self.buf[pos..pos + n], "discarded unrecognised input");
                    pos += n;
                }
                Parsed::Overlong(n) => {
                    trace!(
                        limit = self.config.max_sequence_len,
                        "discarding overlong control sequence"
                    );
                    self.discarding = true;
                    pos += n;
                }
            }
        }

        if pos > 0 {
            self.buf.drain(..pos);
        }

        events
    }

    /// Are there buffered bytes that [`flush`](Self::flush) would turn
    /// into keys? An unfinished paste does not count.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.paste.is_none() && !self.buf.is_empty()
    }

    /// Give up waiting and report buffered bytes as literal keys.
    ///
    /// Called after an idle timeout. `ESC` followed by a printable byte
    /// becomes Alt+that key, other bytes map one-to-one, and an unfinished
    /// UTF-8 sequence is dropped. A paste in progress is left alone.
    pub fn flush(&mut self) -> Vec<Event> {
        if self.paste.is_some() {
            return Vec::new();
        }
        let mut events = Vec::new();
        let mut pos = 0;
        while pos < self.buf.len() {
            let rest = &self.buf[pos..];
            match rest {
                [0x1B, b @ 0x20..=0x7E, ..] => {
                    events.push(with_alt(ascii_key(*b)));
                    pos += 2;
                }
                [b @ 0x00..=0x7F, ..] => {
                    events.push(Event::Key(ascii_key(*b)));
                    pos += 1;
                }
                _ => pos += 1,
            }
        }
        self.buf.clear();
        events
    }

    /// Decoder limits in effect.
    #[must_use]
    pub const fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Move paste content starting at `buf[pos]` into the accumulator.
    /// Returns bytes consumed; 0 means the rest may be a split delimiter.
    fn feed_paste(&mut self, pos: usize, events: &mut Vec<Event>) -> usize {
        let rest = &self.buf[pos..];
        let (content, consumed, done) = match find_subsequence(rest, PASTE_END) {
            Some(i) => (i, i + PASTE_END.len(), true),
            None => {
                let keep = partial_suffix_len(rest, PASTE_END);
                (rest.len() - keep, rest.len() - keep, false)
            }
        };

        let Some(paste) = self.paste.as_mut() else {
            return 0;
        };
        let room = self.config.max_paste_len.saturating_sub(paste.len());
        let take = content.min(room);
        paste.extend_from_slice(&rest[..take]);
        if take < content && !self.paste_truncated {
            self.paste_truncated = true;
            trace!(limit = self.config.max_paste_len, "paste truncated");
        }

        if done {
            let bytes = self.paste.take().unwrap_or_default();
            events.push(Event::Paste(bytes));
            self.paste_truncated = false;
        }
        consumed
    }

    /// Drop parameter bytes of an overlong sequence up to and including
    /// its final byte.
    fn skip_overlong(&mut self, pos: usize) -> usize {
        let rest = &self.buf[pos..];
        for (i, &b) in rest.iter().enumerate() {
            match b {
                0x20..=0x3F => {}
                0x40..=0x7E => {
                    self.discarding = false;
                    return i + 1;
                }
                _ => {
                    self.discarding = false;
                    return i;
                }
            }
        }
        rest.len()
    }
}

impl Default for InputDecoder {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Stateless Parsing Functions ────────────────────────────────────────────
//
// Every parse function reads from the start of its slice and reports what
// it found plus how many bytes that took. `limit` is the longest control
// sequence accepted.

enum Parsed {
    /// An event, consuming `usize` bytes.
    Event(Event, usize),
    /// `CSI 200~`, consuming `usize` bytes.
    PasteStart(usize),
    /// Need more bytes.
    Incomplete,
    /// Unrecognised, skip `usize` bytes (always at least 1).
    Skip(usize),
    /// Control sequence longer than the limit; `usize` bytes seen so far.
    Overlong(usize),
}

fn try_parse(buf: &[u8], limit: usize) -> Parsed {
    match buf[0] {
        0x1B => parse_escape(buf, limit),
        b @ 0x00..=0x7F => Parsed::Event(Event::Key(ascii_key(b)), 1),
        0xC0..=0xFF => match parse_utf8(buf) {
            Utf8::Char(c, n) => Parsed::Event(Event::Key(KeyEvent::char(c)), n),
            Utf8::Incomplete => Parsed::Incomplete,
            Utf8::Invalid(n) => Parsed::Skip(n),
        },
        // Stray continuation byte.
        _ => Parsed::Skip(1),
    }
}

/// Key for a single byte below 0x80.
const fn ascii_key(b: u8) -> KeyEvent {
    match b {
        0x00 => KeyEvent::new(Key::Named(NamedKey::Space), Modifiers::CTRL),
        0x09 => KeyEvent::named(NamedKey::Tab),
        0x0A | 0x0D => KeyEvent::named(NamedKey::Enter),
        0x08 | 0x7F => KeyEvent::named(NamedKey::Backspace),
        0x1B => KeyEvent::named(NamedKey::Escape),
        0x01..=0x1A => KeyEvent::new(Key::Char((b - 1 + b'a') as char), Modifiers::CTRL),
        0x1C => KeyEvent::new(Key::Char('\\'), Modifiers::CTRL),
        0x1D => KeyEvent::new(Key::Char(']'), Modifiers::CTRL),
        0x1E => KeyEvent::new(Key::Char('^'), Modifiers::CTRL),
        0x1F => KeyEvent::new(Key::Char('_'), Modifiers::CTRL),
        0x20 => KeyEvent::named(NamedKey::Space),
        _ => KeyEvent::char(b as char),
    }
}

fn with_alt(mut key: KeyEvent) -> Event {
    key.modifiers |= Modifiers::ALT;
    Event::Key(key)
}

// ── Escape sequences ────────────────────────────────────────────────────────

fn parse_escape(buf: &[u8], limit: usize) -> Parsed {
    debug_assert_eq!(buf[0], 0x1B);

    // Nothing follows in the bytes seen so far: a real Escape press.
    if buf.len() < 2 {
        return Parsed::Event(Event::Key(KeyEvent::named(NamedKey::Escape)), 1);
    }

    match buf[1] {
        b'[' => parse_csi(buf, limit),
        b'O' => parse_ss3(buf),
        // ESC ESC [ ... is Escape followed by a sequence, not Alt+ESC.
        0x1B if matches!(buf.get(2), Some(b'[' | b'O')) => {
            Parsed::Event(Event::Key(KeyEvent::named(NamedKey::Escape)), 1)
        }
        b @ 0x00..=0x7F => Parsed::Event(with_alt(ascii_key(b)), 2),
        0xC0..=0xFF => match parse_utf8(&buf[1..]) {
            Utf8::Char(c, n) => Parsed::Event(with_alt(KeyEvent::char(c)), n + 1),
            Utf8::Incomplete => Parsed::Incomplete,
            Utf8::Invalid(_) => Parsed::Event(Event::Key(KeyEvent::named(NamedKey::Escape)), 1),
        },
        _ => Parsed::Event(Event::Key(KeyEvent::named(NamedKey::Escape)), 1),
    }
}

// ── CSI (Control Sequence Introducer) ───────────────────────────────────────

fn parse_csi(buf: &[u8], limit: usize) -> Parsed {
    debug_assert!(buf.len() >= 2 && buf[0] == 0x1B && buf[1] == b'[');

    if buf.len() < 3 {
        return Parsed::Incomplete;
    }

    // rxvt / linux console function keys: ESC [ [ A .. ESC [ [ E
    if buf[2] == b'[' {
        return match buf.get(3) {
            None => Parsed::Incomplete,
            Some(&b @ b'A'..=b'E') => {
                Parsed::Event(Event::Key(KeyEvent::named(NamedKey::F(b - b'A' + 1))), 4)
            }
            Some(0x40..=0x7E) => Parsed::Skip(4),
            Some(_) => Parsed::Skip(3),
        };
    }

    // Scan for the final byte (0x40..=0x7E). Parameter bytes are
    // 0x30..=0x3F, intermediates 0x20..=0x2F.
    let mut end = 2;
    loop {
        if end >= limit {
            return Parsed::Overlong(end);
        }
        let Some(&b) = buf.get(end) else {
            return Parsed::Incomplete;
        };
        if (0x40..=0x7E).contains(&b) {
            break;
        }
        if !(0x20..=0x3F).contains(&b) {
            // Not part of a CSI; resume at the offending byte.
            return Parsed::Skip(end);
        }
        end += 1;
    }

    let final_byte = buf[end];
    let params_raw = &buf[2..end];
    let consumed = end + 1;

    if params_raw.first() == Some(&b'<') {
        return match final_byte {
            b'M' | b'm' => parse_sgr_mouse(&params_raw[1..], final_byte == b'm', consumed),
            _ => Parsed::Skip(consumed),
        };
    }

    // Private markers and intermediates belong to replies we never ask for.
    if !params_raw.iter().all(|&b| b.is_ascii_digit() || b == b';' || b == b':') {
        return Parsed::Skip(consumed);
    }

    let params = parse_csi_params(params_raw);

    match final_byte {
        b'~' => parse_tilde(&params, consumed),
        b'u' => parse_kitty_key(&params, consumed),
        b'I' if params.is_empty() => Parsed::Event(Event::FocusIn, consumed),
        b'O' if params.is_empty() => Parsed::Event(Event::FocusOut, consumed),
        b'Z' => Parsed::Event(
            Event::Key(KeyEvent::new(Key::Named(NamedKey::Tab), Modifiers::SHIFT)),
            consumed,
        ),
        _ => {
            let modifiers = params.get(1).map_or(Modifiers::empty(), |p| decode_modifiers(p.0));
            letter_key(final_byte).map_or(Parsed::Skip(consumed), |key| {
                Parsed::Event(Event::Key(KeyEvent::new(Key::Named(key), modifiers)), consumed)
            })
        }
    }
}

/// Keys shared by `CSI <letter>` and `SS3 <letter>`.
const fn letter_key(final_byte: u8) -> Option<NamedKey> {
    Some(match final_byte {
        b'A' => NamedKey::Up,
        b'B' => NamedKey::Down,
        b'C' => NamedKey::Right,
        b'D' => NamedKey::Left,
        b'H' => NamedKey::Home,
        b'F' => NamedKey::End,
        b'P' => NamedKey::F(1),
        b'Q' => NamedKey::F(2),
        b'R' => NamedKey::F(3),
        b'S' => NamedKey::F(4),
        _ => return None,
    })
}

/// `CSI n [; modifiers] ~` editing and function keys.
fn parse_tilde(params: &[CsiParam], consumed: usize) -> Parsed {
    let first = params.first().map_or(0, |p| p.0);
    let modifiers = params.get(1).map_or(Modifiers::empty(), |p| decode_modifiers(p.0));

    let key = match first {
        200 => return Parsed::PasteStart(consumed),
        1 | 7 => NamedKey::Home,
        2 => NamedKey::Insert,
        3 => NamedKey::Delete,
        4 | 8 => NamedKey::End,
        5 => NamedKey::PageUp,
        6 => NamedKey::PageDown,
        11 => NamedKey::F(1),
        12 => NamedKey::F(2),
        13 => NamedKey::F(3),
        14 => NamedKey::F(4),
        15 => NamedKey::F(5),
        17 => NamedKey::F(6),
        18 => NamedKey::F(7),
        19 => NamedKey::F(8),
        20 => NamedKey::F(9),
        21 => NamedKey::F(10),
        23 => NamedKey::F(11),
        24 => NamedKey::F(12),
        // Includes a stray `CSI 201~` outside a paste.
        _ => return Parsed::Skip(consumed),
    };
    Parsed::Event(Event::Key(KeyEvent::new(Key::Named(key), modifiers)), consumed)
}

// ── SS3 (Single Shift 3) ───────────────────────────────────────────────────

fn parse_ss3(buf: &[u8]) -> Parsed {
    debug_assert!(buf.len() >= 2 && buf[0] == 0x1B && buf[1] == b'O');

    let Some(&b) = buf.get(2) else {
        return Parsed::Incomplete;
    };

    if b == b'M' {
        // Keypad Enter in application mode.
        return Parsed::Event(Event::Key(KeyEvent::named(NamedKey::Enter)), 3);
    }
    match letter_key(b) {
        Some(key) => Parsed::Event(Event::Key(KeyEvent::named(key)), 3),
        None if (0x40..=0x7E).contains(&b) => Parsed::Skip(3),
        // Not a final byte: drop the introducer and decode `b` on its own.
        None => Parsed::Skip(2),
    }
}

// ── SGR Mouse Protocol ─────────────────────────────────────────────────────

/// `ESC [ < Cb ; Cx ; Cy M` (press/motion) or `... m` (release).
/// `params` excludes the `<`.
fn parse_sgr_mouse(params: &[u8], is_release: bool, consumed: usize) -> Parsed {
    if !params.iter().all(|&b| b.is_ascii_digit() || b == b';') {
        return Parsed::Skip(consumed);
    }
    let params = parse_csi_params(params);
    let [CsiParam(cb, _), CsiParam(raw_x, _), CsiParam(raw_y, _)] = params[..] else {
        return Parsed::Skip(consumed);
    };

    // Extended buttons 8-11 and anything beyond.
    if cb >= 128 {
        return Parsed::Skip(consumed);
    }

    let mut modifiers = Modifiers::empty();
    if cb & 4 != 0 {
        modifiers |= Modifiers::SHIFT;
    }
    if cb & 8 != 0 {
        modifiers |= Modifiers::ALT;
    }
    if cb & 16 != 0 {
        modifiers |= Modifiers::CTRL;
    }

    let is_scroll = cb & 64 != 0;
    let is_motion = cb & 32 != 0;
    let base = cb & 3;

    let (button, action) = if is_scroll {
        match base {
            0 => (MouseButton::None, MouseAction::ScrollUp),
            1 => (MouseButton::None, MouseAction::ScrollDown),
            // Horizontal wheel.
            _ => return Parsed::Skip(consumed),
        }
    } else if is_motion {
        match base {
            3 => (MouseButton::None, MouseAction::Move),
            _ => (decode_mouse_button(base), MouseAction::Drag),
        }
    } else if is_release {
        (decode_mouse_button(base), MouseAction::Release)
    } else if base == 3 {
        return Parsed::Skip(consumed);
    } else {
        (decode_mouse_button(base), MouseAction::Press)
    };

    // SGR coordinates are 1-based.
    let x = u16::try_from(raw_x.saturating_sub(1)).unwrap_or(u16::MAX);
    let y = u16::try_from(raw_y.saturating_sub(1)).unwrap_or(u16::MAX);

    Parsed::Event(
        Event::Mouse(MouseEvent {
            x,
            y,
            button,
            action,
            modifiers,
        }),
        consumed,
    )
}

// ── Kitty Keyboard Protocol ────────────────────────────────────────────────

/// `CSI codepoint [; modifiers[:event_type]] u`
fn parse_kitty_key(params: &[CsiParam], consumed: usize) -> Parsed {
    let codepoint = params.first().map_or(0, |p| p.0);
    let (modifier_val, event_type) = params.get(1).map_or((0, 0), |p| (p.0, p.1));

    // Release reports only arrive with higher protocol flags; drop them.
    if event_type == 3 {
        return Parsed::Skip(consumed);
    }

    kitty_codepoint_to_key(codepoint).map_or(Parsed::Skip(consumed), |key| {
        Parsed::Event(
            Event::Key(KeyEvent::new(key, decode_modifiers(modifier_val))),
            consumed,
        )
    })
}

/// Map a kitty codepoint to a key. Functional keys live in the Unicode
/// Private Use Area from 57344; the ones without a [`NamedKey`] map to
/// `None`.
fn kitty_codepoint_to_key(cp: u32) -> Option<Key> {
    let named = match cp {
        27 | 57344 => NamedKey::Escape,
        13 | 57345 => NamedKey::Enter,
        9 | 57346 => NamedKey::Tab,
        8 | 127 | 57347 => NamedKey::Backspace,
        32 => NamedKey::Space,
        57348 => NamedKey::Insert,
        57349 => NamedKey::Delete,
        57350 => NamedKey::Left,
        57351 => NamedKey::Right,
        57352 => NamedKey::Up,
        57353 => NamedKey::Down,
        57354 => NamedKey::PageUp,
        57355 => NamedKey::PageDown,
        57356 => NamedKey::Home,
        57357 => NamedKey::End,
        // Range guarantees the result fits in u8.
        #[allow(clippy::cast_possible_truncation)]
        57364..=57375 => NamedKey::F((cp - 57364 + 1) as u8),
        0xE000..=0xF8FF => return None,
        _ => {
            return char::from_u32(cp)
                .filter(|c| !c.is_control())
                .map(Key::Char);
        }
    };
    Some(Key::Named(named))
}

// ── UTF-8 ──────────────────────────────────────────────────────────────────

enum Utf8 {
    Char(char, usize),
    Incomplete,
    Invalid(usize),
}

fn parse_utf8(buf: &[u8]) -> Utf8 {
    let expected = utf8_char_len(buf[0]);
    if expected < 2 {
        return Utf8::Invalid(1);
    }

    let available = buf.len().min(expected);
    // Continuation bytes must look like 0b10xxxxxx.
    if buf[1..available].iter().any(|&b| b & 0xC0 != 0x80) {
        return Utf8::Invalid(1);
    }
    if buf.len() < expected {
        return Utf8::Incomplete;
    }

    match std::str::from_utf8(&buf[..expected]).ok().and_then(|s| s.chars().next()) {
        // C1 controls have no key meaning.
        Some(c) if ('\u{80}'..='\u{9f}').contains(&c) => Utf8::Invalid(expected),
        Some(c) => Utf8::Char(c, expected),
        None => Utf8::Invalid(1),
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────────

/// CSI parameter: `(main_value, colon_sub_parameter)`.
///
/// The colon sub-parameter carries the kitty event type:
/// `modifier:event_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CsiParam(u32, u32);

/// Parse semicolon-separated CSI parameters with optional colon sub-params.
///
/// - `1;2` → `[(1,0), (2,0)]`
/// - `97;5:2` → `[(97,0), (5,2)]`
/// - (empty) → `[]`
fn parse_csi_params(raw: &[u8]) -> Vec<CsiParam> {
    if raw.is_empty() {
        return Vec::new();
    }

    let mut params = Vec::with_capacity(4);
    let mut pos = 0;

    loop {
        let (main_val, next) = parse_u32_at(raw, pos);
        pos = next;

        let sub_val = if raw.get(pos) == Some(&b':') {
            let (v, n) = parse_u32_at(raw, pos + 1);
            pos = n;
            // Further sub-parameters (kitty alternate keys) are unused.
            while pos < raw.len() && raw[pos] != b';' {
                pos += 1;
            }
            v
        } else {
            0
        };

        params.push(CsiParam(main_val, sub_val));

        if raw.get(pos) == Some(&b';') {
            pos += 1;
        } else {
            break;
        }
    }

    params
}

/// Parse a u32 from bytes starting at `start`, stopping at a non-digit.
/// Returns `(value, next_position)`.
fn parse_u32_at(buf: &[u8], start: usize) -> (u32, usize) {
    let mut val: u32 = 0;
    let mut pos = start;
    while pos < buf.len() && buf[pos].is_ascii_digit() {
        val = val
            .saturating_mul(10)
            .saturating_add(u32::from(buf[pos] - b'0'));
        pos += 1;
    }
    (val, pos)
}

/// Decode the xterm modifier parameter (`1 + bitmask`). 0 and 1 mean none;
/// bits above Ctrl (Super, Hyper, Meta) are dropped.
#[allow(clippy::cast_possible_truncation)]
const fn decode_modifiers(param: u32) -> Modifiers {
    let val = if param > 0 { param - 1 } else { 0 };
    Modifiers::from_bits_truncate((val & 0xFF) as u8)
}

const fn decode_mouse_button(base: u32) -> MouseButton {
    match base {
        0 => MouseButton::Left,
        1 => MouseButton::Middle,
        2 => MouseButton::Right,
        _ => MouseButton::None,
    }
}

/// Expected byte length of a UTF-8 character from its lead byte.
/// Returns 0 for bytes that cannot start a character.
const fn utf8_char_len(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}

/// Find the first occurrence of `needle` in `haystack`.
fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Length of the longest suffix of `haystack` that is a proper prefix of
/// `needle`.
fn partial_suffix_len(haystack: &[u8], needle: &[u8]) -> usize {
    (1..needle.len().min(haystack.len() + 1))
        .rev()
        .find(|&n| haystack.ends_with(&needle[..n]))
        .unwrap_or(0)
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Helper: decode bytes with a fresh decoder.
    fn parse(data: &[u8]) -> Vec<Event> {
        InputDecoder::new().parse(data)
    }

    /// Helper: decode bytes, expect exactly one event.
    fn parse_one(data: &[u8]) -> Event {
        let events = parse(data);
        assert_eq!(events.len(), 1, "expected 1 event, got {events:?}");
        events.into_iter().next().unwrap()
    }

    fn ch(c: char) -> Event {
        Event::Key(KeyEvent::char(c))
    }

    fn named(key: NamedKey) -> Event {
        Event::Key(KeyEvent::named(key))
    }

    fn key_mod(key: Key, modifiers: Modifiers) -> Event {
        Event::Key(KeyEvent::new(key, modifiers))
    }

    fn mouse(x: u16, y: u16, button: MouseButton, action: MouseAction) -> Event {
        Event::Mouse(MouseEvent {
            x,
            y,
            button,
            action,
            modifiers: Modifiers::empty(),
        })
    }

    // ── Printable ───────────────────────────────────────────────────────

    #[test]
    fn ascii_single_char() {
        assert_eq!(parse(b"a"), vec![ch('a')]);
    }

    #[test]
    fn ascii_multiple_chars() {
        assert_eq!(parse(b"abc"), vec![ch('a'), ch('b'), ch('c')]);
    }

    #[test]
    fn space_is_named() {
        assert_eq!(parse_one(b" "), named(NamedKey::Space));
    }

    #[test]
    fn utf8_chars() {
        assert_eq!(parse("é中🎉".as_bytes()), vec![ch('é'), ch('中'), ch('🎉')]);
    }

    #[test]
    fn utf8_split_across_calls() {
        let bytes = "中".as_bytes();
        let mut decoder = InputDecoder::new();
        assert_eq!(decoder.parse(&bytes[..1]), vec![]);
        assert!(decoder.has_pending());
        assert_eq!(decoder.parse(&bytes[1..2]), vec![]);
        assert_eq!(decoder.parse(&bytes[2..]), vec![ch('中')]);
        assert!(!decoder.has_pending());
    }

    #[test]
    fn stray_continuation_byte_skipped() {
        assert_eq!(parse(b"\x80a"), vec![ch('a')]);
    }

    #[test]
    fn broken_utf8_resyncs() {
        // Lead byte of a 3-byte char followed by ASCII.
        assert_eq!(parse(b"\xE4ab"), vec![ch('a'), ch('b')]);
    }

    #[test]
    fn c1_control_discarded() {
        assert_eq!(parse("\u{85}x".as_bytes()), vec![ch('x')]);
    }

    // ── Control Characters ──────────────────────────────────────────────

    #[test]
    fn ctrl_letters() {
        assert_eq!(parse_one(b"\x01"), key_mod(Key::Char('a'), Modifiers::CTRL));
        assert_eq!(parse_one(b"\x03"), key_mod(Key::Char('c'), Modifiers::CTRL));
        assert_eq!(parse_one(b"\x1A"), key_mod(Key::Char('z'), Modifiers::CTRL));
    }

    #[test]
    fn ctrl_space() {
        assert_eq!(
            parse_one(b"\x00"),
            key_mod(Key::Named(NamedKey::Space), Modifiers::CTRL)
        );
    }

    #[test]
    fn ctrl_punctuation() {
        assert_eq!(
            parse(b"\x1C\x1D\x1E\x1F"),
            vec![
                key_mod(Key::Char('\\'), Modifiers::CTRL),
                key_mod(Key::Char(']'), Modifiers::CTRL),
                key_mod(Key::Char('^'), Modifiers::CTRL),
                key_mod(Key::Char('_'), Modifiers::CTRL),
            ]
        );
    }

    #[test]
    fn enter_tab_backspace() {
        assert_eq!(parse_one(b"\r"), named(NamedKey::Enter));
        assert_eq!(parse_one(b"\n"), named(NamedKey::Enter));
        assert_eq!(parse_one(b"\t"), named(NamedKey::Tab));
        assert_eq!(parse_one(b"\x7F"), named(NamedKey::Backspace));
        assert_eq!(parse_one(b"\x08"), named(NamedKey::Backspace));
    }

    #[test]
    fn is_ctrl_helper() {
        let Event::Key(key) = parse_one(b"\x03") else {
            panic!("expected key");
        };
        assert!(key.is_ctrl('c'));
        assert!(!key.is_ctrl('d'));
    }

    // ── Escape ──────────────────────────────────────────────────────────

    #[test]
    fn lone_escape_at_end_of_read() {
        assert_eq!(parse(b"\x1b"), vec![named(NamedKey::Escape)]);
    }

    #[test]
    fn escape_then_escape_sequence() {
        assert_eq!(
            parse(b"\x1b\x1b[A"),
            vec![named(NamedKey::Escape), named(NamedKey::Up)]
        );
    }

    #[test]
    fn alt_escape() {
        assert_eq!(
            parse_one(b"\x1b\x1b"),
            key_mod(Key::Named(NamedKey::Escape), Modifiers::ALT)
        );
    }

    #[test]
    fn alt_printable() {
        assert_eq!(parse_one(b"\x1ba"), key_mod(Key::Char('a'), Modifiers::ALT));
        assert_eq!(parse_one(b"\x1bZ"), key_mod(Key::Char('Z'), Modifiers::ALT));
        assert_eq!(
            parse_one(b"\x1b "),
            key_mod(Key::Named(NamedKey::Space), Modifiers::ALT)
        );
    }

    #[test]
    fn alt_ctrl_letter() {
        assert_eq!(
            parse_one(b"\x1b\x01"),
            key_mod(Key::Char('a'), Modifiers::ALT | Modifiers::CTRL)
        );
    }

    #[test]
    fn alt_utf8() {
        assert_eq!(
            parse_one("\x1bé".as_bytes()),
            key_mod(Key::Char('é'), Modifiers::ALT)
        );
    }

    #[test]
    fn csi_introducer_waits_for_more() {
        let mut decoder = InputDecoder::new();
        assert_eq!(decoder.parse(b"\x1b["), vec![]);
        assert!(decoder.has_pending());
        assert_eq!(decoder.parse(b"1;5"), vec![]);
        assert_eq!(
            decoder.parse(b"C"),
            vec![key_mod(Key::Named(NamedKey::Right), Modifiers::CTRL)]
        );
    }

    // ── CSI Keys ────────────────────────────────────────────────────────

    #[test]
    fn arrows() {
        assert_eq!(
            parse(b"\x1b[A\x1b[B\x1b[C\x1b[D"),
            vec![
                named(NamedKey::Up),
                named(NamedKey::Down),
                named(NamedKey::Right),
                named(NamedKey::Left),
            ]
        );
    }

    #[test]
    fn arrow_modifiers() {
        assert_eq!(
            parse_one(b"\x1b[1;2A"),
            key_mod(Key::Named(NamedKey::Up), Modifiers::SHIFT)
        );
        assert_eq!(
            parse_one(b"\x1b[1;3B"),
            key_mod(Key::Named(NamedKey::Down), Modifiers::ALT)
        );
        assert_eq!(
            parse_one(b"\x1b[1;5C"),
            key_mod(Key::Named(NamedKey::Right), Modifiers::CTRL)
        );
        assert_eq!(
            parse_one(b"\x1b[1;6D"),
            key_mod(Key::Named(NamedKey::Left), Modifiers::CTRL | Modifiers::SHIFT)
        );
    }

    #[test]
    fn super_modifier_dropped() {
        // 1 + (SHIFT | SUPER) = 10
        assert_eq!(
            parse_one(b"\x1b[1;10A"),
            key_mod(Key::Named(NamedKey::Up), Modifiers::SHIFT)
        );
    }

    #[test]
    fn home_end() {
        assert_eq!(parse_one(b"\x1b[H"), named(NamedKey::Home));
        assert_eq!(parse_one(b"\x1b[F"), named(NamedKey::End));
        assert_eq!(parse_one(b"\x1b[1~"), named(NamedKey::Home));
        assert_eq!(parse_one(b"\x1b[7~"), named(NamedKey::Home));
        assert_eq!(parse_one(b"\x1b[4~"), named(NamedKey::End));
        assert_eq!(parse_one(b"\x1b[8~"), named(NamedKey::End));
    }

    #[test]
    fn editing_keys() {
        assert_eq!(parse_one(b"\x1b[2~"), named(NamedKey::Insert));
        assert_eq!(parse_one(b"\x1b[3~"), named(NamedKey::Delete));
        assert_eq!(parse_one(b"\x1b[5~"), named(NamedKey::PageUp));
        assert_eq!(parse_one(b"\x1b[6~"), named(NamedKey::PageDown));
        assert_eq!(
            parse_one(b"\x1b[3;5~"),
            key_mod(Key::Named(NamedKey::Delete), Modifiers::CTRL)
        );
    }

    #[test]
    fn function_keys_tilde() {
        let cases: [(&[u8], u8); 12] = [
            (b"\x1b[11~", 1),
            (b"\x1b[12~", 2),
            (b"\x1b[13~", 3),
            (b"\x1b[14~", 4),
            (b"\x1b[15~", 5),
            (b"\x1b[17~", 6),
            (b"\x1b[18~", 7),
            (b"\x1b[19~", 8),
            (b"\x1b[20~", 9),
            (b"\x1b[21~", 10),
            (b"\x1b[23~", 11),
            (b"\x1b[24~", 12),
        ];
        for (bytes, n) in cases {
            assert_eq!(parse_one(bytes), named(NamedKey::F(n)));
        }
    }

    #[test]
    fn function_keys_csi_letter() {
        assert_eq!(parse_one(b"\x1b[P"), named(NamedKey::F(1)));
        assert_eq!(
            parse_one(b"\x1b[1;2S"),
            key_mod(Key::Named(NamedKey::F(4)), Modifiers::SHIFT)
        );
    }

    #[test]
    fn function_keys_rxvt() {
        assert_eq!(parse_one(b"\x1b[[A"), named(NamedKey::F(1)));
        assert_eq!(parse_one(b"\x1b[[E"), named(NamedKey::F(5)));
    }

    #[test]
    fn shift_tab() {
        assert_eq!(
            parse_one(b"\x1b[Z"),
            key_mod(Key::Named(NamedKey::Tab), Modifiers::SHIFT)
        );
    }

    #[test]
    fn unknown_csi_discarded() {
        assert_eq!(parse(b"\x1b[99~x"), vec![ch('x')]);
        assert_eq!(parse(b"\x1b[?1;2cx"), vec![ch('x')]);
        assert_eq!(parse(b"\x1b[5Xx"), vec![ch('x')]);
    }

    #[test]
    fn invalid_byte_inside_csi_resyncs() {
        assert_eq!(parse(b"\x1b[1\ra"), vec![named(NamedKey::Enter), ch('a')]);
    }

    #[test]
    fn overlong_sequence_discarded() {
        let mut decoder = InputDecoder::with_config(DecoderConfig {
            max_sequence_len: 8,
            ..DecoderConfig::default()
        });
        assert_eq!(decoder.parse(b"\x1b[11111111"), vec![]);
        assert!(!decoder.has_pending());
        assert_eq!(decoder.parse(b"1111;5A"), vec![]);
        assert_eq!(decoder.parse(b"b"), vec![ch('b')]);
    }

    #[test]
    fn sequence_at_limit_accepted() {
        let mut decoder = InputDecoder::with_config(DecoderConfig {
            max_sequence_len: 7,
            ..DecoderConfig::default()
        });
        assert_eq!(
            decoder.parse(b"\x1b[1;5A"),
            vec![key_mod(Key::Named(NamedKey::Up), Modifiers::CTRL)]
        );
    }

    // ── SS3 ─────────────────────────────────────────────────────────────

    #[test]
    fn ss3_keys() {
        assert_eq!(parse_one(b"\x1bOP"), named(NamedKey::F(1)));
        assert_eq!(parse_one(b"\x1bOS"), named(NamedKey::F(4)));
        assert_eq!(parse_one(b"\x1bOA"), named(NamedKey::Up));
        assert_eq!(parse_one(b"\x1bOH"), named(NamedKey::Home));
        assert_eq!(parse_one(b"\x1bOF"), named(NamedKey::End));
        assert_eq!(parse_one(b"\x1bOM"), named(NamedKey::Enter));
    }

    #[test]
    fn ss3_introducer_waits_for_more() {
        let mut decoder = InputDecoder::new();
        assert_eq!(decoder.parse(b"\x1bO"), vec![]);
        assert_eq!(decoder.parse(b"Q"), vec![named(NamedKey::F(2))]);
    }

    // ── Mouse ───────────────────────────────────────────────────────────

    #[test]
    fn mouse_left_press() {
        assert_eq!(
            parse_one(b"\x1b[<0;11;6M"),
            mouse(10, 5, MouseButton::Left, MouseAction::Press)
        );
    }

    #[test]
    fn mouse_release() {
        assert_eq!(
            parse_one(b"\x1b[<0;1;1m"),
            mouse(0, 0, MouseButton::Left, MouseAction::Release)
        );
        assert_eq!(
            parse_one(b"\x1b[<2;3;4m"),
            mouse(2, 3, MouseButton::Right, MouseAction::Release)
        );
    }

    #[test]
    fn mouse_middle_and_right() {
        assert_eq!(
            parse_one(b"\x1b[<1;5;5M"),
            mouse(4, 4, MouseButton::Middle, MouseAction::Press)
        );
        assert_eq!(
            parse_one(b"\x1b[<2;5;5M"),
            mouse(4, 4, MouseButton::Right, MouseAction::Press)
        );
    }

    #[test]
    fn mouse_scroll() {
        assert_eq!(
            parse_one(b"\x1b[<64;10;20M"),
            mouse(9, 19, MouseButton::None, MouseAction::ScrollUp)
        );
        assert_eq!(
            parse_one(b"\x1b[<65;10;20M"),
            mouse(9, 19, MouseButton::None, MouseAction::ScrollDown)
        );
    }

    #[test]
    fn mouse_horizontal_scroll_discarded() {
        assert_eq!(parse(b"\x1b[<66;1;1M\x1b[<67;1;1M"), vec![]);
    }

    #[test]
    fn mouse_drag_and_move() {
        assert_eq!(
            parse_one(b"\x1b[<32;15;10M"),
            mouse(14, 9, MouseButton::Left, MouseAction::Drag)
        );
        assert_eq!(
            parse_one(b"\x1b[<34;15;10M"),
            mouse(14, 9, MouseButton::Right, MouseAction::Drag)
        );
        assert_eq!(
            parse_one(b"\x1b[<35;15;10M"),
            mouse(14, 9, MouseButton::None, MouseAction::Move)
        );
    }

    #[test]
    fn mouse_modifiers() {
        let Event::Mouse(m) = parse_one(b"\x1b[<28;1;1M") else {
            panic!("expected mouse event");
        };
        assert_eq!(m.modifiers, Modifiers::SHIFT | Modifiers::ALT | Modifiers::CTRL);
        assert_eq!(m.button, MouseButton::Left);
        assert_eq!(m.action, MouseAction::Press);
    }

    #[test]
    fn mouse_large_coordinates() {
        assert_eq!(
            parse_one(b"\x1b[<0;300;200M"),
            mouse(299, 199, MouseButton::Left, MouseAction::Press)
        );
    }

    #[test]
    fn mouse_zero_coordinates_saturate() {
        assert_eq!(
            parse_one(b"\x1b[<0;0;0M"),
            mouse(0, 0, MouseButton::Left, MouseAction::Press)
        );
    }

    #[test]
    fn mouse_wrong_param_count_discarded() {
        assert_eq!(parse(b"\x1b[<0;1M\x1b[<0;1;1;1Mx"), vec![ch('x')]);
    }

    #[test]
    fn mouse_split_across_calls() {
        let mut decoder = InputDecoder::new();
        assert_eq!(decoder.parse(b"\x1b[<0;1"), vec![]);
        assert_eq!(
            decoder.parse(b"1;6M"),
            vec![mouse(10, 5, MouseButton::Left, MouseAction::Press)]
        );
    }

    // ── Focus ───────────────────────────────────────────────────────────

    #[test]
    fn focus_events() {
        assert_eq!(parse(b"\x1b[I\x1b[O"), vec![Event::FocusIn, Event::FocusOut]);
    }

    // ── Paste ───────────────────────────────────────────────────────────

    #[test]
    fn paste_single_call() {
        assert_eq!(
            parse(b"\x1b[200~hello\x1b[201~"),
            vec![Event::Paste(b"hello".to_vec())]
        );
    }

    #[test]
    fn paste_keeps_control_bytes_verbatim() {
        assert_eq!(
            parse(b"\x1b[200~a\r\x1b[Ab\x1b[201~x"),
            vec![Event::Paste(b"a\r\x1b[Ab".to_vec()), ch('x')]
        );
    }

    #[test]
    fn paste_across_calls() {
        let mut decoder = InputDecoder::new();
        assert_eq!(decoder.parse(b"\x1b[20"), vec![]);
        assert_eq!(decoder.parse(b"0~hel"), vec![]);
        assert!(!decoder.has_pending());
        assert_eq!(decoder.parse(b"lo\x1b[2"), vec![]);
        // A paste in progress is not flushed.
        assert_eq!(decoder.flush(), vec![]);
        assert_eq!(
            decoder.parse(b"01~"),
            vec![Event::Paste(b"hello".to_vec())]
        );
    }

    #[test]
    fn paste_partial_terminator_is_content() {
        assert_eq!(
            parse(b"\x1b[200~a\x1b[2b\x1b[201~"),
            vec![Event::Paste(b"a\x1b[2b".to_vec())]
        );
    }

    #[test]
    fn empty_paste() {
        assert_eq!(parse(b"\x1b[200~\x1b[201~"), vec![Event::Paste(Vec::new())]);
    }

    #[test]
    fn paste_truncated_at_limit() {
        let mut decoder = InputDecoder::with_config(DecoderConfig {
            max_paste_len: 4,
            ..DecoderConfig::default()
        });
        assert_eq!(decoder.parse(b"\x1b[200~abc"), vec![]);
        assert_eq!(
            decoder.parse(b"defgh\x1b[201~z"),
            vec![Event::Paste(b"abcd".to_vec()), ch('z')]
        );
    }

    #[test]
    fn stray_paste_end_discarded() {
        assert_eq!(parse(b"\x1b[201~a"), vec![ch('a')]);
    }

    // ── Kitty ───────────────────────────────────────────────────────────

    #[test]
    fn kitty_chars() {
        assert_eq!(parse_one(b"\x1b[97u"), ch('a'));
        assert_eq!(
            parse_one(b"\x1b[97;5u"),
            key_mod(Key::Char('a'), Modifiers::CTRL)
        );
        assert_eq!(
            parse_one(b"\x1b[97;8u"),
            key_mod(
                Key::Char('a'),
                Modifiers::SHIFT | Modifiers::ALT | Modifiers::CTRL
            )
        );
    }

    #[test]
    fn kitty_named() {
        assert_eq!(parse_one(b"\x1b[13u"), named(NamedKey::Enter));
        assert_eq!(parse_one(b"\x1b[9u"), named(NamedKey::Tab));
        assert_eq!(parse_one(b"\x1b[27u"), named(NamedKey::Escape));
        assert_eq!(parse_one(b"\x1b[127u"), named(NamedKey::Backspace));
        assert_eq!(parse_one(b"\x1b[32u"), named(NamedKey::Space));
    }

    #[test]
    fn kitty_functional_keys() {
        assert_eq!(parse_one(b"\x1b[57348u"), named(NamedKey::Insert));
        assert_eq!(parse_one(b"\x1b[57357u"), named(NamedKey::End));
        assert_eq!(parse_one(b"\x1b[57364u"), named(NamedKey::F(1)));
        assert_eq!(parse_one(b"\x1b[57375u"), named(NamedKey::F(12)));
    }

    #[test]
    fn kitty_unmapped_functional_discarded() {
        // Caps Lock, F13.
        assert_eq!(parse(b"\x1b[57358u\x1b[57376u"), vec![]);
    }

    #[test]
    fn kitty_release_discarded_repeat_kept() {
        assert_eq!(parse(b"\x1b[97;1:3u"), vec![]);
        assert_eq!(parse_one(b"\x1b[97;1:2u"), ch('a'));
    }

    #[test]
    fn kitty_alternate_keys_ignored() {
        assert_eq!(
            parse_one(b"\x1b[97:65;2u"),
            key_mod(Key::Char('a'), Modifiers::SHIFT)
        );
    }

    #[test]
    fn kitty_astral_codepoint() {
        assert_eq!(parse_one(b"\x1b[128512u"), ch('😀'));
    }

    // ── Flush ───────────────────────────────────────────────────────────

    #[test]
    fn flush_incomplete_csi_as_literal_keys() {
        let mut decoder = InputDecoder::new();
        assert_eq!(decoder.parse(b"\x1b[1;"), vec![]);
        assert_eq!(
            decoder.flush(),
            vec![
                key_mod(Key::Char('['), Modifiers::ALT),
                ch('1'),
                ch(';'),
            ]
        );
        assert!(!decoder.has_pending());
    }

    #[test]
    fn flush_alt_o() {
        let mut decoder = InputDecoder::new();
        assert_eq!(decoder.parse(b"\x1bO"), vec![]);
        assert_eq!(decoder.flush(), vec![key_mod(Key::Char('O'), Modifiers::ALT)]);
    }

    #[test]
    fn flush_drops_partial_utf8() {
        let mut decoder = InputDecoder::new();
        assert_eq!(decoder.parse(b"\xE4\xB8"), vec![]);
        assert_eq!(decoder.flush(), vec![]);
        assert!(!decoder.has_pending());
    }

    #[test]
    fn flush_empty() {
        assert_eq!(InputDecoder::new().flush(), vec![]);
    }

    // ── Mixed ───────────────────────────────────────────────────────────

    #[test]
    fn mixed_stream() {
        assert_eq!(
            parse(b"a\x1b[Ab\x1b[<0;1;1Mc"),
            vec![
                ch('a'),
                named(NamedKey::Up),
                ch('b'),
                mouse(0, 0, MouseButton::Left, MouseAction::Press),
                ch('c'),
            ]
        );
    }

    // ── Helpers ─────────────────────────────────────────────────────────

    #[test]
    fn csi_params() {
        assert_eq!(parse_csi_params(b""), vec![]);
        assert_eq!(parse_csi_params(b"1;2"), vec![CsiParam(1, 0), CsiParam(2, 0)]);
        assert_eq!(parse_csi_params(b"97;5:2"), vec![CsiParam(97, 0), CsiParam(5, 2)]);
        assert_eq!(parse_csi_params(b";5"), vec![CsiParam(0, 0), CsiParam(5, 0)]);
    }

    #[test]
    fn partial_suffix() {
        assert_eq!(partial_suffix_len(b"abc\x1b[20", PASTE_END), 4);
        assert_eq!(partial_suffix_len(b"abc\x1b", PASTE_END), 1);
        assert_eq!(partial_suffix_len(b"abc", PASTE_END), 0);
        assert_eq!(partial_suffix_len(b"", PASTE_END), 0);
    }
}
