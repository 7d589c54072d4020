// SPDX-License-Identifier: MIT

//! Property tests for the input decoder.
//!
//! 1. Arbitrary bytes never panic, in one read or many.
//! 2. Where a read boundary falls does not change the events, as long as
//!    it does not fall right after an `ESC` (a lone trailing `ESC` is an
//!    Escape key press by definition).
//! 3. Every printable character decodes to itself.
//! 4. SGR mouse coordinates come out 0-based.
//! 5. An overlong control sequence is dropped whole and decoding resumes.

use proptest::prelude::*;
use tessel_term::config::DecoderConfig;
use tessel_term::input::{MouseAction, MouseButton, MouseEvent};
use tessel_term::{Event, InputDecoder, Key, KeyEvent, Modifiers, NamedKey};

// ── Helpers ─────────────────────────────────────────────────────────────

/// Well-formed inputs a terminal sends, one key or report each.
const TOKENS: &[&[u8]] = &[
    b"a",
    b"Q",
    b" ",
    b"\r",
    b"\t",
    b"\x7f",
    b"\x03",
    "é".as_bytes(),
    "中".as_bytes(),
    "🎉".as_bytes(),
    b"\x1b",
    b"\x1bx",
    b"\x1b[A",
    b"\x1b[1;5C",
    b"\x1b[H",
    b"\x1b[3~",
    b"\x1b[15;2~",
    b"\x1b[Z",
    b"\x1b[I",
    b"\x1b[O",
    b"\x1bOP",
    b"\x1bOM",
    b"\x1b[[B",
    b"\x1b[97;5u",
    b"\x1b[57364u",
    b"\x1b[<0;11;6M",
    b"\x1b[<0;11;6m",
    b"\x1b[<65;1;1M",
    b"\x1b[200~pasted \x1b[A text\x1b[201~",
    b"\x1b[?1;2c",
];

fn stream() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop::sample::select(TOKENS), 1..12).prop_map(|tokens| tokens.concat())
}

fn decode_whole(bytes: &[u8]) -> Vec<Event> {
    let mut d = InputDecoder::new();
    let mut events = d.parse(bytes);
    events.extend(d.flush());
    events
}

fn decode_chunks<'a>(chunks: impl IntoIterator<Item = &'a [u8]>) -> Vec<Event> {
    let mut d = InputDecoder::new();
    let mut events = Vec::new();
    for chunk in chunks {
        events.extend(d.parse(chunk));
    }
    events.extend(d.flush());
    events
}

/// Read boundaries in `0..=len` that do not directly follow an `ESC`.
fn allowed_cut(bytes: &[u8], cut: usize) -> bool {
    cut == 0 || bytes[cut - 1] != 0x1B
}

// ═════════════════════════════════════════════════════════════════════════
// 1. No input panics the decoder
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let mut d = InputDecoder::new();
        let _ = d.parse(&bytes);
        let _ = d.flush();
        prop_assert!(!d.has_pending());
    }

    #[test]
    fn arbitrary_chunks_never_panic(
        chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 0..16),
    ) {
        let mut d = InputDecoder::with_config(DecoderConfig {
            max_sequence_len: 16,
            max_paste_len: 32,
        });
        for chunk in &chunks {
            let _ = d.parse(chunk);
        }
        let _ = d.flush();
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Read boundaries do not matter
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn split_anywhere_same_events(bytes in stream(), cut in any::<prop::sample::Index>()) {
        let cut = cut.index(bytes.len() + 1);
        prop_assume!(allowed_cut(&bytes, cut));

        let (head, tail) = bytes.split_at(cut);
        prop_assert_eq!(decode_chunks([head, tail]), decode_whole(&bytes));
    }

    #[test]
    fn split_twice_same_events(
        bytes in stream(),
        a in any::<prop::sample::Index>(),
        b in any::<prop::sample::Index>(),
    ) {
        let (mut i, mut j) = (a.index(bytes.len() + 1), b.index(bytes.len() + 1));
        if i > j {
            std::mem::swap(&mut i, &mut j);
        }
        prop_assume!(allowed_cut(&bytes, i) && allowed_cut(&bytes, j));

        let chunks = [&bytes[..i], &bytes[i..j], &bytes[j..]];
        prop_assert_eq!(decode_chunks(chunks), decode_whole(&bytes));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Printable characters decode to themselves
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn printable_char_round_trips(c in any::<char>().prop_filter("printable", |c| !c.is_control() && *c != ' ')) {
        let mut buf = [0u8; 4];
        let events = InputDecoder::new().parse(c.encode_utf8(&mut buf).as_bytes());
        prop_assert_eq!(events, vec![Event::Key(KeyEvent::char(c))]);
    }

    #[test]
    fn printable_char_split_bytewise(c in any::<char>().prop_filter("multibyte", |c| !c.is_control() && c.len_utf8() > 1)) {
        let mut buf = [0u8; 4];
        let bytes = c.encode_utf8(&mut buf).as_bytes();
        let mut d = InputDecoder::new();
        for &b in &bytes[..bytes.len() - 1] {
            prop_assert!(d.parse(&[b]).is_empty());
            prop_assert!(d.has_pending());
        }
        prop_assert_eq!(d.parse(&bytes[bytes.len() - 1..]), vec![Event::Key(KeyEvent::char(c))]);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Mouse coordinates
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn sgr_mouse_coordinates_are_zero_based(
        x in 1u16..=u16::MAX,
        y in 1u16..=u16::MAX,
        base in 0u8..3,
        release in any::<bool>(),
    ) {
        let final_byte = if release { 'm' } else { 'M' };
        let report = format!("\x1b[<{base};{x};{y}{final_byte}");
        let events = InputDecoder::new().parse(report.as_bytes());

        let button = match base {
            0 => MouseButton::Left,
            1 => MouseButton::Middle,
            _ => MouseButton::Right,
        };
        let action = if release { MouseAction::Release } else { MouseAction::Press };
        prop_assert_eq!(
            events,
            vec![Event::Mouse(MouseEvent {
                x: x - 1,
                y: y - 1,
                button,
                action,
                modifiers: Modifiers::empty(),
            })]
        );
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Overlong sequences
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn overlong_sequence_dropped_then_resumes(
        digits in 300usize..1200,
        cut in any::<prop::sample::Index>(),
    ) {
        let mut bytes = b"\x1b[".to_vec();
        bytes.extend(std::iter::repeat(b'1').take(digits));
        bytes.extend_from_slice(b"~x\x1b[B");

        let cut = cut.index(bytes.len() + 1);
        prop_assume!(allowed_cut(&bytes, cut));
        let (head, tail) = bytes.split_at(cut);

        let expected = vec![
            Event::Key(KeyEvent::char('x')),
            Event::Key(KeyEvent::named(NamedKey::Down)),
        ];
        prop_assert_eq!(decode_chunks([head, tail]), expected);
    }
}

// ── Fixed cases ─────────────────────────────────────────────────────────

#[test]
fn paste_split_inside_end_marker() {
    let mut d = InputDecoder::new();
    assert!(d.parse(b"\x1b[200~abc\x1b[20").is_empty());
    assert!(!d.has_pending());
    assert_eq!(d.parse(b"1~z"), vec![
        Event::Paste(b"abc".to_vec()),
        Event::Key(KeyEvent::char('z')),
    ]);
}

#[test]
fn lone_escape_then_letter_in_next_read() {
    let mut d = InputDecoder::new();
    assert_eq!(d.parse(b"\x1b"), vec![Event::Key(KeyEvent::named(NamedKey::Escape))]);
    assert_eq!(d.parse(b"a"), vec![Event::Key(KeyEvent::char('a'))]);
}

#[test]
fn ctrl_c_is_ctrl_char() {
    let events = InputDecoder::new().parse(b"\x03");
    let Some(Event::Key(key)) = events.first() else {
        panic!("expected a key, got {events:?}");
    };
    assert!(key.is_ctrl('c'));
    assert_eq!(key.key, Key::Char('c'));
}
