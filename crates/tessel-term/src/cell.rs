// SPDX-License-Identifier: MIT
//
// Cell: one character position of the screen grid.
//
// A cell holds what to draw (a Symbol), how to draw it (a Style), and how
// many columns it occupies. Cells are `Copy` so that whole rows can be
// compared with a slice equality and the renderer's snapshot can be
// refreshed with a memcpy.
//
// Symbol storage is inline for up to 15 bytes of UTF-8, which holds any
// single scalar and most clusters (base + combining marks, emoji +
// modifier, ZWJ pairs). Longer clusters, such as ZWJ families, are interned
// in a process-wide pool and the cell keeps a shared `&'static str`, so
// cells stay `Copy`. The pool is bounded; past it, or past 64 bytes, a
// cluster is cut to what fits inline without ending in a joiner.
//
// Wide characters (CJK, emoji) occupy two columns. The first cell holds the
// symbol with width 2; the second is a continuation placeholder (empty
// symbol, width 0) that only reserves the column. Drawing primitives never
// write a placeholder directly; the screen creates and removes them.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Mutex, OnceLock, PoisonError};

use crate::style::{Attr, Color, Style};
use crate::width;

// ─── Symbol ─────────────────────────────────────────────────────────────────

/// Maximum UTF-8 bytes a [`Symbol`] holds inline.
pub const SYMBOL_CAPACITY: usize = 15;

/// Longest cluster a [`Symbol`] keeps, inline or pooled.
pub const MAX_CLUSTER_BYTES: usize = 64;

/// Distinct long clusters the pool keeps before it stops taking new ones.
const POOL_LIMIT: usize = 4096;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
enum Repr {
    Inline { len: u8, bytes: [u8; SYMBOL_CAPACITY] },
    /// A cluster longer than [`SYMBOL_CAPACITY`], interned in the pool.
    Pooled(&'static str),
}

/// The glyph of a cell: one codepoint or one grapheme cluster.
///
/// Short clusters are stored inline. Longer ones (ZWJ families, flags with
/// modifiers, stacked marks) are interned once per process and shared.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol {
    repr: Repr,
}

fn pool() -> &'static Mutex<HashSet<&'static str>> {
    static POOL: OnceLock<Mutex<HashSet<&'static str>>> = OnceLock::new();
    POOL.get_or_init(Mutex::default)
}

/// The shared copy of `text`, or `None` once the pool is full.
fn intern(text: &str) -> Option<&'static str> {
    let mut pool = pool().lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(&shared) = pool.get(text) {
        return Some(shared);
    }
    if pool.len() >= POOL_LIMIT {
        return None;
    }
    let shared: &'static str = Box::leak(Box::<str>::from(text));
    pool.insert(shared);
    Some(shared)
}

/// The longest prefix of `text` that fits in `limit` bytes, ends on a
/// scalar boundary, and does not end in a joiner.
fn safe_prefix(text: &str, limit: usize) -> &str {
    let mut end = 0;
    for (i, ch) in text.char_indices() {
        if i + ch.len_utf8() > limit {
            break;
        }
        end = i + ch.len_utf8();
    }
    text[..end].trim_end_matches(['\u{200D}', '\u{200C}'])
}

impl Symbol {
    /// A single space.
    pub const BLANK: Self = Self::ascii(b' ');

    /// No content. Only continuation placeholders carry this.
    pub const EMPTY: Self = Self {
        repr: Repr::Inline {
            len: 0,
            bytes: [0; SYMBOL_CAPACITY],
        },
    };

    const fn ascii(b: u8) -> Self {
        let mut bytes = [0; SYMBOL_CAPACITY];
        bytes[0] = b;
        Self {
            repr: Repr::Inline { len: 1, bytes },
        }
    }

    /// Inline storage for `text`, which must fit.
    fn inline(text: &str) -> Self {
        let mut bytes = [0; SYMBOL_CAPACITY];
        let n = text.len().min(SYMBOL_CAPACITY);
        bytes[..n].copy_from_slice(&text.as_bytes()[..n]);
        // n <= 15.
        #[allow(clippy::cast_possible_truncation)]
        let len = n as u8;
        Self {
            repr: Repr::Inline { len, bytes },
        }
    }

    /// `text` whole, inline or pooled, or `None` if it cannot be kept.
    fn store(text: &str) -> Option<Self> {
        if text.len() <= SYMBOL_CAPACITY {
            return Some(Self::inline(text));
        }
        if text.len() > MAX_CLUSTER_BYTES {
            return None;
        }
        intern(text).map(|shared| Self {
            repr: Repr::Pooled(shared),
        })
    }

    /// A symbol holding exactly `ch`.
    #[must_use]
    pub fn from_char(ch: char) -> Self {
        let mut buf = [0; 4];
        Self::inline(ch.encode_utf8(&mut buf))
    }

    /// A symbol holding `cluster`.
    ///
    /// Clusters past [`MAX_CLUSTER_BYTES`] (or arriving once the pool is
    /// full) are cut to what fits inline, never leaving a dangling joiner.
    #[must_use]
    pub fn from_grapheme(cluster: &str) -> Self {
        Self::store(cluster)
            .unwrap_or_else(|| Self::inline(safe_prefix(cluster, SYMBOL_CAPACITY)))
    }

    /// Append a scalar (typically a combining mark). Returns `false` and
    /// leaves the symbol unchanged if the result would exceed
    /// [`MAX_CLUSTER_BYTES`].
    pub fn push(&mut self, ch: char) -> bool {
        if let Repr::Inline { len, bytes } = &mut self.repr {
            let at = usize::from(*len);
            let n = ch.len_utf8();
            if at + n <= SYMBOL_CAPACITY {
                ch.encode_utf8(&mut bytes[at..at + n]);
                // at + n <= 15.
                #[allow(clippy::cast_possible_truncation)]
                {
                    *len = (at + n) as u8;
                }
                return true;
            }
        }
        let mut text = String::with_capacity(self.as_str().len() + ch.len_utf8());
        text.push_str(self.as_str());
        text.push(ch);
        match Self::store(&text) {
            Some(sym) => {
                *self = sym;
                true
            }
            None => false,
        }
    }

    /// The UTF-8 text of this symbol.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match &self.repr {
            // Only whole scalars are ever written, so this never falls back.
            Repr::Inline { len, bytes } => {
                std::str::from_utf8(&bytes[..usize::from(*len)]).unwrap_or("")
            }
            Repr::Pooled(text) => text,
        }
    }

    /// The raw UTF-8 bytes, ready to be written to the terminal.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.as_str().as_bytes()
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self.repr, Repr::Inline { len: 0, .. })
    }

    /// The first scalar, if any.
    #[must_use]
    pub fn first_char(&self) -> Option<char> {
        self.as_str().chars().next()
    }
}

impl Default for Symbol {
    fn default() -> Self {
        Self::BLANK
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

// ─── Cell ───────────────────────────────────────────────────────────────────

/// A single screen position: symbol, style, and display width.
///
/// ```
/// use tessel_term::cell::Cell;
///
/// let a = Cell::new('a');
/// assert_eq!(a.width, 1);
/// let han = Cell::new('中');
/// assert_eq!(han.width, 2);
/// assert!(Cell::BLANK.symbol.as_str() == " ");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub symbol: Symbol,
    pub style: Style,
    /// 1 or 2 for visible cells, 0 for a continuation placeholder.
    pub width: u8,
}

impl Cell {
    /// A space in the default style.
    pub const BLANK: Self = Self {
        symbol: Symbol::BLANK,
        style: Style::DEFAULT,
        width: 1,
    };

    /// A cell showing `ch` in the default style.
    ///
    /// Control characters become a blank (they would move the terminal
    /// cursor). A lone zero-width scalar is given one column so it still
    /// occupies the position it was written to.
    #[must_use]
    pub fn new(ch: char) -> Self {
        if ch.is_control() {
            return Self::BLANK;
        }
        Self {
            symbol: Symbol::from_char(ch),
            style: Style::DEFAULT,
            width: width::char_width(ch).max(1),
        }
    }

    /// A cell showing a whole grapheme cluster.
    #[must_use]
    pub fn from_grapheme(cluster: &str) -> Self {
        Self {
            symbol: Symbol::from_grapheme(cluster),
            style: Style::DEFAULT,
            width: width::grapheme_width(cluster).max(1),
        }
    }

    /// The placeholder that follows a wide cell. It shares the owner's
    /// style so the second column gets the same background.
    #[must_use]
    pub const fn continuation(style: Style) -> Self {
        Self {
            symbol: Symbol::EMPTY,
            style,
            width: 0,
        }
    }

    /// Whether this is a continuation placeholder.
    #[inline]
    #[must_use]
    pub const fn is_continuation(&self) -> bool {
        self.width == 0 && self.symbol.is_empty()
    }

    #[inline]
    #[must_use]
    pub const fn is_wide(&self) -> bool {
        self.width == 2
    }

    #[must_use]
    pub const fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub const fn with_fg(mut self, fg: Color) -> Self {
        self.style.fg = fg;
        self
    }

    #[must_use]
    pub const fn with_bg(mut self, bg: Color) -> Self {
        self.style.bg = bg;
        self
    }

    #[must_use]
    pub const fn with_attrs(mut self, attrs: Attr) -> Self {
        self.style.attrs = attrs;
        self
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::BLANK
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_continuation() {
            return write!(f, "Cell(cont)");
        }
        write!(f, "Cell({:?} w{}", self.symbol, self.width)?;
        if self.style != Style::DEFAULT {
            write!(f, " {:?}", self.style)?;
        }
        write!(f, ")")
    }
}
