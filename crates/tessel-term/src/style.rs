// SPDX-License-Identifier: MIT
//
// Colors, text attributes, and the Style that carries both.
//
// A Style is what a cell looks like apart from its glyph: foreground,
// background, and a bitset of SGR attributes. Styles are small `Copy`
// values compared on every cell of every frame by the diff renderer, so
// they stay plain data with derived equality.
//
// Color depth: cells always store the color the application asked for.
// Downgrading RGB to the 256-color palette or to the basic 16 happens at
// output time (see `CellWriter`), so one buffer renders correctly on any
// terminal and diffing is unaffected by the terminal's capabilities.

use serde::Deserialize;

// ─── Color ──────────────────────────────────────────────────────────────────

/// A terminal color.
///
/// `Basic` indices 0–7 are the standard colors, 8–15 their bright
/// variants; values above 15 are emitted as palette indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    /// The terminal's own foreground/background.
    #[default]
    Default,
    /// One of the 16 basic colors (`ESC[30–37m`, `ESC[90–97m`).
    Basic(u8),
    /// An index into the 256-color palette (`ESC[38;5;nm`).
    Palette(u8),
    /// 24-bit color (`ESC[38;2;r;g;bm`).
    Rgb(u8, u8, u8),
}

impl Color {
    pub const BLACK: Self = Self::Basic(0);
    pub const RED: Self = Self::Basic(1);
    pub const GREEN: Self = Self::Basic(2);
    pub const YELLOW: Self = Self::Basic(3);
    pub const BLUE: Self = Self::Basic(4);
    pub const MAGENTA: Self = Self::Basic(5);
    pub const CYAN: Self = Self::Basic(6);
    pub const WHITE: Self = Self::Basic(7);
    pub const BRIGHT_BLACK: Self = Self::Basic(8);
    pub const BRIGHT_RED: Self = Self::Basic(9);
    pub const BRIGHT_GREEN: Self = Self::Basic(10);
    pub const BRIGHT_YELLOW: Self = Self::Basic(11);
    pub const BRIGHT_BLUE: Self = Self::Basic(12);
    pub const BRIGHT_MAGENTA: Self = Self::Basic(13);
    pub const BRIGHT_CYAN: Self = Self::Basic(14);
    pub const BRIGHT_WHITE: Self = Self::Basic(15);

    /// Whether this is [`Color::Default`].
    #[inline]
    #[must_use]
    pub const fn is_default(self) -> bool {
        matches!(self, Self::Default)
    }

    /// Parse `#RGB` or `#RRGGBB` (the `#` is optional).
    ///
    /// ```
    /// use tessel_term::style::Color;
    ///
    /// assert_eq!(Color::from_hex("#ff8000"), Some(Color::Rgb(255, 128, 0)));
    /// assert_eq!(Color::from_hex("0f0"), Some(Color::Rgb(0, 255, 0)));
    /// assert_eq!(Color::from_hex("#12345"), None);
    /// ```
    #[must_use]
    pub fn from_hex(s: &str) -> Option<Self> {
        let s = s.strip_prefix('#').unwrap_or(s);
        let b = s.as_bytes();
        match b.len() {
            3 => {
                let r = hex_digit(b[0])?;
                let g = hex_digit(b[1])?;
                let bl = hex_digit(b[2])?;
                Some(Self::Rgb(r << 4 | r, g << 4 | g, bl << 4 | bl))
            }
            6 => Some(Self::Rgb(
                hex_byte(b[0], b[1])?,
                hex_byte(b[2], b[3])?,
                hex_byte(b[4], b[5])?,
            )),
            _ => None,
        }
    }

    /// Approximate RGB value, or `None` for [`Color::Default`].
    #[must_use]
    pub const fn to_rgb(self) -> Option<(u8, u8, u8)> {
        match self {
            Self::Default => None,
            Self::Basic(n) => Some(BASIC_RGB[(n & 0x0F) as usize]),
            Self::Palette(n) => Some(palette_to_rgb(n)),
            Self::Rgb(r, g, b) => Some((r, g, b)),
        }
    }

    /// Map this color onto what a terminal with `depth` can show.
    ///
    /// `Default` and colors already within the depth pass through.
    #[must_use]
    pub fn downgrade(self, depth: ColorDepth) -> Self {
        match (depth, self) {
            (ColorDepth::TrueColor, c) | (_, c @ (Self::Default | Self::Basic(_))) => c,
            (ColorDepth::Palette, Self::Rgb(r, g, b)) => Self::Palette(nearest_palette(r, g, b)),
            (ColorDepth::Palette, c @ Self::Palette(_)) => c,
            (ColorDepth::Basic, Self::Palette(n)) if n < 16 => Self::Basic(n),
            (ColorDepth::Basic, c) => c
                .to_rgb()
                .map_or(c, |(r, g, b)| Self::Basic(nearest_basic(r, g, b))),
        }
    }
}

/// How many colors the terminal can display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorDepth {
    /// 24-bit color.
    #[default]
    TrueColor,
    /// The xterm 256-color palette.
    Palette,
    /// The 16 basic colors only.
    Basic,
}

// ─── Palette tables ─────────────────────────────────────────────────────────

/// The basic 16 colors as RGB, using the xterm defaults. Individual
/// terminals may theme these; they only serve nearest-match lookups.
const BASIC_RGB: [(u8, u8, u8); 16] = [
    (0, 0, 0),
    (128, 0, 0),
    (0, 128, 0),
    (128, 128, 0),
    (0, 0, 128),
    (128, 0, 128),
    (0, 128, 128),
    (192, 192, 192),
    (128, 128, 128),
    (255, 0, 0),
    (0, 255, 0),
    (255, 255, 0),
    (0, 0, 255),
    (255, 0, 255),
    (0, 255, 255),
    (255, 255, 255),
];

/// Channel levels of the 6×6×6 cube (indices 16–231).
const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];

/// RGB value of a 256-palette index.
#[must_use]
pub const fn palette_to_rgb(idx: u8) -> (u8, u8, u8) {
    match idx {
        0..=15 => BASIC_RGB[idx as usize],
        16..=231 => {
            let i = idx - 16;
            (
                CUBE_LEVELS[(i / 36) as usize],
                CUBE_LEVELS[((i % 36) / 6) as usize],
                CUBE_LEVELS[(i % 6) as usize],
            )
        }
        232..=255 => {
            let v = 8 + 10 * (idx - 232);
            (v, v, v)
        }
    }
}

/// Nearest 256-palette index for an RGB value.
///
/// Compares the closest cube entry against the closest grey-ramp entry;
/// the basic 16 are skipped because terminals theme them.
#[must_use]
pub fn nearest_palette(r: u8, g: u8, b: u8) -> u8 {
    let (ri, gi, bi) = (cube_level(r), cube_level(g), cube_level(b));
    let cube = 16 + 36 * ri + 6 * gi + bi;

    let avg = (u16::from(r) + u16::from(g) + u16::from(b)) / 3;
    // Ramp step n is 8 + 10n; round to the nearest step, clamp to 0..=23.
    #[allow(clippy::cast_possible_truncation)]
    let grey = 232 + (avg.saturating_sub(3) / 10).min(23) as u8;

    if distance((r, g, b), palette_to_rgb(grey)) < distance((r, g, b), palette_to_rgb(cube)) {
        grey
    } else {
        cube
    }
}

/// Index (0–5) of the cube level closest to one channel value.
fn cube_level(c: u8) -> u8 {
    let mut best = 0u8;
    for (i, &l) in (0u8..).zip(CUBE_LEVELS.iter()) {
        if c.abs_diff(l) < c.abs_diff(CUBE_LEVELS[usize::from(best)]) {
            best = i;
        }
    }
    best
}

/// Nearest basic color (0–15) for an RGB value.
#[must_use]
pub fn nearest_basic(r: u8, g: u8, b: u8) -> u8 {
    let mut best = 0u8;
    let mut best_dist = u32::MAX;
    for (idx, &rgb) in (0u8..).zip(BASIC_RGB.iter()) {
        let d = distance((r, g, b), rgb);
        if d < best_dist {
            best_dist = d;
            best = idx;
        }
    }
    best
}

/// Squared Euclidean distance in RGB space.
fn distance(a: (u8, u8, u8), b: (u8, u8, u8)) -> u32 {
    let dr = u32::from(a.0.abs_diff(b.0));
    let dg = u32::from(a.1.abs_diff(b.1));
    let db = u32::from(a.2.abs_diff(b.2));
    dr * dr + dg * dg + db * db
}

const fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

fn hex_byte(hi: u8, lo: u8) -> Option<u8> {
    Some(hex_digit(hi)? << 4 | hex_digit(lo)?)
}

// ─── Attributes ─────────────────────────────────────────────────────────────

bitflags::bitflags! {
    /// Text attributes, one bit per SGR code.
    ///
    /// ```
    /// use tessel_term::style::Attr;
    ///
    /// let a = Attr::BOLD | Attr::ITALIC;
    /// assert!(a.contains(Attr::BOLD));
    /// assert!(!a.contains(Attr::DIM));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Attr: u16 {
        /// SGR 1.
        const BOLD             = 1 << 0;
        /// SGR 2.
        const DIM              = 1 << 1;
        /// SGR 3.
        const ITALIC           = 1 << 2;
        /// SGR 4.
        const UNDERLINE        = 1 << 3;
        /// SGR 21.
        const DOUBLE_UNDERLINE = 1 << 4;
        /// SGR 5.
        const BLINK            = 1 << 5;
        /// SGR 7, swap foreground and background.
        const REVERSE          = 1 << 6;
        /// SGR 8.
        const HIDDEN           = 1 << 7;
        /// SGR 9.
        const STRIKETHROUGH    = 1 << 8;
        /// SGR 53.
        const OVERLINE         = 1 << 9;
    }
}

/// SGR parameter for each attribute, in emission order.
pub const ATTR_SGR: [(Attr, &str); 10] = [
    (Attr::BOLD, "1"),
    (Attr::DIM, "2"),
    (Attr::ITALIC, "3"),
    (Attr::UNDERLINE, "4"),
    (Attr::BLINK, "5"),
    (Attr::REVERSE, "7"),
    (Attr::HIDDEN, "8"),
    (Attr::STRIKETHROUGH, "9"),
    (Attr::DOUBLE_UNDERLINE, "21"),
    (Attr::OVERLINE, "53"),
];

// ─── Style ──────────────────────────────────────────────────────────────────

/// Foreground, background, and attributes of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Style {
    pub fg: Color,
    pub bg: Color,
    pub attrs: Attr,
}

impl Style {
    /// The terminal's default look: default colors, no attributes.
    pub const DEFAULT: Self = Self {
        fg: Color::Default,
        bg: Color::Default,
        attrs: Attr::empty(),
    };

    #[must_use]
    pub const fn new() -> Self {
        Self::DEFAULT
    }

    #[must_use]
    pub const fn fg(mut self, fg: Color) -> Self {
        self.fg = fg;
        self
    }

    #[must_use]
    pub const fn bg(mut self, bg: Color) -> Self {
        self.bg = bg;
        self
    }

    /// Add attributes to this style.
    #[must_use]
    pub const fn attrs(mut self, attrs: Attr) -> Self {
        self.attrs = self.attrs.union(attrs);
        self
    }

    /// Layer `overlay` on top of `self`.
    ///
    /// The overlay's non-default colors replace ours; attributes are
    /// unioned. Merging can only add attributes. Removing one means
    /// building a new style, and the renderer then takes the
    /// reset-and-reapply path.
    ///
    /// ```
    /// use tessel_term::style::{Attr, Color, Style};
    ///
    /// let base = Style::new().fg(Color::RED).bg(Color::BLUE).attrs(Attr::BOLD);
    /// let over = Style::new().fg(Color::GREEN).attrs(Attr::ITALIC);
    /// let merged = base.merge(over);
    /// assert_eq!(merged.fg, Color::GREEN);
    /// assert_eq!(merged.bg, Color::BLUE);
    /// assert_eq!(merged.attrs, Attr::BOLD | Attr::ITALIC);
    /// ```
    #[must_use]
    pub const fn merge(self, overlay: Self) -> Self {
        Self {
            fg: if overlay.fg.is_default() { self.fg } else { overlay.fg },
            bg: if overlay.bg.is_default() { self.bg } else { overlay.bg },
            attrs: self.attrs.union(overlay.attrs),
        }
    }

    /// This style with both colors mapped to `depth`.
    #[must_use]
    pub fn downgrade(self, depth: ColorDepth) -> Self {
        Self {
            fg: self.fg.downgrade(depth),
            bg: self.bg.downgrade(depth),
            attrs: self.attrs,
        }
    }
}
