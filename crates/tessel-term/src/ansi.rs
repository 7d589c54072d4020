// SPDX-License-Identifier: MIT
//
// ANSI escape sequence generation.
//
// Pure functions that write escape sequences to any `impl Write`. No state
// and no decisions about when to emit; the style writer and the terminal
// session make those. This module only knows the byte-level encoding.
//
// Cursor positions are 0-indexed in our API and converted to the 1-indexed
// form the terminal expects.
//
// Writing into `OutputBuffer` (a Vec) never fails; the `io::Result` matters
// only when these are written straight to a terminal.

use std::io::{self, Write};

use serde::Deserialize;

use crate::style::{ATTR_SGR, Attr, Color};

// ─── Cursor ─────────────────────────────────────────────────────────────────

/// Move the cursor to `(x, y)` with CUP.
#[inline]
pub fn cursor_to(w: &mut impl Write, x: u16, y: u16) -> io::Result<()> {
    write!(w, "\x1b[{};{}H", u32::from(y) + 1, u32::from(x) + 1)
}

/// Hide the cursor (DECTCEM reset).
#[inline]
pub fn cursor_hide(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25l")
}

/// Show the cursor (DECTCEM set).
#[inline]
pub fn cursor_show(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25h")
}

// ─── Screen ─────────────────────────────────────────────────────────────────

/// Clear the entire screen (ED 2).
#[inline]
pub fn clear_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[2J")
}

/// Reset all SGR attributes and colors (SGR 0).
///
/// Whoever tracks the terminal's current style must forget it after this.
#[inline]
pub fn reset(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[0m")
}

// ─── Colors ─────────────────────────────────────────────────────────────────

/// Write the SGR parameters (no `ESC[`, no `m`) selecting `color` as
/// foreground, or background when `background` is set.
///
/// Basic colors use the compact 30–37 / 90–97 (40–47 / 100–107) forms,
/// palette colors `38;5;n`, RGB colors `38;2;r;g;b`.
fn color_params(w: &mut impl Write, color: Color, background: bool) -> io::Result<()> {
    let base: u16 = if background { 40 } else { 30 };
    match color {
        Color::Default => write!(w, "{}", base + 9),
        Color::Basic(n) if n < 8 => write!(w, "{}", base + u16::from(n)),
        Color::Basic(n) if n < 16 => write!(w, "{}", base + 60 + u16::from(n - 8)),
        Color::Basic(n) | Color::Palette(n) => write!(w, "{};5;{n}", base + 8),
        Color::Rgb(r, g, b) => write!(w, "{};2;{r};{g};{b}", base + 8),
    }
}

/// Set the foreground color.
pub fn fg(w: &mut impl Write, color: Color) -> io::Result<()> {
    w.write_all(b"\x1b[")?;
    color_params(w, color, false)?;
    w.write_all(b"m")
}

/// Set the background color.
pub fn bg(w: &mut impl Write, color: Color) -> io::Result<()> {
    w.write_all(b"\x1b[")?;
    color_params(w, color, true)?;
    w.write_all(b"m")
}

// ─── Text Attributes ────────────────────────────────────────────────────────

/// Turn on every attribute in `attr` with a single SGR sequence, e.g.
/// `\x1b[1;3;9m` for bold + italic + strikethrough. Writes nothing for an
/// empty set. Attributes are only ever switched off by [`reset`].
pub fn attrs(w: &mut impl Write, attr: Attr) -> io::Result<()> {
    if attr.is_empty() {
        return Ok(());
    }
    w.write_all(b"\x1b[")?;
    let mut first = true;
    for (flag, code) in ATTR_SGR {
        if attr.contains(flag) {
            if !first {
                w.write_all(b";")?;
            }
            w.write_all(code.as_bytes())?;
            first = false;
        }
    }
    w.write_all(b"m")
}

// ─── Synchronized Output ────────────────────────────────────────────────────

/// Begin synchronized output (DEC 2026). The terminal holds the display
/// until [`end_sync`], so a frame never shows half-drawn.
#[inline]
pub fn begin_sync(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?2026h")
}

/// End synchronized output; the terminal presents the frame.
#[inline]
pub fn end_sync(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?2026l")
}

// ─── Alternate Screen ───────────────────────────────────────────────────────

/// Enter the alternate screen buffer (DEC 1049).
#[inline]
pub fn enter_alt_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1049h")
}

/// Leave the alternate screen and restore what was there before.
#[inline]
pub fn exit_alt_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1049l")
}

// ─── Mouse Protocol ─────────────────────────────────────────────────────────

/// How much mouse activity the terminal reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseMode {
    /// No mouse reporting.
    Off,
    /// Press and release (DEC 1000).
    Click,
    /// Press, release, and motion with a button held (DEC 1000 + 1002).
    #[default]
    Drag,
    /// All motion, buttons or not (DEC 1000 + 1002 + 1003).
    Motion,
}

/// Enable SGR mouse reporting (DEC 1006) at the given granularity.
/// Does nothing for [`MouseMode::Off`].
pub fn enable_mouse(w: &mut impl Write, mode: MouseMode) -> io::Result<()> {
    if mode == MouseMode::Off {
        return Ok(());
    }
    w.write_all(b"\x1b[?1000h")?;
    if matches!(mode, MouseMode::Drag | MouseMode::Motion) {
        w.write_all(b"\x1b[?1002h")?;
    }
    if mode == MouseMode::Motion {
        w.write_all(b"\x1b[?1003h")?;
    }
    w.write_all(b"\x1b[?1006h")
}

/// Disable every mouse mode [`enable_mouse`] can turn on.
pub fn disable_mouse(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1006l\x1b[?1003l\x1b[?1002l\x1b[?1000l")
}

// ─── Kitty Keyboard Protocol ────────────────────────────────────────────────

/// Push the "disambiguate escape codes" level of the kitty keyboard
/// protocol. Keys that are ambiguous in legacy encoding (Esc, Ctrl+I vs
/// Tab, ...) then arrive as `CSI codepoint ; modifiers u`.
#[inline]
pub fn enable_kitty_keyboard(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[>1u")
}

/// Pop the kitty keyboard level pushed by [`enable_kitty_keyboard`].
#[inline]
pub fn disable_kitty_keyboard(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[<u")
}

// ─── Bracketed Paste ────────────────────────────────────────────────────────

/// Enable bracketed paste (DEC 2004): pasted text arrives between
/// `\x1b[200~` and `\x1b[201~`.
#[inline]
pub fn enable_bracketed_paste(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?2004h")
}

#[inline]
pub fn disable_bracketed_paste(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?2004l")
}

// ─── Focus Reporting ────────────────────────────────────────────────────────

/// Enable focus reporting (DEC 1004): `\x1b[I` on focus gain, `\x1b[O`
/// on loss.
#[inline]
pub fn enable_focus_reporting(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1004h")
}

#[inline]
pub fn disable_focus_reporting(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1004l")
}

// ─── Tests ──────────────────────────────────────────────────────────────────
