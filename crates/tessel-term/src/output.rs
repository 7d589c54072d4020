// SPDX-License-Identifier: MIT
//
// Output buffering and stateful cell rendering.
//
// Two components work together to minimize terminal I/O:
//
//   OutputBuffer: accumulates a whole frame's bytes in memory so the frame
//   reaches the terminal in a single write. The buffer is owned by the
//   renderer and reused, cleared rather than reallocated, every frame.
//
//   CellWriter: tracks what the terminal currently has (cursor position and
//   active style) and emits only what changes. Consecutive cells on a row
//   need no cursor move; a run of cells in the same style needs no SGR.
//
// Style changes follow one rule. Colors and added attributes are emitted
// as targeted SGR codes. Removing any attribute takes a full reset (SGR 0)
// followed by everything the new style needs, because per-attribute "off"
// codes are not reliable across terminals.

use std::io::{self, Write};

use crate::ansi;
use crate::cell::{Cell, Symbol};
use crate::error::{Error, Result};
use crate::style::{ColorDepth, Style};

// ─── OutputBuffer ───────────────────────────────────────────────────────────

const DEFAULT_CAPACITY: usize = 16_384;

/// Frame-sized byte arena flushed with one `write_all`.
pub struct OutputBuffer {
    buf: Vec<u8>,
}

impl OutputBuffer {
    /// An empty buffer with 16 KB of capacity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(DEFAULT_CAPACITY),
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Make room for at least `additional` more bytes without aborting on
    /// allocation failure.
    ///
    /// # Errors
    ///
    /// [`Error::Alloc`] if the reservation fails. The buffer is unchanged.
    pub fn reserve_frame(&mut self, additional: usize) -> Result<()> {
        self.buf
            .try_reserve(additional)
            .map_err(|_| Error::Alloc { cells: additional })
    }

    /// Append a cell symbol's UTF-8 bytes.
    #[inline]
    pub fn write_symbol(&mut self, symbol: &Symbol) {
        self.buf.extend_from_slice(symbol.as_bytes());
    }

    #[inline]
    pub fn push(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    /// Forget the contents, keeping the allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Drop everything written after the first `len` bytes.
    #[inline]
    pub fn truncate(&mut self, len: usize) {
        self.buf.truncate(len);
    }
}

impl Write for OutputBuffer {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── CellWriter ─────────────────────────────────────────────────────────────

/// Emits cells while tracking the terminal's cursor and active style.
///
/// - **Cursor**: `cursor` is where the next printed character will land
///   without a move. It is `None` when unknown: before the first cell,
///   after a screen clear, and after printing into the last column (the
///   terminal is then in its pending-wrap state).
/// - **Style**: `style` is the SGR state the terminal has. `None` means
///   unknown and forces a reset before the next cell.
/// - **Color depth**: styles are mapped to the configured depth before
///   comparison, so two RGB colors that land on the same palette entry do
///   not cause redundant SGR output.
pub struct CellWriter {
    cursor: Option<(u16, u16)>,
    style: Option<Style>,
    depth: ColorDepth,
}

impl CellWriter {
    #[must_use]
    pub const fn new(depth: ColorDepth) -> Self {
        Self {
            cursor: None,
            style: None,
            depth,
        }
    }

    /// Forget everything known about the terminal. Call after anything
    /// else may have written to it, or after a failed flush.
    pub const fn reset_state(&mut self) {
        self.cursor = None;
        self.style = None;
    }

    /// Record that an SGR 0 was written outside the writer.
    pub const fn note_reset(&mut self) {
        self.style = Some(Style::DEFAULT);
    }

    /// Record an explicit cursor placement written outside the writer.
    pub const fn note_cursor(&mut self, pos: Option<(u16, u16)>) {
        self.cursor = pos;
    }

    #[must_use]
    pub const fn cursor(&self) -> Option<(u16, u16)> {
        self.cursor
    }

    #[must_use]
    pub const fn style(&self) -> Option<Style> {
        self.style
    }

    /// Emit the cell at `(x, y)` of a row `row_width` columns wide.
    ///
    /// A wide cell advances the cursor two columns. Continuation
    /// placeholders and wide cells with no room for their second column
    /// are drawn as a single space, so the terminal's cursor never runs
    /// ahead of the grid.
    pub fn write_cell(&mut self, out: &mut OutputBuffer, x: u16, y: u16, cell: &Cell, row_width: u16) {
        if self.cursor != Some((x, y)) {
            ansi::cursor_to(out, x, y).ok();
        }

        self.apply_style(out, cell.style);

        let fits_wide = u32::from(x) + 1 < u32::from(row_width);
        let advance: u32 = if cell.symbol.is_empty() || cell.width == 0 {
            out.push(b' ');
            1
        } else if cell.width >= 2 && !fits_wide {
            out.push(b' ');
            1
        } else {
            out.write_symbol(&cell.symbol);
            u32::from(cell.width.min(2))
        };

        let next = u32::from(x) + advance;
        self.cursor = u16::try_from(next)
            .ok()
            .filter(|&nx| nx < row_width)
            .map(|nx| (nx, y));
    }

    /// Bring the terminal from the tracked style to `style`.
    pub fn apply_style(&mut self, out: &mut OutputBuffer, style: Style) {
        let next = style.downgrade(self.depth);
        match self.style {
            Some(prev) if prev == next => {}
            Some(prev) if next.attrs.contains(prev.attrs) => {
                if prev.fg != next.fg {
                    ansi::fg(out, next.fg).ok();
                }
                if prev.bg != next.bg {
                    ansi::bg(out, next.bg).ok();
                }
                ansi::attrs(out, next.attrs.difference(prev.attrs)).ok();
            }
            _ => {
                ansi::reset(out).ok();
                ansi::attrs(out, next.attrs).ok();
                if !next.fg.is_default() {
                    ansi::fg(out, next.fg).ok();
                }
                if !next.bg.is_default() {
                    ansi::bg(out, next.bg).ok();
                }
            }
        }
        self.style = Some(next);
    }

    /// Leave the terminal in the default style at the end of a frame so
    /// nothing outside the grid inherits the last cell's colors.
    pub fn finish_frame(&mut self, out: &mut OutputBuffer) {
        if self.style != Some(Style::DEFAULT) {
            ansi::reset(out).ok();
            self.style = Some(Style::DEFAULT);
        }
    }
}

impl Default for CellWriter {
    fn default() -> Self {
        Self::new(ColorDepth::TrueColor)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
