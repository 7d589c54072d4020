// SPDX-License-Identifier: MIT
//
// Screen: the 2D cell grid every widget paints to.
//
// The frame loop owns one Screen. Widgets draw into it through SubScreen
// views, each of which is clipped to a rectangle of the parent. The diff
// renderer then compares the Screen against its previous-frame snapshot
// and emits escape sequences only for the cells that changed.
//
// Layout:
//
//   - Flat `Vec<Cell>`, row-major: `index = y * width + x`. A row is a
//     contiguous slice, so the renderer can skip unchanged rows with a
//     single slice comparison.
//
//   - Drawing primitives live on the `Surface` trait, implemented by both
//     Screen and SubScreen. They use a pen (cursor position + current
//     style) and never wrap: text that runs past the right edge is dropped.
//
//   - Every write goes through `Screen::write_cell` with a clip rectangle
//     in screen coordinates. For the Screen itself the clip is the whole
//     grid; for a SubScreen it is the view's window. Nothing outside the
//     clip is ever touched, including wide-character cleanup.
//
// Wide characters:
//
//   A wide cell at column x is followed by a continuation placeholder at
//   x+1. Overwriting either half breaks the pair: the surviving half is
//   blanked (keeping its style so backgrounds stay intact). A wide cell
//   written at the last column of the row keeps width 2 with no
//   placeholder; the renderer draws it as a space. A wide cell whose
//   second column falls outside the clip becomes a blank, since half a
//   glyph cannot be shown. A pair already straddling the clip edge belongs
//   to the outside: writes onto its inside half are refused.

use std::fmt;

use unicode_segmentation::UnicodeSegmentation;

use crate::cell::Cell;
use crate::error::{Error, Result};
use crate::style::Style;
use crate::width;

// ─── Rect ───────────────────────────────────────────────────────────────────

/// An axis-aligned rectangle of cells.
///
/// ```
/// use tessel_term::buffer::Rect;
///
/// let r = Rect::new(10, 5, 4, 2);
/// assert!(r.contains(10, 5));
/// assert!(r.contains(13, 6));
/// assert!(!r.contains(14, 5));
/// assert_eq!(r.intersect(Rect::new(12, 0, 10, 10)), Rect::new(12, 5, 2, 2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    #[inline]
    #[must_use]
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self { x, y, width, height }
    }

    /// Right edge, exclusive. Computed wide so it cannot overflow.
    #[inline]
    #[must_use]
    pub const fn right(self) -> u32 {
        self.x as u32 + self.width as u32
    }

    /// Bottom edge, exclusive.
    #[inline]
    #[must_use]
    pub const fn bottom(self) -> u32 {
        self.y as u32 + self.height as u32
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Number of cells covered.
    #[inline]
    #[must_use]
    pub const fn area(self) -> usize {
        self.width as usize * self.height as usize
    }

    #[inline]
    #[must_use]
    pub const fn contains(self, px: u16, py: u16) -> bool {
        px >= self.x && (px as u32) < self.right() && py >= self.y && (py as u32) < self.bottom()
    }

    /// The overlap of two rectangles. Disjoint rectangles give an empty
    /// rectangle anchored at the larger origin.
    #[must_use]
    pub fn intersect(self, other: Self) -> Self {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());
        // Both spans are bounded by an input width/height, so they fit u16.
        #[allow(clippy::cast_possible_truncation)]
        Self {
            x: x1,
            y: y1,
            width: x2.saturating_sub(u32::from(x1)) as u16,
            height: y2.saturating_sub(u32::from(y1)) as u16,
        }
    }
}

// ─── Pen ────────────────────────────────────────────────────────────────────

/// Cursor position and current style used by the text primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pen {
    pub x: u16,
    pub y: u16,
    pub style: Style,
}

// ─── Border styles ──────────────────────────────────────────────────────────

/// Line set used by [`Surface::draw_box`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BorderStyle {
    #[default]
    Single,
    Double,
    Rounded,
    Heavy,
    Ascii,
}

/// The six glyphs of a box border.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorderGlyphs {
    pub top_left: char,
    pub top_right: char,
    pub bottom_left: char,
    pub bottom_right: char,
    pub horizontal: char,
    pub vertical: char,
}

impl BorderStyle {
    #[must_use]
    pub const fn glyphs(self) -> BorderGlyphs {
        let (top_left, top_right, bottom_left, bottom_right, horizontal, vertical) = match self {
            Self::Single => ('┌', '┐', '└', '┘', '─', '│'),
            Self::Double => ('╔', '╗', '╚', '╝', '═', '║'),
            Self::Rounded => ('╭', '╮', '╰', '╯', '─', '│'),
            Self::Heavy => ('┏', '┓', '┗', '┛', '━', '┃'),
            Self::Ascii => ('+', '+', '+', '+', '-', '|'),
        };
        BorderGlyphs {
            top_left,
            top_right,
            bottom_left,
            bottom_right,
            horizontal,
            vertical,
        }
    }
}

// ─── Surface ────────────────────────────────────────────────────────────────

/// Drawing primitives shared by [`Screen`] and [`SubScreen`].
///
/// Coordinates are local to the surface. Anything outside
/// `[0, width) × [0, height)` is silently dropped.
pub trait Surface {
    fn width(&self) -> u16;
    fn height(&self) -> u16;

    /// The cell at `(x, y)`, or `None` outside the surface.
    fn get_cell(&self, x: u16, y: u16) -> Option<&Cell>;

    /// Write one cell, handling wide-character pairing. Returns whether
    /// the cell was written: `false` outside the surface, or on half of a
    /// wide character that extends past it.
    ///
    /// Cells with width 0 are refused; placeholders are created and
    /// removed by the surface itself.
    fn set_cell(&mut self, x: u16, y: u16, cell: Cell) -> bool;

    fn pen(&self) -> &Pen;
    fn pen_mut(&mut self) -> &mut Pen;

    /// The whole surface as a local rectangle.
    fn area(&self) -> Rect {
        Rect::new(0, 0, self.width(), self.height())
    }

    /// Move the pen, clamped to the surface.
    fn move_cursor(&mut self, x: u16, y: u16) {
        let (w, h) = (self.width(), self.height());
        let pen = self.pen_mut();
        pen.x = x.min(w.saturating_sub(1));
        pen.y = y.min(h.saturating_sub(1));
    }

    /// Style applied by subsequent text and line primitives.
    fn set_style(&mut self, style: Style) {
        self.pen_mut().style = style;
    }

    /// Write `ch` at the pen and advance by its width.
    ///
    /// Control characters are ignored. A zero-width character (combining
    /// mark, variation selector, ZWJ) joins the previous cell's symbol
    /// instead of taking a column of its own.
    fn put_char(&mut self, ch: char) {
        if ch.is_control() {
            return;
        }
        let Pen { x, y, style } = *self.pen();
        let w = width::char_width(ch);
        if w == 0 {
            attach_to_previous(self, x, y, ch);
            return;
        }
        self.set_cell(x, y, Cell::new(ch).with_style(style));
        self.pen_mut().x = x.saturating_add(u16::from(w));
    }

    /// Write `s` grapheme by grapheme from the pen. Returns the number of
    /// columns the pen advanced. No line wrapping happens here.
    fn put_string(&mut self, s: &str) -> u16 {
        let start = self.pen().x;
        for g in s.graphemes(true) {
            let w = width::grapheme_width(g);
            if w == 0 {
                g.chars().for_each(|ch| self.put_char(ch));
                continue;
            }
            let Pen { x, y, style } = *self.pen();
            let mut cell = Cell::from_grapheme(g).with_style(style);
            cell.width = w;
            self.set_cell(x, y, cell);
            self.pen_mut().x = x.saturating_add(u16::from(w));
        }
        self.pen().x.saturating_sub(start)
    }

    /// Horizontal run of `len` columns of `ch` in the pen style.
    fn hline(&mut self, x: u16, y: u16, len: u16, ch: char) {
        let cell = Cell::new(ch).with_style(self.pen().style);
        let step = u32::from(cell.width.max(1));
        let end = u32::from(x) + u32::from(len);
        let mut col = u32::from(x);
        while col + step <= end {
            let Ok(cx) = u16::try_from(col) else { break };
            self.set_cell(cx, y, cell);
            col += step;
        }
    }

    /// Vertical run of `len` rows of `ch` in the pen style.
    fn vline(&mut self, x: u16, y: u16, len: u16, ch: char) {
        let cell = Cell::new(ch).with_style(self.pen().style);
        for row in y..y.saturating_add(len) {
            self.set_cell(x, row, cell);
        }
    }

    /// Fill `rect` with `ch` in the pen style.
    fn fill(&mut self, rect: Rect, ch: char) {
        let rect = rect.intersect(self.area());
        for row in rect.y..rect.y + rect.height {
            self.hline(rect.x, row, rect.width, ch);
        }
    }

    /// Border around `rect` in the pen style. Rectangles smaller than
    /// 2×2 have no room for corners and are left alone.
    fn draw_box(&mut self, rect: Rect, border: BorderStyle) {
        if rect.width < 2 || rect.height < 2 {
            return;
        }
        let g = border.glyphs();
        let style = self.pen().style;
        let right = rect.x.saturating_add(rect.width - 1);
        let bottom = rect.y.saturating_add(rect.height - 1);

        let (inner_x, inner_y) = (rect.x.saturating_add(1), rect.y.saturating_add(1));
        self.hline(inner_x, rect.y, rect.width - 2, g.horizontal);
        self.hline(inner_x, bottom, rect.width - 2, g.horizontal);
        self.vline(rect.x, inner_y, rect.height - 2, g.vertical);
        self.vline(right, inner_y, rect.height - 2, g.vertical);

        self.set_cell(rect.x, rect.y, Cell::new(g.top_left).with_style(style));
        self.set_cell(right, rect.y, Cell::new(g.top_right).with_style(style));
        self.set_cell(rect.x, bottom, Cell::new(g.bottom_left).with_style(style));
        self.set_cell(right, bottom, Cell::new(g.bottom_right).with_style(style));
    }

    /// Blank every cell and home the pen.
    fn clear(&mut self) {
        self.clear_with(Style::DEFAULT);
    }

    /// Blank every cell with `style` (typically a background) and home
    /// the pen.
    fn clear_with(&mut self, style: Style) {
        let blank = Cell::BLANK.with_style(style);
        for y in 0..self.height() {
            for x in 0..self.width() {
                self.set_cell(x, y, blank);
            }
        }
        let pen = self.pen_mut();
        pen.x = 0;
        pen.y = 0;
    }
}

/// Join a zero-width scalar to the cell left of `(x, y)`.
fn attach_to_previous<S: Surface + ?Sized>(surface: &mut S, x: u16, y: u16, ch: char) {
    if x == 0 {
        return;
    }
    let mut px = x - 1;
    if surface.get_cell(px, y).is_some_and(Cell::is_continuation) && px > 0 {
        px -= 1;
    }
    let Some(mut cell) = surface.get_cell(px, y).copied() else {
        return;
    };
    if cell.symbol.push(ch) {
        // VS16 asks for emoji presentation; widen the base.
        if cell.width == 1 && width::grapheme_width(cell.symbol.as_str()) == 2 {
            cell.width = 2;
            surface.set_cell(px, y, cell);
            let pen = surface.pen_mut();
            pen.x = pen.x.max(px.saturating_add(2));
        } else {
            surface.set_cell(px, y, cell);
        }
    }
}

// ─── Screen ─────────────────────────────────────────────────────────────────

/// The root cell grid of a terminal session.
///
/// ```
/// use tessel_term::buffer::{Screen, Surface};
/// use tessel_term::cell::Cell;
///
/// let mut screen = Screen::new(80, 24).unwrap();
/// screen.set_cell(5, 3, Cell::new('X'));
/// assert_eq!(screen.get_cell(5, 3).unwrap().symbol.as_str(), "X");
/// assert!(screen.get_cell(80, 0).is_none());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Screen {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
    pen: Pen,
}

fn alloc_cells(width: u16, height: u16) -> Result<Vec<Cell>> {
    let len = usize::from(width) * usize::from(height);
    let mut cells = Vec::new();
    cells
        .try_reserve_exact(len)
        .map_err(|_| Error::Alloc { cells: len })?;
    cells.resize(len, Cell::BLANK);
    Ok(cells)
}

impl Screen {
    // ─── Construction ────────────────────────────────────────────────────

    /// A blank `width × height` grid.
    ///
    /// # Errors
    ///
    /// [`Error::Alloc`] if the cell storage cannot be reserved.
    pub fn new(width: u16, height: u16) -> Result<Self> {
        Ok(Self {
            width,
            height,
            cells: alloc_cells(width, height)?,
            pen: Pen::default(),
        })
    }

    /// A deep copy that reports allocation failure instead of aborting.
    ///
    /// # Errors
    ///
    /// [`Error::Alloc`] if the copy cannot be reserved.
    pub fn try_clone(&self) -> Result<Self> {
        let mut cells = Vec::new();
        cells
            .try_reserve_exact(self.cells.len())
            .map_err(|_| Error::Alloc {
                cells: self.cells.len(),
            })?;
        cells.extend_from_slice(&self.cells);
        Ok(Self {
            width: self.width,
            height: self.height,
            cells,
            pen: self.pen,
        })
    }

    /// Change dimensions, keeping the overlapping top-left region.
    ///
    /// New area is blank. A wide character cut by the new right edge
    /// keeps width 2 at the last column, as if it had been written there.
    /// The pen is clamped to the new bounds. On allocation failure the
    /// screen is unchanged.
    ///
    /// # Errors
    ///
    /// [`Error::Alloc`] if the new storage cannot be reserved.
    pub fn resize(&mut self, width: u16, height: u16) -> Result<()> {
        if width == self.width && height == self.height {
            return Ok(());
        }
        let mut cells = alloc_cells(width, height)?;
        let keep_w = usize::from(self.width.min(width));
        let keep_h = usize::from(self.height.min(height));
        let (old_w, new_w) = (usize::from(self.width), usize::from(width));
        for row in 0..keep_h {
            cells[row * new_w..row * new_w + keep_w]
                .copy_from_slice(&self.cells[row * old_w..row * old_w + keep_w]);
        }
        self.cells = cells;
        self.width = width;
        self.height = height;
        for y in 0..height {
            self.repair_row(y);
        }
        self.pen.x = self.pen.x.min(width.saturating_sub(1));
        self.pen.y = self.pen.y.min(height.saturating_sub(1));
        Ok(())
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    #[inline]
    #[must_use]
    pub fn total_cells(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    const fn index(&self, x: u16, y: u16) -> usize {
        y as usize * self.width as usize + x as usize
    }

    #[inline]
    #[must_use]
    pub const fn in_bounds(&self, x: u16, y: u16) -> bool {
        x < self.width && y < self.height
    }

    /// The raw cell slice, row-major.
    #[inline]
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Row `y` as a slice, or `None` past the bottom.
    #[must_use]
    pub fn get_row(&self, y: u16) -> Option<&[Cell]> {
        if y >= self.height {
            return None;
        }
        let start = self.index(0, y);
        Some(&self.cells[start..start + usize::from(self.width)])
    }

    // ─── Views ───────────────────────────────────────────────────────────

    /// A clipped view of `(x, y, w, h)`. The window is cut to the
    /// screen's bounds, so `width()`/`height()` on the view report what
    /// is actually drawable.
    pub fn sub_region(&mut self, x: u16, y: u16, w: u16, h: u16) -> SubScreen<'_> {
        let window = Rect::new(x, y, w, h).intersect(self.bounds());
        SubScreen::new(self, window)
    }

    /// A view covering the whole screen.
    pub fn full_region(&mut self) -> SubScreen<'_> {
        let window = self.bounds();
        SubScreen::new(self, window)
    }

    #[inline]
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    // ─── Copying ─────────────────────────────────────────────────────────

    /// Copy `src_rect` of `src` so its top-left lands at `(dst_x, dst_y)`.
    ///
    /// Cells outside either screen are skipped. Wide characters cut by
    /// the copied rectangle's edges are repaired afterwards.
    pub fn blit(&mut self, src: &Self, src_rect: Rect, dst_x: u16, dst_y: u16) {
        let src_rect = src_rect.intersect(src.bounds());
        if src_rect.is_empty() {
            return;
        }
        let mut touched = Vec::new();
        for dy in 0..src_rect.height {
            let sy = src_rect.y + dy;
            let Some(ty) = dst_y.checked_add(dy).filter(|&ty| ty < self.height) else {
                break;
            };
            let Some(src_row) = src.get_row(sy) else { break };
            for dx in 0..src_rect.width {
                let Some(tx) = dst_x.checked_add(dx).filter(|&tx| tx < self.width) else {
                    break;
                };
                let idx = self.index(tx, ty);
                self.cells[idx] = src_row[usize::from(src_rect.x + dx)];
            }
            touched.push(ty);
        }
        for y in touched {
            self.repair_row(y);
        }
    }

    /// Overwrite this screen with `other`'s cells, reusing storage when
    /// the dimensions match.
    ///
    /// # Errors
    ///
    /// [`Error::Alloc`] if the dimensions differ and the new storage
    /// cannot be reserved. `self` is unchanged in that case.
    pub fn copy_from(&mut self, other: &Self) -> Result<()> {
        if self.cells.len() == other.cells.len() {
            self.cells.copy_from_slice(&other.cells);
            self.width = other.width;
            self.height = other.height;
        } else {
            *self = other.try_clone()?;
        }
        Ok(())
    }

    // ─── Internals ───────────────────────────────────────────────────────

    /// The single write path. `clip` is in screen coordinates; nothing
    /// outside it is modified.
    ///
    /// A wide pair cut by the clip edge belongs to whoever owns the other
    /// half, so a write landing on its inside half is refused.
    pub(crate) fn write_cell(&mut self, x: u16, y: u16, mut cell: Cell, clip: Rect) -> bool {
        if !self.in_bounds(x, y) || !clip.contains(x, y) || cell.width == 0 {
            return false;
        }
        if self.straddles(x, y, clip) {
            return false;
        }
        self.break_wide_at(x, y);
        let idx = self.index(x, y);
        if cell.width == 1 {
            self.cells[idx] = cell;
            return true;
        }
        cell.width = 2;
        let next = x + 1;
        if next >= self.width {
            self.cells[idx] = cell;
        } else if clip.contains(next, y) && !self.straddles(next, y, clip) {
            self.break_wide_at(next, y);
            self.cells[idx] = cell;
            self.cells[idx + 1] = Cell::continuation(cell.style);
        } else {
            self.cells[idx] = Cell::BLANK.with_style(cell.style);
        }
        true
    }

    /// Whether `(x, y)` is half of a wide pair whose other half lies
    /// outside `clip`.
    fn straddles(&self, x: u16, y: u16, clip: Rect) -> bool {
        let cur = self.cells[self.index(x, y)];
        (cur.is_continuation() && x > 0 && !clip.contains(x - 1, y))
            || (cur.is_wide() && x + 1 < self.width && !clip.contains(x + 1, y))
    }

    /// Break any wide pair that `(x, y)` is half of.
    fn break_wide_at(&mut self, x: u16, y: u16) {
        let idx = self.index(x, y);
        let cur = self.cells[idx];
        if cur.is_continuation() && x > 0 {
            let owner = &mut self.cells[idx - 1];
            if owner.is_wide() {
                *owner = Cell::BLANK.with_style(owner.style);
            }
        }
        if cur.is_wide() && x + 1 < self.width {
            let cont = &mut self.cells[idx + 1];
            if cont.is_continuation() {
                *cont = Cell::BLANK.with_style(cont.style);
            }
        }
    }

    /// Restore the pairing invariant on row `y` after a raw copy.
    fn repair_row(&mut self, y: u16) {
        let Some(start) = (y < self.height).then(|| self.index(0, y)) else {
            return;
        };
        let w = usize::from(self.width);
        let row = &mut self.cells[start..start + w];
        let mut i = 0;
        while i < w {
            let cell = row[i];
            if cell.is_continuation() {
                // Reached only when not consumed by an owner below.
                row[i] = Cell::BLANK.with_style(cell.style);
            } else if cell.width >= 2 {
                if i + 1 == w {
                    break;
                }
                if row[i + 1].is_continuation() {
                    i += 2;
                    continue;
                }
                row[i] = Cell::BLANK.with_style(cell.style);
            } else if cell.width == 0 {
                row[i] = Cell::BLANK.with_style(cell.style);
            }
            i += 1;
        }
    }
}

impl Surface for Screen {
    fn width(&self) -> u16 {
        self.width
    }

    fn height(&self) -> u16 {
        self.height
    }

    fn get_cell(&self, x: u16, y: u16) -> Option<&Cell> {
        self.in_bounds(x, y).then(|| &self.cells[self.index(x, y)])
    }

    fn set_cell(&mut self, x: u16, y: u16, cell: Cell) -> bool {
        let clip = self.bounds();
        self.write_cell(x, y, cell, clip)
    }

    fn pen(&self) -> &Pen {
        &self.pen
    }

    fn pen_mut(&mut self) -> &mut Pen {
        &mut self.pen
    }

    fn clear_with(&mut self, style: Style) {
        self.cells.fill(Cell::BLANK.with_style(style));
        self.pen.x = 0;
        self.pen.y = 0;
    }
}

impl fmt::Debug for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Screen({}x{})", self.width, self.height)
    }
}

// ─── SubScreen ──────────────────────────────────────────────────────────────

/// A clipped, translated view into a [`Screen`].
///
/// Local `(0, 0)` is the window's top-left. Writes outside the window
/// are dropped and never reach neighboring cells of the parent. Views
/// nest: a sub-region of a view is clipped to both.
pub struct SubScreen<'a> {
    screen: &'a mut Screen,
    /// Window in screen coordinates, already cut to the screen.
    window: Rect,
    pen: Pen,
}

impl<'a> SubScreen<'a> {
    fn new(screen: &'a mut Screen, window: Rect) -> Self {
        Self {
            screen,
            window,
            pen: Pen::default(),
        }
    }

    /// A nested view at local `(x, y)`, cut to this view. A request that
    /// misses this view entirely gives an empty view at its origin.
    pub fn sub_region(&mut self, x: u16, y: u16, w: u16, h: u16) -> SubScreen<'_> {
        let local = Rect::new(x, y, w, h).intersect(self.area());
        let window = if local.is_empty() {
            Rect::new(self.window.x, self.window.y, 0, 0)
        } else {
            Rect::new(
                self.window.x.saturating_add(local.x),
                self.window.y.saturating_add(local.y),
                local.width,
                local.height,
            )
        };
        SubScreen::new(&mut *self.screen, window)
    }

    /// The window this view covers, in screen coordinates.
    #[must_use]
    pub const fn window(&self) -> Rect {
        self.window
    }

    fn to_screen(&self, x: u16, y: u16) -> Option<(u16, u16)> {
        (x < self.window.width && y < self.window.height)
            .then(|| (self.window.x + x, self.window.y + y))
    }
}

impl Surface for SubScreen<'_> {
    fn width(&self) -> u16 {
        self.window.width
    }

    fn height(&self) -> u16 {
        self.window.height
    }

    fn get_cell(&self, x: u16, y: u16) -> Option<&Cell> {
        let (sx, sy) = self.to_screen(x, y)?;
        self.screen.get_cell(sx, sy)
    }

    fn set_cell(&mut self, x: u16, y: u16, cell: Cell) -> bool {
        let Some((sx, sy)) = self.to_screen(x, y) else {
            return false;
        };
        self.screen.write_cell(sx, sy, cell, self.window)
    }

    fn pen(&self) -> &Pen {
        &self.pen
    }

    fn pen_mut(&mut self) -> &mut Pen {
        &mut self.pen
    }
}

impl fmt::Debug for SubScreen<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let w = self.window;
        write!(f, "SubScreen({}x{} at {},{})", w.width, w.height, w.x, w.y)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
