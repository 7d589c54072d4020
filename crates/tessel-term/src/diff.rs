// SPDX-License-Identifier: MIT
//
// Differential renderer.
//
// Instead of redrawing the whole screen every frame, the renderer keeps a
// snapshot of the last frame the terminal received and emits escape
// sequences only for cells that differ from it.
//
// Per frame:
//
//   1. Decide between a full repaint (no snapshot yet, the screen changed
//      size, or `invalidate` was called) and a diff.
//   2. Reserve everything the frame needs: output bytes and, when the size
//      changed, a fresh snapshot. Allocation failure is reported before a
//      single byte reaches the terminal.
//   3. Walk rows. An unchanged row is skipped with one slice comparison;
//      otherwise changed cells go to the CellWriter, which elides cursor
//      moves and redundant SGR.
//   4. Write the frame to the sink in one `write_all` and flush.
//   5. Only then copy the frame into the snapshot. A failed write leaves the
//      snapshot alone, so the next render produces the same diff again.
//
// Wide characters: a continuation placeholder is never diffed on its own.
// When its owner is drawn the terminal paints both columns, and the
// placeholder counts as drawn if it differed from the snapshot; otherwise
// it counts as skipped. `cells_drawn + cells_skipped` always equals the
// number of cells in the frame.

use std::io::Write;

use tracing::{debug, debug_span, trace};

use crate::ansi;
use crate::buffer::{Screen, Surface};
use crate::cell::Cell;
use crate::config::RenderConfig;
use crate::error::Result;
use crate::output::{CellWriter, OutputBuffer};

// ─── RenderStats ────────────────────────────────────────────────────────────

/// Counters from the most recent render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    /// Cells that differed from the snapshot and were sent.
    pub cells_drawn: usize,
    /// Cells that matched the snapshot.
    pub cells_skipped: usize,
    /// Bytes written to the sink.
    pub bytes_written: usize,
}

impl RenderStats {
    #[inline]
    #[must_use]
    pub const fn total_cells(&self) -> usize {
        self.cells_drawn + self.cells_skipped
    }

    /// Fraction of cells that did not need drawing. An empty frame counts
    /// as fully efficient.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn efficiency(&self) -> f64 {
        let total = self.total_cells();
        if total == 0 {
            1.0
        } else {
            self.cells_skipped as f64 / total as f64
        }
    }
}

// ─── DiffRenderer ───────────────────────────────────────────────────────────

/// Turns successive [`Screen`] states into minimal terminal output.
///
/// ```
/// use tessel_term::buffer::{Screen, Surface};
/// use tessel_term::diff::DiffRenderer;
///
/// let mut screen = Screen::new(20, 2).unwrap();
/// let mut renderer = DiffRenderer::new();
/// let mut sink = Vec::new();
///
/// screen.put_string("hello");
/// let stats = renderer.render(&screen, &mut sink).unwrap();
/// assert_eq!(stats.cells_drawn, 40);
///
/// let stats = renderer.render(&screen, &mut sink).unwrap();
/// assert_eq!(stats.cells_drawn, 0);
/// assert_eq!(stats.efficiency(), 1.0);
/// ```
pub struct DiffRenderer {
    output: OutputBuffer,
    writer: CellWriter,
    previous: Option<Screen>,
    stats: RenderStats,
    config: RenderConfig,
    /// Terminal cursor visibility as last set by us; `None` if unknown.
    cursor_visible: Option<bool>,
}

/// What to do with the hardware cursor after a frame.
#[derive(Clone, Copy)]
enum CursorRequest {
    Leave,
    Hide,
    ShowAt(u16, u16),
}

impl DiffRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RenderConfig::default())
    }

    #[must_use]
    pub fn with_config(config: RenderConfig) -> Self {
        Self {
            output: OutputBuffer::new(),
            writer: CellWriter::new(config.color_depth),
            previous: None,
            stats: RenderStats::default(),
            config,
            cursor_visible: None,
        }
    }

    /// Send the difference between `current` and the last frame to `sink`.
    ///
    /// The hardware cursor is left wherever the last cell put it.
    ///
    /// # Errors
    ///
    /// [`Error::Alloc`](crate::Error::Alloc) if the frame's buffers cannot
    /// be reserved (nothing is written), [`Error::Io`](crate::Error::Io) if
    /// the sink fails. In both cases the snapshot is unchanged and the
    /// frame can be retried.
    pub fn render(&mut self, current: &Screen, sink: &mut impl Write) -> Result<RenderStats> {
        self.render_frame(current, CursorRequest::Leave, sink)
    }

    /// Like [`render`](Self::render), then place and show the hardware
    /// cursor at `cursor`, or hide it when `cursor` is `None`. A position
    /// outside the screen is clamped to it.
    ///
    /// # Errors
    ///
    /// As [`render`](Self::render).
    pub fn render_with_cursor(
        &mut self,
        current: &Screen,
        cursor: Option<(u16, u16)>,
        sink: &mut impl Write,
    ) -> Result<RenderStats> {
        let request = match cursor {
            Some((x, y)) => CursorRequest::ShowAt(
                x.min(current.width().saturating_sub(1)),
                y.min(current.height().saturating_sub(1)),
            ),
            None => CursorRequest::Hide,
        };
        self.render_frame(current, request, sink)
    }

    /// Forget the snapshot and everything known about the terminal. The
    /// next render repaints every cell.
    pub fn invalidate(&mut self) {
        debug!("renderer invalidated");
        self.previous = None;
        self.writer.reset_state();
        self.cursor_visible = None;
    }

    /// Counters from the most recent successful render.
    #[must_use]
    pub const fn get_stats(&self) -> RenderStats {
        self.stats
    }

    /// The bytes produced by the most recent render.
    #[must_use]
    pub fn output_bytes(&self) -> &[u8] {
        self.output.as_bytes()
    }

    #[must_use]
    pub const fn config(&self) -> RenderConfig {
        self.config
    }

    fn render_frame(
        &mut self,
        current: &Screen,
        cursor: CursorRequest,
        sink: &mut impl Write,
    ) -> Result<RenderStats> {
        let (width, height) = (current.width(), current.height());
        let _span = debug_span!("render", width, height).entered();

        let same_size = self
            .previous
            .as_ref()
            .is_some_and(|p| p.width() == width && p.height() == height);

        let fresh_snapshot = if same_size {
            None
        } else {
            Some(current.try_clone()?)
        };
        self.output.clear();
        self.output.reserve_frame(current.total_cells())?;

        if self.config.sync_output {
            ansi::begin_sync(&mut self.output).ok();
        }
        let body_start = self.output.len();

        let mut stats = RenderStats::default();
        if !same_size {
            debug!(first_frame = self.previous.is_none(), "full repaint");
            ansi::reset(&mut self.output).ok();
            ansi::clear_screen(&mut self.output).ok();
            self.writer.note_reset();
            self.writer.note_cursor(None);
        }

        let previous = if same_size { self.previous.as_ref() } else { None };
        for y in 0..height {
            let Some(row) = current.get_row(y) else { break };
            let prev_row = previous.and_then(|p| p.get_row(y));
            if prev_row == Some(row) {
                stats.cells_skipped += row.len();
                continue;
            }
            diff_row(&mut self.writer, &mut self.output, y, row, prev_row, &mut stats);
        }

        self.writer.finish_frame(&mut self.output);
        self.place_cursor(cursor);

        if self.output.len() == body_start {
            self.output.clear();
        } else if self.config.sync_output {
            ansi::end_sync(&mut self.output).ok();
        }

        if !self.output.is_empty() {
            let written = sink
                .write_all(self.output.as_bytes())
                .and_then(|()| sink.flush());
            if let Err(err) = written {
                debug!(error = %err, "frame write failed; snapshot kept");
                self.writer.reset_state();
                self.cursor_visible = None;
                return Err(err.into());
            }
        }
        stats.bytes_written = self.output.len();

        match fresh_snapshot {
            Some(snapshot) => self.previous = Some(snapshot),
            None => {
                if let Some(prev) = self.previous.as_mut() {
                    prev.copy_from(current)?;
                }
            }
        }

        trace!(
            cells_drawn = stats.cells_drawn,
            cells_skipped = stats.cells_skipped,
            bytes = stats.bytes_written,
            "frame rendered"
        );
        self.stats = stats;
        Ok(stats)
    }

    fn place_cursor(&mut self, request: CursorRequest) {
        match request {
            CursorRequest::Leave => {}
            CursorRequest::Hide => {
                if self.cursor_visible != Some(false) {
                    ansi::cursor_hide(&mut self.output).ok();
                    self.cursor_visible = Some(false);
                }
            }
            CursorRequest::ShowAt(x, y) => {
                if self.writer.cursor() != Some((x, y)) {
                    ansi::cursor_to(&mut self.output, x, y).ok();
                    self.writer.note_cursor(Some((x, y)));
                }
                if self.cursor_visible != Some(true) {
                    ansi::cursor_show(&mut self.output).ok();
                    self.cursor_visible = Some(true);
                }
            }
        }
    }
}

impl Default for DiffRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Emit the changed cells of one row. `prev_row` is `None` on a full
/// repaint, which makes every cell count as changed.
fn diff_row(
    writer: &mut CellWriter,
    out: &mut OutputBuffer,
    y: u16,
    row: &[Cell],
    prev_row: Option<&[Cell]>,
    stats: &mut RenderStats,
) {
    // Rows come from a Screen whose width is a u16.
    #[allow(clippy::cast_possible_truncation)]
    let width = row.len() as u16;
    let mut owner_drawn = false;

    for (x, cell) in (0..width).zip(row) {
        let idx = usize::from(x);
        let changed = prev_row.is_none_or(|p| p[idx] != *cell);

        if cell.is_continuation() && idx > 0 && row[idx - 1].is_wide() {
            if owner_drawn && changed {
                stats.cells_drawn += 1;
            } else {
                stats.cells_skipped += 1;
            }
            owner_drawn = false;
            continue;
        }

        if changed {
            writer.write_cell(out, x, y, cell, width);
            stats.cells_drawn += 1;
            owner_drawn = cell.is_wide();
        } else {
            stats.cells_skipped += 1;
            owner_drawn = false;
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::style::{Attr, Color, Style};
    use pretty_assertions::assert_eq;
    use std::io;

    fn filled(w: u16, h: u16, ch: char) -> Screen {
        let mut s = Screen::new(w, h).unwrap();
        s.fill(s.bounds(), ch);
        s
    }

    fn render(r: &mut DiffRenderer, s: &Screen) -> (RenderStats, String) {
        let mut sink = Vec::new();
        let stats = r.render(s, &mut sink).unwrap();
        (stats, String::from_utf8(sink).unwrap())
    }

    #[test]
    fn long_cluster_is_written_whole() {
        let family = "\u{1F468}\u{200D}\u{1F469}\u{200D}\u{1F467}\u{200D}\u{1F466}";
        let mut s = filled(4, 1, '.');
        let mut r = DiffRenderer::new();
        render(&mut r, &s);
        s.move_cursor(1, 0);
        s.put_string(family);
        let (stats, out) = render(&mut r, &s);
        assert_eq!(stats.cells_drawn, 2);
        assert!(out.contains(&format!("\x1b[1;2H{family}")), "{out:?}");
    }

    /// A sink that refuses every write.
    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    // ── Counters ───────────────────────────────────────────────────

    #[test]
    fn full_then_idle_then_single_change() {
        let mut r = DiffRenderer::new();
        let mut s = filled(80, 24, 'X');

        let (stats, _) = render(&mut r, &s);
        assert_eq!((stats.cells_drawn, stats.cells_skipped), (1920, 0));

        let (stats, _) = render(&mut r, &s);
        assert_eq!((stats.cells_drawn, stats.cells_skipped), (0, 1920));
        assert_eq!(stats.efficiency(), 1.0);

        s.set_cell(40, 12, Cell::new('Y'));
        let (stats, out) = render(&mut r, &s);
        assert_eq!((stats.cells_drawn, stats.cells_skipped), (1, 1919));
        assert!(out.contains("\x1b[13;41HY"));
    }

    #[test]
    fn invalidate_forces_full_repaint() {
        let mut r = DiffRenderer::new();
        let s = filled(10, 4, '.');
        render(&mut r, &s);
        r.invalidate();
        let (stats, out) = render(&mut r, &s);
        assert_eq!(stats.cells_drawn, 40);
        assert!(out.contains("\x1b[2J"));
    }

    #[test]
    fn size_change_forces_full_repaint() {
        let mut r = DiffRenderer::new();
        render(&mut r, &filled(10, 4, '.'));
        let (stats, out) = render(&mut r, &filled(12, 4, '.'));
        assert_eq!(stats.cells_drawn, 48);
        assert!(out.contains("\x1b[2J"));
    }

    #[test]
    fn get_stats_reports_last_frame() {
        let mut r = DiffRenderer::new();
        let s = filled(3, 3, 'a');
        render(&mut r, &s);
        assert_eq!(r.get_stats().cells_drawn, 9);
        assert_eq!(r.get_stats().total_cells(), 9);
    }

    #[test]
    fn empty_screen_is_fully_efficient() {
        let mut r = DiffRenderer::new();
        let s = Screen::new(0, 0).unwrap();
        let (stats, _) = render(&mut r, &s);
        assert_eq!(stats.total_cells(), 0);
        assert_eq!(stats.efficiency(), 1.0);
    }

    // ── Output bytes ───────────────────────────────────────────────

    #[test]
    fn first_frame_is_synced_cleared_and_reset() {
        let mut r = DiffRenderer::new();
        let (stats, out) = render(&mut r, &filled(2, 1, 'a'));
        assert_eq!(out, "\x1b[?2026h\x1b[0m\x1b[2J\x1b[1;1Haa\x1b[?2026l");
        assert_eq!(stats.bytes_written, out.len());
    }

    #[test]
    fn sync_output_can_be_disabled() {
        let mut r = DiffRenderer::with_config(RenderConfig {
            sync_output: false,
            ..RenderConfig::default()
        });
        let (_, out) = render(&mut r, &filled(2, 1, 'a'));
        assert_eq!(out, "\x1b[0m\x1b[2J\x1b[1;1Haa");
    }

    #[test]
    fn unchanged_frame_writes_nothing() {
        let mut r = DiffRenderer::new();
        let s = filled(5, 5, 'z');
        render(&mut r, &s);
        let (stats, out) = render(&mut r, &s);
        assert_eq!(out, "");
        assert_eq!(stats.bytes_written, 0);
    }

    #[test]
    fn adjacent_changes_share_one_cursor_move() {
        let mut r = DiffRenderer::new();
        let mut s = filled(10, 2, '.');
        render(&mut r, &s);
        s.move_cursor(3, 1);
        s.put_string("abc");
        let (stats, out) = render(&mut r, &s);
        assert_eq!(stats.cells_drawn, 3);
        assert_eq!(out, "\x1b[?2026h\x1b[2;4Habc\x1b[?2026l");
    }

    #[test]
    fn styled_cell_is_followed_by_reset() {
        let mut r = DiffRenderer::new();
        let mut s = filled(4, 1, ' ');
        render(&mut r, &s);
        s.set_cell(0, 0, Cell::new('!').with_fg(Color::RED).with_attrs(Attr::BOLD));
        let (_, out) = render(&mut r, &s);
        assert_eq!(out, "\x1b[?2026h\x1b[1;1H\x1b[31m\x1b[1m!\x1b[0m\x1b[?2026l");
    }

    #[test]
    fn color_depth_is_applied() {
        let mut r = DiffRenderer::with_config(RenderConfig {
            sync_output: false,
            color_depth: crate::style::ColorDepth::Palette,
        });
        let mut s = Screen::new(1, 1).unwrap();
        s.set_cell(0, 0, Cell::new('x').with_bg(Color::Rgb(255, 0, 0)));
        let (_, out) = render(&mut r, &s);
        assert!(out.contains("\x1b[48;5;196m"));
        assert!(!out.contains("48;2"));
    }

    // ── Wide characters ────────────────────────────────────────────

    #[test]
    fn wide_char_counts_both_cells_and_emits_once() {
        let mut r = DiffRenderer::new();
        let mut s = filled(4, 1, '.');
        render(&mut r, &s);
        s.set_cell(1, 0, Cell::new('中'));
        let (stats, out) = render(&mut r, &s);
        assert_eq!((stats.cells_drawn, stats.cells_skipped), (2, 2));
        assert_eq!(out, "\x1b[?2026h\x1b[1;2H中\x1b[?2026l");
    }

    #[test]
    fn wide_char_replacing_wide_char_skips_equal_placeholder() {
        let mut r = DiffRenderer::new();
        let mut s = Screen::new(4, 1).unwrap();
        s.set_cell(0, 0, Cell::new('中'));
        render(&mut r, &s);
        s.set_cell(0, 0, Cell::new('文'));
        let (stats, _) = render(&mut r, &s);
        assert_eq!((stats.cells_drawn, stats.cells_skipped), (1, 3));
    }

    #[test]
    fn wide_char_at_last_column_renders_as_space() {
        let mut r = DiffRenderer::new();
        let mut s = Screen::new(3, 1).unwrap();
        s.set_cell(2, 0, Cell::new('中'));
        let (stats, out) = render(&mut r, &s);
        assert_eq!(stats.cells_drawn, 3);
        assert!(out.contains("   "));
        assert!(!out.contains('中'));
    }

    // ── Cursor ─────────────────────────────────────────────────────

    #[test]
    fn render_with_cursor_places_and_shows() {
        let mut r = DiffRenderer::new();
        let s = filled(10, 3, ' ');
        let mut sink = Vec::new();
        r.render_with_cursor(&s, Some((4, 2)), &mut sink).unwrap();
        let out = String::from_utf8(sink).unwrap();
        assert!(out.ends_with("\x1b[3;5H\x1b[?25h\x1b[?2026l"));

        // Same position, nothing changed: no bytes at all.
        let mut sink = Vec::new();
        r.render_with_cursor(&s, Some((4, 2)), &mut sink).unwrap();
        assert!(sink.is_empty());
    }

    #[test]
    fn render_with_cursor_none_hides_once() {
        let mut r = DiffRenderer::new();
        let s = filled(2, 1, ' ');
        let mut sink = Vec::new();
        r.render_with_cursor(&s, None, &mut sink).unwrap();
        assert!(String::from_utf8(sink).unwrap().contains("\x1b[?25l"));
        let mut sink = Vec::new();
        r.render_with_cursor(&s, None, &mut sink).unwrap();
        assert!(sink.is_empty());
    }

    #[test]
    fn cursor_position_is_clamped() {
        let mut r = DiffRenderer::new();
        let s = filled(5, 2, ' ');
        let mut sink = Vec::new();
        r.render_with_cursor(&s, Some((50, 50)), &mut sink).unwrap();
        assert!(String::from_utf8(sink).unwrap().contains("\x1b[2;5H"));
    }

    // ── Failure semantics ──────────────────────────────────────────

    #[test]
    fn failed_first_frame_is_retried_in_full() {
        let mut r = DiffRenderer::new();
        let s = filled(4, 2, '#');
        let err = r.render(&s, &mut BrokenPipe).unwrap_err();
        assert!(matches!(err, Error::Io(e) if e.kind() == io::ErrorKind::BrokenPipe));
        let (stats, out) = render(&mut r, &s);
        assert_eq!(stats.cells_drawn, 8);
        assert!(out.contains("\x1b[2J"));
    }

    #[test]
    fn failed_diff_frame_keeps_snapshot() {
        let mut r = DiffRenderer::new();
        let mut s = filled(6, 2, '-');
        render(&mut r, &s);
        s.set_cell(2, 1, Cell::new('+').with_style(Style::new().attrs(Attr::ITALIC)));
        assert!(r.render(&s, &mut BrokenPipe).is_err());

        let (stats, out) = render(&mut r, &s);
        assert_eq!((stats.cells_drawn, stats.cells_skipped), (1, 11));
        // Style state was forgotten, so the retry starts from a reset.
        assert!(out.contains("\x1b[0m\x1b[3m+"));
    }

    #[test]
    fn failed_frame_does_not_update_stats() {
        let mut r = DiffRenderer::new();
        let s = filled(2, 2, 'a');
        render(&mut r, &s);
        let before = r.get_stats();
        let mut t = s.clone();
        t.set_cell(0, 0, Cell::new('b'));
        assert!(r.render(&t, &mut BrokenPipe).is_err());
        assert_eq!(r.get_stats(), before);
    }
}
