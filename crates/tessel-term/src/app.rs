// SPDX-License-Identifier: MIT
//
// Application loop.
//
// Wires the pipeline together: platform bytes are decoded into events,
// events go to the root widget, the root widget paints the screen, and
// the diff renderer sends what changed back to the platform. One
// iteration per `step`, single-threaded.
//
// # Timing
//
// `Platform::read_nonblocking` waits at most the session's tick interval.
// An iteration that reads nothing is idle: bytes held by the decoder
// (a lone `ESC [`, half a UTF-8 character) are flushed as literal keys,
// and the root widget gets a `Tick`. A frame is rendered every iteration;
// the renderer writes nothing when nothing changed.
//
// # Resize
//
// The platform reports a resize through `poll_resize`. The screen is
// resized first and `Resize` is delivered ahead of any input read in the
// same iteration; the renderer sees the size change and repaints in full.
//
// # Write failures
//
// A frame that fails to reach the terminal leaves the renderer's snapshot
// untouched, so the next iteration sends the same diff again. Only after
// `MAX_RENDER_FAILURES` failures in a row does the loop give up.

use std::io;

use tracing::{debug, warn};

use crate::buffer::{Screen, Surface};
use crate::config::Config;
use crate::diff::{DiffRenderer, RenderStats};
use crate::error::{Error, Result};
use crate::input::{Event, InputDecoder};
use crate::terminal::Platform;
use crate::widget::{EventResult, Widget};

/// Bytes read per iteration. A keypress is 1-6 bytes, a paste can be
/// kilobytes; anything larger is picked up by the next iteration.
const READ_BUF_SIZE: usize = 4096;

/// Consecutive failed frame writes before the loop returns the error.
pub const MAX_RENDER_FAILURES: u32 = 3;

/// The application loop.
///
/// Owns the platform, the screen, the renderer, the decoder, and the root
/// widget. [`run`](Self::run) loops until the root widget returns
/// [`EventResult::Quit`]; [`step`](Self::step) runs one iteration for
/// callers that need to do work between frames.
pub struct App<P: Platform> {
    platform: P,
    screen: Screen,
    renderer: DiffRenderer,
    decoder: InputDecoder,
    root: Box<dyn Widget>,
    read_buf: Vec<u8>,
    render_failures: u32,
    frames: u64,
}

impl<P: Platform> App<P> {
    /// Build the loop with a screen sized to the platform.
    ///
    /// # Errors
    ///
    /// [`Error::Alloc`] if the screen cannot be allocated.
    pub fn new(platform: P, root: Box<dyn Widget>, config: &Config) -> Result<Self> {
        let size = platform.get_size();
        let screen = Screen::new(size.cols, size.rows)?;
        debug!(cols = size.cols, rows = size.rows, "app created");
        Ok(Self {
            platform,
            screen,
            renderer: DiffRenderer::with_config(config.render),
            decoder: InputDecoder::with_config(config.decoder),
            root,
            read_buf: vec![0; READ_BUF_SIZE],
            render_failures: 0,
            frames: 0,
        })
    }

    /// Enable raw mode and iterate until the root widget quits. Raw mode
    /// is disabled again on the way out, error or not.
    ///
    /// # Errors
    ///
    /// Raw mode changes, reads, screen allocation, or
    /// [`MAX_RENDER_FAILURES`] write failures in a row.
    pub fn run(&mut self) -> Result<()> {
        self.platform.enable_raw_mode()?;
        let result = self.run_inner();
        let restored = self.platform.disable_raw_mode();
        result.and(restored)
    }

    fn run_inner(&mut self) -> Result<()> {
        while self.step()? {}
        Ok(())
    }

    /// One iteration: read, decode, dispatch, render.
    ///
    /// Returns `Ok(false)` once the root widget asked to quit; no frame is
    /// rendered in that iteration.
    ///
    /// # Errors
    ///
    /// As [`run`](Self::run).
    pub fn step(&mut self) -> Result<bool> {
        let mut events = Vec::new();

        if self.platform.poll_resize() {
            let size = self.platform.get_size();
            self.screen.resize(size.cols, size.rows)?;
            events.push(Event::Resize {
                cols: size.cols,
                rows: size.rows,
            });
        }

        let n = self.platform.read_nonblocking(&mut self.read_buf)?;
        if n > 0 {
            events.extend(self.decoder.parse(&self.read_buf[..n]));
        } else {
            if self.decoder.has_pending() {
                events.extend(self.decoder.flush());
            }
            events.push(Event::Tick);
        }

        for event in &events {
            if self.root.handle_event(event) == EventResult::Quit {
                debug!(frames = self.frames, "root widget quit");
                return Ok(false);
            }
        }

        self.draw()?;
        Ok(true)
    }

    /// Repaint the root widget and send the frame.
    fn draw(&mut self) -> Result<()> {
        self.screen.clear();
        self.root.render(&mut self.screen.full_region());
        let cursor = self.root.cursor();

        let mut sink = PlatformWriter(&mut self.platform);
        match self.renderer.render_with_cursor(&self.screen, cursor, &mut sink) {
            Ok(_) => {
                self.render_failures = 0;
                self.frames += 1;
                Ok(())
            }
            Err(Error::Io(err)) => {
                self.render_failures += 1;
                warn!(
                    error = %err,
                    failures = self.render_failures,
                    "frame write failed"
                );
                if self.render_failures >= MAX_RENDER_FAILURES {
                    Err(Error::Io(err))
                } else {
                    Ok(())
                }
            }
            Err(err) => Err(err),
        }
    }

    /// Counters from the most recent successful frame.
    #[must_use]
    pub const fn last_stats(&self) -> RenderStats {
        self.renderer.get_stats()
    }

    /// Frames sent successfully so far.
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    #[must_use]
    pub const fn screen(&self) -> &Screen {
        &self.screen
    }

    #[must_use]
    pub const fn platform(&self) -> &P {
        &self.platform
    }

    pub const fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    /// Give the platform back, ending the loop.
    #[must_use]
    pub fn into_platform(self) -> P {
        self.platform
    }
}

impl<P: Platform> std::fmt::Debug for App<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("screen", &self.screen)
            .field("frames", &self.frames)
            .field("render_failures", &self.render_failures)
            .finish_non_exhaustive()
    }
}

/// `io::Write` over a platform, for the renderer's sink. The renderer
/// hands over each frame in a single `write_all`.
struct PlatformWriter<'a, P: Platform>(&'a mut P);

impl<P: Platform> io::Write for PlatformWriter<'_, P> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Platform::write(&mut *self.0, buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
