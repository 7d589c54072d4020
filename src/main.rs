// SPDX-License-Identifier: MIT
//
// tessel: an interactive event viewer for the tessel-term protocol layer.
//
// Puts the terminal into raw mode with the session modes from the config
// file and shows every decoded input event as it arrives, together with
// what the diff renderer sent for the last frame.
//
//   tessel [CONFIG_PATH]
//
// Layout:
//
//   ╭─ events ─────────────────────╮
//   │ newest events, bottom-up     │  ← everything above the status rows
//   ╰──────────────────────────────╯
//   status line (REVERSE)             ← 1 row
//   help line                         ← 1 row
//
// `q` or Ctrl+C quits. Logs go to `tessel.log` in the temp directory,
// filtered by `RUST_LOG` or, if unset, the config's `log_level`.

use std::cell::Cell as SharedCell;
use std::collections::VecDeque;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::process;
use std::rc::Rc;

use anyhow::{Context, Result};
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use tessel_term::input::{MouseAction, MouseButton, MouseEvent};
use tessel_term::widget::Column;
use tessel_term::{
    App, Attr, BorderStyle, Color, Config, Event, EventResult, Key, KeyEvent, Modifiers, NamedKey,
    Platform, RenderStats, SizeHint, Style, SubScreen, Surface, Terminal, Widget,
};

/// Events kept for display. Older ones are dropped.
const LOG_CAPACITY: usize = 512;

/// Bytes of a paste shown in its log line.
const PASTE_PREVIEW: usize = 32;

// ─── Event formatting ───────────────────────────────────────────────────────

fn describe_modifiers(m: Modifiers) -> String {
    let mut out = String::new();
    if m.contains(Modifiers::CTRL) {
        out.push_str("Ctrl+");
    }
    if m.contains(Modifiers::ALT) {
        out.push_str("Alt+");
    }
    if m.contains(Modifiers::SHIFT) {
        out.push_str("Shift+");
    }
    out
}

fn describe_key(key: &KeyEvent) -> String {
    let name = match key.key {
        Key::Char(c) => format!("'{c}'"),
        Key::Named(NamedKey::F(n)) => format!("F{n}"),
        Key::Named(named) => format!("{named:?}"),
    };
    format!("key    {}{name}", describe_modifiers(key.modifiers))
}

fn describe_mouse(m: &MouseEvent) -> String {
    let button = match m.button {
        MouseButton::None => String::new(),
        b => format!(" {b:?}"),
    };
    let action = match m.action {
        MouseAction::Press => "press",
        MouseAction::Release => "release",
        MouseAction::Drag => "drag",
        MouseAction::Move => "move",
        MouseAction::ScrollUp => "scroll up",
        MouseAction::ScrollDown => "scroll down",
    };
    format!(
        "mouse  {}{action}{button} at {},{}",
        describe_modifiers(m.modifiers),
        m.x,
        m.y
    )
}

fn describe_paste(bytes: &[u8]) -> String {
    let preview = String::from_utf8_lossy(&bytes[..bytes.len().min(PASTE_PREVIEW)]);
    let mut line = format!("paste  {} bytes: ", bytes.len());
    for ch in preview.chars() {
        if ch.is_control() {
            let _ = write!(line, "{}", ch.escape_default());
        } else {
            line.push(ch);
        }
    }
    if bytes.len() > PASTE_PREVIEW {
        line.push('…');
    }
    line
}

/// One log line for `event`, or `None` for events not worth a line.
fn describe(event: &Event) -> Option<String> {
    Some(match event {
        Event::Key(key) => describe_key(key),
        Event::Mouse(m) => describe_mouse(m),
        Event::Resize { cols, rows } => format!("resize {cols}x{rows}"),
        Event::FocusIn => "focus  in".to_owned(),
        Event::FocusOut => "focus  out".to_owned(),
        Event::Paste(bytes) => describe_paste(bytes),
        Event::Tick => return None,
    })
}

fn is_quit(event: &Event) -> bool {
    matches!(event, Event::Key(key) if *key == KeyEvent::char('q') || key.is_ctrl('c'))
}

// ─── Widgets ────────────────────────────────────────────────────────────────

/// Scrolling list of received events inside a rounded border. Also owns
/// the quit keys, since it sees every event first.
struct EventLog {
    lines: VecDeque<String>,
    seen: u64,
}

impl EventLog {
    fn new() -> Self {
        Self {
            lines: VecDeque::with_capacity(LOG_CAPACITY),
            seen: 0,
        }
    }

    fn record(&mut self, line: String) {
        if self.lines.len() == LOG_CAPACITY {
            self.lines.pop_front();
        }
        self.seen += 1;
        self.lines.push_back(format!("{:>6}  {line}", self.seen));
    }
}

impl Widget for EventLog {
    fn render(&mut self, area: &mut SubScreen<'_>) {
        let frame = area.area();
        area.set_style(Style::new().fg(Color::BRIGHT_BLACK));
        area.draw_box(frame, BorderStyle::Rounded);
        area.set_style(Style::new().attrs(Attr::BOLD));
        area.move_cursor(2, 0);
        area.put_string(" events ");

        let inner_h = frame.height.saturating_sub(2);
        let inner_w = frame.width.saturating_sub(4);
        if inner_h == 0 || inner_w == 0 {
            return;
        }
        let mut body = area.sub_region(2, 1, inner_w, inner_h);
        body.set_style(Style::DEFAULT);
        let visible = self.lines.len().min(usize::from(inner_h));
        let skip = self.lines.len() - visible;
        for (row, line) in (0u16..).zip(self.lines.iter().skip(skip)) {
            body.move_cursor(0, row);
            body.put_string(line);
        }
    }

    fn handle_event(&mut self, event: &Event) -> EventResult {
        if let Some(line) = describe(event) {
            self.record(line);
        }
        if is_quit(event) {
            EventResult::Quit
        } else {
            EventResult::Ignored
        }
    }
}

/// One reverse-video line: counters, focus, size, and the last frame's
/// render statistics.
struct StatusBar {
    stats: Rc<SharedCell<RenderStats>>,
    events: u64,
    ticks: u64,
    focused: Option<bool>,
    size: Option<(u16, u16)>,
}

impl StatusBar {
    const fn new(stats: Rc<SharedCell<RenderStats>>, size: Option<(u16, u16)>) -> Self {
        Self {
            stats,
            events: 0,
            ticks: 0,
            focused: None,
            size,
        }
    }

    fn text(&self) -> String {
        let stats = self.stats.get();
        let focus = match self.focused {
            Some(true) => "focused",
            Some(false) => "blurred",
            None => "focus ?",
        };
        let size = self
            .size
            .map_or_else(|| "size ?".to_owned(), |(cols, rows)| format!("{cols}x{rows}"));
        format!(
            " events {}  ticks {}  {focus}  {size}  drawn {}  skipped {}  {} B  {:.1}% reused",
            self.events,
            self.ticks,
            stats.cells_drawn,
            stats.cells_skipped,
            stats.bytes_written,
            stats.efficiency() * 100.0,
        )
    }
}

impl Widget for StatusBar {
    fn render(&mut self, area: &mut SubScreen<'_>) {
        let style = Style::new().attrs(Attr::REVERSE);
        let rect = area.area();
        area.set_style(style);
        area.fill(rect, ' ');
        let text = self.text();
        area.move_cursor(0, 0);
        area.put_string(tessel_term::width::truncate_to_width(
            &text,
            usize::from(area.width()),
        ));
    }

    fn handle_event(&mut self, event: &Event) -> EventResult {
        match event {
            Event::Tick => self.ticks += 1,
            Event::FocusIn => self.focused = Some(true),
            Event::FocusOut => self.focused = Some(false),
            Event::Resize { cols, rows } => self.size = Some((*cols, *rows)),
            _ => {}
        }
        if !matches!(event, Event::Tick) {
            self.events += 1;
        }
        EventResult::Ignored
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::rows(1)
    }
}

/// Static key help.
struct HelpLine;

impl Widget for HelpLine {
    fn render(&mut self, area: &mut SubScreen<'_>) {
        area.set_style(Style::new().attrs(Attr::DIM));
        area.move_cursor(1, 0);
        area.put_string("q / Ctrl+C quit · type, click, paste, or resize to see events");
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::rows(1)
    }
}

// ─── Startup ────────────────────────────────────────────────────────────────

/// Send logs to `tessel.log` in the temp directory. The returned guard
/// flushes the writer when dropped.
fn init_logging(config: &Config) -> Result<WorkerGuard> {
    let log_dir = std::env::temp_dir();
    let appender = tracing_appender::rolling::never(&log_dir, "tessel.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))?;
    Ok(guard)
}

/// Step the loop until the root widget quits, publishing each frame's
/// statistics to the status bar.
fn drive<P: Platform>(app: &mut App<P>, stats: &SharedCell<RenderStats>) -> tessel_term::Result<()> {
    while app.step()? {
        stats.set(app.last_stats());
    }
    Ok(())
}

fn run(config_path: Option<PathBuf>) -> Result<()> {
    let config = Config::load_or_default(config_path.as_deref()).with_context(|| match &config_path {
        Some(p) => format!("failed to load config {}", p.display()),
        None => "failed to load config".to_owned(),
    })?;
    let _log_guard = init_logging(&config)?;
    info!(config = ?config_path, "tessel starting");

    let mut terminal =
        Terminal::with_config(config.session).context("failed to claim the terminal")?;
    terminal.enter().context("failed to enter raw mode")?;
    let size = terminal.get_size();

    let stats = Rc::new(SharedCell::new(RenderStats::default()));
    let root = Column::new()
        .push(EventLog::new())
        .push(StatusBar::new(Rc::clone(&stats), Some((size.cols, size.rows))))
        .push(HelpLine);

    let mut app = App::new(terminal, Box::new(root), &config).context("failed to create the screen")?;
    let looped = drive(&mut app, &stats);

    let frames = app.frames();
    let mut terminal = app.into_platform();
    let left = terminal.leave().context("failed to restore the terminal");
    debug!(frames, "event loop finished");

    looped.context("event loop failed")?;
    left?;
    info!(frames, "tessel exiting");
    Ok(())
}

fn main() {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    if let Err(e) = run(config_path) {
        eprintln!("tessel: {e:#}");
        process::exit(1);
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
