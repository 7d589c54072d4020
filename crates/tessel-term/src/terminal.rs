// SPDX-License-Identifier: MIT
//
// Terminal session: raw mode, terminal modes, and cleanup.
//
// Safety: This module necessarily uses `unsafe` for termios (tcgetattr,
// tcsetattr), ioctl (TIOCGWINSZ), poll, read, isatty, and raw fd writes.
// These are the POSIX interfaces for terminal control. Each unsafe block
// is minimal.
#![allow(unsafe_code)]
//
// `Platform` is the contract the app loop needs from a terminal: bounded
// reads, writes, size, and raw mode. `Terminal` implements it for the
// process's controlling terminal on unix.
//
// Only one `Terminal` may exist at a time. The session claims a
// process-wide flag in its constructor and releases it on drop, and the
// signal and panic handlers it registers are scoped to that lifetime:
//
// - SIGWINCH sets a flag that `poll_resize` swaps out.
// - SIGTERM / SIGHUP / SIGINT restore the terminal and exit with 128+sig.
// - A panic hook (installed once per process) writes a restore sequence
//   straight to fd 1, bypassing the stdout lock in case the panic
//   happened while it was held, then restores the saved termios.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Once};

use tracing::{debug, info};

use crate::ansi;
use crate::config::SessionConfig;
use crate::error::{Error, Result};

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub cols: u16,
    pub rows: u16,
}

impl Size {
    /// Size used when the terminal cannot be queried.
    pub const FALLBACK: Self = Self { cols: 80, rows: 24 };

    /// Total number of cells (`cols × rows`).
    #[inline]
    #[must_use]
    pub const fn area(self) -> u32 {
        self.cols as u32 * self.rows as u32
    }
}

// ─── Platform ───────────────────────────────────────────────────────────────

/// What the app loop needs from a terminal.
///
/// Implemented by [`Terminal`] for real terminals and by in-memory fakes
/// in tests.
pub trait Platform {
    /// Read whatever input is available into `buf`, waiting at most the
    /// platform's configured timeout. `Ok(0)` means nothing arrived.
    ///
    /// # Errors
    ///
    /// Underlying read failure.
    fn read_nonblocking(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write all of `bytes` and flush them to the terminal.
    ///
    /// # Errors
    ///
    /// Underlying write failure.
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Current size in cells.
    fn get_size(&self) -> Size;

    /// Switch input to raw mode. Calling it again is a no-op.
    ///
    /// # Errors
    ///
    /// The terminal rejected the mode change.
    fn enable_raw_mode(&mut self) -> Result<()>;

    /// Restore the input mode saved by [`enable_raw_mode`](Self::enable_raw_mode).
    /// Calling it again is a no-op.
    ///
    /// # Errors
    ///
    /// The terminal rejected the mode change.
    fn disable_raw_mode(&mut self) -> Result<()>;

    /// Has the terminal been resized since the last call?
    fn poll_resize(&mut self) -> bool {
        false
    }
}

// ─── Terminal Queries ───────────────────────────────────────────────────────

/// Query the current terminal size via `ioctl(TIOCGWINSZ)`.
///
/// Returns `None` if stdout is not a terminal or the query fails.
#[cfg(unix)]
#[must_use]
pub fn query_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };

    if result == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
        Some(Size {
            cols: ws.ws_col,
            rows: ws.ws_row,
        })
    } else {
        None
    }
}

#[cfg(not(unix))]
#[must_use]
pub fn query_size() -> Option<Size> {
    None
}

/// Is stdin connected to a terminal?
#[cfg(unix)]
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

#[cfg(not(unix))]
#[must_use]
pub fn is_tty() -> bool {
    false
}

// ─── Emergency Restore ──────────────────────────────────────────────────────

/// Set while a `Terminal` exists.
static SESSION_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Set between `enter` and `leave`.
static MODES_ON: AtomicBool = AtomicBool::new(false);

/// Saved termios for the panic hook and signal thread, which cannot reach
/// the `Terminal` itself.
#[cfg(unix)]
static TERMIOS_BACKUP: Mutex<Option<libc::termios>> = Mutex::new(None);

/// Restore termios from the global backup. Best-effort.
#[cfg(unix)]
fn restore_termios_from_backup() {
    if let Ok(guard) = TERMIOS_BACKUP.lock() {
        if let Some(ref original) = *guard {
            unsafe {
                let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, original);
            }
        }
    }
}

/// Undo every mode a session can turn on: end synchronized output,
/// disable mouse (SGR format + all-motion + drag + click), pop kitty
/// keyboard flags, disable bracketed paste and focus reporting, reset SGR,
/// show the cursor, leave the alternate screen.
///
/// The alternate screen exit is last so the shell's content comes back
/// with no leftovers.
#[rustfmt::skip]
const EMERGENCY_RESTORE: &[u8] = b"\
    \x1b[?2026l\
    \x1b[?1006l\x1b[?1003l\x1b[?1002l\x1b[?1000l\
    \x1b[<u\
    \x1b[?2004l\
    \x1b[?1004l\
    \x1b[0m\
    \x1b[?25h\
    \x1b[?1049l";

static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Install a panic hook that restores the terminal before the original
/// hook prints the panic message. The hook only acts between `enter`
/// and `leave`.
fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            if MODES_ON.load(Ordering::Acquire) {
                emergency_restore();
            }
            original(info);
        }));
    });
}

/// Write [`EMERGENCY_RESTORE`] directly to stdout's file descriptor and
/// restore the saved termios.
fn emergency_restore() {
    #[cfg(unix)]
    unsafe {
        let _ = libc::write(
            libc::STDOUT_FILENO,
            EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
            EMERGENCY_RESTORE.len(),
        );
    }

    #[cfg(unix)]
    restore_termios_from_backup();

    #[cfg(not(unix))]
    {
        let _ = io::stdout().write_all(EMERGENCY_RESTORE);
        let _ = io::stdout().flush();
    }
}

// ─── Signals ────────────────────────────────────────────────────────────────

/// Termination signals restore the terminal and exit the process.
#[cfg(unix)]
#[derive(Debug)]
struct SignalGuard {
    handle: signal_hook::iterator::Handle,
    thread: Option<std::thread::JoinHandle<()>>,
}

#[cfg(unix)]
impl SignalGuard {
    fn new() -> io::Result<Self> {
        use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
        use signal_hook::iterator::Signals;

        let mut signals = Signals::new([SIGTERM, SIGHUP, SIGINT]).map_err(io::Error::other)?;
        let handle = signals.handle();
        let thread = std::thread::Builder::new()
            .name("tessel-signals".into())
            .spawn(move || {
                if let Some(signal) = signals.forever().next() {
                    tracing::warn!(signal, "termination signal received, restoring terminal");
                    emergency_restore();
                    std::process::exit(128 + signal);
                }
            })?;
        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }
}

#[cfg(unix)]
impl Drop for SignalGuard {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

// ─── Terminal ───────────────────────────────────────────────────────────────

/// The process's terminal, as a [`Platform`].
///
/// Call [`enter`](Self::enter) to switch into raw mode and turn on the
/// modes in its [`SessionConfig`]; the terminal is restored by
/// [`leave`](Self::leave) or on drop, and on panic or termination signal.
///
/// # Example
///
/// ```no_run
/// use tessel_term::terminal::Terminal;
///
/// let mut term = Terminal::new()?;
/// term.enter()?;
/// // ... render frames, handle input ...
/// // Terminal is restored on drop.
/// # Ok::<(), tessel_term::Error>(())
/// ```
pub struct Terminal {
    config: SessionConfig,

    /// Original termios saved before entering raw mode.
    #[cfg(unix)]
    original_termios: Option<libc::termios>,

    /// Cached size, refreshed by `poll_resize`.
    size: Size,

    /// Modes from `config` are on.
    active: bool,

    /// Set by the SIGWINCH handler.
    resized: Arc<AtomicBool>,

    #[cfg(unix)]
    sigwinch: Option<signal_hook::SigId>,

    #[cfg(unix)]
    signal_guard: Option<SignalGuard>,
}

impl Terminal {
    /// Claim the terminal with default session modes.
    ///
    /// # Errors
    ///
    /// [`Error::SessionActive`] if another `Terminal` exists.
    pub fn new() -> Result<Self> {
        Self::with_config(SessionConfig::default())
    }

    /// Claim the terminal. Does **not** enter raw mode; call
    /// [`enter`](Self::enter) for that. Falls back to 80×24 if the size
    /// cannot be determined (tests, pipes).
    ///
    /// # Errors
    ///
    /// [`Error::SessionActive`] if another `Terminal` exists.
    pub fn with_config(config: SessionConfig) -> Result<Self> {
        if SESSION_ACTIVE
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::SessionActive);
        }

        Ok(Self {
            config,
            #[cfg(unix)]
            original_termios: None,
            size: query_size().unwrap_or(Size::FALLBACK),
            active: false,
            resized: Arc::new(AtomicBool::new(false)),
            #[cfg(unix)]
            sigwinch: None,
            #[cfg(unix)]
            signal_guard: None,
        })
    }

    /// Session modes this terminal turns on.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Enter raw mode and turn on the configured modes. Idempotent.
    ///
    /// # Errors
    ///
    /// Raw mode, signal registration, or terminal output failed.
    pub fn enter(&mut self) -> Result<()> {
        if self.active {
            return Ok(());
        }

        install_panic_hook();
        self.register_signals()?;
        self.enable_raw_mode()?;

        let cfg = self.config;
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        if cfg.alt_screen {
            ansi::enter_alt_screen(&mut lock)?;
        }
        if cfg.hide_cursor {
            ansi::cursor_hide(&mut lock)?;
        }
        ansi::clear_screen(&mut lock)?;
        ansi::enable_mouse(&mut lock, cfg.mouse)?;
        if cfg.kitty_keyboard {
            ansi::enable_kitty_keyboard(&mut lock)?;
        }
        if cfg.bracketed_paste {
            ansi::enable_bracketed_paste(&mut lock)?;
        }
        if cfg.focus_events {
            ansi::enable_focus_reporting(&mut lock)?;
        }
        lock.flush()?;

        self.active = true;
        MODES_ON.store(true, Ordering::Release);
        info!(
            cols = self.size.cols,
            rows = self.size.rows,
            alt_screen = cfg.alt_screen,
            mouse = ?cfg.mouse,
            "terminal session entered"
        );
        Ok(())
    }

    /// Turn off every mode [`enter`](Self::enter) turned on, restore the
    /// original screen content, and leave raw mode. Idempotent.
    ///
    /// # Errors
    ///
    /// Terminal output or the termios restore failed.
    pub fn leave(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }

        let cfg = self.config;
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        ansi::end_sync(&mut lock)?;
        if cfg.focus_events {
            ansi::disable_focus_reporting(&mut lock)?;
        }
        if cfg.bracketed_paste {
            ansi::disable_bracketed_paste(&mut lock)?;
        }
        if cfg.kitty_keyboard {
            ansi::disable_kitty_keyboard(&mut lock)?;
        }
        ansi::disable_mouse(&mut lock)?;
        ansi::reset(&mut lock)?;
        ansi::cursor_show(&mut lock)?;
        if cfg.alt_screen {
            ansi::exit_alt_screen(&mut lock)?;
        }
        lock.flush()?;
        drop(lock);

        self.disable_raw_mode()?;
        self.unregister_signals();
        self.active = false;
        MODES_ON.store(false, Ordering::Release);
        info!("terminal session left");
        Ok(())
    }

    #[cfg(unix)]
    fn register_signals(&mut self) -> Result<()> {
        if self.sigwinch.is_none() {
            let id = signal_hook::flag::register(
                signal_hook::consts::signal::SIGWINCH,
                Arc::clone(&self.resized),
            )
            .map_err(io::Error::other)?;
            self.sigwinch = Some(id);
        }
        if self.signal_guard.is_none() {
            self.signal_guard = Some(SignalGuard::new()?);
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn register_signals(&mut self) -> Result<()> {
        Ok(())
    }

    #[cfg(unix)]
    fn unregister_signals(&mut self) {
        if let Some(id) = self.sigwinch.take() {
            let _ = signal_hook::low_level::unregister(id);
        }
        self.signal_guard = None;
    }

    #[cfg(not(unix))]
    fn unregister_signals(&mut self) {}
}

impl Platform for Terminal {
    #[cfg(unix)]
    fn read_nonblocking(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let timeout_ms = i32::try_from(self.config.tick_ms).unwrap_or(i32::MAX);

        let ready = unsafe {
            let mut pfd = libc::pollfd {
                fd: libc::STDIN_FILENO,
                events: libc::POLLIN,
                revents: 0,
            };
            libc::poll(&raw mut pfd, 1, timeout_ms)
        };
        if ready < 0 {
            let err = io::Error::last_os_error();
            // A signal (usually SIGWINCH) cut the wait short.
            return if err.kind() == io::ErrorKind::Interrupted {
                Ok(0)
            } else {
                Err(err)
            };
        }
        if ready == 0 {
            return Ok(0);
        }

        let n = unsafe { libc::read(libc::STDIN_FILENO, buf.as_mut_ptr().cast(), buf.len()) };
        if n < 0 {
            let err = io::Error::last_os_error();
            return match err.kind() {
                io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock => Ok(0),
                _ => Err(err),
            };
        }
        // n >= 0 checked above.
        Ok(usize::try_from(n).unwrap_or(0))
    }

    #[cfg(not(unix))]
    fn read_nonblocking(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        std::thread::sleep(std::time::Duration::from_millis(self.config.tick_ms));
        Ok(0)
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        lock.write_all(bytes)?;
        lock.flush()
    }

    fn get_size(&self) -> Size {
        self.size
    }

    #[cfg(unix)]
    fn enable_raw_mode(&mut self) -> Result<()> {
        if self.original_termios.is_some() || !is_tty() {
            return Ok(());
        }

        let fd = libc::STDIN_FILENO;

        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(fd, &raw mut termios) != 0 {
                return Err(io::Error::last_os_error().into());
            }

            self.original_termios = Some(termios);
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = Some(termios);
            }

            // cfmakeraw equivalent: disable all line processing.
            termios.c_iflag &= !(libc::IGNBRK
                | libc::BRKINT
                | libc::PARMRK
                | libc::ISTRIP
                | libc::INLCR
                | libc::IGNCR
                | libc::ICRNL
                | libc::IXON);
            termios.c_oflag &= !libc::OPOST;
            termios.c_lflag &=
                !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
            termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
            termios.c_cflag |= libc::CS8;

            // VMIN=0, VTIME=0: read() returns whatever is there; poll() waits.
            termios.c_cc[libc::VMIN] = 0;
            termios.c_cc[libc::VTIME] = 0;

            if libc::tcsetattr(fd, libc::TCSAFLUSH, &raw const termios) != 0 {
                return Err(io::Error::last_os_error().into());
            }
        }

        debug!("raw mode enabled");
        Ok(())
    }

    #[cfg(not(unix))]
    fn enable_raw_mode(&mut self) -> Result<()> {
        Ok(())
    }

    #[cfg(unix)]
    fn disable_raw_mode(&mut self) -> Result<()> {
        let Some(original) = self.original_termios.take() else {
            return Ok(());
        };

        unsafe {
            if libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, &raw const original) != 0 {
                self.original_termios = Some(original);
                return Err(io::Error::last_os_error().into());
            }
        }

        if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
            *guard = None;
        }
        debug!("raw mode disabled");
        Ok(())
    }

    #[cfg(not(unix))]
    fn disable_raw_mode(&mut self) -> Result<()> {
        Ok(())
    }

    fn poll_resize(&mut self) -> bool {
        if !self.resized.swap(false, Ordering::AcqRel) {
            return false;
        }
        let Some(size) = query_size() else {
            return false;
        };
        if size == self.size {
            return false;
        }
        debug!(cols = size.cols, rows = size.rows, "terminal resized");
        self.size = size;
        true
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = self.leave();
        let _ = self.disable_raw_mode();
        SESSION_ACTIVE.store(false, Ordering::Release);
    }
}

impl std::fmt::Debug for Terminal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Terminal")
            .field("size", &self.size)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
