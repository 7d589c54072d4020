// SPDX-License-Identifier: MIT
//
// Runtime configuration.
//
// One TOML document, three sections, every key optional:
//
//   [render]   how frames are encoded (DiffRenderer)
//   [input]    decoder limits (InputDecoder)
//   [session]  which terminal modes the session turns on (Terminal, App)
//
// Each section is a small `Copy` struct handed to the component that uses
// it, so components stay usable without a Config (tests build them with
// `Default`).

use std::fs;
use std::io;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::ansi::MouseMode;
use crate::error::{Error, Result};
use crate::style::ColorDepth;

/// Frame encoding options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Wrap each frame in DEC 2026 begin/end markers.
    pub sync_output: bool,
    /// Richest color form the terminal understands.
    pub color_depth: ColorDepth,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            sync_output: true,
            color_depth: ColorDepth::TrueColor,
        }
    }
}

/// Input decoder limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// CSI sequences longer than this (in bytes, including `ESC [`) are
    /// discarded. Config files cannot go below [`MIN_SEQUENCE_LEN`].
    pub max_sequence_len: usize,
    /// Pasted bytes beyond this are dropped; the paste is still delivered.
    pub max_paste_len: usize,
}

/// Smallest `max_sequence_len` a config file may set. The longest report
/// the decoder understands, an SGR mouse event at column and row 65535
/// (`ESC [ < 95 ; 65535 ; 65535 M`), is 18 bytes.
pub const MIN_SEQUENCE_LEN: usize = 32;

impl DecoderConfig {
    /// Raise `max_sequence_len` to [`MIN_SEQUENCE_LEN`] if it is below it.
    #[must_use]
    pub fn clamped(self) -> Self {
        if self.max_sequence_len >= MIN_SEQUENCE_LEN {
            return self;
        }
        warn!(
            requested = self.max_sequence_len,
            used = MIN_SEQUENCE_LEN,
            "input.max_sequence_len too small, raised"
        );
        Self {
            max_sequence_len: MIN_SEQUENCE_LEN,
            ..self
        }
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_sequence_len: 256,
            max_paste_len: 1 << 20,
        }
    }
}

/// Terminal modes for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub alt_screen: bool,
    pub mouse: MouseMode,
    pub bracketed_paste: bool,
    pub focus_events: bool,
    /// Ask the terminal for kitty keyboard reports (disambiguated keys).
    pub kitty_keyboard: bool,
    pub hide_cursor: bool,
    /// Read timeout in milliseconds. An idle timeout produces a `Tick`.
    pub tick_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            alt_screen: true,
            mouse: MouseMode::Drag,
            bracketed_paste: true,
            focus_events: true,
            kitty_keyboard: false,
            hide_cursor: true,
            tick_ms: 16,
        }
    }
}

/// The whole configuration file.
///
/// ```
/// use tessel_term::config::Config;
/// use tessel_term::style::ColorDepth;
///
/// let cfg = Config::from_toml_str("[render]\ncolor_depth = \"palette\"\n").unwrap();
/// assert_eq!(cfg.render.color_depth, ColorDepth::Palette);
/// assert!(cfg.render.sync_output);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub render: RenderConfig,
    #[serde(rename = "input")]
    pub decoder: DecoderConfig,
    pub session: SessionConfig,
    /// Filter directive for the log file when `RUST_LOG` is not set.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            render: RenderConfig::default(),
            decoder: DecoderConfig::default(),
            session: SessionConfig::default(),
            log_level: "info".to_owned(),
        }
    }
}

impl Config {
    /// Parse a TOML document. Missing keys take their defaults, and a
    /// `max_sequence_len` too small for real key sequences is raised to
    /// [`MIN_SEQUENCE_LEN`].
    ///
    /// # Errors
    ///
    /// [`Error::ConfigParse`] if the text is not valid TOML or a value has
    /// the wrong type.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let mut cfg: Self = toml::from_str(text)?;
        cfg.decoder = cfg.decoder.clamped();
        Ok(cfg)
    }

    /// Read and parse the file at `path`.
    ///
    /// # Errors
    ///
    /// [`Error::ConfigRead`] if the file cannot be read,
    /// [`Error::ConfigParse`] if it does not parse.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Like [`load`](Self::load), but a missing file (or no path at all)
    /// yields the defaults. A file that exists but is broken is still an
    /// error.
    ///
    /// # Errors
    ///
    /// As [`load`](Self::load), except for a missing file.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        match Self::load(path) {
            Err(Error::ConfigRead { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            other => other,
        }
    }
}
