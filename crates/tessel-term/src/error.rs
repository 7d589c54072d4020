// SPDX-License-Identifier: MIT
//
// Error type for the protocol layer.
//
// Only conditions the caller can act on are errors. Out-of-bounds cell
// access, malformed input sequences, and dimension changes between frames
// are ordinary behavior and never reach this type.

use std::io;
use std::path::PathBuf;

/// Errors surfaced by the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A cell grid, snapshot, or output arena could not be reserved.
    ///
    /// The structure that requested the memory is left exactly as it was.
    #[error("cannot allocate storage for {cells} cells")]
    Alloc {
        /// Number of cells (or bytes, for the output arena) requested.
        cells: usize,
    },

    /// Writing a frame or talking to the terminal failed.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// A second [`Terminal`](crate::terminal::Terminal) was opened while
    /// another one is still alive.
    #[error("a terminal session is already active in this process")]
    SessionActive,

    /// The configuration file exists but could not be read.
    #[error("failed to read config file {}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The configuration text is not valid TOML for [`Config`](crate::config::Config).
    #[error("invalid configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

/// Shorthand used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
