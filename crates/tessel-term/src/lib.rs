// SPDX-License-Identifier: MIT
//
// tessel-term: the terminal protocol layer of tessel.
//
// A cell screen that widgets draw into through clipped sub-regions, a
// diff renderer that sends only the cells that changed since the last
// frame with the fewest style escapes, and an input decoder that turns
// raw terminal bytes into keys, mouse reports, pastes, and focus changes.
//
// Pipeline, once per frame:
//
//   Platform::read_nonblocking → InputDecoder::parse → Widget::handle_event
//   → Widget::render(SubScreen) → DiffRenderer::render → Platform::write
//
// Terminal control is done directly with ANSI escape sequences and raw
// termios. Every byte sent to the terminal is accounted for.

pub mod ansi;
pub mod app;
pub mod buffer;
pub mod cell;
pub mod config;
pub mod diff;
pub mod error;
pub mod input;
pub mod output;
pub mod style;
pub mod terminal;
pub mod widget;
pub mod width;

pub use app::App;
pub use buffer::{BorderStyle, Rect, Screen, SubScreen, Surface};
pub use cell::Cell;
pub use config::Config;
pub use diff::{DiffRenderer, RenderStats};
pub use error::{Error, Result};
pub use input::{Event, InputDecoder, Key, KeyEvent, Modifiers, NamedKey};
pub use style::{Attr, Color, Style};
pub use terminal::{Platform, Size, Terminal};
pub use widget::{EventResult, SizeHint, Widget};
