//! DVI/XDV stream decoding and the typesetting state machine.
//!
//! This crate turns a DVI byte stream into a sequence of semantic
//! callbacks ([`handler::DviHandler`]); it knows nothing about SVG. That
//! translation lives one layer up, in the `dvisvgm` crate's builder.

pub mod decoder;
pub mod error;
pub mod font;
pub mod handler;
pub mod postamble;
pub mod prescan;
pub mod reader;
pub mod state;
pub mod units;

pub use decoder::{Decoder, DviExec, DviVersion, PageCounters};
pub use error::{Error, Result};
pub use font::{Font, FontId, FontManager, NullFontManager};
pub use handler::DviHandler;
pub use reader::DviReader;
pub use state::Machine;
