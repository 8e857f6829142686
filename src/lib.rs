//! Converts DVI (and XeTeX XDV) output into SVG documents.
//!
//! `dvi-core` decodes the byte stream into semantic callbacks; `svg-tree`
//! is the mutable document model and structural optimizer; this crate
//! wires the two together (`builder`), adds everything that turns a raw
//! decode into a configured conversion run (`config`, `range`,
//! `transform`, `special`, `hash`), and drives it end to end (`driver`).

pub mod builder;
pub mod config;
pub mod driver;
pub mod error;
pub mod hash;
pub mod range;
pub mod special;
pub mod transform;

pub use config::Config;
pub use driver::{Driver, Page};
pub use error::{Error, Result};
