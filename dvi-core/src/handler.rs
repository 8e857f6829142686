use crate::decoder::{DviVersion, PageCounters};
use crate::error::Result;
use crate::font::FontId;

/// Semantic callbacks the typesetting state machine emits, consumed by
/// the SVG builder (main pass) or by the pre-scan sentinel.
///
/// Positions are in raw DVI units; the consumer converts to big points
/// using the global `(num, den)` scale and the file's resolution.
pub trait DviHandler {
    fn begin_page(&mut self, pageno: usize, counters: PageCounters);
    fn end_page(&mut self);

    /// A glyph placed at `(h, v)` in `font`. `vertical` reflects the
    /// page's current writing direction. `advance` is true for `set_*`
    /// opcodes (cursor moves by the glyph width) and false for `put_*`.
    fn set_char(&mut self, h: i64, v: i64, code: u32, vertical: bool, font: Option<FontId>, advance: bool) -> Result<()>;

    /// A rule at `(h, v)` with the given height/width. `advance` is true
    /// for `set_rule`, false for `put_rule`.
    fn set_rule(&mut self, h: i64, v: i64, height: i64, width: i64, advance: bool);

    /// The cursor moved without drawing anything (`right`/`down`/`w`/`x`/
    /// `y`/`z`, or a `pop` that restored a prior position).
    fn move_to(&mut self, h: i64, v: i64, caused_by_pop: bool);

    fn set_font(&mut self, font: Option<FontId>);
    fn set_writing_mode(&mut self, vertical: bool);
    fn special(&mut self, body: &str);
    fn preamble(&mut self, version: DviVersion, num: u32, den: u32, mag: u32, comment: &str);
}
