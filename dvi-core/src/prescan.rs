use crate::decoder::{DviVersion, PageCounters};
use crate::error::Result;
use crate::font::FontId;
use crate::handler::DviHandler;

/// A sentinel [`DviHandler`] used for the one full walk over every page
/// that must happen before the main pass. It builds no SVG tree; it only
/// collects the side information specials need ahead of time (e.g. a
/// `papersize` special seen on a later page widening the bbox used by an
/// earlier one).
///
/// Concrete specials are out of scope; this struct exposes the raw feed
/// (`special` bodies per page, plus a running page bounding box driven by
/// rule/glyph extents) that a special dispatcher can consult during the
/// main pass.
#[derive(Default)]
pub struct PrescanHandler {
    pub specials_by_page: Vec<Vec<String>>,
    pub max_width: i64,
    pub max_height: i64,
    current_page: usize,
    page_min_h: i64,
    page_max_h: i64,
    page_min_v: i64,
    page_max_v: i64,
}

impl PrescanHandler {
    pub fn new() -> Self {
        Self::default()
    }

    fn touch(&mut self, h: i64, v: i64) {
        self.page_min_h = self.page_min_h.min(h);
        self.page_max_h = self.page_max_h.max(h);
        self.page_min_v = self.page_min_v.min(v);
        self.page_max_v = self.page_max_v.max(v);
    }
}

impl DviHandler for PrescanHandler {
    fn begin_page(&mut self, _pageno: usize, _counters: PageCounters) {
        self.current_page = self.specials_by_page.len();
        self.specials_by_page.push(Vec::new());
        self.page_min_h = 0;
        self.page_max_h = 0;
        self.page_min_v = 0;
        self.page_max_v = 0;
    }

    fn end_page(&mut self) {
        let width = self.page_max_h - self.page_min_h;
        let height = self.page_max_v - self.page_min_v;
        self.max_width = self.max_width.max(width);
        self.max_height = self.max_height.max(height);
    }

    fn set_char(&mut self, h: i64, v: i64, _code: u32, _vertical: bool, _font: Option<FontId>, _advance: bool) -> Result<()> {
        self.touch(h, v);
        Ok(())
    }

    fn set_rule(&mut self, h: i64, v: i64, height: i64, width: i64, _advance: bool) {
        self.touch(h, v);
        self.touch(h + width, v - height);
    }

    fn move_to(&mut self, h: i64, v: i64, _caused_by_pop: bool) {
        self.touch(h, v);
    }

    fn set_font(&mut self, _font: Option<FontId>) {}
    fn set_writing_mode(&mut self, _vertical: bool) {}

    fn special(&mut self, body: &str) {
        self.specials_by_page[self.current_page].push(body.to_string());
    }

    fn preamble(&mut self, _version: DviVersion, _num: u32, _den: u32, _mag: u32, _comment: &str) {}
}
