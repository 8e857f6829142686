//! Translates DVI state-machine callbacks into `svg_tree::Document`
//! edits: the SVG builder / actions layer (`spec.md` §4.7).

use dvi_core::decoder::{DviVersion, PageCounters};
use dvi_core::error::Result as DviResult;
use dvi_core::font::{Font, FontId, FontManager};
use dvi_core::handler::DviHandler;
use dvi_core::units::to_big_points;
use svg_tree::{Document, NodeId};

use crate::config::{self, BboxFormat, Config};
use crate::error::Error;
use crate::special::SpecialManager;

/// The page-size-relevant slice of the pre-scan pass's results that
/// `finalize_page_size` needs to resolve `BboxFormat::{Dvi,Preview,
/// Papersize}`, threaded in from the postamble and [`dvi_core::prescan::PrescanHandler`]
/// since neither is visible from inside a single page's `Machine` run.
#[derive(Clone, Copy, Default)]
pub struct PageSizeHint {
    /// Postamble's declared maximum page extents, in raw DVI units.
    pub dvi_max_width: i64,
    pub dvi_max_height: i64,
    /// Width/height in points from the first `papersize=` special found
    /// for this page, falling back to the first one found anywhere in
    /// the file (see `driver::resolve_papersize_hint`).
    pub papersize_pt: Option<(f64, f64)>,
}

/// Parses a `papersize=<w>,<h>` special body (the form `dvips`/the
/// `preview` package emit) into `(width, height)` points. Any other
/// special body, or a body that isn't exactly two lengths, is `None`.
pub fn parse_papersize_special(body: &str) -> Option<(f64, f64)> {
    let rest = body.strip_prefix("papersize=")?;
    let mut parts = rest.split(',').map(str::trim);
    let w = parts.next()?.parse::<svgtypes::Length>().ok()?;
    let h = parts.next()?.parse::<svgtypes::Length>().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((config::length_to_pt(w), config::length_to_pt(h)))
}

/// Axis-aligned page bounding box, in raw DVI units. `grow` is a no-op
/// once [`BBox::lock`] has been called.
#[derive(Clone, Copy, Debug)]
pub struct BBox {
    min_h: i64,
    max_h: i64,
    min_v: i64,
    max_v: i64,
    touched: bool,
    locked: bool,
}

impl Default for BBox {
    fn default() -> Self {
        BBox { min_h: 0, max_h: 0, min_v: 0, max_v: 0, touched: false, locked: false }
    }
}

impl BBox {
    pub fn grow(&mut self, h: i64, v: i64) {
        if self.locked {
            return;
        }
        if !self.touched {
            self.min_h = h;
            self.max_h = h;
            self.min_v = v;
            self.max_v = v;
            self.touched = true;
            return;
        }
        self.min_h = self.min_h.min(h);
        self.max_h = self.max_h.max(h);
        self.min_v = self.min_v.min(v);
        self.max_v = self.max_v.max(v);
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn width(&self) -> i64 {
        self.max_h - self.min_h
    }

    pub fn height(&self) -> i64 {
        self.max_v - self.min_v
    }

    pub fn is_empty(&self) -> bool {
        !self.touched
    }
}

/// The action context specials are handed: the live document plus the
/// builder's current position and bounding box, all mutable.
pub struct ActionContext<'a> {
    pub doc: &'a mut Document,
    pub page_group: NodeId,
    pub defs: NodeId,
    pub h: i64,
    pub v: i64,
    pub bbox: BBox,
}

impl<'a> ActionContext<'a> {
    /// A minimal context for exercising a handler outside a real page
    /// (used by tests); `page_group` and `defs` both alias the root.
    pub fn new(doc: &'a mut Document) -> Self {
        let root = doc.root();
        ActionContext { doc, page_group: root, defs: root, h: 0, v: 0, bbox: BBox::default() }
    }
}

struct PendingRun {
    text_node: NodeId,
    font: FontId,
    vertical: bool,
}

/// Implements [`DviHandler`] by building a page's [`Document`]. One
/// instance is constructed per page; its `doc` is hand-off to the
/// optimizer and serializer at page end, then dropped.
pub struct Actions<'a> {
    pub doc: Document,
    page_group: NodeId,
    defs: NodeId,
    bbox: BBox,
    h: i64,
    v: i64,
    stale: bool,
    pending: Option<PendingRun>,
    scale: (u32, u32, u32),
    specials: &'a mut SpecialManager,
    config: &'a Config,
    page_size_hint: PageSizeHint,
}

impl<'a> Actions<'a> {
    pub fn new(specials: &'a mut SpecialManager, config: &'a Config) -> Self {
        Self::with_page_size_hint(specials, config, PageSizeHint::default())
    }

    pub fn with_page_size_hint(specials: &'a mut SpecialManager, config: &'a Config, page_size_hint: PageSizeHint) -> Self {
        let mut doc = Document::new("svg");
        let root = doc.root();
        doc.set_attribute(root, "xmlns", "http://www.w3.org/2000/svg");
        doc.set_attribute(root, "xmlns:xlink", "http://www.w3.org/1999/xlink");
        let defs = doc.create_element("defs");
        doc.append_child(root, defs);
        let page_group = doc.create_element("g");
        doc.append_child(root, page_group);
        Actions {
            doc,
            page_group,
            defs,
            bbox: BBox::default(),
            h: 0,
            v: 0,
            stale: false,
            pending: None,
            scale: (1, 1, 1000),
            specials,
            config,
            page_size_hint,
        }
    }

    pub fn bbox(&self) -> BBox {
        self.bbox
    }

    pub fn page_group(&self) -> NodeId {
        self.page_group
    }

    pub fn defs(&self) -> NodeId {
        self.defs
    }

    fn pt(&self, raw: i64) -> f64 {
        let (num, den, mag) = self.scale;
        to_big_points(raw, num, den, mag)
    }

    fn flush_run(&mut self) {
        self.pending = None;
    }

    /// Resolves `self.config.bbox_format` against the page's own content
    /// bbox plus the pre-scan-derived [`PageSizeHint`], returning the
    /// final `(width, height)` in points. `min` (and any format that
    /// can't be resolved) falls back to the tight content bbox.
    fn resolve_page_size(&self) -> (f64, f64) {
        let min_w = self.pt(self.bbox.width().max(0));
        let min_h = self.pt(self.bbox.height().max(0));
        match &self.config.bbox_format {
            BboxFormat::Min | BboxFormat::None => (min_w, min_h),
            BboxFormat::Dvi => {
                let dvi_w = self.pt(self.page_size_hint.dvi_max_width);
                let dvi_h = self.pt(self.page_size_hint.dvi_max_height);
                if dvi_w <= 0.0 || dvi_h <= 0.0 {
                    log::warn!("bbox-format=dvi but the postamble declares a zero-sized page, falling back to min");
                    (min_w, min_h)
                } else {
                    (dvi_w, dvi_h)
                }
            }
            BboxFormat::Preview | BboxFormat::Papersize => match self.page_size_hint.papersize_pt {
                Some((w, h)) => (w, h),
                None => {
                    log::warn!("bbox-format={{preview,papersize}} but no papersize special was found, falling back to min");
                    (min_w, min_h)
                }
            },
            BboxFormat::Named(name) => match config::named_paper_size_pt(name) {
                Some(size) => size,
                None => {
                    let err = Error::InvalidPaperSize(name.clone());
                    log::warn!("{err}, falling back to min");
                    (min_w, min_h)
                }
            },
            BboxFormat::Explicit(expr) => match config::parse_length_list(expr) {
                Some(lengths) if lengths.len() == 2 => (lengths[0], lengths[1]),
                Some(lengths) if lengths.len() == 4 => (lengths[2] - lengths[0], lengths[3] - lengths[1]),
                _ => {
                    let err = Error::InvalidPaperSize(expr.clone());
                    log::warn!("{err}, falling back to min");
                    (min_w, min_h)
                }
            },
        }
    }

    /// Sets the root `<svg>`'s `viewBox`/`width`/`height` per
    /// `self.config.bbox_format`, and — if a `transformCommands` program
    /// is configured — applies it to the page group. Called once the
    /// page is fully built (the bbox can't be known any earlier).
    pub fn finalize_page_size(&mut self) {
        if self.bbox.is_empty() {
            log::warn!("page is empty");
        }
        let root = self.doc.root();
        let (w, h) = self.resolve_page_size();
        if self.config.bbox_format != BboxFormat::None {
            self.doc.set_attribute(root, "width", format!("{w}pt"));
            self.doc.set_attribute(root, "height", format!("{h}pt"));
            self.doc.set_attribute(root, "viewBox", format!("0 0 {w} {h}"));
        }

        if let Some(expr) = &self.config.transform_commands {
            match crate::transform::TransformProgram::parse(expr) {
                Ok(program) => {
                    let (num, den, mag) = self.scale;
                    let ux = if den == 0 { 1.0 } else { to_big_points(1, num, den, mag) };
                    let mut vars = std::collections::HashMap::new();
                    vars.insert("ux", ux);
                    vars.insert("uy", ux);
                    vars.insert("w", w);
                    vars.insert("h", h);
                    match program.evaluate(&vars) {
                        Ok(t) => {
                            self.doc.set_attribute(
                                self.page_group,
                                "transform",
                                format!("matrix({} {} {} {} {} {})", t.a, t.b, t.c, t.d, t.e, t.f),
                            );
                        }
                        Err(e) => log::warn!("transform expression evaluation failed: {e}"),
                    }
                }
                Err(e) => log::warn!("invalid transform expression: {e}"),
            }
        }
    }

    /// Emits accumulated font-face `<style>` and per-font glyph
    /// definitions for every physical font with used characters, keyed
    /// by `unique_font()` so scaled copies share one definition. Called
    /// by the driver once the page's `Machine` (and its borrow of the
    /// font manager) has gone out of scope.
    pub fn finalize_fonts(&mut self, fonts: &dyn FontManager, used: &[FontId]) {
        let mut seen = std::collections::HashSet::new();
        let mut rules = Vec::new();
        for &id in used {
            let Some(font) = fonts.font(id) else { continue };
            let unique = font.unique_font();
            if !seen.insert(unique) {
                continue;
            }
            rules.push(format!(".f{} {{ font-family: \"{}\"; }}", unique.0, font.name()));

            let font_el = self.doc.create_element("font");
            self.doc.set_attribute(font_el, "id", format!("f{}", unique.0));
            self.doc.append_child(self.defs, font_el);
            let face = self.doc.create_element("font-face");
            self.doc.set_attribute(face, "font-family", font.name());
            self.doc.append_child(font_el, face);
            for &code in font.used_chars() {
                let glyph = self.doc.create_element("glyph");
                let ch = char::from_u32(code).unwrap_or('\u{FFFD}');
                self.doc.set_attribute(glyph, "unicode", ch.to_string());
                self.doc.append_child(font_el, glyph);
            }
        }
        if !rules.is_empty() {
            let style = self.doc.create_element("style");
            self.doc.append_child(self.defs, style);
            let text = self.doc.create_text(rules.join("\n"));
            self.doc.append_child(style, text);
        }
    }
}

impl<'a> DviHandler for Actions<'a> {
    fn begin_page(&mut self, _pageno: usize, _counters: PageCounters) {
        self.bbox = BBox::default();
        self.pending = None;
        self.stale = false;
        self.h = 0;
        self.v = 0;
    }

    fn end_page(&mut self) {
        self.flush_run();
    }

    fn set_char(&mut self, h: i64, v: i64, code: u32, vertical: bool, font: Option<FontId>, _advance: bool) -> DviResult<()> {
        self.h = h;
        self.v = v;
        self.bbox.grow(h, v);
        let Some(font_id) = font else {
            return Ok(());
        };

        let continues = matches!(&self.pending, Some(run) if run.font == font_id && run.vertical == vertical) && !self.stale;
        if !continues {
            let text_node = self.doc.create_element("text");
            self.doc.set_attribute(text_node, "x", format!("{}", self.pt(h)));
            self.doc.set_attribute(text_node, "y", format!("{}", self.pt(v)));
            self.doc.set_attribute(text_node, "class", format!("f{}", font_id.0));
            self.doc.append_child(self.page_group, text_node);
            self.pending = Some(PendingRun { text_node, font: font_id, vertical });
        }
        let run = self.pending.as_ref().unwrap();
        let use_node = self.doc.create_element("use");
        self.doc.set_attribute(use_node, "xlink:href", format!("#f{}-{}", font_id.0, code));
        if self.stale && continues {
            self.doc.set_attribute(use_node, "x", format!("{}", self.pt(h)));
            self.doc.set_attribute(use_node, "y", format!("{}", self.pt(v)));
        }
        self.doc.append_child(run.text_node, use_node);
        self.stale = false;
        Ok(())
    }

    fn set_rule(&mut self, h: i64, v: i64, height: i64, width: i64, _advance: bool) {
        self.bbox.grow(h, v);
        self.bbox.grow(h + width, v - height);
        let rect = self.doc.create_element("rect");
        self.doc.set_attribute(rect, "x", format!("{}", self.pt(h)));
        self.doc.set_attribute(rect, "y", format!("{}", self.pt(v - height)));
        self.doc.set_attribute(rect, "width", format!("{}", self.pt(width)));
        self.doc.set_attribute(rect, "height", format!("{}", self.pt(height)));
        self.doc.append_child(self.page_group, rect);
    }

    fn move_to(&mut self, h: i64, v: i64, _caused_by_pop: bool) {
        self.h = h;
        self.v = v;
        self.bbox.grow(h, v);
        self.stale = true;
    }

    fn set_font(&mut self, _font: Option<FontId>) {
        self.flush_run();
    }

    fn set_writing_mode(&mut self, _vertical: bool) {
        self.flush_run();
    }

    fn special(&mut self, body: &str) {
        let mut ctx = ActionContext { doc: &mut self.doc, page_group: self.page_group, defs: self.defs, h: self.h, v: self.v, bbox: self.bbox };
        if let Err(e) = self.specials.dispatch(body, &mut ctx) {
            log::warn!("special handler error: {e}");
        }
        self.h = ctx.h;
        self.v = ctx.v;
        self.bbox = ctx.bbox;
    }

    fn preamble(&mut self, _version: DviVersion, num: u32, den: u32, mag: u32, _comment: &str) {
        self.scale = (num, den, mag);
    }
}
