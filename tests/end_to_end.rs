//! End-to-end scenarios driving the full pipeline: decode a hand-built
//! DVI/XDV byte stream, build a page, optimize, serialize, then assert
//! on the resulting SVG via `roxmltree`.

use dvi_core::font::{Font, FontManager, NullFontManager};
use dvisvgm::config::Config;
use dvisvgm::driver::Driver;
use dvisvgm::hash::NullPageHasher;
use dvisvgm::special::SpecialManager;

fn be(n: i64, width: usize) -> Vec<u8> {
    let bytes = n.to_be_bytes();
    bytes[8 - width..].to_vec()
}

/// An XDV v7 file: one page, one physical font, two glyphs placed via a
/// single `xdv-text-and-glyphs` (opcode 253) command.
fn build_xdv7_two_glyphs() -> Vec<u8> {
    let mut data = Vec::new();

    // pre-amble, version 7
    data.push(247);
    data.push(7);
    data.extend(be(25_400_000, 4));
    data.extend(be(473_628_672, 4));
    data.extend(be(1000, 4));
    data.push(0); // comment length

    // xdv-fnt-def via the regular fntdef opcode (1-byte font number)
    data.push(243);
    data.push(0); // font_num
    data.extend(be(0, 4)); // checksum
    data.extend(be(655_360, 4)); // scale
    data.extend(be(655_360, 4)); // design size
    data.push(0); // area length
    data.push(5); // name length
    data.extend_from_slice(b"cmr10");

    let bop_offset = data.len();
    data.push(139);
    data.extend(std::iter::repeat(0u8).take(40));
    data.extend(be(-1, 4));

    data.push(171); // fnt_num 0

    data.push(253); // xdv-text-and-glyphs
    data.extend(be(0, 2)); // text_len = 0 (no UTF-16 text payload)
    data.extend(be(0, 4)); // width, ignored by geometry
    data.extend(be(2, 2)); // glyph count
    data.extend(be(0, 4)); // dx1
    data.extend(be(0, 4)); // dy1
    data.extend(be(1000, 4)); // dx2
    data.extend(be(0, 4)); // dy2
    data.extend(be(0, 2)); // glyph id 1 (unused by this contract)
    data.extend(be(0, 2)); // glyph id 2

    data.push(140); // eop

    let post_offset = data.len();
    data.push(248);
    data.extend(be(bop_offset as i64, 4));
    data.extend(be(25_400_000, 4));
    data.extend(be(473_628_672, 4));
    data.extend(be(1000, 4));
    data.extend(be(0, 4)); // max page height
    data.extend(be(0, 4)); // max page width
    data.extend(be(1, 2)); // max stack depth
    data.extend(be(1, 2)); // number of pages

    data.push(249); // postpost
    data.extend(be(post_offset as i64, 4));
    data.push(7); // version repeated
    data.extend(std::iter::repeat(223u8).take(4));
    data
}

/// A single page with a `bop`/`eop` pair and no content at all.
fn build_empty_page_dvi() -> Vec<u8> {
    let mut data = Vec::new();
    data.push(247);
    data.push(2);
    data.extend(be(25_400_000, 4));
    data.extend(be(473_628_672, 4));
    data.extend(be(1000, 4));
    data.push(0);

    let bop_offset = data.len();
    data.push(139);
    data.extend(std::iter::repeat(0u8).take(40));
    data.extend(be(-1, 4));
    data.push(140);

    let post_offset = data.len();
    data.push(248);
    data.extend(be(bop_offset as i64, 4));
    data.extend(be(25_400_000, 4));
    data.extend(be(473_628_672, 4));
    data.extend(be(1000, 4));
    data.extend(be(0, 4));
    data.extend(be(0, 4));
    data.extend(be(0, 2));
    data.extend(be(1, 2));

    data.push(249);
    data.extend(be(post_offset as i64, 4));
    data.push(2);
    data.extend(std::iter::repeat(223u8).take(4));
    data
}

fn run(data: Vec<u8>, fonts: &mut dyn FontManager) -> Vec<dvisvgm::driver::Page> {
    let config = Config::default();
    let specials = SpecialManager::new();
    let mut driver = Driver::new(&config, specials, Box::new(NullPageHasher));
    driver.run(data, fonts).unwrap()
}

#[test]
fn xdv7_two_glyphs_become_two_use_elements_in_one_text_run() {
    let mut fonts = NullFontManager::default();
    let pages = run(build_xdv7_two_glyphs(), &mut fonts);
    assert_eq!(pages.len(), 1);

    let doc = roxmltree::Document::parse(&pages[0].svg).unwrap();
    let svg = doc.root_element();
    assert_eq!(svg.tag_name().name(), "svg");

    let text_elements: Vec<_> = svg.descendants().filter(|n| n.has_tag_name("text")).collect();
    assert_eq!(text_elements.len(), 1, "both glyphs share one text run");

    let uses: Vec<_> = text_elements[0].children().filter(|n| n.has_tag_name("use")).collect();
    assert_eq!(uses.len(), 2);

    // The font was used by the page, so a <font>/<font-face> def and a
    // matching .fN style rule must be present in <defs>.
    let font_defs: Vec<_> = svg.descendants().filter(|n| n.has_tag_name("font")).collect();
    assert_eq!(font_defs.len(), 1);
    let style: Vec<_> = svg.descendants().filter(|n| n.has_tag_name("style")).collect();
    assert_eq!(style.len(), 1);

    let font_id = fonts.resolve_local(0).unwrap();
    assert_eq!(fonts.font(font_id).unwrap().used_chars(), &[0], "glyph-array glyphs are attributed under code 0");
}

#[test]
fn empty_page_produces_zero_size_svg_with_no_drawable_content() {
    let mut fonts = NullFontManager::default();
    let pages = run(build_empty_page_dvi(), &mut fonts);
    assert_eq!(pages.len(), 1);

    let doc = roxmltree::Document::parse(&pages[0].svg).unwrap();
    let svg = doc.root_element();
    assert_eq!(svg.attribute("width"), Some("0pt"));
    assert_eq!(svg.attribute("height"), Some("0pt"));

    let drawables: Vec<_> = svg.descendants().filter(|n| n.has_tag_name("text") || n.has_tag_name("rect")).collect();
    assert!(drawables.is_empty());
}

#[test]
fn output_always_round_trips_through_an_xml_parser() {
    let mut fonts = NullFontManager::default();
    for page in run(build_xdv7_two_glyphs(), &mut fonts) {
        roxmltree::Document::parse(&page.svg).expect("driver output must be well-formed XML");
    }
}
