//! The optimizer's closed tag/attribute sets, each a compile-time sorted
//! array searched with binary search, mirroring the original
//! `AttributeExtractor`/`GroupCollapser` implementation 1:1.

fn contains(sorted: &[&str], needle: &str) -> bool {
    sorted.binary_search(&needle).is_ok()
}

/// https://www.w3.org/TR/SVG/struct.html#GElement
const GROUPABLE: &[&str] = &[
    "a", "altGlyphDef", "animate", "animateColor", "animateMotion", "animateTransform", "circle",
    "clipPath", "color-profile", "cursor", "defs", "desc", "ellipse", "filter", "font",
    "font-face", "foreignObject", "g", "image", "line", "linearGradient", "marker", "mask",
    "path", "pattern", "polygon", "polyline", "radialGradient", "rect", "set", "style", "switch",
    "symbol", "text", "title", "use", "view",
];

/// Subset of https://www.w3.org/TR/SVG11/propidx.html, plus `clip-path`
/// as a deliberate extension (see DESIGN.md's Open Question decisions —
/// it is not inheritable per the SVG spec, but the extractor only hoists
/// it when every run member shares the same value).
const INHERITABLE: &[&str] = &[
    "clip-path",
    "clip-rule",
    "color",
    "color-interpolation",
    "color-interpolation-filters",
    "color-profile",
    "color-rendering",
    "direction",
    "fill",
    "fill-opacity",
    "fill-rule",
    "font",
    "font-family",
    "font-size",
    "font-size-adjust",
    "font-stretch",
    "font-style",
    "font-variant",
    "font-weight",
    "glyph-orientation-horizontal",
    "glyph-orientation-vertical",
    "letter-spacing",
    "paint-order",
    "stroke",
    "stroke-dasharray",
    "stroke-dashoffset",
    "stroke-linecap",
    "stroke-linejoin",
    "stroke-miterlimit",
    "stroke-opacity",
    "stroke-width",
    "transform",
    "visibility",
    "word-spacing",
    "writing-mode",
];

/// `fill`'s semantics differ on animation elements ("freeze"/"remove"),
/// so it is never extracted or collapsed from/into them.
const ANIMATION_ELEMENTS: &[&str] = &["animate", "animateColor", "animateMotion", "animateTransform", "set"];

/// Attributes that block an unwrap candidate outright.
const UNWRAP_BLOCKING_ATTRS: &[&str] = &["class", "filter", "id", "mask", "style"];

pub fn groupable(tag: &str) -> bool {
    contains(GROUPABLE, tag)
}

pub fn inheritable(attr: &str) -> bool {
    contains(INHERITABLE, attr)
}

pub fn is_animation_element(tag: &str) -> bool {
    contains(ANIMATION_ELEMENTS, tag)
}

/// Whether `attr` may be stripped from `tag` once hoisted to a wrapping
/// group (an element with `id` is reference-able and keeps its copy;
/// `fill` stays on animation elements for the reason above).
pub fn extractable(attr: &str, tag: &str, has_id: bool) -> bool {
    if has_id {
        return false;
    }
    if attr == "fill" && is_animation_element(tag) {
        return false;
    }
    true
}

/// Whether a `<g>` element itself is allowed to be collapsed away (its
/// single child's attributes hoisted onto it).
pub fn collapsible(tag: &str) -> bool {
    !is_animation_element(tag)
}

/// Whether `tag` blocks unwrapping due to one of the listed attributes.
pub fn has_unwrap_blocking_attribute(has_attr: impl Fn(&str) -> bool) -> bool {
    UNWRAP_BLOCKING_ATTRS.iter().any(|a| has_attr(a))
}

pub const MIN_RUN_LENGTH: usize = 2;
