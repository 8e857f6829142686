//! The core's configuration contract (`spec.md` §6), independent of how
//! it's populated — the CLI (`main.rs`) builds one from `pico-args`;
//! library embedders can build one directly via `Default`.

use svgtypes::{Length, LengthUnit};

/// How the output SVG's bounding box / page size is determined.
#[derive(Clone, Debug, PartialEq)]
pub enum BboxFormat {
    /// Tight bounding box of the page content.
    Min,
    /// Centered within the DVI postamble's declared page dimensions.
    Dvi,
    /// `\special{papersize=...}`-driven size (from the pre-scan pass),
    /// as seen by the `preview` package.
    Preview,
    /// `\special{papersize=...}`-driven size (from the pre-scan pass),
    /// as emitted directly by `dvips`-style drivers.
    Papersize,
    /// No explicit sizing; the serializer omits `width`/`height`.
    None,
    /// A named paper size (`a4`, `letter`, ...).
    Named(String),
    /// An explicit list of length expressions (`llx lly urx ury`, or
    /// `width height`), still unparsed.
    Explicit(String),
}

impl Default for BboxFormat {
    fn default() -> Self {
        BboxFormat::Min
    }
}

impl BboxFormat {
    pub fn parse(s: &str) -> BboxFormat {
        match s {
            "min" => BboxFormat::Min,
            "dvi" => BboxFormat::Dvi,
            "preview" => BboxFormat::Preview,
            "papersize" => BboxFormat::Papersize,
            "none" => BboxFormat::None,
            other if other.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) && !other.contains(char::is_whitespace) => {
                BboxFormat::Named(other.to_string())
            }
            other => BboxFormat::Explicit(other.to_string()),
        }
    }
}

/// A handful of the most common ISO/US paper sizes, `(width, height)` in
/// points. Not the original's full table (out of scope: a font/paper
/// database), just enough for the common case a named `--bbox-format`
/// actually hits.
pub fn named_paper_size_pt(name: &str) -> Option<(f64, f64)> {
    let mm = |w: f64, h: f64| (w * 72.0 / 25.4, h * 72.0 / 25.4);
    let inch = |w: f64, h: f64| (w * 72.0, h * 72.0);
    match name.to_ascii_lowercase().as_str() {
        "a3" => Some(mm(297.0, 420.0)),
        "a4" => Some(mm(210.0, 297.0)),
        "a5" => Some(mm(148.0, 210.0)),
        "b5" => Some(mm(176.0, 250.0)),
        "letter" => Some(inch(8.5, 11.0)),
        "legal" => Some(inch(8.5, 14.0)),
        "executive" => Some(inch(7.25, 10.5)),
        _ => None,
    }
}

/// Converts a parsed [`Length`] to points. Percentages and font-relative
/// units (`em`/`ex`) have no containing context at the bbox-format layer,
/// so they're taken as already being in points — the same situation
/// `transform.rs` documents for its own unit handling.
pub fn length_to_pt(l: Length) -> f64 {
    match l.unit {
        LengthUnit::Pt => l.number,
        LengthUnit::In => l.number * 72.0,
        LengthUnit::Cm => l.number * 72.0 / 2.54,
        LengthUnit::Mm => l.number * 72.0 / 25.4,
        LengthUnit::Pc => l.number * 12.0,
        LengthUnit::Px | LengthUnit::None | LengthUnit::Em | LengthUnit::Ex | LengthUnit::Percent => l.number,
    }
}

/// Parses a whitespace- or comma-separated list of length expressions
/// (`"llx lly urx ury"` or `"width height"`). `None` on any malformed
/// entry — the caller decides the fallback policy.
pub fn parse_length_list(s: &str) -> Option<Vec<f64>> {
    s.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|p| !p.is_empty())
        .map(|p| p.parse::<Length>().ok().map(length_to_pt))
        .collect()
}

/// Which glyphs get traced (out of scope: the actual tracer; this only
/// selects the mode a font manager would be told to use).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraceMode {
    /// Retrace every glyph, even ones already cached.
    All,
    /// Trace only glyphs missing from the cache.
    Missing,
    /// Trace only glyphs actually used (the default).
    Required,
}

impl Default for TraceMode {
    fn default() -> Self {
        TraceMode::Required
    }
}

#[derive(Clone, Debug, Default)]
pub struct Config {
    pub bbox_format: BboxFormat,
    pub trace_mode: TraceMode,
    pub compute_progress: bool,
    pub hash_algorithm_name: Option<String>,
    pub ignore_specials_list: Vec<String>,
    pub page_range_expression: String,
    pub transform_commands: Option<String>,
    pub quiet: bool,
    pub verbose: bool,
}

impl Config {
    pub fn ignores_special(&self, prefix: &str) -> bool {
        self.ignore_specials_list.iter().any(|p| p == "*" || p == prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bbox_format_recognizes_named_keywords() {
        assert_eq!(BboxFormat::parse("min"), BboxFormat::Min);
        assert_eq!(BboxFormat::parse("dvi"), BboxFormat::Dvi);
        assert_eq!(BboxFormat::parse("a4"), BboxFormat::Named("a4".to_string()));
    }

    #[test]
    fn bbox_format_falls_back_to_explicit_length_list() {
        assert_eq!(BboxFormat::parse("1cm 2cm 3cm 4cm"), BboxFormat::Explicit("1cm 2cm 3cm 4cm".to_string()));
    }

    #[test]
    fn ignore_list_supports_wildcard() {
        let cfg = Config { ignore_specials_list: vec!["*".to_string()], ..Default::default() };
        assert!(cfg.ignores_special("color"));
        assert!(cfg.ignores_special("anything"));
    }

    #[test]
    fn ignore_list_matches_specific_prefixes() {
        let cfg = Config { ignore_specials_list: vec!["color".to_string(), "html".to_string()], ..Default::default() };
        assert!(cfg.ignores_special("color"));
        assert!(!cfg.ignores_special("tpic"));
    }

    #[test]
    fn named_paper_size_is_case_insensitive() {
        let (w, h) = named_paper_size_pt("A4").unwrap();
        assert!((w - 595.2755905511812).abs() < 1e-6);
        assert!((h - 841.8897637795277).abs() < 1e-6);
        assert!(named_paper_size_pt("not-a-size").is_none());
    }

    #[test]
    fn parse_length_list_reads_a_four_element_bbox() {
        let lengths = parse_length_list("1cm 2cm 3cm 4cm").unwrap();
        assert_eq!(lengths.len(), 4);
        assert!((lengths[0] - 1.0 * 72.0 / 2.54).abs() < 1e-9);
    }

    #[test]
    fn parse_length_list_rejects_malformed_entries() {
        assert!(parse_length_list("1cm notalength").is_none());
    }
}
