//! Font manager contract.
//!
//! Resolving an actual font file (Metafont/TFM or OpenType), tracing its
//! glyph outlines, and expanding virtual fonts are out of scope for this
//! crate — only the contract a font manager must satisfy is specified
//! here, plus a [`NullFontManager`] that satisfies it trivially so the
//! rest of the pipeline is buildable and testable standalone.

use std::collections::HashMap;

/// A process-wide, stable font identifier assigned by the font manager.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct FontId(pub u32);

/// A resolved font, physical or virtual.
pub trait Font {
    fn name(&self) -> &str;
    /// Empty if the font file could not be located.
    fn path(&self) -> &str;
    fn design_size(&self) -> f64;
    fn scaled_size(&self) -> f64;
    fn is_virtual(&self) -> bool;
    /// The canonical instance shared by every scaled copy of this font,
    /// so glyph tracing / character-usage accounting happens once.
    fn unique_font(&self) -> FontId;
    /// Character codes used so far by this scaled instance (tracked by
    /// the builder, not the font manager itself).
    fn used_chars(&self) -> &[u32];
    fn mark_used(&mut self, code: u32);

    /// Advance width of `code` in DVI units at this font's scaled size.
    /// The real metric table lives in the (out-of-scope) font file
    /// loader; without one, the cursor simply does not advance.
    fn glyph_width(&self, _code: u32) -> i64 {
        0
    }
}

/// Assigns stable IDs to fonts referenced by `fntdef` and resolves them.
pub trait FontManager {
    /// Called once per `fntdef`/`xdv-fnt-def` encountered. Returns the
    /// font's resolved identity, or `None` if it could not be located
    /// (a warning, not a fatal error — the interpreter keeps going and
    /// simply suppresses glyph output for that font).
    fn define(
        &mut self,
        local_num: u32,
        name: &str,
        area: &str,
        checksum: u32,
        scaled_size: f64,
        design_size: f64,
    ) -> Option<FontId>;

    fn font(&self, id: FontId) -> Option<&dyn Font>;
    fn font_mut(&mut self, id: FontId) -> Option<&mut dyn Font>;

    /// Resolves a font local number (as used by `fntnum`/`fnt`) to the
    /// ID it was `define`d under within the current page context.
    fn resolve_local(&self, local_num: u32) -> Option<FontId>;
}

struct SimpleFont {
    name: String,
    path: String,
    design_size: f64,
    scaled_size: f64,
    is_virtual: bool,
    unique: FontId,
    used: Vec<u32>,
}

impl Font for SimpleFont {
    fn name(&self) -> &str {
        &self.name
    }
    fn path(&self) -> &str {
        &self.path
    }
    fn design_size(&self) -> f64 {
        self.design_size
    }
    fn scaled_size(&self) -> f64 {
        self.scaled_size
    }
    fn is_virtual(&self) -> bool {
        self.is_virtual
    }
    fn unique_font(&self) -> FontId {
        self.unique
    }
    fn used_chars(&self) -> &[u32] {
        &self.used
    }
    fn mark_used(&mut self, code: u32) {
        if !self.used.contains(&code) {
            self.used.push(code);
        }
    }
}

/// A font manager that always resolves fonts, but never locates a real
/// font file. Every scaled font of the same `(name, checksum)` shares a
/// `unique_font()` id, matching the real contract's deduplication rule.
#[derive(Default)]
pub struct NullFontManager {
    fonts: Vec<SimpleFont>,
    locals: HashMap<u32, FontId>,
    unique_by_key: HashMap<(String, u32), FontId>,
}

impl FontManager for NullFontManager {
    fn define(
        &mut self,
        local_num: u32,
        name: &str,
        _area: &str,
        checksum: u32,
        scaled_size: f64,
        design_size: f64,
    ) -> Option<FontId> {
        // `id` must equal this font's position in `fonts` — `font()`/
        // `font_mut()` index into it directly by `FontId`.
        let id = FontId(self.fonts.len() as u32);
        let key = (name.to_string(), checksum);
        let unique = *self.unique_by_key.entry(key).or_insert(id);
        self.fonts.push(SimpleFont {
            name: name.to_string(),
            path: String::new(),
            design_size,
            scaled_size,
            is_virtual: false,
            unique,
            used: Vec::new(),
        });
        self.locals.insert(local_num, id);
        Some(id)
    }

    fn font(&self, id: FontId) -> Option<&dyn Font> {
        self.fonts.get(id.0 as usize).map(|f| f as &dyn Font)
    }

    fn font_mut(&mut self, id: FontId) -> Option<&mut dyn Font> {
        self.fonts.get_mut(id.0 as usize).map(|f| f as &mut dyn Font)
    }

    fn resolve_local(&self, local_num: u32) -> Option<FontId> {
        self.locals.get(&local_num).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_copies_share_unique_font() {
        let mut mgr = NullFontManager::default();
        let a = mgr.define(0, "cmr10", "", 42, 10.0, 10.0).unwrap();
        let b = mgr.define(1, "cmr10", "", 42, 7.0, 10.0).unwrap();
        assert_ne!(a, b); // distinct scaled instances
        assert_eq!(mgr.font(a).unwrap().unique_font(), mgr.font(b).unwrap().unique_font());
    }
}
