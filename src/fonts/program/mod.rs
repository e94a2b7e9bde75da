//! Font programs (glyph repositories).
//!
//! A font program answers "which glyph draws this character" and "which
//! glyph has this code", and carries the names, metrics and (optionally)
//! the bytes needed to embed it. Engines own exactly one program.

pub mod cid;
pub mod doc;
pub mod truetype;
pub mod type1;
pub mod type3;

pub use cid::{CidFontProgram, PredefinedCidFont, PREDEFINED_CID_FONTS};
pub use doc::{CidSystemInfo, DocFontKind, DocFontProgram};
pub use truetype::{GlyphSubsetter, PassThroughSubsetter, TrueTypeProgram};
pub use type1::{Type1Program, STANDARD_FONTS};
pub use type3::{Type3Glyph, Type3Program, DEFAULT_FONT_MATRIX};

use super::glyph::Glyph;
use super::metrics::{FontMetrics, FontNames};
use std::collections::{BTreeMap, HashMap};

/// Glyph lookup shared by all program kinds.
pub trait GlyphRepository {
    /// Names and style.
    fn font_names(&self) -> &FontNames;

    /// Metrics in 1000-unit glyph space.
    fn metrics(&self) -> &FontMetrics;

    /// Glyph drawing `unicode`.
    fn glyph(&self, unicode: u32) -> Option<&Glyph>;

    /// Glyph with program-local code `code`.
    fn glyph_by_code(&self, code: i32) -> Option<&Glyph>;

    /// Glyph selected by a byte of a font-specific encoding.
    fn glyph_for_byte(&self, code: u8) -> Option<&Glyph> {
        self.glyph_by_code(code as i32)
    }

    /// Whether codes address the program directly (symbolic font).
    fn is_font_specific(&self) -> bool;

    /// Number of glyphs.
    fn count_of_glyphs(&self) -> usize;

    /// The glyph used when nothing else matches.
    fn notdef(&self) -> Option<&Glyph> {
        self.glyph_by_code(0)
    }
}

/// Glyphs indexed by code and by Unicode.
#[derive(Debug, Clone, Default)]
pub struct GlyphTable {
    by_code: BTreeMap<i32, Glyph>,
    by_unicode: HashMap<u32, i32>,
}

impl GlyphTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a glyph. The first glyph registered for a Unicode value keeps it.
    pub fn insert(&mut self, glyph: Glyph) {
        if let Some(unicode) = glyph.unicode {
            self.by_unicode.entry(unicode).or_insert(glyph.code);
        }
        self.by_code.insert(glyph.code, glyph);
    }

    /// Map an extra Unicode value onto an existing code.
    pub fn alias(&mut self, unicode: u32, code: i32) {
        if self.by_code.contains_key(&code) {
            self.by_unicode.entry(unicode).or_insert(code);
        }
    }

    /// Glyph drawing `unicode`.
    pub fn by_unicode(&self, unicode: u32) -> Option<&Glyph> {
        self.by_unicode.get(&unicode).and_then(|c| self.by_code.get(c))
    }

    /// Glyph with code `code`.
    pub fn by_code(&self, code: i32) -> Option<&Glyph> {
        self.by_code.get(&code)
    }

    /// Mutable glyph with code `code`.
    pub fn by_code_mut(&mut self, code: i32) -> Option<&mut Glyph> {
        self.by_code.get_mut(&code)
    }

    /// Glyphs in code order.
    pub fn iter(&self) -> impl Iterator<Item = &Glyph> {
        self.by_code.values()
    }

    /// Number of glyphs.
    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

/// Every kind of font program an engine can own.
#[derive(Debug, Clone)]
pub enum FontProgram {
    /// TrueType or OpenType (CFF) outlines
    TrueType(TrueTypeProgram),
    /// Type 1, including the 14 standard fonts
    Type1(Type1Program),
    /// Predefined CJK font, never embedded
    Cid(CidFontProgram),
    /// Rebuilt from an existing font dictionary
    Doc(DocFontProgram),
}

macro_rules! dispatch {
    ($self:ident, $p:ident => $e:expr) => {
        match $self {
            FontProgram::TrueType($p) => $e,
            FontProgram::Type1($p) => $e,
            FontProgram::Cid($p) => $e,
            FontProgram::Doc($p) => $e,
        }
    };
}

impl GlyphRepository for FontProgram {
    fn font_names(&self) -> &FontNames {
        dispatch!(self, p => p.font_names())
    }

    fn metrics(&self) -> &FontMetrics {
        dispatch!(self, p => p.metrics())
    }

    fn glyph(&self, unicode: u32) -> Option<&Glyph> {
        dispatch!(self, p => p.glyph(unicode))
    }

    fn glyph_by_code(&self, code: i32) -> Option<&Glyph> {
        dispatch!(self, p => p.glyph_by_code(code))
    }

    fn glyph_for_byte(&self, code: u8) -> Option<&Glyph> {
        dispatch!(self, p => p.glyph_for_byte(code))
    }

    fn is_font_specific(&self) -> bool {
        dispatch!(self, p => p.is_font_specific())
    }

    fn count_of_glyphs(&self) -> usize {
        dispatch!(self, p => p.count_of_glyphs())
    }

    fn notdef(&self) -> Option<&Glyph> {
        dispatch!(self, p => p.notdef())
    }
}

impl FontProgram {
    /// Whether this is one of the 14 standard fonts.
    pub fn is_builtin(&self) -> bool {
        matches!(self, FontProgram::Type1(p) if p.is_builtin())
    }

    /// Whether the program has CFF outlines.
    pub fn is_cff(&self) -> bool {
        match self {
            FontProgram::TrueType(p) => p.is_cff(),
            FontProgram::Doc(p) => p.is_cff(),
            _ => false,
        }
    }

    /// Program bytes available for embedding.
    pub fn program_bytes(&self) -> Option<&[u8]> {
        match self {
            FontProgram::TrueType(p) => p.data(),
            FontProgram::Type1(p) => p.data(),
            FontProgram::Cid(_) | FontProgram::Doc(_) => None,
        }
    }
}

impl From<TrueTypeProgram> for FontProgram {
    fn from(p: TrueTypeProgram) -> Self {
        FontProgram::TrueType(p)
    }
}

impl From<Type1Program> for FontProgram {
    fn from(p: Type1Program) -> Self {
        FontProgram::Type1(p)
    }
}

impl From<CidFontProgram> for FontProgram {
    fn from(p: CidFontProgram) -> Self {
        FontProgram::Cid(p)
    }
}

impl From<DocFontProgram> for FontProgram {
    fn from(p: DocFontProgram) -> Self {
        FontProgram::Doc(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glyph_table_first_unicode_wins() {
        let mut table = GlyphTable::new();
        table.insert(Glyph::new(3, 500, Some(0x41)));
        table.insert(Glyph::new(9, 600, Some(0x41)));
        assert_eq!(table.by_unicode(0x41).map(|g| g.code), Some(3));
        assert_eq!(table.by_code(9).map(|g| g.width), Some(600));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_alias_requires_existing_code() {
        let mut table = GlyphTable::new();
        table.insert(Glyph::new(1, 250, Some(0x20)));
        table.alias(0xA0, 1);
        table.alias(0x2007, 42);
        assert_eq!(table.by_unicode(0xA0).map(|g| g.code), Some(1));
        assert!(table.by_unicode(0x2007).is_none());
    }

    #[test]
    fn test_iter_in_code_order() {
        let mut table = GlyphTable::new();
        for code in [5, 1, 3] {
            table.insert(Glyph::new(code, 100, None));
        }
        let codes: Vec<i32> = table.iter().map(|g| g.code).collect();
        assert_eq!(codes, vec![1, 3, 5]);
    }

    #[test]
    fn test_enum_dispatch() {
        let program: FontProgram = Type1Program::standard("Helvetica").unwrap().into();
        assert!(program.is_builtin());
        assert_eq!(program.font_names().font_name, "Helvetica");
        assert_eq!(program.glyph('A' as u32).map(|g| g.width), Some(667));
        assert!(program.program_bytes().is_none());
    }
}
