//! Type 3 fonts: glyphs drawn by content-stream procedures.
//!
//! Characters get byte codes on first use, starting at 1. The encoding is
//! written as `/Differences` over the registered codes only.

use super::encoding::FontEncoding;
use super::font::{number, to_unicode_stream, DecodedText, PdfFont, SourceDictionary};
use super::glyph::Glyph;
use super::glyph_list;
use super::program::{GlyphRepository, Type3Glyph, Type3Program, DEFAULT_FONT_MATRIX};
use super::subset::{SubsetRanges, UsedCodes};
use super::widths::{parse_simple_widths, simple_widths};
use crate::cmap::{generate_to_unicode, CMapToUnicode, DEFAULT_BFRANGE_BATCH};
use crate::error::{Error, Result};
use crate::object::{Dictionary, Object, ObjectRef, ObjectStore};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

/// A Type 3 font under construction or read from a document.
#[derive(Debug)]
pub struct Type3Font {
    program: Type3Program,
    encoding: FontEncoding,
    to_unicode: Option<Arc<CMapToUnicode>>,
    used: UsedCodes,
    subset: bool,
    subset_ranges: SubsetRanges,
    bfrange_batch: usize,
    placeholders: RefCell<HashMap<u32, Glyph>>,
    source: Option<SourceDictionary>,
    flushed: Option<ObjectRef>,
}

impl Type3Font {
    /// Empty font. `colorized` fonts get `d0` glyphs that carry their own color.
    pub fn new(name: impl Into<String>, colorized: bool) -> Self {
        Self::with_program(Type3Program::new(name, colorized), FontEncoding::create_empty())
    }

    fn with_program(program: Type3Program, encoding: FontEncoding) -> Self {
        Self {
            program,
            encoding,
            to_unicode: None,
            used: UsedCodes::new(),
            subset: false,
            subset_ranges: SubsetRanges::new(),
            bfrange_batch: DEFAULT_BFRANGE_BATCH,
            placeholders: RefCell::new(HashMap::new()),
            source: None,
            flushed: None,
        }
    }

    /// Rebuild a Type 3 font from its dictionary.
    ///
    /// Glyph procedures come from `/CharProcs` by the names in
    /// `/Encoding /Differences`; the color mode follows the procedures'
    /// `d0`/`d1` operators.
    pub(crate) fn from_document(
        source: SourceDictionary,
        to_unicode: Option<Arc<CMapToUnicode>>,
        store: &dyn ObjectStore,
    ) -> Result<Self> {
        let dict = &source.dict;
        let name = store
            .resolve_key(dict, "Name")
            .or_else(|| store.resolve_key(dict, "BaseFont"))
            .and_then(|o| o.as_name())
            .unwrap_or("Type3")
            .to_string();
        let char_procs = store
            .resolve_key(dict, "CharProcs")
            .and_then(|o| o.as_dict())
            .ok_or_else(|| Error::missing(format!("Type3 font {}", name), "CharProcs"))?;
        let differences = store
            .resolve_key(dict, "Encoding")
            .and_then(|o| o.as_dict())
            .and_then(|enc| store.resolve_key(enc, "Differences"))
            .and_then(|o| o.as_array())
            .ok_or_else(|| Error::missing(format!("Type3 font {}", name), "Encoding"))?;

        let mut matrix = DEFAULT_FONT_MATRIX;
        if let Some(values) = store.resolve_key(dict, "FontMatrix").and_then(|o| o.as_array()) {
            for (slot, value) in matrix.iter_mut().zip(values) {
                if let Some(v) = store.resolve(value).as_number() {
                    *slot = v;
                }
            }
        }
        let first_char = store
            .resolve_key(dict, "FirstChar")
            .and_then(|o| o.as_integer())
            .unwrap_or(0);
        let widths = store
            .resolve_key(dict, "Widths")
            .and_then(|o| o.as_array())
            .map(|arr| parse_simple_widths(first_char, arr, store))
            .unwrap_or_default();

        let mut procedures = Vec::new();
        let mut code: i64 = 0;
        for entry in differences {
            match store.resolve(entry) {
                Object::Integer(n) => code = *n,
                Object::Name(glyph_name) => {
                    if let (Ok(byte), Some(stream)) =
                        (u8::try_from(code), store.resolve_key(char_procs, glyph_name))
                    {
                        let mut glyph = Type3Glyph::from_procedure(stream.stream_data()?);
                        if let Some(width) = widths.get(&byte) {
                            glyph.set_width(*width);
                        }
                        procedures.push((byte, glyph_name.clone(), glyph));
                    }
                    code += 1;
                },
                _ => {},
            }
        }

        let colorized = procedures.iter().all(|(_, _, g)| g.is_colorized());
        let mut program = Type3Program::new(name, colorized);
        program.set_font_matrix(matrix);
        let mut encoding = FontEncoding::create_empty();
        for (byte, glyph_name, glyph) in procedures {
            let unicode = to_unicode
                .as_ref()
                .and_then(|t| t.lookup(byte as u32))
                .and_then(|chars| char::decode_utf16(chars.iter().copied()).next())
                .and_then(|c| c.ok())
                .map(|c| c as u32)
                .or_else(|| glyph_list::name_to_unicode(&glyph_name));
            if let Some(u) = unicode {
                if !encoding.can_encode(u) && !encoding.can_decode(byte) {
                    encoding.add_symbol(byte, u)?;
                }
            }
            program.insert(byte, unicode, glyph);
        }
        log::debug!(
            "Rebuilt Type3 font {} with {} glyphs",
            program.font_names().font_name,
            program.count_of_glyphs()
        );

        let mut font = Self::with_program(program, encoding);
        font.to_unicode = to_unicode;
        font.source = Some(source);
        Ok(font)
    }

    /// Set the number of mappings per `bfrange` block of the ToUnicode stream.
    pub fn with_bfrange_batch(mut self, batch: usize) -> Self {
        self.bfrange_batch = batch.max(1);
        self
    }

    /// The glyph procedures.
    pub fn program(&self) -> &Type3Program {
        &self.program
    }

    /// Mutable access to the program, e.g. to change the font matrix.
    pub fn program_mut(&mut self) -> &mut Type3Program {
        &mut self.program
    }

    /// The encoding built from the registered glyphs.
    pub fn encoding(&self) -> &FontEncoding {
        &self.encoding
    }

    /// Register a glyph for `unicode` and return its procedure.
    ///
    /// The first free code in `1..=255` is taken. Registering a character
    /// twice returns the existing procedure unchanged.
    pub fn add_glyph(&mut self, unicode: u32, width: i32, bbox: [i32; 4]) -> Result<&mut Type3Glyph> {
        if let Some(code) = self.encoding.convert_to_byte(unicode) {
            if self.program.contains_code(code) {
                return self.program.procedure_mut(code).ok_or(Error::Type3CodeSpaceExhausted);
            }
        }
        let code = (1..=255u8)
            .find(|c| !self.encoding.can_decode(*c) && !self.program.contains_code(*c))
            .ok_or(Error::Type3CodeSpaceExhausted)?;
        self.encoding.add_symbol(code, unicode)?;
        let colorized = self.program.is_colorized();
        log::trace!("Type3 glyph U+{:04X} registered at code {}", unicode, code);
        Ok(self
            .program
            .insert(code, Some(unicode), Type3Glyph::new(width, bbox, colorized)))
    }

    /// Procedure registered for `unicode`.
    pub fn type3_glyph(&self, unicode: u32) -> Option<&Type3Glyph> {
        let code = self.encoding.convert_to_byte(unicode)?;
        self.program.procedure(code)
    }

    /// Number of registered glyphs.
    pub fn glyph_count(&self) -> usize {
        self.program.count_of_glyphs()
    }

    /// Whether the procedure at `code` goes into the written font.
    ///
    /// Subset fonts keep the codes used in content plus those whose
    /// character lies in a forced subset range; a subset font nothing was
    /// drawn with keeps every procedure.
    fn is_written(&self, code: u8) -> bool {
        if !self.subset || self.used.is_empty() {
            return true;
        }
        self.used.is_used(code)
            || self
                .program
                .glyph_by_code(code as i32)
                .and_then(|g| g.unicode)
                .map_or(false, |u| self.subset_ranges.contains(u))
    }

    fn write(&self, store: &mut dyn ObjectStore) -> Result<ObjectRef> {
        let name = &self.program.font_names().font_name;
        if self.program.count_of_glyphs() == 0 {
            return Err(Error::NoType3Glyphs { font: name.clone() });
        }

        let mut codes = UsedCodes::new();
        let mut char_procs = Dictionary::new();
        for (code, procedure) in self.program.procedures().filter(|(code, _)| self.is_written(*code)) {
            let glyph_name = self
                .encoding
                .get_difference(code)
                .map(str::to_string)
                .unwrap_or_else(|| format!("g{}", code));
            let content = procedure.content_bytes()?;
            let r = store.add(Object::flate_stream(Dictionary::new(), &content)?);
            char_procs.insert(glyph_name, Object::Reference(r));
            codes.mark(code);
        }
        // present: at least one procedure
        let (first, last) = codes.range().unwrap_or((1, 1));

        let mut differences = Vec::new();
        let mut previous: Option<u8> = None;
        for code in codes.iter() {
            if previous.map_or(true, |p| p as u16 + 1 != code as u16) {
                differences.push(Object::Integer(code as i64));
            }
            let glyph_name = self
                .encoding
                .get_difference(code)
                .map(str::to_string)
                .unwrap_or_else(|| format!("g{}", code));
            differences.push(Object::name(glyph_name));
            previous = Some(code);
        }
        let mut encoding = Dictionary::new();
        encoding.insert("Type".to_string(), Object::name("Encoding"));
        encoding.insert("Differences".to_string(), Object::Array(differences));

        let mut font = Dictionary::new();
        font.insert("Type".to_string(), Object::name("Font"));
        font.insert("Subtype".to_string(), Object::name("Type3"));
        font.insert(
            "FontMatrix".to_string(),
            Object::Array(self.program.font_matrix().iter().map(|v| number(*v)).collect()),
        );
        font.insert(
            "FontBBox".to_string(),
            Object::int_array(self.program.font_bbox().iter().map(|v| *v as i64)),
        );
        font.insert("FirstChar".to_string(), Object::Integer(first as i64));
        font.insert("LastChar".to_string(), Object::Integer(last as i64));
        font.insert(
            "Widths".to_string(),
            simple_widths(first, last, |code| {
                self.program
                    .procedure(code)
                    .filter(|_| codes.is_used(code))
                    .map_or(0, |p| p.width())
            }),
        );
        font.insert("Encoding".to_string(), Object::Dictionary(encoding));
        font.insert("CharProcs".to_string(), Object::Dictionary(char_procs));
        font.insert("Resources".to_string(), Object::Dictionary(Dictionary::new()));

        let text_glyphs: Vec<Glyph> = codes
            .iter()
            .filter_map(|code| self.program.glyph_by_code(code as i32).cloned())
            .collect();
        if let Some(program) = generate_to_unicode(&text_glyphs, self.bfrange_batch) {
            let r = to_unicode_stream(store, &program)?;
            font.insert("ToUnicode".to_string(), Object::Reference(r));
        }

        log::debug!(
            "Flushing Type3 font {} with {} of {} glyphs",
            name,
            codes.iter().count(),
            self.program.count_of_glyphs()
        );
        Ok(store.add(Object::Dictionary(font)))
    }
}

impl PdfFont for Type3Font {
    fn font_name(&self) -> &str {
        &self.program.font_names().font_name
    }

    fn subtype(&self) -> &'static str {
        "Type3"
    }

    fn get_glyph(&self, unicode: u32) -> Glyph {
        if let Some(glyph) = self.program.glyph(unicode) {
            return glyph.clone();
        }
        self.placeholders
            .borrow_mut()
            .entry(unicode)
            .or_insert_with(|| Glyph::placeholder(unicode))
            .clone()
    }

    fn contains_glyph(&self, unicode: u32) -> bool {
        self.program.glyph(unicode).is_some()
    }

    fn convert_to_bytes(&mut self, text: &str) -> Vec<u8> {
        let bytes: Vec<u8> = text
            .chars()
            .filter_map(|c| self.encoding.convert_to_byte(c as u32))
            .filter(|code| self.program.contains_code(*code))
            .collect();
        for b in &bytes {
            self.used.mark(*b);
        }
        bytes
    }

    fn convert_glyphs_to_bytes(&mut self, glyphs: &[Glyph]) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(glyphs.len());
        for glyph in glyphs {
            let Ok(code) = u8::try_from(glyph.code) else {
                continue;
            };
            if self.program.contains_code(code) {
                self.used.mark(code);
                bytes.push(code);
            }
        }
        bytes
    }

    fn decode(&self, bytes: &[u8]) -> DecodedText {
        let mut decoded = DecodedText::new();
        for &b in bytes {
            let Some(mut glyph) = self.program.glyph_by_code(b as i32).cloned() else {
                decoded.fully_decoded = false;
                continue;
            };
            if let Some(chars) = self.to_unicode.as_ref().and_then(|t| t.lookup(b as u32)) {
                glyph.chars = Some(chars.into_owned());
            }
            decoded.glyphs.push(glyph);
        }
        decoded
    }

    fn is_embedded(&self) -> bool {
        true
    }

    fn is_subset(&self) -> bool {
        self.subset
    }

    fn set_subset(&mut self, subset: bool) {
        self.subset = subset;
    }

    fn add_subset_range(&mut self, range: [u32; 2]) {
        self.subset_ranges.add(range);
    }

    fn is_flushed(&self) -> bool {
        self.flushed.is_some()
    }

    fn flush(&mut self, store: &mut dyn ObjectStore) -> Result<ObjectRef> {
        if self.flushed.is_some() {
            return Err(Error::AlreadyFlushed {
                font: self.font_name().to_string(),
            });
        }
        let r = match &self.source {
            Some(source) => source.flush(store),
            None => self.write(store)?,
        };
        self.flushed = Some(r);
        Ok(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::MemoryObjectStore;

    #[test]
    fn test_codes_start_at_one() {
        let mut font = Type3Font::new("Marks", false);
        font.add_glyph('a' as u32, 500, [0, 0, 500, 500]).unwrap();
        font.add_glyph('b' as u32, 600, [0, 0, 600, 500]).unwrap();
        assert_eq!(font.encoding().convert_to_byte('a' as u32), Some(1));
        assert_eq!(font.encoding().convert_to_byte('b' as u32), Some(2));
        assert_eq!(font.convert_to_bytes("bax"), vec![2, 1]);
    }

    #[test]
    fn test_add_glyph_is_idempotent() {
        let mut font = Type3Font::new("Marks", false);
        let first = font.add_glyph('x' as u32, 500, [0, 0, 500, 500]).unwrap() as *const Type3Glyph;
        let second = font.add_glyph('x' as u32, 900, [0, 0, 900, 900]).unwrap() as *const Type3Glyph;
        assert_eq!(first, second);
        assert_eq!(font.glyph_count(), 1);
        assert_eq!(font.type3_glyph('x' as u32).map(|g| g.width()), Some(500));
    }

    #[test]
    fn test_code_space_exhausted() {
        let mut font = Type3Font::new("Many", true);
        for i in 0..255u32 {
            font.add_glyph(0xE000 + i, 100, [0; 4]).unwrap();
        }
        assert!(matches!(
            font.add_glyph(0xF000, 100, [0; 4]),
            Err(Error::Type3CodeSpaceExhausted)
        ));
    }

    #[test]
    fn test_flush_requires_glyphs() {
        let mut font = Type3Font::new("Empty", false);
        let mut store = MemoryObjectStore::new();
        assert!(matches!(font.flush(&mut store), Err(Error::NoType3Glyphs { .. })));
    }

    #[test]
    fn test_flush_writes_procedures() {
        let mut font = Type3Font::new("Marks", false);
        font.add_glyph('a' as u32, 500, [0, 0, 500, 700])
            .unwrap()
            .content()
            .rect(0.0, 0.0, 500.0, 700.0)
            .fill();
        font.add_glyph('c' as u32, 300, [10, -10, 290, 400]).unwrap();
        let mut store = MemoryObjectStore::new();
        let r = font.flush(&mut store).unwrap();
        let dict = store.get(r).and_then(|o| o.as_dict()).cloned().unwrap();

        assert_eq!(dict.get("Subtype"), Some(&Object::name("Type3")));
        assert!(dict.get("BaseFont").is_none());
        assert_eq!(dict.get("FirstChar"), Some(&Object::Integer(1)));
        assert_eq!(dict.get("LastChar"), Some(&Object::Integer(2)));
        assert_eq!(dict.get("Widths"), Some(&Object::int_array([500, 300])));
        assert_eq!(dict.get("FontBBox"), Some(&Object::int_array([0, -10, 500, 700])));
        assert_eq!(
            dict.get("FontMatrix"),
            Some(&Object::Array(vec![
                Object::Real(0.001),
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(0.001),
                Object::Integer(0),
                Object::Integer(0),
            ]))
        );
        let procs = dict.get("CharProcs").and_then(|o| o.as_dict()).unwrap();
        let a = procs.get("a").and_then(|o| o.as_reference()).unwrap();
        let content = store.get(a).unwrap().stream_data().unwrap();
        assert_eq!(content, b"500 0 0 0 500 700 d1\n0 0 500 700 re\nf\n".to_vec());
        assert!(dict.contains_key("ToUnicode"));

        assert!(matches!(font.flush(&mut store), Err(Error::AlreadyFlushed { .. })));
    }

    #[test]
    fn test_subset_writes_used_procedures() {
        let mut font = Type3Font::new("Marks", true);
        font.set_subset(true);
        for c in ['a', 'b', 'c', 'd'] {
            font.add_glyph(c as u32, 100 * (c as i32 - 'a' as i32 + 1), [0; 4]).unwrap();
        }
        font.add_subset_range(['d' as u32, 'd' as u32]);
        assert_eq!(font.convert_to_bytes("a"), vec![1]);
        let mut store = MemoryObjectStore::new();
        let r = font.flush(&mut store).unwrap();
        let dict = store.get(r).and_then(|o| o.as_dict()).cloned().unwrap();

        let procs = dict.get("CharProcs").and_then(|o| o.as_dict()).unwrap();
        let mut names: Vec<&str> = procs.keys().map(String::as_str).collect();
        names.sort();
        assert_eq!(names, vec!["a", "d"]);
        assert_eq!(dict.get("FirstChar"), Some(&Object::Integer(1)));
        assert_eq!(dict.get("LastChar"), Some(&Object::Integer(4)));
        assert_eq!(dict.get("Widths"), Some(&Object::int_array([100, 0, 0, 400])));
    }

    #[test]
    fn test_subset_without_usage_writes_everything() {
        let mut font = Type3Font::new("Marks", true);
        font.set_subset(true);
        font.add_glyph('a' as u32, 100, [0; 4]).unwrap();
        font.add_glyph('b' as u32, 200, [0; 4]).unwrap();
        let mut store = MemoryObjectStore::new();
        let r = font.flush(&mut store).unwrap();
        let dict = store.get(r).and_then(|o| o.as_dict()).cloned().unwrap();
        assert_eq!(dict.get("Widths"), Some(&Object::int_array([100, 200])));
    }

    #[test]
    fn test_decode() {
        let mut font = Type3Font::new("Marks", true);
        font.add_glyph(0x2713, 800, [0; 4]).unwrap();
        let decoded = font.decode(&[1, 7]);
        assert_eq!(decoded.to_unicode_string(), "\u{2713}");
        assert!(!decoded.fully_decoded);
        assert_eq!(font.get_glyph(0x2717).width, 0);
    }
}
