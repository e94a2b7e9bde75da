//! Simple fonts: Type 1 and TrueType with one-byte codes.
//!
//! Text is encoded through a [`FontEncoding`]; every byte written marks its
//! code used. At flush time the used codes decide `/FirstChar`,
//! `/LastChar`, `/Widths` and the `/Differences` of the encoding.

use super::encoding::FontEncoding;
use super::font::{
    embed_program, font_descriptor, to_unicode_stream, DecodedText, FontFileKind, PdfFont,
    SourceDictionary,
};
use super::glyph::{utf16_of, Glyph};
use super::glyph_list::NOTDEF;
use super::program::{DocFontKind, DocFontProgram, FontProgram, GlyphRepository};
use super::subset::{has_subset_tag, subset_font_name, SubsetRanges, UsedCodes};
use super::widths::simple_widths;
use crate::cmap::{generate_to_unicode, CMapToUnicode, DEFAULT_BFRANGE_BATCH};
use crate::error::{Error, Result};
use crate::object::{Dictionary, Object, ObjectRef, ObjectStore};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// A Type 1 or TrueType font with a single-byte encoding.
#[derive(Debug)]
pub struct SimpleFont {
    program: FontProgram,
    encoding: FontEncoding,
    to_unicode: Option<Arc<CMapToUnicode>>,
    used: UsedCodes,
    embedded: bool,
    subset: bool,
    subset_ranges: SubsetRanges,
    bfrange_batch: usize,
    notdefs: RefCell<HashMap<u32, Glyph>>,
    source: Option<SourceDictionary>,
    flushed: Option<ObjectRef>,
}

impl SimpleFont {
    /// New font over `program`.
    ///
    /// The caller decides `embedded`; see the font factory for the rules.
    pub fn new(program: FontProgram, encoding: FontEncoding, embedded: bool) -> Self {
        Self {
            program,
            encoding,
            to_unicode: None,
            used: UsedCodes::new(),
            embedded,
            subset: true,
            subset_ranges: SubsetRanges::new(),
            bfrange_batch: DEFAULT_BFRANGE_BATCH,
            notdefs: RefCell::new(HashMap::new()),
            source: None,
            flushed: None,
        }
    }

    /// Font wrapping an existing dictionary.
    pub(crate) fn from_document(
        program: DocFontProgram,
        encoding: FontEncoding,
        to_unicode: Option<Arc<CMapToUnicode>>,
        source: SourceDictionary,
    ) -> Self {
        let embedded = program.font_file().is_some();
        let subset = source
            .dict
            .get("BaseFont")
            .and_then(|o| o.as_name())
            .map_or(false, has_subset_tag);
        let mut font = Self::new(FontProgram::Doc(program), encoding, embedded);
        font.subset = subset;
        font.to_unicode = to_unicode;
        font.source = Some(source);
        font
    }

    /// Set the number of mappings per `bfrange` block of the ToUnicode stream.
    pub fn with_bfrange_batch(mut self, batch: usize) -> Self {
        self.bfrange_batch = batch.max(1);
        self
    }

    /// The font program.
    pub fn program(&self) -> &FontProgram {
        &self.program
    }

    /// The encoding.
    pub fn encoding(&self) -> &FontEncoding {
        &self.encoding
    }

    /// Codes written so far.
    pub fn used_codes(&self) -> &UsedCodes {
        &self.used
    }

    fn is_reconstructed(&self) -> bool {
        matches!(self.program, FontProgram::Doc(_))
    }

    /// Glyph drawn for byte `code` when writing.
    fn glyph_for_code(&self, code: u8) -> Option<Glyph> {
        if self.encoding.is_font_specific() {
            return self.program.glyph_for_byte(code).cloned();
        }
        let unicode = self.encoding.get_unicode(code)?;
        Some(self.get_glyph(unicode))
    }

    /// Byte that selects `glyph` in a font-specific encoding.
    fn font_specific_byte(&self, glyph: &Glyph) -> Option<u8> {
        (0..=255u8).find(|b| self.program.glyph_for_byte(*b).map(|g| g.code) == Some(glyph.code))
    }

    fn write(&self, store: &mut dyn ObjectStore) -> Result<ObjectRef> {
        let font_specific = self.encoding.is_font_specific();
        let mut used = self.used.clone();
        for code in 0..=255u8 {
            if let Some(unicode) = self.encoding.get_unicode(code) {
                if self.subset_ranges.contains(unicode) {
                    used.mark(code);
                }
            }
        }
        // without subsetting every decodable code is written
        if !(self.subset && self.embedded) || used.is_empty() {
            for code in 0..=255u8 {
                if self.encoding.can_decode(code) {
                    used.mark(code);
                }
            }
        }
        let (first, last) = used.range().unwrap_or((0, 0));

        let glyphs: BTreeMap<u8, Glyph> = used
            .iter()
            .filter_map(|code| self.glyph_for_code(code).map(|g| (code, g)))
            .collect();
        let mut used_glyphs: BTreeSet<i32> = glyphs
            .values()
            .filter(|g| g.has_valid_code())
            .map(|g| g.code)
            .collect();
        used_glyphs.insert(0);

        let base_name = self.program.font_names().font_name.clone();
        let font_name = match &self.program {
            FontProgram::TrueType(_) if self.embedded && self.subset => {
                subset_font_name(&used_glyphs, &base_name)
            },
            _ => base_name,
        };

        let mut font = Dictionary::new();
        font.insert("Type".to_string(), Object::name("Font"));
        font.insert("Subtype".to_string(), Object::name(self.subtype()));
        font.insert("BaseFont".to_string(), Object::name(font_name.as_str()));
        font.insert("FirstChar".to_string(), Object::Integer(first as i64));
        font.insert("LastChar".to_string(), Object::Integer(last as i64));
        font.insert(
            "Widths".to_string(),
            simple_widths(first, last, |code| glyphs.get(&code).map_or(0, |g| g.width)),
        );

        if !font_specific {
            if let Some(name) = self.encoding.pdf_name() {
                font.insert("Encoding".to_string(), Object::name(name));
            } else if self.encoding.has_differences() {
                let mut encoding = Dictionary::new();
                encoding.insert("Type".to_string(), Object::name("Encoding"));
                encoding.insert("Differences".to_string(), Object::Array(self.differences(&used)));
                font.insert("Encoding".to_string(), Object::Dictionary(encoding));
            }
        }

        if !(self.program.is_builtin() && !self.embedded) {
            let font_file = if self.embedded {
                self.embed(store, &used_glyphs)?
            } else {
                None
            };
            let names = self.program.font_names();
            let metrics = self.program.metrics();
            let descriptor = font_descriptor(
                &font_name,
                names,
                metrics,
                metrics.flags(names, font_specific),
                font_file,
                false,
            );
            let desc_ref = store.add(Object::Dictionary(descriptor));
            font.insert("FontDescriptor".to_string(), Object::Reference(desc_ref));
        }

        if self.embedded || self.encoding.has_differences() {
            let text_glyphs: Vec<Glyph> = used
                .iter()
                .map(|code| {
                    let chars = if font_specific {
                        glyphs.get(&code).and_then(|g| g.chars.clone())
                    } else {
                        self.encoding.get_unicode(code).and_then(utf16_of)
                    };
                    Glyph::with_chars(code as i32, 0, None, chars)
                })
                .collect();
            if let Some(program) = generate_to_unicode(&text_glyphs, self.bfrange_batch) {
                let r = to_unicode_stream(store, &program)?;
                font.insert("ToUnicode".to_string(), Object::Reference(r));
            }
        }

        log::debug!(
            "Flushing {} font {} with codes {}..={}",
            self.subtype(),
            font_name,
            first,
            last
        );
        Ok(store.add(Object::Dictionary(font)))
    }

    /// `/Differences` for the used codes; runs restart after gaps.
    fn differences(&self, used: &UsedCodes) -> Vec<Object> {
        let mut diffs = Vec::new();
        let mut previous: Option<u8> = None;
        for code in used.iter() {
            let Some(name) = self.encoding.get_difference(code).filter(|n| *n != NOTDEF) else {
                continue;
            };
            if previous.map_or(true, |p| p as u16 + 1 != code as u16) {
                diffs.push(Object::Integer(code as i64));
            }
            diffs.push(Object::name(name));
            previous = Some(code);
        }
        diffs
    }

    fn embed(
        &self,
        store: &mut dyn ObjectStore,
        used_glyphs: &BTreeSet<i32>,
    ) -> Result<Option<(&'static str, ObjectRef)>> {
        match &self.program {
            FontProgram::TrueType(p) => {
                let Some(bytes) = p.subset_program(used_glyphs, self.subset)? else {
                    return Ok(None);
                };
                let kind = if p.is_cff() {
                    FontFileKind::Compact("OpenType")
                } else {
                    FontFileKind::TrueType
                };
                embed_program(store, &bytes, kind).map(Some)
            },
            FontProgram::Type1(p) => match p.data() {
                Some(bytes) => embed_program(store, bytes, FontFileKind::Type1).map(Some),
                None => Ok(None),
            },
            FontProgram::Cid(_) | FontProgram::Doc(_) => Ok(None),
        }
    }
}

impl PdfFont for SimpleFont {
    fn font_name(&self) -> &str {
        &self.program.font_names().font_name
    }

    fn subtype(&self) -> &'static str {
        match &self.program {
            FontProgram::Type1(_) => "Type1",
            FontProgram::Doc(p) if p.kind() == DocFontKind::Type1 => "Type1",
            _ => "TrueType",
        }
    }

    fn get_glyph(&self, unicode: u32) -> Glyph {
        let encodable = self.encoding.can_encode(unicode);
        let found = if !encodable {
            None
        } else if self.encoding.is_font_specific() {
            self.encoding
                .convert_to_byte(unicode)
                .and_then(|b| self.program.glyph_for_byte(b))
        } else {
            self.program.glyph(unicode)
        };
        if let Some(glyph) = found {
            return glyph.clone();
        }
        self.notdefs
            .borrow_mut()
            .entry(unicode)
            .or_insert_with(|| match self.program.notdef() {
                Some(notdef) if encodable && self.encoding.is_font_specific() => {
                    Glyph::substitute(notdef, unicode)
                },
                _ => Glyph::placeholder(unicode),
            })
            .clone()
    }

    fn contains_glyph(&self, unicode: u32) -> bool {
        if !self.encoding.can_encode(unicode) {
            return false;
        }
        if self.encoding.is_font_specific() {
            self.encoding
                .convert_to_byte(unicode)
                .and_then(|b| self.program.glyph_for_byte(b))
                .is_some()
        } else {
            self.program.glyph(unicode).is_some()
        }
    }

    fn convert_to_bytes(&mut self, text: &str) -> Vec<u8> {
        let bytes = self.encoding.convert_to_bytes(text);
        for b in &bytes {
            self.used.mark(*b);
        }
        bytes
    }

    fn convert_glyphs_to_bytes(&mut self, glyphs: &[Glyph]) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(glyphs.len());
        for glyph in glyphs {
            let byte = if self.encoding.is_font_specific() {
                self.font_specific_byte(glyph)
            } else {
                glyph.unicode.and_then(|u| self.encoding.convert_to_byte(u))
            };
            if let Some(b) = byte {
                self.used.mark(b);
                bytes.push(b);
            }
        }
        bytes
    }

    fn decode(&self, bytes: &[u8]) -> DecodedText {
        let font_specific = self.encoding.is_font_specific();
        let reconstructed = self.is_reconstructed();
        let mut decoded = DecodedText::new();
        for &b in bytes {
            // characters the encoding maps but the program lacks decode to
            // their placeholder
            let glyph = if font_specific {
                self.program.glyph_for_byte(b).cloned()
            } else if reconstructed {
                self.program.glyph_by_code(b as i32).cloned()
            } else {
                self.encoding.get_unicode(b).map(|u| self.get_glyph(u))
            };
            let Some(mut glyph) = glyph else {
                decoded.fully_decoded = false;
                continue;
            };
            if let Some(chars) = self.to_unicode.as_ref().and_then(|t| t.lookup(b as u32)) {
                glyph.chars = Some(chars.into_owned());
            } else if !font_specific && !reconstructed {
                if let Some(u) = self.encoding.get_unicode(b) {
                    glyph.unicode = Some(u);
                    glyph.chars = utf16_of(u);
                }
            }
            decoded.glyphs.push(glyph);
        }
        decoded
    }

    fn is_embedded(&self) -> bool {
        self.embedded
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
