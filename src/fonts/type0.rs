//! Composite (Type 0) fonts.
//!
//! A Type 0 font writes multi-byte codes through a CMap into a single CID
//! descendant. Two setups are created here:
//!
//! - TrueType/OpenType programs with `Identity-H`/`Identity-V`, always
//!   embedded; CIDs are glyph ids (`/CIDToGIDMap /Identity`).
//! - Predefined CJK fonts with a Unicode CMap such as `UniGB-UCS2-H`,
//!   never embedded; codes are written straight from the text.

use super::font::{
    embed_program, font_descriptor, to_unicode_stream, DecodedText, FontFileKind, PdfFont,
    SourceDictionary,
};
use super::glyph::Glyph;
use super::program::{CidFontProgram, DocFontProgram, FontProgram, GlyphRepository, TrueTypeProgram};
use super::subset::{has_subset_tag, subset_font_name, SubsetRanges};
use super::widths::cid_widths;
use crate::cmap::{generate_to_unicode, CMapEncoding, CMapToUnicode, DEFAULT_BFRANGE_BATCH};
use crate::error::{Error, Result};
use crate::object::{Dictionary, Object, ObjectRef, ObjectStore};
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Subtype of the CID descendant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CidFontType {
    /// CFF outlines or a predefined CJK font
    Type0,
    /// TrueType outlines
    Type2,
}

impl CidFontType {
    /// `/Subtype` value.
    pub fn name(self) -> &'static str {
        match self {
            CidFontType::Type0 => "CIDFontType0",
            CidFontType::Type2 => "CIDFontType2",
        }
    }
}

/// How text becomes codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Charset {
    /// UTF-16BE, BMP only (`Uni*-UCS2-*`)
    Ucs2,
    /// UTF-16BE with surrogate pairs (`Uni*-UTF16-*`)
    Utf16,
    /// Glyph CID through the CMap
    Cid,
}

/// A Type 0 font with one CID descendant.
#[derive(Debug)]
pub struct Type0Font {
    program: FontProgram,
    cmap: CMapEncoding,
    cid_font_type: CidFontType,
    used: BTreeSet<i32>,
    embedded: bool,
    subset: bool,
    subset_ranges: SubsetRanges,
    default_width: i32,
    bfrange_batch: usize,
    to_unicode: Option<Arc<CMapToUnicode>>,
    notdefs: RefCell<HashMap<u32, Glyph>>,
    source: Option<SourceDictionary>,
    flushed: Option<ObjectRef>,
}

impl Type0Font {
    fn with_program(program: FontProgram, cmap: CMapEncoding, cid_font_type: CidFontType, embedded: bool) -> Self {
        Self {
            program,
            cmap,
            cid_font_type,
            used: BTreeSet::new(),
            embedded,
            subset: true,
            subset_ranges: SubsetRanges::new(),
            default_width: 1000,
            bfrange_batch: DEFAULT_BFRANGE_BATCH,
            to_unicode: None,
            notdefs: RefCell::new(HashMap::new()),
            source: None,
            flushed: None,
        }
    }

    /// Embedded TrueType/OpenType font with an identity CMap.
    pub fn new_identity(program: TrueTypeProgram, vertical: bool) -> Self {
        let cid_font_type = if program.is_cff() {
            CidFontType::Type0
        } else {
            CidFontType::Type2
        };
        Self::with_program(program.into(), CMapEncoding::identity(vertical), cid_font_type, true)
    }

    /// Non-embedded predefined CJK font.
    pub fn new_cid(program: CidFontProgram, cmap: CMapEncoding) -> Self {
        Self::with_program(program.into(), cmap, CidFontType::Type0, false)
    }

    /// Font wrapping an existing dictionary.
    pub(crate) fn from_document(
        program: DocFontProgram,
        cmap: CMapEncoding,
        cid_font_type: CidFontType,
        to_unicode: Option<Arc<CMapToUnicode>>,
        source: SourceDictionary,
    ) -> Self {
        let embedded = program.font_file().is_some();
        let default_width = program.default_width();
        let subset = source
            .dict
            .get("BaseFont")
            .and_then(|o| o.as_name())
            .map_or(false, has_subset_tag);
        let mut font = Self::with_program(FontProgram::Doc(program), cmap, cid_font_type, embedded);
        font.subset = subset;
        font.default_width = default_width;
        font.to_unicode = to_unicode;
        font.source = Some(source);
        font
    }

    /// Set `/DW`.
    pub fn with_default_width(mut self, width: i32) -> Self {
        self.default_width = width;
        self
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

    /// The CMap.
    pub fn cmap(&self) -> &CMapEncoding {
        &self.cmap
    }

    /// Descendant subtype.
    pub fn cid_font_type(&self) -> CidFontType {
        self.cid_font_type
    }

    /// CIDs written so far.
    pub fn used_cids(&self) -> &BTreeSet<i32> {
        &self.used
    }

    fn charset(&self) -> Charset {
        let name = self.cmap.cmap_name();
        if self.cmap.is_direct() || !name.starts_with("Uni") {
            Charset::Cid
        } else if name.contains("-UCS2-") {
            Charset::Ucs2
        } else if name.contains("-UTF16-") {
            Charset::Utf16
        } else {
            Charset::Cid
        }
    }

    fn mark_unicode(&mut self, unicode: u32) {
        if let Some(glyph) = self.program.glyph(unicode) {
            self.used.insert(glyph.code);
        }
    }

    fn write_text_units(out: &mut Vec<u8>, c: char, surrogates: bool) -> bool {
        let mut buf = [0u16; 2];
        let units = c.encode_utf16(&mut buf);
        if units.len() > 1 && !surrogates {
            return false;
        }
        for unit in units.iter() {
            out.extend_from_slice(&unit.to_be_bytes());
        }
        true
    }

    /// CIDs to write, including forced ranges and the notdef glyph.
    fn glyphs_to_write(&self) -> BTreeSet<i32> {
        let mut cids = self.used.clone();
        if !self.subset {
            if let FontProgram::TrueType(p) = &self.program {
                cids.extend(p.glyphs().map(|g| g.code));
            }
        }
        for [lo, hi] in self.subset_ranges.ranges() {
            for unicode in *lo..=*hi {
                if let Some(glyph) = self.program.glyph(unicode) {
                    cids.insert(glyph.code);
                }
            }
        }
        cids.insert(0);
        cids
    }

    /// Stand-in for a code without a glyph; keeps the advance of code 0.
    fn decoded_notdef(&self) -> Glyph {
        let width = self.program.notdef().map_or(0, |g| g.width);
        Glyph::with_chars(0, width, None, None)
    }

    fn cid_system_info(&self) -> Dictionary {
        let (registry, ordering, supplement) = match &self.program {
            FontProgram::Cid(p) => {
                let font = p.predefined();
                (font.registry, font.ordering, font.supplement)
            },
            _ => ("Adobe", "Identity", 0),
        };
        let mut info = Dictionary::new();
        info.insert("Registry".to_string(), Object::String(registry.as_bytes().to_vec()));
        info.insert("Ordering".to_string(), Object::String(ordering.as_bytes().to_vec()));
        info.insert("Supplement".to_string(), Object::Integer(supplement as i64));
        info
    }

    fn write(&self, store: &mut dyn ObjectStore) -> Result<ObjectRef> {
        let cids = self.glyphs_to_write();
        let glyphs: Vec<Glyph> = cids
            .iter()
            .filter_map(|cid| self.program.glyph_by_code(*cid).cloned())
            .collect();

        let base_name = self.program.font_names().font_name.clone();
        let font_name = if self.embedded && self.subset {
            subset_font_name(&cids, &base_name)
        } else {
            base_name
        };

        let font_file = if self.embedded {
            match &self.program {
                FontProgram::TrueType(p) => match p.subset_program(&cids, self.subset)? {
                    Some(bytes) => {
                        let kind = if p.is_cff() {
                            FontFileKind::Compact("CIDFontType0C")
                        } else {
                            FontFileKind::TrueType
                        };
                        Some(embed_program(store, &bytes, kind)?)
                    },
                    None => None,
                },
                _ => None,
            }
        } else {
            None
        };

        let names = self.program.font_names();
        let metrics = self.program.metrics();
        let flags = metrics.flags(names, self.program.is_font_specific());
        let descriptor = font_descriptor(&font_name, names, metrics, flags, font_file, true);
        let desc_ref = store.add(Object::Dictionary(descriptor));

        let mut cid_font = Dictionary::new();
        cid_font.insert("Type".to_string(), Object::name("Font"));
        cid_font.insert("Subtype".to_string(), Object::name(self.cid_font_type.name()));
        cid_font.insert("BaseFont".to_string(), Object::name(font_name.as_str()));
        cid_font.insert("CIDSystemInfo".to_string(), Object::Dictionary(self.cid_system_info()));
        cid_font.insert("FontDescriptor".to_string(), Object::Reference(desc_ref));
        cid_font.insert("DW".to_string(), Object::Integer(self.default_width as i64));
        if self.cmap.is_vertical() {
            log::warn!("Vertical metrics are not written for {}; only /DW is set", font_name);
        } else {
            let w = cid_widths(glyphs.iter().map(|g| (g.code, g.width)), self.default_width);
            if !w.is_empty() {
                cid_font.insert("W".to_string(), Object::Array(w));
            }
        }
        if self.cid_font_type == CidFontType::Type2 {
            cid_font.insert("CIDToGIDMap".to_string(), Object::name("Identity"));
        }
        let cid_font_ref = store.add(Object::Dictionary(cid_font));

        let type0_name = match self.cid_font_type {
            CidFontType::Type0 => format!("{}-{}", font_name, self.cmap.cmap_name()),
            CidFontType::Type2 => font_name.clone(),
        };
        let mut font = Dictionary::new();
        font.insert("Type".to_string(), Object::name("Font"));
        font.insert("Subtype".to_string(), Object::name("Type0"));
        font.insert("BaseFont".to_string(), Object::name(type0_name));
        font.insert("Encoding".to_string(), Object::name(self.cmap.cmap_name()));
        font.insert(
            "DescendantFonts".to_string(),
            Object::Array(vec![Object::Reference(cid_font_ref)]),
        );

        if self.embedded {
            if let Some(program) = generate_to_unicode(&glyphs, self.bfrange_batch) {
                let r = to_unicode_stream(store, &program)?;
                font.insert("ToUnicode".to_string(), Object::Reference(r));
            }
        }

        log::debug!(
            "Flushing Type0 font {} ({}) with {} CIDs",
            font_name,
            self.cmap.cmap_name(),
            cids.len()
        );
        Ok(store.add(Object::Dictionary(font)))
    }
}

impl PdfFont for Type0Font {
    fn font_name(&self) -> &str {
        &self.program.font_names().font_name
    }

    fn subtype(&self) -> &'static str {
        "Type0"
    }

    fn get_glyph(&self, unicode: u32) -> Glyph {
        if let Some(glyph) = self.program.glyph(unicode) {
            return glyph.clone();
        }
        self.notdefs
            .borrow_mut()
            .entry(unicode)
            .or_insert_with(|| match self.program.notdef() {
                Some(notdef) => Glyph::substitute(notdef, unicode),
                None => Glyph::placeholder(unicode),
            })
            .clone()
    }

    fn contains_glyph(&self, unicode: u32) -> bool {
        match self.cid_font_type {
            CidFontType::Type0 if self.cmap.is_direct() => {
                self.program.glyph_by_code(unicode as i32).is_some()
            },
            CidFontType::Type2 if self.program.is_font_specific() => {
                let byte = match unicode {
                    0xF000..=0xF0FF => Some((unicode & 0xFF) as u8),
                    0..=0xFF => Some(unicode as u8),
                    _ => None,
                };
                byte.and_then(|b| self.program.glyph_for_byte(b)).is_some()
            },
            _ => self.program.glyph(unicode).is_some(),
        }
    }

    fn convert_to_bytes(&mut self, text: &str) -> Vec<u8> {
        let mut out = Vec::with_capacity(text.len() * 2);
        match self.charset() {
            Charset::Ucs2 | Charset::Utf16 => {
                let surrogates = self.charset() == Charset::Utf16;
                for c in text.chars() {
                    if Self::write_text_units(&mut out, c, surrogates) {
                        self.mark_unicode(c as u32);
                    }
                }
            },
            Charset::Cid => {
                for c in text.chars() {
                    let glyph = self.get_glyph(c as u32);
                    let cid = if glyph.has_valid_code() { glyph.code as u32 } else { 0 };
                    if self.cmap.write_cid(cid, &mut out) && glyph.has_valid_code() {
                        self.used.insert(glyph.code);
                    }
                }
            },
        }
        out
    }

    fn convert_glyphs_to_bytes(&mut self, glyphs: &[Glyph]) -> Vec<u8> {
        let mut out = Vec::with_capacity(glyphs.len() * 2);
        let charset = self.charset();
        for glyph in glyphs {
            let written = match charset {
                Charset::Ucs2 | Charset::Utf16 => {
                    let text = glyph.text();
                    let mut ok = !text.is_empty();
                    for c in text.chars() {
                        ok &= Self::write_text_units(&mut out, c, charset == Charset::Utf16);
                    }
                    ok
                },
                Charset::Cid => {
                    let cid = if glyph.has_valid_code() { glyph.code as u32 } else { 0 };
                    self.cmap.write_cid(cid, &mut out)
                },
            };
            if written && glyph.has_valid_code() {
                self.used.insert(glyph.code);
            }
        }
        out
    }

    fn decode(&self, bytes: &[u8]) -> DecodedText {
        let mut decoded = DecodedText::new();
        let mut rest = bytes;
        while !rest.is_empty() {
            let (code, matched) = self.cmap.next_code(rest);
            rest = &rest[(code.len as usize).clamp(1, rest.len())..];
            if !matched {
                decoded.glyphs.push(self.decoded_notdef());
                decoded.fully_decoded = false;
                continue;
            }
            let text = self
                .to_unicode
                .as_ref()
                .and_then(|t| t.lookup(code.value))
                .map(|chars| chars.into_owned());
            let glyph = self
                .cmap
                .cid_of(code)
                .and_then(|cid| self.program.glyph_by_code(cid as i32))
                .cloned();
            match (glyph, text) {
                (Some(mut glyph), Some(chars)) => {
                    glyph.chars = Some(chars);
                    decoded.glyphs.push(glyph);
                },
                (Some(glyph), None) => decoded.glyphs.push(glyph),
                (None, Some(chars)) => {
                    let cid = self.cmap.cid_of(code).map_or(0, |c| c as i32);
                    decoded
                        .glyphs
                        .push(Glyph::with_chars(cid, self.default_width, None, Some(chars)));
                },
                (None, None) => {
                    log::warn!("No glyph for code {} in {}", code, self.font_name());
                    decoded.glyphs.push(self.decoded_notdef());
                    decoded.fully_decoded = false;
                },
            }
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmap::{CMapCache, MemoryCMapProvider};
    use crate::fonts::metrics::{FontMetrics, FontNames};
    use crate::fonts::program::PredefinedCidFont;
    use crate::object::MemoryObjectStore;

    const UNI_GB: &[u8] = b"/CIDSystemInfo << /Registry (Adobe) /Ordering (GB1) /Supplement 4 >> def\n\
        /CMapName /UniGB-UCS2-H def\n\
        2 begincodespacerange <00> <80> <8140> <FEFE> endcodespacerange\n\
        1 begincidrange <20> <22> 1 endcidrange\n\
        1 begincidchar <8140> 814 endcidchar\n";

    fn sample_truetype() -> TrueTypeProgram {
        let glyphs = vec![
            Glyph::new(0, 500, None),
            Glyph::new(3, 278, Some(0x20)),
            Glyph::new(36, 667, Some('A' as u32)),
            Glyph::new(37, 667, Some('B' as u32)),
            Glyph::new(40, 1000, Some(0x1F600)),
        ];
        TrueTypeProgram::from_parts(FontNames::new("Sample"), FontMetrics::default(), glyphs, false)
            .with_data(vec![1u8; 32])
    }

    fn song() -> Type0Font {
        let cache = CMapCache::new(MemoryCMapProvider::new().with("UniGB-UCS2-H", UNI_GB));
        let cmap = CMapEncoding::named("UniGB-UCS2-H", &cache).unwrap();
        let font = PredefinedCidFont::lookup("STSong-Light").unwrap();
        let program = CidFontProgram::from_parts(
            font,
            vec![Glyph::new(1, 500, Some(0x20)), Glyph::new(814, 1000, Some(0x4E2D))],
        );
        Type0Font::new_cid(program, cmap)
    }

    #[test]
    fn test_identity_writes_glyph_ids() {
        let mut font = Type0Font::new_identity(sample_truetype(), false);
        assert_eq!(font.cid_font_type(), CidFontType::Type2);
        assert_eq!(font.convert_to_bytes("AB"), vec![0x00, 0x24, 0x00, 0x25]);
        assert_eq!(font.used_cids().iter().copied().collect::<Vec<_>>(), vec![36, 37]);

        let decoded = font.decode(&[0x00, 0x24, 0x00, 0x25]);
        assert!(decoded.fully_decoded);
        assert_eq!(decoded.to_unicode_string(), "AB");
    }

    #[test]
    fn test_decode_unknown_cid_keeps_advance() {
        let font = Type0Font::new_identity(sample_truetype(), false);
        let decoded = font.decode(&[0x00, 0x24, 0x00, 0x50]);
        assert!(!decoded.fully_decoded);
        assert_eq!(decoded.glyphs.len(), 2);
        assert_eq!(decoded.glyphs[1].code, 0);
        assert_eq!(decoded.glyphs[1].width, 500);
        assert_eq!(decoded.width(), 1167);
        assert_eq!(decoded.to_unicode_string(), "A");
    }

    #[test]
    fn test_missing_glyph_writes_notdef() {
        let mut font = Type0Font::new_identity(sample_truetype(), false);
        assert_eq!(font.convert_to_bytes("\u{4E2D}"), vec![0, 0]);
        assert!(!font.contains_glyph(0x4E2D));
        let glyph = font.get_glyph(0x4E2D);
        assert_eq!(glyph.code, 0);
        assert_eq!(glyph.width, 500);
        assert_eq!(glyph.text(), "\u{4E2D}");
    }

    #[test]
    fn test_identity_flush() {
        let mut font = Type0Font::new_identity(sample_truetype(), false);
        font.convert_to_bytes("A \u{1F600}");
        let mut store = MemoryObjectStore::new();
        let r = font.flush(&mut store).unwrap();

        let dict = store.get(r).and_then(|o| o.as_dict()).cloned().unwrap();
        assert_eq!(dict.get("Subtype"), Some(&Object::name("Type0")));
        assert_eq!(dict.get("Encoding"), Some(&Object::name("Identity-H")));
        assert!(dict.contains_key("ToUnicode"));
        let base = dict.get("BaseFont").and_then(|o| o.as_name()).unwrap();
        assert!(has_subset_tag(base));

        let descendant_ref = dict
            .get("DescendantFonts")
            .and_then(|o| o.as_array())
            .and_then(|a| a.first())
            .and_then(|o| o.as_reference())
            .unwrap();
        let cid_font = store.get(descendant_ref).and_then(|o| o.as_dict()).unwrap();
        assert_eq!(cid_font.get("Subtype"), Some(&Object::name("CIDFontType2")));
        assert_eq!(cid_font.get("CIDToGIDMap"), Some(&Object::name("Identity")));
        assert_eq!(cid_font.get("DW"), Some(&Object::Integer(1000)));
        // notdef 0, space 3, A 36; the emoji has the default width
        assert_eq!(
            cid_font.get("W"),
            Some(&Object::Array(vec![
                Object::Integer(0),
                Object::Array(vec![Object::Integer(500)]),
                Object::Integer(3),
                Object::Array(vec![Object::Integer(278)]),
                Object::Integer(36),
                Object::Array(vec![Object::Integer(667)]),
            ]))
        );
        assert!(matches!(font.flush(&mut store), Err(Error::AlreadyFlushed { .. })));
    }

    #[test]
    fn test_vertical_skips_widths() {
        let mut font = Type0Font::new_identity(sample_truetype(), true);
        font.convert_to_bytes("A");
        let mut store = MemoryObjectStore::new();
        let r = font.flush(&mut store).unwrap();
        let dict = store.get(r).and_then(|o| o.as_dict()).cloned().unwrap();
        assert_eq!(dict.get("Encoding"), Some(&Object::name("Identity-V")));
        let descendant = store
            .iter()
            .filter_map(|(_, o)| o.as_dict())
            .find(|d| d.get("Subtype") == Some(&Object::name("CIDFontType2")))
            .unwrap();
        assert!(descendant.get("W").is_none());
        assert!(descendant.contains_key("DW"));
    }

    #[test]
    fn test_ucs2_charset() {
        let mut font = song();
        assert_eq!(font.convert_to_bytes("\u{4E2D} "), vec![0x4E, 0x2D, 0x00, 0x20]);
        assert!(font.used_cids().contains(&814));
        // outside the BMP nothing is written for UCS-2
        assert!(font.convert_to_bytes("\u{1F600}").is_empty());
    }

    #[test]
    fn test_codespace_first_match_decoding() {
        let font = song();
        let decoded = font.decode(&[0x20, 0x81, 0x40, 0xFF]);
        assert_eq!(decoded.glyphs.len(), 3);
        assert_eq!(decoded.glyphs[0].code, 1);
        assert_eq!(decoded.glyphs[1].code, 814);
        assert_eq!(decoded.glyphs[2].code, 0);
        assert_eq!(decoded.glyphs[2].width, 1000);
        assert!(!decoded.fully_decoded);
    }

    #[test]
    fn test_cid_flush_not_embedded() {
        let mut font = song();
        font.convert_to_bytes("\u{4E2D}");
        assert!(!font.is_embedded());
        let mut store = MemoryObjectStore::new();
        let r = font.flush(&mut store).unwrap();
        let dict = store.get(r).and_then(|o| o.as_dict()).cloned().unwrap();
        assert_eq!(dict.get("BaseFont"), Some(&Object::name("STSong-Light-UniGB-UCS2-H")));
        assert!(dict.get("ToUnicode").is_none());

        let cid_font = store
            .iter()
            .filter_map(|(_, o)| o.as_dict())
            .find(|d| d.get("Subtype") == Some(&Object::name("CIDFontType0")))
            .cloned()
            .unwrap();
        let info = cid_font.get("CIDSystemInfo").and_then(|o| o.as_dict()).unwrap();
        assert_eq!(info.get("Ordering"), Some(&Object::String(b"GB1".to_vec())));
        assert!(cid_font.get("CIDToGIDMap").is_none());
        let desc_ref = cid_font.get("FontDescriptor").and_then(|o| o.as_reference()).unwrap();
        let desc = store.get(desc_ref).and_then(|o| o.as_dict()).unwrap();
        assert!(desc.keys().all(|k| !k.starts_with("FontFile")));
    }
}
