//! Single-byte font encodings.
//!
//! A [`FontEncoding`] maps the 256 byte codes of a simple font to Unicode
//! and to glyph names. It is either built from a named base encoding, read
//! back from an existing `/Encoding` entry (base encoding + `/Differences`,
//! optionally seeded from a ToUnicode CMap), font-specific (symbolic fonts,
//! codes address the program directly) or empty (Type 3 fonts, filled as
//! glyphs are added).

use super::encoding_tables::BaseEncoding;
use super::glyph_list::{self, NOTDEF};
use crate::cmap::CMapToUnicode;
use crate::error::{Error, Result};
use crate::object::{Object, ObjectStore};
use std::collections::HashMap;

/// Encoding name used for symbolic fonts.
pub const FONT_SPECIFIC: &str = "FontSpecific";

/// Code ↔ Unicode ↔ glyph-name table of a simple font.
#[derive(Debug, Clone)]
pub struct FontEncoding {
    /// Declared base encoding name, if any
    base_encoding: Option<String>,
    font_specific: bool,
    code_to_unicode: [Option<u32>; 256],
    unicode_to_code: HashMap<u32, u8>,
    /// Glyph names per code; absent for WinAnsi/MacRoman and font-specific encodings
    differences: Option<Vec<Option<String>>>,
}

impl FontEncoding {
    fn blank() -> Self {
        Self {
            base_encoding: None,
            font_specific: false,
            code_to_unicode: [None; 256],
            unicode_to_code: HashMap::new(),
            differences: None,
        }
    }

    /// Encoding for a named base encoding.
    ///
    /// WinAnsi, MacRoman, Symbol and ZapfDingbats select their own table;
    /// any other name (or an empty one) falls back to StandardEncoding.
    /// `FontSpecific` yields [`create_font_specific`](Self::create_font_specific).
    pub fn create_named(name: &str) -> Self {
        if name == FONT_SPECIFIC {
            return Self::create_font_specific();
        }
        let base = BaseEncoding::from_name(name);
        let mut encoding = Self::blank();
        encoding.base_encoding = Some(name.to_string()).filter(|n| !n.is_empty());
        if !base.is_pdf_named() {
            encoding.differences = Some(vec![None; 256]);
        }
        encoding.fill_base(base);
        encoding
    }

    /// Encoding of a symbolic font: codes are program indices and
    /// `get_unicode` returns the raw code.
    pub fn create_font_specific() -> Self {
        let mut encoding = Self::blank();
        encoding.base_encoding = Some(FONT_SPECIFIC.to_string());
        encoding.font_specific = true;
        for code in 0..=255u8 {
            encoding.code_to_unicode[code as usize] = Some(code as u32);
            encoding.unicode_to_code.insert(code as u32, code);
        }
        encoding
    }

    /// Encoding with no assigned codes, filled through [`add_symbol`](Self::add_symbol).
    pub fn create_empty() -> Self {
        let mut encoding = Self::blank();
        encoding.differences = Some(vec![None; 256]);
        encoding
    }

    /// Encoding read back from a base encoding name and a `/Differences` array.
    ///
    /// Difference names unknown to the glyph list take their Unicode value
    /// from `to_unicode`, if present; otherwise the code stays undecodable.
    pub fn create_from_differences(
        base_encoding_name: Option<&str>,
        differences: Option<&[Object]>,
        to_unicode: Option<&CMapToUnicode>,
    ) -> Self {
        let base = base_encoding_name
            .map(BaseEncoding::from_name)
            .unwrap_or(BaseEncoding::Standard);
        let mut encoding = Self::blank();
        encoding.base_encoding = base_encoding_name.map(str::to_string);
        encoding.differences = Some(vec![None; 256]);
        encoding.fill_base(base);

        if let Some(diffs) = differences {
            encoding.apply_differences(diffs, to_unicode);
        }
        encoding
    }

    /// Encoding seeded only from a ToUnicode CMap (no `/Encoding` entry).
    pub fn create_from_to_unicode(to_unicode: &CMapToUnicode) -> Self {
        let mut encoding = Self::blank();
        encoding.differences = Some(vec![None; 256]);
        for (code, unicode) in to_unicode.create_direct_mapping() {
            if code < 256 {
                let name = glyph_list::unicode_to_name(unicode);
                encoding.assign(code as u8, unicode, Some(name.into_owned()));
            }
        }
        encoding
    }

    /// Build the encoding of an existing font from its `/Encoding` value.
    ///
    /// A name selects a named encoding, a dictionary is read as
    /// `/BaseEncoding` + `/Differences`. Without `/Encoding` the ToUnicode
    /// CMap seeds the table, and without either the font is font-specific.
    pub fn from_pdf_object(
        encoding: Option<&Object>,
        to_unicode: Option<&CMapToUnicode>,
        store: &dyn ObjectStore,
    ) -> Self {
        match encoding.map(|o| store.resolve(o)) {
            Some(Object::Name(name)) => Self::create_named(name),
            Some(Object::Dictionary(dict)) => {
                let base = store.resolve_key(dict, "BaseEncoding").and_then(|o| o.as_name());
                let diffs = store
                    .resolve_key(dict, "Differences")
                    .and_then(|o| o.as_array())
                    .map(|arr| {
                        arr.iter()
                            .map(|o| store.resolve(o).clone())
                            .collect::<Vec<_>>()
                    });
                Self::create_from_differences(base, diffs.as_deref(), to_unicode)
            },
            _ => match to_unicode {
                Some(cmap) if cmap.has_mappings() => Self::create_from_to_unicode(cmap),
                _ => Self::create_font_specific(),
            },
        }
    }

    fn fill_base(&mut self, base: BaseEncoding) {
        for code in 0..=255u8 {
            if let Some(unicode) = base.unicode(code) {
                let name = self
                    .differences
                    .as_ref()
                    .map(|_| glyph_list::unicode_to_name(unicode).into_owned());
                self.assign(code, unicode, name);
            } else if let Some(diffs) = self.differences.as_mut() {
                diffs[code as usize] = Some(NOTDEF.to_string());
            }
        }
    }

    fn apply_differences(&mut self, diffs: &[Object], to_unicode: Option<&CMapToUnicode>) {
        let mut current: i64 = 0;
        for obj in diffs {
            match obj {
                Object::Integer(n) => current = *n,
                Object::Real(r) => current = *r as i64,
                Object::Name(name) => {
                    if !(0..=255).contains(&current) {
                        log::warn!("Differences entry /{} at code {} is out of range", name, current);
                        current += 1;
                        continue;
                    }
                    let code = current as u8;
                    let unicode = glyph_list::name_to_unicode(name).or_else(|| {
                        to_unicode
                            .and_then(|cmap| cmap.lookup(code as u32))
                            .and_then(|chars| {
                                char::decode_utf16(chars.iter().copied()).next()?.ok()
                            })
                            .map(|c| c as u32)
                    });
                    match unicode {
                        Some(unicode) => self.assign(code, unicode, Some(name.clone())),
                        None => {
                            log::debug!("Glyph /{} at code {} has no Unicode value", name, code);
                            self.unassign(code);
                            if let Some(d) = self.differences.as_mut() {
                                d[code as usize] = Some(name.clone());
                            }
                        },
                    }
                    current += 1;
                },
                other => log::warn!("Ignoring {} in Differences array", other.type_name()),
            }
        }
    }

    fn assign(&mut self, code: u8, unicode: u32, name: Option<String>) {
        self.unassign(code);
        self.code_to_unicode[code as usize] = Some(unicode);
        self.unicode_to_code.entry(unicode).or_insert(code);
        if let (Some(diffs), Some(name)) = (self.differences.as_mut(), name) {
            diffs[code as usize] = Some(name);
        }
    }

    fn unassign(&mut self, code: u8) {
        if let Some(old) = self.code_to_unicode[code as usize].take() {
            if self.unicode_to_code.get(&old) == Some(&code) {
                self.unicode_to_code.remove(&old);
                // another code may still carry the same character
                if let Some(other) = (0..=255u8)
                    .find(|&c| c != code && self.code_to_unicode[c as usize] == Some(old))
                {
                    self.unicode_to_code.insert(old, other);
                }
            }
        }
    }

    /// Register a Type 3 symbol at `code`.
    ///
    /// Fails if the code already decodes to something.
    pub fn add_symbol(&mut self, code: u8, unicode: u32) -> Result<()> {
        if self.code_to_unicode[code as usize].is_some() {
            return Err(Error::CodeAlreadyRegistered(code));
        }
        let name = glyph_list::unicode_to_name(unicode).into_owned();
        self.differences.get_or_insert_with(|| vec![None; 256]);
        self.assign(code, unicode, Some(name));
        Ok(())
    }

    /// Whether `unicode` has a code in this encoding.
    pub fn can_encode(&self, unicode: u32) -> bool {
        if self.font_specific {
            return unicode < 256 || (0xF000..=0xF0FF).contains(&unicode);
        }
        self.unicode_to_code.contains_key(&unicode)
    }

    /// Whether `code` decodes to a Unicode value.
    pub fn can_decode(&self, code: u8) -> bool {
        self.code_to_unicode[code as usize].is_some()
    }

    /// Unicode value of `code`; for font-specific encodings, the code itself.
    pub fn get_unicode(&self, code: u8) -> Option<u32> {
        self.code_to_unicode[code as usize]
    }

    /// Byte code of `unicode`.
    pub fn convert_to_byte(&self, unicode: u32) -> Option<u8> {
        if self.font_specific {
            return self.can_encode(unicode).then_some((unicode & 0xFF) as u8);
        }
        self.unicode_to_code.get(&unicode).copied()
    }

    /// Encode text, one byte per character.
    ///
    /// Font-specific encodings keep every character (low byte); other
    /// encodings drop characters they cannot encode.
    pub fn convert_to_bytes(&self, text: &str) -> Vec<u8> {
        if self.font_specific {
            return text.chars().map(|c| (c as u32 & 0xFF) as u8).collect();
        }
        text.chars()
            .filter_map(|c| self.convert_to_byte(c as u32))
            .collect()
    }

    /// Glyph name of `code`, when this encoding tracks names.
    pub fn get_difference(&self, code: u8) -> Option<&str> {
        self.differences
            .as_ref()
            .and_then(|d| d[code as usize].as_deref())
    }

    /// Whether glyph names are tracked (the encoding needs `/Differences`).
    pub fn has_differences(&self) -> bool {
        self.differences.is_some()
    }

    /// Whether codes address the font program directly.
    pub fn is_font_specific(&self) -> bool {
        self.font_specific
    }

    /// Declared base encoding name.
    pub fn base_encoding_name(&self) -> Option<&str> {
        self.base_encoding.as_deref()
    }

    /// The PDF name to write as `/Encoding`, if the encoding needs no
    /// `/Differences` (WinAnsi or MacRoman).
    pub fn pdf_name(&self) -> Option<&'static str> {
        if self.font_specific || self.differences.is_some() {
            return None;
        }
        let base = BaseEncoding::from_name(self.base_encoding.as_deref().unwrap_or(""));
        base.is_pdf_named().then(|| base.pdf_name()).flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::MemoryObjectStore;

    #[test]
    fn test_win_ansi_named() {
        let enc = FontEncoding::create_named("WinAnsiEncoding");
        assert!(!enc.has_differences());
        assert!(!enc.is_font_specific());
        assert_eq!(enc.convert_to_byte(0x20AC), Some(0x80));
        assert_eq!(enc.get_unicode(0xE9), Some(0xE9));
        assert!(enc.can_encode('A' as u32));
        assert!(!enc.can_encode(0x0416));
        assert!(!enc.can_decode(0x81));
        assert_eq!(enc.pdf_name(), Some("WinAnsiEncoding"));
    }

    #[test]
    fn test_symbol_named_has_differences() {
        let enc = FontEncoding::create_named("Symbol");
        assert!(enc.has_differences());
        assert_eq!(enc.get_difference(0x61), Some("alpha"));
        assert_eq!(enc.get_difference(0x80), Some(NOTDEF));
        assert_eq!(enc.convert_to_byte(0x03B1), Some(0x61));
        assert_eq!(enc.pdf_name(), None);
    }

    #[test]
    fn test_unknown_name_falls_back_to_standard() {
        let enc = FontEncoding::create_named("Cp1251");
        assert_eq!(enc.convert_to_byte(0x2019), Some(0x27));
        assert_eq!(enc.get_difference(0x27), Some("quoteright"));
        assert!(!enc.can_encode(0x0416));
    }

    #[test]
    fn test_font_specific() {
        let enc = FontEncoding::create_named(FONT_SPECIFIC);
        assert!(enc.is_font_specific());
        assert_eq!(enc.get_unicode(0x41), Some(0x41));
        assert_eq!(enc.get_unicode(0xF0), Some(0xF0));
        assert_eq!(enc.convert_to_bytes("A\u{F041}\u{0141}"), vec![0x41, 0x41, 0x41]);
        assert!(enc.can_encode(0xF041));
        assert!(!enc.can_encode(0x0416));
    }

    #[test]
    fn test_convert_drops_unencodable() {
        let enc = FontEncoding::create_named("WinAnsiEncoding");
        assert_eq!(enc.convert_to_bytes("a\u{0416}b€"), vec![b'a', b'b', 0x80]);
    }

    #[test]
    fn test_empty_and_add_symbol() {
        let mut enc = FontEncoding::create_empty();
        assert!(!enc.can_decode(1));
        enc.add_symbol(1, 'A' as u32).unwrap();
        enc.add_symbol(2, 0x2605).unwrap();
        assert_eq!(enc.get_unicode(1), Some(0x41));
        assert_eq!(enc.get_difference(1), Some("A"));
        assert_eq!(enc.get_difference(2), Some("uni2605"));
        assert_eq!(enc.convert_to_byte(0x2605), Some(2));

        let err = enc.add_symbol(1, 'B' as u32).unwrap_err();
        assert!(matches!(err, Error::CodeAlreadyRegistered(1)));
    }

    #[test]
    fn test_differences_override_base() {
        let diffs = vec![
            Object::Integer(65),
            Object::name("Alpha"),
            Object::name("Beta"),
            Object::Integer(200),
            Object::name("Euro"),
        ];
        let enc = FontEncoding::create_from_differences(
            Some("WinAnsiEncoding"),
            Some(&diffs),
            None,
        );
        assert!(enc.has_differences());
        assert_eq!(enc.get_unicode(65), Some(0x0391));
        assert_eq!(enc.get_unicode(66), Some(0x0392));
        assert_eq!(enc.get_unicode(67), Some('C' as u32));
        assert_eq!(enc.get_difference(200), Some("Euro"));
        // 'A' lost its code
        assert!(!enc.can_encode('A' as u32));
        // Euro is still reachable; the base code wins the reverse lookup
        assert_eq!(enc.convert_to_byte(0x20AC), Some(0x80));
    }

    #[test]
    fn test_differences_unknown_name_uses_to_unicode() {
        let cmap = CMapToUnicode::parse(
            b"1 begincodespacerange <00> <FF> endcodespacerange\n\
              1 beginbfchar <41> <263A> endbfchar",
        )
        .unwrap();
        let diffs = vec![Object::Integer(65), Object::name("g17"), Object::name("g18")];
        let enc = FontEncoding::create_from_differences(None, Some(&diffs), Some(&cmap));
        assert_eq!(enc.get_unicode(65), Some(0x263A));
        assert_eq!(enc.get_difference(65), Some("g17"));
        assert!(!enc.can_decode(66));
        assert_eq!(enc.get_difference(66), Some("g18"));
    }

    #[test]
    fn test_from_pdf_object_variants() {
        let store = MemoryObjectStore::new();
        let named = FontEncoding::from_pdf_object(
            Some(&Object::name("MacRomanEncoding")),
            None,
            &store,
        );
        assert_eq!(named.pdf_name(), Some("MacRomanEncoding"));

        let none = FontEncoding::from_pdf_object(None, None, &store);
        assert!(none.is_font_specific());

        let cmap = CMapToUnicode::parse(
            b"1 begincodespacerange <00> <FF> endcodespacerange\n\
              2 beginbfchar <01> <0416> <02> <0041> endbfchar",
        )
        .unwrap();
        let seeded = FontEncoding::from_pdf_object(None, Some(&cmap), &store);
        assert_eq!(seeded.get_unicode(1), Some(0x0416));
        assert_eq!(seeded.get_difference(2), Some("A"));
        assert_eq!(seeded.convert_to_byte(0x0416), Some(1));
    }
}
