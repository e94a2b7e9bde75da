//! The font engine interface.
//!
//! [`PdfFont`] is what a content-stream writer or a text extractor sees of
//! a font: text ↔ byte conversion, glyph and width lookups, and a one-shot
//! [`flush`](PdfFont::flush) that writes the PDF font objects. The three
//! engines ([`SimpleFont`], [`Type0Font`], [`Type3Font`]) are collected in
//! the [`Font`] enum.

use super::glyph::Glyph;
use super::metrics::{FontDescriptorFlags, FontMetrics, FontNames};
use super::simple::SimpleFont;
use super::type0::Type0Font;
use super::type3::Type3Font;
use crate::error::Result;
use crate::object::{Dictionary, Object, ObjectRef, ObjectStore};

/// Glyphs decoded from content-stream bytes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedText {
    /// Decoded glyphs in string order
    pub glyphs: Vec<Glyph>,
    /// False if any code could not be matched to a glyph
    pub fully_decoded: bool,
}

impl DecodedText {
    /// Empty, fully decoded result.
    pub fn new() -> Self {
        Self {
            glyphs: Vec::new(),
            fully_decoded: true,
        }
    }

    /// Text of all glyphs.
    pub fn to_unicode_string(&self) -> String {
        self.glyphs.iter().map(Glyph::text).collect()
    }

    /// Sum of glyph widths in 1000-unit glyph space.
    pub fn width(&self) -> i32 {
        self.glyphs.iter().map(|g| g.width).sum()
    }
}

/// Operations shared by all font engines.
///
/// An engine is single-threaded: it is mutated by whoever builds the
/// document and flushed exactly once.
pub trait PdfFont {
    /// PostScript name, without subset tag.
    fn font_name(&self) -> &str;

    /// `/Subtype` of the font dictionary.
    fn subtype(&self) -> &'static str;

    /// Glyph used to draw `unicode`.
    ///
    /// Never fails: unmappable characters get a zero-width placeholder or
    /// a notdef substitute.
    fn get_glyph(&self, unicode: u32) -> Glyph;

    /// Whether `unicode` can be drawn with a real glyph.
    fn contains_glyph(&self, unicode: u32) -> bool;

    /// Encode text for a content stream, marking the glyphs used.
    fn convert_to_bytes(&mut self, text: &str) -> Vec<u8>;

    /// Encode already resolved glyphs, marking them used.
    fn convert_glyphs_to_bytes(&mut self, glyphs: &[Glyph]) -> Vec<u8>;

    /// Decode content-stream bytes.
    fn decode(&self, bytes: &[u8]) -> DecodedText;

    /// Whether the font program is embedded.
    fn is_embedded(&self) -> bool;

    /// Whether only used glyphs are written.
    fn is_subset(&self) -> bool;

    /// Enable or disable subsetting.
    fn set_subset(&mut self, subset: bool);

    /// Keep every glyph whose Unicode value lies in `range` in the subset.
    fn add_subset_range(&mut self, range: [u32; 2]);

    /// Whether [`flush`](Self::flush) has run.
    fn is_flushed(&self) -> bool;

    /// Write the font objects and return the font dictionary reference.
    fn flush(&mut self, store: &mut dyn ObjectStore) -> Result<ObjectRef>;

    /// Width of `unicode` in 1000-unit glyph space.
    fn width(&self, unicode: u32) -> i32 {
        self.get_glyph(unicode).width
    }

    /// Width of `text` in 1000-unit glyph space.
    fn text_width(&self, text: &str) -> i32 {
        text.chars().map(|c| self.width(c as u32)).sum()
    }

    /// Width of `text` in points at `font_size`.
    fn text_width_points(&self, text: &str, font_size: f32) -> f32 {
        self.text_width(text) as f32 * font_size / 1000.0
    }
}

/// Any font engine.
#[derive(Debug)]
pub enum Font {
    /// Type 1 or TrueType with one-byte codes
    Simple(SimpleFont),
    /// Composite font with a CID descendant
    Type0(Type0Font),
    /// Procedural glyphs
    Type3(Type3Font),
}

macro_rules! dispatch {
    ($self:ident, $f:ident => $e:expr) => {
        match $self {
            Font::Simple($f) => $e,
            Font::Type0($f) => $e,
            Font::Type3($f) => $e,
        }
    };
}

impl PdfFont for Font {
    fn font_name(&self) -> &str {
        dispatch!(self, f => f.font_name())
    }

    fn subtype(&self) -> &'static str {
        dispatch!(self, f => f.subtype())
    }

    fn get_glyph(&self, unicode: u32) -> Glyph {
        dispatch!(self, f => f.get_glyph(unicode))
    }

    fn contains_glyph(&self, unicode: u32) -> bool {
        dispatch!(self, f => f.contains_glyph(unicode))
    }

    fn convert_to_bytes(&mut self, text: &str) -> Vec<u8> {
        dispatch!(self, f => f.convert_to_bytes(text))
    }

    fn convert_glyphs_to_bytes(&mut self, glyphs: &[Glyph]) -> Vec<u8> {
        dispatch!(self, f => f.convert_glyphs_to_bytes(glyphs))
    }

    fn decode(&self, bytes: &[u8]) -> DecodedText {
        dispatch!(self, f => f.decode(bytes))
    }

    fn is_embedded(&self) -> bool {
        dispatch!(self, f => f.is_embedded())
    }

    fn is_subset(&self) -> bool {
        dispatch!(self, f => f.is_subset())
    }

    fn set_subset(&mut self, subset: bool) {
        dispatch!(self, f => f.set_subset(subset))
    }

    fn add_subset_range(&mut self, range: [u32; 2]) {
        dispatch!(self, f => f.add_subset_range(range))
    }

    fn is_flushed(&self) -> bool {
        dispatch!(self, f => f.is_flushed())
    }

    fn flush(&mut self, store: &mut dyn ObjectStore) -> Result<ObjectRef> {
        dispatch!(self, f => f.flush(store))
    }
}

impl Font {
    /// The simple engine, if this is one.
    pub fn as_simple(&self) -> Option<&SimpleFont> {
        match self {
            Font::Simple(f) => Some(f),
            _ => None,
        }
    }

    /// The Type 0 engine, if this is one.
    pub fn as_type0(&self) -> Option<&Type0Font> {
        match self {
            Font::Type0(f) => Some(f),
            _ => None,
        }
    }

    /// The Type 3 engine, if this is one.
    pub fn as_type3_mut(&mut self) -> Option<&mut Type3Font> {
        match self {
            Font::Type3(f) => Some(f),
            _ => None,
        }
    }
}

impl From<SimpleFont> for Font {
    fn from(f: SimpleFont) -> Self {
        Font::Simple(f)
    }
}

impl From<Type0Font> for Font {
    fn from(f: Type0Font) -> Self {
        Font::Type0(f)
    }
}

impl From<Type3Font> for Font {
    fn from(f: Type3Font) -> Self {
        Font::Type3(f)
    }
}

/// A font read from a document: its dictionary and where it lives.
#[derive(Debug, Clone)]
pub(crate) struct SourceDictionary {
    pub(crate) reference: Option<ObjectRef>,
    pub(crate) dict: Dictionary,
}

impl SourceDictionary {
    /// Write the dictionary back unchanged.
    pub(crate) fn flush(&self, store: &mut dyn ObjectStore) -> ObjectRef {
        match self.reference {
            Some(r) => r,
            None => store.add(Object::Dictionary(self.dict.clone())),
        }
    }
}

/// Which `/FontFile` entry an embedded program goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FontFileKind {
    /// `/FontFile`: Type 1
    Type1,
    /// `/FontFile2`: TrueType
    TrueType,
    /// `/FontFile3` with the given `/Subtype`
    Compact(&'static str),
}

/// Store a font program stream; returns the descriptor key and reference.
pub(crate) fn embed_program(
    store: &mut dyn ObjectStore,
    program: &[u8],
    kind: FontFileKind,
) -> Result<(&'static str, ObjectRef)> {
    let mut dict = Dictionary::new();
    let key = match kind {
        FontFileKind::Type1 => {
            dict.insert("Length1".to_string(), Object::Integer(program.len() as i64));
            "FontFile"
        },
        FontFileKind::TrueType => {
            dict.insert("Length1".to_string(), Object::Integer(program.len() as i64));
            "FontFile2"
        },
        FontFileKind::Compact(subtype) => {
            dict.insert("Subtype".to_string(), Object::name(subtype));
            "FontFile3"
        },
    };
    let stream = Object::flate_stream(dict, program)?;
    log::debug!("Embedding {} bytes as /{}", program.len(), key);
    Ok((key, store.add(stream)))
}

/// Store a ToUnicode program stream.
pub(crate) fn to_unicode_stream(store: &mut dyn ObjectStore, program: &[u8]) -> Result<ObjectRef> {
    Ok(store.add(Object::flate_stream(Dictionary::new(), program)?))
}

/// A number as an integer when it has no fraction.
pub(crate) fn number(value: f64) -> Object {
    if value.fract() == 0.0 {
        Object::Integer(value as i64)
    } else {
        Object::Real(value)
    }
}

/// Build a `/FontDescriptor` dictionary.
pub(crate) fn font_descriptor(
    font_name: &str,
    names: &FontNames,
    metrics: &FontMetrics,
    flags: FontDescriptorFlags,
    font_file: Option<(&'static str, ObjectRef)>,
    with_family: bool,
) -> Dictionary {
    let mut desc = Dictionary::new();
    desc.insert("Type".to_string(), Object::name("FontDescriptor"));
    desc.insert("FontName".to_string(), Object::name(font_name));
    desc.insert("Ascent".to_string(), Object::Integer(metrics.ascent as i64));
    desc.insert("Descent".to_string(), Object::Integer(metrics.descent as i64));
    desc.insert("CapHeight".to_string(), Object::Integer(metrics.cap_height as i64));
    if metrics.x_height > 0 {
        desc.insert("XHeight".to_string(), Object::Integer(metrics.x_height as i64));
    }
    desc.insert("ItalicAngle".to_string(), number(metrics.italic_angle as f64));
    desc.insert("StemV".to_string(), Object::Integer(metrics.stem_v as i64));
    if metrics.stem_h > 0 {
        desc.insert("StemH".to_string(), Object::Integer(metrics.stem_h as i64));
    }
    desc.insert(
        "FontBBox".to_string(),
        Object::int_array(metrics.bbox.iter().map(|v| *v as i64)),
    );
    desc.insert("Flags".to_string(), Object::Integer(flags.bits() as i64));
    if with_family {
        if let Some(family) = &names.family_name {
            desc.insert("FontFamily".to_string(), Object::String(family.as_bytes().to_vec()));
        }
        desc.insert("FontWeight".to_string(), Object::Integer(names.weight as i64));
    }
    if let Some((key, r)) = font_file {
        desc.insert(key.to_string(), Object::Reference(r));
    }
    desc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::MemoryObjectStore;

    #[test]
    fn test_decoded_text() {
        let mut decoded = DecodedText::new();
        assert!(decoded.fully_decoded);
        decoded.glyphs.push(Glyph::new(1, 500, Some('H' as u32)));
        decoded.glyphs.push(Glyph::with_chars(2, 700, None, Some(vec![0x66, 0x69])));
        assert_eq!(decoded.to_unicode_string(), "Hfi");
        assert_eq!(decoded.width(), 1200);
    }

    #[test]
    fn test_descriptor_entries() {
        let mut names = FontNames::new("Sample");
        names.family_name = Some("Sample Sans".to_string());
        let metrics = FontMetrics {
            italic_angle: -12.5,
            ..FontMetrics::default()
        };
        let desc = font_descriptor(
            "ABCDEF+Sample",
            &names,
            &metrics,
            FontDescriptorFlags::NONSYMBOLIC,
            Some(("FontFile2", ObjectRef::new(7, 0))),
            true,
        );
        assert_eq!(desc.get("FontName"), Some(&Object::name("ABCDEF+Sample")));
        assert_eq!(desc.get("ItalicAngle"), Some(&Object::Real(-12.5)));
        assert_eq!(desc.get("Flags"), Some(&Object::Integer(32)));
        assert!(desc.get("XHeight").is_none());
        assert!(desc.get("StemH").is_none());
        assert_eq!(desc.get("FontFile2"), Some(&Object::Reference(ObjectRef::new(7, 0))));
        assert!(desc.contains_key("FontFamily"));
    }

    #[test]
    fn test_embed_program_kinds() {
        let mut store = MemoryObjectStore::new();
        let (key, r) = embed_program(&mut store, b"OTTO....", FontFileKind::Compact("OpenType")).unwrap();
        assert_eq!(key, "FontFile3");
        let stream = store.get(r).unwrap();
        assert_eq!(stream.as_dict().and_then(|d| d.get("Subtype")), Some(&Object::name("OpenType")));
        assert_eq!(stream.stream_data().unwrap(), b"OTTO....");

        let (key, r) = embed_program(&mut store, &[0u8; 12], FontFileKind::TrueType).unwrap();
        assert_eq!(key, "FontFile2");
        let length1 = store.get(r).and_then(|o| o.as_dict()).and_then(|d| d.get("Length1")).cloned();
        assert_eq!(length1, Some(Object::Integer(12)));
    }

    #[test]
    fn test_source_dictionary_flush() {
        let mut store = MemoryObjectStore::new();
        let source = SourceDictionary {
            reference: Some(ObjectRef::new(42, 0)),
            dict: Dictionary::new(),
        };
        assert_eq!(source.flush(&mut store), ObjectRef::new(42, 0));
        assert!(store.is_empty());

        let source = SourceDictionary {
            reference: None,
            dict: Dictionary::new(),
        };
        let r = source.flush(&mut store);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(r), Some(&Object::Dictionary(Dictionary::new())));
    }
}
