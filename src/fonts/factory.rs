//! Font creation and reconstruction.
//!
//! [`FontFactory`] turns a font program plus an encoding name into the
//! right engine and decides embedding, or rebuilds an engine from a font
//! dictionary found in a document.

use super::encoding::{FontEncoding, FONT_SPECIFIC};
use super::font::{Font, PdfFont, SourceDictionary};
use super::program::{
    CidFontProgram, DocFontKind, DocFontProgram, FontProgram, GlyphRepository, TrueTypeProgram,
    Type1Program,
};
use super::simple::SimpleFont;
use super::type0::{CidFontType, Type0Font};
use super::type3::Type3Font;
use crate::cmap::{CMapCache, CMapEncoding, CMapToUnicode};
use crate::config::FontConfig;
use crate::error::{Error, Result};
use crate::object::{Object, ObjectStore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Encoding used for simple fonts when none is given.
pub const DEFAULT_SIMPLE_ENCODING: &str = "WinAnsiEncoding";

/// Whether a font program should be embedded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmbeddingStrategy {
    /// Embed or fail
    ForceEmbedded,
    /// Never embed; fail where embedding is mandatory
    ForceNotEmbedded,
    /// Embed when possible
    PreferEmbedded,
    /// Embed only where mandatory
    PreferNotEmbedded,
}

impl EmbeddingStrategy {
    fn wants_embedding(self) -> bool {
        matches!(self, EmbeddingStrategy::ForceEmbedded | EmbeddingStrategy::PreferEmbedded)
    }
}

impl fmt::Display for EmbeddingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EmbeddingStrategy::ForceEmbedded => "FORCE_EMBEDDED",
            EmbeddingStrategy::ForceNotEmbedded => "FORCE_NOT_EMBEDDED",
            EmbeddingStrategy::PreferEmbedded => "PREFER_EMBEDDED",
            EmbeddingStrategy::PreferNotEmbedded => "PREFER_NOT_EMBEDDED",
        };
        f.write_str(s)
    }
}

/// Creates font engines.
#[derive(Debug, Clone)]
pub struct FontFactory {
    config: FontConfig,
    cmaps: Arc<CMapCache>,
}

impl Default for FontFactory {
    fn default() -> Self {
        Self::new(FontConfig::default())
    }
}

impl FontFactory {
    /// Factory with a CMap cache built from `config`.
    pub fn new(config: FontConfig) -> Self {
        let cmaps = Arc::new(CMapCache::from_config(&config));
        Self { config, cmaps }
    }

    /// Factory sharing an existing CMap cache.
    pub fn with_cmap_cache(config: FontConfig, cmaps: Arc<CMapCache>) -> Self {
        Self { config, cmaps }
    }

    /// Configuration.
    pub fn config(&self) -> &FontConfig {
        &self.config
    }

    /// The CMap cache.
    pub fn cmap_cache(&self) -> &Arc<CMapCache> {
        &self.cmaps
    }

    /// One of the 14 standard fonts, not embedded.
    pub fn create_standard_font(&self, name: &str, encoding: &str) -> Result<Font> {
        let program = Type1Program::standard(name)?;
        self.create_font(program.into(), encoding, Some(EmbeddingStrategy::PreferNotEmbedded))?
            .ok_or_else(|| Error::FontProgram(format!("{} cannot use encoding {}", name, encoding)))
    }

    /// Load a predefined CJK font by name.
    pub fn load_cid_program(&self, name: &str) -> Result<CidFontProgram> {
        CidFontProgram::new(name, &self.cmaps)
    }

    /// Empty Type 3 font.
    pub fn create_type3_font(&self, name: &str, colorized: bool) -> Type3Font {
        Type3Font::new(name, colorized).with_bfrange_batch(self.config.max_bfrange_entries)
    }

    /// Create the engine for `program` with `encoding`.
    ///
    /// `strategy` defaults to the configured one. Returns `Ok(None)` when a
    /// predefined CJK font cannot be used with `encoding`.
    pub fn create_font(
        &self,
        program: FontProgram,
        encoding: &str,
        strategy: Option<EmbeddingStrategy>,
    ) -> Result<Option<Font>> {
        let strategy = strategy.unwrap_or(self.config.default_strategy);
        let mut font: Font = match program {
            FontProgram::Type1(p) => self.create_type1(p, encoding, strategy)?.into(),
            FontProgram::TrueType(p) if CMapEncoding::is_identity_name(encoding) => {
                self.create_identity(p, encoding, strategy)?.into()
            },
            FontProgram::TrueType(p) => self.create_truetype(p, encoding, strategy)?.into(),
            FontProgram::Cid(p) => match self.create_cid(p, encoding, strategy)? {
                Some(font) => font.into(),
                None => return Ok(None),
            },
            FontProgram::Doc(p) => {
                return Err(Error::FontProgram(format!(
                    "{} was read from a document; load it from its dictionary",
                    p.font_names().font_name
                )))
            },
        };
        font.set_subset(self.config.subset);
        log::debug!(
            "Created {} font {} ({}, embedded: {})",
            font.subtype(),
            font.font_name(),
            strategy,
            font.is_embedded()
        );
        Ok(Some(font))
    }

    fn simple_encoding(font_specific: bool, encoding: &str) -> FontEncoding {
        if font_specific {
            FontEncoding::create_font_specific()
        } else if encoding.is_empty() {
            FontEncoding::create_named(DEFAULT_SIMPLE_ENCODING)
        } else {
            FontEncoding::create_named(encoding)
        }
    }

    fn create_type1(&self, program: Type1Program, encoding: &str, strategy: EmbeddingStrategy) -> Result<SimpleFont> {
        let name = program.font_names().font_name.clone();
        if CMapEncoding::is_identity_name(encoding) {
            return Err(Error::FontProgram(format!(
                "Type 1 font {} needs a single-byte encoding, not {}",
                name, encoding
            )));
        }
        if strategy == EmbeddingStrategy::ForceEmbedded {
            if program.is_builtin() {
                return Err(Error::CannotEmbedStandardFont { font: name });
            }
            if program.data().is_none() {
                return Err(Error::FontProgram(format!("{} has no program to embed", name)));
            }
        }
        let embedded = strategy.wants_embedding() && !program.is_builtin() && program.data().is_some();
        let encoding = Self::simple_encoding(program.is_font_specific() || encoding == FONT_SPECIFIC, encoding);
        Ok(SimpleFont::new(program.into(), encoding, embedded)
            .with_bfrange_batch(self.config.max_bfrange_entries))
    }

    fn create_truetype(
        &self,
        program: TrueTypeProgram,
        encoding: &str,
        strategy: EmbeddingStrategy,
    ) -> Result<SimpleFont> {
        let name = program.font_names().font_name.clone();
        let allowed = program.allows_embedding();
        if strategy == EmbeddingStrategy::ForceEmbedded && !allowed {
            return Err(Error::EmbeddingNotAllowed { font: name });
        }
        let embedded = strategy.wants_embedding() && allowed && program.data().is_some();
        let encoding = Self::simple_encoding(program.is_font_specific() || encoding == FONT_SPECIFIC, encoding);
        Ok(SimpleFont::new(program.into(), encoding, embedded)
            .with_bfrange_batch(self.config.max_bfrange_entries))
    }

    fn create_identity(
        &self,
        program: TrueTypeProgram,
        encoding: &str,
        strategy: EmbeddingStrategy,
    ) -> Result<Type0Font> {
        let name = program.font_names().font_name.clone();
        if strategy == EmbeddingStrategy::ForceNotEmbedded {
            return Err(Error::StrategyConflict {
                font: name,
                strategy: strategy.to_string(),
                reason: "composite TrueType fonts are always embedded".to_string(),
            });
        }
        if !program.allows_embedding() {
            return Err(Error::EmbeddingNotAllowed { font: name });
        }
        let vertical = encoding == crate::cmap::IDENTITY_V;
        Ok(Type0Font::new_identity(program, vertical)
            .with_default_width(self.config.default_width)
            .with_bfrange_batch(self.config.max_bfrange_entries))
    }

    fn create_cid(
        &self,
        program: CidFontProgram,
        encoding: &str,
        strategy: EmbeddingStrategy,
    ) -> Result<Option<Type0Font>> {
        let name = program.font_names().font_name.clone();
        if strategy == EmbeddingStrategy::ForceEmbedded {
            return Err(Error::StrategyConflict {
                font: name,
                strategy: strategy.to_string(),
                reason: "predefined CJK fonts are never embedded".to_string(),
            });
        }
        let encoding = if encoding.is_empty() {
            program.predefined().ucs2_cmap
        } else {
            encoding
        };
        if !program.is_compatible_with(encoding) {
            log::warn!("{} cannot be used with CMap {}", name, encoding);
            return Ok(None);
        }
        let cmap = CMapEncoding::named(encoding, &self.cmaps)?;
        Ok(Some(
            Type0Font::new_cid(program, cmap)
                .with_default_width(self.config.default_width)
                .with_bfrange_batch(self.config.max_bfrange_entries),
        ))
    }

    /// Rebuild the engine of an existing font dictionary.
    ///
    /// `font` is the dictionary or a reference to it. Flushing the result
    /// writes the dictionary back unchanged.
    pub fn from_dictionary(&self, font: &Object, store: &dyn ObjectStore) -> Result<Font> {
        let dict = store.resolve(font).as_dict().ok_or_else(|| Error::InvalidObjectType {
            expected: "Dictionary".to_string(),
            found: store.resolve(font).type_name().to_string(),
        })?;
        let source = SourceDictionary {
            reference: font.as_reference(),
            dict: dict.clone(),
        };
        let subtype = store
            .resolve_key(dict, "Subtype")
            .and_then(|o| o.as_name())
            .ok_or_else(|| Error::missing("Font", "Subtype"))?;
        let to_unicode = self.read_to_unicode(store.resolve_key(dict, "ToUnicode"));
        log::debug!("Reading {} font dictionary", subtype);

        match subtype {
            "Type1" | "MMType1" | "TrueType" => {
                let kind = if subtype == "TrueType" {
                    DocFontKind::Simple
                } else {
                    DocFontKind::Type1
                };
                let encoding = match store.resolve_key(dict, "Encoding") {
                    None if kind == DocFontKind::Type1 && to_unicode.is_none() => {
                        let base = store.resolve_key(dict, "BaseFont").and_then(|o| o.as_name());
                        match base.and_then(|n| Type1Program::standard(n).ok()) {
                            Some(p) if p.is_font_specific() => FontEncoding::create_font_specific(),
                            Some(_) => FontEncoding::create_named("StandardEncoding"),
                            None => FontEncoding::create_font_specific(),
                        }
                    },
                    encoding => FontEncoding::from_pdf_object(encoding, to_unicode.as_deref(), store),
                };
                let program = DocFontProgram::simple(kind, dict, &encoding, to_unicode.as_deref(), store)?;
                Ok(SimpleFont::from_document(program, encoding, to_unicode, source).into())
            },
            "Type0" => {
                let cmap = match store.resolve_key(dict, "Encoding") {
                    Some(Object::Name(name)) => CMapEncoding::named(name, &self.cmaps)?,
                    Some(stream @ Object::Stream { .. }) => {
                        CMapEncoding::from_embedded(&stream.stream_data()?, &self.cmaps)?
                    },
                    _ => return Err(Error::missing("Type0 font", "Encoding")),
                };
                let descendant = store
                    .resolve_key(dict, "DescendantFonts")
                    .and_then(|o| o.as_array())
                    .and_then(|a| a.first())
                    .and_then(|o| store.resolve(o).as_dict())
                    .ok_or_else(|| Error::missing("Type0 font", "DescendantFonts"))?;
                let cid_font_type = match store.resolve_key(descendant, "Subtype").and_then(|o| o.as_name()) {
                    Some("CIDFontType2") => CidFontType::Type2,
                    _ => CidFontType::Type0,
                };
                let program = DocFontProgram::composite(descendant, &cmap, to_unicode.as_deref(), store)?;
                Ok(Type0Font::from_document(program, cmap, cid_font_type, to_unicode, source).into())
            },
            "Type3" => Ok(Type3Font::from_document(source, to_unicode, store)?
                .with_bfrange_batch(self.config.max_bfrange_entries)
                .into()),
            other => Err(Error::UnsupportedFontSubtype(other.to_string())),
        }
    }

    /// `/ToUnicode` of an existing font; broken streams degrade to the empty map.
    fn read_to_unicode(&self, to_unicode: Option<&Object>) -> Option<Arc<CMapToUnicode>> {
        match to_unicode {
            Some(Object::Name(name)) if CMapEncoding::is_identity_name(name) => Some(CMapToUnicode::identity()),
            Some(Object::Name(name)) => match self.cmaps.to_unicode(name) {
                Ok(cmap) => Some(cmap),
                Err(e) => {
                    log::warn!("ToUnicode {} unavailable: {}", name, e);
                    None
                },
            },
            Some(stream @ Object::Stream { .. }) => match stream.stream_data() {
                Ok(data) => Some(CMapToUnicode::parse_or_empty(&data)),
                Err(e) => {
                    log::warn!("Unreadable ToUnicode stream, ignoring it: {}", e);
                    Some(CMapToUnicode::empty())
                },
            },
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::glyph::Glyph;
    use crate::fonts::metrics::{FontMetrics, FontNames};
    use crate::object::{Dictionary, MemoryObjectStore};

    fn truetype(allow_embedding: bool) -> TrueTypeProgram {
        let mut names = FontNames::new("Sample");
        names.allow_embedding = allow_embedding;
        let glyphs = vec![Glyph::new(0, 500, None), Glyph::new(36, 667, Some('A' as u32))];
        TrueTypeProgram::from_parts(names, FontMetrics::default(), glyphs, false).with_data(vec![0u8; 8])
    }

    #[test]
    fn test_strategy_display_and_serde() {
        assert_eq!(EmbeddingStrategy::ForceNotEmbedded.to_string(), "FORCE_NOT_EMBEDDED");
        let json = serde_json::to_string(&EmbeddingStrategy::PreferEmbedded).unwrap();
        assert_eq!(json, "\"PreferEmbedded\"");
        let back: EmbeddingStrategy = serde_json::from_str(&json).unwrap();
        assert_eq!(back, EmbeddingStrategy::PreferEmbedded);
    }

    #[test]
    fn test_standard_font_is_never_embedded() {
        let factory = FontFactory::default();
        let err = factory
            .create_font(
                Type1Program::standard("Helvetica").unwrap().into(),
                "",
                Some(EmbeddingStrategy::ForceEmbedded),
            )
            .unwrap_err();
        assert!(matches!(err, Error::CannotEmbedStandardFont { .. }));

        let font = factory
            .create_font(
                Type1Program::standard("Helvetica").unwrap().into(),
                "",
                Some(EmbeddingStrategy::PreferEmbedded),
            )
            .unwrap()
            .unwrap();
        assert!(!font.is_embedded());
        assert_eq!(
            font.as_simple().and_then(|f| f.encoding().pdf_name()),
            Some("WinAnsiEncoding")
        );
    }

    #[test]
    fn test_truetype_permissions() {
        let factory = FontFactory::default();
        let err = factory
            .create_font(truetype(false).into(), "WinAnsiEncoding", Some(EmbeddingStrategy::ForceEmbedded))
            .unwrap_err();
        assert!(matches!(err, Error::EmbeddingNotAllowed { .. }));

        let font = factory
            .create_font(truetype(false).into(), "WinAnsiEncoding", Some(EmbeddingStrategy::PreferEmbedded))
            .unwrap()
            .unwrap();
        assert!(!font.is_embedded());

        let font = factory
            .create_font(truetype(true).into(), "WinAnsiEncoding", None)
            .unwrap()
            .unwrap();
        assert!(font.is_embedded());
        assert!(font.is_subset());
    }

    #[test]
    fn test_identity_strategies() {
        let factory = FontFactory::default();
        let err = factory
            .create_font(truetype(true).into(), "Identity-H", Some(EmbeddingStrategy::ForceNotEmbedded))
            .unwrap_err();
        assert!(matches!(err, Error::StrategyConflict { .. }));

        let err = factory
            .create_font(truetype(false).into(), "Identity-H", Some(EmbeddingStrategy::PreferNotEmbedded))
            .unwrap_err();
        assert!(matches!(err, Error::EmbeddingNotAllowed { .. }));

        let font = factory
            .create_font(truetype(true).into(), "Identity-V", Some(EmbeddingStrategy::PreferNotEmbedded))
            .unwrap()
            .unwrap();
        assert!(font.is_embedded());
        assert!(font.as_type0().map_or(false, |f| f.cmap().is_vertical()));
    }

    #[test]
    fn test_reconstruct_unknown_subtype() {
        let factory = FontFactory::default();
        let store = MemoryObjectStore::new();
        let mut dict = Dictionary::new();
        dict.insert("Type".to_string(), Object::name("Font"));
        dict.insert("Subtype".to_string(), Object::name("OpenType"));
        let err = factory.from_dictionary(&Object::Dictionary(dict), &store).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFontSubtype(s) if s == "OpenType"));

        let err = factory.from_dictionary(&Object::Integer(3), &store).unwrap_err();
        assert!(matches!(err, Error::InvalidObjectType { .. }));
    }

    #[test]
    fn test_reconstruct_standard_type1() {
        let factory = FontFactory::default();
        let mut store = MemoryObjectStore::new();
        let mut dict = Dictionary::new();
        dict.insert("Type".to_string(), Object::name("Font"));
        dict.insert("Subtype".to_string(), Object::name("Type1"));
        dict.insert("BaseFont".to_string(), Object::name("Helvetica"));
        let r = store.add(Object::Dictionary(dict));

        let mut font = factory.from_dictionary(&Object::Reference(r), &store).unwrap();
        assert_eq!(font.subtype(), "Type1");
        let decoded = font.decode(b"Hi");
        assert_eq!(decoded.to_unicode_string(), "Hi");
        assert_eq!(decoded.glyphs[0].width, 722);
        // flushing returns the original reference
        assert_eq!(font.flush(&mut store).unwrap(), r);
        assert_eq!(store.len(), 1);
    }
}
