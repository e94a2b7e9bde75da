//! Font programs rebuilt from an existing document.
//!
//! The glyph data of a font read from a PDF comes from its dictionary, not
//! from a font file: widths from `/Widths` or `/W`, text from the encoding
//! and `/ToUnicode`, metrics from `/FontDescriptor`. The embedded font file,
//! if any, is carried along untouched.

use super::{GlyphRepository, GlyphTable, Type1Program};
use crate::cmap::{CMapEncoding, CMapToUnicode, CharCode};
use crate::error::{Error, Result};
use crate::fonts::encoding::FontEncoding;
use crate::fonts::glyph::{utf16_of, Glyph};
use crate::fonts::metrics::{FontDescriptorFlags, FontMetrics, FontNames};
use crate::fonts::subset::strip_subset_tag;
use crate::fonts::widths::{parse_cid_widths, parse_simple_widths};
use crate::object::{Dictionary, Object, ObjectStore};

/// Which dictionary shape a program was rebuilt from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocFontKind {
    /// TrueType simple font
    Simple,
    /// Type 1 (or MMType1) simple font
    Type1,
    /// Type 0 font with a CID descendant
    Composite,
}

/// `/CIDSystemInfo` of a composite font.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CidSystemInfo {
    /// `/Registry`
    pub registry: String,
    /// `/Ordering`
    pub ordering: String,
    /// `/Supplement`
    pub supplement: i32,
}

/// A program rebuilt from a font dictionary.
#[derive(Debug, Clone)]
pub struct DocFontProgram {
    kind: DocFontKind,
    names: FontNames,
    metrics: FontMetrics,
    table: GlyphTable,
    font_file: Option<Object>,
    cff: bool,
    font_specific: bool,
    cid_system_info: Option<CidSystemInfo>,
    default_width: i32,
}

impl DocFontProgram {
    /// Rebuild the program of a simple TrueType or Type 1 font.
    ///
    /// A Type 1 font without `/FontDescriptor` must be one of the standard
    /// fonts; its metrics and missing widths then come from the built-in
    /// tables.
    pub fn simple(
        kind: DocFontKind,
        font: &Dictionary,
        encoding: &FontEncoding,
        to_unicode: Option<&CMapToUnicode>,
        store: &dyn ObjectStore,
    ) -> Result<Self> {
        let base_font = base_font_name(font, store);
        let mut names = FontNames::new(strip_subset_tag(&base_font));
        let descriptor = store.resolve_key(font, "FontDescriptor").and_then(|o| o.as_dict());

        let standard = match (kind, descriptor) {
            (DocFontKind::Type1, None) => Some(Type1Program::standard(&names.font_name).map_err(|_| {
                Error::missing(format!("Type1 font {}", base_font), "FontDescriptor")
            })?),
            _ => None,
        };

        let (metrics, font_file, cff) = match (descriptor, &standard) {
            (Some(desc), _) => read_descriptor(desc, store, &mut names),
            (None, Some(program)) => {
                names = program.font_names().clone();
                (program.metrics().clone(), None, false)
            },
            (None, None) => (FontMetrics::default(), None, false),
        };

        let first_char = store
            .resolve_key(font, "FirstChar")
            .and_then(|o| o.as_integer())
            .unwrap_or(0);
        let widths = store
            .resolve_key(font, "Widths")
            .and_then(|o| o.as_array())
            .map(|arr| parse_simple_widths(first_char, arr, store))
            .unwrap_or_default();

        let mut table = GlyphTable::new();
        for code in 0..=255u8 {
            let mapped = to_unicode.and_then(|cmap| cmap.lookup(code as u32)).map(|c| c.into_owned());
            let unicode = match &mapped {
                Some(chars) => first_scalar(chars),
                None => encoding.get_unicode(code),
            };
            let width = widths.get(&code).copied().or_else(|| {
                let program = standard.as_ref()?;
                let glyph = match unicode {
                    Some(u) if !program.is_font_specific() => program.glyph(u),
                    _ => program.glyph_for_byte(code),
                };
                glyph.map(|g| g.width)
            });
            if width.is_none() && unicode.is_none() && mapped.is_none() {
                continue;
            }
            let chars = mapped.or_else(|| unicode.and_then(utf16_of));
            let width = width.unwrap_or(metrics.missing_width);
            table.insert(Glyph::with_chars(code as i32, width, unicode, chars));
        }

        log::debug!("Rebuilt {:?} font {} with {} codes", kind, base_font, table.len());
        Ok(Self {
            kind,
            names,
            metrics,
            table,
            font_file,
            cff,
            font_specific: encoding.is_font_specific(),
            cid_system_info: None,
            default_width: 0,
        })
    }

    /// Rebuild the descendant program of a Type 0 font.
    pub fn composite(
        descendant: &Dictionary,
        cmap: &CMapEncoding,
        to_unicode: Option<&CMapToUnicode>,
        store: &dyn ObjectStore,
    ) -> Result<Self> {
        let base_font = base_font_name(descendant, store);
        let context = format!("CID font {}", base_font);

        let info = store
            .resolve_key(descendant, "CIDSystemInfo")
            .and_then(|o| o.as_dict())
            .ok_or_else(|| Error::missing(&context, "CIDSystemInfo"))?;
        let text_of = |key: &str| {
            store
                .resolve_key(info, key)
                .and_then(|o| o.as_string())
                .map(|s| String::from_utf8_lossy(s).into_owned())
        };
        let cid_system_info = CidSystemInfo {
            registry: text_of("Registry").unwrap_or_else(|| "Adobe".to_string()),
            ordering: text_of("Ordering").ok_or_else(|| Error::missing(&context, "Ordering"))?,
            supplement: store
                .resolve_key(info, "Supplement")
                .and_then(|o| o.as_integer())
                .unwrap_or(0) as i32,
        };

        let mut names = FontNames::new(strip_subset_tag(&base_font));
        let (metrics, font_file, cff_file) = match store
            .resolve_key(descendant, "FontDescriptor")
            .and_then(|o| o.as_dict())
        {
            Some(desc) => read_descriptor(desc, store, &mut names),
            None => (FontMetrics::default(), None, false),
        };
        let cff = cff_file
            || store.resolve_key(descendant, "Subtype").and_then(|o| o.as_name()) == Some("CIDFontType0");

        let default_width = store
            .resolve_key(descendant, "DW")
            .and_then(|o| o.as_number())
            .map_or(1000, |w| w as i32);
        let widths = store
            .resolve_key(descendant, "W")
            .and_then(|o| o.as_array())
            .map(|arr| parse_cid_widths(arr, store))
            .unwrap_or_default();

        let mut table = GlyphTable::new();
        if let Some(cmap_text) = to_unicode {
            for (code, chars) in cmap_text.iter() {
                let Some(cid) = cid_of_code(cmap, code) else {
                    continue;
                };
                if table.by_code(cid as i32).is_some() {
                    continue;
                }
                let width = widths.get(&cid).copied().unwrap_or(default_width);
                table.insert(Glyph::with_chars(
                    cid as i32,
                    width,
                    first_scalar(chars),
                    Some(chars.to_vec()),
                ));
            }
        }
        for (cid, width) in &widths {
            if table.by_code(*cid as i32).is_none() {
                table.insert(Glyph::new(*cid as i32, *width, None));
            }
        }
        if table.by_code(0).is_none() {
            table.insert(Glyph::new(0, default_width, None));
        }

        log::debug!(
            "Rebuilt CID font {} ({}-{}) with {} CIDs",
            base_font,
            cid_system_info.registry,
            cid_system_info.ordering,
            table.len()
        );
        Ok(Self {
            kind: DocFontKind::Composite,
            names,
            metrics,
            table,
            font_file,
            cff,
            font_specific: false,
            cid_system_info: Some(cid_system_info),
            default_width,
        })
    }

    /// Dictionary shape the program was rebuilt from.
    pub fn kind(&self) -> DocFontKind {
        self.kind
    }

    /// The `/FontFile*` entry of the descriptor, as found.
    pub fn font_file(&self) -> Option<&Object> {
        self.font_file.as_ref()
    }

    /// Whether outlines are CFF.
    pub fn is_cff(&self) -> bool {
        self.cff
    }

    /// `/CIDSystemInfo` of a composite font.
    pub fn cid_system_info(&self) -> Option<&CidSystemInfo> {
        self.cid_system_info.as_ref()
    }

    /// `/DW` of a composite font.
    pub fn default_width(&self) -> i32 {
        self.default_width
    }
}

fn base_font_name(font: &Dictionary, store: &dyn ObjectStore) -> String {
    store
        .resolve_key(font, "BaseFont")
        .and_then(|o| o.as_name())
        .unwrap_or("Unknown")
        .to_string()
}

fn first_scalar(chars: &[u16]) -> Option<u32> {
    char::decode_utf16(chars.iter().copied())
        .next()
        .and_then(|r| r.ok())
        .map(|c| c as u32)
}

/// CID selected by the code with value `code`; the code length is the
/// first one the CMap knows.
fn cid_of_code(cmap: &CMapEncoding, code: u32) -> Option<u32> {
    if cmap.is_direct() {
        return Some(code);
    }
    (1..=4u8).find_map(|len| cmap.cid_of(CharCode::new(code, len)))
}

/// Metrics, font file entry and CFF flag from a `/FontDescriptor`.
fn read_descriptor(
    desc: &Dictionary,
    store: &dyn ObjectStore,
    names: &mut FontNames,
) -> (FontMetrics, Option<Object>, bool) {
    let number = |key: &str| store.resolve_key(desc, key).and_then(|o| o.as_number());
    let defaults = FontMetrics::default();
    let flags = FontDescriptorFlags::from_bits_truncate(number("Flags").unwrap_or(0.0) as u32);

    let bbox = store
        .resolve_key(desc, "FontBBox")
        .and_then(|o| o.as_array())
        .and_then(|arr| {
            let values: Vec<i32> = arr
                .iter()
                .filter_map(|o| store.resolve(o).as_number())
                .map(|v| v as i32)
                .collect();
            <[i32; 4]>::try_from(values).ok()
        })
        .unwrap_or(defaults.bbox);

    let metrics = FontMetrics {
        ascent: number("Ascent").map_or(defaults.ascent, |v| v as i32),
        descent: number("Descent").map_or(defaults.descent, |v| v as i32),
        cap_height: number("CapHeight").map_or(defaults.cap_height, |v| v as i32),
        x_height: number("XHeight").map_or(0, |v| v as i32),
        italic_angle: number("ItalicAngle").unwrap_or(0.0) as f32,
        bbox,
        stem_v: number("StemV").map_or(defaults.stem_v, |v| v as i32),
        stem_h: number("StemH").map_or(0, |v| v as i32),
        fixed_pitch: flags.contains(FontDescriptorFlags::FIXED_PITCH),
        missing_width: number("MissingWidth").map_or(0, |v| v as i32),
    };

    names.serif = flags.contains(FontDescriptorFlags::SERIF);
    names.script = flags.contains(FontDescriptorFlags::SCRIPT);
    names.italic = flags.contains(FontDescriptorFlags::ITALIC) || metrics.italic_angle != 0.0;
    names.weight = match number("FontWeight") {
        Some(w) => w as u16,
        None if flags.contains(FontDescriptorFlags::FORCE_BOLD) => 700,
        None => 400,
    };
    names.family_name = store
        .resolve_key(desc, "FontFamily")
        .and_then(|o| o.as_string())
        .map(|s| String::from_utf8_lossy(s).into_owned());

    let (font_file, cff) = ["FontFile", "FontFile2", "FontFile3"]
        .iter()
        .find_map(|key| desc.get(*key).map(|obj| (obj.clone(), *key == "FontFile3")))
        .map_or((None, false), |(obj, cff)| (Some(obj), cff));

    (metrics, font_file, cff)
}

impl GlyphRepository for DocFontProgram {
    fn font_names(&self) -> &FontNames {
        &self.names
    }

    fn metrics(&self) -> &FontMetrics {
        &self.metrics
    }

    fn glyph(&self, unicode: u32) -> Option<&Glyph> {
        self.table.by_unicode(unicode)
    }

    fn glyph_by_code(&self, code: i32) -> Option<&Glyph> {
        self.table.by_code(code)
    }

    fn is_font_specific(&self) -> bool {
        self.font_specific
    }

    fn count_of_glyphs(&self) -> usize {
        self.table.len()
    }
}
