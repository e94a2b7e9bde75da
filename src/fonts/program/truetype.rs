//! TrueType / OpenType font programs.
//!
//! Wraps the `ttf-parser` crate to read the data a PDF font needs: the
//! Unicode (or symbol) cmap, advance widths, vertical metrics, embedding
//! permissions and whether outlines are CFF.

use super::{GlyphRepository, GlyphTable};
use crate::error::{Error, Result};
use crate::fonts::glyph::Glyph;
use crate::fonts::metrics::{FontMetrics, FontNames};
use byteorder::{BigEndian, ByteOrder};
use bytes::Bytes;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use ttf_parser::{Face, GlyphId, PlatformId, Tag};

/// Reduces a font program to the glyphs a document uses.
///
/// Implementations receive the complete program and the used glyph ids;
/// `do_subset` is false when the caller wants the full program.
pub trait GlyphSubsetter: fmt::Debug + Send + Sync {
    /// Produce the program bytes to embed.
    fn subset(&self, program: &[u8], used_glyphs: &BTreeSet<i32>, do_subset: bool) -> Result<Vec<u8>>;
}

/// Subsetter that always returns the whole program.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassThroughSubsetter;

impl GlyphSubsetter for PassThroughSubsetter {
    fn subset(&self, program: &[u8], _used_glyphs: &BTreeSet<i32>, _do_subset: bool) -> Result<Vec<u8>> {
        Ok(program.to_vec())
    }
}

/// OS/2 fsType value for "restricted license embedding".
const FS_TYPE_RESTRICTED: u16 = 0x0002;

/// A TrueType or OpenType program.
///
/// Glyph codes are glyph ids. Symbolic fonts (only a (3,0) cmap) are
/// font-specific: their glyphs are keyed by the low byte of the symbol
/// cmap code.
#[derive(Debug, Clone)]
pub struct TrueTypeProgram {
    names: FontNames,
    metrics: FontMetrics,
    table: GlyphTable,
    data: Option<Bytes>,
    cff: bool,
    font_specific: bool,
    subsetter: Arc<dyn GlyphSubsetter>,
}

impl TrueTypeProgram {
    /// Parse a TrueType/OpenType file.
    pub fn from_bytes(data: impl Into<Bytes>) -> Result<Self> {
        let data: Bytes = data.into();
        if data.is_empty() {
            return Err(Error::FontProgram("font file is empty".to_string()));
        }
        let face = Face::parse(&data, 0).map_err(|e| Error::FontProgram(e.to_string()))?;
        let upem = face.units_per_em();

        let name_of = |id: u16| {
            face.names()
                .into_iter()
                .find(|name| name.name_id == id)
                .and_then(|name| name.to_string())
        };
        let mut names = FontNames::new(
            name_of(ttf_parser::name_id::POST_SCRIPT_NAME).unwrap_or_else(|| "Unknown".to_string()),
        );
        names.family_name = name_of(ttf_parser::name_id::FAMILY);
        names.weight = face.weight().to_number();
        names.italic = face.is_italic();
        names.allow_embedding = raw_table(&face, b"OS/2")
            .filter(|t| t.len() >= 10)
            .map_or(true, |t| BigEndian::read_u16(&t[8..10]) & 0x000F != FS_TYPE_RESTRICTED);

        let bbox = face.global_bounding_box();
        let ascender = face.ascender() as i32;
        let metrics = FontMetrics {
            ascent: FontMetrics::scale(ascender, upem),
            descent: FontMetrics::scale(face.descender() as i32, upem),
            cap_height: FontMetrics::scale(
                face.capital_height().map_or(ascender, |h| h as i32),
                upem,
            ),
            x_height: face.x_height().map_or(0, |h| FontMetrics::scale(h as i32, upem)),
            italic_angle: italic_angle(&face),
            bbox: [
                FontMetrics::scale(bbox.x_min as i32, upem),
                FontMetrics::scale(bbox.y_min as i32, upem),
                FontMetrics::scale(bbox.x_max as i32, upem),
                FontMetrics::scale(bbox.y_max as i32, upem),
            ],
            stem_v: if face.is_bold() { 140 } else { 80 },
            stem_h: 0,
            fixed_pitch: face.is_monospaced(),
            missing_width: 0,
        };

        let width_of = |gid: u16| {
            FontMetrics::scale(face.glyph_hor_advance(GlyphId(gid)).unwrap_or(0) as i32, upem)
        };

        let mut unicode_glyphs = Vec::new();
        let mut symbol_glyphs = Vec::new();
        if let Some(cmap) = face.tables().cmap {
            for subtable in cmap.subtables {
                let symbol = subtable.platform_id == PlatformId::Windows && subtable.encoding_id == 0;
                if !symbol && !subtable.is_unicode() {
                    continue;
                }
                let mut codepoints = Vec::new();
                subtable.codepoints(|cp| codepoints.push(cp));
                for cp in codepoints {
                    if let Some(gid) = subtable.glyph_index(cp) {
                        if symbol {
                            symbol_glyphs.push((cp, gid.0));
                        } else {
                            unicode_glyphs.push((cp, gid.0));
                        }
                    }
                }
            }
        }

        let font_specific = unicode_glyphs.is_empty() && !symbol_glyphs.is_empty();
        let mut table = GlyphTable::new();
        table.insert(Glyph::new(0, width_of(0), None));
        if font_specific {
            for (cp, gid) in symbol_glyphs {
                let code = match cp {
                    0xF000..=0xF0FF => cp & 0xFF,
                    0..=0xFF => cp,
                    _ => continue,
                };
                insert_or_alias(&mut table, gid, width_of(gid), code);
            }
        } else {
            for (cp, gid) in unicode_glyphs {
                insert_or_alias(&mut table, gid, width_of(gid), cp);
            }
        }

        let cff = raw_table(&face, b"CFF ").is_some() || raw_table(&face, b"CFF2").is_some();
        log::debug!(
            "Loaded {} ({} glyphs mapped, cff={}, symbolic={})",
            names.font_name,
            table.len(),
            cff,
            font_specific
        );

        Ok(Self {
            names,
            metrics,
            table,
            data: Some(data.clone()),
            cff,
            font_specific,
            subsetter: Arc::new(PassThroughSubsetter),
        })
    }

    /// Read and parse a font file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_bytes(data)
    }

    /// Program assembled from already known parts, without program bytes.
    pub fn from_parts(
        names: FontNames,
        metrics: FontMetrics,
        glyphs: impl IntoIterator<Item = Glyph>,
        font_specific: bool,
    ) -> Self {
        let mut table = GlyphTable::new();
        for glyph in glyphs {
            table.insert(glyph);
        }
        Self {
            names,
            metrics,
            table,
            data: None,
            cff: false,
            font_specific,
            subsetter: Arc::new(PassThroughSubsetter),
        }
    }

    /// Attach program bytes for embedding.
    pub fn with_data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Mark the outlines as CFF.
    pub fn with_cff(mut self, cff: bool) -> Self {
        self.cff = cff;
        self
    }

    /// Replace the subsetter.
    pub fn with_subsetter(mut self, subsetter: Arc<dyn GlyphSubsetter>) -> Self {
        self.subsetter = subsetter;
        self
    }

    /// Program bytes, if known.
    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    /// Whether outlines are CFF (OpenType `CFF ` table).
    pub fn is_cff(&self) -> bool {
        self.cff
    }

    /// Whether licensing permits embedding.
    pub fn allows_embedding(&self) -> bool {
        self.names.allow_embedding
    }

    /// All glyphs in glyph-id order.
    pub fn glyphs(&self) -> impl Iterator<Item = &Glyph> {
        self.table.iter()
    }

    /// Program bytes to embed for `used_glyphs`.
    pub fn subset_program(&self, used_glyphs: &BTreeSet<i32>, do_subset: bool) -> Result<Option<Vec<u8>>> {
        match &self.data {
            Some(data) => Ok(Some(self.subsetter.subset(data, used_glyphs, do_subset)?)),
            None => Ok(None),
        }
    }
}

fn raw_table<'a>(face: &Face<'a>, tag: &[u8; 4]) -> Option<&'a [u8]> {
    face.raw_face().table(Tag::from_bytes(tag))
}

/// `post.italicAngle`, a 16.16 fixed-point number.
fn italic_angle(face: &Face<'_>) -> f32 {
    raw_table(face, b"post")
        .filter(|t| t.len() >= 8)
        .map_or(0.0, |t| BigEndian::read_i32(&t[4..8]) as f32 / 65536.0)
}

fn insert_or_alias(table: &mut GlyphTable, gid: u16, width: i32, unicode: u32) {
    let code = gid as i32;
    match table.by_code_mut(code) {
        Some(existing) if existing.unicode.is_some() => table.alias(unicode, code),
        Some(existing) => {
            *existing = Glyph::new(code, width, Some(unicode));
            table.alias(unicode, code);
        },
        None => table.insert(Glyph::new(code, width, Some(unicode))),
    }
}

impl GlyphRepository for TrueTypeProgram {
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

    fn glyph_for_byte(&self, code: u8) -> Option<&Glyph> {
        if self.font_specific {
            self.table.by_unicode(code as u32)
        } else {
            self.table.by_code(code as i32)
        }
    }

    fn is_font_specific(&self) -> bool {
        self.font_specific
    }

    fn count_of_glyphs(&self) -> usize {
        self.table.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TrueTypeProgram {
        TrueTypeProgram::from_parts(
            FontNames::new("SampleSans"),
            FontMetrics::default(),
            vec![
                Glyph::new(0, 500, None),
                Glyph::new(36, 667, Some('A' as u32)),
                Glyph::new(37, 667, Some('B' as u32)),
            ],
            false,
        )
    }

    #[test]
    fn test_error_on_empty_data() {
        assert!(matches!(TrueTypeProgram::from_bytes(Vec::new()), Err(Error::FontProgram(_))));
    }

    #[test]
    fn test_error_on_invalid_data() {
        let err = TrueTypeProgram::from_bytes(&b"not a font file"[..]).unwrap_err();
        assert!(matches!(err, Error::FontProgram(_)));
    }

    #[test]
    fn test_from_parts_lookup() {
        let program = sample();
        assert_eq!(program.glyph('A' as u32).map(|g| g.code), Some(36));
        assert_eq!(program.glyph_by_code(37).and_then(|g| g.unicode), Some('B' as u32));
        assert_eq!(program.notdef().map(|g| g.width), Some(500));
        assert!(program.data().is_none());
        assert!(!program.is_cff());
    }

    #[test]
    fn test_symbolic_byte_lookup() {
        let program = TrueTypeProgram::from_parts(
            FontNames::new("Wingish"),
            FontMetrics::default(),
            vec![Glyph::new(0, 0, None), Glyph::new(7, 890, Some(0x41))],
            true,
        );
        assert_eq!(program.glyph_for_byte(0x41).map(|g| g.code), Some(7));
        assert!(program.is_font_specific());
    }

    #[test]
    fn test_pass_through_subsetter() {
        let program = sample().with_data(vec![1u8, 2, 3]);
        let used: BTreeSet<i32> = [36].into_iter().collect();
        assert_eq!(program.subset_program(&used, true).unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(sample().subset_program(&used, true).unwrap(), None);
    }

    #[test]
    fn test_custom_subsetter() {
        #[derive(Debug)]
        struct KeepCount;
        impl GlyphSubsetter for KeepCount {
            fn subset(&self, _: &[u8], used: &BTreeSet<i32>, do_subset: bool) -> Result<Vec<u8>> {
                Ok(vec![used.len() as u8, do_subset as u8])
            }
        }
        let program = sample().with_data(vec![0u8; 8]).with_subsetter(Arc::new(KeepCount));
        let used: BTreeSet<i32> = [0, 36, 37].into_iter().collect();
        assert_eq!(program.subset_program(&used, false).unwrap(), Some(vec![3, 0]));
    }

    #[test]
    fn test_system_font_if_available() {
        let path = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";
        let Ok(program) = TrueTypeProgram::from_file(path) else {
            return;
        };
        assert_eq!(program.font_names().font_name, "DejaVuSans");
        assert!(!program.is_font_specific());
        assert!(program.glyph('A' as u32).is_some());
        assert!(program.metrics().ascent > 0);
        assert!(program.data().is_some());
    }
}
