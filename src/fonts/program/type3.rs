//! Type 3 glyph procedures.
//!
//! A Type 3 font has no outline program. Every glyph is a content stream
//! that starts with `wx 0 d0` (colored glyph, paints with its own colors)
//! or `wx 0 llx lly urx ury d1` (uncolored glyph, paints with the current
//! color and declares its bounding box).

use super::{GlyphRepository, GlyphTable};
use crate::error::Result;
use crate::fonts::glyph::Glyph;
use crate::fonts::metrics::{FontMetrics, FontNames};
use crate::writer::{content_stream::write_op, ContentStreamBuilder, ContentStreamOp};
use bytes::Bytes;
use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::bytes::Regex;

lazy_static! {
    /// `wx wy d0` at the start of a glyph procedure.
    static ref D0: Regex = Regex::new(r"^\s*([-+]?[0-9.]+)\s+([-+]?[0-9.]+)\s+d0\b").unwrap();
    /// `wx wy llx lly urx ury d1` at the start of a glyph procedure.
    static ref D1: Regex = Regex::new(
        r"^\s*([-+]?[0-9.]+)\s+([-+]?[0-9.]+)\s+([-+]?[0-9.]+)\s+([-+]?[0-9.]+)\s+([-+]?[0-9.]+)\s+([-+]?[0-9.]+)\s+d1\b"
    )
    .unwrap();
}

/// Default Type 3 font matrix: 1000 glyph units per text space unit.
pub const DEFAULT_FONT_MATRIX: [f64; 6] = [0.001, 0.0, 0.0, 0.001, 0.0, 0.0];

/// One glyph procedure.
#[derive(Debug, Clone, PartialEq)]
pub struct Type3Glyph {
    width: i32,
    bbox: [i32; 4],
    colorized: bool,
    /// Procedure read from a document, header included
    recorded: Option<Bytes>,
    content: ContentStreamBuilder,
}

impl Type3Glyph {
    /// Empty procedure with a `d0` (colorized) or `d1` header.
    pub fn new(width: i32, bbox: [i32; 4], colorized: bool) -> Self {
        Self {
            width,
            bbox: if colorized { [0; 4] } else { bbox },
            colorized,
            recorded: None,
            content: ContentStreamBuilder::new(),
        }
    }

    /// Procedure read from a `/CharProcs` stream.
    ///
    /// Width, bounding box and color mode come from the leading `d0`/`d1`
    /// operator; without one the glyph counts as colorized with width 0.
    pub fn from_procedure(data: impl Into<Bytes>) -> Self {
        let data: Bytes = data.into();
        let number = |m: Option<regex::bytes::Match<'_>>| {
            m.and_then(|m| std::str::from_utf8(m.as_bytes()).ok())
                .and_then(|s| s.parse::<f64>().ok())
                .map_or(0, |v| v.round() as i32)
        };
        let (width, bbox, colorized) = if let Some(caps) = D1.captures(&data) {
            let bbox = [
                number(caps.get(3)),
                number(caps.get(4)),
                number(caps.get(5)),
                number(caps.get(6)),
            ];
            (number(caps.get(1)), bbox, false)
        } else if let Some(caps) = D0.captures(&data) {
            (number(caps.get(1)), [0; 4], true)
        } else {
            log::warn!("Type 3 glyph procedure has no d0/d1 operator");
            (0, [0; 4], true)
        };
        Self {
            width,
            bbox,
            colorized,
            recorded: Some(data),
            content: ContentStreamBuilder::new(),
        }
    }

    /// Advance width in glyph space.
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Override the advance width (from a `/Widths` entry).
    pub(crate) fn set_width(&mut self, width: i32) {
        self.width = width;
    }

    /// Bounding box; zero for colorized glyphs.
    pub fn bbox(&self) -> [i32; 4] {
        self.bbox
    }

    /// Whether the header is `d0`.
    pub fn is_colorized(&self) -> bool {
        self.colorized
    }

    /// Drawing operators following the header.
    pub fn content(&mut self) -> &mut ContentStreamBuilder {
        &mut self.content
    }

    fn header(&self) -> ContentStreamOp {
        let w = self.width as f32;
        if self.colorized {
            ContentStreamOp::GlyphWidth(w, 0.0)
        } else {
            let [llx, lly, urx, ury] = self.bbox.map(|v| v as f32);
            ContentStreamOp::GlyphWidthBBox(w, 0.0, llx, lly, urx, ury)
        }
    }

    /// The procedure bytes: header, then the drawing operators.
    pub fn content_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        match &self.recorded {
            Some(data) => {
                out.extend_from_slice(data);
                if !data.ends_with(b"\n") && !self.content.is_empty() {
                    out.push(b'\n');
                }
            },
            None => {
                write_op(&mut out, &self.header())?;
                out.push(b'\n');
            },
        }
        self.content.write_to(&mut out)?;
        Ok(out)
    }
}

/// The glyphs of a Type 3 font, by byte code in registration order.
#[derive(Debug, Clone)]
pub struct Type3Program {
    names: FontNames,
    metrics: FontMetrics,
    colorized: bool,
    font_matrix: [f64; 6],
    procedures: IndexMap<u8, Type3Glyph>,
    table: GlyphTable,
}

impl Type3Program {
    /// Empty program. `colorized` selects `d0` headers for new glyphs.
    pub fn new(name: impl Into<String>, colorized: bool) -> Self {
        Self {
            names: FontNames::new(name),
            metrics: FontMetrics {
                ascent: 0,
                descent: 0,
                cap_height: 0,
                bbox: [0; 4],
                stem_v: 0,
                ..FontMetrics::default()
            },
            colorized,
            font_matrix: DEFAULT_FONT_MATRIX,
            procedures: IndexMap::new(),
            table: GlyphTable::new(),
        }
    }

    /// Whether new glyphs get `d0` headers.
    pub fn is_colorized(&self) -> bool {
        self.colorized
    }

    /// `/FontMatrix`.
    pub fn font_matrix(&self) -> [f64; 6] {
        self.font_matrix
    }

    /// Replace the font matrix (read back from a document).
    pub fn set_font_matrix(&mut self, matrix: [f64; 6]) {
        self.font_matrix = matrix;
    }

    /// Register a procedure at `code`.
    ///
    /// The glyph width is kept in 1000-unit text space, converted through
    /// the font matrix.
    pub fn insert(&mut self, code: u8, unicode: Option<u32>, procedure: Type3Glyph) -> &mut Type3Glyph {
        let scale = self.font_matrix[0] * 1000.0;
        let width = (procedure.width() as f64 * scale).round() as i32;
        let mut glyph = Glyph::new(code as i32, width, unicode);
        if !procedure.is_colorized() {
            glyph = glyph.with_bbox(procedure.bbox());
        }
        self.table.insert(glyph);
        self.procedures.insert(code, procedure);
        self.update_bbox();
        // present: inserted above
        &mut self.procedures[&code]
    }

    /// Procedure at `code`.
    pub fn procedure(&self, code: u8) -> Option<&Type3Glyph> {
        self.procedures.get(&code)
    }

    /// Mutable procedure at `code`.
    pub fn procedure_mut(&mut self, code: u8) -> Option<&mut Type3Glyph> {
        self.procedures.get_mut(&code)
    }

    /// Procedures in registration order.
    pub fn procedures(&self) -> impl Iterator<Item = (u8, &Type3Glyph)> {
        self.procedures.iter().map(|(code, proc)| (*code, proc))
    }

    /// Whether `code` holds a procedure.
    pub fn contains_code(&self, code: u8) -> bool {
        self.procedures.contains_key(&code)
    }

    /// Union of the bounding boxes of all uncolored glyphs.
    pub fn font_bbox(&self) -> [i32; 4] {
        self.metrics.bbox
    }

    fn update_bbox(&mut self) {
        let mut boxes = self
            .procedures
            .values()
            .filter(|p| !p.is_colorized())
            .map(|p| p.bbox());
        self.metrics.bbox = match boxes.next() {
            Some(first) => boxes.fold(first, |[a, b, c, d], [e, f, g, h]| {
                [a.min(e), b.min(f), c.max(g), d.max(h)]
            }),
            None => [0; 4],
        };
    }
}

impl GlyphRepository for Type3Program {
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
        false
    }

    fn count_of_glyphs(&self) -> usize {
        self.procedures.len()
    }
}
