//! Predefined CJK fonts.
//!
//! These fonts are never embedded: the viewer supplies them. Their glyphs
//! are the CIDs of one Adobe character collection, keyed by Unicode through
//! the collection's UCS-2 CMap.

use super::{GlyphRepository, GlyphTable};
use crate::cmap::{CMapCache, CMapEncoding};
use crate::error::{Error, Result};
use crate::fonts::glyph::Glyph;
use crate::fonts::metrics::{FontMetrics, FontNames};
use phf::phf_map;

/// Registry entry of a predefined CID font.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredefinedCidFont {
    /// PostScript name
    pub name: &'static str,
    /// Character collection registry
    pub registry: &'static str,
    /// Character collection ordering
    pub ordering: &'static str,
    /// Character collection supplement
    pub supplement: i32,
    /// Unicode-keyed CMap that lists the collection's CIDs
    pub ucs2_cmap: &'static str,
    /// CMaps the font can be used with
    pub cmaps: &'static [&'static str],
    /// Ascent, descent, cap height, stem v
    pub vertical: (i32, i32, i32, i32),
    /// Font bounding box
    pub bbox: [i32; 4],
    /// Serif design
    pub serif: bool,
}

const GB1_CMAPS: &[&str] = &[
    "UniGB-UCS2-H",
    "UniGB-UCS2-V",
    "UniGB-UTF16-H",
    "UniGB-UTF16-V",
    "GBK-EUC-H",
    "GBK-EUC-V",
];

const CNS1_CMAPS: &[&str] = &[
    "UniCNS-UCS2-H",
    "UniCNS-UCS2-V",
    "UniCNS-UTF16-H",
    "UniCNS-UTF16-V",
    "ETen-B5-H",
    "ETen-B5-V",
];

const JAPAN1_CMAPS: &[&str] = &[
    "UniJIS-UCS2-H",
    "UniJIS-UCS2-V",
    "UniJIS-UCS2-HW-H",
    "UniJIS-UCS2-HW-V",
    "UniJIS-UTF16-H",
    "UniJIS-UTF16-V",
    "90ms-RKSJ-H",
    "90ms-RKSJ-V",
    "EUC-H",
    "EUC-V",
];

const KOREA1_CMAPS: &[&str] = &[
    "UniKS-UCS2-H",
    "UniKS-UCS2-V",
    "UniKS-UTF16-H",
    "UniKS-UTF16-V",
    "KSCms-UHC-H",
    "KSCms-UHC-V",
];

/// The predefined CJK fonts by name.
pub static PREDEFINED_CID_FONTS: phf::Map<&'static str, PredefinedCidFont> = phf_map! {
    "STSong-Light" => PredefinedCidFont {
        name: "STSong-Light",
        registry: "Adobe",
        ordering: "GB1",
        supplement: 4,
        ucs2_cmap: "UniGB-UCS2-H",
        cmaps: GB1_CMAPS,
        vertical: (880, -120, 880, 93),
        bbox: [-25, -254, 1000, 880],
        serif: true,
    },
    "MSung-Light" => PredefinedCidFont {
        name: "MSung-Light",
        registry: "Adobe",
        ordering: "CNS1",
        supplement: 3,
        ucs2_cmap: "UniCNS-UCS2-H",
        cmaps: CNS1_CMAPS,
        vertical: (880, -120, 880, 93),
        bbox: [-160, -259, 1015, 888],
        serif: true,
    },
    "HeiseiMin-W3" => PredefinedCidFont {
        name: "HeiseiMin-W3",
        registry: "Adobe",
        ordering: "Japan1",
        supplement: 2,
        ucs2_cmap: "UniJIS-UCS2-H",
        cmaps: JAPAN1_CMAPS,
        vertical: (857, -143, 857, 91),
        bbox: [-123, -257, 1001, 910],
        serif: true,
    },
    "HeiseiKakuGo-W5" => PredefinedCidFont {
        name: "HeiseiKakuGo-W5",
        registry: "Adobe",
        ordering: "Japan1",
        supplement: 2,
        ucs2_cmap: "UniJIS-UCS2-H",
        cmaps: JAPAN1_CMAPS,
        vertical: (857, -125, 857, 114),
        bbox: [-92, -250, 1010, 922],
        serif: false,
    },
    "KozMinPro-Regular" => PredefinedCidFont {
        name: "KozMinPro-Regular",
        registry: "Adobe",
        ordering: "Japan1",
        supplement: 4,
        ucs2_cmap: "UniJIS-UCS2-H",
        cmaps: JAPAN1_CMAPS,
        vertical: (880, -120, 740, 86),
        bbox: [-195, -272, 1110, 1075],
        serif: true,
    },
    "HYGoThic-Medium" => PredefinedCidFont {
        name: "HYGoThic-Medium",
        registry: "Adobe",
        ordering: "Korea1",
        supplement: 1,
        ucs2_cmap: "UniKS-UCS2-H",
        cmaps: KOREA1_CMAPS,
        vertical: (880, -120, 880, 93),
        bbox: [-6, -145, 1003, 880],
        serif: false,
    },
    "HYSMyeongJo-Medium" => PredefinedCidFont {
        name: "HYSMyeongJo-Medium",
        registry: "Adobe",
        ordering: "Korea1",
        supplement: 1,
        ucs2_cmap: "UniKS-UCS2-H",
        cmaps: KOREA1_CMAPS,
        vertical: (880, -120, 880, 93),
        bbox: [0, -148, 1001, 880],
        serif: true,
    },
};

impl PredefinedCidFont {
    /// Registry entry for `name`.
    pub fn lookup(name: &str) -> Option<&'static PredefinedCidFont> {
        PREDEFINED_CID_FONTS.get(name)
    }

    /// Whether the font can be used with `cmap`.
    ///
    /// Identity CMaps always work: the codes written are the CIDs.
    pub fn is_compatible_with(&self, cmap: &str) -> bool {
        CMapEncoding::is_identity_name(cmap) || self.cmaps.contains(&cmap)
    }

    /// `Registry-Ordering-Supplement`, e.g. `Adobe-GB1-4`.
    pub fn collection(&self) -> String {
        format!("{}-{}-{}", self.registry, self.ordering, self.supplement)
    }
}

/// Advance of a CID glyph: proportional Latin is half-width.
fn cid_width(unicode: u32) -> i32 {
    if (0x20..=0x7E).contains(&unicode) {
        500
    } else {
        1000
    }
}

/// A predefined CJK font program.
#[derive(Debug, Clone)]
pub struct CidFontProgram {
    font: &'static PredefinedCidFont,
    names: FontNames,
    metrics: FontMetrics,
    table: GlyphTable,
}

impl CidFontProgram {
    /// Load `name`; its glyphs come from the UCS-2 CMap held by `cache`.
    pub fn new(name: &str, cache: &CMapCache) -> Result<Self> {
        let font = PredefinedCidFont::lookup(name)
            .ok_or_else(|| Error::FontProgram(format!("{} is not a predefined CJK font", name)))?;
        let data = cache.cmap(font.ucs2_cmap)?;
        let glyphs = data
            .cids
            .iter()
            .map(|(code, cid)| Glyph::new(*cid as i32, cid_width(code.value), Some(code.value)));
        let program = Self::from_parts(font, glyphs);
        log::debug!("Loaded {} with {} CIDs", name, program.table.len());
        Ok(program)
    }

    /// Program for `font` with the given glyphs.
    ///
    /// When several Unicode values select one CID, the first becomes the
    /// glyph's text and the others are aliases.
    pub fn from_parts(font: &'static PredefinedCidFont, glyphs: impl IntoIterator<Item = Glyph>) -> Self {
        let (ascent, descent, cap_height, stem_v) = font.vertical;
        let metrics = FontMetrics {
            ascent,
            descent,
            cap_height,
            x_height: 0,
            italic_angle: 0.0,
            bbox: font.bbox,
            stem_v,
            stem_h: 0,
            fixed_pitch: false,
            missing_width: 0,
        };
        let mut names = FontNames::new(font.name);
        names.serif = font.serif;
        names.allow_embedding = false;

        let mut table = GlyphTable::new();
        for glyph in glyphs {
            match (table.by_code(glyph.code).is_some(), glyph.unicode) {
                (true, Some(unicode)) => table.alias(unicode, glyph.code),
                (true, None) => {},
                (false, _) => table.insert(glyph),
            }
        }
        if table.by_code(0).is_none() {
            table.insert(Glyph::new(0, 1000, None));
        }

        Self {
            font,
            names,
            metrics,
            table,
        }
    }

    /// Registry entry.
    pub fn predefined(&self) -> &'static PredefinedCidFont {
        self.font
    }

    /// Whether the font can be used with `cmap`.
    pub fn is_compatible_with(&self, cmap: &str) -> bool {
        self.font.is_compatible_with(cmap)
    }
}

impl GlyphRepository for CidFontProgram {
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
        self.table.len()
    }
}
