//! Type 1 font programs.
//!
//! Covers the 14 standard fonts, whose metrics are built in, and custom
//! Type 1 programs assembled from known metrics plus optional program
//! bytes. Glyph codes follow StandardEncoding; characters outside it get
//! codes from 256 up.

use super::{GlyphRepository, GlyphTable};
use crate::error::{Error, Result};
use crate::fonts::encoding_tables::BaseEncoding;
use crate::fonts::glyph::Glyph;
use crate::fonts::metrics::{FontMetrics, FontNames};
use bytes::Bytes;

/// Names of the 14 standard Type 1 fonts.
pub const STANDARD_FONTS: [&str; 14] = [
    "Courier",
    "Courier-Bold",
    "Courier-BoldOblique",
    "Courier-Oblique",
    "Helvetica",
    "Helvetica-Bold",
    "Helvetica-BoldOblique",
    "Helvetica-Oblique",
    "Symbol",
    "Times-Bold",
    "Times-BoldItalic",
    "Times-Italic",
    "Times-Roman",
    "ZapfDingbats",
];

/// First synthetic code for characters outside StandardEncoding.
const EXTRA_CODE_START: i32 = 256;

/// Widths of U+0020..=U+007E (AFM values).
type AsciiWidths = [u16; 95];

#[rustfmt::skip]
const HELVETICA: AsciiWidths = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: AsciiWidths = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

#[rustfmt::skip]
const TIMES_ROMAN: AsciiWidths = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444,
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500,
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500,
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];

#[rustfmt::skip]
const TIMES_BOLD: AsciiWidths = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    930, 722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778,
    611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667, 333, 278, 333, 581, 500,
    333, 500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833, 556, 500,
    556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520,
];

#[rustfmt::skip]
const TIMES_ITALIC: AsciiWidths = [
    250, 333, 420, 500, 500, 833, 778, 214, 333, 333, 500, 675, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 675, 675, 675, 500,
    920, 611, 611, 667, 722, 611, 611, 722, 722, 333, 444, 667, 556, 833, 667, 722,
    611, 722, 611, 500, 556, 722, 611, 833, 611, 556, 556, 389, 278, 389, 422, 500,
    333, 500, 500, 444, 500, 444, 278, 500, 500, 278, 278, 444, 278, 722, 500, 500,
    500, 500, 389, 389, 278, 500, 444, 667, 444, 444, 389, 400, 275, 400, 541,
];

#[rustfmt::skip]
const TIMES_BOLD_ITALIC: AsciiWidths = [
    250, 389, 555, 500, 500, 833, 778, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    832, 667, 667, 667, 722, 667, 667, 722, 778, 389, 500, 667, 611, 889, 722, 722,
    611, 722, 667, 556, 611, 722, 667, 889, 667, 611, 611, 333, 278, 333, 570, 500,
    333, 500, 500, 444, 500, 444, 333, 500, 556, 278, 278, 500, 278, 778, 556, 500,
    500, 500, 389, 389, 278, 556, 444, 667, 500, 444, 389, 348, 220, 348, 570,
];

/// Width model of a standard font.
#[derive(Debug, Clone, Copy)]
enum StandardWidths {
    Proportional(&'static AsciiWidths),
    Monospace(i32),
    Symbolic,
}

impl StandardWidths {
    fn width(&self, unicode: u32) -> i32 {
        match self {
            StandardWidths::Monospace(w) => *w,
            StandardWidths::Symbolic => 500,
            StandardWidths::Proportional(table) => {
                let u = base_letter(unicode);
                match u {
                    0x20..=0x7E => table[(u - 0x20) as usize] as i32,
                    0xA0 => table[0] as i32,
                    0x2013 => table[(b'-' - 0x20) as usize] as i32 * 5 / 3,
                    0x2014 | 0x2030 | 0x2122 => 1000,
                    _ => 500,
                }
            },
        }
    }
}

/// Base letter of a Latin-1 accented letter, or the input.
fn base_letter(unicode: u32) -> u32 {
    let base = match unicode {
        0xC0..=0xC5 => 'A',
        0xC7 => 'C',
        0xC8..=0xCB => 'E',
        0xCC..=0xCF => 'I',
        0xD1 => 'N',
        0xD2..=0xD6 | 0xD8 => 'O',
        0xD9..=0xDC => 'U',
        0xDD => 'Y',
        0xE0..=0xE5 => 'a',
        0xE7 => 'c',
        0xE8..=0xEB => 'e',
        0xEC..=0xEF => 'i',
        0xF1 => 'n',
        0xF2..=0xF6 | 0xF8 => 'o',
        0xF9..=0xFC => 'u',
        0xFD | 0xFF => 'y',
        0x160 => 'S',
        0x161 => 's',
        0x17D => 'Z',
        0x17E => 'z',
        0x178 => 'Y',
        _ => return unicode,
    };
    base as u32
}

/// (ascent, descent, cap height, x-height, italic angle, stem v, bbox)
type StandardMetrics = (i32, i32, i32, i32, f32, i32, [i32; 4]);

fn standard_metrics(name: &str) -> StandardMetrics {
    match name {
        "Helvetica" => (718, -207, 718, 523, 0.0, 88, [-166, -225, 1000, 931]),
        "Helvetica-Oblique" => (718, -207, 718, 523, -12.0, 88, [-170, -225, 1116, 931]),
        "Helvetica-Bold" => (718, -207, 718, 532, 0.0, 140, [-170, -228, 1003, 962]),
        "Helvetica-BoldOblique" => (718, -207, 718, 532, -12.0, 140, [-174, -228, 1114, 962]),
        "Times-Roman" => (683, -217, 662, 450, 0.0, 84, [-168, -218, 1000, 898]),
        "Times-Italic" => (683, -217, 653, 441, -15.5, 76, [-169, -217, 1010, 883]),
        "Times-Bold" => (683, -217, 676, 461, 0.0, 139, [-168, -218, 1000, 935]),
        "Times-BoldItalic" => (683, -217, 669, 462, -15.0, 121, [-200, -218, 996, 921]),
        "Courier" => (629, -157, 562, 426, 0.0, 51, [-23, -250, 715, 805]),
        "Courier-Oblique" => (629, -157, 562, 426, -12.0, 51, [-27, -250, 849, 805]),
        "Courier-Bold" => (629, -157, 562, 439, 0.0, 106, [-113, -250, 749, 801]),
        "Courier-BoldOblique" => (629, -157, 562, 439, -12.0, 106, [-57, -250, 869, 801]),
        "Symbol" => (1010, -293, 1010, 0, 0.0, 85, [-180, -293, 1090, 1010]),
        _ => (820, -143, 820, 0, 0.0, 90, [-1, -143, 981, 820]),
    }
}

/// A Type 1 program.
#[derive(Debug, Clone)]
pub struct Type1Program {
    names: FontNames,
    metrics: FontMetrics,
    table: GlyphTable,
    data: Option<Bytes>,
    builtin: bool,
    font_specific: bool,
}

impl Type1Program {
    /// One of the 14 standard fonts.
    pub fn standard(name: &str) -> Result<Self> {
        if !Self::is_standard_name(name) {
            return Err(Error::FontProgram(format!("{} is not a standard Type 1 font", name)));
        }
        let (ascent, descent, cap_height, x_height, italic_angle, stem_v, bbox) =
            standard_metrics(name);
        let courier = name.starts_with("Courier");
        let metrics = FontMetrics {
            ascent,
            descent,
            cap_height,
            x_height,
            italic_angle,
            bbox,
            stem_v,
            stem_h: 0,
            fixed_pitch: courier,
            missing_width: 0,
        };

        let mut names = FontNames::new(name);
        names.family_name = name.split('-').next().map(str::to_string);
        names.weight = if name.contains("Bold") { 700 } else { 400 };
        names.italic = name.contains("Italic") || name.contains("Oblique");
        names.serif = name.starts_with("Times") || courier;

        let widths = match name {
            "Symbol" | "ZapfDingbats" => StandardWidths::Symbolic,
            _ if courier => StandardWidths::Monospace(600),
            "Helvetica-Bold" | "Helvetica-BoldOblique" => StandardWidths::Proportional(&HELVETICA_BOLD),
            "Times-Roman" => StandardWidths::Proportional(&TIMES_ROMAN),
            "Times-Bold" => StandardWidths::Proportional(&TIMES_BOLD),
            "Times-Italic" => StandardWidths::Proportional(&TIMES_ITALIC),
            "Times-BoldItalic" => StandardWidths::Proportional(&TIMES_BOLD_ITALIC),
            _ => StandardWidths::Proportional(&HELVETICA),
        };

        let mut table = GlyphTable::new();
        let font_specific = matches!(name, "Symbol" | "ZapfDingbats");
        if font_specific {
            let base = if name == "Symbol" {
                BaseEncoding::Symbol
            } else {
                BaseEncoding::ZapfDingbats
            };
            for code in 0..=255u8 {
                if let Some(unicode) = base.unicode(code) {
                    table.insert(Glyph::new(code as i32, widths.width(unicode), Some(unicode)));
                }
            }
        } else {
            for code in 0..=255u8 {
                if let Some(unicode) = BaseEncoding::Standard.unicode(code) {
                    table.insert(Glyph::new(code as i32, widths.width(unicode), Some(unicode)));
                }
            }
            let mut next = EXTRA_CODE_START;
            for base in [BaseEncoding::WinAnsi, BaseEncoding::MacRoman] {
                for code in 0..=255u8 {
                    if let Some(unicode) = base.unicode(code) {
                        if table.by_unicode(unicode).is_none() {
                            table.insert(Glyph::new(next, widths.width(unicode), Some(unicode)));
                            next += 1;
                        }
                    }
                }
            }
        }
        if table.by_code(0).is_none() {
            table.insert(Glyph::new(0, 0, None));
        }

        Ok(Self {
            names,
            metrics,
            table,
            data: None,
            builtin: true,
            font_specific,
        })
    }

    /// Whether `name` is one of the 14 standard fonts.
    pub fn is_standard_name(name: &str) -> bool {
        STANDARD_FONTS.contains(&name)
    }

    /// Custom Type 1 program from known metrics and glyphs.
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
            builtin: false,
            font_specific,
        }
    }

    /// Attach program bytes (the `/FontFile` stream content).
    pub fn with_data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Whether this is a standard font without custom metrics.
    pub fn is_builtin(&self) -> bool {
        self.builtin
    }

    /// Program bytes, if known.
    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    /// All glyphs in code order.
    pub fn glyphs(&self) -> impl Iterator<Item = &Glyph> {
        self.table.iter()
    }
}

impl GlyphRepository for Type1Program {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_standard_fonts_load() {
        for name in STANDARD_FONTS {
            let program = Type1Program::standard(name).unwrap();
            assert!(program.is_builtin());
            assert_eq!(program.font_names().font_name, name);
            assert!(program.count_of_glyphs() > 100, "{}", name);
        }
    }

    #[test]
    fn test_unknown_name() {
        let err = Type1Program::standard("Arial").unwrap_err();
        assert!(format!("{}", err).contains("Arial"));
    }

    #[test]
    fn test_helvetica_widths() {
        let program = Type1Program::standard("Helvetica").unwrap();
        assert_eq!(program.glyph('A' as u32).map(|g| g.width), Some(667));
        assert_eq!(program.glyph(' ' as u32).map(|g| g.width), Some(278));
        assert_eq!(program.glyph('W' as u32).map(|g| g.width), Some(944));
        // accented letters use the base letter
        assert_eq!(program.glyph(0xE9).map(|g| g.width), Some(556));
        assert_eq!(program.metrics().ascent, 718);
        assert!(!program.is_font_specific());
    }

    #[test]
    fn test_standard_encoding_codes() {
        let program = Type1Program::standard("Times-Roman").unwrap();
        assert_eq!(program.glyph('A' as u32).map(|g| g.code), Some(65));
        // the euro sign is not in StandardEncoding
        let euro = program.glyph(0x20AC).unwrap();
        assert!(euro.code >= EXTRA_CODE_START);
        assert_eq!(program.notdef().map(|g| g.code), Some(0));
    }

    #[test]
    fn test_courier_monospace() {
        let program = Type1Program::standard("Courier-BoldOblique").unwrap();
        assert!(program.metrics().fixed_pitch);
        assert_eq!(program.metrics().italic_angle, -12.0);
        assert!(program.font_names().is_bold());
        assert!(program.glyphs().filter(|g| g.code > 0).all(|g| g.width == 600));
    }

    #[test]
    fn test_symbol_is_font_specific() {
        let program = Type1Program::standard("Symbol").unwrap();
        assert!(program.is_font_specific());
        // alpha lives at 0x61
        assert_eq!(program.glyph_for_byte(0x61).and_then(|g| g.unicode), Some(0x03B1));
        assert_eq!(program.glyph(0x03B1).map(|g| g.code), Some(0x61));
    }

    #[test]
    fn test_custom_program() {
        let program = Type1Program::from_parts(
            FontNames::new("Custom-Regular"),
            FontMetrics::default(),
            vec![Glyph::new(65, 600, Some('A' as u32))],
            false,
        )
        .with_data(vec![0x80u8, 0x01]);
        assert!(!program.is_builtin());
        assert_eq!(program.data(), Some(&[0x80u8, 0x01][..]));
    }
}
