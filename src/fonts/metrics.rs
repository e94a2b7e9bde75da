//! Font names, metrics and descriptor flags.

use bitflags::bitflags;

bitflags! {
    /// `/Flags` of a FontDescriptor (ISO 32000-1 Table 123).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FontDescriptorFlags: u32 {
        /// All glyphs have the same width
        const FIXED_PITCH = 1;
        /// Glyphs have serifs
        const SERIF = 1 << 1;
        /// Glyphs outside the Adobe standard Latin set
        const SYMBOLIC = 1 << 2;
        /// Glyphs resemble cursive handwriting
        const SCRIPT = 1 << 3;
        /// Standard Latin character set
        const NONSYMBOLIC = 1 << 5;
        /// Italic
        const ITALIC = 1 << 6;
        /// No lowercase letters
        const ALL_CAP = 1 << 16;
        /// Lowercase letters are small capitals
        const SMALL_CAP = 1 << 17;
        /// Bold glyphs are emboldened at small sizes
        const FORCE_BOLD = 1 << 18;
    }
}

/// Naming and style information of a font program.
#[derive(Debug, Clone, PartialEq)]
pub struct FontNames {
    /// PostScript name, used as `/BaseFont`
    pub font_name: String,
    /// Family name (`/FontFamily`)
    pub family_name: Option<String>,
    /// Weight class, 400 regular, 700 bold
    pub weight: u16,
    /// Italic or oblique style
    pub italic: bool,
    /// Serif design
    pub serif: bool,
    /// Script design
    pub script: bool,
    /// Licensing permits embedding
    pub allow_embedding: bool,
}

impl FontNames {
    /// Names for `font_name` with regular style and embedding allowed.
    pub fn new(font_name: impl Into<String>) -> Self {
        Self {
            font_name: font_name.into(),
            family_name: None,
            weight: 400,
            italic: false,
            serif: false,
            script: false,
            allow_embedding: true,
        }
    }

    /// Whether the weight is bold or heavier.
    pub fn is_bold(&self) -> bool {
        self.weight >= 700
    }
}

/// Vertical metrics and bounding box in 1000-unit glyph space.
#[derive(Debug, Clone, PartialEq)]
pub struct FontMetrics {
    /// Ascender (positive)
    pub ascent: i32,
    /// Descender (negative)
    pub descent: i32,
    /// Cap height
    pub cap_height: i32,
    /// x-height, 0 if unknown
    pub x_height: i32,
    /// Italic angle in degrees
    pub italic_angle: f32,
    /// Bounding box `[llx, lly, urx, ury]`
    pub bbox: [i32; 4],
    /// Vertical stem width
    pub stem_v: i32,
    /// Horizontal stem width, 0 if unknown
    pub stem_h: i32,
    /// All glyphs have the same advance
    pub fixed_pitch: bool,
    /// Width of glyphs missing from `/Widths`
    pub missing_width: i32,
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self {
            ascent: 800,
            descent: -200,
            cap_height: 700,
            x_height: 0,
            italic_angle: 0.0,
            bbox: [0, -200, 1000, 800],
            stem_v: 80,
            stem_h: 0,
            fixed_pitch: false,
            missing_width: 0,
        }
    }
}

impl FontMetrics {
    /// Descriptor flags for a font with these metrics.
    ///
    /// Symbolic and nonsymbolic are mutually exclusive and follow
    /// `font_specific`, the state of the encoding at flush time.
    pub fn flags(&self, names: &FontNames, font_specific: bool) -> FontDescriptorFlags {
        let mut flags = FontDescriptorFlags::empty();
        flags.set(FontDescriptorFlags::FIXED_PITCH, self.fixed_pitch);
        flags.set(FontDescriptorFlags::SERIF, names.serif);
        flags.set(FontDescriptorFlags::SCRIPT, names.script);
        flags.set(
            FontDescriptorFlags::ITALIC,
            names.italic || self.italic_angle != 0.0,
        );
        flags.set(FontDescriptorFlags::FORCE_BOLD, names.is_bold());
        if font_specific {
            flags |= FontDescriptorFlags::SYMBOLIC;
        } else {
            flags |= FontDescriptorFlags::NONSYMBOLIC;
        }
        flags
    }

    /// Scale a value in `units_per_em` font units to 1000-unit glyph space.
    pub fn scale(value: i32, units_per_em: u16) -> i32 {
        if units_per_em == 0 || units_per_em == 1000 {
            return value;
        }
        value * 1000 / units_per_em as i32
    }
}
