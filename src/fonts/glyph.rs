//! Glyph value type.

/// One glyph of a font program.
///
/// `code` is the program-local index: the byte code for simple fonts, the
/// CID for composite fonts. Negative codes mark placeholders that do not
/// exist in the program.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Glyph {
    /// Program-local code (byte code or CID)
    pub code: i32,
    /// Advance width in 1000-unit glyph space
    pub width: i32,
    /// Unicode scalar this glyph represents, if any
    pub unicode: Option<u32>,
    /// UTF-16 text this glyph decodes to; may differ from `unicode` for ligatures
    pub chars: Option<Vec<u16>>,
    /// Glyph bounding box `[llx, lly, urx, ury]`
    pub bbox: Option<[i32; 4]>,
}

impl Glyph {
    /// Create a glyph; `chars` is derived from `unicode`.
    pub fn new(code: i32, width: i32, unicode: Option<u32>) -> Self {
        Self {
            code,
            width,
            unicode,
            chars: unicode.and_then(utf16_of),
            bbox: None,
        }
    }

    /// Create a glyph with explicit decoded text.
    pub fn with_chars(code: i32, width: i32, unicode: Option<u32>, chars: Option<Vec<u16>>) -> Self {
        Self {
            code,
            width,
            unicode,
            chars,
            bbox: None,
        }
    }

    /// Set the bounding box.
    pub fn with_bbox(mut self, bbox: [i32; 4]) -> Self {
        self.bbox = Some(bbox);
        self
    }

    /// Copy of `base` that stands in for `unicode`.
    ///
    /// Used for notdef substitutes: the width and code come from the
    /// program's notdef glyph, the text from the requested character.
    pub fn substitute(base: &Glyph, unicode: u32) -> Self {
        Self {
            code: base.code,
            width: base.width,
            unicode: Some(unicode),
            chars: utf16_of(unicode),
            bbox: base.bbox,
        }
    }

    /// Placeholder that keeps layout arithmetic total for unmappable characters.
    pub fn placeholder(unicode: u32) -> Self {
        Self::new(-1, 0, Some(unicode))
    }

    /// Whether the glyph exists in its font program.
    pub fn has_valid_code(&self) -> bool {
        self.code >= 0
    }

    /// Decoded text as a `String`.
    pub fn text(&self) -> String {
        match &self.chars {
            Some(chars) => String::from_utf16_lossy(chars),
            None => self
                .unicode
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_default(),
        }
    }
}

/// UTF-16 code units of a scalar value.
pub fn utf16_of(unicode: u32) -> Option<Vec<u16>> {
    let c = char::from_u32(unicode)?;
    let mut buf = [0u16; 2];
    Some(c.encode_utf16(&mut buf).to_vec())
}
