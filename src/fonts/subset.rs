//! Used-glyph tracking and subset naming.
//!
//! Per ISO 32000-1 Section 9.6.4, an embedded subset font carries a tag of
//! six uppercase letters followed by `+` in front of its PostScript name.
//! The tag here is derived from the used glyph set, so the same subset of
//! the same font always gets the same name.

use std::collections::BTreeSet;

/// Which of the 256 codes of a simple font have been written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsedCodes([bool; 256]);

impl Default for UsedCodes {
    fn default() -> Self {
        Self([false; 256])
    }
}

impl UsedCodes {
    /// No code used.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `code` as used.
    pub fn mark(&mut self, code: u8) {
        self.0[code as usize] = true;
    }

    /// Whether `code` has been used.
    pub fn is_used(&self, code: u8) -> bool {
        self.0[code as usize]
    }

    /// Used codes in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=255u8).filter(move |c| self.0[*c as usize])
    }

    /// Lowest and highest used code.
    pub fn range(&self) -> Option<(u8, u8)> {
        let first = self.iter().next()?;
        let last = self.iter().last()?;
        Some((first, last))
    }

    /// Whether nothing has been used.
    pub fn is_empty(&self) -> bool {
        !self.0.iter().any(|used| *used)
    }
}

/// Unicode ranges whose glyphs are always kept in the subset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubsetRanges(Vec<[u32; 2]>);

impl SubsetRanges {
    /// No forced ranges.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `[lo, hi]`; bounds are reordered if given backwards.
    pub fn add(&mut self, range: [u32; 2]) {
        let [a, b] = range;
        self.0.push([a.min(b), a.max(b)]);
    }

    /// Whether `unicode` falls in any range.
    pub fn contains(&self, unicode: u32) -> bool {
        self.0.iter().any(|[lo, hi]| (*lo..=*hi).contains(&unicode))
    }

    /// The ranges as added.
    pub fn ranges(&self) -> &[[u32; 2]] {
        &self.0
    }

    /// Whether no range was added.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Six-letter tag for the subset made of `used_glyphs`.
///
/// FNV-1a over the glyph codes, written in base 26.
pub fn subset_tag(used_glyphs: &BTreeSet<i32>) -> String {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for glyph in used_glyphs {
        for byte in glyph.to_be_bytes() {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
    }
    let mut tag = String::with_capacity(6);
    for _ in 0..6 {
        tag.push((b'A' + (hash % 26) as u8) as char);
        hash /= 26;
    }
    tag
}

/// `TAG+BaseName`.
pub fn subset_font_name(used_glyphs: &BTreeSet<i32>, base_name: &str) -> String {
    format!("{}+{}", subset_tag(used_glyphs), strip_subset_tag(base_name))
}

/// Whether `name` starts with a subset tag.
pub fn has_subset_tag(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() > 7 && bytes[6] == b'+' && bytes[..6].iter().all(u8::is_ascii_uppercase)
}

/// `name` without its subset tag.
pub fn strip_subset_tag(name: &str) -> &str {
    if has_subset_tag(name) {
        &name[7..]
    } else {
        name
    }
}
