//! Code → Unicode maps.
//!
//! [`CMapToUnicode`] is read from `/ToUnicode` streams and predefined
//! resources. The writer side, [`generate_to_unicode`], emits the
//! `Adobe-Identity-UCS` program stored in the `/ToUnicode` stream of fonts
//! this crate creates.

use super::codespace::CodespaceRange;
use super::parser::{parse_cmap, CMapData};
use crate::error::Result;
use crate::fonts::Glyph;
use lazy_static::lazy_static;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

lazy_static! {
    static ref IDENTITY: Arc<CMapToUnicode> = Arc::new(CMapToUnicode {
        identity: true,
        codespace: vec![CodespaceRange::two_byte()],
        map: BTreeMap::new(),
    });
    static ref EMPTY: Arc<CMapToUnicode> = Arc::new(CMapToUnicode::new());
}

/// Default number of `bfrange` entries per block.
pub const DEFAULT_BFRANGE_BATCH: usize = 100;

/// A code → UTF-16 text map.
///
/// The identity map returns the code itself as a single UTF-16 unit.
#[derive(Debug, Clone, PartialEq)]
pub struct CMapToUnicode {
    identity: bool,
    codespace: Vec<CodespaceRange>,
    map: BTreeMap<u32, Vec<u16>>,
}

impl Default for CMapToUnicode {
    fn default() -> Self {
        Self::new()
    }
}

impl CMapToUnicode {
    /// An empty table.
    pub fn new() -> Self {
        Self {
            identity: false,
            codespace: Vec::new(),
            map: BTreeMap::new(),
        }
    }

    /// Shared identity map (code == UTF-16 unit).
    pub fn identity() -> Arc<Self> {
        Arc::clone(&IDENTITY)
    }

    /// Shared empty map.
    pub fn empty() -> Arc<Self> {
        Arc::clone(&EMPTY)
    }

    /// Parse a ToUnicode program.
    pub fn parse(data: &[u8]) -> Result<Self> {
        Ok(Self::from_cmap_data(parse_cmap(data)?))
    }

    /// Parse a ToUnicode program, degrading to [`empty`](Self::empty) on failure.
    pub fn parse_or_empty(data: &[u8]) -> Arc<Self> {
        match Self::parse(data) {
            Ok(cmap) => Arc::new(cmap),
            Err(e) => {
                log::warn!("Invalid ToUnicode CMap, ignoring it: {}", e);
                Self::empty()
            },
        }
    }

    /// Table built from parsed CMap data.
    ///
    /// Codes are keyed by value only; `<0041>` and `<41>` are the same entry.
    pub fn from_cmap_data(data: CMapData) -> Self {
        let map = data
            .unicode
            .into_iter()
            .map(|(code, chars)| (code.value, chars))
            .collect();
        Self {
            identity: false,
            codespace: data.codespace,
            map,
        }
    }

    /// Whether this is the identity map.
    pub fn is_identity(&self) -> bool {
        self.identity
    }

    /// Declared codespace ranges.
    pub fn codespace(&self) -> &[CodespaceRange] {
        &self.codespace
    }

    /// Add or replace one mapping.
    pub fn add_mapping(&mut self, code: u32, chars: Vec<u16>) {
        self.map.insert(code, chars);
    }

    /// UTF-16 text of `code`.
    pub fn lookup(&self, code: u32) -> Option<Cow<'_, [u16]>> {
        if self.identity {
            return u16::try_from(code).ok().map(|unit| Cow::Owned(vec![unit]));
        }
        self.map.get(&code).map(|chars| Cow::Borrowed(chars.as_slice()))
    }

    /// Text of `code` as a `String`.
    pub fn lookup_string(&self, code: u32) -> Option<String> {
        self.lookup(code).map(|chars| String::from_utf16_lossy(&chars))
    }

    /// Whether the map can decode anything.
    pub fn has_mappings(&self) -> bool {
        self.identity || !self.map.is_empty()
    }

    /// Number of explicit mappings.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether there are no explicit mappings.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Explicit mappings in code order; empty for the identity map.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &[u16])> {
        self.map.iter().map(|(code, chars)| (*code, chars.as_slice()))
    }

    /// Code → Unicode scalar for every code whose text is exactly one scalar.
    pub fn create_direct_mapping(&self) -> BTreeMap<u32, u32> {
        if self.identity {
            return (0..=0xFFFFu32)
                .filter(|c| char::from_u32(*c).is_some())
                .map(|c| (c, c))
                .collect();
        }
        self.map
            .iter()
            .filter_map(|(code, chars)| single_scalar(chars).map(|u| (*code, u)))
            .collect()
    }

    /// Unicode scalar → code; the lowest code wins when several share a scalar.
    pub fn create_reverse_mapping(&self) -> BTreeMap<u32, u32> {
        let mut reverse = BTreeMap::new();
        for (code, unicode) in self.create_direct_mapping() {
            reverse.entry(unicode).or_insert(code);
        }
        reverse
    }
}

fn single_scalar(chars: &[u16]) -> Option<u32> {
    let mut decoded = char::decode_utf16(chars.iter().copied());
    let first = decoded.next()?.ok()?;
    if decoded.next().is_some() {
        return None;
    }
    Some(first as u32)
}

const HEADER: &str = "/CIDInit /ProcSet findresource begin\n\
    12 dict begin\n\
    begincmap\n\
    /CIDSystemInfo\n\
    << /Registry (Adobe)\n\
    /Ordering (UCS)\n\
    /Supplement 0\n\
    >> def\n\
    /CMapName /Adobe-Identity-UCS def\n\
    /CMapType 2 def\n";

const TRAILER: &str = "endcmap\nCMapName currentdict /CMap defineresource pop\nend end\n";

/// Build a ToUnicode program for `glyphs`.
///
/// Only glyphs with a valid code and decoded text are written, in the order
/// given, as `<code><code><text>` entries of `bfrange` blocks holding at
/// most `batch` entries. Returns `None` when no glyph qualifies.
///
/// The program always declares the two-byte codespace `<0000>`-`<FFFF>`,
/// whatever codes the font itself uses; readers key the entries by value.
pub fn generate_to_unicode<'a, I>(glyphs: I, batch: usize) -> Option<Vec<u8>>
where
    I: IntoIterator<Item = &'a Glyph>,
{
    let entries: Vec<(u32, &[u16])> = glyphs
        .into_iter()
        .filter(|g| g.has_valid_code())
        .filter_map(|g| g.chars.as_deref().map(|chars| (g.code as u32, chars)))
        .filter(|(_, chars)| !chars.is_empty())
        .collect();
    if entries.is_empty() {
        return None;
    }

    let mut out = String::from(HEADER);
    out.push_str("1 begincodespacerange\n<0000><FFFF>\nendcodespacerange\n");

    for block in entries.chunks(batch.max(1)) {
        let _ = writeln!(out, "{} beginbfrange", block.len());
        for (code, chars) in block {
            let code = format!("<{:04X}>", code & 0xFFFF);
            out.push_str(&code);
            out.push_str(&code);
            out.push('<');
            for unit in chars.iter() {
                let _ = write!(out, "{:04X}", unit);
            }
            out.push_str(">\n");
        }
        out.push_str("endbfrange\n");
    }

    out.push_str(TRAILER);
    Some(out.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_and_empty_singletons() {
        let a = CMapToUnicode::identity();
        let b = CMapToUnicode::identity();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.lookup(0x41).as_deref(), Some(&[0x41u16][..]));
        assert!(a.lookup(0x10000).is_none());

        let empty = CMapToUnicode::empty();
        assert!(!empty.has_mappings());
        assert!(empty.lookup(0x41).is_none());
    }

    #[test]
    fn test_parse_and_lookup() {
        let cmap = CMapToUnicode::parse(
            b"1 begincodespacerange <0000> <FFFF> endcodespacerange\n\
              2 beginbfchar <0001> <0048> <0002> <00660069> endbfchar",
        )
        .unwrap();
        assert_eq!(cmap.lookup_string(1).as_deref(), Some("H"));
        assert_eq!(cmap.lookup_string(2).as_deref(), Some("fi"));
        assert_eq!(cmap.codespace().len(), 1);

        let direct = cmap.create_direct_mapping();
        assert_eq!(direct.get(&1), Some(&0x48));
        // ligature text is not a single scalar
        assert!(!direct.contains_key(&2));
    }

    #[test]
    fn test_reverse_mapping_lowest_code_wins() {
        let cmap = CMapToUnicode::parse(b"2 beginbfchar <05> <0041> <03> <0041> endbfchar").unwrap();
        assert_eq!(cmap.create_reverse_mapping().get(&0x41), Some(&3));
    }

    #[test]
    fn test_parse_or_empty_degrades() {
        let cmap = CMapToUnicode::parse_or_empty(b"1 beginbfchar <01> <0041>");
        assert!(Arc::ptr_eq(&cmap, &CMapToUnicode::empty()));
    }

    #[test]
    fn test_generate_none_without_text() {
        let glyphs = vec![Glyph::new(1, 500, None), Glyph::placeholder(0x41)];
        assert!(generate_to_unicode(&glyphs, DEFAULT_BFRANGE_BATCH).is_none());
    }

    #[test]
    fn test_generate_exact_text() {
        let glyphs = vec![Glyph::new(3, 278, Some(0x20)), Glyph::new(36, 667, Some(0x1F600))];
        let bytes = generate_to_unicode(&glyphs, DEFAULT_BFRANGE_BATCH).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n"));
        assert!(text.contains("/CMapName /Adobe-Identity-UCS def\n/CMapType 2 def\n"));
        assert!(text.contains(
            "2 beginbfrange\n<0003><0003><0020>\n<0024><0024><D83DDE00>\nendbfrange\n"
        ));
        assert!(text.ends_with("endcmap\nCMapName currentdict /CMap defineresource pop\nend end\n"));
    }

    #[test]
    fn test_generate_single_byte_font_codes() {
        // codes of simple fonts are still written in the two-byte codespace
        let glyphs = vec![Glyph::new(65, 600, Some(0x41))];
        let bytes = generate_to_unicode(&glyphs, 100).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains("1 begincodespacerange\n<0000><FFFF>\nendcodespacerange\n"));
        assert!(!text.contains("<00><FF>"));
        assert!(text.contains("<0041><0041><0041>"));
        assert_eq!(CMapToUnicode::parse(&bytes).unwrap().lookup_string(0x41).as_deref(), Some("A"));
    }

    #[test]
    fn test_generated_program_parses_back() {
        let glyphs: Vec<Glyph> = (1..=5).map(|i| Glyph::new(i, 500, Some(0x60 + i as u32))).collect();
        let bytes = generate_to_unicode(&glyphs, 2).unwrap();
        let cmap = CMapToUnicode::parse(&bytes).unwrap();
        for i in 1..=5u32 {
            assert_eq!(cmap.lookup(i).as_deref(), Some(&[0x60 + i as u16][..]));
        }
    }
}
