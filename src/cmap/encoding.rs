//! Composite-font code ↔ CID mapping.

use super::cache::CMapCache;
use super::codespace::{next_code, CharCode, CodespaceRange};
use super::parser::{parse_cmap, CMapData};
use crate::error::Result;
use byteorder::{BigEndian, ByteOrder};
use std::collections::{BTreeMap, HashMap};

/// Horizontal identity CMap.
pub const IDENTITY_H: &str = "Identity-H";
/// Vertical identity CMap.
pub const IDENTITY_V: &str = "Identity-V";

/// The CMap of a Type 0 font.
///
/// Identity CMaps are direct: the two-byte code is the CID. Every other
/// CMap maps codes through a table.
#[derive(Debug, Clone)]
pub struct CMapEncoding {
    cmap_name: String,
    registry: Option<String>,
    ordering: Option<String>,
    supplement: i32,
    direct: bool,
    vertical: bool,
    codespace: Vec<CodespaceRange>,
    code_to_cid: HashMap<CharCode, u32>,
    cid_to_code: BTreeMap<u32, CharCode>,
}

impl CMapEncoding {
    /// `Identity-H` or, if `vertical`, `Identity-V`.
    pub fn identity(vertical: bool) -> Self {
        Self {
            cmap_name: if vertical { IDENTITY_V } else { IDENTITY_H }.to_string(),
            registry: Some("Adobe".to_string()),
            ordering: Some("Identity".to_string()),
            supplement: 0,
            direct: true,
            vertical,
            codespace: vec![CodespaceRange::two_byte()],
            code_to_cid: HashMap::new(),
            cid_to_code: BTreeMap::new(),
        }
    }

    /// Whether `name` is one of the identity CMaps.
    pub fn is_identity_name(name: &str) -> bool {
        name == IDENTITY_H || name == IDENTITY_V
    }

    /// Encoding for a named CMap: identity CMaps directly, anything else
    /// from the predefined resources of `cache`.
    pub fn named(name: &str, cache: &CMapCache) -> Result<Self> {
        if Self::is_identity_name(name) {
            return Ok(Self::identity(name == IDENTITY_V));
        }
        let data = cache.cmap(name)?;
        Ok(Self::from_cmap_data(name, &data))
    }

    /// Encoding from an embedded CMap stream; `usecmap` parents come from `cache`.
    pub fn from_embedded(program: &[u8], cache: &CMapCache) -> Result<Self> {
        let data = cache.resolve_parents(parse_cmap(program)?);
        let name = data.name.clone().unwrap_or_default();
        Ok(Self::from_cmap_data(&name, &data))
    }

    /// Encoding from parsed CMap data.
    pub fn from_cmap_data(name: &str, data: &CMapData) -> Self {
        let mut cid_to_code = BTreeMap::new();
        // BTreeMap order: shorter then lower codes win the reverse mapping
        for (code, cid) in &data.cids {
            cid_to_code.entry(*cid).or_insert(*code);
        }
        Self {
            cmap_name: name.to_string(),
            registry: data.registry.clone(),
            ordering: data.ordering.clone(),
            supplement: data.supplement,
            direct: false,
            vertical: data.wmode == 1,
            codespace: data.codespace.clone(),
            code_to_cid: data.cids.iter().map(|(k, v)| (*k, *v)).collect(),
            cid_to_code,
        }
    }

    /// CMap name.
    pub fn cmap_name(&self) -> &str {
        &self.cmap_name
    }

    /// `/Registry` of the CMap's character collection.
    pub fn registry(&self) -> Option<&str> {
        self.registry.as_deref()
    }

    /// `/Ordering` of the CMap's character collection.
    pub fn ordering(&self) -> Option<&str> {
        self.ordering.as_deref()
    }

    /// `/Supplement` of the CMap's character collection.
    pub fn supplement(&self) -> i32 {
        self.supplement
    }

    /// Whether codes are CIDs (identity CMaps).
    pub fn is_direct(&self) -> bool {
        self.direct
    }

    /// Whether the writing mode is vertical.
    pub fn is_vertical(&self) -> bool {
        self.vertical
    }

    /// Codespace ranges.
    pub fn codespace(&self) -> &[CodespaceRange] {
        &self.codespace
    }

    /// Split the next code off `bytes`; see [`next_code`].
    pub fn next_code(&self, bytes: &[u8]) -> (CharCode, bool) {
        next_code(&self.codespace, bytes)
    }

    /// CID of `code`.
    pub fn cid_of(&self, code: CharCode) -> Option<u32> {
        if self.direct {
            return Some(code.value);
        }
        self.code_to_cid.get(&code).copied()
    }

    /// Code that selects `cid`.
    pub fn code_of(&self, cid: u32) -> Option<CharCode> {
        if self.direct {
            return u16::try_from(cid).ok().map(|cid| CharCode::new(cid as u32, 2));
        }
        self.cid_to_code.get(&cid).copied()
    }

    /// Append the code bytes of `cid` to `out`.
    ///
    /// A CID the CMap cannot produce is written as code 0 in the width of
    /// the first codespace range; returns `false` in that case.
    pub fn write_cid(&self, cid: u32, out: &mut Vec<u8>) -> bool {
        if self.direct {
            if let Ok(cid) = u16::try_from(cid) {
                let mut buf = [0u8; 2];
                BigEndian::write_u16(&mut buf, cid);
                out.extend_from_slice(&buf);
                return true;
            }
        } else if let Some(code) = self.code_of(cid) {
            out.extend(code.to_bytes());
            return true;
        }
        log::debug!("CID {} is not encodable in {}", cid, self.cmap_name);
        let width = self.codespace.first().map_or(2, |r| r.code_length());
        out.extend(std::iter::repeat(0u8).take(width));
        false
    }

    /// Whether the CMap can be used with a font of the given character collection.
    ///
    /// Identity CMaps work with any collection.
    pub fn is_compatible_with(&self, registry: &str, ordering: &str) -> bool {
        if self.direct {
            return true;
        }
        self.registry.as_deref().map_or(true, |r| r == registry)
            && self.ordering.as_deref().map_or(true, |o| o == ordering)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmap::MemoryCMapProvider;

    const UNI_GB: &[u8] = b"/CIDSystemInfo << /Registry (Adobe) /Ordering (GB1) /Supplement 4 >> def\n\
        /CMapName /UniGB-UCS2-H def\n\
        2 begincodespacerange <00> <80> <8140> <FEFE> endcodespacerange\n\
        1 begincidrange <20> <22> 1 endcidrange\n\
        1 begincidchar <8140> 814 endcidchar\n";

    fn cache() -> CMapCache {
        CMapCache::new(MemoryCMapProvider::new().with("UniGB-UCS2-H", UNI_GB))
    }

    #[test]
    fn test_identity_is_direct() {
        let cmap = CMapEncoding::identity(false);
        assert!(cmap.is_direct());
        assert!(!cmap.is_vertical());
        assert_eq!(cmap.cid_of(CharCode::new(0x1234, 2)), Some(0x1234));
        let mut out = Vec::new();
        assert!(cmap.write_cid(0x0102, &mut out));
        assert_eq!(out, vec![0x01, 0x02]);
        assert!(CMapEncoding::identity(true).is_vertical());
    }

    #[test]
    fn test_named_identity_needs_no_resource() {
        let cmap = CMapEncoding::named("Identity-V", &cache()).unwrap();
        assert_eq!(cmap.cmap_name(), "Identity-V");
        assert!(cmap.is_vertical());
    }

    #[test]
    fn test_table_cmap_round_trip() {
        let cmap = CMapEncoding::named("UniGB-UCS2-H", &cache()).unwrap();
        assert!(!cmap.is_direct());
        assert_eq!(cmap.ordering(), Some("GB1"));
        assert_eq!(cmap.supplement(), 4);

        let mut out = Vec::new();
        assert!(cmap.write_cid(2, &mut out));
        assert!(cmap.write_cid(814, &mut out));
        assert_eq!(out, vec![0x21, 0x81, 0x40]);

        let (first, matched) = cmap.next_code(&out);
        assert!(matched);
        assert_eq!(cmap.cid_of(first), Some(2));
        let (second, _) = cmap.next_code(&out[1..]);
        assert_eq!(cmap.cid_of(second), Some(814));
    }

    #[test]
    fn test_unencodable_cid_falls_back_to_zero() {
        let cmap = CMapEncoding::named("UniGB-UCS2-H", &cache()).unwrap();
        let mut out = Vec::new();
        assert!(!cmap.write_cid(9999, &mut out));
        assert_eq!(out, vec![0x00]);
    }

    #[test]
    fn test_compatibility() {
        let cmap = CMapEncoding::named("UniGB-UCS2-H", &cache()).unwrap();
        assert!(cmap.is_compatible_with("Adobe", "GB1"));
        assert!(!cmap.is_compatible_with("Adobe", "Japan1"));
        assert!(CMapEncoding::identity(false).is_compatible_with("Adobe", "Korea1"));
    }

    #[test]
    fn test_from_embedded_resolves_parent() {
        let program = b"/CMapName /Custom def /UniGB-UCS2-H usecmap 1 begincidchar <21> 500 endcidchar";
        let cmap = CMapEncoding::from_embedded(program, &cache()).unwrap();
        assert_eq!(cmap.cmap_name(), "Custom");
        assert_eq!(cmap.cid_of(CharCode::new(0x21, 1)), Some(500));
        assert_eq!(cmap.cid_of(CharCode::new(0x20, 1)), Some(1));
        assert_eq!(cmap.codespace().len(), 2);
    }
}
