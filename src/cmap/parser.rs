//! CMap program parser.
//!
//! Runs the token stream of a CMap through a small operand stack, the way
//! a PostScript interpreter would, but only gives meaning to the operators
//! a CMap uses:
//!
//! - `begincodespacerange` / `endcodespacerange`: pairs of hex strings
//! - `beginbfchar` / `endbfchar`: `<src> <dst>` pairs (dst may be a glyph name)
//! - `beginbfrange` / `endbfrange`: `<lo> <hi> <dst>` or `<lo> <hi> [<d0> <d1> ...]`
//! - `begincidchar` / `endcidchar`, `begincidrange` / `endcidrange`: code → CID
//! - `usecmap`: parent CMap name
//! - `def`: `/CMapName`, `/CIDSystemInfo`, `/Registry`, `/Ordering`,
//!   `/Supplement`, `/WMode`
//!
//! Every other operator simply clears the stack. Malformed tokens are
//! skipped a byte at a time; only a block left open at end of input is an
//! error.

use super::codespace::{CharCode, CodespaceRange};
use super::lexer::{decode_hex, decode_literal, skip_whitespace, token, Token};
use crate::error::{Error, Result};
use crate::fonts::glyph_list;
use std::collections::BTreeMap;

/// Largest number of codes a single range entry may expand to.
pub const MAX_RANGE_ENTRIES: u32 = 0x10000;

/// Everything a CMap program declares.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CMapData {
    /// `/CMapName`
    pub name: Option<String>,
    /// `/Registry` of `/CIDSystemInfo`
    pub registry: Option<String>,
    /// `/Ordering` of `/CIDSystemInfo`
    pub ordering: Option<String>,
    /// `/Supplement` of `/CIDSystemInfo`
    pub supplement: i32,
    /// `/WMode`: 0 horizontal, 1 vertical
    pub wmode: u8,
    /// Parent CMap named by `usecmap`
    pub usecmap: Option<String>,
    /// Declared codespace ranges in declaration order
    pub codespace: Vec<CodespaceRange>,
    /// Code → UTF-16 text (bfchar/bfrange)
    pub unicode: BTreeMap<CharCode, Vec<u16>>,
    /// Code → CID (cidchar/cidrange)
    pub cids: BTreeMap<CharCode, u32>,
}

impl CMapData {
    /// Fill in everything `parent` declares that this CMap does not.
    pub fn merge_parent(&mut self, parent: &CMapData) {
        if self.codespace.is_empty() {
            self.codespace = parent.codespace.clone();
        }
        for (code, chars) in &parent.unicode {
            self.unicode.entry(*code).or_insert_with(|| chars.clone());
        }
        for (code, cid) in &parent.cids {
            self.cids.entry(*code).or_insert(*cid);
        }
        if self.registry.is_none() {
            self.registry = parent.registry.clone();
            self.ordering = parent.ordering.clone();
            self.supplement = parent.supplement;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Int(i64),
    Real(f64),
    Str(Vec<u8>),
    Name(String),
    Array(Vec<Operand>),
    Dict(Vec<Operand>),
    ArrayMark,
    DictMark,
}

/// Convert destination bytes to UTF-16 code units.
///
/// A single byte is taken as one code unit; otherwise bytes are read as
/// big-endian pairs.
pub fn bytes_to_utf16(bytes: &[u8]) -> Vec<u16> {
    if bytes.len() == 1 {
        return vec![bytes[0] as u16];
    }
    bytes
        .chunks(2)
        .map(|pair| match pair {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            [single] => *single as u16,
            _ => 0,
        })
        .collect()
}

/// Parse a CMap program.
pub fn parse_cmap(data: &[u8]) -> Result<CMapData> {
    let mut cmap = CMapData::default();
    let mut stack: Vec<Operand> = Vec::new();
    let mut open_block: Option<(String, usize)> = None;
    let mut proc_depth = 0usize;
    let mut rest = data;

    while !rest.is_empty() {
        let offset = data.len() - rest.len();
        let (next, tok) = match token(rest) {
            Ok(ok) => ok,
            Err(_) => {
                let trimmed = skip_whitespace(rest);
                if trimmed.is_empty() {
                    break;
                }
                log::trace!("CMap: skipping unreadable byte 0x{:02X} at {}", trimmed[0], offset);
                rest = &trimmed[1..];
                continue;
            },
        };
        rest = next;

        if proc_depth > 0 {
            match tok {
                Token::ProcStart => proc_depth += 1,
                Token::ProcEnd => proc_depth -= 1,
                _ => {},
            }
            continue;
        }

        match tok {
            Token::Integer(n) => stack.push(Operand::Int(n)),
            Token::Real(r) => stack.push(Operand::Real(r)),
            Token::HexString(digits) => stack.push(Operand::Str(decode_hex(digits))),
            Token::LiteralString(raw) => stack.push(Operand::Str(decode_literal(raw))),
            Token::Name(name) => stack.push(Operand::Name(name)),
            Token::ArrayStart => stack.push(Operand::ArrayMark),
            Token::DictStart => stack.push(Operand::DictMark),
            Token::ArrayEnd => {
                let items = pop_to_mark(&mut stack, &Operand::ArrayMark);
                stack.push(Operand::Array(items));
            },
            Token::DictEnd => {
                let items = pop_to_mark(&mut stack, &Operand::DictMark);
                stack.push(Operand::Dict(items));
            },
            Token::ProcStart => proc_depth = 1,
            Token::ProcEnd => {},
            Token::Operator(op) => {
                if let Some(block) = op.strip_prefix("begin") {
                    if is_data_block(block) {
                        open_block = Some((block.to_string(), offset));
                    }
                    stack.clear();
                    continue;
                }
                if let Some(block) = op.strip_prefix("end") {
                    if is_data_block(block) {
                        let operands = std::mem::take(&mut stack);
                        apply_block(&mut cmap, block, operands);
                        open_block = None;
                        continue;
                    }
                }
                match op {
                    "def" => apply_def(&mut cmap, &mut stack),
                    "usecmap" => {
                        if let Some(Operand::Name(parent)) = stack.pop() {
                            cmap.usecmap = Some(parent);
                        }
                        stack.clear();
                    },
                    _ => stack.clear(),
                }
            },
        }
    }

    if let Some((block, offset)) = open_block {
        return Err(Error::ParseError {
            offset,
            reason: format!("begin{} block is not terminated", block),
        });
    }
    Ok(cmap)
}

fn is_data_block(name: &str) -> bool {
    matches!(
        name,
        "codespacerange" | "bfchar" | "bfrange" | "cidchar" | "cidrange" | "notdefchar" | "notdefrange"
    )
}

fn pop_to_mark(stack: &mut Vec<Operand>, mark: &Operand) -> Vec<Operand> {
    match stack.iter().rposition(|op| op == mark) {
        Some(pos) => {
            let items = stack.split_off(pos + 1);
            stack.pop();
            items
        },
        None => {
            log::warn!("CMap: unbalanced closing delimiter");
            std::mem::take(stack)
        },
    }
}

fn apply_def(cmap: &mut CMapData, stack: &mut Vec<Operand>) {
    let value = stack.pop();
    let key = stack.pop();
    stack.clear();
    let (Some(Operand::Name(key)), Some(value)) = (key, value) else {
        return;
    };
    match key.as_str() {
        "CMapName" => {
            if let Operand::Name(name) = value {
                cmap.name = Some(name);
            }
        },
        "CIDSystemInfo" => {
            let dict = match value {
                Operand::Dict(items) => items,
                // some resources wrap the dictionary in an array
                Operand::Array(mut items) => match items.pop() {
                    Some(Operand::Dict(items)) => items,
                    _ => return,
                },
                _ => return,
            };
            for pair in dict.chunks(2) {
                if let [Operand::Name(k), v] = pair {
                    apply_system_info(cmap, k, v.clone());
                }
            }
        },
        "Registry" | "Ordering" | "Supplement" => apply_system_info(cmap, &key, value),
        "WMode" => {
            if let Operand::Int(mode) = value {
                cmap.wmode = u8::from(mode == 1);
            }
        },
        _ => {},
    }
}

fn apply_system_info(cmap: &mut CMapData, key: &str, value: Operand) {
    match (key, value) {
        ("Registry", Operand::Str(s)) => cmap.registry = Some(String::from_utf8_lossy(&s).into_owned()),
        ("Ordering", Operand::Str(s)) => cmap.ordering = Some(String::from_utf8_lossy(&s).into_owned()),
        ("Supplement", Operand::Int(n)) => cmap.supplement = n as i32,
        ("Supplement", Operand::Real(r)) => cmap.supplement = r as i32,
        _ => {},
    }
}

fn dst_chars(dst: &Operand) -> Option<Vec<u16>> {
    match dst {
        Operand::Str(bytes) => Some(bytes_to_utf16(bytes)),
        Operand::Name(name) => glyph_list::name_to_chars(name),
        _ => None,
    }
}

/// Iterate the codes of `[lo, hi]`, capped at [`MAX_RANGE_ENTRIES`].
fn range_codes(lo: &[u8], hi: &[u8]) -> Option<impl Iterator<Item = CharCode>> {
    if lo.len() != hi.len() || lo.is_empty() || lo.len() > 4 {
        log::warn!("CMap: range bounds of different lengths {} and {}", lo.len(), hi.len());
        return None;
    }
    let start = CharCode::from_bytes(lo);
    let end = CharCode::from_bytes(hi);
    if end.value < start.value {
        log::warn!("CMap: inverted range {}..{}", start, end);
        return None;
    }
    let mut count = end.value - start.value + 1;
    if count > MAX_RANGE_ENTRIES {
        log::warn!(
            "CMap: range {}..{} has {} codes, truncating to {}",
            start,
            end,
            count,
            MAX_RANGE_ENTRIES
        );
        count = MAX_RANGE_ENTRIES;
    }
    let len = start.len;
    Some((0..count).map(move |i| CharCode::new(start.value + i, len)))
}

fn apply_block(cmap: &mut CMapData, block: &str, operands: Vec<Operand>) {
    match block {
        "codespacerange" => {
            for pair in operands.chunks(2) {
                if let [Operand::Str(lo), Operand::Str(hi)] = pair {
                    match CodespaceRange::new(lo.clone(), hi.clone()) {
                        Some(range) => cmap.codespace.push(range),
                        None => log::warn!("CMap: invalid codespace range"),
                    }
                }
            }
        },
        "bfchar" => {
            for pair in operands.chunks(2) {
                match pair {
                    [Operand::Str(src), dst] => match dst_chars(dst) {
                        Some(chars) => {
                            cmap.unicode.insert(CharCode::from_bytes(src), chars);
                        },
                        None => log::debug!("CMap: bfchar destination without text"),
                    },
                    _ => log::warn!("CMap: malformed bfchar entry"),
                }
            }
        },
        "bfrange" => {
            for triple in operands.chunks(3) {
                let [Operand::Str(lo), Operand::Str(hi), dst] = triple else {
                    log::warn!("CMap: malformed bfrange entry");
                    continue;
                };
                let Some(codes) = range_codes(lo, hi) else {
                    continue;
                };
                match dst {
                    Operand::Array(items) => {
                        for (code, item) in codes.zip(items) {
                            if let Some(chars) = dst_chars(item) {
                                cmap.unicode.insert(code, chars);
                            }
                        }
                    },
                    Operand::Str(bytes) => {
                        let base = bytes_to_utf16(bytes);
                        for (i, code) in codes.enumerate() {
                            let mut chars = base.clone();
                            if let Some(last) = chars.last_mut() {
                                *last = last.wrapping_add(i as u16);
                            }
                            cmap.unicode.insert(code, chars);
                        }
                    },
                    _ => log::warn!("CMap: malformed bfrange destination"),
                }
            }
        },
        "cidchar" => {
            for pair in operands.chunks(2) {
                let [Operand::Str(src), Operand::Int(cid)] = pair else {
                    log::warn!("CMap: malformed cidchar entry");
                    continue;
                };
                match u32::try_from(*cid) {
                    Ok(cid) => {
                        cmap.cids.insert(CharCode::from_bytes(src), cid);
                    },
                    Err(_) => log::warn!("CMap: cidchar with invalid CID {}", cid),
                }
            }
        },
        "cidrange" => {
            for triple in operands.chunks(3) {
                let [Operand::Str(lo), Operand::Str(hi), Operand::Int(cid)] = triple else {
                    log::warn!("CMap: malformed cidrange entry");
                    continue;
                };
                let Ok(start) = u32::try_from(*cid) else {
                    log::warn!("CMap: cidrange with invalid start CID {}", cid);
                    continue;
                };
                let Some(codes) = range_codes(lo, hi) else {
                    continue;
                };
                for (i, code) in codes.enumerate() {
                    let Some(cid) = u32::try_from(i).ok().and_then(|i| start.checked_add(i)) else {
                        log::warn!("CMap: cidrange from CID {} overflows at {}", start, code);
                        break;
                    };
                    cmap.cids.insert(code, cid);
                }
            }
        },
        // notdef mappings all resolve to CID 0, which is the fallback anyway
        _ => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tounicode_program() {
        let src = b"/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n\
            /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
            /CMapName /Adobe-Identity-UCS def\n/CMapType 2 def\n\
            1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n\
            2 beginbfchar\n<0003> <0020>\n<0024> <0041>\nendbfchar\n\
            endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n";
        let cmap = parse_cmap(src).unwrap();
        assert_eq!(cmap.name.as_deref(), Some("Adobe-Identity-UCS"));
        assert_eq!(cmap.registry.as_deref(), Some("Adobe"));
        assert_eq!(cmap.ordering.as_deref(), Some("UCS"));
        assert_eq!(cmap.codespace, vec![CodespaceRange::two_byte()]);
        assert_eq!(cmap.unicode.get(&CharCode::new(0x24, 2)), Some(&vec![0x41]));
        assert_eq!(cmap.unicode.len(), 2);
    }

    #[test]
    fn test_bfrange_increments_destination() {
        let cmap = parse_cmap(b"1 beginbfrange <20> <22> <0041> endbfrange").unwrap();
        assert_eq!(cmap.unicode.get(&CharCode::new(0x20, 1)), Some(&vec![0x41]));
        assert_eq!(cmap.unicode.get(&CharCode::new(0x22, 1)), Some(&vec![0x43]));
    }

    #[test]
    fn test_bfrange_increments_low_unit_of_surrogate_pair() {
        let cmap = parse_cmap(b"1 beginbfrange <01> <02> <D835DF0C> endbfrange").unwrap();
        assert_eq!(cmap.unicode.get(&CharCode::new(2, 1)), Some(&vec![0xD835, 0xDF0D]));
    }

    #[test]
    fn test_bfrange_array_destination() {
        let cmap = parse_cmap(b"1 beginbfrange <005F> <0061> [<00660066> <00660069> /f_f_l] endbfrange")
            .unwrap();
        assert_eq!(cmap.unicode.get(&CharCode::new(0x5F, 2)), Some(&vec![0x66, 0x66]));
        assert_eq!(cmap.unicode.get(&CharCode::new(0x60, 2)), Some(&vec![0x66, 0x69]));
        assert_eq!(cmap.unicode.get(&CharCode::new(0x61, 2)), Some(&vec![0x66, 0x66, 0x6C]));
    }

    #[test]
    fn test_bfchar_glyph_name_destination() {
        let cmap = parse_cmap(b"1 beginbfchar <01> /Euro endbfchar").unwrap();
        assert_eq!(cmap.unicode.get(&CharCode::new(1, 1)), Some(&vec![0x20AC]));
    }

    #[test]
    fn test_cid_blocks_and_usecmap() {
        let src = b"/CIDSystemInfo 3 dict dup begin\n/Registry (Adobe) def\n/Ordering (Japan1) def\n\
            /Supplement 6 def\nend def\n/CMapName /UniJIS-UCS2-V def\n/WMode 1 def\n\
            /UniJIS-UCS2-H usecmap\n\
            2 begincidchar\n<FF08> 7887\n<FF09> 7888\nendcidchar\n\
            1 begincidrange\n<0020> <0022> 1\nendcidrange\n";
        let cmap = parse_cmap(src).unwrap();
        assert_eq!(cmap.ordering.as_deref(), Some("Japan1"));
        assert_eq!(cmap.supplement, 6);
        assert_eq!(cmap.wmode, 1);
        assert_eq!(cmap.usecmap.as_deref(), Some("UniJIS-UCS2-H"));
        assert_eq!(cmap.cids.get(&CharCode::new(0xFF08, 2)), Some(&7887));
        assert_eq!(cmap.cids.get(&CharCode::new(0x22, 2)), Some(&3));
    }

    #[test]
    fn test_merge_parent() {
        let mut child = parse_cmap(b"1 begincidchar <0041> 99 endcidchar").unwrap();
        let parent = parse_cmap(
            b"/Registry (Adobe) def /Ordering (GB1) def 1 begincodespacerange <0000> <FFFF> endcodespacerange \
              1 begincidrange <0041> <0042> 34 endcidrange",
        )
        .unwrap();
        child.merge_parent(&parent);
        assert_eq!(child.cids.get(&CharCode::new(0x41, 2)), Some(&99));
        assert_eq!(child.cids.get(&CharCode::new(0x42, 2)), Some(&35));
        assert_eq!(child.codespace.len(), 1);
        assert_eq!(child.ordering.as_deref(), Some("GB1"));
    }

    #[test]
    fn test_lenient_on_garbage_and_procedures() {
        let src = b"{ dup 0 get } bind def \xFF) 1 beginbfchar <41> <0042> endbfchar";
        let cmap = parse_cmap(src).unwrap();
        assert_eq!(cmap.unicode.get(&CharCode::new(0x41, 1)), Some(&vec![0x42]));
    }

    #[test]
    fn test_unterminated_block_is_error() {
        let err = parse_cmap(b"1 beginbfchar <41> <0042>").unwrap_err();
        assert!(format!("{}", err).contains("beginbfchar"));
    }

    #[test]
    fn test_huge_range_is_capped() {
        let cmap = parse_cmap(b"1 begincidrange <00000000> <0001FFFF> 0 endcidrange").unwrap();
        assert_eq!(cmap.cids.len(), MAX_RANGE_ENTRIES as usize);
    }

    #[test]
    fn test_invalid_cid_ranges_are_skipped() {
        let cmap = parse_cmap(b"1 begincidrange <00> <01> -1 endcidrange").unwrap();
        assert!(cmap.cids.is_empty());

        let cmap = parse_cmap(b"1 begincidrange <00> <03> 4294967294 endcidrange").unwrap();
        assert_eq!(cmap.cids.len(), 2);
        assert_eq!(cmap.cids.get(&CharCode::new(1, 1)), Some(&u32::MAX));
        assert!(cmap.cids.get(&CharCode::new(2, 1)).is_none());

        let cmap = parse_cmap(b"2 begincidchar <20> -5 <21> 7 endcidchar").unwrap();
        assert_eq!(cmap.cids.len(), 1);
        assert_eq!(cmap.cids.get(&CharCode::new(0x21, 1)), Some(&7));
    }

    #[test]
    fn test_bytes_to_utf16() {
        assert_eq!(bytes_to_utf16(&[0x41]), vec![0x41]);
        assert_eq!(bytes_to_utf16(&[0x00, 0x41, 0x00, 0x42]), vec![0x41, 0x42]);
        assert_eq!(bytes_to_utf16(&[0x00, 0x41, 0x42]), vec![0x41, 0x42]);
    }
}
