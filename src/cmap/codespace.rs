//! Codespace ranges and multi-byte code extraction.

use std::fmt;

/// A character code as read from a string: its value and byte length.
///
/// `<20>` and `<0020>` are different codes, so the length is part of the
/// identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CharCode {
    /// Number of bytes (1-4)
    pub len: u8,
    /// Big-endian value of the bytes
    pub value: u32,
}

impl CharCode {
    /// Create a code of `len` bytes.
    pub fn new(value: u32, len: u8) -> Self {
        Self { len, value }
    }

    /// Read a code from big-endian bytes (at most 4 are used).
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let bytes = &bytes[..bytes.len().min(4)];
        let value = bytes.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32);
        Self {
            len: bytes.len() as u8,
            value,
        }
    }

    /// Big-endian bytes of the code.
    pub fn to_bytes(self) -> Vec<u8> {
        (0..self.len)
            .rev()
            .map(|i| (self.value >> (8 * i as u32)) as u8)
            .collect()
    }
}

impl fmt::Display for CharCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{:0width$X}>", self.value, width = self.len as usize * 2)
    }
}

/// A `[low, high]` codespace interval of fixed byte length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodespaceRange {
    low: Vec<u8>,
    high: Vec<u8>,
}

impl CodespaceRange {
    /// Create a range; `None` unless both bounds have the same length in 1..=4.
    pub fn new(low: Vec<u8>, high: Vec<u8>) -> Option<Self> {
        if low.len() != high.len() || low.is_empty() || low.len() > 4 {
            return None;
        }
        Some(Self { low, high })
    }

    /// The one-byte range `<00>`-`<FF>`.
    pub fn one_byte() -> Self {
        Self {
            low: vec![0x00],
            high: vec![0xFF],
        }
    }

    /// The two-byte range `<0000>`-`<FFFF>`.
    pub fn two_byte() -> Self {
        Self {
            low: vec![0x00, 0x00],
            high: vec![0xFF, 0xFF],
        }
    }

    /// Byte length of codes in this range.
    pub fn code_length(&self) -> usize {
        self.low.len()
    }

    /// Lower bound bytes.
    pub fn low(&self) -> &[u8] {
        &self.low
    }

    /// Upper bound bytes.
    pub fn high(&self) -> &[u8] {
        &self.high
    }

    /// Byte-wise membership test; `bytes` must have exactly the range's length.
    pub fn matches(&self, bytes: &[u8]) -> bool {
        bytes.len() == self.low.len()
            && bytes
                .iter()
                .zip(self.low.iter().zip(&self.high))
                .all(|(b, (lo, hi))| lo <= b && b <= hi)
    }
}

/// Length of the code starting at `bytes[0]`.
///
/// Lengths 1 to 4 are tried in order and the first one that falls in any
/// range wins, even if a longer code would also match.
pub fn match_length(ranges: &[CodespaceRange], bytes: &[u8]) -> Option<usize> {
    (1..=bytes.len().min(4)).find(|&len| {
        let candidate = &bytes[..len];
        ranges.iter().any(|r| r.matches(candidate))
    })
}

/// Extract the next code from `bytes`.
///
/// Returns the code and whether it matched a codespace range. An unmatched
/// byte is consumed as a one-byte code.
pub fn next_code(ranges: &[CodespaceRange], bytes: &[u8]) -> (CharCode, bool) {
    match match_length(ranges, bytes) {
        Some(len) => (CharCode::from_bytes(&bytes[..len]), true),
        None => (CharCode::from_bytes(&bytes[..bytes.len().min(1)]), false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(low: &[u8], high: &[u8]) -> CodespaceRange {
        CodespaceRange::new(low.to_vec(), high.to_vec()).unwrap()
    }

    #[test]
    fn test_char_code_bytes() {
        let code = CharCode::from_bytes(&[0x81, 0x40]);
        assert_eq!(code, CharCode::new(0x8140, 2));
        assert_eq!(code.to_bytes(), vec![0x81, 0x40]);
        assert_eq!(code.to_string(), "<8140>");
        assert_ne!(CharCode::new(0x20, 1), CharCode::new(0x20, 2));
        assert_eq!(CharCode::new(0x20, 2).to_bytes(), vec![0x00, 0x20]);
    }

    #[test]
    fn test_range_validation() {
        assert!(CodespaceRange::new(vec![0], vec![0xFF, 0xFF]).is_none());
        assert!(CodespaceRange::new(vec![], vec![]).is_none());
        assert!(CodespaceRange::new(vec![0; 5], vec![0xFF; 5]).is_none());
        assert_eq!(CodespaceRange::two_byte().code_length(), 2);
    }

    #[test]
    fn test_bytewise_membership() {
        // Shift-JIS style range: both bytes are checked independently
        let r = range(&[0x81, 0x40], &[0x9F, 0xFC]);
        assert!(r.matches(&[0x81, 0x40]));
        assert!(r.matches(&[0x9F, 0xFC]));
        assert!(!r.matches(&[0x85, 0x20]));
        assert!(!r.matches(&[0x81]));
    }

    #[test]
    fn test_first_match_prefers_shortest() {
        let ranges = vec![range(&[0x00], &[0x80]), range(&[0x00, 0x00], &[0xFF, 0xFF])];
        assert_eq!(match_length(&ranges, &[0x41, 0x42]), Some(1));
        assert_eq!(match_length(&ranges, &[0x81, 0x42]), Some(2));
    }

    #[test]
    fn test_next_code_unmatched() {
        let ranges = vec![range(&[0x81, 0x40], &[0x9F, 0xFC])];
        let (code, matched) = next_code(&ranges, &[0x20, 0x41]);
        assert!(!matched);
        assert_eq!(code, CharCode::new(0x20, 1));

        let (code, matched) = next_code(&ranges, &[0x81, 0x41]);
        assert!(matched);
        assert_eq!(code, CharCode::new(0x8141, 2));
    }

    #[test]
    fn test_truncated_input() {
        let ranges = vec![CodespaceRange::two_byte()];
        assert_eq!(match_length(&ranges, &[0x41]), None);
        assert_eq!(next_code(&ranges, &[0x41]).0, CharCode::new(0x41, 1));
    }
}
