//! Single-byte base encodings.
//!
//! Each table maps a byte code to a Unicode value; `0` marks an unassigned
//! code. WinAnsi and MacRoman follow the Windows-1252 and Mac OS Roman
//! character sets, Standard/Symbol/ZapfDingbats follow the Adobe font
//! encodings (PDF 32000-1:2008, Annex D).

/// Named single-byte encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseEncoding {
    /// Adobe StandardEncoding
    Standard,
    /// WinAnsiEncoding (Windows code page 1252)
    WinAnsi,
    /// MacRomanEncoding
    MacRoman,
    /// Built-in encoding of the Symbol font
    Symbol,
    /// Built-in encoding of the ZapfDingbats font
    ZapfDingbats,
}

impl BaseEncoding {
    /// Resolve a PDF encoding name; unknown or empty names give `Standard`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "WinAnsiEncoding" | "WinAnsi" | "Cp1252" => BaseEncoding::WinAnsi,
            "MacRomanEncoding" | "MacRoman" => BaseEncoding::MacRoman,
            "Symbol" | "SymbolEncoding" => BaseEncoding::Symbol,
            "ZapfDingbats" | "ZapfDingbatsEncoding" => BaseEncoding::ZapfDingbats,
            _ => BaseEncoding::Standard,
        }
    }

    /// The `/Encoding` name for this base, if PDF defines one.
    pub fn pdf_name(&self) -> Option<&'static str> {
        match self {
            BaseEncoding::WinAnsi => Some("WinAnsiEncoding"),
            BaseEncoding::MacRoman => Some("MacRomanEncoding"),
            BaseEncoding::Standard => Some("StandardEncoding"),
            BaseEncoding::Symbol | BaseEncoding::ZapfDingbats => None,
        }
    }

    /// Whether the encoding can be written as a plain `/Encoding` name.
    ///
    /// Only WinAnsi and MacRoman qualify; everything else is expressed
    /// through `/Differences`.
    pub fn is_pdf_named(&self) -> bool {
        matches!(self, BaseEncoding::WinAnsi | BaseEncoding::MacRoman)
    }

    /// The 256-entry code to Unicode table.
    pub fn table(&self) -> &'static [u16; 256] {
        match self {
            BaseEncoding::Standard => &STANDARD,
            BaseEncoding::WinAnsi => &WIN_ANSI,
            BaseEncoding::MacRoman => &MAC_ROMAN,
            BaseEncoding::Symbol => &SYMBOL,
            BaseEncoding::ZapfDingbats => &ZAPF_DINGBATS,
        }
    }

    /// Unicode value of `code`.
    pub fn unicode(&self, code: u8) -> Option<u32> {
        match self.table()[code as usize] {
            0 => None,
            u => Some(u as u32),
        }
    }
}

const fn build(ascii: bool, overrides: &[(u8, u16)]) -> [u16; 256] {
    let mut t = [0u16; 256];
    if ascii {
        let mut c = 0x20;
        while c < 0x7F {
            t[c] = c as u16;
            c += 1;
        }
    }
    let mut i = 0;
    while i < overrides.len() {
        t[overrides[i].0 as usize] = overrides[i].1;
        i += 1;
    }
    t
}

const fn with_range(mut t: [u16; 256], from: u8, to: u8, first: u16) -> [u16; 256] {
    let mut c = from as usize;
    while c <= to as usize {
        t[c] = first + (c - from as usize) as u16;
        c += 1;
    }
    t
}

#[rustfmt::skip]
static STANDARD: [u16; 256] = build(
    true,
    &[
        (0x27, 0x2019), (0x60, 0x2018),
        (0xA1, 0x00A1), (0xA2, 0x00A2), (0xA3, 0x00A3), (0xA4, 0x2044), (0xA5, 0x00A5),
        (0xA6, 0x0192), (0xA7, 0x00A7), (0xA8, 0x00A4), (0xA9, 0x0027), (0xAA, 0x201C),
        (0xAB, 0x00AB), (0xAC, 0x2039), (0xAD, 0x203A), (0xAE, 0xFB01), (0xAF, 0xFB02),
        (0xB1, 0x2013), (0xB2, 0x2020), (0xB3, 0x2021), (0xB4, 0x00B7), (0xB6, 0x00B6),
        (0xB7, 0x2022), (0xB8, 0x201A), (0xB9, 0x201E), (0xBA, 0x201D), (0xBB, 0x00BB),
        (0xBC, 0x2026), (0xBD, 0x2030), (0xBF, 0x00BF),
        (0xC1, 0x0060), (0xC2, 0x00B4), (0xC3, 0x02C6), (0xC4, 0x02DC), (0xC5, 0x00AF),
        (0xC6, 0x02D8), (0xC7, 0x02D9), (0xC8, 0x00A8), (0xCA, 0x02DA), (0xCB, 0x00B8),
        (0xCD, 0x02DD), (0xCE, 0x02DB), (0xCF, 0x02C7),
        (0xD0, 0x2014),
        (0xE1, 0x00C6), (0xE3, 0x00AA), (0xE8, 0x0141), (0xE9, 0x00D8), (0xEA, 0x0152),
        (0xEB, 0x00BA),
        (0xF1, 0x00E6), (0xF5, 0x0131), (0xF8, 0x0142), (0xF9, 0x00F8), (0xFA, 0x0153),
        (0xFB, 0x00DF),
    ],
);

#[rustfmt::skip]
static WIN_ANSI: [u16; 256] = with_range(
    build(
        true,
        &[
            (0x80, 0x20AC), (0x82, 0x201A), (0x83, 0x0192), (0x84, 0x201E), (0x85, 0x2026),
            (0x86, 0x2020), (0x87, 0x2021), (0x88, 0x02C6), (0x89, 0x2030), (0x8A, 0x0160),
            (0x8B, 0x2039), (0x8C, 0x0152), (0x8E, 0x017D),
            (0x91, 0x2018), (0x92, 0x2019), (0x93, 0x201C), (0x94, 0x201D), (0x95, 0x2022),
            (0x96, 0x2013), (0x97, 0x2014), (0x98, 0x02DC), (0x99, 0x2122), (0x9A, 0x0161),
            (0x9B, 0x203A), (0x9C, 0x0153), (0x9E, 0x017E), (0x9F, 0x0178),
        ],
    ),
    0xA0,
    0xFF,
    0x00A0,
);

#[rustfmt::skip]
static MAC_ROMAN: [u16; 256] = build(
    true,
    &[
        (0x80, 0x00C4), (0x81, 0x00C5), (0x82, 0x00C7), (0x83, 0x00C9), (0x84, 0x00D1),
        (0x85, 0x00D6), (0x86, 0x00DC), (0x87, 0x00E1), (0x88, 0x00E0), (0x89, 0x00E2),
        (0x8A, 0x00E4), (0x8B, 0x00E3), (0x8C, 0x00E5), (0x8D, 0x00E7), (0x8E, 0x00E9),
        (0x8F, 0x00E8),
        (0x90, 0x00EA), (0x91, 0x00EB), (0x92, 0x00ED), (0x93, 0x00EC), (0x94, 0x00EE),
        (0x95, 0x00EF), (0x96, 0x00F1), (0x97, 0x00F3), (0x98, 0x00F2), (0x99, 0x00F4),
        (0x9A, 0x00F6), (0x9B, 0x00F5), (0x9C, 0x00FA), (0x9D, 0x00F9), (0x9E, 0x00FB),
        (0x9F, 0x00FC),
        (0xA0, 0x2020), (0xA1, 0x00B0), (0xA2, 0x00A2), (0xA3, 0x00A3), (0xA4, 0x00A7),
        (0xA5, 0x2022), (0xA6, 0x00B6), (0xA7, 0x00DF), (0xA8, 0x00AE), (0xA9, 0x00A9),
        (0xAA, 0x2122), (0xAB, 0x00B4), (0xAC, 0x00A8), (0xAD, 0x2260), (0xAE, 0x00C6),
        (0xAF, 0x00D8),
        (0xB0, 0x221E), (0xB1, 0x00B1), (0xB2, 0x2264), (0xB3, 0x2265), (0xB4, 0x00A5),
        (0xB5, 0x00B5), (0xB6, 0x2202), (0xB7, 0x2211), (0xB8, 0x220F), (0xB9, 0x03C0),
        (0xBA, 0x222B), (0xBB, 0x00AA), (0xBC, 0x00BA), (0xBD, 0x03A9), (0xBE, 0x00E6),
        (0xBF, 0x00F8),
        (0xC0, 0x00BF), (0xC1, 0x00A1), (0xC2, 0x00AC), (0xC3, 0x221A), (0xC4, 0x0192),
        (0xC5, 0x2248), (0xC6, 0x2206), (0xC7, 0x00AB), (0xC8, 0x00BB), (0xC9, 0x2026),
        (0xCA, 0x00A0), (0xCB, 0x00C0), (0xCC, 0x00C3), (0xCD, 0x00D5), (0xCE, 0x0152),
        (0xCF, 0x0153),
        (0xD0, 0x2013), (0xD1, 0x2014), (0xD2, 0x201C), (0xD3, 0x201D), (0xD4, 0x2018),
        (0xD5, 0x2019), (0xD6, 0x00F7), (0xD7, 0x25CA), (0xD8, 0x00FF), (0xD9, 0x0178),
        (0xDA, 0x2044), (0xDB, 0x20AC), (0xDC, 0x2039), (0xDD, 0x203A), (0xDE, 0xFB01),
        (0xDF, 0xFB02),
        (0xE0, 0x2021), (0xE1, 0x00B7), (0xE2, 0x201A), (0xE3, 0x201E), (0xE4, 0x2030),
        (0xE5, 0x00C2), (0xE6, 0x00CA), (0xE7, 0x00C1), (0xE8, 0x00CB), (0xE9, 0x00C8),
        (0xEA, 0x00CD), (0xEB, 0x00CE), (0xEC, 0x00CF), (0xED, 0x00CC), (0xEE, 0x00D3),
        (0xEF, 0x00D4),
        (0xF0, 0xF8FF), (0xF1, 0x00D2), (0xF2, 0x00DA), (0xF3, 0x00DB), (0xF4, 0x00D9),
        (0xF5, 0x0131), (0xF6, 0x02C6), (0xF7, 0x02DC), (0xF8, 0x00AF), (0xF9, 0x02D8),
        (0xFA, 0x02D9), (0xFB, 0x02DA), (0xFC, 0x00B8), (0xFD, 0x02DD), (0xFE, 0x02DB),
        (0xFF, 0x02C7),
    ],
);

#[rustfmt::skip]
static SYMBOL: [u16; 256] = build(
    true,
    &[
        (0x22, 0x2200), (0x24, 0x2203), (0x27, 0x220B), (0x2A, 0x2217), (0x2D, 0x2212),
        (0x40, 0x2245), (0x41, 0x0391), (0x42, 0x0392), (0x43, 0x03A7), (0x44, 0x0394),
        (0x45, 0x0395), (0x46, 0x03A6), (0x47, 0x0393), (0x48, 0x0397), (0x49, 0x0399),
        (0x4A, 0x03D1), (0x4B, 0x039A), (0x4C, 0x039B), (0x4D, 0x039C), (0x4E, 0x039D),
        (0x4F, 0x039F), (0x50, 0x03A0), (0x51, 0x0398), (0x52, 0x03A1), (0x53, 0x03A3),
        (0x54, 0x03A4), (0x55, 0x03A5), (0x56, 0x03C2), (0x57, 0x03A9), (0x58, 0x039E),
        (0x59, 0x03A8), (0x5A, 0x0396), (0x5C, 0x2234), (0x5E, 0x22A5), (0x60, 0xF8E5),
        (0x61, 0x03B1), (0x62, 0x03B2), (0x63, 0x03C7), (0x64, 0x03B4), (0x65, 0x03B5),
        (0x66, 0x03C6), (0x67, 0x03B3), (0x68, 0x03B7), (0x69, 0x03B9), (0x6A, 0x03D5),
        (0x6B, 0x03BA), (0x6C, 0x03BB), (0x6D, 0x03BC), (0x6E, 0x03BD), (0x6F, 0x03BF),
        (0x70, 0x03C0), (0x71, 0x03B8), (0x72, 0x03C1), (0x73, 0x03C3), (0x74, 0x03C4),
        (0x75, 0x03C5), (0x76, 0x03D6), (0x77, 0x03C9), (0x78, 0x03BE), (0x79, 0x03C8),
        (0x7A, 0x03B6), (0x7E, 0x223C),
        (0xA0, 0x20AC), (0xA1, 0x03D2), (0xA2, 0x2032), (0xA3, 0x2264), (0xA4, 0x2044),
        (0xA5, 0x221E), (0xA6, 0x0192), (0xA7, 0x2663), (0xA8, 0x2666), (0xA9, 0x2665),
        (0xAA, 0x2660), (0xAB, 0x2194), (0xAC, 0x2190), (0xAD, 0x2191), (0xAE, 0x2192),
        (0xAF, 0x2193),
        (0xB0, 0x00B0), (0xB1, 0x00B1), (0xB2, 0x2033), (0xB3, 0x2265), (0xB4, 0x00D7),
        (0xB5, 0x221D), (0xB6, 0x2202), (0xB7, 0x2022), (0xB8, 0x00F7), (0xB9, 0x2260),
        (0xBA, 0x2261), (0xBB, 0x2248), (0xBC, 0x2026), (0xBD, 0xF8E6), (0xBE, 0xF8E7),
        (0xBF, 0x21B5),
        (0xC0, 0x2135), (0xC1, 0x2111), (0xC2, 0x211C), (0xC3, 0x2118), (0xC4, 0x2297),
        (0xC5, 0x2295), (0xC6, 0x2205), (0xC7, 0x2229), (0xC8, 0x222A), (0xC9, 0x2283),
        (0xCA, 0x2287), (0xCB, 0x2284), (0xCC, 0x2282), (0xCD, 0x2286), (0xCE, 0x2208),
        (0xCF, 0x2209),
        (0xD0, 0x2220), (0xD1, 0x2207), (0xD2, 0xF6DA), (0xD3, 0xF6D9), (0xD4, 0xF6DB),
        (0xD5, 0x220F), (0xD6, 0x221A), (0xD7, 0x22C5), (0xD8, 0x00AC), (0xD9, 0x2227),
        (0xDA, 0x2228), (0xDB, 0x21D4), (0xDC, 0x21D0), (0xDD, 0x21D1), (0xDE, 0x21D2),
        (0xDF, 0x21D3),
        (0xE0, 0x25CA), (0xE1, 0x2329), (0xE2, 0xF8E8), (0xE3, 0xF8E9), (0xE4, 0xF8EA),
        (0xE5, 0x2211), (0xE6, 0xF8EB), (0xE7, 0xF8EC), (0xE8, 0xF8ED), (0xE9, 0xF8EE),
        (0xEA, 0xF8EF), (0xEB, 0xF8F0), (0xEC, 0xF8F1), (0xED, 0xF8F2), (0xEE, 0xF8F3),
        (0xEF, 0xF8F4),
        (0xF1, 0x232A), (0xF2, 0x222B), (0xF3, 0x2320), (0xF4, 0xF8F5), (0xF5, 0x2321),
        (0xF6, 0xF8F6), (0xF7, 0xF8F7), (0xF8, 0xF8F8), (0xF9, 0xF8F9), (0xFA, 0xF8FA),
        (0xFB, 0xF8FB), (0xFC, 0xF8FC), (0xFD, 0xF8FD), (0xFE, 0xF8FE),
    ],
);

/// Dingbats occupy U+2700 onwards, offset from the byte code, with a few
/// glyphs borrowed from other Unicode blocks.
static ZAPF_DINGBATS: [u16; 256] = {
    let t = with_range([0u16; 256], 0x21, 0x7E, 0x2701);
    let t = with_range(t, 0x80, 0x8D, 0x2768);
    let t = with_range(t, 0xA1, 0xA7, 0x2761);
    let t = with_range(t, 0xAC, 0xB5, 0x2460);
    let t = with_range(t, 0xB6, 0xBF, 0x2776);
    let t = with_range(t, 0xC0, 0xC9, 0x2780);
    let t = with_range(t, 0xCA, 0xD3, 0x278A);
    let t = with_range(t, 0xD8, 0xDF, 0x2798);
    let t = with_range(t, 0xE0, 0xEF, 0x27A0);
    let mut t = with_range(t, 0xF1, 0xFE, 0x27B1);
    t[0x20] = 0x0020;
    t[0x25] = 0x260E;
    t[0x2A] = 0x261B;
    t[0x2B] = 0x261E;
    t[0x48] = 0x2605;
    t[0x6C] = 0x25CF;
    t[0x6E] = 0x25A0;
    t[0x73] = 0x25B2;
    t[0x74] = 0x25BC;
    t[0x75] = 0x25C6;
    t[0x77] = 0x25D7;
    t[0xA8] = 0x2663;
    t[0xA9] = 0x2666;
    t[0xAA] = 0x2665;
    t[0xAB] = 0x2660;
    t[0xD4] = 0x2794;
    t[0xD5] = 0x2192;
    t[0xD6] = 0x2194;
    t[0xD7] = 0x2195;
    t
};
