//! Adobe glyph names.
//!
//! Covers every name used by the Standard, WinAnsi, MacRoman and Symbol
//! encodings plus Latin Extended-A and common ligatures. Names outside the
//! table are resolved algorithmically (`uniXXXX`, `uXXXX[XX]`, `a_b`
//! ligatures, `.suffix` variants). Unicode values without a table name get
//! a synthetic `uniXXXX` name so every character can appear in a
//! `/Differences` array.

use lazy_static::lazy_static;
use phf::phf_map;
use std::borrow::Cow;
use std::collections::HashMap;

/// Name of the notdef glyph.
pub const NOTDEF: &str = ".notdef";

static GLYPH_LIST: phf::Map<&'static str, u32> = phf_map! {
    "space" => 0x0020, "exclam" => 0x0021, "quotedbl" => 0x0022, "numbersign" => 0x0023,
    "dollar" => 0x0024, "percent" => 0x0025, "ampersand" => 0x0026, "quotesingle" => 0x0027,
    "parenleft" => 0x0028, "parenright" => 0x0029, "asterisk" => 0x002A, "plus" => 0x002B,
    "comma" => 0x002C, "hyphen" => 0x002D, "period" => 0x002E, "slash" => 0x002F,
    "zero" => 0x0030, "one" => 0x0031, "two" => 0x0032, "three" => 0x0033,
    "four" => 0x0034, "five" => 0x0035, "six" => 0x0036, "seven" => 0x0037,
    "eight" => 0x0038, "nine" => 0x0039, "colon" => 0x003A, "semicolon" => 0x003B,
    "less" => 0x003C, "equal" => 0x003D, "greater" => 0x003E, "question" => 0x003F,
    "at" => 0x0040,
    "A" => 0x0041, "B" => 0x0042, "C" => 0x0043, "D" => 0x0044, "E" => 0x0045,
    "F" => 0x0046, "G" => 0x0047, "H" => 0x0048, "I" => 0x0049, "J" => 0x004A,
    "K" => 0x004B, "L" => 0x004C, "M" => 0x004D, "N" => 0x004E, "O" => 0x004F,
    "P" => 0x0050, "Q" => 0x0051, "R" => 0x0052, "S" => 0x0053, "T" => 0x0054,
    "U" => 0x0055, "V" => 0x0056, "W" => 0x0057, "X" => 0x0058, "Y" => 0x0059,
    "Z" => 0x005A,
    "bracketleft" => 0x005B, "backslash" => 0x005C, "bracketright" => 0x005D,
    "asciicircum" => 0x005E, "underscore" => 0x005F, "grave" => 0x0060,
    "a" => 0x0061, "b" => 0x0062, "c" => 0x0063, "d" => 0x0064, "e" => 0x0065,
    "f" => 0x0066, "g" => 0x0067, "h" => 0x0068, "i" => 0x0069, "j" => 0x006A,
    "k" => 0x006B, "l" => 0x006C, "m" => 0x006D, "n" => 0x006E, "o" => 0x006F,
    "p" => 0x0070, "q" => 0x0071, "r" => 0x0072, "s" => 0x0073, "t" => 0x0074,
    "u" => 0x0075, "v" => 0x0076, "w" => 0x0077, "x" => 0x0078, "y" => 0x0079,
    "z" => 0x007A,
    "braceleft" => 0x007B, "bar" => 0x007C, "braceright" => 0x007D, "asciitilde" => 0x007E,

    // Latin-1 supplement
    "nbspace" => 0x00A0, "exclamdown" => 0x00A1, "cent" => 0x00A2, "sterling" => 0x00A3,
    "currency" => 0x00A4, "yen" => 0x00A5, "brokenbar" => 0x00A6, "section" => 0x00A7,
    "dieresis" => 0x00A8, "copyright" => 0x00A9, "ordfeminine" => 0x00AA,
    "guillemotleft" => 0x00AB, "logicalnot" => 0x00AC, "sfthyphen" => 0x00AD,
    "registered" => 0x00AE, "macron" => 0x00AF, "degree" => 0x00B0, "plusminus" => 0x00B1,
    "twosuperior" => 0x00B2, "threesuperior" => 0x00B3, "acute" => 0x00B4, "mu" => 0x00B5,
    "paragraph" => 0x00B6, "periodcentered" => 0x00B7, "cedilla" => 0x00B8,
    "onesuperior" => 0x00B9, "ordmasculine" => 0x00BA, "guillemotright" => 0x00BB,
    "onequarter" => 0x00BC, "onehalf" => 0x00BD, "threequarters" => 0x00BE,
    "questiondown" => 0x00BF,
    "Agrave" => 0x00C0, "Aacute" => 0x00C1, "Acircumflex" => 0x00C2, "Atilde" => 0x00C3,
    "Adieresis" => 0x00C4, "Aring" => 0x00C5, "AE" => 0x00C6, "Ccedilla" => 0x00C7,
    "Egrave" => 0x00C8, "Eacute" => 0x00C9, "Ecircumflex" => 0x00CA, "Edieresis" => 0x00CB,
    "Igrave" => 0x00CC, "Iacute" => 0x00CD, "Icircumflex" => 0x00CE, "Idieresis" => 0x00CF,
    "Eth" => 0x00D0, "Ntilde" => 0x00D1, "Ograve" => 0x00D2, "Oacute" => 0x00D3,
    "Ocircumflex" => 0x00D4, "Otilde" => 0x00D5, "Odieresis" => 0x00D6, "multiply" => 0x00D7,
    "Oslash" => 0x00D8, "Ugrave" => 0x00D9, "Uacute" => 0x00DA, "Ucircumflex" => 0x00DB,
    "Udieresis" => 0x00DC, "Yacute" => 0x00DD, "Thorn" => 0x00DE, "germandbls" => 0x00DF,
    "agrave" => 0x00E0, "aacute" => 0x00E1, "acircumflex" => 0x00E2, "atilde" => 0x00E3,
    "adieresis" => 0x00E4, "aring" => 0x00E5, "ae" => 0x00E6, "ccedilla" => 0x00E7,
    "egrave" => 0x00E8, "eacute" => 0x00E9, "ecircumflex" => 0x00EA, "edieresis" => 0x00EB,
    "igrave" => 0x00EC, "iacute" => 0x00ED, "icircumflex" => 0x00EE, "idieresis" => 0x00EF,
    "eth" => 0x00F0, "ntilde" => 0x00F1, "ograve" => 0x00F2, "oacute" => 0x00F3,
    "ocircumflex" => 0x00F4, "otilde" => 0x00F5, "odieresis" => 0x00F6, "divide" => 0x00F7,
    "oslash" => 0x00F8, "ugrave" => 0x00F9, "uacute" => 0x00FA, "ucircumflex" => 0x00FB,
    "udieresis" => 0x00FC, "yacute" => 0x00FD, "thorn" => 0x00FE, "ydieresis" => 0x00FF,

    // Latin Extended-A
    "Amacron" => 0x0100, "amacron" => 0x0101, "Abreve" => 0x0102, "abreve" => 0x0103,
    "Aogonek" => 0x0104, "aogonek" => 0x0105, "Cacute" => 0x0106, "cacute" => 0x0107,
    "Ccircumflex" => 0x0108, "ccircumflex" => 0x0109, "Cdotaccent" => 0x010A,
    "cdotaccent" => 0x010B, "Ccaron" => 0x010C, "ccaron" => 0x010D, "Dcaron" => 0x010E,
    "dcaron" => 0x010F, "Dcroat" => 0x0110, "dcroat" => 0x0111, "Emacron" => 0x0112,
    "emacron" => 0x0113, "Ebreve" => 0x0114, "ebreve" => 0x0115, "Edotaccent" => 0x0116,
    "edotaccent" => 0x0117, "Eogonek" => 0x0118, "eogonek" => 0x0119, "Ecaron" => 0x011A,
    "ecaron" => 0x011B, "Gcircumflex" => 0x011C, "gcircumflex" => 0x011D, "Gbreve" => 0x011E,
    "gbreve" => 0x011F, "Gdotaccent" => 0x0120, "gdotaccent" => 0x0121,
    "Gcommaaccent" => 0x0122, "gcommaaccent" => 0x0123, "Hcircumflex" => 0x0124,
    "hcircumflex" => 0x0125, "Hbar" => 0x0126, "hbar" => 0x0127, "Itilde" => 0x0128,
    "itilde" => 0x0129, "Imacron" => 0x012A, "imacron" => 0x012B, "Ibreve" => 0x012C,
    "ibreve" => 0x012D, "Iogonek" => 0x012E, "iogonek" => 0x012F, "Idotaccent" => 0x0130,
    "dotlessi" => 0x0131, "IJ" => 0x0132, "ij" => 0x0133, "Jcircumflex" => 0x0134,
    "jcircumflex" => 0x0135, "Kcommaaccent" => 0x0136, "kcommaaccent" => 0x0137,
    "kgreenlandic" => 0x0138, "Lacute" => 0x0139, "lacute" => 0x013A,
    "Lcommaaccent" => 0x013B, "lcommaaccent" => 0x013C, "Lcaron" => 0x013D,
    "lcaron" => 0x013E, "Ldot" => 0x013F, "ldot" => 0x0140, "Lslash" => 0x0141,
    "lslash" => 0x0142, "Nacute" => 0x0143, "nacute" => 0x0144, "Ncommaaccent" => 0x0145,
    "ncommaaccent" => 0x0146, "Ncaron" => 0x0147, "ncaron" => 0x0148,
    "napostrophe" => 0x0149, "Eng" => 0x014A, "eng" => 0x014B, "Omacron" => 0x014C,
    "omacron" => 0x014D, "Obreve" => 0x014E, "obreve" => 0x014F,
    "Ohungarumlaut" => 0x0150, "ohungarumlaut" => 0x0151, "OE" => 0x0152, "oe" => 0x0153,
    "Racute" => 0x0154, "racute" => 0x0155, "Rcommaaccent" => 0x0156,
    "rcommaaccent" => 0x0157, "Rcaron" => 0x0158, "rcaron" => 0x0159, "Sacute" => 0x015A,
    "sacute" => 0x015B, "Scircumflex" => 0x015C, "scircumflex" => 0x015D,
    "Scedilla" => 0x015E, "scedilla" => 0x015F, "Scaron" => 0x0160, "scaron" => 0x0161,
    "Tcommaaccent" => 0x0162, "tcommaaccent" => 0x0163, "Tcaron" => 0x0164,
    "tcaron" => 0x0165, "Tbar" => 0x0166, "tbar" => 0x0167, "Utilde" => 0x0168,
    "utilde" => 0x0169, "Umacron" => 0x016A, "umacron" => 0x016B, "Ubreve" => 0x016C,
    "ubreve" => 0x016D, "Uring" => 0x016E, "uring" => 0x016F, "Uhungarumlaut" => 0x0170,
    "uhungarumlaut" => 0x0171, "Uogonek" => 0x0172, "uogonek" => 0x0173,
    "Wcircumflex" => 0x0174, "wcircumflex" => 0x0175, "Ycircumflex" => 0x0176,
    "ycircumflex" => 0x0177, "Ydieresis" => 0x0178, "Zacute" => 0x0179, "zacute" => 0x017A,
    "Zdotaccent" => 0x017B, "zdotaccent" => 0x017C, "Zcaron" => 0x017D, "zcaron" => 0x017E,
    "longs" => 0x017F, "florin" => 0x0192,

    // Spacing modifiers
    "circumflex" => 0x02C6, "caron" => 0x02C7, "breve" => 0x02D8, "dotaccent" => 0x02D9,
    "ring" => 0x02DA, "ogonek" => 0x02DB, "tilde" => 0x02DC, "hungarumlaut" => 0x02DD,

    // Greek
    "Alpha" => 0x0391, "Beta" => 0x0392, "Gamma" => 0x0393, "Delta" => 0x0394,
    "Epsilon" => 0x0395, "Zeta" => 0x0396, "Eta" => 0x0397, "Theta" => 0x0398,
    "Iota" => 0x0399, "Kappa" => 0x039A, "Lambda" => 0x039B, "Mu" => 0x039C,
    "Nu" => 0x039D, "Xi" => 0x039E, "Omicron" => 0x039F, "Pi" => 0x03A0, "Rho" => 0x03A1,
    "Sigma" => 0x03A3, "Tau" => 0x03A4, "Upsilon" => 0x03A5, "Phi" => 0x03A6,
    "Chi" => 0x03A7, "Psi" => 0x03A8, "Omega" => 0x03A9,
    "alpha" => 0x03B1, "beta" => 0x03B2, "gamma" => 0x03B3, "delta" => 0x03B4,
    "epsilon" => 0x03B5, "zeta" => 0x03B6, "eta" => 0x03B7, "theta" => 0x03B8,
    "iota" => 0x03B9, "kappa" => 0x03BA, "lambda" => 0x03BB, "mugreek" => 0x03BC,
    "nu" => 0x03BD, "xi" => 0x03BE, "omicron" => 0x03BF, "pi" => 0x03C0, "rho" => 0x03C1,
    "sigma1" => 0x03C2, "sigma" => 0x03C3, "tau" => 0x03C4, "upsilon" => 0x03C5,
    "phi" => 0x03C6, "chi" => 0x03C7, "psi" => 0x03C8, "omega" => 0x03C9,
    "theta1" => 0x03D1, "Upsilon1" => 0x03D2, "phi1" => 0x03D5, "omega1" => 0x03D6,

    // General punctuation
    "figuredash" => 0x2012, "endash" => 0x2013, "emdash" => 0x2014,
    "quoteleft" => 0x2018, "quoteright" => 0x2019, "quotesinglbase" => 0x201A,
    "quotereversed" => 0x201B, "quotedblleft" => 0x201C, "quotedblright" => 0x201D,
    "quotedblbase" => 0x201E, "dagger" => 0x2020, "daggerdbl" => 0x2021,
    "bullet" => 0x2022, "onedotenleader" => 0x2024, "twodotenleader" => 0x2025,
    "ellipsis" => 0x2026, "perthousand" => 0x2030, "minute" => 0x2032, "second" => 0x2033,
    "guilsinglleft" => 0x2039, "guilsinglright" => 0x203A, "exclamdbl" => 0x203C,
    "fraction" => 0x2044, "Euro" => 0x20AC,

    // Letterlike symbols, arrows, math
    "Ifraktur" => 0x2111, "weierstrass" => 0x2118, "Rfraktur" => 0x211C,
    "trademark" => 0x2122, "Ohm" => 0x2126, "estimated" => 0x212E, "aleph" => 0x2135,
    "arrowleft" => 0x2190, "arrowup" => 0x2191, "arrowright" => 0x2192,
    "arrowdown" => 0x2193, "arrowboth" => 0x2194, "arrowupdn" => 0x2195,
    "carriagereturn" => 0x21B5, "arrowdblleft" => 0x21D0, "arrowdblup" => 0x21D1,
    "arrowdblright" => 0x21D2, "arrowdbldown" => 0x21D3, "arrowdblboth" => 0x21D4,
    "universal" => 0x2200, "partialdiff" => 0x2202, "existential" => 0x2203,
    "emptyset" => 0x2205, "increment" => 0x2206, "gradient" => 0x2207, "element" => 0x2208,
    "notelement" => 0x2209, "suchthat" => 0x220B, "product" => 0x220F,
    "summation" => 0x2211, "minus" => 0x2212, "asteriskmath" => 0x2217,
    "radical" => 0x221A, "proportional" => 0x221D, "infinity" => 0x221E,
    "orthogonal" => 0x221F, "angle" => 0x2220, "logicaland" => 0x2227,
    "logicalor" => 0x2228, "intersection" => 0x2229, "union" => 0x222A,
    "integral" => 0x222B, "therefore" => 0x2234, "similar" => 0x223C,
    "congruent" => 0x2245, "approxequal" => 0x2248, "notequal" => 0x2260,
    "equivalence" => 0x2261, "lessequal" => 0x2264, "greaterequal" => 0x2265,
    "propersubset" => 0x2282, "propersuperset" => 0x2283, "notsubset" => 0x2284,
    "reflexsubset" => 0x2286, "reflexsuperset" => 0x2287, "circleplus" => 0x2295,
    "circlemultiply" => 0x2297, "perpendicular" => 0x22A5, "dotmath" => 0x22C5,
    "house" => 0x2302, "integraltp" => 0x2320, "integralbt" => 0x2321,
    "angleleft" => 0x2329, "angleright" => 0x232A,

    // Geometric shapes and dingbat-adjacent symbols
    "filledbox" => 0x25A0, "triagup" => 0x25B2, "triagdn" => 0x25BC,
    "lozenge" => 0x25CA, "circle" => 0x25CB, "H18533" => 0x25CF, "spade" => 0x2660,
    "club" => 0x2663, "heart" => 0x2665, "diamond" => 0x2666,

    // Corporate use area (Adobe Symbol pieces)
    "radicalex" => 0xF8E5, "arrowvertex" => 0xF8E6, "arrowhorizex" => 0xF8E7,
    "registersans" => 0xF8E8, "copyrightsans" => 0xF8E9, "trademarksans" => 0xF8EA,
    "parenlefttp" => 0xF8EB, "parenleftex" => 0xF8EC, "parenleftbt" => 0xF8ED,
    "bracketlefttp" => 0xF8EE, "bracketleftex" => 0xF8EF, "bracketleftbt" => 0xF8F0,
    "bracelefttp" => 0xF8F1, "braceleftmid" => 0xF8F2, "braceleftbt" => 0xF8F3,
    "braceex" => 0xF8F4, "integralex" => 0xF8F5, "parenrighttp" => 0xF8F6,
    "parenrightex" => 0xF8F7, "parenrightbt" => 0xF8F8, "bracketrighttp" => 0xF8F9,
    "bracketrightex" => 0xF8FA, "bracketrightbt" => 0xF8FB, "bracerighttp" => 0xF8FC,
    "bracerightmid" => 0xF8FD, "bracerightbt" => 0xF8FE, "apple" => 0xF8FF,
    "copyrightserif" => 0xF6D9, "registerserif" => 0xF6DA, "trademarkserif" => 0xF6DB,

    // Ligatures
    "ff" => 0xFB00, "fi" => 0xFB01, "fl" => 0xFB02, "ffi" => 0xFB03, "ffl" => 0xFB04,
};

/// Names that share a Unicode value with a preferred name and must not win
/// the reverse lookup.
const ALIASES: &[(&str, u32)] = &[
    ("nonbreakingspace", 0x00A0),
    ("softhyphen", 0x00AD),
    ("middot", 0x00B7),
    ("Dslash", 0x0110),
    ("dmacron", 0x0111),
    ("afii00208", 0x2015),
    ("Omegagreek", 0x03A9),
    ("Deltagreek", 0x0394),
];

lazy_static! {
    static ref REVERSE_GLYPH_LIST: HashMap<u32, &'static str> = {
        let mut map = HashMap::with_capacity(GLYPH_LIST.len());
        for (name, &unicode) in GLYPH_LIST.entries() {
            // the phf iteration order is arbitrary; keep the shortest name
            // so "mu" style duplicates resolve deterministically
            map.entry(unicode)
                .and_modify(|existing: &mut &'static str| {
                    if (name.len(), *name) < (existing.len(), *existing) {
                        *existing = name;
                    }
                })
                .or_insert(*name);
        }
        map
    };
}

/// Resolve a glyph name to a single Unicode scalar.
pub fn name_to_unicode(name: &str) -> Option<u32> {
    if let Some(&unicode) = GLYPH_LIST.get(name) {
        return Some(unicode);
    }
    if let Some(&(_, unicode)) = ALIASES.iter().find(|(alias, _)| *alias == name) {
        return Some(unicode);
    }

    // Variant suffixes: "a.sc", "one.oldstyle"
    if let Some((base, _)) = name.split_once('.') {
        if !base.is_empty() {
            return name_to_unicode(base);
        }
        return None;
    }

    if let Some(hex) = name.strip_prefix("uni") {
        if hex.len() >= 4 && hex.len() % 4 == 0 {
            return parse_hex_scalar(&hex[..4]);
        }
    }
    if let Some(hex) = name.strip_prefix('u') {
        if (4..=6).contains(&hex.len()) {
            return parse_hex_scalar(hex);
        }
    }
    log::trace!("Unknown glyph name: '{}'", name);
    None
}

/// Resolve a glyph name to its full decoded text.
///
/// Handles `uniXXXXYYYY` sequences and `f_f_i` style ligature names in
/// addition to everything [`name_to_unicode`] accepts.
pub fn name_to_chars(name: &str) -> Option<Vec<u16>> {
    let base = match name.split_once('.') {
        Some((base, _)) if !base.is_empty() => base,
        _ => name,
    };

    if base.contains('_') {
        let mut out = Vec::new();
        for part in base.split('_') {
            out.extend(name_to_chars(part)?);
        }
        return Some(out);
    }

    if let Some(hex) = base.strip_prefix("uni") {
        if hex.len() > 4 && hex.len() % 4 == 0 && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            let mut out = Vec::with_capacity(hex.len() / 4);
            for i in (0..hex.len()).step_by(4) {
                out.push(u16::from_str_radix(&hex[i..i + 4], 16).ok()?);
            }
            return Some(out);
        }
    }

    let unicode = name_to_unicode(base)?;
    super::glyph::utf16_of(unicode)
}

/// Glyph name for a Unicode scalar, if the list has one.
pub fn known_name(unicode: u32) -> Option<&'static str> {
    REVERSE_GLYPH_LIST.get(&unicode).copied()
}

/// Glyph name for a Unicode scalar, synthesizing `uniXXXX` when needed.
pub fn unicode_to_name(unicode: u32) -> Cow<'static, str> {
    match known_name(unicode) {
        Some(name) => Cow::Borrowed(name),
        None if unicode <= 0xFFFF => Cow::Owned(format!("uni{:04X}", unicode)),
        None => Cow::Owned(format!("u{:X}", unicode)),
    }
}

fn parse_hex_scalar(hex: &str) -> Option<u32> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let value = u32::from_str_radix(hex, 16).ok()?;
    // surrogates are not scalar values
    char::from_u32(value).map(|c| c as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_names() {
        assert_eq!(name_to_unicode("A"), Some(0x41));
        assert_eq!(name_to_unicode("Euro"), Some(0x20AC));
        assert_eq!(name_to_unicode("quoteright"), Some(0x2019));
        assert_eq!(name_to_unicode("lslash"), Some(0x0142));
        assert_eq!(name_to_unicode(NOTDEF), None);
        assert_eq!(name_to_unicode("nosuchglyph"), None);
    }

    #[test]
    fn test_algorithmic_names() {
        assert_eq!(name_to_unicode("uni0041"), Some(0x41));
        assert_eq!(name_to_unicode("uni20AC"), Some(0x20AC));
        assert_eq!(name_to_unicode("u1F600"), Some(0x1F600));
        assert_eq!(name_to_unicode("uniD800"), None);
        assert_eq!(name_to_unicode("uniZZZZ"), None);
    }

    #[test]
    fn test_suffix_variants() {
        assert_eq!(name_to_unicode("a.sc"), Some(0x61));
        assert_eq!(name_to_unicode("one.oldstyle"), Some(0x31));
    }

    #[test]
    fn test_aliases() {
        assert_eq!(name_to_unicode("softhyphen"), Some(0xAD));
        assert_eq!(known_name(0xAD), Some("sfthyphen"));
    }

    #[test]
    fn test_name_to_chars_ligatures() {
        assert_eq!(name_to_chars("f_i"), Some(vec![0x66, 0x69]));
        assert_eq!(name_to_chars("uni00660069"), Some(vec![0x66, 0x69]));
        assert_eq!(name_to_chars("fi"), Some(vec![0xFB01]));
        assert_eq!(name_to_chars("f_nosuch"), None);
    }

    #[test]
    fn test_reverse_lookup() {
        assert_eq!(unicode_to_name(0x41), "A");
        assert_eq!(unicode_to_name(0x00E9), "eacute");
        assert_eq!(unicode_to_name(0x0416), "uni0416");
        assert_eq!(unicode_to_name(0x1F600), "u1F600");
    }

    #[test]
    fn test_reverse_is_inverse_for_known_names() {
        for unicode in 0x20u32..0x7F {
            let name = unicode_to_name(unicode);
            assert_eq!(name_to_unicode(&name), Some(unicode), "name {}", name);
        }
    }
}
