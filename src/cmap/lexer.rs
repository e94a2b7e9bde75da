//! CMap program tokenizer.
//!
//! CMap files and ToUnicode streams are PostScript programs. The parser
//! only needs a flat token stream: numbers, strings, names, array/dict/
//! procedure delimiters and bare operators (`begincodespacerange`, `def`,
//! `usecmap`, ...).
//!
//! Whitespace (space, \t, \r, \n, \0, \f) and comments (% to EOL) are skipped.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_till, take_while, take_while1},
    character::complete::{char, digit1, one_of},
    combinator::{map, opt, value},
    sequence::{delimited, preceded},
    IResult,
};

/// Token types recognized by the CMap lexer.
#[derive(Debug, PartialEq, Clone)]
pub enum Token<'a> {
    /// Integer number (e.g., 42, -123)
    Integer(i64),

    /// Real (floating-point) number
    Real(f64),

    /// Literal string bytes, escapes not yet decoded
    LiteralString(&'a [u8]),

    /// Hexadecimal string digits, whitespace preserved
    HexString(&'a [u8]),

    /// Name (e.g., "CMapName" from "/CMapName")
    Name(String),

    /// Array start delimiter [
    ArrayStart,

    /// Array end delimiter ]
    ArrayEnd,

    /// Dictionary start delimiter <<
    DictStart,

    /// Dictionary end delimiter >>
    DictEnd,

    /// Procedure start delimiter {
    ProcStart,

    /// Procedure end delimiter }
    ProcEnd,

    /// Bare executable name
    Operator(&'a str),
}

fn is_whitespace(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\r' | b'\n' | 0x00 | 0x0C)
}

fn is_delimiter(c: u8) -> bool {
    matches!(c, b'/' | b'%' | b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}')
}

/// Skip all whitespace and comments.
fn skip_ws(input: &[u8]) -> IResult<&[u8], ()> {
    let mut remaining = input;
    loop {
        let (rest, _) = take_while(is_whitespace)(remaining)?;
        remaining = rest;
        if remaining.first() == Some(&b'%') {
            let (rest, _) = take_till(|c| c == b'\r' || c == b'\n')(remaining)?;
            remaining = rest;
            continue;
        }
        return Ok((remaining, ()));
    }
}

/// Input remaining after leading whitespace and comments.
pub fn skip_whitespace(input: &[u8]) -> &[u8] {
    match skip_ws(input) {
        Ok((rest, _)) => rest,
        Err(_) => input,
    }
}

/// Parse an integer or real number.
///
/// The number must end at whitespace or a delimiter, so that operators
/// such as `1begin` are not split into a number and an operator.
fn parse_number(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let (rest, _) = opt(one_of("+-"))(input)?;
    let (rest, int_part) = opt(digit1)(rest)?;
    let (rest, frac_part) = opt(preceded(char('.'), opt(digit1)))(rest)?;

    if int_part.is_none() && !matches!(frac_part, Some(Some(_))) {
        return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit)));
    }
    if let Some(&next) = rest.first() {
        if !is_whitespace(next) && !is_delimiter(next) {
            return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit)));
        }
    }

    let text = std::str::from_utf8(&input[..input.len() - rest.len()])
        .map_err(|_| nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit)))?;
    let token = if frac_part.is_some() {
        let normalized = text.strip_prefix('+').unwrap_or(text);
        let normalized = if normalized.ends_with('.') {
            format!("{}0", normalized)
        } else {
            normalized.to_string()
        };
        Token::Real(normalized.parse().map_err(|_| {
            nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Float))
        })?)
    } else {
        let value: i64 = text.strip_prefix('+').unwrap_or(text).parse().map_err(|_| {
            nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit))
        })?;
        Token::Integer(value)
    };
    Ok((rest, token))
}

/// Parse a literal string enclosed in parentheses, balancing nested parens.
fn parse_literal_string(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let (remaining, _) = char('(')(input)?;
    let mut depth = 1;
    let mut pos = 0;

    while depth > 0 && pos < remaining.len() {
        match remaining[pos] {
            b'\\' => pos += 2,
            b'(' => {
                depth += 1;
                pos += 1;
            },
            b')' => {
                depth -= 1;
                pos += 1;
            },
            _ => pos += 1,
        }
    }

    if depth != 0 || pos > remaining.len() {
        return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Tag)));
    }

    Ok((&remaining[pos..], Token::LiteralString(&remaining[..pos - 1])))
}

/// Parse a hexadecimal string enclosed in angle brackets.
fn parse_hex_string(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    if input.starts_with(b"<<") {
        return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Tag)));
    }

    delimited(
        char('<'),
        map(
            take_while(|c: u8| c.is_ascii_hexdigit() || is_whitespace(c)),
            Token::HexString,
        ),
        char('>'),
    )(input)
}

/// Decode #XX escape sequences in names.
pub fn decode_name_escapes(name: &str) -> String {
    let bytes = name.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'#' && i + 2 < bytes.len() {
            let hi = (bytes[i + 1] as char).to_digit(16);
            let lo = (bytes[i + 2] as char).to_digit(16);
            if let (Some(hi), Some(lo)) = (hi, lo) {
                out.push((hi * 16 + lo) as u8);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Parse a name starting with /.
fn parse_name(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    preceded(
        char('/'),
        map(
            take_while(|c: u8| !is_whitespace(c) && !is_delimiter(c)),
            |bytes| Token::Name(decode_name_escapes(&String::from_utf8_lossy(bytes))),
        ),
    )(input)
}

fn parse_delimiter(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    alt((
        value(Token::DictStart, tag(b"<<")),
        value(Token::DictEnd, tag(b">>")),
        value(Token::ArrayStart, tag(b"[")),
        value(Token::ArrayEnd, tag(b"]")),
        value(Token::ProcStart, tag(b"{")),
        value(Token::ProcEnd, tag(b"}")),
    ))(input)
}

fn parse_operator(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let (rest, bytes) = take_while1(|c: u8| !is_whitespace(c) && !is_delimiter(c))(input)?;
    let op = std::str::from_utf8(bytes)
        .map_err(|_| nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Alpha)))?;
    Ok((rest, Token::Operator(op)))
}

/// Parse a single token, skipping leading whitespace and comments.
///
/// Order matters: `<<` before `<`, numbers before operators.
pub fn token(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let (input, _) = skip_ws(input)?;
    alt((
        parse_delimiter,
        parse_name,
        parse_number,
        parse_literal_string,
        parse_hex_string,
        parse_operator,
    ))(input)
}

/// Decode the digits of a hex string token into bytes.
///
/// Whitespace is ignored; an odd trailing digit is padded with 0.
pub fn decode_hex(digits: &[u8]) -> Vec<u8> {
    let nibbles: Vec<u8> = digits
        .iter()
        .filter_map(|&c| (c as char).to_digit(16).map(|d| d as u8))
        .collect();
    nibbles
        .chunks(2)
        .map(|pair| (pair[0] << 4) | pair.get(1).copied().unwrap_or(0))
        .collect()
}

/// Decode the escapes of a literal string token.
pub fn decode_literal(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] != b'\\' {
            out.push(raw[i]);
            i += 1;
            continue;
        }
        i += 1;
        let Some(&c) = raw.get(i) else { break };
        match c {
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0C),
            b'\r' | b'\n' => {},
            b'0'..=b'7' => {
                let mut v: u32 = 0;
                let mut n = 0;
                while n < 3 && i < raw.len() && (b'0'..=b'7').contains(&raw[i]) {
                    v = v * 8 + (raw[i] - b'0') as u32;
                    i += 1;
                    n += 1;
                }
                out.push(v as u8);
                continue;
            },
            other => out.push(other),
        }
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all(input: &[u8]) -> Vec<Token<'_>> {
        let mut out = Vec::new();
        let mut rest = input;
        while let Ok((r, t)) = token(rest) {
            out.push(t);
            rest = r;
        }
        out
    }

    #[test]
    fn test_numbers() {
        assert_eq!(token(b"42 ").unwrap().1, Token::Integer(42));
        assert_eq!(token(b"-7").unwrap().1, Token::Integer(-7));
        assert_eq!(token(b"+3").unwrap().1, Token::Integer(3));
        assert_eq!(token(b"0.5").unwrap().1, Token::Real(0.5));
        assert_eq!(token(b".25").unwrap().1, Token::Real(0.25));
        assert_eq!(token(b"2.").unwrap().1, Token::Real(2.0));
    }

    #[test]
    fn test_operator_starting_with_digit_is_not_number() {
        assert_eq!(token(b"1begin").unwrap().1, Token::Operator("1begin"));
    }

    #[test]
    fn test_hex_string_vs_dict() {
        assert_eq!(token(b"<0041>").unwrap().1, Token::HexString(b"0041"));
        assert_eq!(token(b"<< /A 1 >>").unwrap().1, Token::DictStart);
        assert_eq!(decode_hex(b"00 41"), vec![0x00, 0x41]);
        assert_eq!(decode_hex(b"4"), vec![0x40]);
    }

    #[test]
    fn test_names_and_escapes() {
        assert_eq!(token(b"/CMapName").unwrap().1, Token::Name("CMapName".to_string()));
        assert_eq!(token(b"/A#20B").unwrap().1, Token::Name("A B".to_string()));
        assert_eq!(decode_name_escapes("A#"), "A#");
    }

    #[test]
    fn test_literal_strings() {
        assert_eq!(token(b"(Adobe)").unwrap().1, Token::LiteralString(b"Adobe"));
        assert_eq!(token(b"(a(b)c)").unwrap().1, Token::LiteralString(b"a(b)c"));
        assert_eq!(decode_literal(b"a\\(b\\)\\101\\n"), b"a(b)A\n".to_vec());
        assert!(token(b"(open").is_err());
    }

    #[test]
    fn test_cmap_header_tokens() {
        let src = b"%!PS-Adobe-3.0 Resource-CMap\n/CIDInit /ProcSet findresource begin\n\
                    12 dict begin begincmap /CIDSystemInfo << /Registry (Adobe) >> def";
        let tokens = all(src);
        assert_eq!(tokens[0], Token::Name("CIDInit".to_string()));
        assert_eq!(tokens[2], Token::Operator("findresource"));
        assert_eq!(tokens[4], Token::Integer(12));
        assert_eq!(tokens[7], Token::Operator("begincmap"));
        assert_eq!(tokens[9], Token::DictStart);
        assert_eq!(tokens[12], Token::DictEnd);
        assert_eq!(tokens[13], Token::Operator("def"));
    }

    #[test]
    fn test_bfrange_line() {
        let tokens = all(b"<0000> <005E> [<0020> <0021>]");
        assert_eq!(
            tokens,
            vec![
                Token::HexString(b"0000"),
                Token::HexString(b"005E"),
                Token::ArrayStart,
                Token::HexString(b"0020"),
                Token::HexString(b"0021"),
                Token::ArrayEnd,
            ]
        );
    }
}
