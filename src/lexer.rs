//! Byte-level lexer/parser: header, numbers, names, strings, arrays,
//! dictionaries, streams, and indirect-object bodies.
//!
//! Parsing works against a byte window pulled from the `Tape`. When a
//! parser runs off the end of its window before finding a terminator it
//! reports [`ParseFail::Need`] rather than failing outright;
//! [`parse_repeatedly`] grows the window and retries, converting `Need`
//! into a hard [`PdfError::ParseError`] only once the window already
//! covers everything the tape has to offer.

use crate::error::{PdfError, Result};
use crate::object::{Array, Dictionary, Number, Object, Reference, Stream};
use crate::tape::Tape;

const INITIAL_WINDOW: u64 = 4096;
const MAX_WINDOW: u64 = 64 * 1024 * 1024;

fn is_whitespace(b: u8) -> bool {
    matches!(b, 0 | 9 | 10 | 12 | 13 | 32)
}

fn is_delimiter(b: u8) -> bool {
    matches!(b, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

/// A parser either finishes, hits the end of its window and wants more
/// bytes, or hits a genuine syntax error.
pub enum ParseFail {
    Need,
    Bad(PdfError),
}

impl From<PdfError> for ParseFail {
    fn from(e: PdfError) -> Self {
        ParseFail::Bad(e)
    }
}

pub type PResult<T> = std::result::Result<T, ParseFail>;

pub fn bad(where_: &'static str, reason: impl Into<String>) -> ParseFail {
    ParseFail::Bad(PdfError::ParseError {
        where_,
        reason: reason.into(),
    })
}

fn find_keyword(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    (0..=haystack.len() - needle.len()).find(|&i| &haystack[i..i + needle.len()] == needle)
}

/// A cursor over one in-memory window of PDF bytes.
pub struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Parser { bytes, pos: 0 }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    fn peek_byte(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek_byte();
        if b.is_some() {
            self.pos += 1;
        }
        b
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek_byte() {
                Some(b) if is_whitespace(b) => {
                    self.pos += 1;
                }
                Some(b'%') => {
                    while let Some(b) = self.peek_byte() {
                        if b == b'\n' || b == b'\r' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
    }

    fn expect_byte(&mut self, want: u8, where_: &'static str) -> PResult<()> {
        match self.bump() {
            Some(b) if b == want => Ok(()),
            Some(b) => Err(bad(where_, format!("expected {:?}, found {:?}", want as char, b as char))),
            None => Err(ParseFail::Need),
        }
    }

    fn expect_literal(&mut self, lit: &[u8], where_: &'static str) -> PResult<()> {
        if self.pos + lit.len() > self.bytes.len() {
            // Might just be a short window; only a genuine mismatch on
            // the bytes we do have is a hard error.
            let available = &self.bytes[self.pos..];
            if lit.starts_with(available) {
                return Err(ParseFail::Need);
            }
            return Err(bad(where_, format!("expected {:?}", String::from_utf8_lossy(lit))));
        }
        if &self.bytes[self.pos..self.pos + lit.len()] == lit {
            self.pos += lit.len();
            Ok(())
        } else {
            Err(bad(where_, format!("expected {:?}", String::from_utf8_lossy(lit))))
        }
    }

    /// `"%PDF-" <digit> "." <digit>`
    pub fn parse_header(&mut self) -> PResult<(u32, u32)> {
        self.expect_literal(b"%PDF-", "header")?;
        let major = self.bump().ok_or(ParseFail::Need)?;
        if !major.is_ascii_digit() {
            return Err(bad("header", "expected major version digit"));
        }
        self.expect_byte(b'.', "header")?;
        let minor = self.bump().ok_or(ParseFail::Need)?;
        if !minor.is_ascii_digit() {
            return Err(bad("header", "expected minor version digit"));
        }
        Ok(((major - b'0') as u32, (minor - b'0') as u32))
    }

    fn parse_number_token(&mut self) -> PResult<Number> {
        let start = self.pos;
        if matches!(self.peek_byte(), Some(b'+') | Some(b'-')) {
            self.pos += 1;
        }
        let mut saw_digit = false;
        let mut saw_dot = false;
        loop {
            match self.peek_byte() {
                Some(b) if b.is_ascii_digit() => {
                    saw_digit = true;
                    self.pos += 1;
                }
                Some(b'.') if !saw_dot => {
                    saw_dot = true;
                    self.pos += 1;
                }
                _ => break,
            }
        }
        if self.pos == self.bytes.len() {
            // We may have stopped only because the window ran out.
            return Err(ParseFail::Need);
        }
        if !saw_digit {
            self.pos = start;
            return Err(bad("number", "no digits in numeric token"));
        }
        let text = std::str::from_utf8(&self.bytes[start..self.pos])
            .map_err(|_| bad("number", "non-utf8 numeric token"))?;
        if saw_dot {
            text.parse::<f64>()
                .map(Number::Real)
                .map_err(|_| bad("number", format!("invalid real {text:?}")))
        } else {
            text.parse::<i64>()
                .map(Number::Integer)
                .map_err(|_| bad("number", format!("invalid integer {text:?}")))
        }
    }

    /// Leading `/`, then non-delimiter non-whitespace bytes, with `#hh`
    /// hex escapes decoded.
    fn parse_name_token(&mut self) -> PResult<Vec<u8>> {
        self.expect_byte(b'/', "name")?;
        let mut out = Vec::new();
        loop {
            match self.peek_byte() {
                Some(b'#') => {
                    if self.pos + 3 > self.bytes.len() {
                        return Err(ParseFail::Need);
                    }
                    let hi = (self.bytes[self.pos + 1] as char).to_digit(16);
                    let lo = (self.bytes[self.pos + 2] as char).to_digit(16);
                    match (hi, lo) {
                        (Some(hi), Some(lo)) => {
                            out.push((hi * 16 + lo) as u8);
                            self.pos += 3;
                        }
                        _ => {
                            out.push(b'#');
                            self.pos += 1;
                        }
                    }
                }
                Some(b) if !is_whitespace(b) && !is_delimiter(b) => {
                    out.push(b);
                    self.pos += 1;
                }
                Some(_) => break,
                None => return Err(ParseFail::Need),
            }
        }
        Ok(out)
    }

    /// `(` … `)` with nested-parenthesis accounting and backslash
    /// escapes.
    fn parse_literal_string_token(&mut self) -> PResult<Vec<u8>> {
        self.expect_byte(b'(', "literal string")?;
        let mut out = Vec::new();
        let mut depth: u32 = 1;
        loop {
            let b = self.bump().ok_or(ParseFail::Need)?;
            match b {
                b'(' => {
                    depth += 1;
                    out.push(b);
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    out.push(b);
                }
                b'\\' => {
                    let esc = self.bump().ok_or(ParseFail::Need)?;
                    match esc {
                        b'n' => out.push(b'\n'),
                        b'r' => out.push(b'\r'),
                        b't' => out.push(b'\t'),
                        b'b' => out.push(8),
                        b'f' => out.push(12),
                        b'(' => out.push(b'('),
                        b')' => out.push(b')'),
                        b'\\' => out.push(b'\\'),
                        b'\r' => {
                            // line continuation; optionally followed by \n
                            if self.peek_byte() == Some(b'\n') {
                                self.pos += 1;
                            }
                        }
                        b'\n' => {}
                        d @ b'0'..=b'7' => {
                            let mut value = (d - b'0') as u32;
                            for _ in 0..2 {
                                match self.peek_byte() {
                                    Some(o @ b'0'..=b'7') => {
                                        value = value * 8 + (o - b'0') as u32;
                                        self.pos += 1;
                                    }
                                    _ => break,
                                }
                            }
                            out.push((value & 0xFF) as u8);
                        }
                        other => out.push(other),
                    }
                }
                other => out.push(other),
            }
        }
        Ok(out)
    }

    /// `<` hex-digits `>`; an odd trailing digit is implicitly `0`.
    fn parse_hex_string_token(&mut self) -> PResult<Vec<u8>> {
        self.expect_byte(b'<', "hex string")?;
        let mut digits = Vec::new();
        loop {
            match self.bump() {
                Some(b'>') => break,
                Some(b) if b.is_ascii_hexdigit() => digits.push(b),
                Some(b) if is_whitespace(b) => {}
                Some(b) => return Err(bad("hex string", format!("invalid hex digit {:?}", b as char))),
                None => return Err(ParseFail::Need),
            }
        }
        if digits.len() % 2 == 1 {
            digits.push(b'0');
        }
        let mut out = Vec::with_capacity(digits.len() / 2);
        for pair in digits.chunks(2) {
            let hi = (pair[0] as char).to_digit(16).unwrap();
            let lo = (pair[1] as char).to_digit(16).unwrap();
            out.push((hi * 16 + lo) as u8);
        }
        Ok(out)
    }

    /// A bare run of regular characters: keywords (`obj`, `endobj`,
    /// `stream`, `true`, …) and the `R` / `n` / `f` markers.
    fn parse_keyword_token(&mut self) -> PResult<Vec<u8>> {
        let start = self.pos;
        loop {
            match self.peek_byte() {
                Some(b) if !is_whitespace(b) && !is_delimiter(b) => self.pos += 1,
                Some(_) => break,
                None => return Err(ParseFail::Need),
            }
        }
        if self.pos == start {
            return Err(bad("keyword", "empty keyword"));
        }
        Ok(self.bytes[start..self.pos].to_vec())
    }

    fn parse_array_token(&mut self) -> PResult<Array> {
        self.expect_byte(b'[', "array")?;
        let mut out = Array::new();
        loop {
            self.skip_whitespace_and_comments();
            match self.peek_byte() {
                Some(b']') => {
                    self.pos += 1;
                    break;
                }
                Some(_) => out.push(self.parse_object_token()?),
                None => return Err(ParseFail::Need),
            }
        }
        Ok(out)
    }

    fn parse_dictionary_token(&mut self) -> PResult<Dictionary> {
        self.expect_literal(b"<<", "dictionary")?;
        let mut out = Dictionary::new();
        loop {
            self.skip_whitespace_and_comments();
            match self.peek_byte() {
                Some(b'>') => {
                    self.expect_literal(b">>", "dictionary")?;
                    break;
                }
                Some(b'/') => {
                    let key = self.parse_name_token()?;
                    self.skip_whitespace_and_comments();
                    let value = self.parse_object_token()?;
                    out.insert(key, value);
                }
                Some(b) => return Err(bad("dictionary", format!("expected name key, found {:?}", b as char))),
                None => return Err(ParseFail::Need),
            }
        }
        Ok(out)
    }

    /// Tries `N G R`; on any mismatch, rewinds to just after the first
    /// number so the caller sees a bare `Number`.
    fn try_reference(&mut self, first: i64) -> Option<Reference> {
        let save = self.pos;
        self.skip_whitespace_and_comments();
        let gen_start = self.pos;
        if let Ok(Number::Integer(gen)) = self.parse_number_token() {
            self.skip_whitespace_and_comments();
            let kw_start = self.pos;
            if let Ok(kw) = self.parse_keyword_token() {
                if kw == b"R" && first >= 0 && gen >= 0 {
                    return Some(Reference::new(first as u32, gen as u32));
                }
            }
            self.pos = kw_start;
        }
        self.pos = gen_start;
        self.pos = save;
        None
    }

    /// Parses one `Object`, including the `N G R` indirect-reference
    /// special case.
    fn parse_object_token(&mut self) -> PResult<Object> {
        self.skip_whitespace_and_comments();
        match self.peek_byte() {
            Some(b'/') => Ok(Object::Name(self.parse_name_token()?)),
            Some(b'(') => Ok(Object::Bytes(self.parse_literal_string_token()?)),
            Some(b'<') => {
                if self.bytes.get(self.pos + 1) == Some(&b'<') {
                    Ok(Object::Dictionary(self.parse_dictionary_token()?))
                } else if self.pos + 1 >= self.bytes.len() {
                    Err(ParseFail::Need)
                } else {
                    Ok(Object::Bytes(self.parse_hex_string_token()?))
                }
            }
            Some(b'[') => Ok(Object::Array(self.parse_array_token()?)),
            Some(b) if b.is_ascii_digit() || b == b'+' || b == b'-' => {
                let before = self.pos;
                let n = self.parse_number_token()?;
                if let Number::Integer(first) = n {
                    if let Some(r) = self.try_reference(first) {
                        return Ok(Object::Reference(r));
                    }
                }
                self.pos = self.pos.max(before);
                Ok(Object::Number(n))
            }
            Some(_) => {
                let kw = self.parse_keyword_token()?;
                match kw.as_slice() {
                    b"true" => Ok(Object::Boolean(true)),
                    b"false" => Ok(Object::Boolean(false)),
                    b"null" => Ok(Object::Null),
                    _ => Err(bad("object", format!("unexpected keyword {:?}", String::from_utf8_lossy(&kw)))),
                }
            }
            None => Err(ParseFail::Need),
        }
    }

    /// Parses a dictionary, then checks whether it's immediately
    /// followed by `stream`; if so returns a `Stream` object with
    /// `stream_pos` recorded and the body skipped (length resolved by
    /// the caller, since `Length` may itself be an indirect reference).
    fn parse_object_or_stream(&mut self) -> PResult<Object> {
        self.skip_whitespace_and_comments();
        if self.peek_byte() != Some(b'<') || self.bytes.get(self.pos + 1) != Some(&b'<') {
            return self.parse_object_token();
        }
        let dict = self.parse_dictionary_token()?;
        let checkpoint = self.pos;
        self.skip_whitespace_and_comments();
        if self.pos + 6 <= self.bytes.len() && &self.bytes[self.pos..self.pos + 6] == b"stream" {
            self.pos += 6;
            // a single EOL: \r\n or \n
            match self.bump() {
                Some(b'\r') => {
                    if self.peek_byte() == Some(b'\n') {
                        self.pos += 1;
                    }
                }
                Some(b'\n') => {}
                Some(b) => return Err(bad("stream", format!("expected EOL after 'stream', found {:?}", b as char))),
                None => return Err(ParseFail::Need),
            }
            let stream_pos = self.pos as u64;
            Ok(Object::Stream(Stream { dict, stream_pos }))
        } else {
            self.pos = checkpoint;
            Ok(Object::Dictionary(dict))
        }
    }

    /// Public entry point for a single object, used by the xref/trailer
    /// parser which needs dictionaries and integers without the
    /// `N G obj` wrapper.
    pub fn parse_object(&mut self) -> PResult<Object> {
        self.parse_object_token()
    }

    pub fn parse_dictionary(&mut self) -> PResult<Dictionary> {
        self.skip_whitespace_and_comments();
        self.parse_dictionary_token()
    }

    pub fn skip_ws(&mut self) {
        self.skip_whitespace_and_comments();
    }

    pub fn peek_u8(&self) -> Option<u8> {
        self.peek_byte()
    }

    pub fn bump_u8(&mut self) -> Option<u8> {
        self.bump()
    }

    /// Parses a bare integer token (used for xref subsection headers
    /// and fixed-width entry fields), without the reference lookahead
    /// `parse_object` applies to top-level numbers.
    pub fn parse_integer(&mut self) -> PResult<i64> {
        match self.parse_number_token()? {
            Number::Integer(n) => Ok(n),
            Number::Real(_) => Err(bad("integer", "expected an integer, found a real")),
        }
    }

    pub fn expect_kw(&mut self, lit: &[u8], where_: &'static str) -> PResult<()> {
        self.expect_literal(lit, where_)
    }

    /// Non-consuming check for whether the upcoming bytes are exactly
    /// `lit`. `Ok(true)`/`Ok(false)` are definite; `Err(ParseFail::Need)`
    /// means the window is too short to tell yet (the bytes seen so far
    /// are a prefix of `lit`).
    pub fn peek_literal(&self, lit: &[u8]) -> PResult<bool> {
        if self.pos + lit.len() > self.bytes.len() {
            let available = &self.bytes[self.pos..];
            if lit.starts_with(available) {
                return Err(ParseFail::Need);
            }
            return Ok(false);
        }
        Ok(&self.bytes[self.pos..self.pos + lit.len()] == lit)
    }

    /// `N G obj <object> endobj`
    pub fn parse_indirect_object(&mut self) -> PResult<(u32, u32, Object)> {
        self.skip_whitespace_and_comments();
        let num = match self.parse_number_token()? {
            Number::Integer(n) if n >= 0 => n as u32,
            _ => return Err(bad("indirect object", "object number must be a non-negative integer")),
        };
        self.skip_whitespace_and_comments();
        let gen = match self.parse_number_token()? {
            Number::Integer(n) if n >= 0 => n as u32,
            _ => return Err(bad("indirect object", "generation must be a non-negative integer")),
        };
        self.skip_whitespace_and_comments();
        self.expect_literal(b"obj", "indirect object")?;
        let object = self.parse_object_or_stream()?;
        self.skip_whitespace_and_comments();
        if let Object::Stream(stream) = &object {
            // Skip past the raw content to `endstream`/`endobj`. When
            // `Length` is a plain integer we can trust it directly;
            // when it's an indirect reference (common — encoders often
            // defer it to a later object) we fall back to scanning for
            // the literal `endstream` keyword, same as any lenient
            // reader has to.
            let body_end = match stream.dict.get(b"Length".as_slice()).and_then(Object::as_integer) {
                Some(len) => Some(stream.stream_pos as usize + len.max(0) as usize),
                None => find_keyword(&self.bytes[stream.stream_pos as usize..], b"endstream")
                    .map(|rel| stream.stream_pos as usize + rel),
            };
            match body_end {
                Some(end) if end <= self.bytes.len() => {
                    self.pos = end;
                    self.skip_whitespace_and_comments();
                }
                _ => return Err(ParseFail::Need),
            }
        }
        self.expect_literal(b"endstream", "indirect object").or_else(|e| match e {
            ParseFail::Need => Err(ParseFail::Need),
            ParseFail::Bad(_) => Ok(()), // no stream body; fine for non-stream objects
        })?;
        self.skip_whitespace_and_comments();
        self.expect_literal(b"endobj", "indirect object")?;
        Ok((num, gen, object))
    }
}

/// Runs `parse` against a growing window of the tape starting at
/// `offset`, doubling the window whenever `parse` reports
/// [`ParseFail::Need`], until the window already covers everything the
/// tape has or the parse succeeds.
pub fn parse_repeatedly<T>(
    tape: &mut Tape,
    offset: u64,
    parse: impl Fn(&mut Parser) -> PResult<T>,
) -> Result<T> {
    let mut window = INITIAL_WINDOW;
    loop {
        tape.seek(offset)?;
        tape.set_forward();
        let buf = tape.peek(window)?;
        let covers_everything = (buf.len() as u64) < window || offset + window >= tape.size();
        let mut parser = Parser::new(&buf);
        match parse(&mut parser) {
            Ok(v) => return Ok(v),
            Err(ParseFail::Bad(e)) => return Err(e),
            Err(ParseFail::Need) => {
                if covers_everything || window >= MAX_WINDOW {
                    return Err(PdfError::ParseError {
                        where_: "parse_repeatedly",
                        reason: "unexpected end of input".into(),
                    });
                }
                window = (window * 2).min(MAX_WINDOW);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_header() {
        let mut p = Parser::new(b"%PDF-1.7\n");
        assert_eq!(p.parse_header().ok(), Some((1, 7)));
    }

    #[test]
    fn parses_name_with_hex_escape() {
        let mut p = Parser::new(b"/A#42 ");
        match p.parse_object_token() {
            Ok(Object::Name(n)) => assert_eq!(n, b"AB"),
            other => panic!("unexpected {other:?}", other = other.is_ok()),
        }
    }

    #[test]
    fn parses_literal_string_with_nested_parens_and_escapes() {
        let mut p = Parser::new(b"(Hello (World)\\n)");
        match p.parse_object_token() {
            Ok(Object::Bytes(b)) => assert_eq!(b, b"Hello (World)\n"),
            _ => panic!("expected bytes"),
        }
    }

    #[test]
    fn parses_octal_escape() {
        let mut p = Parser::new(b"(\\101)");
        match p.parse_object_token() {
            Ok(Object::Bytes(b)) => assert_eq!(b, b"A"),
            _ => panic!("expected bytes"),
        }
    }

    #[test]
    fn parses_hex_string_with_odd_digit_count() {
        let mut p = Parser::new(b"<4142A>");
        match p.parse_object_token() {
            Ok(Object::Bytes(b)) => assert_eq!(b, vec![0x41, 0x42, 0xA0]),
            _ => panic!("expected bytes"),
        }
    }

    #[test]
    fn parses_real_and_integer() {
        let mut p = Parser::new(b"12.34");
        assert!(matches!(
            p.parse_object_token(),
            Ok(Object::Number(Number::Real(f))) if (f - 12.34).abs() < 1e-9
        ));
        let mut p = Parser::new(b"-7");
        assert!(matches!(
            p.parse_object_token(),
            Ok(Object::Number(Number::Integer(-7)))
        ));
    }

    #[test]
    fn disambiguates_reference_from_two_numbers() {
        let mut p = Parser::new(b"3 0 R");
        match p.parse_object_token() {
            Ok(Object::Reference(r)) => assert_eq!(r, Reference::new(3, 0)),
            _ => panic!("expected reference"),
        }

        let mut p = Parser::new(b"3 0 obj");
        match p.parse_object_token() {
            Ok(Object::Number(Number::Integer(3))) => (),
            other => panic!("expected bare number 3, found {other:?}", other = other.is_ok()),
        }
    }

    #[test]
    fn parses_array_and_dictionary() {
        let mut p = Parser::new(b"<< /Type /Pages /MediaBox [ 0 0 200 200 ] /Count 1 /Kids [ 3 0 R ] >>");
        let dict = match p.parse_object_token() {
            Ok(Object::Dictionary(d)) => d,
            _ => panic!("expected dictionary"),
        };
        assert_eq!(dict.get(b"Type".as_slice()), Some(&Object::Name(b"Pages".to_vec())));
        assert_eq!(
            dict.get(b"Count".as_slice()),
            Some(&Object::Number(Number::Integer(1)))
        );
        match dict.get(b"Kids".as_slice()) {
            Some(Object::Array(a)) => assert_eq!(a[0], Object::Reference(Reference::new(3, 0))),
            _ => panic!("expected Kids array"),
        }
    }

    #[test]
    fn parses_indirect_object_dictionary() {
        let bytes = b"6 0 obj\n<< /Type /X >>\nendobj\n";
        let mut p = Parser::new(bytes);
        let (num, gen, obj) = p.parse_indirect_object().ok().unwrap();
        assert_eq!((num, gen), (6, 0));
        assert_eq!(obj.dict_key("Type"), Some(&Object::Name(b"X".to_vec())));
    }

    #[test]
    fn parses_indirect_object_stream_with_known_length() {
        let bytes = b"1 0 obj\n<< /Length 5 >>\nstream\nhello\nendstream\nendobj\n";
        let mut p = Parser::new(bytes);
        let (_, _, obj) = p.parse_indirect_object().ok().unwrap();
        match obj {
            Object::Stream(s) => assert_eq!(&bytes[s.stream_pos as usize..s.stream_pos as usize + 5], b"hello"),
            _ => panic!("expected stream"),
        }
    }
}
