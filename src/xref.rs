//! Cross-reference engine: locating and decoding the classical xref
//! table and trailer dictionary.
//!
//! Cross-reference *streams* (PDF 1.5+) are out of scope: any `xref`
//! location that doesn't begin with the literal keyword `xref` is
//! reported as [`PdfError::XRefMalformed`] rather than guessed at.

use std::collections::HashMap;

use crate::error::{PdfError, Result};
use crate::lexer::{bad, parse_repeatedly, ParseFail, PResult, Parser};
use crate::object::{Dictionary, Reference};
use crate::tape::Tape;

const TAIL_WINDOW: u64 = 1024;

/// One fixed-width entry of a classical xref subsection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableEntry {
    pub offset: u64,
    pub generation: u32,
    pub in_use: bool,
}

/// The decoded table plus the trailer dictionary that follows it.
/// `trailer` carries `Prev` unchased: the core reads only the most
/// recent xref section. Keyed by the full `Reference` (index AND
/// generation), per the data model's `entries: map Reference →
/// TableEntry` — a reference whose generation doesn't match the table's
/// recorded generation for that object number is simply absent, not
/// silently matched against a different generation.
#[derive(Debug, Clone)]
pub struct XRefTable {
    pub entries: HashMap<Reference, TableEntry>,
    pub trailer: Dictionary,
}

impl XRefTable {
    pub fn get(&self, reference: Reference) -> Option<&TableEntry> {
        self.entries.get(&reference)
    }
}

/// Tail-scans backward from EOF for the last `startxref` keyword, then
/// reads the integer byte offset that follows it. Grows the backward
/// window geometrically in case the final trailer is unusually large
/// (padded comments, trailing whitespace), giving up once the window
/// already spans the whole file.
pub fn locate_startxref(tape: &mut Tape) -> Result<u64> {
    let mut window = TAIL_WINDOW;
    loop {
        tape.bottom();
        tape.set_backward();
        let buf = tape.peek(window)?;
        if let Some(pos) = find_last(&buf, b"startxref") {
            let mut parser = Parser::new(&buf[pos + b"startxref".len()..]);
            parser.skip_ws();
            return match parser.parse_integer() {
                Ok(n) if n >= 0 => Ok(n as u64),
                _ => Err(PdfError::XRefMalformed(
                    "startxref offset is not a non-negative integer".into(),
                )),
            };
        }
        if (buf.len() as u64) >= tape.size() {
            return Err(PdfError::XRefNotFound);
        }
        window = (window * 2).min(tape.size());
    }
}

fn find_last(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    (0..=haystack.len() - needle.len()).rev().find(|&i| &haystack[i..i + needle.len()] == needle)
}

/// Parses the classical `xref` table (subsections of fixed-width
/// entries) followed by the `trailer` dictionary, starting at `start`.
pub fn parse_xref_table(tape: &mut Tape, start: u64) -> Result<XRefTable> {
    parse_repeatedly(tape, start, |p| {
        p.skip_ws();
        // Not just "parse failure" if this isn't the literal `xref`
        // keyword: an xref-stream location (`N G obj << /Type /XRef ...`,
        // PDF 1.5+) is a recognized-but-unsupported shape, so it gets its
        // own error kind rather than a generic parse error.
        if !p.peek_literal(b"xref")? {
            return Err(ParseFail::Bad(PdfError::XRefMalformed(
                "not a classical xref".into(),
            )));
        }
        p.expect_kw(b"xref", "xref")?;
        let mut entries = HashMap::new();
        loop {
            p.skip_ws();
            match p.peek_u8() {
                Some(b't') => break,
                Some(b) if b.is_ascii_digit() => {
                    let first = p.parse_integer()?;
                    p.skip_ws();
                    let count = p.parse_integer()?;
                    if first < 0 || count < 0 {
                        return Err(bad("xref", "negative subsection header"));
                    }
                    for i in 0..count as u32 {
                        p.skip_ws();
                        let entry = parse_entry(p)?;
                        let index = first as u32 + i;
                        entries.insert(Reference::new(index, entry.generation), entry);
                    }
                }
                Some(_) => return Err(bad("xref", "expected subsection header or 'trailer'")),
                None => return Err(ParseFail::Need),
            }
        }
        p.expect_kw(b"trailer", "trailer")?;
        p.skip_ws();
        let trailer = p.parse_dictionary()?;
        Ok(XRefTable { entries, trailer })
    })
}

/// A single `nnnnnnnnnn ggggg n|f` entry (trailing EOL consumed by the
/// caller's whitespace skip on the next iteration).
fn parse_entry(p: &mut Parser) -> PResult<TableEntry> {
    let offset = p.parse_integer()?;
    p.skip_ws();
    let generation = p.parse_integer()?;
    p.skip_ws();
    let status = p.bump_u8().ok_or(ParseFail::Need)?;
    let in_use = match status {
        b'n' => true,
        b'f' => false,
        other => return Err(bad("xref entry", format!("unknown entry status {:?}", other as char))),
    };
    if offset < 0 || generation < 0 {
        return Err(bad("xref entry", "negative offset/generation"));
    }
    Ok(TableEntry {
        offset: offset as u64,
        generation: generation as u32,
        in_use,
    })
}
