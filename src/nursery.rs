//! The session layer: attaches to one PDF file and serves the small
//! request surface a caller needs (`GetDocument`, `GetInfo`,
//! `GetHeader`, `GetPages`, `GetReferences`, `Resolve`) without
//! re-running xref location or attach-time lookups on every call.

use std::path::Path;

use crate::error::{PdfError, Result};
use crate::lexer::{parse_repeatedly, Parser};
use crate::object::{Dictionary, Object, Reference};
use crate::resolver::resolve as resolve_reference;
use crate::tape::Tape;
use crate::xref::{locate_startxref, parse_xref_table, XRefTable};

/// The four-byte `%PDF-M.N` version banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub major: u32,
    pub minor: u32,
}

/// A derived summary of the document, read directly off the pages-tree
/// root's `Count` and `MediaBox` rather than walking the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Document {
    pub page_count: i64,
    pub width: i64,
    pub height: i64,
}

/// An attached reading session over one file. Holds everything
/// discovered at attach time so repeated requests are cheap lookups,
/// not re-parses.
pub struct Nursery {
    tape: Tape,
    header: Header,
    xref: XRefTable,
    root: Dictionary,
    info: Dictionary,
    pages: Dictionary,
    document: Document,
}

impl Nursery {
    /// Runs the attach protocol: header, `startxref`, xref table,
    /// trailer's `Info` and `Root`, the pages-tree root, and a
    /// `Document` summary built from its `Count` and `MediaBox`. Header,
    /// xref, trailer, root, info, pages, and the document summary are
    /// all resolved once here and held immutable for the session's
    /// lifetime; only `resolve` touches the tape afterward.
    pub fn attach(path: impl AsRef<Path>) -> Result<Self> {
        let mut tape = Tape::open(path)?;
        let header = read_header(&mut tape)?;
        log::debug!("header: PDF-{}.{}", header.major, header.minor);

        let xref_pos = locate_startxref(&mut tape)?;
        let xref = parse_xref_table(&mut tape, xref_pos)?;
        log::debug!("xref table: {} entries", xref.entries.len());

        let info_ref = xref
            .trailer
            .get(b"Info".as_slice())
            .and_then(Object::as_reference)
            .ok_or_else(|| PdfError::InvalidDocument("trailer missing Info reference".into()))?;
        let info_obj = resolve_reference(&xref, &mut tape, info_ref)?;
        let info = info_obj
            .as_dict()
            .ok_or_else(|| PdfError::InvalidDocument("Info does not resolve to a dictionary".into()))?
            .clone();

        let root_ref = xref
            .trailer
            .get(b"Root".as_slice())
            .and_then(Object::as_reference)
            .ok_or(PdfError::RootNotFound)?;
        let root_obj = resolve_reference(&xref, &mut tape, root_ref)?;
        let root = root_obj.as_dict().ok_or(PdfError::RootNotFound)?.clone();

        let pages_ref = root
            .get(b"Pages".as_slice())
            .and_then(Object::as_reference)
            .ok_or(PdfError::PagesNotFound)?;
        let pages_obj = resolve_reference(&xref, &mut tape, pages_ref)?;
        let pages = pages_obj.as_dict().ok_or(PdfError::PagesNotFound)?.clone();

        let document = build_document(&pages)?;
        log::debug!("document: {document:?}");

        Ok(Nursery {
            tape,
            header,
            xref,
            root,
            info,
            pages,
            document,
        })
    }

    pub fn get_header(&self) -> Header {
        self.header
    }

    pub fn get_document(&self) -> &Document {
        &self.document
    }

    pub fn get_pages(&self) -> &Dictionary {
        &self.pages
    }

    pub fn get_root(&self) -> &Dictionary {
        &self.root
    }

    pub fn get_info(&self) -> &Dictionary {
        &self.info
    }

    /// Every in-use object reference known to the xref table, in no
    /// particular order.
    pub fn get_references(&self) -> Vec<Reference> {
        self.xref
            .entries
            .iter()
            .filter(|(_, entry)| entry.in_use)
            .map(|(&reference, _)| reference)
            .collect()
    }

    /// Resolves an arbitrary reference, chasing aliases as
    /// [`crate::resolver::resolve`] does.
    pub fn resolve(&mut self, reference: Reference) -> Result<Object> {
        resolve_reference(&self.xref, &mut self.tape, reference)
    }
}

fn read_header(tape: &mut Tape) -> Result<Header> {
    parse_repeatedly(tape, 0, |p: &mut Parser| {
        let (major, minor) = p.parse_header()?;
        Ok(Header { major, minor })
    })
}

/// `pageCount` from `Count`, `width`/`height` from the 3rd/4th elements
/// of `MediaBox` (the upper-right corner in default user space).
fn build_document(pages: &Dictionary) -> Result<Document> {
    let page_count = pages
        .get(b"Count".as_slice())
        .and_then(Object::as_integer)
        .ok_or_else(|| PdfError::InvalidDocument("Pages dictionary missing integer Count".into()))?;

    let media_box = pages
        .get(b"MediaBox".as_slice())
        .and_then(Object::as_array)
        .ok_or_else(|| PdfError::InvalidDocument("Pages dictionary missing MediaBox array".into()))?;
    if media_box.len() < 4 {
        return Err(PdfError::InvalidDocument("MediaBox has fewer than 4 elements".into()));
    }
    let width = media_box[2]
        .as_integer()
        .ok_or_else(|| PdfError::InvalidDocument("MediaBox[2] is not an integer".into()))?;
    let height = media_box[3]
        .as_integer()
        .ok_or_else(|| PdfError::InvalidDocument("MediaBox[3] is not an integer".into()))?;

    Ok(Document {
        page_count,
        width,
        height,
    })
}
