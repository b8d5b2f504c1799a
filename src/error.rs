//! Error types for the PDF reader core.

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Every way a read of a PDF file can fail, per the random-access core's
/// error design: no retries, no transient/fatal distinction — a static
/// file either parses or it doesn't.
#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    /// A `Seek` was requested outside `[0, fileSize]`.
    #[error("seek out of tape bounds")]
    TapeBounds,

    /// The underlying byte source failed to read or seek.
    #[error("tape io error: {0}")]
    TapeIo(#[from] std::io::Error),

    /// A lexer/parser rule failed to match at a given point.
    #[error("parse error in {where_}: {reason}")]
    ParseError {
        /// Which grammar rule was being parsed (header, dictionary, …).
        where_: &'static str,
        /// Human-readable reason.
        reason: String,
    },

    /// `startxref` could not be located in the tail window.
    #[error("startxref not found")]
    XRefNotFound,

    /// The xref table or trailer did not match the expected grammar.
    #[error("malformed xref: {0}")]
    XRefMalformed(String),

    /// A reference does not resolve: missing from the table, or present
    /// but marked free.
    #[error("unresolved object {idx} {gen}")]
    UnresolvedObject {
        /// Object number.
        idx: u32,
        /// Generation number.
        gen: u32,
    },

    /// A chain of references exceeded the chase bound.
    #[error("reference chase exceeded bound")]
    ResolverCycle,

    /// The trailer's `Root` did not resolve to a dictionary.
    #[error("catalog root not found")]
    RootNotFound,

    /// The catalog's `Pages` did not resolve to a dictionary.
    #[error("page tree root not found")]
    PagesNotFound,

    /// The pages dictionary was missing `Count` or a well-formed
    /// `MediaBox`.
    #[error("invalid document summary: {0}")]
    InvalidDocument(String),
}
