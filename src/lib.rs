//! Random-access PDF reader core: a seekable `Tape`, a PDF object
//! algebra with lens-style navigation, a byte-level lexer/parser, a
//! classical xref engine, bounded reference resolution, and a
//! `Nursery` session layer tying them together.

pub mod error;
pub mod lexer;
pub mod nursery;
pub mod object;
pub mod resolver;
pub mod tape;
pub mod xref;

pub use error::{PdfError, Result};
pub use nursery::{Document, Header, Nursery};
pub use object::{Array, Dictionary, Name, Number, Object, Reference, Stream};
pub use tape::{Direction, Tape};
pub use xref::{TableEntry, XRefTable};
