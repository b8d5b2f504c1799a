//! The PDF value algebra and its lens-style navigation combinators.

use std::collections::HashMap;

/// A PDF name or dictionary key: raw bytes, typically ASCII, with `#hh`
/// escapes already decoded.
pub type Name = Vec<u8>;

/// Dictionary keys are unique; iteration order is preserved where
/// convenient but carries no semantic meaning to callers.
pub type Dictionary = HashMap<Name, Object>;

/// An ordered sequence of objects.
pub type Array = Vec<Object>;

/// A PDF number: either an integer or a real, tagged so that equality
/// stays structural within one tag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Integer(i64),
    Real(f64),
}

impl Number {
    /// The "natural" view: `Some` only when the number is an integer.
    pub fn natural(&self) -> Option<i64> {
        match self {
            Number::Integer(n) => Some(*n),
            Number::Real(_) => None,
        }
    }

    /// Widens either tag to `f64`, for arithmetic that doesn't care
    /// about the distinction (e.g. `MediaBox` bounds).
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Integer(n) => *n as f64,
            Number::Real(r) => *r,
        }
    }
}

/// A pointer-shaped value `(index, generation)` that must be resolved
/// through the xref table before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reference {
    pub index: u32,
    pub generation: u32,
}

impl Reference {
    pub fn new(index: u32, generation: u32) -> Self {
        Reference { index, generation }
    }
}

/// A stream's dictionary plus the byte offset of the first content byte
/// following the `stream` keyword. Content bytes are never eagerly
/// materialized here — a consumer slices them on demand using `Length`.
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    pub dict: Dictionary,
    pub stream_pos: u64,
}

/// The PDF object algebra (ISO 32000-1 §7.3).
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Number(Number),
    Boolean(bool),
    Name(Name),
    Dictionary(Dictionary),
    Array(Array),
    Bytes(Vec<u8>),
    Reference(Reference),
    Stream(Stream),
    Null,
}

impl Object {
    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Object::Number(n) => Some(n),
            _ => None,
        }
    }

    /// Convenience over `as_number().and_then(Number::natural)`.
    pub fn as_integer(&self) -> Option<i64> {
        self.as_number()?.natural()
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Object::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&[u8]> {
        match self {
            Object::Name(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Dictionary> {
        match self {
            Object::Dictionary(d) => Some(d),
            Object::Stream(s) => Some(&s.dict),
            _ => None,
        }
    }

    pub fn as_dict_mut(&mut self) -> Option<&mut Dictionary> {
        match self {
            Object::Dictionary(d) => Some(d),
            Object::Stream(s) => Some(&mut s.dict),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Object::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Array> {
        match self {
            Object::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Object::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<Reference> {
        match self {
            Object::Reference(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_stream(&self) -> Option<&Stream> {
        match self {
            Object::Stream(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    /// Keyed dictionary traversal: narrow to a dictionary (or stream
    /// dictionary), then look up `key`. Returns `None` if `self` is not
    /// a dictionary-shaped object or the key is absent — never panics.
    pub fn dict_key(&self, key: &str) -> Option<&Object> {
        self.as_dict()?.get(key.as_bytes())
    }

    pub fn dict_key_mut(&mut self, key: &str) -> Option<&mut Object> {
        self.as_dict_mut()?.get_mut(key.as_bytes())
    }

    /// Indexed array traversal.
    pub fn nth(&self, i: usize) -> Option<&Object> {
        self.as_array()?.get(i)
    }

    pub fn nth_mut(&mut self, i: usize) -> Option<&mut Object> {
        self.as_array_mut()?.get_mut(i)
    }
}
