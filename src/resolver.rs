//! Turns an indirect [`Reference`] into the `Object` it names, chasing
//! through aliasing references (an indirect object whose value is
//! itself just another reference) up to a fixed bound.

use crate::error::{PdfError, Result};
use crate::lexer::parse_repeatedly;
use crate::object::{Object, Reference};
use crate::tape::Tape;
use crate::xref::XRefTable;

/// No legitimate PDF chains more than a handful of aliasing references;
/// this bound exists purely to turn a cyclic xref table into a
/// reported error instead of an infinite loop.
const MAX_CHASE: u32 = 32;

/// Resolves `reference` against `xref`, reading the indirect object
/// body from `tape` and following aliasing references transparently.
///
/// Per the data model's invariant ("An in-use entry's offset must point
/// to the start of `N G obj …` where `N`,`G` match the reference"),
/// both the table lookup and the parsed object header are checked
/// against the full `(index, generation)` pair — a reference whose
/// generation doesn't match the table's recorded generation, or whose
/// `N G obj` header doesn't match the reference it was reached through,
/// is `UnresolvedObject`, never silently served from a different
/// generation.
pub fn resolve(xref: &XRefTable, tape: &mut Tape, reference: Reference) -> Result<Object> {
    let mut current = reference;
    for _ in 0..MAX_CHASE {
        let entry = xref.get(current).ok_or(PdfError::UnresolvedObject {
            idx: current.index,
            gen: current.generation,
        })?;
        if !entry.in_use {
            return Err(PdfError::UnresolvedObject {
                idx: current.index,
                gen: current.generation,
            });
        }
        let (num, gen, object) = parse_repeatedly(tape, entry.offset, |p| p.parse_indirect_object())?;
        if num != current.index || gen != current.generation {
            return Err(PdfError::UnresolvedObject {
                idx: current.index,
                gen: current.generation,
            });
        }
        match object {
            Object::Reference(next) => {
                log::debug!("chasing alias {} {} -> {} {}", current.index, current.generation, next.index, next.generation);
                current = next;
            }
            other => return Ok(other),
        }
    }
    Err(PdfError::ResolverCycle)
}
