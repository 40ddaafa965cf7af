//! Blob Iteration
//!
//! An iterator is a two-element array: the byte buffer and the current
//! position as a scalar.

use crate::error::{RtsError, RtsResult};
use crate::heap::{Handle, Heap, HeapObject, Tag, Word};

const POS_IDX: usize = 1;

fn state(heap: &Heap, iter: Handle) -> RtsResult<(Handle, u32)> {
    let elems = match heap.get(iter)? {
        HeapObject::Array(elems) => elems,
        other => return Err(RtsError::TagMismatch { expected: Tag::Array, found: other.tag() }),
    };
    match elems.as_slice() {
        [Word::Ptr(blob), Word::Scalar(pos)] => Ok((*blob, *pos)),
        _ => Err(RtsError::HeapCheck { addr: iter.addr(), reason: "malformed blob iterator".into() }),
    }
}

/// Fresh iterator positioned at the first byte of `blob`
pub fn blob_iter(heap: &mut Heap, blob: Handle) -> RtsResult<Handle> {
    heap.blob(blob)?;
    heap.alloc(HeapObject::Array(vec![Word::Ptr(blob), Word::Scalar(0)]))
}

pub fn blob_iter_done(heap: &Heap, iter: Handle) -> RtsResult<bool> {
    let (blob, pos) = state(heap, iter)?;
    Ok(pos >= heap.blob(blob)?.len())
}

/// Byte at the current position; advances the iterator
pub fn blob_iter_next(heap: &mut Heap, iter: Handle) -> RtsResult<u8> {
    let (blob, pos) = state(heap, iter)?;
    let byte = *heap
        .blob_bytes(blob)?
        .get(pos as usize)
        .ok_or(RtsError::BlobIterExhausted)?;
    if let HeapObject::Array(elems) = heap.get_mut(iter)? {
        elems[POS_IDX] = Word::Scalar(pos + 1);
    }
    Ok(byte)
}
