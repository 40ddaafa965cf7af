//! Allocation Bridge
//!
//! Maps the C-style memory interface of the arbitrary-precision layer
//! (zeroed allocate, grow-or-replace, release) onto byte-buffer objects of the
//! managed heap. Storage is never released explicitly: a replaced or
//! "freed" buffer is simply abandoned and left to the collector.

use log::{debug, trace};

use crate::error::{RtsError, RtsResult};
use crate::heap::{Heap, PayloadPtr, Tag};

/// Memory interface the arithmetic layer is written against.
///
/// Pointers handed out are payload pointers, never buffer headers. Byte
/// access goes through [`ForeignAlloc::bytes`]/[`ForeignAlloc::bytes_mut`];
/// the returned slices must not be held across another allocation.
pub trait ForeignAlloc {
    /// Zero-filled storage for `count * elem_size` bytes
    fn calloc(&mut self, count: u32, elem_size: u32) -> RtsResult<PayloadPtr>;

    /// Storage for `new_size` bytes whose first `old_size` bytes equal those at `ptr`
    fn realloc(&mut self, ptr: PayloadPtr, old_size: u32, new_size: u32) -> RtsResult<PayloadPtr>;

    /// Give storage back
    fn free(&mut self, ptr: PayloadPtr, size: u32);

    fn bytes(&self, ptr: PayloadPtr, len: u32) -> RtsResult<&[u8]>;

    fn bytes_mut(&mut self, ptr: PayloadPtr, len: u32) -> RtsResult<&mut [u8]>;
}

impl ForeignAlloc for Heap {
    fn calloc(&mut self, count: u32, elem_size: u32) -> RtsResult<PayloadPtr> {
        let len = count.checked_mul(elem_size).ok_or_else(|| RtsError::OutOfMemory {
            requested: u64::from(count) * u64::from(elem_size),
            available: self.available(),
        })?;
        let blob = self.alloc_blob(len)?;
        trace!("calloc: {} bytes at {:?}", len, blob);
        Ok(PayloadPtr::start_of(blob))
    }

    fn realloc(&mut self, ptr: PayloadPtr, old_size: u32, new_size: u32) -> RtsResult<PayloadPtr> {
        // The length word of the owning buffer is its capacity
        let capacity = self.blob(ptr.blob())?.len().saturating_sub(ptr.offset());
        if new_size <= capacity {
            return Ok(ptr);
        }

        let old = self.payload(ptr, old_size)?.to_vec();
        let fresh = PayloadPtr::start_of(self.alloc_blob(new_size)?);
        self.payload_mut(fresh, old_size)?.copy_from_slice(&old);
        debug!(
            "realloc: replaced {:?} ({} bytes) with {:?} ({} bytes)",
            ptr.blob(),
            capacity,
            fresh.blob(),
            new_size
        );
        Ok(fresh)
    }

    fn free(&mut self, _ptr: PayloadPtr, _size: u32) {}

    fn bytes(&self, ptr: PayloadPtr, len: u32) -> RtsResult<&[u8]> {
        self.payload(ptr, len)
    }

    fn bytes_mut(&mut self, ptr: PayloadPtr, len: u32) -> RtsResult<&mut [u8]> {
        self.payload_mut(ptr, len)
    }
}

/// Recover a payload pointer from a raw payload address, checking that the
/// header found one header-width below it belongs to a byte buffer.
pub fn payload_ptr_from_addr(heap: &Heap, addr: u32) -> RtsResult<PayloadPtr> {
    let ptr = PayloadPtr::from_addr(addr).ok_or(RtsError::InvalidHandle(addr))?;
    match heap.tag(ptr.blob())? {
        Tag::Blob => Ok(ptr),
        found => Err(RtsError::TagMismatch { expected: Tag::Blob, found }),
    }
}
