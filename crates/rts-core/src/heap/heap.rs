//! Managed Heap
//!
//! Bump-allocated, word-addressed heap of tagged objects. Objects are never
//! freed explicitly; only [`Heap::collect`] reclaims unreachable ones.

use std::collections::BTreeMap;

use log::trace;

use crate::bigint::MpInt;
use crate::config::RtsConfig;
use crate::error::{RtsError, RtsResult};

use super::object::{Blob, HeapObject};
use super::tag::Tag;
use super::value::{bytes_to_words, Handle, PayloadPtr, BLOB_HEADER_BYTES, WORD_SIZE};

const BLOB_HEADER_WORDS: u32 = BLOB_HEADER_BYTES / WORD_SIZE;

/// Slot in the heap's root table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RootId(usize);

/// The managed heap
#[derive(Debug)]
pub struct Heap {
    pub(super) config: RtsConfig,
    pub(super) objects: BTreeMap<u32, HeapObject>,
    pub(super) hp: u32,
    pub(super) roots: Vec<Option<Handle>>,
    /// Live bytes left by the last collection
    pub(super) last_live: u32,
    allocated: u64,
}

impl Heap {
    /// Create an empty heap
    pub fn new(mut config: RtsConfig) -> Self {
        config.heap_base = config.heap_base.next_multiple_of(WORD_SIZE);
        Heap {
            objects: BTreeMap::new(),
            hp: config.heap_base,
            roots: Vec::new(),
            last_live: 0,
            allocated: 0,
            config,
        }
    }

    pub fn config(&self) -> &RtsConfig {
        &self.config
    }

    /// Next free address
    pub fn heap_pointer(&self) -> u32 {
        self.hp
    }

    /// Bytes between the heap base and the allocation pointer
    pub fn heap_size(&self) -> u32 {
        self.hp - self.config.heap_base
    }

    /// Bytes handed out since the heap was created
    pub fn total_allocated(&self) -> u64 {
        self.allocated
    }

    /// Bytes left before the heap limit
    pub fn available(&self) -> u64 {
        u64::from(self.config.heap_limit.saturating_sub(self.hp))
    }

    /// Number of objects currently in the heap, live or not
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Fail unless `words` more words fit below the heap limit
    fn reserve(&self, words: u32) -> RtsResult<u64> {
        let requested = u64::from(words) * u64::from(WORD_SIZE);
        let available = self.available();
        if requested > available {
            return Err(RtsError::OutOfMemory { requested, available });
        }
        Ok(requested)
    }

    /// Reserve `words` words and return their start address
    fn alloc_words(&mut self, words: u32) -> RtsResult<u32> {
        let requested = self.reserve(words)?;
        let addr = self.hp;
        self.hp += requested as u32;
        self.allocated += requested;
        Ok(addr)
    }

    /// Allocate a fully initialized object
    pub fn alloc(&mut self, object: HeapObject) -> RtsResult<Handle> {
        let addr = self.alloc_words(object.size_words())?;
        trace!("alloc {:?} at {:#x}", object.tag(), addr);
        self.objects.insert(addr, object);
        Ok(Handle::from_addr(addr))
    }

    /// Allocate a zero-filled byte buffer of `len` bytes
    pub fn alloc_blob(&mut self, len: u32) -> RtsResult<Handle> {
        // The payload is only built once the heap has room for it
        self.reserve(BLOB_HEADER_WORDS + bytes_to_words(len))?;
        self.alloc(HeapObject::Blob(Blob::zeroed(len)))
    }

    /// Allocate a byte buffer holding a copy of `bytes`
    pub fn alloc_blob_from(&mut self, bytes: &[u8]) -> RtsResult<Handle> {
        let len = u32::try_from(bytes.len()).map_err(|_| RtsError::OutOfMemory {
            requested: bytes.len() as u64,
            available: self.available(),
        })?;
        self.reserve(BLOB_HEADER_WORDS + bytes_to_words(len))?;
        self.alloc(HeapObject::Blob(Blob::from_bytes(bytes.to_vec())))
    }

    pub fn get(&self, h: Handle) -> RtsResult<&HeapObject> {
        self.objects
            .get(&h.addr())
            .ok_or(RtsError::InvalidHandle(h.raw()))
    }

    pub fn get_mut(&mut self, h: Handle) -> RtsResult<&mut HeapObject> {
        self.objects
            .get_mut(&h.addr())
            .ok_or(RtsError::InvalidHandle(h.raw()))
    }

    pub fn tag(&self, h: Handle) -> RtsResult<Tag> {
        Ok(self.get(h)?.tag())
    }

    pub fn blob(&self, h: Handle) -> RtsResult<&Blob> {
        match self.get(h)? {
            HeapObject::Blob(blob) => Ok(blob),
            other => Err(RtsError::TagMismatch { expected: Tag::Blob, found: other.tag() }),
        }
    }

    pub fn blob_mut(&mut self, h: Handle) -> RtsResult<&mut Blob> {
        match self.get_mut(h)? {
            HeapObject::Blob(blob) => Ok(blob),
            other => Err(RtsError::TagMismatch { expected: Tag::Blob, found: other.tag() }),
        }
    }

    /// Live payload of a byte buffer
    pub fn blob_bytes(&self, h: Handle) -> RtsResult<&[u8]> {
        Ok(self.blob(h)?.bytes())
    }

    /// Copy of the bignum control structure embedded in `h`
    pub fn bigint(&self, h: Handle) -> RtsResult<MpInt> {
        match self.get(h)? {
            HeapObject::BigInt(mp) => Ok(*mp),
            other => Err(RtsError::TagMismatch { expected: Tag::BigInt, found: other.tag() }),
        }
    }

    /// Store a bignum control structure back into `h`
    pub fn set_bigint(&mut self, h: Handle, value: MpInt) -> RtsResult<()> {
        match self.get_mut(h)? {
            HeapObject::BigInt(mp) => {
                *mp = value;
                Ok(())
            }
            other => Err(RtsError::TagMismatch { expected: Tag::BigInt, found: other.tag() }),
        }
    }

    /// Borrow `len` payload bytes starting at `ptr`
    pub fn payload(&self, ptr: PayloadPtr, len: u32) -> RtsResult<&[u8]> {
        let bytes = self.blob(ptr.blob())?.bytes();
        let range = Self::payload_range(ptr, len, bytes.len())?;
        Ok(&bytes[range])
    }

    /// Mutably borrow `len` payload bytes starting at `ptr`
    pub fn payload_mut(&mut self, ptr: PayloadPtr, len: u32) -> RtsResult<&mut [u8]> {
        let bytes = self.blob_mut(ptr.blob())?.bytes_mut();
        let range = Self::payload_range(ptr, len, bytes.len())?;
        Ok(&mut bytes[range])
    }

    fn payload_range(ptr: PayloadPtr, len: u32, size: usize) -> RtsResult<std::ops::Range<usize>> {
        let start = ptr.offset() as usize;
        let end = start + len as usize;
        if end > size {
            return Err(RtsError::PayloadBounds { offset: ptr.offset(), len, size: size as u32 });
        }
        Ok(start..end)
    }

    /// Objects in address order
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &HeapObject)> {
        self.objects.iter().map(|(addr, obj)| (Handle::from_addr(*addr), obj))
    }

    // Roots

    /// Register `h` as a root; it and everything it reaches survive collection
    pub fn add_root(&mut self, h: Handle) -> RootId {
        if let Some(idx) = self.roots.iter().position(Option::is_none) {
            self.roots[idx] = Some(h);
            return RootId(idx);
        }
        self.roots.push(Some(h));
        RootId(self.roots.len() - 1)
    }

    /// Current handle of a root; changes when the collector moves it
    pub fn root(&self, id: RootId) -> Option<Handle> {
        self.roots.get(id.0).copied().flatten()
    }

    pub fn remove_root(&mut self, id: RootId) -> Option<Handle> {
        self.roots.get_mut(id.0).and_then(Option::take)
    }

    /// Live entries of the root table
    pub fn roots(&self) -> impl Iterator<Item = Handle> + '_ {
        self.roots.iter().flatten().copied()
    }
}
