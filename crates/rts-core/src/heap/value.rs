//! Heap Value Representation
//!
//! Handles, field words and interior payload pointers.
//! A handle is the object's address plus one, so the raw value 0 is never a
//! live object and handles are distinguishable from word-aligned scalars.

use std::fmt;
use std::num::NonZeroU32;

/// Bytes per heap word
pub const WORD_SIZE: u32 = 4;

/// Tag word plus length word
pub const BLOB_HEADER_BYTES: u32 = 2 * WORD_SIZE;

/// Round a byte count up to whole words
pub fn bytes_to_words(bytes: u32) -> u32 {
    bytes.div_ceil(WORD_SIZE)
}

/// Opaque reference to a heap object
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(NonZeroU32);

impl Handle {
    /// Handle of the object starting at `addr`.
    ///
    /// Only for addresses the heap hands out: every object ends at or below
    /// `heap_limit`, so `addr + 1` cannot overflow.
    pub(crate) fn from_addr(addr: u32) -> Self {
        debug_assert!(addr < u32::MAX, "address {:#x} has no handle", addr);
        Handle(NonZeroU32::MIN.saturating_add(addr))
    }

    /// Handle of the object starting at an arbitrary address; `None` for the
    /// one address that has no encoding
    pub fn try_from_addr(addr: u32) -> Option<Self> {
        addr.checked_add(1).and_then(NonZeroU32::new).map(Handle)
    }

    /// Rebuild a handle from its raw encoding; 0 is the null sentinel
    pub fn from_raw(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Handle)
    }

    /// Raw encoding as seen by generated code
    pub fn raw(self) -> u32 {
        self.0.get()
    }

    /// Address of the object's tag word
    pub fn addr(self) -> u32 {
        self.0.get() - 1
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({:#x})", self.raw())
    }
}

/// Field word of a heap object: either an unboxed scalar or a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Word {
    Scalar(u32),
    Ptr(Handle),
}

impl Word {
    pub fn as_ptr(self) -> Option<Handle> {
        match self {
            Word::Ptr(h) => Some(h),
            Word::Scalar(_) => None,
        }
    }

    pub fn as_scalar(self) -> Option<u32> {
        match self {
            Word::Scalar(v) => Some(v),
            Word::Ptr(_) => None,
        }
    }
}

impl From<Handle> for Word {
    fn from(h: Handle) -> Self {
        Word::Ptr(h)
    }
}

/// Interior pointer into the payload of a byte-buffer object.
///
/// Kept as an (owning buffer, byte offset) pair so the collector can rewrite
/// it when the buffer moves. The raw address only exists at the host ABI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadPtr {
    blob: Handle,
    offset: u32,
}

impl PayloadPtr {
    pub fn new(blob: Handle, offset: u32) -> Self {
        PayloadPtr { blob, offset }
    }

    /// Pointer to the first payload byte of `blob`
    pub fn start_of(blob: Handle) -> Self {
        Self::new(blob, 0)
    }

    /// Owning byte-buffer object
    pub fn blob(self) -> Handle {
        self.blob
    }

    pub fn offset(self) -> u32 {
        self.offset
    }

    /// Raw payload address
    pub fn addr(self) -> u32 {
        self.blob.addr() + BLOB_HEADER_BYTES + self.offset
    }

    /// Recover a payload-start pointer from a raw address by stepping back
    /// over the buffer header. The caller must still check that a byte-buffer
    /// object lives there.
    pub fn from_addr(addr: u32) -> Option<Self> {
        let header = addr.checked_sub(BLOB_HEADER_BYTES)?;
        Handle::try_from_addr(header).map(Self::start_of)
    }

    pub(crate) fn retarget(&mut self, blob: Handle) {
        self.blob = blob;
    }
}
