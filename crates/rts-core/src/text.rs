//! Text Helpers
//!
//! Text is stored as a byte buffer of UTF-8.

use crate::error::RtsResult;
use crate::heap::{Handle, Heap};

/// Runtime version reported to hosts
pub const VERSION: &str = "0.1";

pub fn text_of_str(heap: &mut Heap, s: &str) -> RtsResult<Handle> {
    heap.alloc_blob_from(s.as_bytes())
}

/// Version string as a fresh text object
pub fn version(heap: &mut Heap) -> RtsResult<Handle> {
    text_of_str(heap, VERSION)
}
