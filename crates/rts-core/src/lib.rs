//! Runtime Support Core
//!
//! Public API surface for the runtime support core: the tagged heap, the
//! allocation bridge, the bignum engine and the identity codec.

pub mod error;
pub mod config;
pub mod heap;
pub mod bridge;
pub mod bigint;
pub mod principal;
pub mod text;
pub mod blob_iter;

// Re-export commonly used types
pub use error::{MpError, RtsError, RtsResult};
pub use config::RtsConfig;
pub use heap::{GcStats, Handle, Heap, HeapChecker, HeapObject, PayloadPtr, RootId, Tag, Word};
pub use bridge::ForeignAlloc;
