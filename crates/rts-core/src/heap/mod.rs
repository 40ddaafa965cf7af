pub mod check;
pub mod gc;
pub mod heap;
pub mod object;
pub mod tag;
pub mod value;

pub use check::HeapChecker;
pub use gc::GcStats;
pub use heap::{Heap, RootId};
pub use object::{Blob, HeapObject};
pub use tag::Tag;
pub use value::{Handle, PayloadPtr, Word, BLOB_HEADER_BYTES, WORD_SIZE};
