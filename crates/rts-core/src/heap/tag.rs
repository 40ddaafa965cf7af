//! Heap Tag Definitions
//!
//! Defines the closed set of heap object tags.
//! Tag values are shared with the code generator and must stay in sync with it.

/// Heap object tags
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Invalid     = 0,
    Object      = 1,
    ObjInd      = 2,
    Array       = 3,
    Reference   = 4,
    Int         = 5,
    MutBox      = 6,
    Closure     = 7,
    Some        = 8,
    Variant     = 9,
    Blob        = 10,
    Indirection = 11,
    SmallWord   = 12,
    BigInt      = 13,
}

impl Tag {
    /// Convert a raw tag word to a tag
    pub fn from_u32(word: u32) -> Option<Self> {
        match word {
            0 => Some(Tag::Invalid),
            1 => Some(Tag::Object),
            2 => Some(Tag::ObjInd),
            3 => Some(Tag::Array),
            4 => Some(Tag::Reference),
            5 => Some(Tag::Int),
            6 => Some(Tag::MutBox),
            7 => Some(Tag::Closure),
            8 => Some(Tag::Some),
            9 => Some(Tag::Variant),
            10 => Some(Tag::Blob),
            11 => Some(Tag::Indirection),
            12 => Some(Tag::SmallWord),
            13 => Some(Tag::BigInt),
            _ => None,
        }
    }

    /// Raw tag word
    pub fn as_u32(self) -> u32 {
        self as u32
    }
}
