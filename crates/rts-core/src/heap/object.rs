//! Heap Object Layouts
//!
//! One variant per tag, each with its own typed fields. The variant decides
//! the object's size in words and which of its fields the collector traces.

use crate::bigint::MpInt;

use super::tag::Tag;
use super::value::{bytes_to_words, Handle, Word};

/// Words taken by the embedded bignum control structure
/// (used, alloc, sign, digit pointer).
pub const MP_INT_WORDS: u32 = 4;

/// Byte buffer payload: UTF-8 text or opaque bytes such as bignum digits.
/// The length word is the length of `bytes`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Blob {
    bytes: Vec<u8>,
}

impl Blob {
    /// Zero-filled buffer of `len` bytes
    pub fn zeroed(len: u32) -> Self {
        Blob { bytes: vec![0; len as usize] }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Blob { bytes }
    }

    pub fn len(&self) -> u32 {
        self.bytes.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Shrink the recorded length; bytes past it are dropped
    pub fn truncate(&mut self, len: u32) {
        self.bytes.truncate(len as usize);
    }
}

/// A heap object, discriminated by its tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeapObject {
    Invalid,
    Object { hash: Handle, fields: Vec<Word> },
    ObjInd(Word),
    Array(Vec<Word>),
    Reference(u32),
    Int(i64),
    MutBox(Word),
    Closure { func: u32, captured: Vec<Word> },
    Some(Word),
    Variant { tag: u32, field: Word },
    Blob(Blob),
    Indirection(Word),
    SmallWord(u32),
    BigInt(MpInt),
}

impl HeapObject {
    pub fn tag(&self) -> Tag {
        match self {
            HeapObject::Invalid => Tag::Invalid,
            HeapObject::Object { .. } => Tag::Object,
            HeapObject::ObjInd(_) => Tag::ObjInd,
            HeapObject::Array(_) => Tag::Array,
            HeapObject::Reference(_) => Tag::Reference,
            HeapObject::Int(_) => Tag::Int,
            HeapObject::MutBox(_) => Tag::MutBox,
            HeapObject::Closure { .. } => Tag::Closure,
            HeapObject::Some(_) => Tag::Some,
            HeapObject::Variant { .. } => Tag::Variant,
            HeapObject::Blob(_) => Tag::Blob,
            HeapObject::Indirection(_) => Tag::Indirection,
            HeapObject::SmallWord(_) => Tag::SmallWord,
            HeapObject::BigInt(_) => Tag::BigInt,
        }
    }

    /// Size in words, tag word included
    pub fn size_words(&self) -> u32 {
        match self {
            HeapObject::Invalid => 1,
            HeapObject::Object { fields, .. } => 3 + fields.len() as u32,
            HeapObject::Array(elems) => 2 + elems.len() as u32,
            HeapObject::Closure { captured, .. } => 3 + captured.len() as u32,
            HeapObject::Int(_) | HeapObject::Variant { .. } => 3,
            HeapObject::ObjInd(_)
            | HeapObject::Reference(_)
            | HeapObject::MutBox(_)
            | HeapObject::Some(_)
            | HeapObject::Indirection(_)
            | HeapObject::SmallWord(_) => 2,
            HeapObject::Blob(blob) => 2 + bytes_to_words(blob.len()),
            HeapObject::BigInt(_) => 1 + MP_INT_WORDS,
        }
    }

    /// Visit every traced pointer field.
    ///
    /// A bignum's digit pointer is not a traced field; see
    /// [`HeapObject::digit_buffer`].
    pub fn for_each_pointer(&self, mut f: impl FnMut(Handle)) {
        self.fields().iter().filter_map(|w| w.as_ptr()).for_each(&mut f);
        if let HeapObject::Object { hash, .. } = self {
            f(*hash);
        }
    }

    /// Rewrite every traced pointer field in place
    pub fn for_each_pointer_mut(&mut self, mut f: impl FnMut(&mut Handle)) {
        if let HeapObject::Object { hash, .. } = self {
            f(hash);
        }
        for word in self.fields_mut() {
            if let Word::Ptr(h) = word {
                f(h);
            }
        }
    }

    /// Byte buffer holding this bignum's digits, if any
    pub fn digit_buffer(&self) -> Option<Handle> {
        match self {
            HeapObject::BigInt(mp) => mp.dp.map(|dp| dp.blob()),
            _ => None,
        }
    }

    fn fields(&self) -> &[Word] {
        match self {
            HeapObject::Object { fields, .. } => fields,
            HeapObject::Array(elems) => elems,
            HeapObject::Closure { captured, .. } => captured,
            HeapObject::ObjInd(w)
            | HeapObject::MutBox(w)
            | HeapObject::Some(w)
            | HeapObject::Indirection(w)
            | HeapObject::Variant { field: w, .. } => std::slice::from_ref(w),
            _ => &[],
        }
    }

    fn fields_mut(&mut self) -> &mut [Word] {
        match self {
            HeapObject::Object { fields, .. } => fields,
            HeapObject::Array(elems) => elems,
            HeapObject::Closure { captured, .. } => captured,
            HeapObject::ObjInd(w)
            | HeapObject::MutBox(w)
            | HeapObject::Some(w)
            | HeapObject::Indirection(w)
            | HeapObject::Variant { field: w, .. } => std::slice::from_mut(w),
            _ => &mut [],
        }
    }
}
