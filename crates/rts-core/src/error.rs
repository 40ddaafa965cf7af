//! RTS Error Types
//!
//! Defines all error conditions produced by the runtime support core.
//! Every variant is unrecoverable at the host boundary: the message is what the
//! trap reports, so it names the rule that failed.

use thiserror::Error;

use crate::heap::Tag;

/// Status codes of the arbitrary-precision arithmetic layer.
///
/// Success is `Ok(())`; these are the failure statuses. `Mem` is part of the
/// closed set but never produced, because the allocator reports exhaustion
/// itself as [`RtsError::OutOfMemory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MpError {
    #[error("out of memory")]
    Mem,
    #[error("invalid operand")]
    Val,
    #[error("maximum iterations reached")]
    Iter,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RtsError {
    // Identity text
    #[error("blob_of_principal: too short for an ic: URL")]
    PrincipalTooShort,
    #[error("blob_of_principal: Wrong URL scheme (not 'ic:')")]
    PrincipalScheme,
    #[error("blob_of_principal: Not all uppercase hex digit")]
    PrincipalNotUppercaseHex,
    #[error("blob_of_principal: Not an even number of hex digits")]
    PrincipalOddHexDigits,
    #[error("blob_of_principal: CRC-8 mismatch")]
    PrincipalCrcMismatch,

    // Arithmetic
    #[error("bigint: {0}")]
    BigInt(#[from] MpError),
    #[error("bigint: value does not fit in {target}")]
    BigIntOverflow { target: &'static str },

    // Blob iteration
    #[error("blob_iter_next: iterator exhausted")]
    BlobIterExhausted,

    // Heap & resources
    #[error("out of memory: requested {requested} bytes, {available} available")]
    OutOfMemory { requested: u64, available: u64 },
    #[error("invalid heap handle: {0:#x}")]
    InvalidHandle(u32),
    #[error("tag mismatch: expected {expected:?}, found {found:?}")]
    TagMismatch { expected: Tag, found: Tag },
    #[error("payload access out of bounds: {offset}+{len} exceeds {size}")]
    PayloadBounds { offset: u32, len: u32, size: u32 },
    #[error("heap check failed at {addr:#x}: {reason}")]
    HeapCheck { addr: u32, reason: String },
}

pub type RtsResult<T> = Result<T, RtsError>;
