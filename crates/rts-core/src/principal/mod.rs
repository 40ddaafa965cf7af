//! Identity Codec
//!
//! Textual identities have the form `ic:` + uppercase hex of the payload +
//! two uppercase hex digits of the payload's CRC-8. Decoding validates the
//! text rule by rule and fails with a distinct error per rule.
//!
//! The grouped form used for public display is produced from base-32 text by
//! lower-casing it and inserting a hyphen after every five characters.

pub mod crc8;

use log::trace;

use crate::error::{RtsError, RtsResult};
use crate::heap::{Handle, Heap};

pub use crc8::crc8;

/// Scheme tag plus the two checksum digits
const MIN_TEXT_LEN: usize = 5;
const SCHEME_LEN: usize = 3;
const GROUP_LEN: usize = 5;

fn is_upper_hex(c: u8) -> bool {
    c.is_ascii_digit() || (b'A'..=b'F').contains(&c)
}

fn hex_byte(digits: &[u8]) -> RtsResult<u8> {
    let mut out = [0u8; 1];
    hex::decode_to_slice(digits, &mut out).map_err(|_| RtsError::PrincipalNotUppercaseHex)?;
    Ok(out[0])
}

/// Validate identity text and return its payload, checksum stripped
pub fn decode_principal(text: &[u8]) -> RtsResult<Vec<u8>> {
    let n = text.len();
    if n < MIN_TEXT_LEN {
        return Err(RtsError::PrincipalTooShort);
    }
    if !text[..2].eq_ignore_ascii_case(b"ic") || text[2] != b':' {
        return Err(RtsError::PrincipalScheme);
    }
    let hex = &text[SCHEME_LEN..];
    if !hex.iter().all(|&c| is_upper_hex(c)) {
        return Err(RtsError::PrincipalNotUppercaseHex);
    }
    let (payload_hex, checksum_hex) = hex.split_at(hex.len() - 2);
    if payload_hex.len() % 2 != 0 {
        return Err(RtsError::PrincipalOddHexDigits);
    }

    let payload = hex::decode(payload_hex).map_err(|_| RtsError::PrincipalNotUppercaseHex)?;
    if crc8(&payload) != hex_byte(checksum_hex)? {
        return Err(RtsError::PrincipalCrcMismatch);
    }
    Ok(payload)
}

/// Render a payload as identity text
pub fn encode_principal(payload: &[u8]) -> String {
    let mut text = String::with_capacity(SCHEME_LEN + 2 * payload.len() + 2);
    text.push_str("ic:");
    text.push_str(&hex::encode_upper(payload));
    text.push_str(&hex::encode_upper([crc8(payload)]));
    text
}

/// Lower-case `src` into `dest`, hyphenating after every full group except
/// the last. Returns the number of bytes written.
fn group_into(src: &[u8], dest: &mut [u8]) -> usize {
    let mut w = 0;
    for (i, &c) in src.iter().enumerate() {
        dest[w] = c.to_ascii_lowercase();
        w += 1;
        if (i + 1) % GROUP_LEN == 0 && i + 1 < src.len() {
            dest[w] = b'-';
            w += 1;
        }
    }
    w
}

/// Buffer size reserved for the grouped form of `n` bytes
fn grouped_capacity(n: usize) -> usize {
    n.div_ceil(GROUP_LEN) * (GROUP_LEN + 1)
}

/// Grouped, lower-cased form of base-32 text
pub fn group_base32(src: &[u8]) -> Vec<u8> {
    let mut out = vec![0; grouped_capacity(src.len())];
    let written = group_into(src, &mut out);
    out.truncate(written);
    out
}

// Heap entry points

/// Decode the identity text held in byte buffer `text` into a fresh buffer
pub fn blob_of_principal(heap: &mut Heap, text: Handle) -> RtsResult<Handle> {
    let payload = decode_principal(heap.blob_bytes(text)?)?;
    trace!("blob_of_principal: {} payload bytes", payload.len());
    heap.alloc_blob_from(&payload)
}

/// Encode byte buffer `blob` as identity text in a fresh buffer
pub fn principal_of_blob(heap: &mut Heap, blob: Handle) -> RtsResult<Handle> {
    let text = encode_principal(heap.blob_bytes(blob)?);
    heap.alloc_blob_from(text.as_bytes())
}

/// Group base-32 text in buffer `blob`.
///
/// The result buffer is reserved at its worst-case size and then trimmed to
/// the bytes actually written.
pub fn base32_to_principal(heap: &mut Heap, blob: Handle) -> RtsResult<Handle> {
    let src = heap.blob_bytes(blob)?.to_vec();
    let r = heap.alloc_blob(grouped_capacity(src.len()) as u32)?;
    let out = heap.blob_mut(r)?;
    let written = group_into(&src, out.bytes_mut());
    out.truncate(written as u32);
    Ok(r)
}
