//! Bignum Entry Points
//!
//! Heap-level bignum operations. Every result is a fresh bignum object whose
//! control structure is embedded in the object and whose digits live in a
//! byte buffer obtained through the allocation bridge.

use std::cmp::Ordering;

use crate::error::{RtsError, RtsResult};
use crate::heap::{Handle, Heap, HeapObject};

use super::mp::{self, MpInt};

/// Allocate a bignum object holding zero
fn bigint_alloc(heap: &mut Heap) -> RtsResult<Handle> {
    let r = heap.alloc(HeapObject::BigInt(MpInt::default()))?;
    let prec = heap.config().mp_prec;
    let value = mp::mp_init(heap, prec)?;
    heap.set_bigint(r, value)?;
    Ok(r)
}

/// Allocate a result object and let `f` fill its control structure
fn with_result(
    heap: &mut Heap,
    f: impl FnOnce(&mut Heap, &mut MpInt) -> RtsResult<()>,
) -> RtsResult<Handle> {
    let r = bigint_alloc(heap)?;
    let mut out = heap.bigint(r)?;
    f(heap, &mut out)?;
    heap.set_bigint(r, out)?;
    Ok(r)
}

fn binary(
    heap: &mut Heap,
    a: Handle,
    b: Handle,
    op: fn(&mut Heap, &MpInt, &MpInt, &mut MpInt) -> RtsResult<()>,
) -> RtsResult<Handle> {
    let (x, y) = (heap.bigint(a)?, heap.bigint(b)?);
    with_result(heap, |heap, out| op(heap, &x, &y, out))
}

fn compare(heap: &Heap, a: Handle, b: Handle) -> RtsResult<Ordering> {
    mp::mp_cmp(heap, &heap.bigint(a)?, &heap.bigint(b)?)
}

// Construction

pub fn bigint_of_u32(heap: &mut Heap, v: u32) -> RtsResult<Handle> {
    with_result(heap, |heap, out| mp::mp_set_u32(heap, out, v))
}

pub fn bigint_of_u64(heap: &mut Heap, v: u64) -> RtsResult<Handle> {
    with_result(heap, |heap, out| mp::mp_set_u64(heap, out, v))
}

/// Build the bit pattern as unsigned, then subtract 2^32 if the scalar was negative
pub fn bigint_of_i32(heap: &mut Heap, v: i32) -> RtsResult<Handle> {
    with_result(heap, |heap, out| {
        mp::mp_set_u32(heap, out, v as u32)?;
        if v < 0 {
            sub_power_of_two(heap, out, 32)?;
        }
        Ok(())
    })
}

/// Build the bit pattern as unsigned, then subtract 2^64 if the scalar was negative
pub fn bigint_of_i64(heap: &mut Heap, v: i64) -> RtsResult<Handle> {
    with_result(heap, |heap, out| {
        mp::mp_set_u64(heap, out, v as u64)?;
        if v < 0 {
            sub_power_of_two(heap, out, 64)?;
        }
        Ok(())
    })
}

fn sub_power_of_two(heap: &mut Heap, n: &mut MpInt, bits: u32) -> RtsResult<()> {
    let mut sub = mp::mp_init(heap, 1)?;
    mp::mp_2expt(heap, &mut sub, bits)?;
    let cur = *n;
    mp::mp_sub(heap, &cur, &sub, n)
}

/// Parse an optionally signed decimal numeral
pub fn bigint_of_decimal(heap: &mut Heap, s: &str) -> RtsResult<Handle> {
    with_result(heap, |heap, out| mp::mp_read_radix(heap, out, s, 10))
}

pub fn bigint_to_decimal(heap: &Heap, a: Handle) -> RtsResult<String> {
    mp::mp_to_radix(heap, &heap.bigint(a)?, 10)
}

// Narrowing

fn overflow(target: &'static str) -> RtsError {
    RtsError::BigIntOverflow { target }
}

/// Magnitude modulo 2^32, two's-complement negated for negative values
pub fn bigint_to_u32_wrap(heap: &Heap, a: Handle) -> RtsResult<u32> {
    let n = heap.bigint(a)?;
    let m = mp::mp_get_u32(heap, &n)?;
    Ok(if n.is_neg() { m.wrapping_neg() } else { m })
}

pub fn bigint_to_i32_wrap(heap: &Heap, a: Handle) -> RtsResult<i32> {
    Ok(bigint_to_u32_wrap(heap, a)? as i32)
}

pub fn bigint_to_u32_trap(heap: &Heap, a: Handle) -> RtsResult<u32> {
    let n = heap.bigint(a)?;
    if n.is_neg() || mp::mp_count_bits(heap, &n)? > 32 {
        return Err(overflow("u32"));
    }
    mp::mp_get_u32(heap, &n)
}

pub fn bigint_to_i32_trap(heap: &Heap, a: Handle) -> RtsResult<i32> {
    let n = heap.bigint(a)?;
    if mp::mp_count_bits(heap, &n)? > 32 {
        return Err(overflow("i32"));
    }
    let m = mp::mp_get_u32(heap, &n)? as i32;
    // The sign check catches magnitudes in (2^31, 2^32) as well as 2^31 for
    // non-negative values; -2^31 survives the negation with its sign intact.
    if n.is_neg() {
        let x = m.wrapping_neg();
        if x >= 0 {
            return Err(overflow("i32"));
        }
        Ok(x)
    } else {
        if m < 0 {
            return Err(overflow("i32"));
        }
        Ok(m)
    }
}

/// Magnitude modulo 2^64, two's-complement negated for negative values
pub fn bigint_to_u64_wrap(heap: &Heap, a: Handle) -> RtsResult<u64> {
    let n = heap.bigint(a)?;
    let m = mp::mp_get_u64(heap, &n)?;
    Ok(if n.is_neg() { m.wrapping_neg() } else { m })
}

pub fn bigint_to_i64_wrap(heap: &Heap, a: Handle) -> RtsResult<i64> {
    Ok(bigint_to_u64_wrap(heap, a)? as i64)
}

pub fn bigint_to_u64_trap(heap: &Heap, a: Handle) -> RtsResult<u64> {
    let n = heap.bigint(a)?;
    if n.is_neg() || mp::mp_count_bits(heap, &n)? > 64 {
        return Err(overflow("u64"));
    }
    mp::mp_get_u64(heap, &n)
}

pub fn bigint_to_i64_trap(heap: &Heap, a: Handle) -> RtsResult<i64> {
    let n = heap.bigint(a)?;
    if mp::mp_count_bits(heap, &n)? > 64 {
        return Err(overflow("i64"));
    }
    let m = mp::mp_get_u64(heap, &n)? as i64;
    if n.is_neg() {
        let x = m.wrapping_neg();
        if x >= 0 {
            return Err(overflow("i64"));
        }
        Ok(x)
    } else {
        if m < 0 {
            return Err(overflow("i64"));
        }
        Ok(m)
    }
}

// Comparison

pub fn bigint_eq(heap: &Heap, a: Handle, b: Handle) -> RtsResult<bool> {
    Ok(compare(heap, a, b)? == Ordering::Equal)
}

pub fn bigint_lt(heap: &Heap, a: Handle, b: Handle) -> RtsResult<bool> {
    Ok(compare(heap, a, b)? == Ordering::Less)
}

pub fn bigint_gt(heap: &Heap, a: Handle, b: Handle) -> RtsResult<bool> {
    Ok(compare(heap, a, b)? == Ordering::Greater)
}

pub fn bigint_le(heap: &Heap, a: Handle, b: Handle) -> RtsResult<bool> {
    Ok(compare(heap, a, b)? != Ordering::Greater)
}

pub fn bigint_ge(heap: &Heap, a: Handle, b: Handle) -> RtsResult<bool> {
    Ok(compare(heap, a, b)? != Ordering::Less)
}

// Arithmetic

pub fn bigint_add(heap: &mut Heap, a: Handle, b: Handle) -> RtsResult<Handle> {
    binary(heap, a, b, mp::mp_add)
}

pub fn bigint_sub(heap: &mut Heap, a: Handle, b: Handle) -> RtsResult<Handle> {
    binary(heap, a, b, mp::mp_sub)
}

pub fn bigint_mul(heap: &mut Heap, a: Handle, b: Handle) -> RtsResult<Handle> {
    binary(heap, a, b, mp::mp_mul)
}

/// Truncating quotient; the remainder half of the division is discarded
pub fn bigint_div(heap: &mut Heap, a: Handle, b: Handle) -> RtsResult<Handle> {
    binary(heap, a, b, |heap, x, y, out| mp::mp_div(heap, x, y, Some(out), None))
}

/// Remainder with the sign of the dividend; the quotient half is discarded
pub fn bigint_rem(heap: &mut Heap, a: Handle, b: Handle) -> RtsResult<Handle> {
    binary(heap, a, b, |heap, x, y, out| mp::mp_div(heap, x, y, None, Some(out)))
}

/// `a^b`; `b` must pass the trapping u32 conversion
pub fn bigint_pow(heap: &mut Heap, a: Handle, b: Handle) -> RtsResult<Handle> {
    let exp = bigint_to_u32_trap(heap, b)?;
    let x = heap.bigint(a)?;
    with_result(heap, |heap, out| mp::mp_expt_u32(heap, &x, exp, out))
}

pub fn bigint_neg(heap: &mut Heap, a: Handle) -> RtsResult<Handle> {
    let x = heap.bigint(a)?;
    with_result(heap, |heap, out| mp::mp_neg(heap, &x, out))
}

pub fn bigint_abs(heap: &mut Heap, a: Handle) -> RtsResult<Handle> {
    let x = heap.bigint(a)?;
    with_result(heap, |heap, out| mp::mp_abs(heap, &x, out))
}

/// `a * 2^b`
pub fn bigint_lsh(heap: &mut Heap, a: Handle, b: i32) -> RtsResult<Handle> {
    let x = heap.bigint(a)?;
    with_result(heap, |heap, out| mp::mp_mul_2d(heap, &x, b, out))
}

pub fn bigint_isneg(heap: &Heap, a: Handle) -> RtsResult<bool> {
    Ok(heap.bigint(a)?.is_neg())
}

pub fn bigint_count_bits(heap: &Heap, a: Handle) -> RtsResult<u32> {
    mp::mp_count_bits(heap, &heap.bigint(a)?)
}
