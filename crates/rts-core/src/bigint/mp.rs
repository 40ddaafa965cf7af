//! Arbitrary-Precision Integer Layer
//!
//! A control structure (sign, used digits, allocated digits, digit pointer)
//! and the digit-level routines that operate on it. The layer knows nothing
//! about the heap: all storage comes from a [`ForeignAlloc`], so the control
//! structure can live embedded in a heap object while its digits live in a
//! separate byte buffer.
//!
//! Digits are 32-bit, little-endian, least significant first. Routines read
//! every operand before allocating, so no borrowed digit storage outlives an
//! allocation.

use std::cmp::Ordering;

use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;
use num_traits::Zero;

use crate::bridge::ForeignAlloc;
use crate::error::{MpError, RtsResult};
use crate::heap::PayloadPtr;

pub type MpDigit = u32;

pub const DIGIT_BITS: u32 = MpDigit::BITS;
pub const DIGIT_BYTES: u32 = DIGIT_BITS / 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MpSign {
    #[default]
    ZPos,
    Neg,
}

/// Bignum control structure.
///
/// Invariants: `used <= alloc`; the digit at `used - 1` is non-zero; zero
/// has sign `ZPos`; `dp`, when set, points at offset 0 of a byte buffer of at
/// least `alloc * DIGIT_BYTES` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MpInt {
    pub used: u32,
    pub alloc: u32,
    pub sign: MpSign,
    pub dp: Option<PayloadPtr>,
}

impl MpInt {
    pub fn is_neg(&self) -> bool {
        self.sign == MpSign::Neg
    }

    pub fn is_zero(&self) -> bool {
        self.used == 0
    }
}

// Saturates: a request that large can never be satisfied and the allocator
// reports it as exhaustion.
fn digit_bytes(digits: u32) -> u32 {
    digits.saturating_mul(DIGIT_BYTES)
}

/// Fresh zero with room for `prec` digits
pub fn mp_init<M: ForeignAlloc + ?Sized>(mem: &mut M, prec: u32) -> RtsResult<MpInt> {
    let dp = mem.calloc(prec, DIGIT_BYTES)?;
    Ok(MpInt { used: 0, alloc: prec, sign: MpSign::ZPos, dp: Some(dp) })
}

/// Make room for at least `size` digits
pub fn mp_grow<M: ForeignAlloc + ?Sized>(mem: &mut M, a: &mut MpInt, size: u32) -> RtsResult<()> {
    if a.alloc >= size {
        return Ok(());
    }
    let new_size = digit_bytes(size);
    let dp = match a.dp {
        Some(dp) => mem.realloc(dp, digit_bytes(a.alloc), new_size)?,
        None => mem.calloc(size, DIGIT_BYTES)?,
    };
    a.dp = Some(dp);
    a.alloc = size;
    Ok(())
}

/// The `used` digits of `a`
fn load<M: ForeignAlloc + ?Sized>(mem: &M, a: &MpInt) -> RtsResult<Vec<MpDigit>> {
    if a.used == 0 {
        return Ok(Vec::new());
    }
    let dp = a.dp.ok_or(MpError::Val)?;
    let bytes = mem.bytes(dp, a.used * DIGIT_BYTES)?;
    Ok(bytes
        .chunks_exact(DIGIT_BYTES as usize)
        .map(|c| MpDigit::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Overwrite `a` with the given sign and magnitude digits
fn store<M: ForeignAlloc + ?Sized>(
    mem: &mut M,
    a: &mut MpInt,
    sign: MpSign,
    digits: &[MpDigit],
) -> RtsResult<()> {
    let used = digits.iter().rposition(|&d| d != 0).map_or(0, |i| i + 1) as u32;
    mp_grow(mem, a, used)?;
    // stale digits above the new top are cleared too
    let span = used.max(a.used);
    if span > 0 {
        let dp = a.dp.ok_or(MpError::Val)?;
        let out = mem.bytes_mut(dp, span * DIGIT_BYTES)?;
        for (i, chunk) in out.chunks_exact_mut(DIGIT_BYTES as usize).enumerate() {
            let d = if i < used as usize { digits[i] } else { 0 };
            chunk.copy_from_slice(&d.to_le_bytes());
        }
    }
    a.used = used;
    a.sign = if used == 0 { MpSign::ZPos } else { sign };
    Ok(())
}

fn to_big<M: ForeignAlloc + ?Sized>(mem: &M, a: &MpInt) -> RtsResult<BigInt> {
    let mag = BigUint::from_slice(&load(mem, a)?);
    let sign = if a.is_neg() { Sign::Minus } else { Sign::Plus };
    Ok(BigInt::from_biguint(sign, mag))
}

fn set_big<M: ForeignAlloc + ?Sized>(mem: &mut M, a: &mut MpInt, v: &BigInt) -> RtsResult<()> {
    let (sign, digits) = v.to_u32_digits();
    let sign = if sign == Sign::Minus { MpSign::Neg } else { MpSign::ZPos };
    store(mem, a, sign, &digits)
}

pub fn mp_set_u32<M: ForeignAlloc + ?Sized>(mem: &mut M, a: &mut MpInt, v: u32) -> RtsResult<()> {
    store(mem, a, MpSign::ZPos, &[v])
}

pub fn mp_set_u64<M: ForeignAlloc + ?Sized>(mem: &mut M, a: &mut MpInt, v: u64) -> RtsResult<()> {
    store(mem, a, MpSign::ZPos, &[v as u32, (v >> 32) as u32])
}

/// `a = 2^b`
pub fn mp_2expt<M: ForeignAlloc + ?Sized>(mem: &mut M, a: &mut MpInt, b: u32) -> RtsResult<()> {
    let mut digits = vec![0; (b / DIGIT_BITS) as usize + 1];
    if let Some(top) = digits.last_mut() {
        *top = 1 << (b % DIGIT_BITS);
    }
    store(mem, a, MpSign::ZPos, &digits)
}

/// Magnitude modulo 2^32
pub fn mp_get_u32<M: ForeignAlloc + ?Sized>(mem: &M, a: &MpInt) -> RtsResult<u32> {
    Ok(load(mem, a)?.first().copied().unwrap_or(0))
}

/// Magnitude modulo 2^64
pub fn mp_get_u64<M: ForeignAlloc + ?Sized>(mem: &M, a: &MpInt) -> RtsResult<u64> {
    let digits = load(mem, a)?;
    let lo = digits.first().copied().unwrap_or(0);
    let hi = digits.get(1).copied().unwrap_or(0);
    Ok(u64::from(hi) << 32 | u64::from(lo))
}

/// Number of bits in the magnitude; 0 for zero
pub fn mp_count_bits<M: ForeignAlloc + ?Sized>(mem: &M, a: &MpInt) -> RtsResult<u32> {
    let digits = load(mem, a)?;
    Ok(match digits.last() {
        Some(&top) => (digits.len() as u32 - 1) * DIGIT_BITS + (DIGIT_BITS - top.leading_zeros()),
        None => 0,
    })
}

fn cmp_mag(a: &[MpDigit], b: &[MpDigit]) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.iter().rev().cmp(b.iter().rev()))
}

pub fn mp_cmp<M: ForeignAlloc + ?Sized>(mem: &M, a: &MpInt, b: &MpInt) -> RtsResult<Ordering> {
    if a.sign != b.sign {
        return Ok(if a.is_neg() { Ordering::Less } else { Ordering::Greater });
    }
    let mag = cmp_mag(&load(mem, a)?, &load(mem, b)?);
    Ok(if a.is_neg() { mag.reverse() } else { mag })
}

pub fn mp_add<M: ForeignAlloc + ?Sized>(mem: &mut M, a: &MpInt, b: &MpInt, c: &mut MpInt) -> RtsResult<()> {
    let sum = to_big(mem, a)? + to_big(mem, b)?;
    set_big(mem, c, &sum)
}

pub fn mp_sub<M: ForeignAlloc + ?Sized>(mem: &mut M, a: &MpInt, b: &MpInt, c: &mut MpInt) -> RtsResult<()> {
    let diff = to_big(mem, a)? - to_big(mem, b)?;
    set_big(mem, c, &diff)
}

pub fn mp_mul<M: ForeignAlloc + ?Sized>(mem: &mut M, a: &MpInt, b: &MpInt, c: &mut MpInt) -> RtsResult<()> {
    let (x, y) = (to_big(mem, a)?, to_big(mem, b)?);
    mp_grow(mem, c, a.used + b.used)?;
    set_big(mem, c, &(x * y))
}

/// Truncating division: `q = a / b`, `r = a - q * b`. Either output may be
/// omitted. Division by zero is `MpError::Val`.
pub fn mp_div<M: ForeignAlloc + ?Sized>(
    mem: &mut M,
    a: &MpInt,
    b: &MpInt,
    q: Option<&mut MpInt>,
    r: Option<&mut MpInt>,
) -> RtsResult<()> {
    if b.is_zero() {
        return Err(MpError::Val.into());
    }
    let (quot, rem) = to_big(mem, a)?.div_rem(&to_big(mem, b)?);
    if let Some(q) = q {
        set_big(mem, q, &quot)?;
    }
    if let Some(r) = r {
        set_big(mem, r, &rem)?;
    }
    Ok(())
}

pub fn mp_neg<M: ForeignAlloc + ?Sized>(mem: &mut M, a: &MpInt, c: &mut MpInt) -> RtsResult<()> {
    let digits = load(mem, a)?;
    let sign = if a.is_neg() { MpSign::ZPos } else { MpSign::Neg };
    store(mem, c, sign, &digits)
}

pub fn mp_abs<M: ForeignAlloc + ?Sized>(mem: &mut M, a: &MpInt, c: &mut MpInt) -> RtsResult<()> {
    let digits = load(mem, a)?;
    store(mem, c, MpSign::ZPos, &digits)
}

/// `c = a^e`
pub fn mp_expt_u32<M: ForeignAlloc + ?Sized>(mem: &mut M, a: &MpInt, e: u32, c: &mut MpInt) -> RtsResult<()> {
    let base = to_big(mem, a)?;
    // Reserve the result's lower size bound first so an unsatisfiable result
    // fails in the allocator instead of during the computation.
    let bits = base.bits();
    if bits > 1 && e > 1 {
        let min_bits = (bits - 1).saturating_mul(u64::from(e)).saturating_add(1);
        let digits = u32::try_from(min_bits.div_ceil(u64::from(DIGIT_BITS))).unwrap_or(u32::MAX);
        mp_grow(mem, c, digits)?;
    }
    set_big(mem, c, &base.pow(e))
}

/// `c = a * 2^b`; a negative `b` is `MpError::Val`
pub fn mp_mul_2d<M: ForeignAlloc + ?Sized>(mem: &mut M, a: &MpInt, b: i32, c: &mut MpInt) -> RtsResult<()> {
    let shift = u32::try_from(b).map_err(|_| MpError::Val)?;
    let x = to_big(mem, a)?;
    if !x.is_zero() {
        mp_grow(mem, c, a.used + shift.div_ceil(DIGIT_BITS))?;
    }
    set_big(mem, c, &(x << shift as usize))
}

/// Parse an optionally signed numeral in `radix`
pub fn mp_read_radix<M: ForeignAlloc + ?Sized>(mem: &mut M, a: &mut MpInt, s: &str, radix: u32) -> RtsResult<()> {
    if !(2..=36).contains(&radix) {
        return Err(MpError::Val.into());
    }
    // Digit separators are not part of a numeral
    if s.contains('_') {
        return Err(MpError::Val.into());
    }
    let v = BigInt::parse_bytes(s.as_bytes(), radix).ok_or(MpError::Val)?;
    set_big(mem, a, &v)
}

pub fn mp_to_radix<M: ForeignAlloc + ?Sized>(mem: &M, a: &MpInt, radix: u32) -> RtsResult<String> {
    if !(2..=36).contains(&radix) {
        return Err(MpError::Val.into());
    }
    Ok(to_big(mem, a)?.to_str_radix(radix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RtsConfig;
    use crate::error::RtsError;
    use crate::heap::Heap;

    fn heap() -> Heap {
        Heap::new(RtsConfig::new())
    }

    fn int(heap: &mut Heap, s: &str) -> MpInt {
        let mut a = mp_init(heap, 2).expect("init");
        mp_read_radix(heap, &mut a, s, 10).expect("parse");
        a
    }

    fn dec(heap: &Heap, a: &MpInt) -> String {
        mp_to_radix(heap, a, 10).expect("render")
    }

    #[test]
    fn init_allocates_prec_digits() {
        let mut heap = heap();
        let a = mp_init(&mut heap, 4).expect("init");
        assert_eq!((a.used, a.alloc, a.sign), (0, 4, MpSign::ZPos));
        let dp = a.dp.expect("digits");
        assert_eq!(heap.blob(dp.blob()).expect("blob").len(), 16);
    }

    #[test]
    fn grow_replaces_digit_buffer_and_keeps_digits() {
        let mut heap = heap();
        let mut a = mp_init(&mut heap, 1).expect("init");
        mp_set_u32(&mut heap, &mut a, 0xDEAD_BEEF).expect("set");
        let old = a.dp;
        mp_grow(&mut heap, &mut a, 8).expect("grow");
        assert_ne!(a.dp, old);
        assert_eq!(a.alloc, 8);
        assert_eq!(mp_get_u32(&heap, &a).expect("get"), 0xDEAD_BEEF);
    }

    #[test]
    fn set_u64_clamps_leading_zero_digits() {
        let mut heap = heap();
        let mut a = mp_init(&mut heap, 2).expect("init");
        mp_set_u64(&mut heap, &mut a, 5).expect("set");
        assert_eq!(a.used, 1);
        mp_set_u64(&mut heap, &mut a, 0).expect("set");
        assert!(a.is_zero());
        mp_set_u64(&mut heap, &mut a, u64::MAX).expect("set");
        assert_eq!(a.used, 2);
        assert_eq!(mp_get_u64(&heap, &a).expect("get"), u64::MAX);
    }

    #[test]
    fn two_expt_has_expected_bit_count() {
        let mut heap = heap();
        let mut a = mp_init(&mut heap, 1).expect("init");
        mp_2expt(&mut heap, &mut a, 64).expect("2expt");
        assert_eq!(mp_count_bits(&heap, &a).expect("bits"), 65);
        assert_eq!(dec(&heap, &a), "18446744073709551616");
    }

    #[test]
    fn compare_orders_signs_then_magnitudes() {
        let mut heap = heap();
        let a = int(&mut heap, "-100000000000000000000");
        let b = int(&mut heap, "-5");
        let c = int(&mut heap, "0");
        let d = int(&mut heap, "4294967296");
        assert_eq!(mp_cmp(&heap, &a, &b).expect("cmp"), Ordering::Less);
        assert_eq!(mp_cmp(&heap, &b, &c).expect("cmp"), Ordering::Less);
        assert_eq!(mp_cmp(&heap, &d, &c).expect("cmp"), Ordering::Greater);
        assert_eq!(mp_cmp(&heap, &d, &d).expect("cmp"), Ordering::Equal);
    }

    #[test]
    fn division_truncates_toward_zero() {
        let mut heap = heap();
        let a = int(&mut heap, "-7");
        let b = int(&mut heap, "2");
        let mut q = mp_init(&mut heap, 1).expect("init");
        let mut r = mp_init(&mut heap, 1).expect("init");
        mp_div(&mut heap, &a, &b, Some(&mut q), Some(&mut r)).expect("div");
        assert_eq!(dec(&heap, &q), "-3");
        assert_eq!(dec(&heap, &r), "-1");
    }

    #[test]
    fn division_by_zero_is_invalid_operand() {
        let mut heap = heap();
        let a = int(&mut heap, "1");
        let z = int(&mut heap, "0");
        let mut q = mp_init(&mut heap, 1).expect("init");
        let err = mp_div(&mut heap, &a, &z, Some(&mut q), None).unwrap_err();
        assert_eq!(err, RtsError::BigInt(MpError::Val));
    }

    #[test]
    fn result_may_alias_operand_storage() {
        let mut heap = heap();
        let mut n = int(&mut heap, "3");
        let mut sub = mp_init(&mut heap, 1).expect("init");
        mp_2expt(&mut heap, &mut sub, 32).expect("2expt");
        let cur = n;
        mp_sub(&mut heap, &cur, &sub, &mut n).expect("sub");
        assert_eq!(dec(&heap, &n), "-4294967293");
    }

    #[test]
    fn negative_shift_is_invalid_operand() {
        let mut heap = heap();
        let a = int(&mut heap, "1");
        let mut c = mp_init(&mut heap, 1).expect("init");
        assert_eq!(mp_mul_2d(&mut heap, &a, -1, &mut c).unwrap_err(), RtsError::BigInt(MpError::Val));
        mp_mul_2d(&mut heap, &a, 100, &mut c).expect("shift");
        assert_eq!(mp_count_bits(&heap, &c).expect("bits"), 101);
    }

    #[test]
    fn huge_power_fails_in_the_allocator() {
        let mut heap = Heap::new(RtsConfig::new().with_heap_limit(1 << 20));
        let a = int(&mut heap, "3");
        let mut c = mp_init(&mut heap, 1).expect("init");
        let err = mp_expt_u32(&mut heap, &a, u32::MAX, &mut c).unwrap_err();
        assert!(matches!(err, RtsError::OutOfMemory { .. }));
    }

    #[test]
    fn power_of_unit_base_needs_no_reservation() {
        let mut heap = heap();
        let a = int(&mut heap, "-1");
        let mut c = mp_init(&mut heap, 1).expect("init");
        mp_expt_u32(&mut heap, &a, u32::MAX, &mut c).expect("pow");
        assert_eq!(dec(&heap, &c), "-1");
    }

    #[test]
    fn malformed_numeral_is_invalid_operand() {
        let mut heap = heap();
        let mut a = mp_init(&mut heap, 1).expect("init");
        let err = mp_read_radix(&mut heap, &mut a, "12x", 10).unwrap_err();
        assert_eq!(err, RtsError::BigInt(MpError::Val));
    }

    #[test]
    fn digit_separators_are_rejected() {
        let mut heap = heap();
        let mut a = mp_init(&mut heap, 1).expect("init");
        for s in ["1_000", "_1", "1_", "-2_5"] {
            let err = mp_read_radix(&mut heap, &mut a, s, 10).unwrap_err();
            assert_eq!(err, RtsError::BigInt(MpError::Val), "{}", s);
        }
        mp_read_radix(&mut heap, &mut a, "-1000", 10).expect("parse");
        assert_eq!(dec(&heap, &a), "-1000");
    }
}
