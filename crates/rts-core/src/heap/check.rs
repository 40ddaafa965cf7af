//! Heap Sanity Checker
//!
//! Walks the whole heap and verifies the structural invariants the collector
//! and the bignum layer rely on. Run after collection in debug builds.

use crate::bigint::mp::DIGIT_BYTES;
use crate::bigint::{MpInt, MpSign};
use crate::error::{RtsError, RtsResult};

use super::heap::Heap;
use super::object::HeapObject;
use super::value::{Handle, WORD_SIZE};

pub struct HeapChecker<'a> {
    heap: &'a Heap,
}

impl<'a> HeapChecker<'a> {
    /// Check every root and every object; the first violation is returned
    pub fn check(heap: &'a Heap) -> RtsResult<()> {
        let checker = HeapChecker { heap };
        checker.check_roots()?;
        checker.check_objects()
    }

    fn fail(addr: u32, reason: impl Into<String>) -> RtsError {
        RtsError::HeapCheck { addr, reason: reason.into() }
    }

    fn check_roots(&self) -> RtsResult<()> {
        for root in self.heap.roots() {
            if self.heap.get(root).is_err() {
                return Err(Self::fail(root.addr(), "root does not point at an object"));
            }
        }
        Ok(())
    }

    fn check_objects(&self) -> RtsResult<()> {
        let base = self.heap.config().heap_base;
        let mut prev_end = base;

        for (h, obj) in self.heap.iter() {
            let addr = h.addr();
            if addr % WORD_SIZE != 0 {
                return Err(Self::fail(addr, "misaligned object"));
            }
            if addr < prev_end {
                return Err(Self::fail(addr, "object overlaps its predecessor"));
            }
            prev_end = addr + obj.size_words() * WORD_SIZE;
            if prev_end > self.heap.heap_pointer() {
                return Err(Self::fail(addr, "object extends past the heap pointer"));
            }

            let mut dangling = None;
            obj.for_each_pointer(|p| {
                if dangling.is_none() && self.heap.get(p).is_err() {
                    dangling = Some(p);
                }
            });
            if let Some(p) = dangling {
                return Err(Self::fail(addr, format!("dangling field {:?}", p)));
            }

            if let HeapObject::BigInt(mp) = obj {
                self.check_bigint(h, mp)?;
            }
        }
        Ok(())
    }

    fn check_bigint(&self, h: Handle, mp: &MpInt) -> RtsResult<()> {
        let addr = h.addr();
        if mp.used > mp.alloc {
            return Err(Self::fail(addr, "bignum uses more digits than allocated"));
        }
        if mp.used == 0 && mp.sign == MpSign::Neg {
            return Err(Self::fail(addr, "negative zero"));
        }

        let Some(dp) = mp.dp else {
            if mp.used != 0 {
                return Err(Self::fail(addr, "bignum has digits but no storage"));
            }
            return Ok(());
        };
        if dp.offset() != 0 {
            return Err(Self::fail(addr, "digit pointer is not at the start of its buffer"));
        }
        let blob = match self.heap.get(dp.blob()) {
            Ok(HeapObject::Blob(blob)) => blob,
            Ok(other) => {
                let reason = format!("digit pointer targets a {:?} object", other.tag());
                return Err(Self::fail(addr, reason));
            }
            Err(_) => return Err(Self::fail(addr, "digit pointer targets no object")),
        };
        if u64::from(blob.len()) < u64::from(mp.alloc) * u64::from(DIGIT_BYTES) {
            return Err(Self::fail(addr, "digit buffer smaller than allocation"));
        }
        if mp.used > 0 {
            let top = (mp.used as usize - 1) * DIGIT_BYTES as usize;
            if blob.bytes()[top..top + DIGIT_BYTES as usize].iter().all(|&b| b == 0) {
                return Err(Self::fail(addr, "bignum is not clamped"));
            }
        }
        Ok(())
    }
}
