//! Relocating Collector
//!
//! Mark-compact collection run at explicit safe points. Live objects slide
//! down to the heap base in address order, so any object may move.
//!
//! [`Heap::schedule_collect`] is the budgeted variant: it collects only once
//! the heap has grown enough since the previous collection.
//!
//! A bignum's digit pointer is not an ordinary traced field: it points into
//! the payload of a byte buffer, not at an object header. Marking treats it as
//! keeping that buffer alive, and relocation rewrites it to the buffer's new
//! home.

use std::collections::{BTreeMap, HashSet};

use log::{debug, trace};

use crate::error::{RtsError, RtsResult};

use super::check::HeapChecker;
use super::heap::Heap;
use super::object::HeapObject;
use super::tag::Tag;
use super::value::{Handle, WORD_SIZE};

/// Outcome of one collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GcStats {
    pub live_bytes: u32,
    pub reclaimed_bytes: u32,
    pub moved_objects: usize,
}

impl Heap {
    /// Reclaim everything unreachable from the root table and compact the rest
    pub fn collect(&mut self) -> RtsResult<GcStats> {
        let before = self.heap_size();
        let live = self.mark()?;

        // Forwarding table: old address -> new address
        let mut forward = BTreeMap::new();
        let mut to = self.config.heap_base;
        for (addr, obj) in &self.objects {
            if live.contains(addr) {
                forward.insert(*addr, to);
                to += obj.size_words() * WORD_SIZE;
            }
        }

        let fwd = |h: Handle| forward.get(&h.addr()).map_or(h, |&a| Handle::from_addr(a));
        let mut moved_objects = 0;
        let old = std::mem::take(&mut self.objects);
        for (addr, mut obj) in old {
            let Some(&new_addr) = forward.get(&addr) else {
                continue;
            };
            if new_addr != addr {
                moved_objects += 1;
            }
            obj.for_each_pointer_mut(|h| *h = fwd(*h));
            if let HeapObject::BigInt(mp) = &mut obj {
                if let Some(dp) = mp.dp.as_mut() {
                    dp.retarget(fwd(dp.blob()));
                }
            }
            self.objects.insert(new_addr, obj);
        }
        for root in self.roots.iter_mut().flatten() {
            *root = fwd(*root);
        }
        self.hp = to;
        self.last_live = self.heap_size();

        let stats = GcStats {
            live_bytes: self.heap_size(),
            reclaimed_bytes: before - self.heap_size(),
            moved_objects,
        };
        debug!(
            "gc: {} live bytes, {} reclaimed, {} objects moved",
            stats.live_bytes, stats.reclaimed_bytes, stats.moved_objects
        );

        if self.config.check_after_gc {
            HeapChecker::check(self)?;
        }
        Ok(stats)
    }

    /// True once the heap has grown past the last live size by half of it,
    /// or by `gc_min_growth` bytes if that is larger
    pub fn should_collect(&self) -> bool {
        let growth = (self.last_live / 2).max(self.config.gc_min_growth);
        self.heap_size() >= self.last_live.saturating_add(growth)
    }

    /// Safe point that collects only when [`Heap::should_collect`] holds
    pub fn schedule_collect(&mut self) -> RtsResult<Option<GcStats>> {
        if !self.should_collect() {
            trace!("gc: skipped at {} bytes, {} live after last collection", self.heap_size(), self.last_live);
            return Ok(None);
        }
        self.collect().map(Some)
    }

    /// Addresses of every object reachable from the roots
    fn mark(&self) -> RtsResult<HashSet<u32>> {
        let mut live = HashSet::new();
        let mut stack: Vec<Handle> = self.roots().collect();

        while let Some(h) = stack.pop() {
            if !live.insert(h.addr()) {
                continue;
            }
            let obj = self.get(h)?;
            obj.for_each_pointer(|p| stack.push(p));
            if let Some(buf) = obj.digit_buffer() {
                let found = self.tag(buf)?;
                if found != Tag::Blob {
                    return Err(RtsError::HeapCheck {
                        addr: h.addr(),
                        reason: format!("digit pointer targets a {:?} object", found),
                    });
                }
                live.insert(buf.addr());
            }
        }
        Ok(live)
    }
}
