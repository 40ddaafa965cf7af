//! Host Boundary
//!
//! Exported entry points of the runtime support core. Each entry point runs
//! to completion or traps through the [`Host`]; errors never cross this
//! boundary as values, and no partial result is ever returned.
//!
//! Collection is not triggered by entry points. The host calls
//! [`Runtime::schedule_collect`] (or [`Runtime::collect`] to force it) between
//! invocations, after registering the handles it still needs as roots.

pub use rts_core::{GcStats, Handle, Heap, RootId, RtsConfig, RtsError, RtsResult};

pub mod trap;

pub use trap::{Host, PanicHost, RecordingHost};

use log::error;

use rts_core::bigint;
use rts_core::blob_iter;
use rts_core::bridge::{self, ForeignAlloc};
use rts_core::principal;
use rts_core::text;

/// A heap plus the host that receives its traps
pub struct Runtime<H: Host> {
    heap: Heap,
    host: H,
}

impl<H: Host> Runtime<H> {
    pub fn new(config: RtsConfig, host: H) -> Self {
        Runtime { heap: Heap::new(config), host }
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Unwrap a core result, trapping on error
    fn ok<T>(&self, result: RtsResult<T>) -> T {
        match result {
            Ok(v) => v,
            Err(e) => {
                let msg = e.to_string();
                error!("trap: {}", msg);
                self.host.trap(&msg)
            }
        }
    }

    // Identity codec

    pub fn blob_of_principal(&mut self, text: Handle) -> Handle {
        let r = principal::blob_of_principal(&mut self.heap, text);
        self.ok(r)
    }

    pub fn principal_of_blob(&mut self, blob: Handle) -> Handle {
        let r = principal::principal_of_blob(&mut self.heap, blob);
        self.ok(r)
    }

    pub fn base32_to_principal(&mut self, blob: Handle) -> Handle {
        let r = principal::base32_to_principal(&mut self.heap, blob);
        self.ok(r)
    }

    // Text and blobs

    pub fn text_of_str(&mut self, s: &str) -> Handle {
        let r = text::text_of_str(&mut self.heap, s);
        self.ok(r)
    }

    pub fn version(&mut self) -> Handle {
        let r = text::version(&mut self.heap);
        self.ok(r)
    }

    pub fn blob_bytes(&self, blob: Handle) -> &[u8] {
        self.ok(self.heap.blob_bytes(blob))
    }

    pub fn blob_iter(&mut self, blob: Handle) -> Handle {
        let r = blob_iter::blob_iter(&mut self.heap, blob);
        self.ok(r)
    }

    pub fn blob_iter_done(&self, iter: Handle) -> bool {
        self.ok(blob_iter::blob_iter_done(&self.heap, iter))
    }

    pub fn blob_iter_next(&mut self, iter: Handle) -> u8 {
        let r = blob_iter::blob_iter_next(&mut self.heap, iter);
        self.ok(r)
    }

    // Bignum construction and rendering

    pub fn bigint_of_u32(&mut self, v: u32) -> Handle {
        let r = bigint::bigint_of_u32(&mut self.heap, v);
        self.ok(r)
    }

    pub fn bigint_of_i32(&mut self, v: i32) -> Handle {
        let r = bigint::bigint_of_i32(&mut self.heap, v);
        self.ok(r)
    }

    pub fn bigint_of_u64(&mut self, v: u64) -> Handle {
        let r = bigint::bigint_of_u64(&mut self.heap, v);
        self.ok(r)
    }

    pub fn bigint_of_i64(&mut self, v: i64) -> Handle {
        let r = bigint::bigint_of_i64(&mut self.heap, v);
        self.ok(r)
    }

    pub fn bigint_of_decimal(&mut self, s: &str) -> Handle {
        let r = bigint::bigint_of_decimal(&mut self.heap, s);
        self.ok(r)
    }

    pub fn bigint_to_decimal(&self, a: Handle) -> String {
        self.ok(bigint::bigint_to_decimal(&self.heap, a))
    }

    // Narrowing

    pub fn bigint_to_u32_wrap(&self, a: Handle) -> u32 {
        self.ok(bigint::bigint_to_u32_wrap(&self.heap, a))
    }

    pub fn bigint_to_i32_wrap(&self, a: Handle) -> i32 {
        self.ok(bigint::bigint_to_i32_wrap(&self.heap, a))
    }

    pub fn bigint_to_u64_wrap(&self, a: Handle) -> u64 {
        self.ok(bigint::bigint_to_u64_wrap(&self.heap, a))
    }

    pub fn bigint_to_i64_wrap(&self, a: Handle) -> i64 {
        self.ok(bigint::bigint_to_i64_wrap(&self.heap, a))
    }

    pub fn bigint_to_u32_trap(&self, a: Handle) -> u32 {
        self.ok(bigint::bigint_to_u32_trap(&self.heap, a))
    }

    pub fn bigint_to_i32_trap(&self, a: Handle) -> i32 {
        self.ok(bigint::bigint_to_i32_trap(&self.heap, a))
    }

    pub fn bigint_to_u64_trap(&self, a: Handle) -> u64 {
        self.ok(bigint::bigint_to_u64_trap(&self.heap, a))
    }

    pub fn bigint_to_i64_trap(&self, a: Handle) -> i64 {
        self.ok(bigint::bigint_to_i64_trap(&self.heap, a))
    }

    // Comparison

    pub fn bigint_eq(&self, a: Handle, b: Handle) -> bool {
        self.ok(bigint::bigint_eq(&self.heap, a, b))
    }

    pub fn bigint_lt(&self, a: Handle, b: Handle) -> bool {
        self.ok(bigint::bigint_lt(&self.heap, a, b))
    }

    pub fn bigint_gt(&self, a: Handle, b: Handle) -> bool {
        self.ok(bigint::bigint_gt(&self.heap, a, b))
    }

    pub fn bigint_le(&self, a: Handle, b: Handle) -> bool {
        self.ok(bigint::bigint_le(&self.heap, a, b))
    }

    pub fn bigint_ge(&self, a: Handle, b: Handle) -> bool {
        self.ok(bigint::bigint_ge(&self.heap, a, b))
    }

    // Arithmetic

    pub fn bigint_add(&mut self, a: Handle, b: Handle) -> Handle {
        let r = bigint::bigint_add(&mut self.heap, a, b);
        self.ok(r)
    }

    pub fn bigint_sub(&mut self, a: Handle, b: Handle) -> Handle {
        let r = bigint::bigint_sub(&mut self.heap, a, b);
        self.ok(r)
    }

    pub fn bigint_mul(&mut self, a: Handle, b: Handle) -> Handle {
        let r = bigint::bigint_mul(&mut self.heap, a, b);
        self.ok(r)
    }

    pub fn bigint_div(&mut self, a: Handle, b: Handle) -> Handle {
        let r = bigint::bigint_div(&mut self.heap, a, b);
        self.ok(r)
    }

    pub fn bigint_rem(&mut self, a: Handle, b: Handle) -> Handle {
        let r = bigint::bigint_rem(&mut self.heap, a, b);
        self.ok(r)
    }

    pub fn bigint_pow(&mut self, a: Handle, b: Handle) -> Handle {
        let r = bigint::bigint_pow(&mut self.heap, a, b);
        self.ok(r)
    }

    pub fn bigint_neg(&mut self, a: Handle) -> Handle {
        let r = bigint::bigint_neg(&mut self.heap, a);
        self.ok(r)
    }

    pub fn bigint_abs(&mut self, a: Handle) -> Handle {
        let r = bigint::bigint_abs(&mut self.heap, a);
        self.ok(r)
    }

    pub fn bigint_lsh(&mut self, a: Handle, b: i32) -> Handle {
        let r = bigint::bigint_lsh(&mut self.heap, a, b);
        self.ok(r)
    }

    pub fn bigint_isneg(&self, a: Handle) -> bool {
        self.ok(bigint::bigint_isneg(&self.heap, a))
    }

    pub fn bigint_count_bits(&self, a: Handle) -> u32 {
        self.ok(bigint::bigint_count_bits(&self.heap, a))
    }

    // Raw allocator ABI: payload addresses in, payload addresses out

    pub fn mp_calloc(&mut self, count: u32, elem_size: u32) -> u32 {
        let r = self.heap.calloc(count, elem_size);
        self.ok(r).addr()
    }

    pub fn mp_realloc(&mut self, addr: u32, old_size: u32, new_size: u32) -> u32 {
        let r = bridge::payload_ptr_from_addr(&self.heap, addr)
            .and_then(|ptr| self.heap.realloc(ptr, old_size, new_size));
        self.ok(r).addr()
    }

    pub fn mp_free(&mut self, addr: u32, size: u32) {
        let r = bridge::payload_ptr_from_addr(&self.heap, addr);
        let ptr = self.ok(r);
        self.heap.free(ptr, size);
    }

    // Roots and collection

    pub fn add_root(&mut self, h: Handle) -> RootId {
        self.heap.add_root(h)
    }

    /// Current handle of a root, trapping if the slot is empty
    pub fn root(&self, id: RootId) -> Handle {
        match self.heap.root(id) {
            Some(h) => h,
            None => self.host.trap("root: slot is empty"),
        }
    }

    pub fn remove_root(&mut self, id: RootId) -> Option<Handle> {
        self.heap.remove_root(id)
    }

    /// Safe point: reclaim unreachable objects; unrooted handles are invalid afterwards
    pub fn collect(&mut self) -> GcStats {
        let r = self.heap.collect();
        self.ok(r)
    }

    /// Safe point that collects only when the heap has grown enough since the
    /// last collection; `None` when it was skipped
    pub fn schedule_collect(&mut self) -> Option<GcStats> {
        let r = self.heap.schedule_collect();
        self.ok(r)
    }
}
