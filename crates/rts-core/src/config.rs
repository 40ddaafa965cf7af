//! RTS Configuration
//!
//! Defines heap limits and bignum sizing for the runtime support core.
//! Configuration specifies constraints only; enforcement is handled by the heap.

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct RtsConfig {
    /// Address of the first dynamic heap object (word aligned)
    pub heap_base: u32,

    /// Highest address the heap may grow to
    pub heap_limit: u32,

    /// Initial digit capacity of a fresh bignum
    pub mp_prec: u32,

    /// Run the heap checker after every collection
    pub check_after_gc: bool,

    /// Least growth in bytes since the last collection before a scheduled
    /// collection runs
    pub gc_min_growth: u32,
}

impl Default for RtsConfig {
    fn default() -> Self {
        RtsConfig {
            heap_base: 0x1_0000,
            heap_limit: 64 * 1024 * 1024,
            mp_prec: 4,
            check_after_gc: cfg!(debug_assertions),
            gc_min_growth: 1024 * 1024,
        }
    }
}

impl RtsConfig {
    /// Create a new configuration with default limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Same configuration with a different heap limit
    pub fn with_heap_limit(mut self, heap_limit: u32) -> Self {
        self.heap_limit = heap_limit;
        self
    }
}
