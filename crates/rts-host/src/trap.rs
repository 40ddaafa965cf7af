//! Trap Primitive
//!
//! The host supplies the abort primitive. A trap never returns: it unwinds
//! or terminates the whole invocation.

use std::sync::{Arc, Mutex};

/// Host services consumed by the runtime
pub trait Host {
    /// Abort the current invocation with a diagnostic message
    fn trap(&self, msg: &str) -> !;
}

/// Host whose trap is a Rust panic carrying the message
#[derive(Debug, Clone, Copy, Default)]
pub struct PanicHost;

impl Host for PanicHost {
    fn trap(&self, msg: &str) -> ! {
        panic!("{}", msg)
    }
}

/// Panicking host that also keeps a log of every trap message.
///
/// Clones share the log, so a test can keep one clone and hand the other to
/// a runtime.
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    log: Arc<Mutex<Vec<String>>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a trap message
    pub fn record(&self, msg: &str) {
        if let Ok(mut log) = self.log.lock() {
            log.push(msg.to_string());
        }
    }

    /// Snapshot of the messages recorded so far
    pub fn messages(&self) -> Vec<String> {
        match self.log.lock() {
            Ok(log) => log.clone(),
            Err(_) => Vec::new(),
        }
    }
}

impl Host for RecordingHost {
    fn trap(&self, msg: &str) -> ! {
        self.record(msg);
        panic!("{}", msg)
    }
}
