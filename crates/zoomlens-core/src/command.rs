//! Lock-free ingestion of asynchronously delivered zoom commands.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Single-slot mailbox holding the most recent zoom command.
///
/// Producers may call [`submit`](Self::submit) at any time relative to the
/// simulation tick; intermediate values coalesce and a poll observes only
/// the latest one. The value is stored before the dirty flag is raised, so a
/// reader that wins the swap always sees at least the value that raised it.
/// Neither side blocks the other.
#[derive(Debug)]
pub struct CommandLatch {
    /// Latest commanded zoom factor, as f64 bits.
    value: AtomicU64,
    /// Raised on submit, cleared by take.
    dirty: AtomicBool,
}

impl CommandLatch {
    /// Create a latch holding `initial` with the dirty flag clear.
    pub fn new(initial: f64) -> Self {
        Self {
            value: AtomicU64::new(initial.to_bits()),
            dirty: AtomicBool::new(false),
        }
    }

    /// Store a newly commanded zoom factor. Never blocks, never fails.
    pub fn submit(&self, value: f64) {
        self.value.store(value.to_bits(), Ordering::Release);
        self.dirty.store(true, Ordering::Release);
    }

    /// Consume the pending command, if any.
    ///
    /// Clears the dirty flag and returns the latest submitted value, or
    /// `None` when nothing was submitted since the previous take.
    pub fn take(&self) -> Option<f64> {
        if self.dirty.swap(false, Ordering::AcqRel) {
            Some(f64::from_bits(self.value.load(Ordering::Acquire)))
        } else {
            None
        }
    }

    /// Latest submitted value, without consuming the dirty flag.
    pub fn peek(&self) -> f64 {
        f64::from_bits(self.value.load(Ordering::Acquire))
    }
}

impl Default for CommandLatch {
    fn default() -> Self {
        Self::new(1.0)
    }
}
