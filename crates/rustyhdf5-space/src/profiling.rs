//! Transfer profiling hooks.
//!
//! The [`TransferProfiler`] trait defines callbacks for byte moves, sequence
//! batches and conversion-path lookups. The [`DefaultProfiler`]
//! implementation uses atomic counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Callbacks fired by the transfer engine.
///
/// Implement this trait to collect custom metrics or forward events to
/// an external monitoring system.
pub trait TransferProfiler: Send + Sync {
    /// Bytes moved from the store into memory.
    fn on_read(&self, bytes: u64);

    /// Bytes moved from memory into the store.
    fn on_write(&self, bytes: u64);

    /// A sequence-list batch was pulled from one side.
    fn on_batch(&self, sequences: usize);

    /// A transfer took the single-move fast path.
    fn on_direct(&self);

    /// A conversion-path lookup; `hit` is false when the path was built.
    fn on_path_lookup(&self, hit: bool);
}

/// Profiler backed by atomic counters.
#[derive(Debug, Default)]
pub struct DefaultProfiler {
    pub bytes_read: AtomicU64,
    pub read_count: AtomicU64,
    pub bytes_written: AtomicU64,
    pub write_count: AtomicU64,
    /// Batches pulled from either side.
    pub batches: AtomicU64,
    /// Sequences across all batches.
    pub sequences: AtomicU64,
    pub direct_transfers: AtomicU64,
    pub path_hits: AtomicU64,
    pub path_misses: AtomicU64,
}

impl DefaultProfiler {
    /// Create a new profiler with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes read from stores.
    pub fn total_bytes_read(&self) -> u64 {
        self.bytes_read.load(Ordering::Relaxed)
    }

    /// Store read calls.
    pub fn total_reads(&self) -> u64 {
        self.read_count.load(Ordering::Relaxed)
    }

    /// Bytes written to stores.
    pub fn total_bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }

    /// Store write calls.
    pub fn total_writes(&self) -> u64 {
        self.write_count.load(Ordering::Relaxed)
    }

    /// Sequences handed to stores.
    pub fn total_sequences(&self) -> u64 {
        self.sequences.load(Ordering::Relaxed)
    }

    /// Transfers that took the direct path.
    pub fn total_direct(&self) -> u64 {
        self.direct_transfers.load(Ordering::Relaxed)
    }

    /// Path-cache hit rate in [0.0, 1.0]; 0.0 before any lookup.
    pub fn path_hit_rate(&self) -> f64 {
        let hits = self.path_hits.load(Ordering::Relaxed);
        let misses = self.path_misses.load(Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        for c in [
            &self.bytes_read,
            &self.read_count,
            &self.bytes_written,
            &self.write_count,
            &self.batches,
            &self.sequences,
            &self.direct_transfers,
            &self.path_hits,
            &self.path_misses,
        ] {
            c.store(0, Ordering::Relaxed);
        }
    }
}

impl TransferProfiler for DefaultProfiler {
    fn on_read(&self, bytes: u64) {
        self.bytes_read.fetch_add(bytes, Ordering::Relaxed);
        self.read_count.fetch_add(1, Ordering::Relaxed);
    }

    fn on_write(&self, bytes: u64) {
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
        self.write_count.fetch_add(1, Ordering::Relaxed);
    }

    fn on_batch(&self, sequences: usize) {
        self.batches.fetch_add(1, Ordering::Relaxed);
        self.sequences.fetch_add(sequences as u64, Ordering::Relaxed);
    }

    fn on_direct(&self) {
        self.direct_transfers.fetch_add(1, Ordering::Relaxed);
    }

    fn on_path_lookup(&self, hit: bool) {
        if hit {
            self.path_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.path_misses.fetch_add(1, Ordering::Relaxed);
        }
    }
}
