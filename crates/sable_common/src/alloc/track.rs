//! Process-wide allocation accounting.
//!
//! Every block [`SystemAlloc`](crate::alloc::SystemAlloc) hands out is
//! counted here, so tests (and leak hunts) can check that a failed bulk
//! operation left the live-block ledger exactly where it found it. Counters
//! are monotonic where possible; with tests running in parallel only relative
//! assertions are meaningful.

use std::sync::atomic::{AtomicUsize, Ordering};

use once_cell::sync::Lazy;

#[derive(Default)]
struct TrackStats {
    live_blocks: AtomicUsize,
    live_bytes: AtomicUsize,
    total_allocs: AtomicUsize,
    total_deallocs: AtomicUsize,
    peak_bytes: AtomicUsize,
}

static STATS: Lazy<TrackStats> = Lazy::new(TrackStats::default);

pub(crate) fn on_alloc(bytes: usize) {
    let stats = &*STATS;
    stats.live_blocks.fetch_add(1, Ordering::Relaxed);
    stats.total_allocs.fetch_add(1, Ordering::Relaxed);
    let live = stats.live_bytes.fetch_add(bytes, Ordering::Relaxed) + bytes;
    stats.peak_bytes.fetch_max(live, Ordering::Relaxed);
}

pub(crate) fn on_dealloc(bytes: usize) {
    let stats = &*STATS;
    stats.live_blocks.fetch_sub(1, Ordering::Relaxed);
    stats.live_bytes.fetch_sub(bytes, Ordering::Relaxed);
    stats.total_deallocs.fetch_add(1, Ordering::Relaxed);
}

/// Number of system-heap blocks currently live.
pub fn live_blocks() -> usize {
    STATS.live_blocks.load(Ordering::Relaxed)
}

/// Bytes of system-heap storage currently live.
pub fn live_bytes() -> usize {
    STATS.live_bytes.load(Ordering::Relaxed)
}

/// Total number of allocations since process start.
pub fn total_allocs() -> usize {
    STATS.total_allocs.load(Ordering::Relaxed)
}

/// Total number of deallocations since process start.
pub fn total_deallocs() -> usize {
    STATS.total_deallocs.load(Ordering::Relaxed)
}

/// High-water mark of live bytes.
pub fn peak_bytes() -> usize {
    STATS.peak_bytes.load(Ordering::Relaxed)
}
