use std::sync::atomic::{AtomicUsize, Ordering};

// Default heuristic value for this machine.
const DEFAULT_PARALLEL_THRESHOLD: usize = 300;

static PARALLEL_THRESHOLD: AtomicUsize = AtomicUsize::new(DEFAULT_PARALLEL_THRESHOLD);

/// Minimum number of reference particles (or orientations) before the
/// data-parallel kernels are dispatched on the rayon pool. Inputs below the
/// threshold run single-threaded; set it to `usize::MAX` to force serial
/// execution everywhere.
pub fn get_parallel_threshold() -> usize {
    PARALLEL_THRESHOLD.load(Ordering::Relaxed)
}

pub fn set_parallel_threshold(val: usize) {
    PARALLEL_THRESHOLD.store(val, Ordering::Relaxed);
}
