//! Read-only parallel scans over the working buffer.
//!
//! Both scans fan out over a rayon pool, each worker producing an
//! independent partial result, and merge once every worker has finished.

pub mod missing;
pub mod scorer;

/// Split `0..positions` into at most `workers` contiguous, non-empty ranges.
pub(crate) fn partition(positions: usize, workers: usize) -> Vec<std::ops::Range<usize>> {
    if positions == 0 {
        return Vec::new();
    }
    let workers = workers.clamp(1, positions);
    let chunk = (positions + workers - 1) / workers;
    (0..positions)
        .step_by(chunk)
        .map(|start| start..(start + chunk).min(positions))
        .collect()
}

pub fn default_workers() -> usize {
    rayon::current_num_threads().max(1)
}
