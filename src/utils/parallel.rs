//! Cost-aware fork-join execution over index ranges
//!
//! Every bulk element-wise or row-wise operation in the crate goes through this
//! module. An index range `[0, length)` is cut into contiguous, near-equal chunks
//! and each chunk runs as its own task inside a `rayon::scope`; the call returns
//! only when every chunk has finished.
//!
//! Chunk boundaries depend only on `(length, worker_count)`: the base chunk size is
//! `length / worker_count` and the first `length % worker_count` chunks receive one
//! extra index each.

use log::trace;
use std::ops::Range;

/// Total estimated cost (per-index cost × number of indices) above which
/// [`dynamic_parallel_for`] and [`dynamic_parallel_for_mut`] spread the work across
/// threads. A cost of 1 corresponds roughly to a single addition.
pub const PARALLEL_COST_MINIMUM: usize = 50_000;

/// Number of hardware threads available to the fork-join scheduler.
pub fn hardware_threads() -> usize {
    rayon::current_num_threads().max(1)
}

/// Worker count used for a loop of `length` indices.
///
/// A non-zero `thread_count` is used as-is; zero means
/// `clamp(hardware_threads(), 1, length)`.
pub fn worker_count(length: usize, thread_count: usize) -> usize {
    if thread_count > 0 {
        thread_count
    } else {
        hardware_threads().clamp(1, length.max(1))
    }
}

/// Splits `[0, length)` into `workers` contiguous ranges.
///
/// The result always holds exactly `workers` ranges (at least one); trailing ranges
/// are empty when `workers > length`.
///
/// # Examples
///
/// ```
/// use ann_engine::utils::parallel::chunk_ranges;
///
/// assert_eq!(chunk_ranges(10, 3), vec![0..4, 4..7, 7..10]);
/// assert_eq!(chunk_ranges(2, 3), vec![0..1, 1..2, 2..2]);
/// ```
pub fn chunk_ranges(length: usize, workers: usize) -> Vec<Range<usize>> {
    let workers = workers.max(1);
    let base = length / workers;
    let extra = length % workers;

    let mut start = 0;
    (0..workers)
        .map(|worker| {
            let end = start + base + usize::from(worker < extra);
            let range = start..end;
            start = end;
            range
        })
        .collect()
}

/// Runs `body(i)` for every `i` in `[0, length)` across worker tasks.
///
/// Blocks until all chunks complete. `body` runs concurrently on disjoint index
/// ranges, so it must not rely on any ordering between indices.
pub fn parallel_for<F>(length: usize, body: F, thread_count: usize)
where
    F: Fn(usize) + Sync,
{
    if length == 0 {
        return;
    }

    let workers = worker_count(length, thread_count);
    trace!("parallel_for: {} indices over {} workers", length, workers);

    let body = &body;
    rayon::scope(|scope| {
        for range in chunk_ranges(length, workers) {
            if range.is_empty() {
                continue;
            }
            scope.spawn(move |_| range.for_each(body));
        }
    });
}

/// Runs `body(i, &mut data[i])` for every slot of `data` across worker tasks.
///
/// The slice is split along the same boundaries as [`parallel_for`], so each task
/// holds exclusive access to its own slots.
pub fn parallel_for_mut<T, F>(data: &mut [T], body: F, thread_count: usize)
where
    T: Send,
    F: Fn(usize, &mut T) + Sync,
{
    let length = data.len();
    if length == 0 {
        return;
    }

    let workers = worker_count(length, thread_count);
    trace!("parallel_for_mut: {} slots over {} workers", length, workers);

    let body = &body;
    rayon::scope(|scope| {
        let mut rest = data;
        for range in chunk_ranges(length, workers) {
            let (chunk, tail) = std::mem::take(&mut rest).split_at_mut(range.len());
            rest = tail;
            if chunk.is_empty() {
                continue;
            }
            scope.spawn(move |_| {
                for (offset, slot) in chunk.iter_mut().enumerate() {
                    body(range.start + offset, slot);
                }
            });
        }
    });
}

/// Decides whether a loop of `length` indices at `cost` per index is worth threading.
///
/// An explicit `parallelize` override always wins.
pub fn should_parallelize(cost: usize, length: usize, parallelize: Option<bool>) -> bool {
    parallelize.unwrap_or_else(|| cost.saturating_mul(length) > PARALLEL_COST_MINIMUM)
}

/// [`parallel_for`] when the estimated cost warrants it, otherwise a plain
/// sequential loop in index order.
pub fn dynamic_parallel_for<F>(
    cost: usize,
    length: usize,
    body: F,
    parallelize: Option<bool>,
    thread_count: usize,
) where
    F: Fn(usize) + Sync,
{
    if should_parallelize(cost, length, parallelize) {
        parallel_for(length, body, thread_count);
    } else {
        (0..length).for_each(body);
    }
}

/// [`parallel_for_mut`] when the estimated cost warrants it, otherwise a plain
/// sequential loop in index order.
pub fn dynamic_parallel_for_mut<T, F>(
    cost: usize,
    data: &mut [T],
    body: F,
    parallelize: Option<bool>,
    thread_count: usize,
) where
    T: Send,
    F: Fn(usize, &mut T) + Sync,
{
    if should_parallelize(cost, data.len(), parallelize) {
        parallel_for_mut(data, body, thread_count);
    } else {
        for (index, slot) in data.iter_mut().enumerate() {
            body(index, slot);
        }
    }
}
