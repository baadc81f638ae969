// Ordered parallel post-processing using Rayon
//
// Scanning stays single-threaded. Rows coming out of a scanner are owned
// values, so they can be batched and fanned out to the rayon pool for
// expensive per-row work (validation, enrichment, conversion):
// 1. Single-threaded: pull up to `batch_size` rows from the source
// 2. Parallel: map the batch with `into_par_iter`
// 3. Yield the mapped batch in input order, then pull the next one

use rayon::prelude::*;
use std::vec;

/// Default number of rows mapped per parallel batch.
pub const DEFAULT_BATCH_SIZE: usize = 1024;

/// Iterator returned by [`map_ordered`].
pub struct OrderedMap<I, F, U> {
    source: I,
    f: F,
    batch_size: usize,
    ready: vec::IntoIter<U>,
}

/// Map `rows` through `f` on the rayon pool, yielding results in input order.
///
/// At most `batch_size` rows are held at a time. A `batch_size` of zero is
/// treated as one.
pub fn map_ordered<I, T, U, F>(rows: I, batch_size: usize, f: F) -> OrderedMap<I::IntoIter, F, U>
where
    I: IntoIterator<Item = T>,
    T: Send,
    U: Send,
    F: Fn(T) -> U + Sync + Send,
{
    OrderedMap {
        source: rows.into_iter(),
        f,
        batch_size: batch_size.max(1),
        ready: Vec::new().into_iter(),
    }
}

impl<I, T, U, F> Iterator for OrderedMap<I, F, U>
where
    I: Iterator<Item = T>,
    T: Send,
    U: Send,
    F: Fn(T) -> U + Sync + Send,
{
    type Item = U;

    fn next(&mut self) -> Option<U> {
        if let Some(item) = self.ready.next() {
            return Some(item);
        }
        let batch: Vec<T> = self.source.by_ref().take(self.batch_size).collect();
        if batch.is_empty() {
            return None;
        }
        let f = &self.f;
        // collect() on an indexed parallel iterator keeps the input order
        let mapped: Vec<U> = batch.into_par_iter().map(f).collect();
        self.ready = mapped.into_iter();
        self.ready.next()
    }
}
