//! Balanced contiguous partitioning of the page list.

/// A contiguous, order-preserving slice of the input assigned to one worker.
#[derive(Debug, PartialEq, Eq)]
pub struct WorkShard<'a, T> {
    /// Worker index, also the index of the fragment this shard produces.
    pub index: usize,
    pub items: &'a [T],
}

impl<T> Clone for WorkShard<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for WorkShard<'_, T> {}

impl<T> WorkShard<'_, T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Shard sizes for `count` items over `workers` workers.
///
/// The first `count % workers` shards get `ceil(count / workers)` items, the
/// rest `floor(count / workers)`. Empty shards are dropped, so fewer items
/// than workers yields one shard per item. `workers == 0` is treated as 1.
pub fn shard_sizes(count: usize, workers: usize) -> Vec<usize> {
    let workers = workers.max(1);
    let small = count / workers;
    let with_extra = count % workers;
    (0..workers)
        .map(|i| if i < with_extra { small + 1 } else { small })
        .filter(|&size| size > 0)
        .collect()
}

/// Split `items` into balanced contiguous shards, one per worker.
pub fn partition<T>(items: &[T], workers: usize) -> Vec<WorkShard<'_, T>> {
    let mut rest = items;
    shard_sizes(items.len(), workers)
        .into_iter()
        .enumerate()
        .map(|(index, size)| {
            let (head, tail) = rest.split_at(size);
            rest = tail;
            WorkShard { index, items: head }
        })
        .collect()
}
