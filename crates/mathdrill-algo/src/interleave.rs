//! Round-robin interleaving of per-skill question draws.

/// Merge per-skill groups into one ordered list, taking one element from
/// each non-empty group per round. Keeps a session from clustering all of
/// one skill's questions consecutively while preserving each group's
/// internal order.
pub fn interleave<T>(groups: Vec<Vec<T>>) -> Vec<T> {
    let total: usize = groups.iter().map(Vec::len).sum();
    let mut merged = Vec::with_capacity(total);
    let mut iters: Vec<std::vec::IntoIter<T>> = groups.into_iter().map(Vec::into_iter).collect();

    while merged.len() < total {
        for iter in iters.iter_mut() {
            if let Some(item) = iter.next() {
                merged.push(item);
            }
        }
    }

    merged
}
