//! Longest increasing subsequence over model positions.

/// Returns the indices (into `values`) of one longest strictly increasing
/// subsequence, in ascending index order.
///
/// Patience sorting with predecessor links, `O(n log n)`.
pub(crate) fn longest_increasing_subsequence(values: &[usize]) -> Vec<usize> {
    let mut tails: Vec<usize> = Vec::new();
    let mut predecessors: Vec<Option<usize>> = vec![None; values.len()];

    for (index, value) in values.iter().enumerate() {
        let position = tails.partition_point(|tail| values[*tail] < *value);
        if position > 0 {
            predecessors[index] = Some(tails[position - 1]);
        }
        if position == tails.len() {
            tails.push(index);
        } else {
            tails[position] = index;
        }
    }

    let mut sequence = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(index) = cursor {
        sequence.push(index);
        cursor = predecessors[index];
    }
    sequence.reverse();
    sequence
}
