//! Exact nearest-neighbour search over a flat vector table.

use crate::types::QuestionId;
use serde::Serialize;

/// One search hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor {
    pub id: QuestionId,
    /// Squared Euclidean distance to the query; smaller is closer.
    pub distance: f32,
}

/// Squared Euclidean distance between two vectors of equal length.
///
/// # Panics
/// In debug builds, if the vectors have different lengths.
#[must_use]
pub fn squared_euclidean(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "Vectors must have same dimension");

    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum()
}

/// Finds the `k` stored vectors closest to `query`.
///
/// `vectors` is row-major with one row of `dimension` values per entry in
/// `ids`. Results are ordered by ascending distance; equal distances keep
/// insertion order, so the earlier row wins. The caller guarantees that
/// `dimension` is non-zero and `query.len() == dimension`.
///
/// # Algorithm
/// 1. Score every row against the query
/// 2. Partition the `k` smallest to the front (`select_nth_unstable_by`)
/// 3. Sort only that prefix
pub(crate) fn nearest(
    ids: &[QuestionId],
    vectors: &[f32],
    dimension: usize,
    query: &[f32],
    k: usize,
) -> Vec<Neighbor> {
    if k == 0 || ids.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(usize, f32)> = vectors
        .chunks_exact(dimension)
        .map(|row| squared_euclidean(query, row))
        .enumerate()
        .collect();

    // Position is part of the key, which makes the order total and the
    // tie-break independent of the selection algorithm.
    let by_distance_then_position =
        |a: &(usize, f32), b: &(usize, f32)| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0));

    if k < scored.len() {
        scored.select_nth_unstable_by(k - 1, by_distance_then_position);
        scored.truncate(k);
    }
    scored.sort_unstable_by(by_distance_then_position);

    scored
        .into_iter()
        .map(|(position, distance)| Neighbor {
            id: ids[position],
            distance,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[u32]) -> Vec<QuestionId> {
        raw.iter().map(|&id| QuestionId::new(id).unwrap()).collect()
    }

    #[test]
    fn test_squared_euclidean() {
        assert_eq!(squared_euclidean(&[0.0, 0.0], &[3.0, 4.0]), 25.0);
        assert_eq!(squared_euclidean(&[1.5, -2.0], &[1.5, -2.0]), 0.0);
    }

    #[test]
    fn test_nearest_orders_by_distance() {
        let table = ids(&[1, 2, 3]);
        let vectors = [0.0, 0.0, 1.0, 0.0, 5.0, 5.0];

        let hits = nearest(&table, &vectors, 2, &[0.9, 0.0], 2);

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id.get(), 2);
        assert!((hits[0].distance - 0.01).abs() < 1e-5);
        assert_eq!(hits[1].id.get(), 1);
        assert!((hits[1].distance - 0.81).abs() < 1e-5);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        // Four identical vectors plus one farther away, ids out of numeric order.
        let table = ids(&[40, 10, 30, 20, 50]);
        let vectors = [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 9.0, 9.0];

        let hits = nearest(&table, &vectors, 2, &[1.0, 1.0], 3);
        let order: Vec<u32> = hits.iter().map(|n| n.id.get()).collect();
        assert_eq!(order, vec![40, 10, 30]);

        let all = nearest(&table, &vectors, 2, &[1.0, 1.0], 5);
        let order: Vec<u32> = all.iter().map(|n| n.id.get()).collect();
        assert_eq!(order, vec![40, 10, 30, 20, 50]);
    }

    #[test]
    fn test_k_bounds() {
        let table = ids(&[1, 2]);
        let vectors = [0.0, 1.0];

        assert!(nearest(&table, &vectors, 1, &[0.0], 0).is_empty());
        assert_eq!(nearest(&table, &vectors, 1, &[0.0], 10).len(), 2);
        assert!(nearest(&[], &[], 1, &[0.0], 3).is_empty());
    }
}
