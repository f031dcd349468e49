use crate::axis::Axis;
use crate::matrix::{RatingMatrix, RatingVector};
use crate::similarity::SimilarityMetric;
use crate::{Error, Result};
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use tracing::debug;

/// A candidate entity together with its similarity to the target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub id: u32,
    pub similarity: f64,
}

impl Neighbor {
    pub fn new(id: u32, similarity: f64) -> Self {
        Self { id, similarity }
    }

    /// Descending similarity, then ascending id
    #[inline]
    fn rank_key(&self) -> (Reverse<OrderedFloat<f64>>, u32) {
        (Reverse(OrderedFloat(self.similarity)), self.id)
    }
}

/// Top-K most similar entities, best first
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Neighborhood {
    neighbors: Vec<Neighbor>,
}

impl Neighborhood {
    #[inline]
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Neighbor> {
        self.neighbors.iter()
    }

    pub fn as_slice(&self) -> &[Neighbor] {
        &self.neighbors
    }

    pub fn ids(&self) -> Vec<u32> {
        self.neighbors.iter().map(|n| n.id).collect()
    }

    pub fn similarities(&self) -> Vec<f64> {
        self.neighbors.iter().map(|n| n.similarity).collect()
    }
}

impl<'a> IntoIterator for &'a Neighborhood {
    type Item = &'a Neighbor;
    type IntoIter = std::slice::Iter<'a, Neighbor>;

    fn into_iter(self) -> Self::IntoIter {
        self.neighbors.iter()
    }
}

/// Ranks a candidate pool against a target vector and keeps the top K
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborhoodSelector {
    k: usize,
    metric: SimilarityMetric,
}

impl NeighborhoodSelector {
    pub fn new(k: usize, metric: SimilarityMetric) -> Result<Self> {
        if k == 0 {
            return Err(Error::InvalidConfig(
                "neighborhood size must be at least 1".to_string(),
            ));
        }
        Ok(Self { k, metric })
    }

    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    #[inline]
    pub fn metric(&self) -> SimilarityMetric {
        self.metric
    }

    /// Select the neighborhood of `target_id` along `axis` of `matrix`
    ///
    /// The candidate pool is every other known ID on the same axis.
    pub fn select_on_axis(
        &self,
        matrix: &RatingMatrix,
        axis: Axis,
        target_id: u32,
    ) -> Result<Neighborhood> {
        self.select(
            axis,
            target_id,
            axis.vector(matrix, target_id),
            axis.ids(matrix),
            |id| axis.vector(matrix, id),
        )
    }

    /// Select up to K neighbors for `target` out of `candidates`
    ///
    /// `target_id` is removed from the pool. Candidates with positive
    /// similarity are preferred; when fewer than K of them exist the rest of
    /// the slots are filled with the best non-positive ones, so the result
    /// holds `min(K, pool size)` entries. Fails only when the pool is empty.
    pub fn select<'m, F>(
        &self,
        axis: Axis,
        target_id: u32,
        target: &RatingVector,
        candidates: &[u32],
        lookup: F,
    ) -> Result<Neighborhood>
    where
        F: Fn(u32) -> &'m RatingVector + Sync,
    {
        let scored: Vec<Neighbor> = candidates
            .par_iter()
            .copied()
            .filter(|&id| id != target_id)
            .map(|id| Neighbor::new(id, self.metric.similarity(target, lookup(id))))
            .collect();

        if scored.is_empty() {
            return Err(Error::InsufficientData {
                axis,
                target: target_id,
            });
        }

        let pool_size = scored.len();
        let (mut positive, mut backfill): (Vec<Neighbor>, Vec<Neighbor>) =
            scored.into_iter().partition(|n| n.similarity > 0.0);

        positive.sort_unstable_by_key(Neighbor::rank_key);
        if positive.len() < self.k {
            backfill.sort_unstable_by_key(Neighbor::rank_key);
            let missing = self.k - positive.len();
            positive.extend(backfill.into_iter().take(missing));
        }
        positive.truncate(self.k);

        debug!(
            "{} {}: kept {} of {} candidates ({})",
            axis, target_id, positive.len(), pool_size, self.metric
        );

        Ok(Neighborhood {
            neighbors: positive,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn matrix() -> RatingMatrix {
        // users 2 and 3 agree with user 1, user 4 disagrees, user 5 shares nothing
        RatingMatrix::from_triples(vec![
            (1, 1, 5.0), (1, 2, 3.0), (1, 3, 1.0),
            (2, 1, 4.0), (2, 2, 3.0), (2, 3, 2.0),
            (3, 1, 4.0), (3, 2, 3.0), (3, 3, 2.0),
            (4, 1, 1.0), (4, 2, 3.0), (4, 3, 5.0),
            (5, 9, 4.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_select_ranks_by_similarity() {
        let selector = NeighborhoodSelector::new(2, SimilarityMetric::Pearson).unwrap();
        let neighborhood = selector.select_on_axis(&matrix(), Axis::User, 1).unwrap();

        // users 2 and 3 both correlate perfectly, tie broken by id
        assert_eq!(neighborhood.ids(), vec![2, 3]);
        assert!(neighborhood.similarities().iter().all(|&s| (s - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_excludes_target() {
        let selector = NeighborhoodSelector::new(10, SimilarityMetric::Pearson).unwrap();
        let neighborhood = selector.select_on_axis(&matrix(), Axis::User, 1).unwrap();
        assert!(!neighborhood.ids().contains(&1));
        assert_eq!(neighborhood.len(), 4);
    }

    #[test]
    fn test_backfills_non_positive_candidates() {
        let selector = NeighborhoodSelector::new(4, SimilarityMetric::Pearson).unwrap();
        let neighborhood = selector.select_on_axis(&matrix(), Axis::User, 1).unwrap();

        // zero-similarity user 5 outranks anti-correlated user 4
        assert_eq!(neighborhood.ids(), vec![2, 3, 5, 4]);
        assert_eq!(neighborhood.as_slice()[2].similarity, 0.0);
        assert!((neighborhood.as_slice()[3].similarity + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_target_ties_by_id() {
        let selector = NeighborhoodSelector::new(3, SimilarityMetric::Pearson).unwrap();
        let neighborhood = selector.select_on_axis(&matrix(), Axis::User, 42).unwrap();
        assert_eq!(neighborhood.ids(), vec![1, 2, 3]);
        assert!(neighborhood.similarities().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_item_axis() {
        let selector = NeighborhoodSelector::new(1, SimilarityMetric::Cosine).unwrap();
        let neighborhood = selector.select_on_axis(&matrix(), Axis::Item, 1).unwrap();
        assert_eq!(neighborhood.len(), 1);
        assert_ne!(neighborhood.ids()[0], 1);
    }

    #[test]
    fn test_empty_pool_is_insufficient_data() {
        let single = RatingMatrix::from_triples(vec![(1, 1, 4.0)]).unwrap();
        let selector = NeighborhoodSelector::new(3, SimilarityMetric::Pearson).unwrap();
        let err = selector.select_on_axis(&single, Axis::User, 1).unwrap_err();
        assert_eq!(err, Error::InsufficientData { axis: Axis::User, target: 1 });

        let empty = RatingMatrix::default();
        assert!(selector.select_on_axis(&empty, Axis::Item, 7).is_err());
    }

    #[test]
    fn test_zero_k_rejected() {
        assert!(matches!(
            NeighborhoodSelector::new(0, SimilarityMetric::Pearson),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_size_and_ordering_on_random_data() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut triples = Vec::new();
        for user in 0..40u32 {
            for item in 0..25u32 {
                if rng.random_bool(0.3) {
                    triples.push((user, item, rng.random_range(1..=5) as f64));
                }
            }
        }
        let matrix = RatingMatrix::from_triples(triples).unwrap();

        for k in [1usize, 5, 20, 100] {
            let selector = NeighborhoodSelector::new(k, SimilarityMetric::Pearson).unwrap();
            for axis in [Axis::User, Axis::Item] {
                let pool = axis.ids(&matrix).len() - 1;
                let target = axis.ids(&matrix)[0];
                let neighborhood = selector.select_on_axis(&matrix, axis, target).unwrap();
                assert_eq!(neighborhood.len(), k.min(pool));

                for pair in neighborhood.as_slice().windows(2) {
                    assert!(pair[0].similarity >= pair[1].similarity);
                    if pair[0].similarity == pair[1].similarity {
                        assert!(pair[0].id < pair[1].id);
                    }
                }
            }
        }
    }
}
