use crate::{Error, Result};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Valid range of a rating value
///
/// The lower bound defaults to 0.0 so that a target with no ratings at all
/// (whose baseline is 0.0) still yields an in-range prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingScale {
    pub min: f64,
    pub max: f64,
}

impl Default for RatingScale {
    fn default() -> Self {
        Self { min: 0.0, max: 5.0 }
    }
}

impl RatingScale {
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(Error::InvalidConfig(format!(
                "invalid rating scale [{}, {}]",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    #[inline]
    pub fn contains(&self, rating: f64) -> bool {
        rating >= self.min && rating <= self.max
    }

    #[inline]
    pub fn clamp(&self, rating: f64) -> f64 {
        rating.clamp(self.min, self.max)
    }
}

/// A sparse row (user) or column (item) of the rating matrix
///
/// Entries are `(dimension id, rating)` pairs sorted by dimension id. Only
/// actually-rated dimensions are stored; a zero rating never appears.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RatingVector {
    entries: Vec<(u32, f64)>,
    mean: f64,
    norm: f64,
}

static EMPTY_VECTOR: RatingVector = RatingVector {
    entries: Vec::new(),
    mean: 0.0,
    norm: 0.0,
};

impl RatingVector {
    /// Build a vector from arbitrary entries
    ///
    /// Entries are sorted, zero ratings dropped, and for duplicate dimensions
    /// the last entry wins.
    pub fn new(mut entries: Vec<(u32, f64)>) -> Self {
        // stable sort keeps insertion order among duplicates
        entries.sort_by_key(|&(dim, _)| dim);

        let mut deduped: Vec<(u32, f64)> = Vec::with_capacity(entries.len());
        for (dim, rating) in entries {
            match deduped.last_mut() {
                Some(last) if last.0 == dim => last.1 = rating,
                _ => deduped.push((dim, rating)),
            }
        }
        deduped.retain(|&(_, rating)| rating != 0.0);

        Self::from_sorted(deduped)
    }

    /// Entries must already be sorted by dimension, unique and non-zero
    fn from_sorted(entries: Vec<(u32, f64)>) -> Self {
        let (mean, norm) = if entries.is_empty() {
            (0.0, 0.0)
        } else {
            let sum: f64 = entries.iter().map(|&(_, r)| r).sum();
            let squares: f64 = entries.iter().map(|&(_, r)| r * r).sum();
            (sum / entries.len() as f64, squares.sqrt())
        };
        Self { entries, mean, norm }
    }

    /// The shared empty vector returned for unknown IDs
    #[inline]
    pub fn empty() -> &'static RatingVector {
        &EMPTY_VECTOR
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rating on `dim`, 0.0 when unrated
    #[inline]
    pub fn get(&self, dim: u32) -> f64 {
        self.entries
            .binary_search_by_key(&dim, |&(d, _)| d)
            .map(|idx| self.entries[idx].1)
            .unwrap_or(0.0)
    }

    /// Mean over the rated dimensions, 0.0 when nothing is rated
    #[inline]
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// L2 norm over the rated dimensions
    #[inline]
    pub fn norm(&self) -> f64 {
        self.norm
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.entries.iter().copied()
    }

    #[inline]
    pub fn as_slice(&self) -> &[(u32, f64)] {
        &self.entries
    }

    /// Paired ratings over the dimensions both vectors have rated, in
    /// ascending dimension order
    pub fn common_support<'a>(&'a self, other: &'a RatingVector) -> CommonSupport<'a> {
        CommonSupport {
            left: &self.entries,
            right: &other.entries,
        }
    }
}

/// Merge-join iterator over two sorted rating vectors
pub struct CommonSupport<'a> {
    left: &'a [(u32, f64)],
    right: &'a [(u32, f64)],
}

impl Iterator for CommonSupport<'_> {
    type Item = (f64, f64);

    fn next(&mut self) -> Option<Self::Item> {
        while let (Some(&(ld, lr)), Some(&(rd, rr))) = (self.left.first(), self.right.first()) {
            if ld < rd {
                self.left = &self.left[1..];
            } else if rd < ld {
                self.right = &self.right[1..];
            } else {
                self.left = &self.left[1..];
                self.right = &self.right[1..];
                return Some((lr, rr));
            }
        }
        None
    }
}

/// Immutable sparse user × item rating matrix
///
/// Both orientations are materialized at build time so user rows and item
/// columns are equally cheap to look up.
#[derive(Debug, Clone, Default)]
pub struct RatingMatrix {
    scale: RatingScale,
    by_user: AHashMap<u32, RatingVector>,
    by_item: AHashMap<u32, RatingVector>,
    user_ids: Vec<u32>,
    item_ids: Vec<u32>,
    num_ratings: usize,
}

impl RatingMatrix {
    /// Build a matrix on the default scale from `(user, item, rating)` triples
    pub fn from_triples<I>(triples: I) -> Result<Self>
    where
        I: IntoIterator<Item = (u32, u32, f64)>,
    {
        let mut builder = RatingMatrixBuilder::new(RatingScale::default());
        for (user, item, rating) in triples {
            builder.add(user, item, rating)?;
        }
        Ok(builder.build())
    }

    pub fn builder(scale: RatingScale) -> RatingMatrixBuilder {
        RatingMatrixBuilder::new(scale)
    }

    #[inline]
    pub fn scale(&self) -> RatingScale {
        self.scale
    }

    /// Rating of `user` for `item`, 0.0 when absent
    #[inline]
    pub fn rating_of(&self, user: u32, item: u32) -> f64 {
        self.user_vector(user).get(item)
    }

    /// Item ratings of `user`; empty for an unknown user
    #[inline]
    pub fn user_vector(&self, user: u32) -> &RatingVector {
        self.by_user.get(&user).unwrap_or(RatingVector::empty())
    }

    /// User ratings of `item`; empty for an unknown item
    #[inline]
    pub fn item_vector(&self, item: u32) -> &RatingVector {
        self.by_item.get(&item).unwrap_or(RatingVector::empty())
    }

    #[inline]
    pub fn user_ids(&self) -> &[u32] {
        &self.user_ids
    }

    #[inline]
    pub fn item_ids(&self) -> &[u32] {
        &self.item_ids
    }

    #[inline]
    pub fn mean_user_rating(&self, user: u32) -> f64 {
        self.user_vector(user).mean()
    }

    #[inline]
    pub fn mean_item_rating(&self, item: u32) -> f64 {
        self.item_vector(item).mean()
    }

    pub fn num_users(&self) -> usize {
        self.user_ids.len()
    }

    pub fn num_items(&self) -> usize {
        self.item_ids.len()
    }

    /// Number of stored (non-zero) ratings
    pub fn num_ratings(&self) -> usize {
        self.num_ratings
    }

    /// Every stored rating as `(user, item, rating)`, user-major
    pub fn triples(&self) -> impl Iterator<Item = (u32, u32, f64)> + '_ {
        self.user_ids.iter().flat_map(move |&user| {
            self.user_vector(user)
                .iter()
                .map(move |(item, rating)| (user, item, rating))
        })
    }
}

/// Accumulates rating triples and produces a [`RatingMatrix`]
#[derive(Debug, Clone)]
pub struct RatingMatrixBuilder {
    scale: RatingScale,
    ratings: BTreeMap<(u32, u32), f64>,
}

impl RatingMatrixBuilder {
    pub fn new(scale: RatingScale) -> Self {
        Self {
            scale,
            ratings: BTreeMap::new(),
        }
    }

    /// Record a rating; a repeated `(user, item)` pair replaces the earlier
    /// value. A 0.0 rating is accepted and means "unrated".
    pub fn add(&mut self, user: u32, item: u32, rating: f64) -> Result<&mut Self> {
        if !rating.is_finite() || (rating != 0.0 && !self.scale.contains(rating)) {
            return Err(Error::InvalidRating {
                user,
                item,
                rating,
                min: self.scale.min,
                max: self.scale.max,
            });
        }
        self.ratings.insert((user, item), rating);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    pub fn build(self) -> RatingMatrix {
        let mut user_rows: BTreeMap<u32, Vec<(u32, f64)>> = BTreeMap::new();
        let mut item_columns: BTreeMap<u32, Vec<(u32, f64)>> = BTreeMap::new();
        let mut num_ratings = 0;

        // BTreeMap iteration is (user, item) ordered, so rows come out sorted
        // by item and columns sorted by user.
        for ((user, item), rating) in self.ratings {
            let row = user_rows.entry(user).or_default();
            let column = item_columns.entry(item).or_default();
            if rating != 0.0 {
                row.push((item, rating));
                column.push((user, rating));
                num_ratings += 1;
            }
        }

        let user_ids: Vec<u32> = user_rows.keys().copied().collect();
        let item_ids: Vec<u32> = item_columns.keys().copied().collect();

        let by_user = user_rows
            .into_iter()
            .filter(|(_, row)| !row.is_empty())
            .map(|(user, row)| (user, RatingVector::from_sorted(row)))
            .collect();
        let by_item = item_columns
            .into_iter()
            .filter(|(_, column)| !column.is_empty())
            .map(|(item, column)| (item, RatingVector::from_sorted(column)))
            .collect();

        RatingMatrix {
            scale: self.scale,
            by_user,
            by_item,
            user_ids,
            item_ids,
            num_ratings,
        }
    }
}
