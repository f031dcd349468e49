//! Axis selection for the two prediction pipelines.
//!
//! User-based and item-based prediction run the exact same algorithm; the
//! only difference is which side of the rating matrix plays the role of the
//! "entity" being compared. [`Axis`] supplies the per-axis lookups so the
//! rest of the pipeline never branches on mode.

use crate::matrix::{RatingMatrix, RatingVector};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which dimension of the rating matrix a pipeline compares along
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Compare users by their item ratings
    User,
    /// Compare items by the ratings users gave them
    Item,
}

impl Axis {
    /// Rating vector of `id` along this axis (a user's row or an item's column)
    #[inline]
    pub fn vector(self, matrix: &RatingMatrix, id: u32) -> &RatingVector {
        match self {
            Axis::User => matrix.user_vector(id),
            Axis::Item => matrix.item_vector(id),
        }
    }

    /// Every known ID on this axis, ascending
    #[inline]
    pub fn ids(self, matrix: &RatingMatrix) -> &[u32] {
        match self {
            Axis::User => matrix.user_ids(),
            Axis::Item => matrix.item_ids(),
        }
    }

    /// Mean of the non-zero ratings of `id` along this axis
    #[inline]
    pub fn mean(self, matrix: &RatingMatrix, id: u32) -> f64 {
        self.vector(matrix, id).mean()
    }

    /// Split a (user, item) query into (target entity, query dimension)
    #[inline]
    pub fn split(self, user: u32, item: u32) -> (u32, u32) {
        match self {
            Axis::User => (user, item),
            Axis::Item => (item, user),
        }
    }

    pub fn singular(self) -> &'static str {
        match self {
            Axis::User => "user",
            Axis::Item => "item",
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            Axis::User => "users",
            Axis::Item => "items",
        }
    }

    /// Human readable mode name used in reports
    pub fn label(self) -> &'static str {
        match self {
            Axis::User => "User-Based",
            Axis::Item => "Item-Based",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.singular())
    }
}

impl FromStr for Axis {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "user" | "user-based" => Ok(Axis::User),
            "item" | "item-based" => Ok(Axis::Item),
            other => Err(Error::InvalidConfig(format!("unknown axis '{}'", other))),
        }
    }
}

/// Which pipelines a query runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionMode {
    User,
    Item,
    #[default]
    Both,
}

impl PredictionMode {
    /// Axes to run, in report order
    pub fn axes(self) -> &'static [Axis] {
        match self {
            PredictionMode::User => &[Axis::User],
            PredictionMode::Item => &[Axis::Item],
            PredictionMode::Both => &[Axis::User, Axis::Item],
        }
    }
}

impl FromStr for PredictionMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "user" => Ok(PredictionMode::User),
            "item" => Ok(PredictionMode::Item),
            "both" => Ok(PredictionMode::Both),
            other => Err(Error::InvalidConfig(format!(
                "unknown mode '{}', expected user, item or both",
                other
            ))),
        }
    }
}
