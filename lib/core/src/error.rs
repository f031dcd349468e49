use crate::axis::Axis;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("No candidate {} exists besides {} {target}", .axis.plural(), .axis.singular())]
    InsufficientData { axis: Axis, target: u32 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid rating {rating} for user {user}, item {item}: expected a value in [{min}, {max}]")]
    InvalidRating {
        user: u32,
        item: u32,
        rating: f64,
        min: f64,
        max: f64,
    },
}
