use crate::Discrete;

/// Errors raised while building or addressing a grid world.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    /// Coordinate lookup outside the grid extent. Always a caller bug.
    #[error("position ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        x: Discrete,
        y: Discrete,
        width: usize,
        height: usize,
    },

    #[error("invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type Result<T> = std::result::Result<T, GridError>;
