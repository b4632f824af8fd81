use thiserror::Error;

/// Recoverable conditions reported to the caller.
///
/// Expected game-flow outcomes (target already pierced, weapon on cooldown,
/// hit outside an explosion radius) are not errors and never show up here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("No modifier slot available (capacity {capacity})")]
    NoSlotAvailable { capacity: usize },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No valid position: {0}")]
    NoValidPosition(String),

    #[error("Out of bounds: ({x}, {y}) outside {width}x{height}")]
    OutOfBounds {
        x: i64,
        y: i64,
        width: usize,
        height: usize,
    },
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::NoSlotAvailable { capacity: 2 };
        assert_eq!(err.to_string(), "No modifier slot available (capacity 2)");

        let err = CoreError::OutOfBounds {
            x: -1,
            y: 4,
            width: 10,
            height: 8,
        };
        assert!(err.to_string().contains("(-1, 4)"));
        assert!(err.to_string().contains("10x8"));
    }
}
