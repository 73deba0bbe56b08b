//! Error types for the engine.

use thiserror::Error;

/// Errors produced by grid, history and simulation operations.
///
/// None of these are fatal: the caller drops the requested mutation and keeps
/// showing the unchanged current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A dimension, tick interval or density was outside its allowed range.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Undo was requested while only the initial state remains.
    #[error("history holds no earlier state to return to")]
    EmptyHistory,

    /// A cell coordinate was outside the current grid.
    #[error("cell ({row}, {col}) out of bounds for a {rows}x{cols} grid")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    /// A grid's text form contained an unknown symbol or ragged rows.
    #[error("malformed grid: {0}")]
    Malformed(String),

    /// A grid did not match the dimensions shared by the history.
    #[error("dimension mismatch: expected {}x{}, got {}x{}", .expected.0, .expected.1, .got.0, .got.1)]
    DimensionMismatch {
        expected: (usize, usize),
        got: (usize, usize),
    },
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_configuration_includes_reason() {
        let err = EngineError::InvalidConfiguration("rows must be at least 1".into());
        let msg = format!("{err}");
        assert!(msg.contains("rows must be at least 1"), "missing reason in: {msg}");
    }

    #[test]
    fn out_of_bounds_includes_coordinates_and_dimensions() {
        let err = EngineError::OutOfBounds {
            row: 12,
            col: 34,
            rows: 5,
            cols: 7,
        };
        let msg = format!("{err}");
        assert!(msg.contains("12"), "missing row in: {msg}");
        assert!(msg.contains("34"), "missing col in: {msg}");
        assert!(msg.contains("5x7"), "missing dimensions in: {msg}");
    }

    #[test]
    fn dimension_mismatch_includes_both_shapes() {
        let err = EngineError::DimensionMismatch {
            expected: (15, 15),
            got: (3, 4),
        };
        let msg = format!("{err}");
        assert!(msg.contains("15x15"), "missing expected in: {msg}");
        assert!(msg.contains("3x4"), "missing got in: {msg}");
    }

    #[test]
    fn engine_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<EngineError>();
    }
}
