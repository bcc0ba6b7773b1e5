use thiserror::Error;

use crate::Timestamp;

/// Errors raised at the validation boundary or for structurally invalid
/// parameters.
///
/// Numeric edge cases inside a correctly parameterized computation
/// (insufficient history, zero denominators) never produce an error; they
/// surface as undefined positions or documented sentinel values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A required column is absent from the input.
    #[error("missing column: {column}")]
    MissingColumn { column: String },

    /// Timestamps are not strictly increasing.
    #[error("non-monotonic timestamp at index {index}: {current} <= {previous}")]
    NonMonotonicTimestamp {
        index: usize,
        previous: Timestamp,
        current: Timestamp,
    },

    /// A declared-numeric value is not coercible to a finite number.
    #[error("invalid value in column {column} at index {index}: {value}")]
    InvalidDType {
        column: String,
        index: usize,
        value: String,
    },

    /// Window, span, or period parameter is structurally invalid.
    #[error("invalid window: {parameter} {reason}")]
    InvalidWindow {
        parameter: &'static str,
        reason: String,
    },

    /// Non-window numeric parameter is out of its valid domain.
    #[error("invalid parameter: {parameter} {reason}")]
    InvalidParameter {
        parameter: &'static str,
        reason: String,
    },

    /// A column does not have one value per timestamp.
    #[error("length mismatch in column {column}: expected {expected}, got {actual}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// Two columns share a name.
    #[error("duplicate column: {column}")]
    DuplicateColumn { column: String },

    /// An OHLCV bar violates `low <= open, close <= high` or has negative volume.
    #[error(
        "inconsistent bar at index {index}: open={open}, high={high}, low={low}, close={close}, volume={volume}"
    )]
    InconsistentBar {
        index: usize,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    },

    /// A series is not aligned to the index it is attached to.
    #[error("series for column {column} is not aligned to the frame index")]
    MisalignedIndex { column: String },
}

impl Error {
    pub(crate) fn invalid_window(parameter: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidWindow {
            parameter,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_parameter(parameter: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter,
            reason: reason.into(),
        }
    }
}

/// Crate result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Checks that a numeric parameter is finite and strictly positive.
pub(crate) fn positive_finite(parameter: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(Error::invalid_parameter(
            parameter,
            format!("must be positive and finite, got {value}"),
        ))
    }
}
