use thiserror::Error;

use crate::math::element::DType;

/// Errors raised by the Huber operator and its test harness.
#[derive(Error, Debug)]
pub enum HuberError {
    #[error("shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("data length {len} does not match shape {shape:?} ({expected} elements)")]
    DataLength {
        shape: Vec<usize>,
        len: usize,
        expected: usize,
    },

    #[error("delta must be positive and finite, got {0}")]
    InvalidDelta(f64),

    #[error("input range [{low}, {high}) is empty or not finite")]
    InvalidRange { low: f64, high: f64 },

    #[error("prediction is {prediction:?} but target is {target:?}")]
    DtypeMismatch { prediction: DType, target: DType },

    #[error("unsupported dtype `{0}`; expected float16, float32 or float64")]
    UnsupportedDtype(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HuberError>;
