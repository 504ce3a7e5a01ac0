use serde::{Serialize, Deserialize};

use crate::error::Result;
use crate::math::element::DType;
use crate::math::tensor::Tensor;

/// `|actual - expected| <= atol + rtol * |expected|`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    pub rtol: f64,
    pub atol: f64,
}

impl Tolerance {
    pub fn new(rtol: f64, atol: f64) -> Tolerance {
        Tolerance { rtol, atol }
    }

    /// Output tolerance for kernels running in `dtype`.
    pub fn for_dtype(dtype: DType) -> Tolerance {
        match dtype {
            DType::Float16 => Tolerance::new(2e-3, 1e-3),
            DType::Float32 => Tolerance::new(1e-5, 1e-6),
            DType::Float64 => Tolerance::new(1e-12, 1e-12),
        }
    }

    pub fn is_close(&self, actual: f64, expected: f64) -> bool {
        if actual.is_nan() || expected.is_nan() {
            return actual.is_nan() && expected.is_nan();
        }
        if actual.is_infinite() || expected.is_infinite() {
            return actual == expected;
        }
        (actual - expected).abs() <= self.atol + self.rtol * expected.abs()
    }
}

/// Outcome of an elementwise comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub num_elements: usize,
    pub num_failures: usize,
    /// Largest finite `|actual - expected|` seen.
    pub max_abs_diff: f64,
    /// Multi-index of the first failing element.
    pub first_failure: Option<Vec<usize>>,
}

impl Comparison {
    pub fn passed(&self) -> bool {
        self.num_failures == 0
    }
}

/// Compares two same-shape tensors; a shape difference is an error.
pub fn all_close(actual: &Tensor<f64>, expected: &Tensor<f64>, tolerance: Tolerance) -> Result<Comparison> {
    expected.expect_shape(actual.shape())?;

    let mut comparison = Comparison {
        num_elements: actual.len(),
        num_failures: 0,
        max_abs_diff: 0.0,
        first_failure: None,
    };

    for (i, (&a, &e)) in actual.data().iter().zip(expected.data().iter()).enumerate() {
        let diff = (a - e).abs();
        if diff.is_finite() && diff > comparison.max_abs_diff {
            comparison.max_abs_diff = diff;
        }
        if !tolerance.is_close(a, e) {
            comparison.num_failures += 1;
            if comparison.first_failure.is_none() {
                comparison.first_failure = Some(actual.unravel(i));
            }
        }
    }

    Ok(comparison)
}
