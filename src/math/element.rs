use std::fmt::{self, Debug, Display};
use std::ops::{Add, Mul, Neg, Sub};

use half::f16;
use serde::de::DeserializeOwned;
use serde::{Serialize, Deserialize};

use crate::error::{HuberError, Result};

/// Floating-point storage type of a tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DType {
    Float16,
    Float32,
    Float64,
}

impl DType {
    /// Parses a dtype name. Accepts `float16`/`float32`/`float64` and the
    /// short forms `f16`, `fp16`, `f32`, `f64`. Integer types are rejected.
    pub fn parse(name: &str) -> Result<DType> {
        match name.trim().to_ascii_lowercase().as_str() {
            "float16" | "f16" | "fp16" => Ok(DType::Float16),
            "float32" | "f32" | "fp32" => Ok(DType::Float32),
            "float64" | "f64" | "fp64" => Ok(DType::Float64),
            other => Err(HuberError::UnsupportedDtype(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DType::Float16 => "float16",
            DType::Float32 => "float32",
            DType::Float64 => "float64",
        }
    }
}

impl Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// A scalar the Huber kernels can run on.
///
/// Arithmetic goes through the std operator traits so every intermediate
/// is rounded to the element's own precision, which is what a device
/// kernel working in that dtype would do.
pub trait Element:
    Copy
    + Default
    + Debug
    + Display
    + PartialOrd
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Neg<Output = Self>
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    const ZERO: Self;
    const ONE: Self;
    const DTYPE: DType;

    fn from_f64(value: f64) -> Self;
    fn to_f64(self) -> f64;
    fn abs(self) -> Self;
    /// 1 for positive values (including +0), -1 for negative, NaN for NaN.
    fn signum(self) -> Self;
}

impl Element for f64 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;
    const DTYPE: DType = DType::Float64;

    fn from_f64(value: f64) -> Self {
        value
    }

    fn to_f64(self) -> f64 {
        self
    }

    fn abs(self) -> Self {
        f64::abs(self)
    }

    fn signum(self) -> Self {
        f64::signum(self)
    }
}

impl Element for f32 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;
    const DTYPE: DType = DType::Float32;

    fn from_f64(value: f64) -> Self {
        value as f32
    }

    fn to_f64(self) -> f64 {
        self as f64
    }

    fn abs(self) -> Self {
        f32::abs(self)
    }

    fn signum(self) -> Self {
        f32::signum(self)
    }
}

impl Element for f16 {
    const ZERO: Self = f16::ZERO;
    const ONE: Self = f16::ONE;
    const DTYPE: DType = DType::Float16;

    fn from_f64(value: f64) -> Self {
        f16::from_f64(value)
    }

    fn to_f64(self) -> f64 {
        f16::to_f64(self)
    }

    fn abs(self) -> Self {
        f16::from_f32(self.to_f32().abs())
    }

    fn signum(self) -> Self {
        f16::from_f32(self.to_f32().signum())
    }
}
