use half::f16;
use serde::{Serialize, Deserialize};

use crate::error::{HuberError, Result};
use crate::loss::huber::{HuberLoss, HuberOutput};
use crate::math::element::DType;
use crate::math::tensor::Tensor;

/// A tensor whose element type is only known at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dtype", content = "tensor", rename_all = "snake_case")]
pub enum AnyTensor {
    Float16(Tensor<f16>),
    Float32(Tensor<f32>),
    Float64(Tensor<f64>),
}

/// Forward output matching the dtype of the inputs.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyOutput {
    Float16(HuberOutput<f16>),
    Float32(HuberOutput<f32>),
    Float64(HuberOutput<f64>),
}

impl AnyTensor {
    /// Builds a tensor of `dtype` from f64 values.
    pub fn from_f64(dtype: DType, shape: &[usize], values: &[f64]) -> Result<AnyTensor> {
        Ok(match dtype {
            DType::Float16 => AnyTensor::Float16(Tensor::from_f64(shape, values)?),
            DType::Float32 => AnyTensor::Float32(Tensor::from_f64(shape, values)?),
            DType::Float64 => AnyTensor::Float64(Tensor::from_f64(shape, values)?),
        })
    }

    pub fn dtype(&self) -> DType {
        match self {
            AnyTensor::Float16(_) => DType::Float16,
            AnyTensor::Float32(_) => DType::Float32,
            AnyTensor::Float64(_) => DType::Float64,
        }
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            AnyTensor::Float16(t) => t.shape(),
            AnyTensor::Float32(t) => t.shape(),
            AnyTensor::Float64(t) => t.shape(),
        }
    }

    pub fn to_f64(&self) -> Tensor<f64> {
        match self {
            AnyTensor::Float16(t) => t.to_f64(),
            AnyTensor::Float32(t) => t.to_f64(),
            AnyTensor::Float64(t) => t.clone(),
        }
    }
}

impl AnyOutput {
    pub fn dtype(&self) -> DType {
        match self {
            AnyOutput::Float16(_) => DType::Float16,
            AnyOutput::Float32(_) => DType::Float32,
            AnyOutput::Float64(_) => DType::Float64,
        }
    }

    /// Residual and loss upcast to f64.
    pub fn to_f64(&self) -> (Tensor<f64>, Tensor<f64>) {
        match self {
            AnyOutput::Float16(o) => (o.residual.to_f64(), o.loss.to_f64()),
            AnyOutput::Float32(o) => (o.residual.to_f64(), o.loss.to_f64()),
            AnyOutput::Float64(o) => (o.residual.clone(), o.loss.clone()),
        }
    }
}

impl HuberLoss {
    /// Runtime-dtype forward. Both inputs must share a dtype and a shape.
    pub fn forward_any(&self, prediction: &AnyTensor, target: &AnyTensor) -> Result<AnyOutput> {
        match (prediction, target) {
            (AnyTensor::Float16(p), AnyTensor::Float16(t)) => Ok(AnyOutput::Float16(self.forward(p, t)?)),
            (AnyTensor::Float32(p), AnyTensor::Float32(t)) => Ok(AnyOutput::Float32(self.forward(p, t)?)),
            (AnyTensor::Float64(p), AnyTensor::Float64(t)) => Ok(AnyOutput::Float64(self.forward(p, t)?)),
            _ => Err(HuberError::DtypeMismatch {
                prediction: prediction.dtype(),
                target: target.dtype(),
            }),
        }
    }
}
