use log::debug;
use serde::{Serialize, Deserialize};

use crate::error::{HuberError, Result};
use crate::loss::backend::Backend;
use crate::math::element::Element;
use crate::math::tensor::Tensor;

/// h(r) = 0.5·r²            if |r| ≤ δ
///        δ·(|r| − 0.5·δ)   otherwise
///
/// NaN falls through to the linear branch and stays NaN.
pub fn huber<T: Element>(residual: T, delta: T) -> T {
    let half = T::from_f64(0.5);
    let abs = residual.abs();
    if abs <= delta {
        half * residual * residual
    } else {
        delta * (abs - half * delta)
    }
}

/// ∂h/∂r · g:  r·g  if |r| ≤ δ,  else δ·sign(r)·g
pub fn huber_grad<T: Element>(residual: T, delta: T, upstream: T) -> T {
    if residual.abs() <= delta {
        residual * upstream
    } else {
        delta * residual.signum() * upstream
    }
}

/// Result of a forward pass. Both tensors have the input shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Element")]
pub struct HuberOutput<T: Element> {
    /// `target - prediction`
    pub residual: Tensor<T>,
    /// Elementwise Huber loss of `residual`.
    pub loss: Tensor<T>,
}

impl<T: Element> HuberOutput<T> {
    /// Sum of all loss elements, accumulated in f64.
    pub fn sum_loss(&self) -> f64 {
        self.loss.data().iter().map(|x| x.to_f64()).sum()
    }

    /// Mean loss; 0.0 for an empty tensor.
    pub fn mean_loss(&self) -> f64 {
        if self.loss.is_empty() {
            return 0.0;
        }
        self.sum_loss() / self.loss.len() as f64
    }
}

/// Gradients of the loss with respect to both inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Element")]
pub struct HuberGrads<T: Element> {
    pub grad_prediction: Tensor<T>,
    pub grad_target: Tensor<T>,
}

/// Elementwise Huber loss with threshold `delta`.
///
/// Deserialization goes through `HuberLoss::new`, so a loaded loss always
/// has a positive, finite delta.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawHuberLoss")]
pub struct HuberLoss {
    delta: f64,
    backend: Backend,
}

#[derive(Deserialize)]
struct RawHuberLoss {
    delta: f64,
    #[serde(default)]
    backend: Backend,
}

impl TryFrom<RawHuberLoss> for HuberLoss {
    type Error = HuberError;

    fn try_from(raw: RawHuberLoss) -> Result<HuberLoss> {
        Ok(HuberLoss::new(raw.delta)?.with_backend(raw.backend))
    }
}

impl Default for HuberLoss {
    fn default() -> Self {
        HuberLoss { delta: 1.0, backend: Backend::Serial }
    }
}

impl HuberLoss {
    pub fn new(delta: f64) -> Result<HuberLoss> {
        if !(delta.is_finite() && delta > 0.0) {
            return Err(HuberError::InvalidDelta(delta));
        }
        Ok(HuberLoss { delta, backend: Backend::Serial })
    }

    pub fn with_backend(mut self, backend: Backend) -> HuberLoss {
        self.backend = backend;
        self
    }

    pub fn delta(&self) -> f64 {
        self.delta
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Computes `residual = target - prediction` and the elementwise loss.
    pub fn forward<T: Element>(&self, prediction: &Tensor<T>, target: &Tensor<T>) -> Result<HuberOutput<T>> {
        prediction.expect_shape(target.shape())?;
        let delta = T::from_f64(self.delta);
        debug!(
            "huber forward: shape {:?}, dtype {}, delta {}, backend {}",
            prediction.shape(),
            T::DTYPE,
            self.delta,
            self.backend.name()
        );

        let residual = self.backend.zip_map(prediction.data(), target.data(), |p, t| t - p);
        let loss = self.backend.map(&residual, |r| huber(r, delta));

        Ok(HuberOutput {
            residual: Tensor::from_vec(prediction.shape(), residual)?,
            loss: Tensor::from_vec(prediction.shape(), loss)?,
        })
    }

    /// Back-propagates `upstream` (∂L/∂loss) through the loss.
    ///
    /// `residual` is the tensor returned by `forward`. The target gradient
    /// equals the residual gradient; the prediction gradient is its negation.
    pub fn backward<T: Element>(&self, residual: &Tensor<T>, upstream: &Tensor<T>) -> Result<HuberGrads<T>> {
        residual.expect_shape(upstream.shape())?;
        let delta = T::from_f64(self.delta);
        debug!(
            "huber backward: shape {:?}, dtype {}, backend {}",
            residual.shape(),
            T::DTYPE,
            self.backend.name()
        );

        let grad_target = self.backend.zip_map(residual.data(), upstream.data(), |r, g| huber_grad(r, delta, g));
        let grad_prediction = self.backend.map(&grad_target, |g| -g);

        Ok(HuberGrads {
            grad_prediction: Tensor::from_vec(residual.shape(), grad_prediction)?,
            grad_target: Tensor::from_vec(residual.shape(), grad_target)?,
        })
    }

    /// `backward` with an upstream gradient of ones.
    pub fn backward_ones<T: Element>(&self, residual: &Tensor<T>) -> Result<HuberGrads<T>> {
        self.backward(residual, &Tensor::ones(residual.shape()))
    }
}
