//! Finite-difference gradient checking.
//!
//! The analytic gradient produced by `HuberLoss::backward` (in the kernel's
//! own dtype) is compared with a central difference of the f64 reference
//! objective `sum(loss)`:
//!
//! ```text
//! numeric[i] = (f(x + h·e_i) - f(x - h·e_i)) / 2h
//! ```
//!
//! Relative error is `|analytic - numeric| / |numeric|`, except that a
//! numeric magnitude below `1e-3` uses a denominator of 1 so that tiny
//! gradients are judged by absolute error.

use serde::{Serialize, Deserialize};

use crate::check::reference::huber_loss_forward;
use crate::error::Result;
use crate::loss::huber::HuberLoss;
use crate::math::element::Element;
use crate::math::tensor::Tensor;

const SMALL_GRADIENT: f64 = 1e-3;

/// Which operator input a gradient is checked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradInput {
    Prediction,
    Target,
}

impl GradInput {
    pub fn name(&self) -> &'static str {
        match self {
            GradInput::Prediction => "prediction",
            GradInput::Target => "target",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradCheckConfig {
    /// Finite-difference step, applied in f64.
    pub epsilon: f64,
    pub max_relative_error: f64,
}

impl Default for GradCheckConfig {
    fn default() -> Self {
        GradCheckConfig { epsilon: 1e-6, max_relative_error: 0.005 }
    }
}

impl GradCheckConfig {
    pub fn with_max_relative_error(mut self, max_relative_error: f64) -> Self {
        self.max_relative_error = max_relative_error;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradCheckResult {
    pub input: GradInput,
    pub num_elements: usize,
    pub max_relative_error: f64,
    /// Multi-index where `max_relative_error` occurred.
    pub worst_index: Option<Vec<usize>>,
    pub passed: bool,
}

/// Central-difference gradient of the reference `sum(loss)` with respect to `input`.
///
/// The loss is elementwise, so perturbing element `i` only moves `loss[i]`;
/// each entry is the difference of the reference at `r[i] ± ε`.
pub fn numeric_gradient(
    prediction: &Tensor<f64>,
    target: &Tensor<f64>,
    delta: f64,
    input: GradInput,
    epsilon: f64,
) -> Result<Tensor<f64>> {
    // d(residual)/d(input): +1 for the target, -1 for the prediction.
    let direction = match input {
        GradInput::Prediction => -1.0,
        GradInput::Target => 1.0,
    };
    let grad = prediction.zip_map(target, |p, t| {
        let r = t - p;
        let plus = huber_loss_forward(r + direction * epsilon, delta);
        let minus = huber_loss_forward(r - direction * epsilon, delta);
        (plus - minus) / (2.0 * epsilon)
    })?;
    Ok(grad)
}

/// Checks the analytic gradient of `loss` for each input in `inputs`.
pub fn check_grad<T: Element>(
    loss: &HuberLoss,
    prediction: &Tensor<T>,
    target: &Tensor<T>,
    inputs: &[GradInput],
    config: &GradCheckConfig,
) -> Result<Vec<GradCheckResult>> {
    let output = loss.forward(prediction, target)?;
    let grads = loss.backward_ones(&output.residual)?;

    let prediction64 = prediction.to_f64();
    let target64 = target.to_f64();

    inputs
        .iter()
        .map(|&input| -> Result<GradCheckResult> {
            let analytic = match input {
                GradInput::Prediction => grads.grad_prediction.to_f64(),
                GradInput::Target => grads.grad_target.to_f64(),
            };
            let numeric = numeric_gradient(&prediction64, &target64, loss.delta(), input, config.epsilon)?;
            Ok(compare_gradients(input, &analytic, &numeric, config))
        })
        .collect()
}

fn compare_gradients(
    input: GradInput,
    analytic: &Tensor<f64>,
    numeric: &Tensor<f64>,
    config: &GradCheckConfig,
) -> GradCheckResult {
    let mut max_relative_error = 0.0;
    let mut worst_index = None;

    for (i, (&a, &n)) in analytic.data().iter().zip(numeric.data().iter()).enumerate() {
        let denom = if n.abs() < SMALL_GRADIENT { 1.0 } else { n.abs() };
        let rel = (a - n).abs() / denom;
        // NaN compares false; treat it as a failure explicitly.
        if rel.is_nan() || rel > max_relative_error {
            max_relative_error = if rel.is_nan() { f64::INFINITY } else { rel };
            worst_index = Some(numeric.unravel(i));
        }
    }

    GradCheckResult {
        input,
        num_elements: numeric.len(),
        max_relative_error,
        worst_index,
        passed: max_relative_error <= config.max_relative_error,
    }
}
