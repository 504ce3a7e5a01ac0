use crate::error::Result;
use crate::loss::huber::HuberOutput;
use crate::math::tensor::Tensor;

/// Closed-form Huber value for a single residual, in f64.
pub fn huber_loss_forward(value: f64, delta: f64) -> f64 {
    let abs_val = value.abs();
    if abs_val <= delta {
        0.5 * value * value
    } else {
        delta * (abs_val - 0.5 * delta)
    }
}

/// Reference forward pass computed entirely in f64.
///
/// Kept independent of `HuberLoss` so that the kernels are checked against
/// a second, straightforward evaluation of the formula.
pub fn huber_forward(prediction: &Tensor<f64>, target: &Tensor<f64>, delta: f64) -> Result<HuberOutput<f64>> {
    let residual = prediction.zip_map(target, |p, t| t - p)?;
    let loss = residual.map(|r| huber_loss_forward(r, delta));
    Ok(HuberOutput { residual, loss })
}

/// Sum of the reference loss, the scalar objective whose gradient is checked.
pub fn huber_sum(prediction: &Tensor<f64>, target: &Tensor<f64>, delta: f64) -> Result<f64> {
    Ok(huber_forward(prediction, target, delta)?.loss.data().iter().sum())
}
