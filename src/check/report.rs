use serde::{Serialize, Deserialize};

use crate::loss::backend::Backend;
use crate::math::element::DType;

/// Outcome of one step of an operator case (output or gradient check).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    /// e.g. `residual`, `loss`, `grad_normal`, `grad_ignore_prediction`.
    pub step: String,
    pub passed: bool,
    /// Max absolute difference for output steps, max relative error for
    /// gradient steps.
    pub max_error: f64,
    /// Human-readable reason when the step failed.
    pub detail: Option<String>,
}

/// All step results for one `OpCase`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseReport {
    pub name: String,
    pub dtype: DType,
    pub shape: Vec<usize>,
    pub backend: Backend,
    pub steps: Vec<StepReport>,
}

impl CaseReport {
    pub fn passed(&self) -> bool {
        self.steps.iter().all(|s| s.passed)
    }

    pub fn failed_steps(&self) -> impl Iterator<Item = &StepReport> {
        self.steps.iter().filter(|s| !s.passed)
    }

    /// One line per case, e.g. `ok    huber_f32_100x1  float32 [100, 1] serial`.
    pub fn summary_line(&self) -> String {
        let status = if self.passed() { "ok" } else { "FAIL" };
        let mut line = format!(
            "{:<5} {:<24} {:<8} {:?} {}",
            status,
            self.name,
            self.dtype,
            self.shape,
            self.backend.name()
        );
        for step in self.failed_steps() {
            line.push_str(&format!("\n      {}: {}", step.step, step.detail.as_deref().unwrap_or("failed")));
        }
        line
    }
}
