use half::f16;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Serialize, Deserialize};

use crate::check::compare::{all_close, Tolerance};
use crate::check::gradcheck::{check_grad, GradCheckConfig, GradInput};
use crate::check::reference;
use crate::check::report::{CaseReport, StepReport};
use crate::error::Result;
use crate::loss::backend::Backend;
use crate::loss::huber::HuberLoss;
use crate::math::element::{DType, Element};
use crate::math::tensor::Tensor;

/// Delta used by the operator cases unless a case overrides it.
pub const DEFAULT_DELTA: f64 = 0.5;
const DEFAULT_SEED: u64 = 2022;

/// Relative error allowed when only one input's gradient is checked.
const SINGLE_INPUT_MAX_RELATIVE_ERROR: f64 = 0.008;

fn default_low() -> f64 {
    0.0
}

fn default_high() -> f64 {
    1.0
}

/// One row of the operator test table.
///
/// Inputs are drawn uniformly from `[low, high)` with a seeded RNG:
/// prediction first, then target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpCase {
    pub name: String,
    pub shape: Vec<usize>,
    pub dtype: DType,
    pub delta: f64,
    pub seed: u64,
    #[serde(default)]
    pub backend: Backend,
    #[serde(default = "default_low")]
    pub low: f64,
    #[serde(default = "default_high")]
    pub high: f64,
    /// Overrides `Tolerance::for_dtype` for the output comparison.
    #[serde(default)]
    pub tolerance: Option<Tolerance>,
}

impl OpCase {
    pub fn new(name: &str, shape: &[usize], dtype: DType) -> OpCase {
        OpCase {
            name: name.to_string(),
            shape: shape.to_vec(),
            dtype,
            delta: DEFAULT_DELTA,
            seed: DEFAULT_SEED,
            backend: Backend::Serial,
            low: default_low(),
            high: default_high(),
            tolerance: None,
        }
    }

    pub fn with_backend(mut self, backend: Backend) -> OpCase {
        self.backend = backend;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> OpCase {
        self.seed = seed;
        self
    }

    pub fn with_delta(mut self, delta: f64) -> OpCase {
        self.delta = delta;
        self
    }
}

/// A table of operator cases, loadable from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckConfig {
    pub cases: Vec<OpCase>,
}

impl Default for CheckConfig {
    /// Per-row, 1-D, 2-D and 3-D shapes in float32, the per-row shape in
    /// float16 and float64, and one parallel-backend run.
    fn default() -> Self {
        CheckConfig {
            cases: vec![
                OpCase::new("huber_f32_100x1", &[100, 1], DType::Float32),
                OpCase::new("huber_f32_64", &[64], DType::Float32),
                OpCase::new("huber_f32_6x6", &[6, 6], DType::Float32),
                OpCase::new("huber_f32_6x6x1", &[6, 6, 1], DType::Float32),
                OpCase::new("huber_f16_100x1", &[100, 1], DType::Float16),
                OpCase::new("huber_f64_100x1", &[100, 1], DType::Float64),
                OpCase::new("huber_f32_6x6_parallel", &[6, 6], DType::Float32).with_backend(Backend::Parallel),
            ],
        }
    }
}

impl CheckConfig {
    /// Serializes the table to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a table from a JSON file written by `save_json`.
    pub fn load_json(path: &str) -> Result<CheckConfig> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

/// Runs one case: forward against the f64 reference, then gradient checks
/// for both inputs, target only and prediction only.
///
/// `Err` is reserved for invalid cases (e.g. a bad delta); numerical
/// disagreement is reported through the returned `CaseReport`.
pub fn run_case(case: &OpCase) -> Result<CaseReport> {
    match case.dtype {
        DType::Float16 => run_typed::<f16>(case),
        DType::Float32 => run_typed::<f32>(case),
        DType::Float64 => run_typed::<f64>(case),
    }
}

/// Runs every case in order and logs a summary.
pub fn run_all(config: &CheckConfig) -> Result<Vec<CaseReport>> {
    let reports = config.cases.iter().map(run_case).collect::<Result<Vec<_>>>()?;
    let failed = reports.iter().filter(|r| !r.passed()).count();
    info!("{} cases run, {} passed, {} failed", reports.len(), reports.len() - failed, failed);
    Ok(reports)
}

fn run_typed<T: Element>(case: &OpCase) -> Result<CaseReport> {
    let loss = HuberLoss::new(case.delta)?.with_backend(case.backend);
    let mut rng = StdRng::seed_from_u64(case.seed);
    let prediction = Tensor::<T>::uniform(&case.shape, case.low, case.high, &mut rng)?;
    let target = Tensor::<T>::uniform(&case.shape, case.low, case.high, &mut rng)?;
    debug!("case {}: {} elements of {}", case.name, prediction.len(), T::DTYPE);

    let mut report = CaseReport {
        name: case.name.clone(),
        dtype: T::DTYPE,
        shape: case.shape.clone(),
        backend: case.backend,
        steps: Vec::new(),
    };

    let output = loss.forward(&prediction, &target)?;
    let shapes_ok = output.residual.shape() == case.shape.as_slice() && output.loss.shape() == case.shape.as_slice();
    report.steps.push(StepReport {
        step: "shape".to_string(),
        passed: shapes_ok,
        max_error: 0.0,
        detail: (!shapes_ok).then(|| {
            format!(
                "residual {:?} / loss {:?} for input {:?}",
                output.residual.shape(),
                output.loss.shape(),
                case.shape
            )
        }),
    });
    if !shapes_ok {
        warn!("case {}: output shape differs from input shape", case.name);
        return Ok(report);
    }

    let expected = reference::huber_forward(&prediction.to_f64(), &target.to_f64(), case.delta)?;
    let tolerance = case.tolerance.unwrap_or_else(|| Tolerance::for_dtype(T::DTYPE));
    for (step, actual, wanted) in [
        ("residual", output.residual.to_f64(), &expected.residual),
        ("loss", output.loss.to_f64(), &expected.loss),
    ] {
        let cmp = all_close(&actual, wanted, tolerance)?;
        let detail = cmp.first_failure.as_ref().map(|index| {
            format!(
                "{} of {} elements outside rtol {} / atol {}, first at {:?}",
                cmp.num_failures, cmp.num_elements, tolerance.rtol, tolerance.atol, index
            )
        });
        report.steps.push(StepReport {
            step: step.to_string(),
            passed: cmp.passed(),
            max_error: cmp.max_abs_diff,
            detail,
        });
    }

    let base = GradCheckConfig::default();
    let grad_steps = [
        ("grad_normal", vec![GradInput::Prediction, GradInput::Target], base),
        ("grad_ignore_prediction", vec![GradInput::Target], base.with_max_relative_error(SINGLE_INPUT_MAX_RELATIVE_ERROR)),
        ("grad_ignore_target", vec![GradInput::Prediction], base.with_max_relative_error(SINGLE_INPUT_MAX_RELATIVE_ERROR)),
    ];
    for (step, inputs, config) in grad_steps {
        let results = check_grad(&loss, &prediction, &target, &inputs, &config)?;
        let max_error = results.iter().map(|r| r.max_relative_error).fold(0.0, f64::max);
        let detail = results.iter().find(|r| !r.passed).map(|r| {
            format!(
                "d/d{} max relative error {:.3e} > {} at {:?}",
                r.input.name(),
                r.max_relative_error,
                config.max_relative_error,
                r.worst_index
            )
        });
        report.steps.push(StepReport {
            step: step.to_string(),
            passed: detail.is_none(),
            max_error,
            detail,
        });
    }

    for step in report.failed_steps() {
        warn!("case {} step {} failed: {}", case.name, step.step, step.detail.as_deref().unwrap_or(""));
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HuberError;

    #[test]
    fn default_table_passes() {
        let reports = run_all(&CheckConfig::default()).unwrap();
        assert_eq!(reports.len(), 7);
        for report in &reports {
            assert!(report.passed(), "{}", report.summary_line());
            assert_eq!(report.steps.len(), 6);
        }
    }

    #[test]
    fn invalid_delta_is_an_error() {
        let case = OpCase::new("bad", &[4], DType::Float32).with_delta(-0.5);
        assert!(run_case(&case).is_err());
    }

    #[test]
    fn empty_input_range_is_an_error() {
        let mut case = OpCase::new("bad", &[4], DType::Float32);
        case.low = 1.0;
        case.high = 1.0;
        assert!(matches!(run_case(&case), Err(HuberError::InvalidRange { .. })));
    }

    #[test]
    fn case_fills_defaults_from_json() {
        let json = r#"{"name":"x","shape":[6,6],"dtype":"float16","delta":0.5,"seed":1}"#;
        let case: OpCase = serde_json::from_str(json).unwrap();
        assert_eq!(case.backend, Backend::Serial);
        assert_eq!((case.low, case.high), (0.0, 1.0));
        assert!(case.tolerance.is_none());
    }
}
