//! Operator-level tests: worked scenarios, the shape/dtype table and the
//! error surface of the public API.

use half::f16;
use huber_op::check::gradcheck::{check_grad, GradCheckConfig, GradInput};
use huber_op::check::{run_case, CheckConfig, OpCase};
use huber_op::{AnyTensor, Backend, DType, HuberError, HuberLoss, Tensor};

fn scalar(v: f64) -> Tensor<f64> {
    Tensor::from_vec(&[1], vec![v]).unwrap()
}

#[test]
fn scenario_small_residual() {
    let loss = HuberLoss::new(0.5).unwrap();
    let out = loss.forward(&scalar(0.0), &scalar(0.3)).unwrap();
    assert_eq!(out.residual.data(), &[0.3]);
    assert!((out.loss.data()[0] - 0.045).abs() < 1e-15);

    let grads = loss.backward(&out.residual, &scalar(1.0)).unwrap();
    assert!((grads.grad_target.data()[0] - 0.3).abs() < 1e-15);
    assert!((grads.grad_prediction.data()[0] + 0.3).abs() < 1e-15);
}

#[test]
fn scenario_large_residual() {
    let loss = HuberLoss::new(0.5).unwrap();
    let out = loss.forward(&scalar(0.0), &scalar(1.0)).unwrap();
    assert_eq!(out.residual.data(), &[1.0]);
    assert_eq!(out.loss.data(), &[0.375]);

    let grads = loss.backward(&out.residual, &scalar(1.0)).unwrap();
    assert_eq!(grads.grad_target.data(), &[0.5]);
    assert_eq!(grads.grad_prediction.data(), &[-0.5]);
}

#[test]
fn every_shape_and_dtype_passes() {
    let shapes: [&[usize]; 5] = [&[100, 1], &[64], &[6, 6], &[6, 6, 1], &[]];
    let dtypes = [DType::Float16, DType::Float32, DType::Float64];
    let backends = [Backend::Serial, Backend::Parallel];

    for shape in shapes {
        for dtype in dtypes {
            for backend in backends {
                let name = format!("{dtype}_{shape:?}_{}", backend.name());
                let case = OpCase::new(&name, shape, dtype).with_backend(backend).with_seed(11);
                let report = run_case(&case).unwrap();
                assert!(report.passed(), "{}", report.summary_line());
                assert_eq!(report.shape, shape.to_vec());
            }
        }
    }
}

#[test]
fn outputs_match_input_shape() {
    let loss = HuberLoss::new(0.5).unwrap();
    for shape in [vec![100, 1], vec![64], vec![6, 6], vec![6, 6, 1]] {
        let p = Tensor::<f32>::full(&shape, 0.25);
        let t = Tensor::<f32>::full(&shape, 0.75);
        let out = loss.forward(&p, &t).unwrap();
        assert_eq!(out.residual.shape(), shape.as_slice());
        assert_eq!(out.loss.shape(), shape.as_slice());
        let grads = loss.backward_ones(&out.residual).unwrap();
        assert_eq!(grads.grad_prediction.shape(), shape.as_slice());
        assert_eq!(grads.grad_target.shape(), shape.as_slice());
    }
}

#[test]
fn wider_input_range_hits_both_branches() {
    let mut case = OpCase::new("wide", &[10, 10], DType::Float32).with_seed(3);
    case.low = -2.0;
    case.high = 2.0;
    let report = run_case(&case).unwrap();
    assert!(report.passed(), "{}", report.summary_line());
}

#[test]
fn half_precision_gradients_within_tolerance() {
    let loss = HuberLoss::new(0.5).unwrap();
    let p = Tensor::<f16>::from_f64(&[4], &[0.0, 0.2, 0.9, 0.1]).unwrap();
    let t = Tensor::<f16>::from_f64(&[4], &[0.3, 0.9, 0.1, 0.1]).unwrap();
    let results = check_grad(
        &loss,
        &p,
        &t,
        &[GradInput::Prediction, GradInput::Target],
        &GradCheckConfig::default(),
    )
    .unwrap();
    for r in results {
        assert!(r.passed, "{r:?}");
    }
}

#[test]
fn shape_mismatch_is_reported() {
    let loss = HuberLoss::new(1.0).unwrap();
    let err = loss
        .forward(&Tensor::<f32>::zeros(&[6, 6]), &Tensor::<f32>::zeros(&[36]))
        .unwrap_err();
    match err {
        HuberError::ShapeMismatch { expected, found } => {
            assert_eq!(expected, vec![6, 6]);
            assert_eq!(found, vec![36]);
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn integer_dtype_and_mixed_inputs_are_rejected() {
    assert!(matches!(DType::parse("int32"), Err(HuberError::UnsupportedDtype(_))));

    let loss = HuberLoss::new(1.0).unwrap();
    let p = AnyTensor::from_f64(DType::Float32, &[6, 6], &[0.1; 36]).unwrap();
    let t = AnyTensor::from_f64(DType::Float16, &[6, 6], &[0.1; 36]).unwrap();
    assert!(matches!(loss.forward_any(&p, &t), Err(HuberError::DtypeMismatch { .. })));
}

#[test]
fn config_round_trips_through_json_file() {
    let path = std::env::temp_dir().join(format!("huber-op-cases-{}.json", std::process::id()));
    let path = path.to_str().unwrap();

    let config = CheckConfig::default();
    config.save_json(path).unwrap();
    let loaded = CheckConfig::load_json(path).unwrap();
    std::fs::remove_file(path).unwrap();

    assert_eq!(loaded, config);
}

#[test]
fn missing_config_file_is_io_error() {
    let err = CheckConfig::load_json("/nonexistent/huber-op/cases.json").unwrap_err();
    assert!(matches!(err, HuberError::Io(_)));
}
