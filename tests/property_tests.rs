//! Property-based tests for the Huber forward and backward rules.

use huber_op::loss::{huber, huber_grad};
use huber_op::{Backend, HuberLoss, Tensor};
use proptest::prelude::*;

proptest! {
    /// Inside |r| <= delta the loss is exactly 0.5·r².
    #[test]
    fn quadratic_inside_delta(delta in 0.01f64..10.0, frac in -1.0f64..=1.0) {
        let r = frac * delta;
        prop_assert_eq!(huber(r, delta), 0.5 * r * r);
    }

    /// Outside |r| > delta the loss is exactly delta·(|r| − 0.5·delta).
    #[test]
    fn linear_outside_delta(delta in 0.01f64..10.0, excess in 1e-6f64..100.0, negative in any::<bool>()) {
        let r = if negative { -(delta + excess) } else { delta + excess };
        prop_assert_eq!(huber(r, delta), delta * (r.abs() - 0.5 * delta));
    }

    /// The two branches agree at |r| = delta.
    #[test]
    fn continuous_at_delta(delta in 0.01f64..10.0) {
        let quadratic = 0.5 * delta * delta;
        let linear = delta * (delta - 0.5 * delta);
        prop_assert!((huber(delta, delta) - linear).abs() <= 1e-12 * quadratic.max(1.0));
        prop_assert!((huber(-delta, delta) - quadratic).abs() <= 1e-12 * quadratic.max(1.0));
    }

    /// residual == target − prediction exactly.
    #[test]
    fn residual_is_exact(
        values in prop::collection::vec((-1e3f64..1e3, -1e3f64..1e3), 1..64),
    ) {
        let (p, t): (Vec<f64>, Vec<f64>) = values.into_iter().unzip();
        let n = p.len();
        let prediction = Tensor::from_vec(&[n], p.clone()).unwrap();
        let target = Tensor::from_vec(&[n], t.clone()).unwrap();
        let out = HuberLoss::new(0.5).unwrap().forward(&prediction, &target).unwrap();
        for i in 0..n {
            prop_assert_eq!(out.residual.data()[i], t[i] - p[i]);
        }
    }

    /// Negating both inputs negates the residual and keeps the loss.
    #[test]
    fn negation_symmetry(
        values in prop::collection::vec((-5.0f32..5.0, -5.0f32..5.0), 1..64),
        delta in 0.05f64..3.0,
    ) {
        let (p, t): (Vec<f32>, Vec<f32>) = values.into_iter().unzip();
        let n = p.len();
        let loss = HuberLoss::new(delta).unwrap();
        let prediction = Tensor::from_vec(&[n], p).unwrap();
        let target = Tensor::from_vec(&[n], t).unwrap();

        let out = loss.forward(&prediction, &target).unwrap();
        let neg = loss.forward(&prediction.neg(), &target.neg()).unwrap();
        prop_assert_eq!(neg.residual, out.residual.neg());
        prop_assert_eq!(neg.loss, out.loss);
    }

    /// Serial and parallel schedules produce identical results.
    #[test]
    fn backends_agree(
        values in prop::collection::vec((-2.0f64..2.0, -2.0f64..2.0), 1..256),
        delta in 0.05f64..3.0,
    ) {
        let (p, t): (Vec<f64>, Vec<f64>) = values.into_iter().unzip();
        let n = p.len();
        let prediction = Tensor::from_vec(&[n], p).unwrap();
        let target = Tensor::from_vec(&[n], t).unwrap();

        let serial = HuberLoss::new(delta).unwrap();
        let parallel = serial.with_backend(Backend::Parallel);
        let a = serial.forward(&prediction, &target).unwrap();
        let b = parallel.forward(&prediction, &target).unwrap();
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(
            serial.backward_ones(&a.residual).unwrap(),
            parallel.backward_ones(&b.residual).unwrap()
        );
    }

    /// The backward rule is bounded by delta·|g| and linear in the upstream gradient.
    #[test]
    fn gradient_bounded_and_linear(r in -10.0f64..10.0, delta in 0.05f64..3.0, g in -4.0f64..4.0) {
        let grad = huber_grad(r, delta, g);
        prop_assert!(grad.abs() <= delta * g.abs() + 1e-12);
        prop_assert!((huber_grad(r, delta, 2.0 * g) - 2.0 * grad).abs() <= 1e-12);
    }
}
