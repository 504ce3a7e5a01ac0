pub mod check;
pub mod error;
pub mod loss;
pub mod math;

// Convenience re-exports
pub use check::{run_all, run_case, CheckConfig, OpCase};
pub use error::{HuberError, Result};
pub use loss::{AnyTensor, Backend, HuberLoss, HuberOutput};
pub use math::{DType, Element, Tensor};
