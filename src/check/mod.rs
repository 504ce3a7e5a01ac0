pub mod case;
pub mod compare;
pub mod gradcheck;
pub mod reference;
pub mod report;

pub use case::{run_all, run_case, CheckConfig, OpCase};
pub use compare::{all_close, Comparison, Tolerance};
pub use gradcheck::{check_grad, GradCheckConfig, GradCheckResult, GradInput};
pub use report::{CaseReport, StepReport};
