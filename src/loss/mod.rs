pub mod backend;
pub mod dynamic;
pub mod huber;

pub use backend::Backend;
pub use dynamic::{AnyOutput, AnyTensor};
pub use huber::{huber, huber_grad, HuberGrads, HuberLoss, HuberOutput};
