pub mod element;
pub mod tensor;

pub use element::{DType, Element};
pub use tensor::Tensor;
