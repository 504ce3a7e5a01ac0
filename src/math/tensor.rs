use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::error::{HuberError, Result};
use crate::math::element::Element;

/// Dense row-major n-dimensional array.
///
/// An empty shape `[]` denotes a scalar holding exactly one element.
/// Deserialization goes through `from_vec`, so `data.len()` always equals
/// the product of `shape`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Element", try_from = "RawTensor<T>")]
pub struct Tensor<T: Element> {
    shape: Vec<usize>,
    data: Vec<T>,
}

#[derive(Deserialize)]
#[serde(bound = "T: Element")]
struct RawTensor<T: Element> {
    shape: Vec<usize>,
    data: Vec<T>,
}

impl<T: Element> TryFrom<RawTensor<T>> for Tensor<T> {
    type Error = HuberError;

    fn try_from(raw: RawTensor<T>) -> Result<Tensor<T>> {
        Tensor::from_vec(&raw.shape, raw.data)
    }
}

fn numel(shape: &[usize]) -> usize {
    shape.iter().product()
}

impl<T: Element> Tensor<T> {
    pub fn full(shape: &[usize], value: T) -> Tensor<T> {
        Tensor {
            shape: shape.to_vec(),
            data: vec![value; numel(shape)],
        }
    }

    pub fn zeros(shape: &[usize]) -> Tensor<T> {
        Tensor::full(shape, T::ZERO)
    }

    pub fn ones(shape: &[usize]) -> Tensor<T> {
        Tensor::full(shape, T::ONE)
    }

    pub fn from_vec(shape: &[usize], data: Vec<T>) -> Result<Tensor<T>> {
        let expected = numel(shape);
        if data.len() != expected {
            return Err(HuberError::DataLength {
                shape: shape.to_vec(),
                len: data.len(),
                expected,
            });
        }
        Ok(Tensor { shape: shape.to_vec(), data })
    }

    /// Converts f64 values into a tensor of element type `T`.
    pub fn from_f64(shape: &[usize], values: &[f64]) -> Result<Tensor<T>> {
        Tensor::from_vec(shape, values.iter().map(|&v| T::from_f64(v)).collect())
    }

    /// Samples every element uniformly from `[low, high)` and rounds it to `T`.
    /// The range must be finite and non-empty.
    pub fn uniform<R: Rng + ?Sized>(shape: &[usize], low: f64, high: f64, rng: &mut R) -> Result<Tensor<T>> {
        if !(low.is_finite() && high.is_finite() && low < high) {
            return Err(HuberError::InvalidRange { low, high });
        }
        let data = (0..numel(shape))
            .map(|_| T::from_f64(rng.gen_range(low..high)))
            .collect();
        Ok(Tensor { shape: shape.to_vec(), data })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    /// Row-major offset of a multi-index, or `None` when out of bounds.
    pub fn offset(&self, index: &[usize]) -> Option<usize> {
        if index.len() != self.shape.len() {
            return None;
        }
        let mut offset = 0;
        for (&i, &dim) in index.iter().zip(self.shape.iter()) {
            if i >= dim {
                return None;
            }
            offset = offset * dim + i;
        }
        Some(offset)
    }

    pub fn get(&self, index: &[usize]) -> Option<T> {
        self.offset(index).map(|o| self.data[o])
    }

    /// Inverse of `offset`: the multi-index of a flat position.
    pub fn unravel(&self, mut flat: usize) -> Vec<usize> {
        let mut index = vec![0; self.shape.len()];
        for (slot, &dim) in index.iter_mut().zip(self.shape.iter()).rev() {
            if dim > 0 {
                *slot = flat % dim;
                flat /= dim;
            }
        }
        index
    }

    pub fn map<F>(&self, functor: F) -> Tensor<T>
    where
        F: Fn(T) -> T,
    {
        Tensor {
            shape: self.shape.clone(),
            data: self.data.iter().map(|&x| functor(x)).collect(),
        }
    }

    /// Elementwise combination of two same-shape tensors.
    pub fn zip_map<F>(&self, rhs: &Tensor<T>, functor: F) -> Result<Tensor<T>>
    where
        F: Fn(T, T) -> T,
    {
        self.expect_shape(rhs.shape())?;
        Ok(Tensor {
            shape: self.shape.clone(),
            data: self.data.iter().zip(rhs.data.iter()).map(|(&a, &b)| functor(a, b)).collect(),
        })
    }

    pub fn neg(&self) -> Tensor<T> {
        self.map(|x| -x)
    }

    pub fn cast<U: Element>(&self) -> Tensor<U> {
        Tensor {
            shape: self.shape.clone(),
            data: self.data.iter().map(|&x| U::from_f64(x.to_f64())).collect(),
        }
    }

    pub fn to_f64(&self) -> Tensor<f64> {
        self.cast()
    }

    /// Fails with `ShapeMismatch` unless `other` equals this tensor's shape.
    pub fn expect_shape(&self, other: &[usize]) -> Result<()> {
        if self.shape != other {
            return Err(HuberError::ShapeMismatch {
                expected: self.shape.clone(),
                found: other.to_vec(),
            });
        }
        Ok(())
    }
}
