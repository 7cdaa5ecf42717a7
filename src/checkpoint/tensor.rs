//! Dtype-preserving tensor payload.

use crate::{Error, Result};
use ndarray::{ArrayD, IxDyn};
use safetensors::{Dtype, View};
use std::borrow::Cow;

/// A named checkpoint value: dtype, row-major shape and raw little-endian bytes.
///
/// The payload is never decoded during conversion. Reshaping a row-major
/// tensor is a pure reinterpretation, so only the shape changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    dtype: Dtype,
    shape: Vec<usize>,
    data: Vec<u8>,
}

impl Tensor {
    /// Wrap raw bytes.
    pub fn new(dtype: Dtype, shape: Vec<usize>, data: Vec<u8>) -> Self {
        Self { dtype, shape, data }
    }

    /// Build an F32 tensor from a flat vector.
    ///
    /// # Panics
    ///
    /// Panics if `values.len()` does not match the product of `shape`.
    pub fn from_f32(shape: Vec<usize>, values: Vec<f32>) -> Self {
        assert_eq!(
            values.len(),
            shape.iter().product::<usize>(),
            "value count must match shape {shape:?}"
        );
        Self { dtype: Dtype::F32, shape, data: bytemuck::cast_slice(&values).to_vec() }
    }

    /// Build an F32 tensor from an ndarray, in standard (row-major) order.
    pub fn from_f32_array(array: &ArrayD<f32>) -> Self {
        let values: Vec<f32> = array.as_standard_layout().iter().copied().collect();
        Self::from_f32(array.shape().to_vec(), values)
    }

    /// Decode an F32 payload into an ndarray. Returns `None` for other dtypes.
    pub fn to_f32_array(&self) -> Option<ArrayD<f32>> {
        if self.dtype != Dtype::F32 {
            return None;
        }
        let values: Vec<f32> = self
            .data
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        ArrayD::from_shape_vec(IxDyn(&self.shape), values).ok()
    }

    /// Element type.
    pub fn dtype(&self) -> Dtype {
        self.dtype
    }

    /// Row-major shape.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Raw payload.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Number of elements.
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    /// Reinterpret the tensor with a new shape of equal element count.
    ///
    /// `name` is only used for the error message.
    pub fn reshape(&mut self, name: &str, shape: &[usize]) -> Result<()> {
        let numel: usize = shape.iter().product();
        if numel != self.numel() {
            return Err(Error::shape_mismatch(name, &self.shape, shape));
        }
        self.shape = shape.to_vec();
        Ok(())
    }
}

impl View for &Tensor {
    fn dtype(&self) -> Dtype {
        self.dtype
    }

    fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn data(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(&self.data)
    }

    fn data_len(&self) -> usize {
        self.data.len()
    }
}
