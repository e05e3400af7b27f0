use serde::{Deserialize, Serialize};

/// Dense `f32` tensor holding one learned parameter of a layer.
///
/// Only the storage is modeled here; arithmetic over tensors lives elsewhere.
#[derive(new, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    /// The dimensions of the tensor.
    pub shape: Vec<usize>,
    /// The values in row-major order.
    pub value: Vec<f32>,
}

impl Tensor {
    /// Create a zero-filled tensor with the given shape.
    ///
    /// Returns `None` when the element count overflows or its storage exceeds `isize::MAX`
    /// bytes.
    pub fn zeros(shape: Vec<usize>) -> Option<Self> {
        let num_elements = shape
            .iter()
            .try_fold(1usize, |count, dim| count.checked_mul(*dim))
            .filter(|count| *count <= isize::MAX as usize / core::mem::size_of::<f32>())?;

        Some(Self {
            shape,
            value: vec![0.0; num_elements],
        })
    }

    /// Number of scalar elements.
    pub fn num_elements(&self) -> usize {
        self.value.len()
    }

    /// Borrow the values.
    pub fn as_slice(&self) -> &[f32] {
        &self.value
    }
}
