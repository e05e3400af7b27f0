use crate::tensor::Tensor;

/// Error returned by a layer constructor that rejects its configuration.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {layer} configuration: {reason}")]
pub struct ConstructionError {
    /// Family of the layer being built.
    pub layer: &'static str,
    /// Why the configuration was rejected.
    pub reason: String,
}

impl ConstructionError {
    pub(crate) fn new(layer: &'static str, reason: impl Into<String>) -> Self {
        Self {
            layer,
            reason: reason.into(),
        }
    }
}

/// Zero-filled parameter of a layer, rejecting shapes whose storage cannot be allocated.
pub(crate) fn zeros(layer: &'static str, shape: Vec<usize>) -> Result<Tensor, ConstructionError> {
    let dims = format!("{shape:?}");
    Tensor::zeros(shape)
        .ok_or_else(|| ConstructionError::new(layer, format!("parameter {dims} is too large")))
}
