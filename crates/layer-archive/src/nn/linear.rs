use serde::{Deserialize, Serialize};

use super::error::zeros;
use super::ConstructionError;
use crate::config::Config;
use crate::tensor::Tensor;

/// Configuration to create a [fully connected](FullyConnected) layer.
#[derive(new, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullyConnectedConfig {
    /// The size of the input features.
    pub in_size: usize,
    /// The size of the output features.
    pub out_size: usize,
    /// If a bias should be added to the output.
    #[new(value = "true")]
    pub has_bias: bool,
}

impl Config for FullyConnectedConfig {}

/// Dense layer: `Y = X W + b`.
///
/// # Params
///
/// - weight: `[in_size, out_size]`
/// - bias: `[out_size]`, only present when the layer has a bias.
#[derive(Debug, Clone, PartialEq)]
pub struct FullyConnected {
    config: FullyConnectedConfig,
    weight: Tensor,
    bias: Option<Tensor>,
}

impl FullyConnectedConfig {
    /// Set whether a bias is added to the output.
    pub fn with_bias(mut self, has_bias: bool) -> Self {
        self.has_bias = has_bias;
        self
    }

    /// Initialize a new [fully connected](FullyConnected) layer.
    pub fn init(&self) -> Result<FullyConnected, ConstructionError> {
        if self.in_size == 0 || self.out_size == 0 {
            return Err(ConstructionError::new(
                "fully connected",
                format!(
                    "input and output sizes must be positive, got {}x{}",
                    self.in_size, self.out_size
                ),
            ));
        }

        let weight = zeros("fully connected", vec![self.in_size, self.out_size])?;
        let bias = self
            .has_bias
            .then(|| zeros("fully connected", vec![self.out_size]))
            .transpose()?;

        Ok(FullyConnected {
            config: self.clone(),
            weight,
            bias,
        })
    }
}

impl FullyConnected {
    /// The configuration the layer was built from.
    pub fn config(&self) -> &FullyConnectedConfig {
        &self.config
    }

    pub(crate) fn params(&self) -> Vec<&Tensor> {
        core::iter::once(&self.weight).chain(&self.bias).collect()
    }

    pub(crate) fn params_mut(&mut self) -> Vec<&mut Tensor> {
        core::iter::once(&mut self.weight)
            .chain(&mut self.bias)
            .collect()
    }
}

/// Configuration to create a [linear](Linear) layer.
#[derive(new, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearConfig {
    /// Number of input (and output) values.
    pub in_size: usize,
    /// Factor applied to every value. Default: 1.0
    #[new(value = "1.0")]
    pub scale: f32,
    /// Constant added after scaling. Default: 0.0
    #[new(value = "0.0")]
    pub bias: f32,
}

impl Config for LinearConfig {}

/// Element-wise affine map: `y = scale * x + bias`. Has no learnable parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Linear {
    config: LinearConfig,
}

impl LinearConfig {
    /// Set the scale.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Set the bias.
    pub fn with_bias(mut self, bias: f32) -> Self {
        self.bias = bias;
        self
    }

    /// Initialize a new [linear](Linear) layer.
    pub fn init(&self) -> Linear {
        Linear {
            config: self.clone(),
        }
    }
}

impl Linear {
    /// The configuration the layer was built from.
    pub fn config(&self) -> &LinearConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bias_follows_config() {
        let layer = FullyConnectedConfig::new(4, 3).init().unwrap();
        assert_eq!(layer.params().len(), 2);
        assert_eq!(layer.params()[0].shape, vec![4, 3]);

        let layer = FullyConnectedConfig::new(4, 3)
            .with_bias(false)
            .init()
            .unwrap();
        assert_eq!(layer.params().len(), 1);
    }

    #[test]
    fn zero_sizes_are_rejected() {
        let result = FullyConnectedConfig::new(0, 3).init();

        assert!(result.is_err());
    }

    #[test]
    fn overflowing_weight_is_rejected() {
        let result = FullyConnectedConfig::new(usize::MAX, 2).init();

        assert!(matches!(
            result,
            Err(ConstructionError { layer: "fully connected", .. })
        ));
    }
}
