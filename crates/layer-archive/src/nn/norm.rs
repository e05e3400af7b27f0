use serde::{Deserialize, Serialize};

use super::{ConstructionError, NetPhase, NormRegion, Shape3d};
use crate::config::Config;

/// Configuration to create a [BatchNormalization] layer using the
/// [init function](BatchNormalizationConfig::init).
#[derive(new, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchNormalizationConfig {
    /// Number of cells in one channel.
    pub in_spatial_size: usize,
    /// The number of channels.
    pub in_channels: usize,
    /// A value required for numerical stability. Default: 1e-5
    #[new(value = "1e-5")]
    pub epsilon: f32,
    /// Momentum used to update the running statistics. Default: 0.999
    #[new(value = "0.999")]
    pub momentum: f32,
    /// The phase the layer starts in.
    #[new(default)]
    pub phase: NetPhase,
}

impl Config for BatchNormalizationConfig {}

/// Applies batch normalization channel by channel.
///
/// The running mean and variance are not constructor arguments: they start as zeros and ones
/// and are replaced through [set_mean](BatchNormalization::set_mean) and
/// [set_variance](BatchNormalization::set_variance).
#[derive(Debug, Clone, PartialEq)]
pub struct BatchNormalization {
    config: BatchNormalizationConfig,
    mean: Vec<f32>,
    variance: Vec<f32>,
}

impl BatchNormalizationConfig {
    /// Set the epsilon.
    pub fn with_epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Set the momentum.
    pub fn with_momentum(mut self, momentum: f32) -> Self {
        self.momentum = momentum;
        self
    }

    /// Set the phase.
    pub fn with_phase(mut self, phase: NetPhase) -> Self {
        self.phase = phase;
        self
    }

    /// Initialize a new [batch normalization](BatchNormalization) layer.
    pub fn init(&self) -> Result<BatchNormalization, ConstructionError> {
        if self.in_channels == 0 {
            return Err(ConstructionError::new(
                "batch normalization",
                "at least one channel is required",
            ));
        }

        Ok(BatchNormalization {
            config: self.clone(),
            mean: vec![0.0; self.in_channels],
            variance: vec![1.0; self.in_channels],
        })
    }
}

impl BatchNormalization {
    /// The configuration the layer was built from.
    pub fn config(&self) -> &BatchNormalizationConfig {
        &self.config
    }

    /// Running mean, one value per channel.
    pub fn mean(&self) -> &[f32] {
        &self.mean
    }

    /// Running variance, one value per channel.
    pub fn variance(&self) -> &[f32] {
        &self.variance
    }

    /// Replace the running mean.
    pub fn set_mean(&mut self, mean: Vec<f32>) -> Result<(), ConstructionError> {
        self.mean = self.check_channels("mean", mean)?;
        Ok(())
    }

    /// Replace the running variance.
    pub fn set_variance(&mut self, variance: Vec<f32>) -> Result<(), ConstructionError> {
        self.variance = self.check_channels("variance", variance)?;
        Ok(())
    }

    fn check_channels(
        &self,
        statistic: &str,
        values: Vec<f32>,
    ) -> Result<Vec<f32>, ConstructionError> {
        if values.len() != self.config.in_channels {
            return Err(ConstructionError::new(
                "batch normalization",
                format!(
                    "{statistic} has {} values for {} channels",
                    values.len(),
                    self.config.in_channels
                ),
            ));
        }

        Ok(values)
    }
}

/// Configuration to create a [local response normalization](Lrn) layer.
#[derive(new, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LrnConfig {
    /// The input volume.
    pub in_shape: Shape3d,
    /// Size of the normalization neighbourhood.
    pub size: usize,
    /// Scaling parameter. Default: 1.0
    #[new(value = "1.0")]
    pub alpha: f32,
    /// Exponent. Default: 5.0
    #[new(value = "5.0")]
    pub beta: f32,
    /// Neighbourhood shape.
    #[new(default)]
    pub region: NormRegion,
}

impl Config for LrnConfig {}

/// Local response normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct Lrn {
    config: LrnConfig,
}

impl LrnConfig {
    /// Set alpha.
    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set beta.
    pub fn with_beta(mut self, beta: f32) -> Self {
        self.beta = beta;
        self
    }

    /// Set the region.
    pub fn with_region(mut self, region: NormRegion) -> Self {
        self.region = region;
        self
    }

    /// Initialize a new [local response normalization](Lrn) layer.
    pub fn init(&self) -> Result<Lrn, ConstructionError> {
        if self.size == 0 {
            return Err(ConstructionError::new(
                "local response normalization",
                "size must be positive",
            ));
        }

        Ok(Lrn {
            config: self.clone(),
        })
    }
}

impl Lrn {
    /// The configuration the layer was built from.
    pub fn config(&self) -> &LrnConfig {
        &self.config
    }
}
