use serde::{Deserialize, Serialize};

use super::Shape3d;
use crate::config::Config;

/// Configuration shared by the parameter-free activations
/// (sigmoid, tanh, relu, softmax, elu, tanh_p1m2 and softsign).
#[derive(new, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivationConfig {
    /// The input volume; the output has the same shape.
    pub in_size: Shape3d,
}

impl Config for ActivationConfig {}

/// An element-wise activation without configuration beyond its shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Activation {
    config: ActivationConfig,
}

impl ActivationConfig {
    /// Initialize a new [activation](Activation).
    pub fn init(&self) -> Activation {
        Activation {
            config: self.clone(),
        }
    }
}

impl Activation {
    /// The configuration the layer was built from.
    pub fn config(&self) -> &ActivationConfig {
        &self.config
    }
}

/// Configuration to create a [leaky relu](LeakyRelu) layer.
#[derive(new, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeakyReluConfig {
    /// The input volume.
    pub in_size: Shape3d,
    /// Slope for negative inputs. Default: 0.01
    #[new(value = "0.01")]
    pub epsilon: f32,
}

impl Config for LeakyReluConfig {}

/// `max(x, epsilon * x)`.
#[derive(Debug, Clone, PartialEq)]
pub struct LeakyRelu {
    config: LeakyReluConfig,
}

impl LeakyReluConfig {
    /// Set the negative slope.
    pub fn with_epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Initialize a new [leaky relu](LeakyRelu) layer.
    pub fn init(&self) -> LeakyRelu {
        LeakyRelu {
            config: self.clone(),
        }
    }
}

impl LeakyRelu {
    /// The configuration the layer was built from.
    pub fn config(&self) -> &LeakyReluConfig {
        &self.config
    }
}

/// Configuration to create a [softplus](Softplus) layer.
#[derive(new, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftplusConfig {
    /// The input volume.
    pub in_size: Shape3d,
    /// Sharpness. Default: 1.0
    #[new(value = "1.0")]
    pub beta: f32,
    /// Above `beta * x > threshold` the layer is linear. Default: 20.0
    #[new(value = "20.0")]
    pub threshold: f32,
}

impl Config for SoftplusConfig {}

/// `log(1 + exp(beta * x)) / beta`.
#[derive(Debug, Clone, PartialEq)]
pub struct Softplus {
    config: SoftplusConfig,
}

impl SoftplusConfig {
    /// Set beta.
    pub fn with_beta(mut self, beta: f32) -> Self {
        self.beta = beta;
        self
    }

    /// Set the threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Initialize a new [softplus](Softplus) layer.
    pub fn init(&self) -> Softplus {
        Softplus {
            config: self.clone(),
        }
    }
}

impl Softplus {
    /// The configuration the layer was built from.
    pub fn config(&self) -> &SoftplusConfig {
        &self.config
    }
}
