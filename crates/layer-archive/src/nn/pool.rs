use serde::{Deserialize, Serialize};

use super::error::zeros;
use super::shape::{conv_out_length, deconv_out_length};
use super::{ConstructionError, Padding, Shape3d};
use crate::config::Config;
use crate::tensor::Tensor;

/// Configuration to create a [max pooling](MaxPooling) or an
/// [average pooling](AveragePooling) layer.
#[derive(new, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolingConfig {
    /// The input volume.
    pub in_size: Shape3d,
    /// The pooling window as `[x, y]`.
    pub pool_size: [usize; 2],
    /// The strides as `[x, y]`.
    pub stride: [usize; 2],
    /// The padding configuration.
    #[new(default)]
    pub padding: Padding,
}

impl Config for PoolingConfig {}

/// Takes the maximum of each window, channel by channel.
#[derive(Debug, Clone, PartialEq)]
pub struct MaxPooling {
    config: PoolingConfig,
    out_size: Shape3d,
}

/// Averages each window, then applies a per-channel scale and bias.
///
/// # Params
///
/// - weight: `[channels]`
/// - bias: `[channels]`
#[derive(Debug, Clone, PartialEq)]
pub struct AveragePooling {
    config: PoolingConfig,
    out_size: Shape3d,
    weight: Tensor,
    bias: Tensor,
}

impl PoolingConfig {
    /// Set the padding.
    pub fn with_padding(mut self, padding: Padding) -> Self {
        self.padding = padding;
        self
    }

    /// Initialize a new [max pooling](MaxPooling) layer.
    pub fn init_max(&self) -> Result<MaxPooling, ConstructionError> {
        Ok(MaxPooling {
            config: self.clone(),
            out_size: self.out_size("max pooling")?,
        })
    }

    /// Initialize a new [average pooling](AveragePooling) layer.
    pub fn init_average(&self) -> Result<AveragePooling, ConstructionError> {
        let channels = self.in_size.depth;

        Ok(AveragePooling {
            config: self.clone(),
            out_size: self.out_size("average pooling")?,
            weight: zeros("average pooling", vec![channels])?,
            bias: zeros("average pooling", vec![channels])?,
        })
    }

    fn out_size(&self, layer: &'static str) -> Result<Shape3d, ConstructionError> {
        let [pool_x, pool_y] = self.pool_size;
        let [stride_x, stride_y] = self.stride;

        match (
            conv_out_length(self.in_size.width, pool_x, stride_x, self.padding),
            conv_out_length(self.in_size.height, pool_y, stride_y, self.padding),
        ) {
            (Some(width), Some(height)) => Ok(Shape3d::new(width, height, self.in_size.depth)),
            _ => Err(ConstructionError::new(
                layer,
                format!(
                    "pool {pool_x}x{pool_y} with stride {stride_x}x{stride_y} does not fit input {}x{}",
                    self.in_size.width, self.in_size.height
                ),
            )),
        }
    }
}

impl MaxPooling {
    /// The configuration the layer was built from.
    pub fn config(&self) -> &PoolingConfig {
        &self.config
    }

    /// The output volume.
    pub fn out_size(&self) -> Shape3d {
        self.out_size
    }
}

impl AveragePooling {
    /// The configuration the layer was built from.
    pub fn config(&self) -> &PoolingConfig {
        &self.config
    }

    /// The output volume.
    pub fn out_size(&self) -> Shape3d {
        self.out_size
    }

    pub(crate) fn params(&self) -> Vec<&Tensor> {
        vec![&self.weight, &self.bias]
    }

    pub(crate) fn params_mut(&mut self) -> Vec<&mut Tensor> {
        vec![&mut self.weight, &mut self.bias]
    }
}

/// Configuration to create a [max unpooling](MaxUnpooling) or an
/// [average unpooling](AverageUnpooling) layer.
#[derive(new, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnpoolingConfig {
    /// The input volume.
    pub in_size: Shape3d,
    /// The square unpooling window.
    pub pool_size: usize,
    /// The stride, in both directions.
    pub stride: usize,
}

impl Config for UnpoolingConfig {}

/// Scatters each input cell back to the position that won the matching max pooling.
#[derive(Debug, Clone, PartialEq)]
pub struct MaxUnpooling {
    config: UnpoolingConfig,
    out_size: Shape3d,
}

/// Spreads each input cell over its window, with a per-channel scale and bias.
///
/// # Params
///
/// - weight: `[channels]`
/// - bias: `[channels]`
#[derive(Debug, Clone, PartialEq)]
pub struct AverageUnpooling {
    config: UnpoolingConfig,
    out_size: Shape3d,
    weight: Tensor,
    bias: Tensor,
}

impl UnpoolingConfig {
    /// Initialize a new [max unpooling](MaxUnpooling) layer.
    pub fn init_max(&self) -> Result<MaxUnpooling, ConstructionError> {
        Ok(MaxUnpooling {
            config: self.clone(),
            out_size: self.out_size("max unpooling")?,
        })
    }

    /// Initialize a new [average unpooling](AverageUnpooling) layer.
    pub fn init_average(&self) -> Result<AverageUnpooling, ConstructionError> {
        let channels = self.in_size.depth;

        Ok(AverageUnpooling {
            config: self.clone(),
            out_size: self.out_size("average unpooling")?,
            weight: zeros("average unpooling", vec![channels])?,
            bias: zeros("average unpooling", vec![channels])?,
        })
    }

    fn out_size(&self, layer: &'static str) -> Result<Shape3d, ConstructionError> {
        let out_dim =
            |in_length| deconv_out_length(in_length, self.pool_size, self.stride, Padding::Valid);

        match (out_dim(self.in_size.width), out_dim(self.in_size.height)) {
            (Some(width), Some(height)) => Ok(Shape3d::new(width, height, self.in_size.depth)),
            _ => Err(ConstructionError::new(
                layer,
                format!(
                    "pool size {} and stride {} must be positive",
                    self.pool_size, self.stride
                ),
            )),
        }
    }
}

impl MaxUnpooling {
    /// The configuration the layer was built from.
    pub fn config(&self) -> &UnpoolingConfig {
        &self.config
    }

    /// The output volume.
    pub fn out_size(&self) -> Shape3d {
        self.out_size
    }
}

impl AverageUnpooling {
    /// The configuration the layer was built from.
    pub fn config(&self) -> &UnpoolingConfig {
        &self.config
    }

    /// The output volume.
    pub fn out_size(&self) -> Shape3d {
        self.out_size
    }

    pub(crate) fn params(&self) -> Vec<&Tensor> {
        vec![&self.weight, &self.bias]
    }

    pub(crate) fn params_mut(&mut self) -> Vec<&mut Tensor> {
        vec![&mut self.weight, &mut self.bias]
    }
}

/// Configuration to create a [global average pooling](GlobalAveragePooling) layer.
#[derive(new, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalAveragePoolingConfig {
    /// The input volume.
    pub in_shape: Shape3d,
}

impl Config for GlobalAveragePoolingConfig {}

/// Averages every channel down to a single value.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalAveragePooling {
    config: GlobalAveragePoolingConfig,
}

impl GlobalAveragePoolingConfig {
    /// Initialize a new [global average pooling](GlobalAveragePooling) layer.
    pub fn init(&self) -> GlobalAveragePooling {
        GlobalAveragePooling {
            config: self.clone(),
        }
    }
}

impl GlobalAveragePooling {
    /// The configuration the layer was built from.
    pub fn config(&self) -> &GlobalAveragePoolingConfig {
        &self.config
    }

    /// The output volume, one cell per channel.
    pub fn out_size(&self) -> Shape3d {
        Shape3d::new(1, 1, self.config.in_shape.depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Padding::Valid, [2, 2], Shape3d::new(12, 12, 6))]
    #[case(Padding::Valid, [1, 1], Shape3d::new(23, 23, 6))]
    #[case(Padding::Same, [2, 2], Shape3d::new(12, 12, 6))]
    fn pooling_out_size(
        #[case] padding: Padding,
        #[case] stride: [usize; 2],
        #[case] expected: Shape3d,
    ) {
        let layer = PoolingConfig::new(Shape3d::new(24, 24, 6), [2, 2], stride)
            .with_padding(padding)
            .init_max()
            .unwrap();

        assert_eq!(layer.out_size(), expected);
    }

    #[test]
    fn average_pooling_has_channel_params() {
        let layer = PoolingConfig::new(Shape3d::new(24, 24, 6), [2, 2], [2, 2])
            .init_average()
            .unwrap();

        assert_eq!(layer.params().len(), 2);
        assert!(layer.params().iter().all(|param| param.num_elements() == 6));
    }

    #[test]
    fn unpooling_out_size() {
        let layer = UnpoolingConfig::new(Shape3d::new(12, 12, 6), 2, 2)
            .init_max()
            .unwrap();

        assert_eq!(layer.out_size(), Shape3d::new(24, 24, 6));
    }

    #[test]
    fn zero_stride_is_rejected() {
        assert!(UnpoolingConfig::new(Shape3d::new(4, 4, 1), 2, 0)
            .init_average()
            .is_err());
        assert!(PoolingConfig::new(Shape3d::new(4, 4, 1), [2, 2], [0, 2])
            .init_max()
            .is_err());
    }
}
