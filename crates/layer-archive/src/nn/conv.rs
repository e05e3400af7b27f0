use serde::{Deserialize, Serialize};

use super::error::zeros;
use super::shape::{conv_out_length, deconv_out_length};
use super::{ConnectionTable, ConstructionError, Padding, Shape3d};
use crate::config::Config;
use crate::tensor::Tensor;

/// Configuration to create a [convolution](Convolution) or a
/// [deconvolution](Deconvolution) layer.
#[derive(new, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvolutionConfig {
    /// The input volume; its depth is the number of input channels.
    pub in_size: Shape3d,
    /// The window as `[width, height]`.
    pub window: [usize; 2],
    /// The number of output channels.
    pub out_channels: usize,
    /// Connections between input and output channels. Empty means fully connected.
    #[new(default)]
    pub table: ConnectionTable,
    /// The padding configuration.
    #[new(default)]
    pub padding: Padding,
    /// If bias should be added to the output.
    #[new(value = "true")]
    pub has_bias: bool,
    /// The strides as `[width, height]`.
    #[new(value = "[1, 1]")]
    pub stride: [usize; 2],
}

impl Config for ConvolutionConfig {}

/// Applies a 2D convolution over an input volume.
///
/// # Params
///
/// - weight: `[out_channels, in_channels, window_height, window_width]`
/// - bias: `[out_channels]`, only present when the layer has a bias.
#[derive(Debug, Clone, PartialEq)]
pub struct Convolution {
    config: ConvolutionConfig,
    out_size: Shape3d,
    weight: Tensor,
    bias: Option<Tensor>,
}

/// Applies a transposed 2D convolution over an input volume.
///
/// Same parameters as [Convolution], the output grows with the stride instead of shrinking.
#[derive(Debug, Clone, PartialEq)]
pub struct Deconvolution {
    config: ConvolutionConfig,
    out_size: Shape3d,
    weight: Tensor,
    bias: Option<Tensor>,
}

impl ConvolutionConfig {
    /// Set the connection table.
    pub fn with_table(mut self, table: ConnectionTable) -> Self {
        self.table = table;
        self
    }

    /// Set the padding.
    pub fn with_padding(mut self, padding: Padding) -> Self {
        self.padding = padding;
        self
    }

    /// Set whether a bias is added to the output.
    pub fn with_bias(mut self, has_bias: bool) -> Self {
        self.has_bias = has_bias;
        self
    }

    /// Set the strides as `[width, height]`.
    pub fn with_stride(mut self, stride: [usize; 2]) -> Self {
        self.stride = stride;
        self
    }

    /// Initialize a new [convolution](Convolution) layer.
    pub fn init(&self) -> Result<Convolution, ConstructionError> {
        let out_dim = |in_length, window, stride| {
            conv_out_length(in_length, window, stride, self.padding)
        };
        let (config, out_size, weight, bias) = self.build("convolution", out_dim)?;

        Ok(Convolution {
            config,
            out_size,
            weight,
            bias,
        })
    }

    /// Initialize a new [deconvolution](Deconvolution) layer.
    pub fn init_deconvolution(&self) -> Result<Deconvolution, ConstructionError> {
        let out_dim = |in_length, window, stride| {
            deconv_out_length(in_length, window, stride, self.padding)
        };
        let (config, out_size, weight, bias) = self.build("deconvolution", out_dim)?;

        Ok(Deconvolution {
            config,
            out_size,
            weight,
            bias,
        })
    }

    fn build(
        &self,
        layer: &'static str,
        out_dim: impl Fn(usize, usize, usize) -> Option<usize>,
    ) -> Result<(Self, Shape3d, Tensor, Option<Tensor>), ConstructionError> {
        let [window_width, window_height] = self.window;
        let [stride_width, stride_height] = self.stride;
        let in_channels = self.in_size.depth;

        if in_channels == 0 || self.out_channels == 0 {
            return Err(ConstructionError::new(
                layer,
                format!(
                    "channels must be positive, got {in_channels} in and {} out",
                    self.out_channels
                ),
            ));
        }

        let (Some(width), Some(height)) = (
            out_dim(self.in_size.width, window_width, stride_width),
            out_dim(self.in_size.height, window_height, stride_height),
        ) else {
            return Err(ConstructionError::new(
                layer,
                format!(
                    "window {window_width}x{window_height} with stride \
                     {stride_width}x{stride_height} does not fit input {}x{}",
                    self.in_size.width, self.in_size.height
                ),
            ));
        };

        let table = if self.table.is_empty() {
            ConnectionTable::full(in_channels, self.out_channels)
        } else if self.table.rows() != in_channels || self.table.cols() != self.out_channels {
            return Err(ConstructionError::new(
                layer,
                format!(
                    "connection table is {}x{}, expected {in_channels}x{}",
                    self.table.rows(),
                    self.table.cols(),
                    self.out_channels
                ),
            ));
        } else {
            self.table.clone()
        };

        let config = Self {
            table,
            ..self.clone()
        };
        let out_size = Shape3d::new(width, height, self.out_channels);
        let weight = zeros(
            layer,
            vec![self.out_channels, in_channels, window_height, window_width],
        )?;
        let bias = self
            .has_bias
            .then(|| zeros(layer, vec![self.out_channels]))
            .transpose()?;

        Ok((config, out_size, weight, bias))
    }
}

macro_rules! windowed_layer {
    ($layer:ident) => {
        impl $layer {
            /// The configuration the layer was built from, with its connection table expanded.
            pub fn config(&self) -> &ConvolutionConfig {
                &self.config
            }

            /// The output volume.
            pub fn out_size(&self) -> Shape3d {
                self.out_size
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
    };
}

windowed_layer!(Convolution);
windowed_layer!(Deconvolution);
