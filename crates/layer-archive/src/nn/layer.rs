use core::fmt;

use super::{
    Activation, AverageUnpooling, AveragePooling, BatchNormalization, Concat, Convolution,
    Deconvolution, Dropout, ElementwiseAdd, FullyConnected, GlobalAveragePooling, Input,
    LeakyRelu, Linear, Lrn, MaxPooling, MaxUnpooling, Power, Slice, Softplus,
};
use crate::tensor::Tensor;

macro_rules! layer_kinds {
    ($($kind:ident => $tag:literal,)*) => {
        /// Tag identifying the kind of a layer node.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum LayerKind {
            $(
                #[doc = concat!("`", $tag, "`")]
                $kind,
            )*
        }

        impl LayerKind {
            /// Every kind, in declaration order.
            pub const ALL: &'static [LayerKind] = &[$(LayerKind::$kind,)*];

            /// The tag written to archives.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(LayerKind::$kind => $tag,)*
                }
            }

            /// Look a kind up by its archive tag.
            pub fn from_tag(tag: &str) -> Option<Self> {
                match tag {
                    $($tag => Some(LayerKind::$kind),)*
                    _ => None,
                }
            }
        }
    };
}

layer_kinds! {
    FullyConnected => "fully_connected",
    Convolutional => "convolutional",
    Deconvolutional => "deconvolutional",
    MaxPooling => "max_pooling",
    AveragePooling => "average_pooling",
    MaxUnpooling => "max_unpooling",
    AverageUnpooling => "average_unpooling",
    GlobalAveragePooling => "global_average_pooling",
    BatchNormalization => "batch_normalization",
    ElementwiseAdd => "elementwise_add",
    Concat => "concat",
    Slice => "slice",
    Dropout => "dropout",
    Input => "input",
    Linear => "linear",
    Lrn => "lrn",
    Power => "power",
    QuantizedConvolutional => "quantized_convolutional",
    QuantizedDeconvolutional => "quantized_deconvolutional",
    QuantizedFullyConnected => "quantized_fully_connected",
    Sigmoid => "sigmoid",
    Tanh => "tanh",
    Relu => "relu",
    Softmax => "softmax",
    LeakyRelu => "leaky_relu",
    Elu => "elu",
    TanhP1m2 => "tanh_p1m2",
    Softplus => "softplus",
    Softsign => "softsign",
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A layer of any kind.
///
/// Kinds that share an implementation (the quantized variants, the plain activations) wrap the
/// same type; the variant carries the kind.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum Layer {
    FullyConnected(FullyConnected),
    Convolutional(Convolution),
    Deconvolutional(Deconvolution),
    MaxPooling(MaxPooling),
    AveragePooling(AveragePooling),
    MaxUnpooling(MaxUnpooling),
    AverageUnpooling(AverageUnpooling),
    GlobalAveragePooling(GlobalAveragePooling),
    BatchNormalization(BatchNormalization),
    ElementwiseAdd(ElementwiseAdd),
    Concat(Concat),
    Slice(Slice),
    Dropout(Dropout),
    Input(Input),
    Linear(Linear),
    Lrn(Lrn),
    Power(Power),
    QuantizedConvolutional(Convolution),
    QuantizedDeconvolutional(Deconvolution),
    QuantizedFullyConnected(FullyConnected),
    Sigmoid(Activation),
    Tanh(Activation),
    Relu(Activation),
    Softmax(Activation),
    LeakyRelu(LeakyRelu),
    Elu(Activation),
    TanhP1m2(Activation),
    Softplus(Softplus),
    Softsign(Activation),
}

impl Layer {
    /// The kind of the layer.
    pub fn kind(&self) -> LayerKind {
        match self {
            Layer::FullyConnected(_) => LayerKind::FullyConnected,
            Layer::Convolutional(_) => LayerKind::Convolutional,
            Layer::Deconvolutional(_) => LayerKind::Deconvolutional,
            Layer::MaxPooling(_) => LayerKind::MaxPooling,
            Layer::AveragePooling(_) => LayerKind::AveragePooling,
            Layer::MaxUnpooling(_) => LayerKind::MaxUnpooling,
            Layer::AverageUnpooling(_) => LayerKind::AverageUnpooling,
            Layer::GlobalAveragePooling(_) => LayerKind::GlobalAveragePooling,
            Layer::BatchNormalization(_) => LayerKind::BatchNormalization,
            Layer::ElementwiseAdd(_) => LayerKind::ElementwiseAdd,
            Layer::Concat(_) => LayerKind::Concat,
            Layer::Slice(_) => LayerKind::Slice,
            Layer::Dropout(_) => LayerKind::Dropout,
            Layer::Input(_) => LayerKind::Input,
            Layer::Linear(_) => LayerKind::Linear,
            Layer::Lrn(_) => LayerKind::Lrn,
            Layer::Power(_) => LayerKind::Power,
            Layer::QuantizedConvolutional(_) => LayerKind::QuantizedConvolutional,
            Layer::QuantizedDeconvolutional(_) => LayerKind::QuantizedDeconvolutional,
            Layer::QuantizedFullyConnected(_) => LayerKind::QuantizedFullyConnected,
            Layer::Sigmoid(_) => LayerKind::Sigmoid,
            Layer::Tanh(_) => LayerKind::Tanh,
            Layer::Relu(_) => LayerKind::Relu,
            Layer::Softmax(_) => LayerKind::Softmax,
            Layer::LeakyRelu(_) => LayerKind::LeakyRelu,
            Layer::Elu(_) => LayerKind::Elu,
            Layer::TanhP1m2(_) => LayerKind::TanhP1m2,
            Layer::Softplus(_) => LayerKind::Softplus,
            Layer::Softsign(_) => LayerKind::Softsign,
        }
    }

    /// Learned parameters in role order (weight, then bias).
    pub fn params(&self) -> Vec<&Tensor> {
        match self {
            Layer::FullyConnected(layer) | Layer::QuantizedFullyConnected(layer) => layer.params(),
            Layer::Convolutional(layer) | Layer::QuantizedConvolutional(layer) => layer.params(),
            Layer::Deconvolutional(layer) | Layer::QuantizedDeconvolutional(layer) => {
                layer.params()
            }
            Layer::AveragePooling(layer) => layer.params(),
            Layer::AverageUnpooling(layer) => layer.params(),
            Layer::MaxPooling(_)
            | Layer::MaxUnpooling(_)
            | Layer::GlobalAveragePooling(_)
            | Layer::BatchNormalization(_)
            | Layer::ElementwiseAdd(_)
            | Layer::Concat(_)
            | Layer::Slice(_)
            | Layer::Dropout(_)
            | Layer::Input(_)
            | Layer::Linear(_)
            | Layer::Lrn(_)
            | Layer::Power(_)
            | Layer::Sigmoid(_)
            | Layer::Tanh(_)
            | Layer::Relu(_)
            | Layer::Softmax(_)
            | Layer::LeakyRelu(_)
            | Layer::Elu(_)
            | Layer::TanhP1m2(_)
            | Layer::Softplus(_)
            | Layer::Softsign(_) => Vec::new(),
        }
    }

    /// Mutable learned parameters, in the same order as [params](Layer::params).
    pub fn params_mut(&mut self) -> Vec<&mut Tensor> {
        match self {
            Layer::FullyConnected(layer) | Layer::QuantizedFullyConnected(layer) => {
                layer.params_mut()
            }
            Layer::Convolutional(layer) | Layer::QuantizedConvolutional(layer) => {
                layer.params_mut()
            }
            Layer::Deconvolutional(layer) | Layer::QuantizedDeconvolutional(layer) => {
                layer.params_mut()
            }
            Layer::AveragePooling(layer) => layer.params_mut(),
            Layer::AverageUnpooling(layer) => layer.params_mut(),
            Layer::MaxPooling(_)
            | Layer::MaxUnpooling(_)
            | Layer::GlobalAveragePooling(_)
            | Layer::BatchNormalization(_)
            | Layer::ElementwiseAdd(_)
            | Layer::Concat(_)
            | Layer::Slice(_)
            | Layer::Dropout(_)
            | Layer::Input(_)
            | Layer::Linear(_)
            | Layer::Lrn(_)
            | Layer::Power(_)
            | Layer::Sigmoid(_)
            | Layer::Tanh(_)
            | Layer::Relu(_)
            | Layer::Softmax(_)
            | Layer::LeakyRelu(_)
            | Layer::Elu(_)
            | Layer::TanhP1m2(_)
            | Layer::Softplus(_)
            | Layer::Softsign(_) => Vec::new(),
        }
    }
}

/// One node of a graph: a layer plus whether its construction has completed.
///
/// A node becomes initialized once its parameters have been loaded, even when the layer has
/// no parameters at all.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    layer: Layer,
    initialized: bool,
}

impl Node {
    /// Wrap a freshly constructed layer. The node is not initialized yet.
    pub fn new(layer: Layer) -> Self {
        Self {
            layer,
            initialized: false,
        }
    }

    /// The kind of the wrapped layer.
    pub fn kind(&self) -> LayerKind {
        self.layer.kind()
    }

    /// The wrapped layer.
    pub fn layer(&self) -> &Layer {
        &self.layer
    }

    /// The wrapped layer, mutably.
    pub fn layer_mut(&mut self) -> &mut Layer {
        &mut self.layer
    }

    /// Unwrap the layer.
    pub fn into_layer(self) -> Layer {
        self.layer
    }

    /// Whether construction of the node has completed.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub(crate) fn mark_initialized(&mut self) {
        self.initialized = true;
    }

    /// Number of learned scalars.
    pub fn num_params(&self) -> usize {
        self.layer
            .params()
            .iter()
            .map(|param| param.num_elements())
            .sum()
    }
}

impl From<Layer> for Node {
    fn from(layer: Layer) -> Self {
        Node::new(layer)
    }
}
