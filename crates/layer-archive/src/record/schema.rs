//! The field schema of every layer kind.
//!
//! Both directions read this table: saving pairs the values extracted from a live layer with
//! the names listed here, loading reads the archived fields back in the same order. A field
//! missing from one direction would shift every following field of a positional archive.

use super::value::{ArchiveField, FieldType, FieldValue, Fields};
use super::ArchiveError;
use crate::nn::{ConvolutionConfig, Layer, LayerKind, PoolingConfig, UnpoolingConfig};

/// A named, typed field of a kind's record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// The archive key.
    pub name: &'static str,
    /// The value type.
    pub ty: FieldType,
}

/// State applied to a layer after its constructor ran.
#[derive(Clone, Copy)]
pub struct PostConstruct {
    /// The field holding the state.
    pub field: &'static str,
    /// Applies the state to the constructed layer.
    pub apply: fn(&mut Layer, FieldValue) -> Result<(), ArchiveError>,
}

impl core::fmt::Debug for PostConstruct {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PostConstruct")
            .field("field", &self.field)
            .finish()
    }
}

/// The record layout of one kind.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    /// The kind described.
    pub kind: LayerKind,
    /// Every field, in archive order.
    pub fields: &'static [FieldSpec],
    /// Fields applied after construction rather than passed to the constructor.
    pub post_construct: &'static [PostConstruct],
}

impl Schema {
    /// Whether the field is applied after construction.
    pub fn is_post_construct(&self, name: &str) -> bool {
        self.post_construct.iter().any(|step| step.field == name)
    }
}

const NO_STATE: &[PostConstruct] = &[];

const fn field(name: &'static str, ty: FieldType) -> FieldSpec {
    FieldSpec { name, ty }
}

const FULLY_CONNECTED: &[FieldSpec] = &[
    field("in_size", FieldType::Size),
    field("out_size", FieldType::Size),
    field("has_bias", FieldType::Bool),
];

const CONVOLUTION: &[FieldSpec] = &[
    field("in_size", FieldType::Shape),
    field("window_width", FieldType::Size),
    field("window_height", FieldType::Size),
    field("out_channels", FieldType::Size),
    field("connection_table", FieldType::ConnectionTable),
    field("pad_type", FieldType::Padding),
    field("has_bias", FieldType::Bool),
    field("w_stride", FieldType::Size),
    field("h_stride", FieldType::Size),
];

const POOLING: &[FieldSpec] = &[
    field("in_size", FieldType::Shape),
    field("pool_size_x", FieldType::Size),
    field("pool_size_y", FieldType::Size),
    field("stride_x", FieldType::Size),
    field("stride_y", FieldType::Size),
    field("pad_type", FieldType::Padding),
];

const MAX_UNPOOLING: &[FieldSpec] = &[
    field("in_size", FieldType::Shape),
    field("unpool_size", FieldType::Size),
    field("stride", FieldType::Size),
];

const AVERAGE_UNPOOLING: &[FieldSpec] = &[
    field("in_size", FieldType::Shape),
    field("pool_size", FieldType::Size),
    field("stride", FieldType::Size),
];

const GLOBAL_AVERAGE_POOLING: &[FieldSpec] = &[field("in_shape", FieldType::Shape)];

const BATCH_NORMALIZATION: &[FieldSpec] = &[
    field("in_spatial_size", FieldType::Size),
    field("in_channels", FieldType::Size),
    field("epsilon", FieldType::Float),
    field("momentum", FieldType::Float),
    field("phase", FieldType::Phase),
    field("mean", FieldType::Floats),
    field("variance", FieldType::Floats),
];

const BATCH_NORMALIZATION_STATE: &[PostConstruct] = &[
    PostConstruct {
        field: "mean",
        apply: apply_mean,
    },
    PostConstruct {
        field: "variance",
        apply: apply_variance,
    },
];

const ELEMENTWISE_ADD: &[FieldSpec] = &[
    field("num_args", FieldType::Size),
    field("dim", FieldType::Size),
];

const CONCAT: &[FieldSpec] = &[field("in_size", FieldType::Shapes)];

const SLICE: &[FieldSpec] = &[
    field("in_size", FieldType::Shape),
    field("slice_type", FieldType::SliceType),
    field("num_outputs", FieldType::Size),
];

const DROPOUT: &[FieldSpec] = &[
    field("in_size", FieldType::Size),
    field("dropout_rate", FieldType::Float),
    field("phase", FieldType::Phase),
];

const INPUT: &[FieldSpec] = &[field("shape", FieldType::Shape)];

const LINEAR: &[FieldSpec] = &[
    field("in_size", FieldType::Size),
    field("scale", FieldType::Float),
    field("bias", FieldType::Float),
];

const LRN: &[FieldSpec] = &[
    field("in_shape", FieldType::Shape),
    field("size", FieldType::Size),
    field("alpha", FieldType::Float),
    field("beta", FieldType::Float),
    field("region", FieldType::NormRegion),
];

const POWER: &[FieldSpec] = &[
    field("in_size", FieldType::Shape),
    field("factor", FieldType::Float),
    field("scale", FieldType::Float),
];

const ACTIVATION: &[FieldSpec] = &[field("in_size", FieldType::Shape)];

const LEAKY_RELU: &[FieldSpec] = &[
    field("in_size", FieldType::Shape),
    field("epsilon", FieldType::Float),
];

const SOFTPLUS: &[FieldSpec] = &[
    field("in_size", FieldType::Shape),
    field("beta", FieldType::Float),
    field("threshold", FieldType::Float),
];

/// The schema of a kind.
pub fn schema(kind: LayerKind) -> Schema {
    let (fields, post_construct) = match kind {
        LayerKind::FullyConnected | LayerKind::QuantizedFullyConnected => {
            (FULLY_CONNECTED, NO_STATE)
        }
        LayerKind::Convolutional
        | LayerKind::Deconvolutional
        | LayerKind::QuantizedConvolutional
        | LayerKind::QuantizedDeconvolutional => (CONVOLUTION, NO_STATE),
        LayerKind::MaxPooling | LayerKind::AveragePooling => (POOLING, NO_STATE),
        LayerKind::MaxUnpooling => (MAX_UNPOOLING, NO_STATE),
        LayerKind::AverageUnpooling => (AVERAGE_UNPOOLING, NO_STATE),
        LayerKind::GlobalAveragePooling => (GLOBAL_AVERAGE_POOLING, NO_STATE),
        LayerKind::BatchNormalization => (BATCH_NORMALIZATION, BATCH_NORMALIZATION_STATE),
        LayerKind::ElementwiseAdd => (ELEMENTWISE_ADD, NO_STATE),
        LayerKind::Concat => (CONCAT, NO_STATE),
        LayerKind::Slice => (SLICE, NO_STATE),
        LayerKind::Dropout => (DROPOUT, NO_STATE),
        LayerKind::Input => (INPUT, NO_STATE),
        LayerKind::Linear => (LINEAR, NO_STATE),
        LayerKind::Lrn => (LRN, NO_STATE),
        LayerKind::Power => (POWER, NO_STATE),
        LayerKind::Sigmoid
        | LayerKind::Tanh
        | LayerKind::Relu
        | LayerKind::Softmax
        | LayerKind::Elu
        | LayerKind::TanhP1m2
        | LayerKind::Softsign => (ACTIVATION, NO_STATE),
        LayerKind::LeakyRelu => (LEAKY_RELU, NO_STATE),
        LayerKind::Softplus => (SOFTPLUS, NO_STATE),
    };

    Schema {
        kind,
        fields,
        post_construct,
    }
}

/// Every field of a kind, in archive order.
pub fn fields_for(kind: LayerKind) -> &'static [FieldSpec] {
    schema(kind).fields
}

/// The fields passed to the kind's constructor, in archive order.
pub fn constructor_args_for(kind: LayerKind) -> impl Iterator<Item = FieldSpec> {
    let schema = schema(kind);

    schema
        .fields
        .iter()
        .copied()
        .filter(move |spec| !schema.is_post_construct(spec.name))
}

/// The state applied after construction, in archive order.
pub fn post_construct_steps(kind: LayerKind) -> &'static [PostConstruct] {
    schema(kind).post_construct
}

/// Pair the values of a live layer with its schema, ready to be archived.
///
/// Fails with [ArchiveError::Range] when a size does not fit the archive.
pub fn save_fields(layer: &Layer) -> Result<Fields, ArchiveError> {
    let kind = layer.kind();
    let specs = fields_for(kind);
    let values = field_values(layer);

    if values.len() != specs.len() {
        return Err(ArchiveError::schema(format!(
            "`{kind}` produced {} fields, its schema lists {}",
            values.len(),
            specs.len()
        )));
    }

    specs
        .iter()
        .zip(values)
        .map(|(spec, value)| {
            if value.field_type() != spec.ty {
                return Err(ArchiveError::schema(format!(
                    "`{kind}` field `{}` is a {:?}, expected {:?}",
                    spec.name,
                    value.field_type(),
                    spec.ty
                )));
            }

            Ok(ArchiveField::new(
                Some(spec.name.to_string()),
                value.into_archive()?,
            ))
        })
        .collect::<Result<_, _>>()
        .map(Fields)
}

/// The schema values of a live layer, positionally.
fn field_values(layer: &Layer) -> Vec<FieldValue> {
    use FieldValue as V;

    match layer {
        Layer::FullyConnected(layer) | Layer::QuantizedFullyConnected(layer) => {
            let config = layer.config();
            vec![
                V::Size(config.in_size),
                V::Size(config.out_size),
                V::Bool(config.has_bias),
            ]
        }
        Layer::Convolutional(layer) | Layer::QuantizedConvolutional(layer) => {
            convolution_values(layer.config())
        }
        Layer::Deconvolutional(layer) | Layer::QuantizedDeconvolutional(layer) => {
            convolution_values(layer.config())
        }
        Layer::MaxPooling(layer) => pooling_values(layer.config()),
        Layer::AveragePooling(layer) => pooling_values(layer.config()),
        Layer::MaxUnpooling(layer) => unpooling_values(layer.config()),
        Layer::AverageUnpooling(layer) => unpooling_values(layer.config()),
        Layer::GlobalAveragePooling(layer) => vec![V::Shape(layer.config().in_shape)],
        Layer::BatchNormalization(layer) => {
            let config = layer.config();
            vec![
                V::Size(config.in_spatial_size),
                V::Size(config.in_channels),
                V::Float(config.epsilon),
                V::Float(config.momentum),
                V::Phase(config.phase),
                V::Floats(layer.mean().to_vec()),
                V::Floats(layer.variance().to_vec()),
            ]
        }
        Layer::ElementwiseAdd(layer) => {
            let config = layer.config();
            vec![V::Size(config.num_args), V::Size(config.dim)]
        }
        Layer::Concat(layer) => vec![V::Shapes(layer.config().in_shapes.clone())],
        Layer::Slice(layer) => {
            let config = layer.config();
            vec![
                V::Shape(config.in_size),
                V::SliceType(config.slice_type),
                V::Size(config.num_outputs),
            ]
        }
        Layer::Dropout(layer) => {
            let config = layer.config();
            vec![
                V::Size(config.in_size),
                V::Float(config.rate),
                V::Phase(config.phase),
            ]
        }
        Layer::Input(layer) => vec![V::Shape(layer.config().shape)],
        Layer::Linear(layer) => {
            let config = layer.config();
            vec![
                V::Size(config.in_size),
                V::Float(config.scale),
                V::Float(config.bias),
            ]
        }
        Layer::Lrn(layer) => {
            let config = layer.config();
            vec![
                V::Shape(config.in_shape),
                V::Size(config.size),
                V::Float(config.alpha),
                V::Float(config.beta),
                V::NormRegion(config.region),
            ]
        }
        Layer::Power(layer) => {
            let config = layer.config();
            vec![
                V::Shape(config.in_size),
                V::Float(config.factor),
                V::Float(config.scale),
            ]
        }
        Layer::Sigmoid(layer)
        | Layer::Tanh(layer)
        | Layer::Relu(layer)
        | Layer::Softmax(layer)
        | Layer::Elu(layer)
        | Layer::TanhP1m2(layer)
        | Layer::Softsign(layer) => vec![V::Shape(layer.config().in_size)],
        Layer::LeakyRelu(layer) => {
            let config = layer.config();
            vec![V::Shape(config.in_size), V::Float(config.epsilon)]
        }
        Layer::Softplus(layer) => {
            let config = layer.config();
            vec![
                V::Shape(config.in_size),
                V::Float(config.beta),
                V::Float(config.threshold),
            ]
        }
    }
}

fn convolution_values(config: &ConvolutionConfig) -> Vec<FieldValue> {
    let [window_width, window_height] = config.window;
    let [w_stride, h_stride] = config.stride;

    vec![
        FieldValue::Shape(config.in_size),
        FieldValue::Size(window_width),
        FieldValue::Size(window_height),
        FieldValue::Size(config.out_channels),
        FieldValue::ConnectionTable(config.table.clone()),
        FieldValue::Padding(config.padding),
        FieldValue::Bool(config.has_bias),
        FieldValue::Size(w_stride),
        FieldValue::Size(h_stride),
    ]
}

fn pooling_values(config: &PoolingConfig) -> Vec<FieldValue> {
    let [pool_size_x, pool_size_y] = config.pool_size;
    let [stride_x, stride_y] = config.stride;

    vec![
        FieldValue::Shape(config.in_size),
        FieldValue::Size(pool_size_x),
        FieldValue::Size(pool_size_y),
        FieldValue::Size(stride_x),
        FieldValue::Size(stride_y),
        FieldValue::Padding(config.padding),
    ]
}

fn unpooling_values(config: &UnpoolingConfig) -> Vec<FieldValue> {
    vec![
        FieldValue::Shape(config.in_size),
        FieldValue::Size(config.pool_size),
        FieldValue::Size(config.stride),
    ]
}

fn apply_mean(layer: &mut Layer, value: FieldValue) -> Result<(), ArchiveError> {
    match (layer, value) {
        (Layer::BatchNormalization(layer), FieldValue::Floats(mean)) => Ok(layer.set_mean(mean)?),
        (layer, value) => Err(mismatched_state(layer, "mean", &value)),
    }
}

fn apply_variance(layer: &mut Layer, value: FieldValue) -> Result<(), ArchiveError> {
    match (layer, value) {
        (Layer::BatchNormalization(layer), FieldValue::Floats(variance)) => {
            Ok(layer.set_variance(variance)?)
        }
        (layer, value) => Err(mismatched_state(layer, "variance", &value)),
    }
}

fn mismatched_state(layer: &Layer, field: &str, value: &FieldValue) -> ArchiveError {
    ArchiveError::schema(format!(
        "cannot apply {:?} field `{field}` to a `{}` layer",
        value.field_type(),
        layer.kind()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nn::{BatchNormalizationConfig, FullyConnectedConfig};

    #[test]
    fn every_kind_has_a_schema() {
        for kind in LayerKind::ALL {
            let schema = schema(*kind);

            assert_eq!(schema.kind, *kind);
            assert!(!schema.fields.is_empty(), "{kind} has no fields");
            for step in schema.post_construct {
                assert!(schema.fields.iter().any(|spec| spec.name == step.field));
            }
        }
    }

    #[test]
    fn field_names_are_unique_per_kind() {
        for kind in LayerKind::ALL {
            let fields = fields_for(*kind);

            for (i, spec) in fields.iter().enumerate() {
                assert!(
                    fields[i + 1..].iter().all(|other| other.name != spec.name),
                    "{kind} repeats `{}`",
                    spec.name
                );
            }
        }
    }

    #[test]
    fn batch_normalization_statistics_are_post_construct() {
        let args: Vec<_> = constructor_args_for(LayerKind::BatchNormalization)
            .map(|spec| spec.name)
            .collect();
        let steps: Vec<_> = post_construct_steps(LayerKind::BatchNormalization)
            .iter()
            .map(|step| step.field)
            .collect();

        assert_eq!(
            args,
            ["in_spatial_size", "in_channels", "epsilon", "momentum", "phase"]
        );
        assert_eq!(steps, ["mean", "variance"]);
        assert!(post_construct_steps(LayerKind::FullyConnected).is_empty());
    }

    #[test]
    fn saved_fields_follow_schema_order() {
        let layer = Layer::FullyConnected(FullyConnectedConfig::new(784, 10).init().unwrap());
        let fields = save_fields(&layer).unwrap();
        let names: Vec<_> = fields.0.iter().map(|f| f.name.as_deref().unwrap()).collect();

        assert_eq!(names, ["in_size", "out_size", "has_bias"]);
    }

    #[test]
    fn state_setters_reject_other_kinds() {
        let mut layer = Layer::FullyConnected(FullyConnectedConfig::new(1, 1).init().unwrap());

        let result = apply_mean(&mut layer, FieldValue::Floats(vec![0.0]));

        assert!(matches!(result, Err(ArchiveError::Schema(_))));
    }

    #[test]
    fn state_setters_check_length() {
        let mut layer =
            Layer::BatchNormalization(BatchNormalizationConfig::new(4, 2).init().unwrap());

        assert!(apply_variance(&mut layer, FieldValue::Floats(vec![2.0, 3.0])).is_ok());
        assert!(matches!(
            apply_variance(&mut layer, FieldValue::Floats(vec![2.0])),
            Err(ArchiveError::Construction(_))
        ));
    }
}
