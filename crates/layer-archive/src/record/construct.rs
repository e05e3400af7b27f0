//! Two-phase construction of a layer from its archived fields.
//!
//! The fields of a record are first gathered into a scratch record, checked against the
//! kind's schema, then handed to the kind's constructor. State the constructor does not take
//! is applied last:
//!
//! ```text
//! Fields --gather--> FieldsGathered --construct--> Constructed --finalize--> Layer
//! ```

use super::schema::{schema, PostConstruct, Schema};
use super::value::{FieldValue, Fields};
use super::ArchiveError;
use crate::nn::{
    Activation, ActivationConfig, BatchNormalizationConfig, ConcatConfig, ConnectionTable,
    ConvolutionConfig, DropoutConfig, ElementwiseAddConfig, FullyConnected, FullyConnectedConfig,
    GlobalAveragePoolingConfig, InputConfig, Layer, LayerKind, LeakyReluConfig, LinearConfig,
    LrnConfig, NetPhase, NormRegion, Padding, PoolingConfig, PowerConfig, Shape3d, SliceConfig,
    SliceType, SoftplusConfig, UnpoolingConfig,
};

/// Gather the archived fields of a kind, in schema order.
///
/// Fails with [ArchiveError::Schema] when the record ends early, carries extra fields, or a
/// field has the wrong name or type.
pub fn gather(kind: LayerKind, fields: Fields) -> Result<FieldsGathered, ArchiveError> {
    let schema = schema(kind);
    let mut archived = fields.0.into_iter();
    let mut args = Vec::with_capacity(schema.fields.len());
    let mut state = Vec::with_capacity(schema.post_construct.len());

    for (position, spec) in schema.fields.iter().enumerate() {
        let field = archived.next().ok_or_else(|| {
            ArchiveError::schema(format!(
                "`{kind}` record ends before field {position} `{}`",
                spec.name
            ))
        })?;

        if let Some(name) = &field.name {
            if name != spec.name {
                return Err(ArchiveError::schema(format!(
                    "`{kind}` field {position} is `{name}`, expected `{}`",
                    spec.name
                )));
            }
        }

        if field.value.field_type() != spec.ty {
            return Err(ArchiveError::schema(format!(
                "`{kind}` field `{}` is a {:?}, expected {:?}",
                spec.name,
                field.value.field_type(),
                spec.ty
            )));
        }

        let value = field.value.into_native()?;
        log::trace!("Gathered `{kind}` field `{}`: {value:?}", spec.name);

        match schema
            .post_construct
            .iter()
            .find(|step| step.field == spec.name)
        {
            Some(step) => state.push((*step, value)),
            None => args.push((spec.name, value)),
        }
    }

    let trailing = archived.count();
    if trailing > 0 {
        return Err(ArchiveError::schema(format!(
            "`{kind}` record has {trailing} field(s) past the end of its schema"
        )));
    }

    Ok(FieldsGathered {
        schema,
        args: ConstructorArgs { kind, values: args },
        state,
    })
}

/// The scratch record of a kind whose fields have all been read.
#[derive(Debug)]
pub struct FieldsGathered {
    schema: Schema,
    args: ConstructorArgs,
    state: Vec<(PostConstruct, FieldValue)>,
}

/// A layer built by its constructor, with its post-construction state still pending.
#[derive(Debug)]
pub struct Constructed {
    layer: Layer,
    state: Vec<(PostConstruct, FieldValue)>,
}

impl FieldsGathered {
    /// The kind being built.
    pub fn kind(&self) -> LayerKind {
        self.schema.kind
    }

    /// The arguments passed to the constructor.
    pub fn args(&self) -> &ConstructorArgs {
        &self.args
    }

    /// Run the kind's constructor.
    ///
    /// Derived state, like output shapes, is computed by the constructor only.
    pub fn construct(self) -> Result<Constructed, ArchiveError> {
        let layer = construct(self.schema.kind, &self.args)?;

        Ok(Constructed {
            layer,
            state: self.state,
        })
    }
}

impl Constructed {
    /// The constructed layer.
    pub fn layer(&self) -> &Layer {
        &self.layer
    }

    /// Apply the remaining state, in schema order.
    pub fn finalize(self) -> Result<Layer, ArchiveError> {
        let mut layer = self.layer;

        for (step, value) in self.state {
            (step.apply)(&mut layer, value)?;
        }

        Ok(layer)
    }
}

/// The constructor arguments of a kind, looked up by field name.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorArgs {
    kind: LayerKind,
    values: Vec<(&'static str, FieldValue)>,
}

macro_rules! typed_arg {
    ($(#[$doc:meta])* $name:ident, $variant:ident, $ty:ty) => {
        $(#[$doc])*
        pub fn $name(&self, field: &str) -> Result<$ty, ArchiveError> {
            match self.get(field)? {
                FieldValue::$variant(value) => Ok(value.clone()),
                other => Err(self.mismatch(field, other)),
            }
        }
    };
}

impl ConstructorArgs {
    /// The value of a field.
    pub fn get(&self, field: &str) -> Result<&FieldValue, ArchiveError> {
        self.values
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, value)| value)
            .ok_or_else(|| {
                ArchiveError::schema(format!("`{}` has no field `{field}`", self.kind))
            })
    }

    typed_arg!(
        /// A size field.
        size, Size, usize
    );
    typed_arg!(
        /// A shape field.
        shape, Shape, Shape3d
    );
    typed_arg!(
        /// A float field.
        float, Float, f32
    );
    typed_arg!(
        /// A boolean field.
        boolean, Bool, bool
    );
    typed_arg!(
        /// A padding field.
        padding, Padding, Padding
    );
    typed_arg!(
        /// A phase field.
        phase, Phase, NetPhase
    );
    typed_arg!(
        /// A slice axis field.
        slice_type, SliceType, SliceType
    );
    typed_arg!(
        /// A normalization region field.
        norm_region, NormRegion, NormRegion
    );
    typed_arg!(
        /// A connection table field.
        table, ConnectionTable, ConnectionTable
    );
    typed_arg!(
        /// A shape sequence field.
        shapes, Shapes, Vec<Shape3d>
    );

    fn mismatch(&self, field: &str, value: &FieldValue) -> ArchiveError {
        ArchiveError::schema(format!(
            "`{}` field `{field}` is a {:?}",
            self.kind,
            value.field_type()
        ))
    }
}

fn construct(kind: LayerKind, args: &ConstructorArgs) -> Result<Layer, ArchiveError> {
    Ok(match kind {
        LayerKind::FullyConnected => Layer::FullyConnected(fully_connected(args)?),
        LayerKind::QuantizedFullyConnected => {
            Layer::QuantizedFullyConnected(fully_connected(args)?)
        }
        LayerKind::Convolutional => Layer::Convolutional(convolution(args)?.init()?),
        LayerKind::QuantizedConvolutional => {
            Layer::QuantizedConvolutional(convolution(args)?.init()?)
        }
        LayerKind::Deconvolutional => {
            Layer::Deconvolutional(convolution(args)?.init_deconvolution()?)
        }
        LayerKind::QuantizedDeconvolutional => {
            Layer::QuantizedDeconvolutional(convolution(args)?.init_deconvolution()?)
        }
        LayerKind::MaxPooling => Layer::MaxPooling(pooling(args)?.init_max()?),
        LayerKind::AveragePooling => Layer::AveragePooling(pooling(args)?.init_average()?),
        LayerKind::MaxUnpooling => {
            Layer::MaxUnpooling(unpooling(args, "unpool_size")?.init_max()?)
        }
        LayerKind::AverageUnpooling => {
            Layer::AverageUnpooling(unpooling(args, "pool_size")?.init_average()?)
        }
        LayerKind::GlobalAveragePooling => Layer::GlobalAveragePooling(
            GlobalAveragePoolingConfig::new(args.shape("in_shape")?).init(),
        ),
        LayerKind::BatchNormalization => Layer::BatchNormalization(
            BatchNormalizationConfig::new(args.size("in_spatial_size")?, args.size("in_channels")?)
                .with_epsilon(args.float("epsilon")?)
                .with_momentum(args.float("momentum")?)
                .with_phase(args.phase("phase")?)
                .init()?,
        ),
        LayerKind::ElementwiseAdd => Layer::ElementwiseAdd(
            ElementwiseAddConfig::new(args.size("num_args")?, args.size("dim")?).init()?,
        ),
        LayerKind::Concat => Layer::Concat(ConcatConfig::new(args.shapes("in_size")?).init()?),
        LayerKind::Slice => Layer::Slice(
            SliceConfig::new(
                args.shape("in_size")?,
                args.slice_type("slice_type")?,
                args.size("num_outputs")?,
            )
            .init()?,
        ),
        LayerKind::Dropout => Layer::Dropout(
            DropoutConfig::new(args.size("in_size")?, args.float("dropout_rate")?)
                .with_phase(args.phase("phase")?)
                .init()?,
        ),
        LayerKind::Input => Layer::Input(InputConfig::new(args.shape("shape")?).init()),
        LayerKind::Linear => Layer::Linear(
            LinearConfig::new(args.size("in_size")?)
                .with_scale(args.float("scale")?)
                .with_bias(args.float("bias")?)
                .init(),
        ),
        LayerKind::Lrn => Layer::Lrn(
            LrnConfig::new(args.shape("in_shape")?, args.size("size")?)
                .with_alpha(args.float("alpha")?)
                .with_beta(args.float("beta")?)
                .with_region(args.norm_region("region")?)
                .init()?,
        ),
        LayerKind::Power => Layer::Power(
            PowerConfig::new(args.shape("in_size")?, args.float("factor")?)
                .with_scale(args.float("scale")?)
                .init(),
        ),
        LayerKind::Sigmoid => Layer::Sigmoid(activation(args)?),
        LayerKind::Tanh => Layer::Tanh(activation(args)?),
        LayerKind::Relu => Layer::Relu(activation(args)?),
        LayerKind::Softmax => Layer::Softmax(activation(args)?),
        LayerKind::Elu => Layer::Elu(activation(args)?),
        LayerKind::TanhP1m2 => Layer::TanhP1m2(activation(args)?),
        LayerKind::Softsign => Layer::Softsign(activation(args)?),
        LayerKind::LeakyRelu => Layer::LeakyRelu(
            LeakyReluConfig::new(args.shape("in_size")?)
                .with_epsilon(args.float("epsilon")?)
                .init(),
        ),
        LayerKind::Softplus => Layer::Softplus(
            SoftplusConfig::new(args.shape("in_size")?)
                .with_beta(args.float("beta")?)
                .with_threshold(args.float("threshold")?)
                .init(),
        ),
    })
}

fn fully_connected(args: &ConstructorArgs) -> Result<FullyConnected, ArchiveError> {
    let config = FullyConnectedConfig::new(args.size("in_size")?, args.size("out_size")?)
        .with_bias(args.boolean("has_bias")?);

    Ok(config.init()?)
}

fn convolution(args: &ConstructorArgs) -> Result<ConvolutionConfig, ArchiveError> {
    let window = [args.size("window_width")?, args.size("window_height")?];

    Ok(
        ConvolutionConfig::new(args.shape("in_size")?, window, args.size("out_channels")?)
            .with_table(args.table("connection_table")?)
            .with_padding(args.padding("pad_type")?)
            .with_bias(args.boolean("has_bias")?)
            .with_stride([args.size("w_stride")?, args.size("h_stride")?]),
    )
}

fn pooling(args: &ConstructorArgs) -> Result<PoolingConfig, ArchiveError> {
    let pool_size = [args.size("pool_size_x")?, args.size("pool_size_y")?];
    let stride = [args.size("stride_x")?, args.size("stride_y")?];

    Ok(PoolingConfig::new(args.shape("in_size")?, pool_size, stride)
        .with_padding(args.padding("pad_type")?))
}

fn unpooling(args: &ConstructorArgs, size_field: &str) -> Result<UnpoolingConfig, ArchiveError> {
    Ok(UnpoolingConfig::new(
        args.shape("in_size")?,
        args.size(size_field)?,
        args.size("stride")?,
    ))
}

fn activation(args: &ConstructorArgs) -> Result<Activation, ArchiveError> {
    Ok(ActivationConfig::new(args.shape("in_size")?).init())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nn::ConstructionError;
    use crate::record::schema::save_fields;
    use crate::record::value::{ArchiveField, ArchiveValue};
    use crate::record::SerialShape;

    fn named(name: &str, value: ArchiveValue) -> ArchiveField {
        ArchiveField::new(Some(name.to_string()), value)
    }

    fn batch_norm_fields(mean: Vec<f32>) -> Fields {
        Fields(vec![
            named("in_spatial_size", ArchiveValue::Size(16)),
            named("in_channels", ArchiveValue::Size(2)),
            named("epsilon", ArchiveValue::Float(1e-3)),
            named("momentum", ArchiveValue::Float(0.9)),
            named("phase", ArchiveValue::Phase(NetPhase::Test)),
            named("mean", ArchiveValue::Floats(mean)),
            named("variance", ArchiveValue::Floats(vec![4.0, 5.0])),
        ])
    }

    #[test]
    fn states_run_in_order() {
        let gathered = gather(LayerKind::BatchNormalization, batch_norm_fields(vec![1.0, 2.0]))
            .unwrap();
        assert_eq!(gathered.kind(), LayerKind::BatchNormalization);
        assert!(gathered.args().get("mean").is_err());

        let constructed = gathered.construct().unwrap();
        let Layer::BatchNormalization(fresh) = constructed.layer() else {
            panic!("expected a batch normalization layer");
        };
        assert_eq!(fresh.mean(), [0.0, 0.0]);

        let Layer::BatchNormalization(layer) = constructed.finalize().unwrap() else {
            panic!("expected a batch normalization layer");
        };
        assert_eq!(layer.config().phase, NetPhase::Test);
        assert_eq!(layer.mean(), [1.0, 2.0]);
        assert_eq!(layer.variance(), [4.0, 5.0]);
    }

    #[test]
    fn statistics_of_the_wrong_length_fail_finalization() {
        let constructed = gather(LayerKind::BatchNormalization, batch_norm_fields(vec![1.0]))
            .unwrap()
            .construct()
            .unwrap();

        assert!(matches!(
            constructed.finalize(),
            Err(ArchiveError::Construction(ConstructionError { .. }))
        ));
    }

    #[test]
    fn wrong_name_is_a_schema_error() {
        let fields = Fields(vec![named("size", ArchiveValue::Shape(SerialShape::default()))]);

        assert!(matches!(
            gather(LayerKind::Relu, fields),
            Err(ArchiveError::Schema(_))
        ));
    }

    #[test]
    fn wrong_type_is_a_schema_error() {
        let fields = Fields(vec![named("in_size", ArchiveValue::Size(3))]);

        assert!(matches!(
            gather(LayerKind::Relu, fields),
            Err(ArchiveError::Schema(_))
        ));
    }

    #[test]
    fn unnamed_fields_are_matched_by_position() {
        let fields = Fields(vec![ArchiveField::new(
            None,
            ArchiveValue::Shape(Shape3d {
                width: 4,
                height: 4,
                depth: 1,
            }),
        )]);

        let layer = gather(LayerKind::Softsign, fields)
            .and_then(FieldsGathered::construct)
            .and_then(Constructed::finalize)
            .unwrap();

        assert_eq!(layer.kind(), LayerKind::Softsign);
    }

    #[test]
    fn trailing_fields_are_rejected() {
        let mut fields = Fields(vec![named("shape", ArchiveValue::Shape(SerialShape::default()))]);
        fields.0.push(named("extra", ArchiveValue::Bool(true)));

        assert!(matches!(
            gather(LayerKind::Input, fields),
            Err(ArchiveError::Schema(_))
        ));
    }

    #[test]
    fn constructor_errors_propagate() {
        let layer = Layer::FullyConnected(FullyConnectedConfig::new(3, 2).init().unwrap());
        let mut fields = save_fields(&layer).unwrap();
        fields.0[0].value = ArchiveValue::Size(0);

        let result = gather(LayerKind::FullyConnected, fields).and_then(FieldsGathered::construct);

        assert!(matches!(result, Err(ArchiveError::Construction(_))));
    }
}
