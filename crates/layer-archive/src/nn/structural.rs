use serde::{Deserialize, Serialize};

use super::{ConstructionError, NetPhase, Shape3d, SliceType};
use crate::config::Config;

/// Configuration to create an [input](Input) layer.
#[derive(new, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    /// Shape of the data fed to the graph.
    pub shape: Shape3d,
}

impl Config for InputConfig {}

/// Entry point of a graph; forwards its input unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct Input {
    config: InputConfig,
}

impl InputConfig {
    /// Initialize a new [input](Input) layer.
    pub fn init(&self) -> Input {
        Input {
            config: self.clone(),
        }
    }
}

impl Input {
    /// The configuration the layer was built from.
    pub fn config(&self) -> &InputConfig {
        &self.config
    }
}

/// Configuration to create a [concat](Concat) layer.
#[derive(new, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcatConfig {
    /// Shapes of the inputs, in input order.
    pub in_shapes: Vec<Shape3d>,
}

impl Config for ConcatConfig {}

/// Stacks its inputs along the channel axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Concat {
    config: ConcatConfig,
    out_shape: Shape3d,
}

impl ConcatConfig {
    /// Initialize a new [concat](Concat) layer.
    pub fn init(&self) -> Result<Concat, ConstructionError> {
        let Some((first, rest)) = self.in_shapes.split_first() else {
            return Err(ConstructionError::new("concat", "at least one input is required"));
        };

        let mut out_shape = *first;
        for shape in rest {
            if shape.area() != first.area() {
                return Err(ConstructionError::new(
                    "concat",
                    format!(
                        "input {}x{} does not match the spatial size {}x{} of the first input",
                        shape.width, shape.height, first.width, first.height
                    ),
                ));
            }
            out_shape.depth += shape.depth;
        }

        Ok(Concat {
            config: self.clone(),
            out_shape,
        })
    }
}

impl Concat {
    /// The configuration the layer was built from.
    pub fn config(&self) -> &ConcatConfig {
        &self.config
    }

    /// The output volume.
    pub fn out_shape(&self) -> Shape3d {
        self.out_shape
    }
}

/// Configuration to create a [slice](Slice) layer.
#[derive(new, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliceConfig {
    /// The input volume.
    pub in_size: Shape3d,
    /// The axis to split along.
    pub slice_type: SliceType,
    /// Number of outputs.
    pub num_outputs: usize,
}

impl Config for SliceConfig {}

/// Splits its input into `num_outputs` parts.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    config: SliceConfig,
    out_shapes: Vec<Shape3d>,
}

impl SliceConfig {
    /// Initialize a new [slice](Slice) layer.
    pub fn init(&self) -> Result<Slice, ConstructionError> {
        if self.num_outputs == 0 {
            return Err(ConstructionError::new("slice", "at least one output is required"));
        }

        let out_shapes = match self.slice_type {
            SliceType::SliceSamples => vec![self.in_size; self.num_outputs],
            SliceType::SliceChannels => {
                let depth = self.in_size.depth;
                if self.num_outputs > depth {
                    return Err(ConstructionError::new(
                        "slice",
                        format!("cannot split {depth} channels into {} outputs", self.num_outputs),
                    ));
                }

                // The last output takes the remainder.
                let step = depth / self.num_outputs;
                (0..self.num_outputs)
                    .map(|i| {
                        let channels = if i + 1 == self.num_outputs {
                            depth - step * i
                        } else {
                            step
                        };
                        Shape3d::new(self.in_size.width, self.in_size.height, channels)
                    })
                    .collect()
            }
        };

        Ok(Slice {
            config: self.clone(),
            out_shapes,
        })
    }
}

impl Slice {
    /// The configuration the layer was built from.
    pub fn config(&self) -> &SliceConfig {
        &self.config
    }

    /// Shapes of the outputs.
    pub fn out_shapes(&self) -> &[Shape3d] {
        &self.out_shapes
    }
}

/// Configuration to create an [elementwise add](ElementwiseAdd) layer.
#[derive(new, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementwiseAddConfig {
    /// Number of inputs summed together.
    pub num_args: usize,
    /// Number of values in each input.
    pub dim: usize,
}

impl Config for ElementwiseAddConfig {}

/// Sums its inputs value by value.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementwiseAdd {
    config: ElementwiseAddConfig,
}

impl ElementwiseAddConfig {
    /// Initialize a new [elementwise add](ElementwiseAdd) layer.
    pub fn init(&self) -> Result<ElementwiseAdd, ConstructionError> {
        if self.num_args == 0 {
            return Err(ConstructionError::new(
                "elementwise add",
                "at least one input is required",
            ));
        }

        Ok(ElementwiseAdd {
            config: self.clone(),
        })
    }
}

impl ElementwiseAdd {
    /// The configuration the layer was built from.
    pub fn config(&self) -> &ElementwiseAddConfig {
        &self.config
    }
}

/// Configuration to create a [dropout](Dropout) layer.
#[derive(new, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropoutConfig {
    /// Number of values in the input.
    pub in_size: usize,
    /// The probability of dropping a value.
    pub rate: f32,
    /// The phase the layer starts in.
    #[new(default)]
    pub phase: NetPhase,
}

impl Config for DropoutConfig {}

/// Zeroes random values while training.
#[derive(Debug, Clone, PartialEq)]
pub struct Dropout {
    config: DropoutConfig,
}

impl DropoutConfig {
    /// Set the phase.
    pub fn with_phase(mut self, phase: NetPhase) -> Self {
        self.phase = phase;
        self
    }

    /// Initialize a new [dropout](Dropout) layer.
    pub fn init(&self) -> Result<Dropout, ConstructionError> {
        if !(0.0..1.0).contains(&self.rate) {
            return Err(ConstructionError::new(
                "dropout",
                format!("rate {} is outside [0, 1)", self.rate),
            ));
        }

        Ok(Dropout {
            config: self.clone(),
        })
    }
}

impl Dropout {
    /// The configuration the layer was built from.
    pub fn config(&self) -> &DropoutConfig {
        &self.config
    }
}

/// Configuration to create a [power](Power) layer.
#[derive(new, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerConfig {
    /// The input volume.
    pub in_size: Shape3d,
    /// The exponent.
    pub factor: f32,
    /// Scale applied before the power. Default: 1.0
    #[new(value = "1.0")]
    pub scale: f32,
}

impl Config for PowerConfig {}

/// `(scale * x) ^ factor`.
#[derive(Debug, Clone, PartialEq)]
pub struct Power {
    config: PowerConfig,
}

impl PowerConfig {
    /// Set the scale.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Initialize a new [power](Power) layer.
    pub fn init(&self) -> Power {
        Power {
            config: self.clone(),
        }
    }
}

impl Power {
    /// The configuration the layer was built from.
    pub fn config(&self) -> &PowerConfig {
        &self.config
    }
}
