use serde::{Deserialize, Serialize};

/// Three dimensional extent of a layer's input or output volume.
///
/// A zero dimension is allowed and marks a placeholder shape, e.g. for an intermediate layer
/// whose input is only known once the graph is wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Shape3d<T = usize> {
    /// Width of the volume.
    pub width: T,
    /// Height of the volume.
    pub height: T,
    /// Depth (channels) of the volume.
    pub depth: T,
}

impl Shape3d {
    /// Create a new shape.
    pub const fn new(width: usize, height: usize, depth: usize) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    /// Number of cells in one channel.
    pub fn area(&self) -> usize {
        self.width * self.height
    }

    /// Total number of cells.
    pub fn size(&self) -> usize {
        self.area() * self.depth
    }
}

impl<T> From<[T; 3]> for Shape3d<T> {
    fn from([width, height, depth]: [T; 3]) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }
}

/// Padding applied by windowed layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Padding {
    /// No padding, the window never leaves the input.
    #[default]
    Valid,
    /// Pad so the output keeps the input extent (before striding).
    Same,
}

/// Whether a layer runs for training or for inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetPhase {
    /// Training.
    #[default]
    Train,
    /// Inference.
    Test,
}

/// Axis along which a [slice](super::Slice) layer splits its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SliceType {
    /// Split the batch into groups of samples.
    #[default]
    SliceSamples,
    /// Split the channels.
    SliceChannels,
}

/// Neighbourhood used by [local response normalization](super::Lrn).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormRegion {
    /// Normalize over adjacent channels.
    #[default]
    AcrossChannels,
    /// Normalize over a spatial window inside each channel.
    WithinChannels,
}

/// Output length of a window sliding over `in_length` cells.
///
/// Returns `None` when the window does not fit or the stride is zero.
pub(crate) fn conv_out_length(
    in_length: usize,
    window: usize,
    stride: usize,
    padding: Padding,
) -> Option<usize> {
    if stride == 0 || window == 0 {
        return None;
    }

    let length = match padding {
        Padding::Same => in_length,
        Padding::Valid => in_length.checked_sub(window)? + 1,
    };

    Some(length.div_ceil(stride))
}

/// Output length of a transposed window over `in_length` cells.
pub(crate) fn deconv_out_length(
    in_length: usize,
    window: usize,
    stride: usize,
    padding: Padding,
) -> Option<usize> {
    if stride == 0 || window == 0 {
        return None;
    }

    match padding {
        Padding::Same => in_length.checked_mul(stride),
        Padding::Valid => in_length
            .saturating_sub(1)
            .checked_mul(stride)?
            .checked_add(window),
    }
}
