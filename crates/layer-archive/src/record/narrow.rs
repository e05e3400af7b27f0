//! Conversion between native sizes and the archive's fixed 32-bit size type.

use super::ArchiveError;
use crate::nn::Shape3d;

/// Integer type every size-like quantity is stored as.
pub type SerialSize = u32;

/// A [shape](Shape3d) as stored in an archive.
pub type SerialShape = Shape3d<SerialSize>;

/// Narrow a native size for the archive.
///
/// Fails with [ArchiveError::Range] instead of wrapping when the value does not fit.
pub fn to_serial(size: usize) -> Result<SerialSize, ArchiveError> {
    SerialSize::try_from(size).map_err(|_| ArchiveError::Range(size))
}

/// Widen an archived size. Never fails.
pub fn to_size(size: SerialSize) -> usize {
    size as usize
}

/// Narrow every dimension of a shape.
pub fn to_serial_shape(shape: &Shape3d) -> Result<SerialShape, ArchiveError> {
    Ok(Shape3d {
        width: to_serial(shape.width)?,
        height: to_serial(shape.height)?,
        depth: to_serial(shape.depth)?,
    })
}

/// Widen every dimension of an archived shape.
pub fn to_size_shape(shape: &SerialShape) -> Shape3d {
    Shape3d::new(
        to_size(shape.width),
        to_size(shape.height),
        to_size(shape.depth),
    )
}
