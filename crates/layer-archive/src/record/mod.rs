//! A graph is archived as a sequence of [node records](NodeRecord), each holding the node's
//! parameters, its kind tag and its kind-specific [fields](Fields). The [schema] of each kind
//! decides the field order in both directions, and the [two-phase constructor](construct)
//! rebuilds layers from archived fields.
//!
//! The on-disk format is left to the [recorders](Recorder).

mod error;
mod file;
mod float;
mod graph;
mod memory;
mod recorder;
mod value;
mod weights;

pub mod connection;
pub mod construct;
pub mod narrow;
pub mod schema;

pub use connection::{Connection, ConnectionTableRecord};
pub use error::*;
pub use file::*;
pub use graph::*;
pub use memory::*;
pub use narrow::{SerialShape, SerialSize};
pub use recorder::*;
pub use value::*;
pub use weights::*;
