#![warn(missing_docs)]

//! Persistence engine for graphs of typed layer nodes.
//!
//! A graph is saved node by node: the learned parameter tensors first, then the kind tag,
//! then the kind-specific fields in the order given by the [schema registry](record::schema).
//! Loading mirrors saving and rebuilds every node through its constructor.

#[macro_use]
extern crate derive_new;

/// The configuration module.
pub mod config;

/// Layer nodes and their configurations.
pub mod nn;

/// Saving and loading of layer graphs.
pub mod record;

/// The tensor container holding learned parameters.
pub mod tensor;
