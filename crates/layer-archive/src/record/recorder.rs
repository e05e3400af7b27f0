use serde::{de::DeserializeOwned, Serialize};

use super::graph::{load_graph, save_graph, GraphRecord};
use super::ArchiveError;
use crate::nn::Node;

/// Record a graph of nodes with any format implementing [serde].
pub trait Recorder: Send + Sync + core::default::Default + core::fmt::Debug + Clone {
    /// Arguments used to record a graph.
    type RecordArgs: Clone;

    /// Record output type.
    type RecordOutput;

    /// Arguments used to load a recorded graph.
    type LoadArgs: Clone;

    /// Records a graph.
    ///
    /// # Arguments
    ///
    /// * `nodes` - The nodes to record, in graph order.
    /// * `args` - Arguments used to record the graph.
    ///
    /// # Returns
    ///
    /// The output of the recording. Nothing is written when a node cannot be archived.
    fn record(
        &self,
        nodes: &[Node],
        args: Self::RecordArgs,
    ) -> Result<Self::RecordOutput, ArchiveError> {
        let item = save_graph(nodes)?;

        self.save_item(item, args)
    }

    /// Load a graph from the given arguments.
    ///
    /// Either every node is rebuilt or an error is returned.
    fn load(&self, args: Self::LoadArgs) -> Result<Vec<Node>, ArchiveError> {
        let item: GraphRecord = self.load_item(args)?;

        load_graph(item)
    }

    /// Saves an item.
    ///
    /// This method is used by [record](Recorder::record) to save the item.
    ///
    /// # Arguments
    ///
    /// * `item` - Item to save.
    /// * `args` - Arguments to use to save the item.
    ///
    /// # Returns
    ///
    /// The output of the save operation.
    fn save_item<I: Serialize>(
        &self,
        item: I,
        args: Self::RecordArgs,
    ) -> Result<Self::RecordOutput, ArchiveError>;

    /// Loads an item.
    ///
    /// This method is used by [load](Recorder::load) to load the item.
    ///
    /// # Arguments
    ///
    /// * `args` - Arguments to use to load the item.
    ///
    /// # Returns
    ///
    /// The loaded item.
    fn load_item<I: DeserializeOwned>(&self, args: Self::LoadArgs) -> Result<I, ArchiveError>;
}

/// Sizes are written at their full 32-bit width, never varint encoded.
pub(crate) fn bin_config() -> bincode::config::Configuration<
    bincode::config::LittleEndian,
    bincode::config::Fixint,
> {
    bincode::config::standard().with_fixed_int_encoding()
}

pub(crate) fn encode_error(err: impl core::fmt::Display) -> ArchiveError {
    ArchiveError::Io(err.to_string())
}

pub(crate) fn decode_error(err: impl core::fmt::Display) -> ArchiveError {
    ArchiveError::Schema(format!("malformed archive: {err}"))
}
