use super::Node;
use crate::record::{ArchiveError, Recorder};

/// An ordered sequence of nodes.
///
/// Only node-local state is persisted; a node is identified by its position.
#[derive(new, Debug, Clone, PartialEq, Default)]
pub struct Network {
    nodes: Vec<Node>,
}

impl Network {
    /// The nodes, in graph order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Append a node at the end of the graph.
    pub fn push(&mut self, node: impl Into<Node>) {
        self.nodes.push(node.into());
    }

    /// Unwrap the nodes.
    pub fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }

    /// Number of learned scalars over every node.
    pub fn num_params(&self) -> usize {
        self.nodes.iter().map(Node::num_params).sum()
    }

    /// Save the network with the given recorder.
    pub fn save_with<R: Recorder>(
        &self,
        recorder: &R,
        args: R::RecordArgs,
    ) -> Result<R::RecordOutput, ArchiveError> {
        recorder.record(&self.nodes, args)
    }

    /// Load a network with the given recorder.
    ///
    /// Either every node is rebuilt or nothing is returned.
    pub fn load_with<R: Recorder>(recorder: &R, args: R::LoadArgs) -> Result<Self, ArchiveError> {
        recorder.load(args).map(Self::new)
    }
}

impl FromIterator<Node> for Network {
    fn from_iter<T: IntoIterator<Item = Node>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
