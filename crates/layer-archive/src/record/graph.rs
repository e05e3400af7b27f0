use serde::{Deserialize, Serialize};

use super::construct::gather;
use super::schema::save_fields;
use super::value::Fields;
use super::weights::{load_weights, save_weights};
use super::ArchiveError;
use crate::nn::{LayerKind, Node};

/// The archived form of one node.
///
/// Field order is the archive order: parameters, kind tag, then the kind's fields.
#[derive(new, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Learned parameters in role order.
    #[serde(with = "super::float::nested")]
    pub weights: Vec<Vec<f32>>,
    /// The kind tag.
    pub kind: String,
    /// Kind-specific fields in schema order.
    pub fields: Fields,
}

/// The archived form of a graph: its nodes, in graph order.
#[derive(new, Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphRecord {
    /// Node records; position is the only node identity.
    pub nodes: Vec<NodeRecord>,
}

/// Archive one node.
pub fn save_node(node: &Node) -> Result<NodeRecord, ArchiveError> {
    let kind = node.kind();

    Ok(NodeRecord::new(
        save_weights(node),
        kind.as_str().to_string(),
        save_fields(node.layer())?,
    ))
}

/// Rebuild one node from its record.
///
/// The kind tag selects the schema and constructor; the node comes back initialized.
pub fn load_node(record: NodeRecord) -> Result<Node, ArchiveError> {
    let kind = LayerKind::from_tag(&record.kind)
        .ok_or_else(|| ArchiveError::UnknownKind(record.kind.clone()))?;

    let layer = gather(kind, record.fields)?.construct()?.finalize()?;
    let mut node = Node::new(layer);
    load_weights(&mut node, record.weights)?;

    Ok(node)
}

/// Archive every node of a graph, in order.
///
/// Nothing is returned unless every node could be archived.
pub fn save_graph(nodes: &[Node]) -> Result<GraphRecord, ArchiveError> {
    let nodes = nodes
        .iter()
        .enumerate()
        .map(|(position, node)| {
            log::debug!("Saving node {position} ({})", node.kind());
            save_node(node)
        })
        .collect::<Result<_, _>>()?;

    Ok(GraphRecord::new(nodes))
}

/// Rebuild every node of an archived graph, in archive order.
///
/// Nothing is returned unless every node could be rebuilt.
pub fn load_graph(record: GraphRecord) -> Result<Vec<Node>, ArchiveError> {
    record
        .nodes
        .into_iter()
        .enumerate()
        .map(|(position, record)| {
            log::debug!("Loading node {position} ({})", record.kind);
            load_node(record)
        })
        .collect()
}
