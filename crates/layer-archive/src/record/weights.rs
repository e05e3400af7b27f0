use super::ArchiveError;
use crate::nn::Node;

/// The learned parameters of a node, in role order (weight, then bias).
///
/// Kinds without parameters yield an empty sequence.
pub fn save_weights(node: &Node) -> Vec<Vec<f32>> {
    node.layer()
        .params()
        .into_iter()
        .map(|param| param.as_slice().to_vec())
        .collect()
}

/// Write parameters back into a node in role order, then mark it initialized.
///
/// The node is marked initialized even when it has no parameters. On error the node is left
/// untouched.
pub fn load_weights(node: &mut Node, weights: Vec<Vec<f32>>) -> Result<(), ArchiveError> {
    let kind = node.kind();
    let mut params = node.layer_mut().params_mut();

    if params.len() != weights.len() {
        return Err(ArchiveError::schema(format!(
            "`{kind}` has {} parameter tensors, the archive holds {}",
            params.len(),
            weights.len()
        )));
    }

    for (role, (param, value)) in params.iter().zip(&weights).enumerate() {
        if param.num_elements() != value.len() {
            return Err(ArchiveError::schema(format!(
                "`{kind}` parameter {role} has {} values, the archive holds {}",
                param.num_elements(),
                value.len()
            )));
        }
    }

    for (param, value) in params.iter_mut().zip(weights) {
        param.value = value;
    }

    node.mark_initialized();
    Ok(())
}
