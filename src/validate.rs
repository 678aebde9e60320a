//! Structural checks run before a tree is projected.

use thiserror::Error;

use crate::schema::Node;

/// Default nesting limit for incoming trees.
pub const DEFAULT_MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// A node id reappears along its own ancestor chain.
    #[error("malformed tree: node '{id}' is its own ancestor")]
    Cycle { id: String },
    #[error("malformed tree: nesting exceeds {max_depth} levels at node '{id}'")]
    TooDeep { id: String, max_depth: usize },
}

/// Reject trees whose ancestor chains repeat an id or nest past `max_depth`.
pub fn validate_tree(nodes: &[Node], max_depth: usize) -> Result<(), TreeError> {
    let mut ancestors: Vec<&str> = Vec::new();
    check_level(nodes, &mut ancestors, max_depth)
}

fn check_level<'a>(
    nodes: &'a [Node],
    ancestors: &mut Vec<&'a str>,
    max_depth: usize,
) -> Result<(), TreeError> {
    for node in nodes {
        if ancestors.len() >= max_depth {
            return Err(TreeError::TooDeep {
                id: node.id.clone(),
                max_depth,
            });
        }
        if !node.id.is_empty() && ancestors.contains(&node.id.as_str()) {
            return Err(TreeError::Cycle {
                id: node.id.clone(),
            });
        }
        if !node.children.is_empty() {
            ancestors.push(&node.id);
            check_level(&node.children, ancestors, max_depth)?;
            ancestors.pop();
        }
    }
    Ok(())
}
