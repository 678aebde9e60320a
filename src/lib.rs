//! Batch Projector - projects extraction trees into the flat, UI-ready
//! listings a virtualized tree view and document viewer consume.

pub mod config;
pub mod documents;
pub mod flatten;
pub mod grouping;
pub mod hierarchy;
pub mod ids;
pub mod keys;
pub mod media;
pub mod natural_id;
pub mod naming;
pub mod pages;
pub mod record;
pub mod schema;
pub mod search;
pub mod tables;
pub mod tree_store;
pub mod validate;
pub mod vendors;

pub use flatten::{flat_nodes, SelectedNode, ViewState};
pub use record::{BadgeVariant, DisplayRecord};
pub use schema::{Node, NodeType};
pub use validate::{validate_tree, TreeError, DEFAULT_MAX_DEPTH};
