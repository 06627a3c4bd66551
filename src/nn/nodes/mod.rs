mod node_handle;
pub(crate) mod raw_node;

pub use node_handle::NodeId;
pub(crate) use node_handle::NodeHandle;
pub(crate) use raw_node::{NodeType, TraitNode};
