use serde_repr::{Deserialize_repr, Serialize_repr};
use ua_pubsub_types::NodeId;

/// OPC UA node classes (Part 3).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum NodeClass {
    Object = 1,
    Variable = 2,
    Method = 4,
    ObjectType = 8,
    VariableType = 16,
    ReferenceType = 32,
    DataType = 64,
    View = 128,
}

/// The slice of node metadata monitored-item creation needs.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDescriptor {
    pub node_class: NodeClass,
    /// MinimumSamplingInterval attribute in milliseconds, when the node
    /// declares one. 0 means exception-based reporting is supported.
    pub minimum_sampling_interval: Option<f64>,
}

/// Opaque directory of nodes.
///
/// The engine only ever asks "does this node exist and what class is it";
/// attribute storage and browsing stay outside this workspace.
pub trait AddressSpace: Send + Sync {
    fn node(&self, node_id: &NodeId) -> Option<NodeDescriptor>;
}
