//! Shared OPC UA value and identity types.
//!
//! This crate carries only what the subscription engine and the condition
//! overlay consume: status codes, node identities, the variant value model
//! and index ranges. Wire-level encoding lives outside this workspace.

mod attribute;
mod data_value;
mod localized;
mod node_id;
mod numeric_range;
mod status;
mod variant;

pub use attribute::AttributeId;
pub use data_value::DataValue;
pub use localized::{LocalizedText, QualifiedName};
pub use node_id::{Identifier, NodeId};
pub use numeric_range::{NumericRange, NumericRangeError, RangeDimension};
pub use status::StatusCode;
pub use variant::Variant;
