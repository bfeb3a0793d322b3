use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;
use uuid::Uuid;

/// The identifier part of a [`NodeId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Identifier {
    Numeric(u32),
    String(Arc<str>),
    Guid(Uuid),
    Opaque(Bytes),
}

/// An OPC UA node identity: namespace index plus identifier.
///
/// `NodeId::null()` (ns=0, i=0) doubles as the "no node" marker, which is
/// how condition branches mark the current branch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId {
    pub namespace: u16,
    pub identifier: Identifier,
}

impl NodeId {
    pub fn new_numeric(namespace: u16, value: u32) -> Self {
        Self {
            namespace,
            identifier: Identifier::Numeric(value),
        }
    }

    pub fn new_string(namespace: u16, value: impl Into<Arc<str>>) -> Self {
        Self {
            namespace,
            identifier: Identifier::String(value.into()),
        }
    }

    pub fn new_guid(namespace: u16, value: Uuid) -> Self {
        Self {
            namespace,
            identifier: Identifier::Guid(value),
        }
    }

    pub fn new_opaque(namespace: u16, value: impl Into<Bytes>) -> Self {
        Self {
            namespace,
            identifier: Identifier::Opaque(value.into()),
        }
    }

    #[inline]
    pub fn null() -> Self {
        Self::new_numeric(0, 0)
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.namespace == 0 && matches!(self.identifier, Identifier::Numeric(0))
    }
}

impl Default for NodeId {
    #[inline]
    fn default() -> Self {
        Self::null()
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.identifier {
            Identifier::Numeric(v) => write!(f, "ns={};i={}", self.namespace, v),
            Identifier::String(v) => write!(f, "ns={};s={}", self.namespace, v),
            Identifier::Guid(v) => write!(f, "ns={};g={}", self.namespace, v),
            Identifier::Opaque(v) => write!(f, "ns={};b={} bytes", self.namespace, v.len()),
        }
    }
}
