use crate::{LocalizedText, NodeId, StatusCode};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A strongly-typed runtime value.
///
/// Covers the scalar types the subscription engine moves around. Shared
/// string storage (`Arc<str>`) and zero-copy byte payloads (`Bytes`) keep
/// cloning cheap on the notification hot path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Variant {
    #[default]
    Empty,
    Boolean(bool),
    SByte(i8),
    Byte(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float(f32),
    Double(f64),
    String(Arc<str>),
    DateTime(DateTime<Utc>),
    ByteString(Bytes),
    StatusCode(StatusCode),
    NodeId(NodeId),
    LocalizedText(LocalizedText),
}

impl Variant {
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Variant::Empty)
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Variant::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Variant::Byte(v) => Some(u32::from(*v)),
            Variant::UInt16(v) => Some(u32::from(*v)),
            Variant::UInt32(v) => Some(*v),
            Variant::Int32(v) if *v >= 0 => Some(*v as u32),
            _ => None,
        }
    }

    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Variant::Float(v) => Some(f64::from(*v)),
            Variant::Double(v) => Some(*v),
            Variant::Int32(v) => Some(f64::from(*v)),
            Variant::UInt32(v) => Some(f64::from(*v)),
            _ => None,
        }
    }

    #[inline]
    pub fn as_localized_text(&self) -> Option<&LocalizedText> {
        match self {
            Variant::LocalizedText(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_byte_string(&self) -> Option<&Bytes> {
        match self {
            Variant::ByteString(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for Variant {
    fn from(v: bool) -> Self {
        Variant::Boolean(v)
    }
}

impl From<f64> for Variant {
    fn from(v: f64) -> Self {
        Variant::Double(v)
    }
}

impl From<u32> for Variant {
    fn from(v: u32) -> Self {
        Variant::UInt32(v)
    }
}

impl From<&str> for Variant {
    fn from(v: &str) -> Self {
        Variant::String(Arc::from(v))
    }
}

impl From<LocalizedText> for Variant {
    fn from(v: LocalizedText) -> Self {
        Variant::LocalizedText(v)
    }
}

impl From<StatusCode> for Variant {
    fn from(v: StatusCode) -> Self {
        Variant::StatusCode(v)
    }
}

impl From<Bytes> for Variant {
    fn from(v: Bytes) -> Self {
        Variant::ByteString(v)
    }
}
