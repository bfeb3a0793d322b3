use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use ua_pubsub_types::{LocalizedText, StatusCode};

/// Audit event types raised by condition operations, named exactly as in
/// the OPC UA nodeset.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditEventType {
    ConditionAcknowledge,
    ConditionConfirm,
    ConditionComment,
}

impl AuditEventType {
    pub fn browse_name(self) -> &'static str {
        match self {
            AuditEventType::ConditionAcknowledge => "AuditConditionAcknowledgeEventType",
            AuditEventType::ConditionConfirm => "AuditConditionConfirmEventType",
            AuditEventType::ConditionComment => "AuditConditionCommentEventType",
        }
    }
}

impl Display for AuditEventType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.browse_name())
    }
}

/// Record of an operator or server action on a condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_type: AuditEventType,
    /// Event id of the branch the action applied to.
    pub event_id: Bytes,
    pub action_time_stamp: DateTime<Utc>,
    pub status: StatusCode,
    pub comment: LocalizedText,
    /// Source of the action, e.g. "Method/Acknowledge" or "Server/Confirm".
    pub message: Option<String>,
    pub client_user_id: Option<String>,
}

impl AuditEvent {
    pub(crate) fn new(
        event_type: AuditEventType,
        event_id: Bytes,
        comment: LocalizedText,
        message: &str,
    ) -> Self {
        Self {
            event_type,
            event_id,
            action_time_stamp: Utc::now(),
            status: StatusCode::GOOD,
            comment,
            message: Some(message.to_string()),
            client_user_id: None,
        }
    }
}
