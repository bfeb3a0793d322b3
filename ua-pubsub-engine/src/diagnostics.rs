use serde::{Deserialize, Serialize};

/// Live counters reflecting one subscription's runtime state.
///
/// Mutated inline by the state machine; snapshots are cheap clones handed
/// to diagnostics consumers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionDiagnostics {
    pub publish_request_count: u64,
    pub modify_count: u64,
    pub enable_count: u64,
    pub disable_count: u64,
    pub notifications_count: u64,
    pub data_change_notifications_count: u64,
    pub event_notifications_count: u64,
    pub late_publish_request_count: u64,
    pub current_keep_alive_count: u32,
    pub current_lifetime_count: u32,
    pub unacknowledged_message_count: u32,
    pub discarded_message_count: u64,
    pub monitored_item_count: u32,
    pub disabled_monitored_item_count: u32,
    pub next_sequence_number: u32,
}
