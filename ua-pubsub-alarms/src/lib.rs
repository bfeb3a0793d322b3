//! Acknowledgeable condition state overlay.
//!
//! A condition is a stateful event source: per *branch* (a snapshot of its
//! fields at a moment) it tracks acknowledged / confirmed / retained
//! substates, drives the formally defined acknowledge and confirm
//! transitions, and records operator actions as audit events.
//!
//! Notifications produced here travel through the same subscription
//! pipeline as ordinary events; this crate only owns the state logic.

mod audit;
mod condition;
mod snapshot;
mod two_state;

pub use audit::{AuditEvent, AuditEventType};
pub use condition::{
    AcknowledgeableCondition, ConditionEvent, ConditionEventSink, ConditionOptions,
};
pub use snapshot::ConditionSnapshot;
pub use two_state::TwoStateVariable;
