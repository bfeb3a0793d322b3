use crate::two_state::TwoStateVariable;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ua_pubsub_types::{LocalizedText, NodeId};

/// A copy of a condition's properties frozen for one branch.
///
/// The *current* branch carries a null `branch_id`; historical branches
/// get a generated one. Snapshots hold no reference back to their owning
/// condition — the condition mutates them and handles propagation to the
/// live state itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionSnapshot {
    branch_id: NodeId,
    event_id: Bytes,
    comment: LocalizedText,
    retain: bool,
    severity: u16,
    message: LocalizedText,
    condition_time: DateTime<Utc>,
    acked_state: TwoStateVariable,
    confirmed_state: Option<TwoStateVariable>,
}

impl ConditionSnapshot {
    pub(crate) fn new(
        branch_id: NodeId,
        event_id: Bytes,
        severity: u16,
        message: LocalizedText,
        with_confirmed_state: bool,
    ) -> Self {
        Self {
            branch_id,
            event_id,
            comment: LocalizedText::default(),
            retain: true,
            severity,
            message,
            condition_time: Utc::now(),
            acked_state: TwoStateVariable::new("Acknowledged", "Unacknowledged"),
            confirmed_state: with_confirmed_state
                .then(|| TwoStateVariable::new("Confirmed", "Unconfirmed")),
        }
    }

    /// Re-freeze this snapshot as a historical branch under a new identity.
    pub(crate) fn branch_with(&self, branch_id: NodeId, event_id: Bytes) -> Self {
        let mut snapshot = self.clone();
        snapshot.branch_id = branch_id;
        snapshot.event_id = event_id;
        snapshot.condition_time = Utc::now();
        snapshot
    }

    #[inline]
    pub fn branch_id(&self) -> &NodeId {
        &self.branch_id
    }

    /// Null branch id marks the current branch.
    #[inline]
    pub fn is_current_branch(&self) -> bool {
        self.branch_id.is_null()
    }

    #[inline]
    pub fn event_id(&self) -> &Bytes {
        &self.event_id
    }

    #[inline]
    pub fn comment(&self) -> &LocalizedText {
        &self.comment
    }

    pub(crate) fn set_comment(&mut self, comment: LocalizedText) {
        self.comment = comment;
    }

    #[inline]
    pub fn retain(&self) -> bool {
        self.retain
    }

    pub(crate) fn set_retain(&mut self, retain: bool) {
        self.retain = retain;
    }

    #[inline]
    pub fn severity(&self) -> u16 {
        self.severity
    }

    #[inline]
    pub fn message(&self) -> &LocalizedText {
        &self.message
    }

    #[inline]
    pub fn condition_time(&self) -> DateTime<Utc> {
        self.condition_time
    }

    #[inline]
    pub fn acked_state(&self) -> &TwoStateVariable {
        &self.acked_state
    }

    pub(crate) fn acked_state_mut(&mut self) -> &mut TwoStateVariable {
        &mut self.acked_state
    }

    /// Present only on conditions instantiated with confirmation support.
    #[inline]
    pub fn confirmed_state(&self) -> Option<&TwoStateVariable> {
        self.confirmed_state.as_ref()
    }

    pub(crate) fn confirmed_state_mut(&mut self) -> Option<&mut TwoStateVariable> {
        self.confirmed_state.as_mut()
    }

    #[inline]
    pub fn supports_confirm(&self) -> bool {
        self.confirmed_state.is_some()
    }
}
