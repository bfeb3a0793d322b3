use crate::{
    audit::{AuditEvent, AuditEventType},
    snapshot::ConditionSnapshot,
};
use bytes::Bytes;
use std::sync::Arc;
use tracing::debug;
use ua_pubsub_types::{LocalizedText, NodeId, StatusCode, Variant};
use uuid::Uuid;

/// Events a condition pushes outward: live-value updates, branch state
/// publications, audit records and the acknowledge/confirm outcomes.
#[derive(Debug, Clone)]
pub enum ConditionEvent {
    /// A two-state variable changed on the live condition node.
    ValueChanged {
        condition_id: NodeId,
        variable: &'static str,
        value: Variant,
    },
    /// A branch's full state, republished after a transition.
    BranchState(ConditionSnapshot),
    Audit(AuditEvent),
    Acknowledged {
        event_id: Bytes,
        comment: LocalizedText,
        branch: ConditionSnapshot,
    },
    Confirmed {
        event_id: Bytes,
        comment: LocalizedText,
        branch: ConditionSnapshot,
    },
}

/// Outbound seam for condition events. Implementations forward into the
/// event pipeline (or record, in tests).
pub trait ConditionEventSink: Send + Sync {
    fn publish(&self, event: ConditionEvent);
}

/// Instantiation parameters for an acknowledgeable condition.
#[derive(Debug, Clone)]
pub struct ConditionOptions {
    pub node_id: NodeId,
    pub display_name: LocalizedText,
    pub severity: u16,
    pub message: LocalizedText,
    /// Install the optional ConfirmedState machinery and the Confirm
    /// method alongside the mandatory AckedState.
    pub with_confirmed_state: bool,
}

/// Which branch an operation addresses.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum BranchKey {
    Current,
    Historical(usize),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum StateVariable {
    Acked,
    Confirmed,
}

impl StateVariable {
    fn browse_name(self) -> &'static str {
        match self {
            StateVariable::Acked => "AckedState",
            StateVariable::Confirmed => "ConfirmedState",
        }
    }
}

/// A condition carrying the acknowledge/confirm overlay.
///
/// The condition owns its current branch (null branch id) and any
/// historical branches still awaiting acknowledgement or confirmation.
/// Branches never point back at the condition; every mutation goes through
/// the owner, which also propagates current-branch changes to the live
/// state and emits the matching events.
pub struct AcknowledgeableCondition {
    node_id: NodeId,
    display_name: LocalizedText,
    current: ConditionSnapshot,
    branches: Vec<ConditionSnapshot>,
    sink: Arc<dyn ConditionEventSink>,
}

impl AcknowledgeableCondition {
    pub fn new(options: ConditionOptions, sink: Arc<dyn ConditionEventSink>) -> Self {
        let current = ConditionSnapshot::new(
            NodeId::null(),
            new_event_id(),
            options.severity,
            options.message,
            options.with_confirmed_state,
        );
        Self {
            node_id: options.node_id,
            display_name: options.display_name,
            current,
            branches: Vec::new(),
            sink,
        }
    }

    #[inline]
    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    #[inline]
    pub fn display_name(&self) -> &LocalizedText {
        &self.display_name
    }

    #[inline]
    pub fn current_branch(&self) -> &ConditionSnapshot {
        &self.current
    }

    #[inline]
    pub fn branches(&self) -> &[ConditionSnapshot] {
        &self.branches
    }

    #[inline]
    pub fn supports_confirm(&self) -> bool {
        self.current.supports_confirm()
    }

    /// Freeze the current state into a new historical branch and return
    /// its branch id. The branch gets its own event id so later
    /// acknowledgements can address it while the condition moves on.
    pub fn create_branch(&mut self) -> NodeId {
        let branch_id = NodeId::new_guid(self.node_id.namespace, Uuid::new_v4());
        let branch = self.current.branch_with(branch_id.clone(), new_event_id());
        debug!(
            condition = %self.node_id,
            branch_id = %branch_id,
            "Condition branch created"
        );
        self.sink.publish(ConditionEvent::BranchState(branch.clone()));
        self.branches.push(branch);
        branch_id
    }

    // -- client method handlers -------------------------------------------

    /// The Acknowledge method: resolve the branch addressed by `event_id`
    /// and run the acknowledge transition on it.
    pub fn acknowledge(&mut self, event_id: &Bytes, comment: LocalizedText) -> StatusCode {
        let Some(key) = self.branch_by_event_id(event_id) else {
            return StatusCode::BAD_EVENT_ID_UNKNOWN;
        };
        self.acknowledge_branch(key, comment, "Method/Acknowledged")
    }

    /// The Confirm method. Only bound when the condition was instantiated
    /// with ConfirmedState.
    pub fn confirm(&mut self, event_id: &Bytes, comment: LocalizedText) -> StatusCode {
        if !self.supports_confirm() {
            return StatusCode::BAD_METHOD_INVALID;
        }
        let Some(key) = self.branch_by_event_id(event_id) else {
            return StatusCode::BAD_EVENT_ID_UNKNOWN;
        };
        if self
            .snapshot(key)
            .confirmed_state()
            .is_some_and(|v| v.id())
        {
            return StatusCode::BAD_CONDITION_BRANCH_ALREADY_CONFIRMED;
        }
        self.confirm_branch(key, event_id.clone(), comment, "Method/Confirm")
    }

    // -- server-initiated helpers -----------------------------------------

    /// Confirm a branch on the server's own authority.
    pub fn auto_confirm_branch(&mut self, branch_id: &NodeId, comment: LocalizedText) -> StatusCode {
        if !self.supports_confirm() {
            return StatusCode::BAD_METHOD_INVALID;
        }
        let Some(key) = self.branch_by_id(branch_id) else {
            return StatusCode::BAD_EVENT_ID_UNKNOWN;
        };
        if self
            .snapshot(key)
            .confirmed_state()
            .is_some_and(|v| v.id())
        {
            return StatusCode::BAD_CONDITION_BRANCH_ALREADY_CONFIRMED;
        }
        let event_id = self.snapshot(key).event_id().clone();
        self.confirm_branch(key, event_id, comment, "Server/Confirm")
    }

    /// Acknowledge and immediately confirm a branch on the server's own
    /// authority.
    pub fn acknowledge_and_auto_confirm_branch(
        &mut self,
        branch_id: &NodeId,
        comment: LocalizedText,
    ) -> StatusCode {
        let Some(key) = self.branch_by_id(branch_id) else {
            return StatusCode::BAD_EVENT_ID_UNKNOWN;
        };
        let status = self.acknowledge_branch(key, comment.clone(), "Server/Acknowledge");
        if !status.is_good() {
            return status;
        }
        self.auto_confirm_branch(branch_id, comment)
    }

    // -- transitions ------------------------------------------------------

    fn acknowledge_branch(
        &mut self,
        key: BranchKey,
        comment: LocalizedText,
        message: &str,
    ) -> StatusCode {
        // An acknowledged branch waits for confirmation when the condition
        // supports it; otherwise there is nothing left to retain.
        if self.snapshot(key).supports_confirm() {
            self.set_two_state(key, StateVariable::Confirmed, false);
            self.snapshot_mut(key).set_retain(true);
        } else {
            self.snapshot_mut(key).set_retain(false);
        }

        let status = self.set_acked_state(key, true);
        if !status.is_good() {
            return status;
        }

        self.snapshot_mut(key).set_comment(comment.clone());
        self.raise_new_branch_state(key);

        let branch = self.snapshot(key).clone();
        let event_id = branch.event_id().clone();
        self.sink.publish(ConditionEvent::Audit(AuditEvent::new(
            AuditEventType::ConditionAcknowledge,
            event_id.clone(),
            comment.clone(),
            message,
        )));
        debug!(condition = %self.node_id, message, "Condition branch acknowledged");
        self.sink.publish(ConditionEvent::Acknowledged {
            event_id,
            comment,
            branch,
        });
        StatusCode::GOOD
    }

    fn confirm_branch(
        &mut self,
        key: BranchKey,
        event_id: Bytes,
        comment: LocalizedText,
        message: &str,
    ) -> StatusCode {
        // The caller's event id must address this very branch.
        if self.snapshot(key).event_id() != &event_id {
            return StatusCode::BAD_EVENT_ID_UNKNOWN;
        }

        self.set_two_state(key, StateVariable::Confirmed, true);
        self.snapshot_mut(key).set_retain(false);
        self.snapshot_mut(key).set_comment(comment.clone());

        self.sink.publish(ConditionEvent::Audit(AuditEvent::new(
            AuditEventType::ConditionComment,
            event_id.clone(),
            comment.clone(),
            message,
        )));
        self.sink.publish(ConditionEvent::Audit(AuditEvent::new(
            AuditEventType::ConditionConfirm,
            event_id.clone(),
            comment.clone(),
            message,
        )));

        self.raise_new_branch_state(key);
        let branch = self.snapshot(key).clone();
        debug!(condition = %self.node_id, message, "Condition branch confirmed");
        self.sink.publish(ConditionEvent::Confirmed {
            event_id,
            comment,
            branch,
        });

        // A confirmed branch is no longer retained; historical ones are
        // done for good.
        if let BranchKey::Historical(index) = key {
            self.branches.remove(index);
        }
        StatusCode::GOOD
    }

    fn set_acked_state(&mut self, key: BranchKey, value: bool) -> StatusCode {
        if value && self.snapshot(key).acked_state().id() {
            return StatusCode::BAD_CONDITION_BRANCH_ALREADY_ACKED;
        }
        self.set_two_state(key, StateVariable::Acked, value);
        StatusCode::GOOD
    }

    /// The two-state update rule: store the boolean, let the label follow,
    /// propagate to the live node when on the current branch and announce
    /// the change.
    fn set_two_state(&mut self, key: BranchKey, variable: StateVariable, value: bool) {
        let snapshot = self.snapshot_mut(key);
        match variable {
            StateVariable::Acked => {
                snapshot.acked_state_mut().set(value);
            }
            StateVariable::Confirmed => {
                if let Some(state) = snapshot.confirmed_state_mut() {
                    state.set(value);
                }
            }
        }
        // The current snapshot is the live node state, so propagation is
        // the write above; historical branches change only their copy.
        self.sink.publish(ConditionEvent::ValueChanged {
            condition_id: self.node_id.clone(),
            variable: variable.browse_name(),
            value: Variant::Boolean(value),
        });
    }

    fn raise_new_branch_state(&self, key: BranchKey) {
        self.sink
            .publish(ConditionEvent::BranchState(self.snapshot(key).clone()));
    }

    // -- branch addressing ------------------------------------------------

    fn branch_by_event_id(&self, event_id: &Bytes) -> Option<BranchKey> {
        if self.current.event_id() == event_id {
            return Some(BranchKey::Current);
        }
        self.branches
            .iter()
            .position(|b| b.event_id() == event_id)
            .map(BranchKey::Historical)
    }

    fn branch_by_id(&self, branch_id: &NodeId) -> Option<BranchKey> {
        if branch_id.is_null() {
            return Some(BranchKey::Current);
        }
        self.branches
            .iter()
            .position(|b| b.branch_id() == branch_id)
            .map(BranchKey::Historical)
    }

    fn snapshot(&self, key: BranchKey) -> &ConditionSnapshot {
        match key {
            BranchKey::Current => &self.current,
            BranchKey::Historical(index) => &self.branches[index],
        }
    }

    fn snapshot_mut(&mut self, key: BranchKey) -> &mut ConditionSnapshot {
        match key {
            BranchKey::Current => &mut self.current,
            BranchKey::Historical(index) => &mut self.branches[index],
        }
    }
}

fn new_event_id() -> Bytes {
    Bytes::copy_from_slice(Uuid::new_v4().as_bytes())
}
