//! Shared fixtures for the condition tests.

use std::sync::{Arc, Mutex, Once};
use ua_pubsub_alarms::{
    AcknowledgeableCondition, AuditEvent, ConditionEvent, ConditionEventSink, ConditionOptions,
};
use ua_pubsub_types::{LocalizedText, NodeId};

static INIT_TRACING: Once = Once::new();

pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_target(false)
            .without_time()
            .try_init();
    });
}

/// Sink double recording every published event in order.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<ConditionEvent>>,
}

impl RecordingSink {
    pub fn audits(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                ConditionEvent::Audit(audit) => Some(audit.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn acknowledged_count(&self) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, ConditionEvent::Acknowledged { .. }))
            .count()
    }

    pub fn confirmed_count(&self) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, ConditionEvent::Confirmed { .. }))
            .count()
    }

    pub fn value_changes(&self) -> Vec<(&'static str, bool)> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                ConditionEvent::ValueChanged {
                    variable, value, ..
                } => value.as_bool().map(|b| (*variable, b)),
                _ => None,
            })
            .collect()
    }
}

impl ConditionEventSink for RecordingSink {
    fn publish(&self, event: ConditionEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn comment(text: &str) -> LocalizedText {
    LocalizedText::new("en", text)
}

pub fn condition(with_confirmed_state: bool) -> (AcknowledgeableCondition, Arc<RecordingSink>) {
    init_tracing();
    let sink = Arc::new(RecordingSink::default());
    let condition = AcknowledgeableCondition::new(
        ConditionOptions {
            node_id: NodeId::new_string(2, "Boiler.OverheatAlarm"),
            display_name: LocalizedText::from_text("OverheatAlarm"),
            severity: 700,
            message: LocalizedText::from_text("temperature above limit"),
            with_confirmed_state,
        },
        Arc::clone(&sink) as Arc<dyn ConditionEventSink>,
    );
    (condition, sink)
}
