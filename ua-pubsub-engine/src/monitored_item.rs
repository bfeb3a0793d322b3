use crate::address_space::NodeDescriptor;
use crate::notification::{EventFieldList, MonitoredItemNotification};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};
use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};
use ua_pubsub_types::{NodeId, QualifiedName, StatusCode, Variant};

/// Sampling interval floor in milliseconds.
pub const MIN_SAMPLING_INTERVAL_MS: f64 = 50.0;
/// Sampling interval ceiling: one day.
pub const MAX_SAMPLING_INTERVAL_MS: f64 = 24.0 * 3600.0 * 1000.0;
/// Largest queue a single monitored item may request.
pub const MAX_QUEUE_SIZE: u32 = 2000;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum MonitoringMode {
    Disabled = 0,
    Sampling = 1,
    Reporting = 2,
}

/// What to monitor: a node attribute, optionally index-ranged and with a
/// requested value encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadValueId {
    pub node_id: NodeId,
    /// Raw attribute id; validated against [`ua_pubsub_types::AttributeId`]
    /// at creation time.
    pub attribute_id: u32,
    pub index_range: Option<String>,
    pub data_encoding: QualifiedName,
}

impl ReadValueId {
    /// Value-attribute read with no range and no encoding, the common case.
    pub fn new_value(node_id: NodeId) -> Self {
        Self {
            node_id,
            attribute_id: 13,
            index_range: None,
            data_encoding: QualifiedName::default(),
        }
    }
}

/// Filter requested for a monitored item. Validation is delegated to the
/// sampler side through [`MonitoredItemFactory::validate_filter`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum MonitoringFilter {
    #[default]
    None,
    DataChange {
        deadband_type: u32,
        deadband_value: f64,
    },
    Event {
        select_clauses: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringParameters {
    pub client_handle: u32,
    pub sampling_interval: f64,
    pub filter: MonitoringFilter,
    pub queue_size: u32,
    pub discard_oldest: bool,
}

impl Default for MonitoringParameters {
    fn default() -> Self {
        Self {
            client_handle: 0,
            sampling_interval: -1.0,
            filter: MonitoringFilter::None,
            queue_size: 1,
            discard_oldest: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoredItemCreateRequest {
    pub item_to_monitor: ReadValueId,
    pub monitoring_mode: MonitoringMode,
    pub requested_parameters: MonitoringParameters,
}

/// Per-item creation outcome, mirrored into the service response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoredItemCreateResult {
    pub status_code: StatusCode,
    pub monitored_item_id: u32,
    pub revised_sampling_interval: f64,
    pub revised_queue_size: u32,
    pub filter_result: Variant,
}

impl MonitoredItemCreateResult {
    pub(crate) fn error(status_code: StatusCode) -> Self {
        Self {
            status_code,
            monitored_item_id: 0,
            revised_sampling_interval: 0.0,
            revised_queue_size: 0,
            filter_result: Variant::Empty,
        }
    }
}

/// One notification element drained from a monitored item. Consumers
/// partition on the arm when assembling notification messages.
#[derive(Debug, Clone, PartialEq)]
pub enum QueuedNotification {
    DataChange(MonitoredItemNotification),
    Event(EventFieldList),
}

/// Capability contract the subscription depends on. Sampling internals
/// (timers, deadband evaluation, queue overflow handling) stay behind it.
pub trait MonitoredItem: Send {
    fn monitored_item_id(&self) -> u32;
    fn client_handle(&self) -> u32;
    fn monitoring_mode(&self) -> MonitoringMode;
    fn sampling_interval(&self) -> f64;
    fn queue_size(&self) -> u32;

    /// True when the item has queued notifications ready to harvest.
    fn has_notifications(&self) -> bool;

    /// Drain the item's notification queue, oldest first.
    fn extract_notifications(&mut self) -> Vec<QueuedNotification>;

    fn set_monitoring_mode(&mut self, mode: MonitoringMode);
    fn set_node(&mut self, node_id: NodeId);

    /// Stop sampling. The item may still be drained afterwards.
    fn terminate(&mut self);

    /// Release resources. Called exactly once, after `terminate`.
    fn dispose(&mut self);
}

/// Builds concrete monitored items and validates their filters.
pub trait MonitoredItemFactory: Send + Sync {
    /// Validate the requested filter against the item being created.
    /// Returns the status to surface and the revised filter result.
    fn validate_filter(
        &self,
        item_to_monitor: &ReadValueId,
        filter: &MonitoringFilter,
    ) -> (StatusCode, Variant);

    /// Build an item from revised parameters. Infallible: all validation
    /// has already happened by the time this is called.
    fn create(
        &self,
        monitored_item_id: u32,
        request: &MonitoredItemCreateRequest,
        revised_sampling_interval: f64,
        revised_queue_size: u32,
    ) -> Box<dyn MonitoredItem>;
}

/// Process-wide allocator of monitored-item ids, shared by every
/// subscription so ids stay globally unique.
#[derive(Debug, Clone, Default)]
pub struct MonitoredItemIdGenerator {
    next: Arc<AtomicU32>,
}

impl MonitoredItemIdGenerator {
    pub fn new() -> Self {
        Self {
            next: Arc::new(AtomicU32::new(1)),
        }
    }

    pub fn next_id(&self) -> u32 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

/// Revise a requested sampling interval against the publishing interval,
/// the engine-wide clamps and the node's own floor.
pub fn adjust_sampling_interval(
    requested: f64,
    publishing_interval_ms: f64,
    node: Option<&NodeDescriptor>,
) -> f64 {
    let node_minimum = node
        .and_then(|n| n.minimum_sampling_interval)
        // A negative per-node minimum is treated as unspecified.
        .filter(|v| *v >= 0.0);

    let mut interval = if requested < 0.0 {
        publishing_interval_ms
    } else if requested == 0.0 {
        // 0 requests exception-based reporting: honour the node's declared
        // minimum when it has one, otherwise leave it at 0.
        node_minimum.unwrap_or(0.0)
    } else {
        requested
    };

    if interval > 0.0 {
        interval = interval.clamp(MIN_SAMPLING_INTERVAL_MS, MAX_SAMPLING_INTERVAL_MS);
    }

    interval.max(node_minimum.unwrap_or(0.0))
}

/// Clamp a requested queue size into the supported range.
pub fn revise_queue_size(requested: u32) -> u32 {
    requested.clamp(1, MAX_QUEUE_SIZE)
}

#[cfg(test)]
mod tests {
    use super::{adjust_sampling_interval, revise_queue_size, MAX_QUEUE_SIZE};
    use crate::address_space::{NodeClass, NodeDescriptor};

    fn variable(min_interval: Option<f64>) -> NodeDescriptor {
        NodeDescriptor {
            node_class: NodeClass::Variable,
            minimum_sampling_interval: min_interval,
        }
    }

    #[test]
    fn negative_request_falls_back_to_publishing_interval() {
        let node = variable(None);
        assert_eq!(adjust_sampling_interval(-1.0, 1000.0, Some(&node)), 1000.0);
    }

    #[test]
    fn zero_request_reads_the_node_minimum() {
        let node = variable(Some(250.0));
        assert_eq!(adjust_sampling_interval(0.0, 1000.0, Some(&node)), 250.0);

        // 0 on the node means exception-based: stays 0.
        let node = variable(Some(0.0));
        assert_eq!(adjust_sampling_interval(0.0, 1000.0, Some(&node)), 0.0);

        // No declared minimum: left at 0.
        let node = variable(None);
        assert_eq!(adjust_sampling_interval(0.0, 1000.0, Some(&node)), 0.0);
    }

    #[test]
    fn positive_request_is_clamped_and_floored() {
        let node = variable(None);
        assert_eq!(adjust_sampling_interval(10.0, 1000.0, Some(&node)), 50.0);

        let node = variable(Some(500.0));
        assert_eq!(adjust_sampling_interval(100.0, 1000.0, Some(&node)), 500.0);
    }

    #[test]
    fn negative_node_minimum_is_ignored() {
        let node = variable(Some(-5.0));
        assert_eq!(adjust_sampling_interval(100.0, 1000.0, Some(&node)), 100.0);
        assert_eq!(adjust_sampling_interval(0.0, 1000.0, Some(&node)), 0.0);
    }

    #[test]
    fn queue_size_bounds() {
        assert_eq!(revise_queue_size(0), 1);
        assert_eq!(revise_queue_size(10), 10);
        assert_eq!(revise_queue_size(1_000_000), MAX_QUEUE_SIZE);
    }
}
