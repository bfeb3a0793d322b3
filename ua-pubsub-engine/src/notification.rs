use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ua_pubsub_types::{DataValue, StatusCode, Variant};

/// One sampled value change queued by a monitored item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoredItemNotification {
    /// Client-side handle chosen when the item was created.
    pub client_handle: u32,
    pub value: DataValue,
}

/// One event occurrence queued by a monitored item: the selected event
/// fields in select-clause order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventFieldList {
    pub client_handle: u32,
    pub event_fields: Vec<Variant>,
}

/// Collected data changes for one notification message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataChangeNotification {
    pub monitored_items: Vec<MonitoredItemNotification>,
}

/// Collected events for one notification message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventNotificationList {
    pub events: Vec<EventFieldList>,
}

/// Subscription status change pushed onto the notification stream
/// (lifetime expiry, transfer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChangeNotification {
    pub status: StatusCode,
}

/// The payload kinds a notification message can carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NotificationData {
    DataChange(DataChangeNotification),
    Events(EventNotificationList),
    StatusChange(StatusChangeNotification),
}

impl NotificationData {
    /// Number of monitored-item entries carried by this payload.
    pub fn entry_count(&self) -> usize {
        match self {
            NotificationData::DataChange(dc) => dc.monitored_items.len(),
            NotificationData::Events(ev) => ev.events.len(),
            NotificationData::StatusChange(_) => 1,
        }
    }
}

/// A sequenced payload of one or two notification objects.
///
/// Harvested chunks carry a data-change list and/or an event list (in that
/// order); status changes travel alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationMessage {
    pub sequence_number: u32,
    pub publish_time: DateTime<Utc>,
    pub notification_data: Vec<NotificationData>,
}

impl NotificationMessage {
    pub fn new(
        sequence_number: u32,
        publish_time: DateTime<Utc>,
        notification_data: Vec<NotificationData>,
    ) -> Self {
        debug_assert!(
            !notification_data.is_empty() && notification_data.len() <= 2,
            "a notification message carries 1..=2 notification objects"
        );
        Self {
            sequence_number,
            publish_time,
            notification_data,
        }
    }

    pub fn status_change(
        sequence_number: u32,
        publish_time: DateTime<Utc>,
        status: StatusCode,
    ) -> Self {
        Self {
            sequence_number,
            publish_time,
            notification_data: vec![NotificationData::StatusChange(StatusChangeNotification {
                status,
            })],
        }
    }

    /// True when the message carries a status-change payload with `status`.
    pub fn is_status_change(&self, status: StatusCode) -> bool {
        self.notification_data.iter().any(|data| {
            matches!(data, NotificationData::StatusChange(sc) if sc.status == status)
        })
    }
}
