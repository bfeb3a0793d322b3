//! Server-side OPC UA subscription engine.
//!
//! One [`Subscription`] tracks a client's interest in periodic updates: it
//! harvests notifications from monitored items on every publishing cycle,
//! packages them into sequenced notification messages, reconciles them with
//! pending publish requests, synthesizes keep-alives when idle and keeps a
//! bounded retransmission queue until the client acknowledges delivery.
//!
//! The publish engine (wire side), the address space and monitored-item
//! sampling are external collaborators consumed through the traits in
//! [`publish`], [`address_space`] and [`monitored_item`].

mod address_space;
mod diagnostics;
mod monitored_item;
mod notification;
mod publish;
mod registry;
mod retransmission;
mod runner;
mod sequence;
mod subscription;

pub use address_space::{AddressSpace, NodeClass, NodeDescriptor};
pub use diagnostics::SubscriptionDiagnostics;
pub use monitored_item::{
    adjust_sampling_interval, revise_queue_size, MonitoredItem, MonitoredItemCreateRequest,
    MonitoredItemCreateResult, MonitoredItemFactory, MonitoredItemIdGenerator, MonitoringFilter,
    MonitoringMode, MonitoringParameters, QueuedNotification, ReadValueId,
    MAX_QUEUE_SIZE, MAX_SAMPLING_INTERVAL_MS, MIN_SAMPLING_INTERVAL_MS,
};
pub use notification::{
    DataChangeNotification, EventFieldList, EventNotificationList, MonitoredItemNotification,
    NotificationData, NotificationMessage, StatusChangeNotification,
};
pub use publish::{PublishEngine, PublishedMessage};
pub use registry::SubscriptionRegistry;
pub use retransmission::RetransmissionQueue;
pub use runner::{SubscriptionCommand, SubscriptionHandle, SubscriptionRunner};
pub use sequence::SequenceNumberGenerator;
pub use subscription::{
    ModifyOptions, Subscription, SubscriptionEvent, SubscriptionOptions, SubscriptionState,
    TickOutcome,
};
