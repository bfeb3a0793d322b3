use crate::{
    address_space::{AddressSpace, NodeClass},
    diagnostics::SubscriptionDiagnostics,
    monitored_item::{
        adjust_sampling_interval, revise_queue_size, MonitoredItem, MonitoredItemCreateRequest,
        MonitoredItemCreateResult, MonitoredItemFactory, MonitoredItemIdGenerator, MonitoringMode,
        QueuedNotification, ReadValueId,
    },
    notification::{
        DataChangeNotification, EventNotificationList, NotificationData, NotificationMessage,
    },
    publish::{PublishEngine, PublishedMessage},
    retransmission::RetransmissionQueue,
    sequence::SequenceNumberGenerator,
};
use chrono::Utc;
use serde_repr::{Deserialize_repr, Serialize_repr};
use std::{collections::BTreeMap, collections::VecDeque, sync::Arc};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use ua_pubsub_types::{AttributeId, NodeId, NumericRange, StatusCode};

/// Publishing interval clamp range in milliseconds.
const MIN_PUBLISHING_INTERVAL_MS: f64 = 50.0;
const MAX_PUBLISHING_INTERVAL_MS: f64 = 15.0 * 24.0 * 3600.0 * 1000.0;
const DEFAULT_PUBLISHING_INTERVAL_MS: f64 = 1000.0;

const MIN_KEEP_ALIVE_COUNT: u32 = 2;
const MAX_KEEP_ALIVE_COUNT: u32 = 12_000;

/// A subscription must survive at least this long without publish requests.
const MIN_LIFETIME_DURATION_MS: f64 = 5000.0;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Lifecycle states of a subscription (Part 4).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum SubscriptionState {
    /// Absorbing. Timer stopped, monitored items gone.
    Closed = 1,
    /// Initial; the first tick creates the first message.
    Creating = 2,
    /// Periodic harvesting; keep-alive counter inactive.
    Normal = 3,
    /// A publishing interval elapsed with material to send but no publish
    /// request available. The next arriving request is serviced at once.
    Late = 4,
    /// Idle; counting down to the next forced keep-alive.
    KeepAlive = 5,
    /// Absorbing. Reserved for engines that keep a closed subscription
    /// around to serve republish after its session ended; the engine
    /// itself always lands in `Closed`.
    Terminated = 6,
}

impl SubscriptionState {
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, SubscriptionState::Closed | SubscriptionState::Terminated)
    }
}

/// Events emitted synchronously from state-transition sites.
#[derive(Debug, Clone)]
pub enum SubscriptionEvent {
    /// A notification message is about to be handed to the publish engine.
    Notification,
    /// A notification message was handed to the publish engine.
    NotificationMessage(NotificationMessage),
    /// A keep-alive was sent carrying the next expected sequence number.
    KeepAlive { future_sequence_number: u32 },
    /// The lifetime counter expired; a BadTimeout status change is queued.
    Expired,
    /// The subscription closed.
    Terminated,
    /// The state machine moved to a new state.
    StateChanged(SubscriptionState),
    /// A monitored item was created.
    MonitoredItemCreated {
        monitored_item_id: u32,
        item_to_monitor: ReadValueId,
    },
    /// A monitored item was removed.
    MonitoredItemRemoved { monitored_item_id: u32 },
}

/// What one publishing cycle did, so the scheduler can react.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing to do this cycle.
    Idle,
    /// One notification message was dispatched. `drain_again` asks for an
    /// immediate extra tick to drain the rest of the pending queue.
    MessageSent { drain_again: bool },
    KeepAliveSent,
    /// Material is waiting but no publish request was available.
    Late,
    /// The lifetime expired and the subscription terminated itself.
    Expired,
    /// The subscription is already in a terminal state.
    Closed,
}

/// Creation parameters. `None` timing fields take the engine defaults,
/// everything is clamped per Part 4 on the way in.
#[derive(Debug, Clone)]
pub struct SubscriptionOptions {
    pub id: u32,
    pub session_id: NodeId,
    pub priority: u8,
    pub publishing_interval_ms: Option<f64>,
    pub max_keep_alive_count: Option<u32>,
    pub life_time_count: Option<u32>,
    pub max_notifications_per_publish: u32,
    pub publishing_enabled: bool,
}

/// Parameters a Modify service call may revise.
#[derive(Debug, Clone, Default)]
pub struct ModifyOptions {
    pub publishing_interval_ms: Option<f64>,
    pub max_keep_alive_count: Option<u32>,
    pub life_time_count: Option<u32>,
    pub max_notifications_per_publish: Option<u32>,
    pub priority: Option<u8>,
}

/// Server-side subscription: publishing cycle, notification assembly,
/// publish-request reconciliation, keep-alives and retransmission.
///
/// All methods assume single-threaded access; the owning
/// [`crate::SubscriptionRunner`] serializes ticks and commands onto one
/// task. No lock is held across publish-engine calls, so an engine that
/// re-enters to deliver publish requests is tolerated.
pub struct Subscription {
    id: u32,
    session_id: NodeId,
    priority: u8,

    publishing_interval_ms: f64,
    max_keep_alive_count: u32,
    life_time_count: u32,
    max_notifications_per_publish: u32,

    publishing_enabled: bool,
    message_sent: bool,
    aborted: bool,
    state: SubscriptionState,

    keep_alive_counter: u32,
    life_time_counter: u32,
    publish_interval_count: u64,
    unacknowledged_message_count: u32,

    pending: VecDeque<NotificationMessage>,
    sent: RetransmissionQueue,
    monitored_items: BTreeMap<u32, Box<dyn MonitoredItem>>,

    sequence: SequenceNumberGenerator,
    item_ids: MonitoredItemIdGenerator,

    publish_engine: Arc<dyn PublishEngine>,
    address_space: Arc<dyn AddressSpace>,
    item_factory: Arc<dyn MonitoredItemFactory>,

    diagnostics: SubscriptionDiagnostics,
    events: broadcast::Sender<SubscriptionEvent>,

    /// Lazy cache over the items' `has_notifications`; reset on harvest.
    item_notifications_cached: bool,
}

impl Subscription {
    pub fn new(
        options: SubscriptionOptions,
        publish_engine: Arc<dyn PublishEngine>,
        address_space: Arc<dyn AddressSpace>,
        item_factory: Arc<dyn MonitoredItemFactory>,
        item_ids: MonitoredItemIdGenerator,
    ) -> Self {
        let publishing_interval_ms = adjust_publishing_interval(options.publishing_interval_ms);
        let max_keep_alive_count = adjust_max_keep_alive_count(options.max_keep_alive_count);
        let life_time_count = adjust_life_time_count(
            options.life_time_count,
            max_keep_alive_count,
            publishing_interval_ms,
        );
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let diagnostics = SubscriptionDiagnostics {
            next_sequence_number: 1,
            ..Default::default()
        };

        info!(
            subscription_id = options.id,
            publishing_interval_ms,
            max_keep_alive_count,
            life_time_count,
            max_notifications_per_publish = options.max_notifications_per_publish,
            "Subscription created"
        );

        Self {
            id: options.id,
            session_id: options.session_id,
            priority: options.priority,
            publishing_interval_ms,
            max_keep_alive_count,
            life_time_count,
            max_notifications_per_publish: options.max_notifications_per_publish,
            publishing_enabled: options.publishing_enabled,
            message_sent: false,
            aborted: false,
            state: SubscriptionState::Creating,
            keep_alive_counter: 0,
            life_time_counter: 0,
            publish_interval_count: 0,
            unacknowledged_message_count: 0,
            pending: VecDeque::new(),
            sent: RetransmissionQueue::new(),
            monitored_items: BTreeMap::new(),
            sequence: SequenceNumberGenerator::new(),
            item_ids,
            publish_engine,
            address_space,
            item_factory,
            diagnostics,
            events,
            item_notifications_cached: false,
        }
    }

    // -- queries ----------------------------------------------------------

    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub fn session_id(&self) -> &NodeId {
        &self.session_id
    }

    #[inline]
    pub fn priority(&self) -> u8 {
        self.priority
    }

    #[inline]
    pub fn state(&self) -> SubscriptionState {
        self.state
    }

    #[inline]
    pub fn publishing_interval_ms(&self) -> f64 {
        self.publishing_interval_ms
    }

    #[inline]
    pub fn max_keep_alive_count(&self) -> u32 {
        self.max_keep_alive_count
    }

    #[inline]
    pub fn life_time_count(&self) -> u32 {
        self.life_time_count
    }

    #[inline]
    pub fn max_notifications_per_publish(&self) -> u32 {
        self.max_notifications_per_publish
    }

    #[inline]
    pub fn publishing_enabled(&self) -> bool {
        self.publishing_enabled
    }

    #[inline]
    pub fn message_sent(&self) -> bool {
        self.message_sent
    }

    #[inline]
    pub fn aborted(&self) -> bool {
        self.aborted
    }

    #[inline]
    pub fn keep_alive_counter(&self) -> u32 {
        self.keep_alive_counter
    }

    #[inline]
    pub fn life_time_counter(&self) -> u32 {
        self.life_time_counter
    }

    #[inline]
    pub fn publish_interval_count(&self) -> u64 {
        self.publish_interval_count
    }

    #[inline]
    pub fn unacknowledged_message_count(&self) -> u32 {
        self.unacknowledged_message_count
    }

    #[inline]
    pub fn monitored_item_count(&self) -> usize {
        self.monitored_items.len()
    }

    #[inline]
    pub fn has_pending_notifications(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_messages(&self) -> impl Iterator<Item = &NotificationMessage> {
        self.pending.iter()
    }

    /// Sequence numbers retained for retransmission, oldest first.
    pub fn available_sequence_numbers(&self) -> Vec<u32> {
        self.sent.sequence_numbers()
    }

    /// Retained message lookup for the Republish service.
    pub fn retransmit(&self, sequence_number: u32) -> Option<&NotificationMessage> {
        self.sent.get(sequence_number)
    }

    /// Milliseconds until the lifetime counter would expire if no publish
    /// request ever arrives.
    pub fn time_to_expiration_ms(&self) -> f64 {
        f64::from(self.life_time_count.saturating_sub(self.life_time_counter))
            * self.publishing_interval_ms
    }

    pub fn diagnostics(&self) -> &SubscriptionDiagnostics {
        &self.diagnostics
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SubscriptionEvent> {
        self.events.subscribe()
    }

    /// True when any monitored item holds queued notifications. Cached
    /// positively between harvests so repeated checks inside one cycle do
    /// not rescan the item map.
    pub fn has_monitored_item_notifications(&mut self) -> bool {
        if self.item_notifications_cached {
            return true;
        }
        let found = self
            .monitored_items
            .values()
            .any(|item| item.has_notifications());
        self.item_notifications_cached = found;
        found
    }

    // -- publishing cycle -------------------------------------------------

    /// One publishing cycle, invoked every `publishing_interval_ms`.
    pub fn tick(&mut self) -> TickOutcome {
        if self.state.is_terminal() {
            return TickOutcome::Closed;
        }

        self.publish_engine.on_tick();

        let discarded = self.sent.discard_oldest();
        if discarded > 0 {
            self.unacknowledged_message_count = self
                .unacknowledged_message_count
                .saturating_sub(discarded as u32);
            self.diagnostics.discarded_message_count += discarded as u64;
            self.diagnostics.unacknowledged_message_count = self.unacknowledged_message_count;
            warn!(
                subscription_id = self.id,
                discarded, "Retransmission queue overflow, oldest messages dropped"
            );
        }

        self.publish_interval_count += 1;
        self.life_time_counter += 1;
        self.diagnostics.current_lifetime_count = self.life_time_counter;

        if self.life_time_counter >= self.life_time_count {
            self.expire();
            return TickOutcome::Expired;
        }

        let requests = self.publish_engine.pending_publish_request_count();

        if requests == 0
            && (self.has_pending_notifications() || self.has_monitored_item_notifications())
        {
            self.diagnostics.late_publish_request_count += 1;
            self.transition(SubscriptionState::Late);
            return TickOutcome::Late;
        }

        if requests > 0 {
            if self.publishing_enabled && !self.pending.is_empty() {
                return self.send_one();
            }
            if self.publishing_enabled && self.has_monitored_item_notifications() {
                self.harvest_monitored_items();
                if !self.pending.is_empty() {
                    return self.send_one();
                }
            }
            return self.process_keep_alive();
        }

        TickOutcome::Idle
    }

    /// Service a publish request that arrived while the subscription was
    /// LATE, without waiting for the next interval boundary.
    pub fn on_publish_request(&mut self) -> TickOutcome {
        if self.state != SubscriptionState::Late {
            return TickOutcome::Idle;
        }
        if self.publish_engine.pending_publish_request_count() == 0 {
            return TickOutcome::Idle;
        }
        if self.publishing_enabled && self.has_monitored_item_notifications() {
            self.harvest_monitored_items();
        }
        if self.publishing_enabled && !self.pending.is_empty() {
            return self.send_one();
        }
        self.process_keep_alive()
    }

    fn send_one(&mut self) -> TickOutcome {
        let Some(message) = self.pending.pop_front() else {
            return TickOutcome::Idle;
        };
        let sequence_number = message.sequence_number;

        self.sent.push(message.clone());
        self.unacknowledged_message_count += 1;
        self.diagnostics.unacknowledged_message_count = self.unacknowledged_message_count;
        self.diagnostics.notifications_count += message
            .notification_data
            .iter()
            .map(|d| d.entry_count() as u64)
            .sum::<u64>();

        let more_notifications = !self.pending.is_empty();
        self.emit(SubscriptionEvent::Notification);

        let consumed = self.publish_engine.send_notification_message(
            PublishedMessage {
                subscription_id: self.id,
                message: message.clone(),
                more_notifications,
                available_sequence_numbers: self.sent.sequence_numbers(),
            },
            false,
        );

        if !consumed {
            // The request pool drained between our check and the send. The
            // message stays in the retransmission queue; go LATE and wait.
            warn!(
                subscription_id = self.id,
                sequence_number, "Publish request vanished mid-send"
            );
            self.transition(SubscriptionState::Late);
            return TickOutcome::Late;
        }

        debug!(
            subscription_id = self.id,
            sequence_number, more_notifications, "Notification message dispatched"
        );

        self.message_sent = true;
        self.diagnostics.publish_request_count += 1;
        self.reset_life_time_and_keep_alive_counters();
        if !self.state.is_terminal() {
            self.transition(SubscriptionState::Normal);
        }
        self.emit(SubscriptionEvent::NotificationMessage(message));

        TickOutcome::MessageSent {
            drain_again: !self.pending.is_empty() && self.state == SubscriptionState::Normal,
        }
    }

    fn process_keep_alive(&mut self) -> TickOutcome {
        self.keep_alive_counter += 1;
        self.diagnostics.current_keep_alive_count = self.keep_alive_counter;

        // A keep-alive goes out on the first publishing cycle regardless of
        // the counter, so the client learns the subscription is alive.
        if self.message_sent && self.keep_alive_counter < self.max_keep_alive_count {
            return TickOutcome::Idle;
        }

        let future_sequence_number = self.sequence.future();
        if self
            .publish_engine
            .send_keep_alive_response(self.id, future_sequence_number)
        {
            debug!(
                subscription_id = self.id,
                future_sequence_number, "Keep-alive dispatched"
            );
            self.message_sent = true;
            self.diagnostics.publish_request_count += 1;
            self.transition(SubscriptionState::KeepAlive);
            self.reset_life_time_and_keep_alive_counters();
            self.emit(SubscriptionEvent::KeepAlive {
                future_sequence_number,
            });
            TickOutcome::KeepAliveSent
        } else {
            self.transition(SubscriptionState::Late);
            TickOutcome::Late
        }
    }

    /// Drain every monitored item and package the combined stream into
    /// sequenced notification messages.
    ///
    /// Chunking: each message carries up to `max_notifications_per_publish`
    /// data changes; once the data-change stream is exhausted the tail
    /// chunk also carries up to that many events, and remaining events fill
    /// further messages. Data changes precede events within a message.
    fn harvest_monitored_items(&mut self) {
        let mut data_changes = Vec::new();
        let mut events = Vec::new();
        for item in self.monitored_items.values_mut() {
            for notification in item.extract_notifications() {
                match notification {
                    QueuedNotification::DataChange(n) => data_changes.push(n),
                    QueuedNotification::Event(e) => events.push(e),
                }
            }
        }
        self.item_notifications_cached = false;

        if data_changes.is_empty() && events.is_empty() {
            return;
        }

        self.diagnostics.data_change_notifications_count += data_changes.len() as u64;
        self.diagnostics.event_notifications_count += events.len() as u64;

        let chunk_limit = if self.max_notifications_per_publish == 0 {
            usize::MAX
        } else {
            self.max_notifications_per_publish as usize
        };

        let mut data_changes = VecDeque::from(data_changes);
        let mut events = VecDeque::from(events);

        while !data_changes.is_empty() || !events.is_empty() {
            let mut payload = Vec::with_capacity(2);

            let take = chunk_limit.min(data_changes.len());
            if take > 0 {
                let monitored_items = data_changes.drain(..take).collect();
                payload.push(NotificationData::DataChange(DataChangeNotification {
                    monitored_items,
                }));
            }

            // Events ride along only once the data-change stream has run
            // dry inside this chunk.
            if data_changes.is_empty() && take < chunk_limit {
                let take = chunk_limit.min(events.len());
                if take > 0 {
                    let drained = events.drain(..take).collect();
                    payload.push(NotificationData::Events(EventNotificationList {
                        events: drained,
                    }));
                }
            }

            let sequence_number = self.sequence.next();
            self.diagnostics.next_sequence_number = self.sequence.future();
            self.pending
                .push_back(NotificationMessage::new(sequence_number, Utc::now(), payload));
        }

        debug!(
            subscription_id = self.id,
            pending = self.pending.len(),
            "Monitored items harvested"
        );
    }

    fn expire(&mut self) {
        warn!(
            subscription_id = self.id,
            life_time_count = self.life_time_count,
            "Subscription lifetime expired"
        );
        let sequence_number = self.sequence.next();
        self.diagnostics.next_sequence_number = self.sequence.future();
        self.pending.push_back(NotificationMessage::status_change(
            sequence_number,
            Utc::now(),
            StatusCode::BAD_TIMEOUT,
        ));
        self.emit(SubscriptionEvent::Expired);
        self.terminate();
    }

    // -- client operations ------------------------------------------------

    /// Acknowledge receipt of a previously sent notification message.
    pub fn acknowledge(&mut self, sequence_number: u32) -> StatusCode {
        let status = self.sent.acknowledge(sequence_number);
        if status.is_good() {
            self.unacknowledged_message_count = self.unacknowledged_message_count.saturating_sub(1);
            self.diagnostics.unacknowledged_message_count = self.unacknowledged_message_count;
            debug!(
                subscription_id = self.id,
                sequence_number, "Notification acknowledged"
            );
        }
        status
    }

    /// Revise timing parameters, reset both counters and ask the scheduler
    /// to restart its timer. Returns the revised values
    /// (interval, maxKeepAliveCount, lifeTimeCount).
    pub fn modify(&mut self, options: ModifyOptions) -> (f64, u32, u32) {
        // Omitted fields take the engine defaults, exactly as on create.
        self.publishing_interval_ms = adjust_publishing_interval(options.publishing_interval_ms);
        self.max_keep_alive_count = adjust_max_keep_alive_count(options.max_keep_alive_count);
        self.life_time_count = adjust_life_time_count(
            options.life_time_count,
            self.max_keep_alive_count,
            self.publishing_interval_ms,
        );
        if let Some(max) = options.max_notifications_per_publish {
            self.max_notifications_per_publish = max;
        }
        if let Some(priority) = options.priority {
            self.priority = priority;
        }

        self.reset_life_time_and_keep_alive_counters();
        self.diagnostics.modify_count += 1;

        info!(
            subscription_id = self.id,
            publishing_interval_ms = self.publishing_interval_ms,
            max_keep_alive_count = self.max_keep_alive_count,
            life_time_count = self.life_time_count,
            "Subscription modified"
        );

        (
            self.publishing_interval_ms,
            self.max_keep_alive_count,
            self.life_time_count,
        )
    }

    /// Enable or disable publishing. Disabling does not stop the cycle:
    /// ticks continue and only keep-alives go out.
    pub fn set_publishing_mode(&mut self, enabled: bool) -> StatusCode {
        if enabled {
            self.diagnostics.enable_count += 1;
        } else {
            self.diagnostics.disable_count += 1;
        }
        self.publishing_enabled = enabled;
        if !enabled && !self.state.is_terminal() {
            self.transition(SubscriptionState::Normal);
        }
        StatusCode::GOOD
    }

    /// The owning session reported an abort. Observable only; lifetime
    /// counting continues unchanged.
    pub fn set_aborted(&mut self) {
        self.aborted = true;
    }

    /// Hand this subscription to another session. The old session is told
    /// through an out-of-cycle GoodSubscriptionTransferred status change.
    pub fn transfer_to_session(&mut self, new_session_id: NodeId) {
        let sequence_number = self.sequence.next();
        self.diagnostics.next_sequence_number = self.sequence.future();
        let message = NotificationMessage::status_change(
            sequence_number,
            Utc::now(),
            StatusCode::GOOD_SUBSCRIPTION_TRANSFERRED,
        );
        self.publish_engine.send_notification_message(
            PublishedMessage {
                subscription_id: self.id,
                message,
                more_notifications: false,
                available_sequence_numbers: self.sent.sequence_numbers(),
            },
            true,
        );
        info!(
            subscription_id = self.id,
            old_session = %self.session_id,
            new_session = %new_session_id,
            "Subscription transferred"
        );
        self.session_id = new_session_id;
        self.aborted = false;
    }

    /// Stop the subscription: terminate and dispose every monitored item,
    /// close out diagnostics and notify the publish engine.
    pub fn terminate(&mut self) {
        if self.state.is_terminal() {
            return;
        }

        let item_ids: Vec<u32> = self.monitored_items.keys().copied().collect();
        for id in item_ids {
            if let Some(mut item) = self.monitored_items.remove(&id) {
                item.terminate();
                item.dispose();
                self.emit(SubscriptionEvent::MonitoredItemRemoved {
                    monitored_item_id: id,
                });
            }
        }
        self.diagnostics.monitored_item_count = 0;
        self.diagnostics.disabled_monitored_item_count = 0;
        self.item_notifications_cached = false;

        self.transition(SubscriptionState::Closed);
        info!(subscription_id = self.id, "Subscription terminated");
        self.emit(SubscriptionEvent::Terminated);
        self.publish_engine.on_close_subscription(self.id);
    }

    // -- monitored items --------------------------------------------------

    /// Validate and create a monitored item.
    ///
    /// The status-code ladder is fixed: unknown node, invalid attribute,
    /// invalid index range, misplaced data encoding, unsupported encoding,
    /// then the filter's own verdict.
    pub fn create_monitored_item(
        &mut self,
        request: &MonitoredItemCreateRequest,
    ) -> MonitoredItemCreateResult {
        let item_to_monitor = &request.item_to_monitor;

        let Some(node) = self.address_space.node(&item_to_monitor.node_id) else {
            return MonitoredItemCreateResult::error(StatusCode::BAD_NODE_ID_UNKNOWN);
        };

        let Ok(attribute) = AttributeId::try_from(item_to_monitor.attribute_id) else {
            return MonitoredItemCreateResult::error(StatusCode::BAD_ATTRIBUTE_ID_INVALID);
        };
        if attribute == AttributeId::Value && node.node_class != NodeClass::Variable {
            return MonitoredItemCreateResult::error(StatusCode::BAD_ATTRIBUTE_ID_INVALID);
        }

        if let Some(range) = item_to_monitor.index_range.as_deref() {
            if NumericRange::parse(range).is_err() {
                return MonitoredItemCreateResult::error(StatusCode::BAD_INDEX_RANGE_INVALID);
            }
        }

        if !item_to_monitor.data_encoding.is_empty() {
            if attribute != AttributeId::Value {
                return MonitoredItemCreateResult::error(StatusCode::BAD_DATA_ENCODING_INVALID);
            }
            if !is_supported_data_encoding(item_to_monitor) {
                return MonitoredItemCreateResult::error(
                    StatusCode::BAD_DATA_ENCODING_UNSUPPORTED,
                );
            }
        }

        let (filter_status, filter_result) = self
            .item_factory
            .validate_filter(item_to_monitor, &request.requested_parameters.filter);
        if !filter_status.is_good() {
            return MonitoredItemCreateResult::error(filter_status);
        }

        let monitored_item_id = self.item_ids.next_id();
        let revised_sampling_interval = adjust_sampling_interval(
            request.requested_parameters.sampling_interval,
            self.publishing_interval_ms,
            Some(&node),
        );
        let revised_queue_size = revise_queue_size(request.requested_parameters.queue_size);

        let mut item = self.item_factory.create(
            monitored_item_id,
            request,
            revised_sampling_interval,
            revised_queue_size,
        );
        item.set_node(item_to_monitor.node_id.clone());
        item.set_monitoring_mode(request.monitoring_mode);

        if request.monitoring_mode == MonitoringMode::Disabled {
            self.diagnostics.disabled_monitored_item_count += 1;
        }
        self.monitored_items.insert(monitored_item_id, item);
        self.diagnostics.monitored_item_count = self.monitored_items.len() as u32;

        debug!(
            subscription_id = self.id,
            monitored_item_id,
            node_id = %item_to_monitor.node_id,
            revised_sampling_interval,
            revised_queue_size,
            "Monitored item created"
        );
        self.emit(SubscriptionEvent::MonitoredItemCreated {
            monitored_item_id,
            item_to_monitor: item_to_monitor.clone(),
        });

        MonitoredItemCreateResult {
            status_code: StatusCode::GOOD,
            monitored_item_id,
            revised_sampling_interval,
            revised_queue_size,
            filter_result,
        }
    }

    /// Remove one monitored item.
    pub fn delete_monitored_item(&mut self, monitored_item_id: u32) -> StatusCode {
        let Some(mut item) = self.monitored_items.remove(&monitored_item_id) else {
            return StatusCode::BAD_MONITORED_ITEM_ID_INVALID;
        };
        if item.monitoring_mode() == MonitoringMode::Disabled {
            self.diagnostics.disabled_monitored_item_count =
                self.diagnostics.disabled_monitored_item_count.saturating_sub(1);
        }
        item.terminate();
        item.dispose();
        self.diagnostics.monitored_item_count = self.monitored_items.len() as u32;
        self.emit(SubscriptionEvent::MonitoredItemRemoved { monitored_item_id });
        StatusCode::GOOD
    }

    /// Change one item's monitoring mode.
    pub fn set_monitoring_mode(
        &mut self,
        monitored_item_id: u32,
        mode: MonitoringMode,
    ) -> StatusCode {
        let Some(item) = self.monitored_items.get_mut(&monitored_item_id) else {
            return StatusCode::BAD_MONITORED_ITEM_ID_INVALID;
        };
        let was_disabled = item.monitoring_mode() == MonitoringMode::Disabled;
        item.set_monitoring_mode(mode);
        let is_disabled = mode == MonitoringMode::Disabled;
        match (was_disabled, is_disabled) {
            (false, true) => self.diagnostics.disabled_monitored_item_count += 1,
            (true, false) => {
                self.diagnostics.disabled_monitored_item_count =
                    self.diagnostics.disabled_monitored_item_count.saturating_sub(1)
            }
            _ => {}
        }
        StatusCode::GOOD
    }

    /// Inject an already-built notification message onto the pending
    /// queue, numbering it with the subscription's generator.
    ///
    /// This is the seam condition sources and tests use to feed the
    /// pipeline without a sampler.
    pub fn enqueue_notification(&mut self, notification_data: Vec<NotificationData>) -> u32 {
        let sequence_number = self.sequence.next();
        self.diagnostics.next_sequence_number = self.sequence.future();
        self.pending.push_back(NotificationMessage::new(
            sequence_number,
            Utc::now(),
            notification_data,
        ));
        sequence_number
    }

    // -- internals --------------------------------------------------------

    fn reset_life_time_and_keep_alive_counters(&mut self) {
        self.life_time_counter = 0;
        self.keep_alive_counter = 0;
        self.diagnostics.current_lifetime_count = 0;
        self.diagnostics.current_keep_alive_count = 0;
    }

    fn transition(&mut self, next: SubscriptionState) {
        if self.state == next {
            return;
        }
        debug!(
            subscription_id = self.id,
            from = ?self.state,
            to = ?next,
            "Subscription state changed"
        );
        self.state = next;
        self.emit(SubscriptionEvent::StateChanged(next));
    }

    #[inline]
    fn emit(&self, event: SubscriptionEvent) {
        let _ = self.events.send(event);
    }
}

/// Value encodings the server knows how to produce. Only the standard
/// namespace-0 encodings qualify.
fn is_supported_data_encoding(item_to_monitor: &ReadValueId) -> bool {
    let encoding = &item_to_monitor.data_encoding;
    encoding.namespace_index == 0
        && matches!(encoding.name.as_ref(), "DefaultBinary" | "DefaultXml")
}

fn adjust_publishing_interval(requested: Option<f64>) -> f64 {
    let requested = requested.unwrap_or(DEFAULT_PUBLISHING_INTERVAL_MS);
    if !requested.is_finite() {
        return DEFAULT_PUBLISHING_INTERVAL_MS;
    }
    requested.clamp(MIN_PUBLISHING_INTERVAL_MS, MAX_PUBLISHING_INTERVAL_MS)
}

fn adjust_max_keep_alive_count(requested: Option<u32>) -> u32 {
    requested
        .unwrap_or(MIN_KEEP_ALIVE_COUNT)
        .clamp(MIN_KEEP_ALIVE_COUNT, MAX_KEEP_ALIVE_COUNT)
}

fn adjust_life_time_count(
    requested: Option<u32>,
    max_keep_alive_count: u32,
    publishing_interval_ms: f64,
) -> u32 {
    let floor_by_keep_alive = max_keep_alive_count.saturating_mul(3);
    let floor_by_duration = (MIN_LIFETIME_DURATION_MS / publishing_interval_ms).ceil() as u32;
    requested
        .unwrap_or(1)
        .max(1)
        .max(floor_by_keep_alive)
        .max(floor_by_duration)
}
