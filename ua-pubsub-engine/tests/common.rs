//! Shared fixtures for the subscription engine integration tests.

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex, Once,
    },
};
use ua_pubsub_engine::{
    AddressSpace, EventFieldList, MonitoredItem, MonitoredItemCreateRequest, MonitoredItemFactory,
    MonitoredItemIdGenerator, MonitoredItemNotification, MonitoringFilter, MonitoringMode,
    NodeClass, NodeDescriptor, PublishEngine, PublishedMessage, QueuedNotification, ReadValueId,
    Subscription, SubscriptionOptions,
};
use ua_pubsub_types::{DataValue, NodeId, StatusCode, Variant};

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

/// Publish engine double: a settable pool of pending publish requests plus
/// a full record of everything the subscription handed over.
#[derive(Default)]
pub struct TestPublishEngine {
    pending: AtomicUsize,
    pub sent: Mutex<Vec<(PublishedMessage, bool)>>,
    pub keep_alives: Mutex<Vec<(u32, u32)>>,
    pub closed: Mutex<Vec<u32>>,
}

impl TestPublishEngine {
    pub fn with_requests(count: usize) -> Arc<Self> {
        let engine = Self::default();
        engine.pending.store(count, Ordering::SeqCst);
        Arc::new(engine)
    }

    /// Effectively inexhaustible request pool.
    pub fn unlimited() -> Arc<Self> {
        Self::with_requests(1_000_000)
    }

    pub fn add_requests(&self, count: usize) {
        self.pending.fetch_add(count, Ordering::SeqCst);
    }

    fn consume_request(&self) -> bool {
        self.pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    pub fn sent_messages(&self) -> Vec<(PublishedMessage, bool)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn keep_alive_count(&self) -> usize {
        self.keep_alives.lock().unwrap().len()
    }

    pub fn keep_alives(&self) -> Vec<(u32, u32)> {
        self.keep_alives.lock().unwrap().clone()
    }

    pub fn closed_subscriptions(&self) -> Vec<u32> {
        self.closed.lock().unwrap().clone()
    }
}

impl PublishEngine for TestPublishEngine {
    fn pending_publish_request_count(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    fn send_notification_message(&self, message: PublishedMessage, initial: bool) -> bool {
        // Out-of-cycle sends (transfer notifications) bypass the pool.
        if !initial && !self.consume_request() {
            return false;
        }
        self.sent.lock().unwrap().push((message, initial));
        true
    }

    fn send_keep_alive_response(&self, subscription_id: u32, future_sequence_number: u32) -> bool {
        if !self.consume_request() {
            return false;
        }
        self.keep_alives
            .lock()
            .unwrap()
            .push((subscription_id, future_sequence_number));
        true
    }

    fn on_close_subscription(&self, subscription_id: u32) {
        self.closed.lock().unwrap().push(subscription_id);
    }
}

pub type SharedQueue = Arc<Mutex<VecDeque<QueuedNotification>>>;

/// Monitored item double fed from a queue the test owns.
pub struct ScriptedItem {
    monitored_item_id: u32,
    client_handle: u32,
    mode: MonitoringMode,
    sampling_interval: f64,
    queue_size: u32,
    #[allow(dead_code)]
    node: Option<NodeId>,
    queue: SharedQueue,
    terminated: Arc<AtomicBool>,
    disposed: Arc<AtomicBool>,
}

impl MonitoredItem for ScriptedItem {
    fn monitored_item_id(&self) -> u32 {
        self.monitored_item_id
    }

    fn client_handle(&self) -> u32 {
        self.client_handle
    }

    fn monitoring_mode(&self) -> MonitoringMode {
        self.mode
    }

    fn sampling_interval(&self) -> f64 {
        self.sampling_interval
    }

    fn queue_size(&self) -> u32 {
        self.queue_size
    }

    fn has_notifications(&self) -> bool {
        !self.queue.lock().unwrap().is_empty()
    }

    fn extract_notifications(&mut self) -> Vec<QueuedNotification> {
        self.queue.lock().unwrap().drain(..).collect()
    }

    fn set_monitoring_mode(&mut self, mode: MonitoringMode) {
        self.mode = mode;
    }

    fn set_node(&mut self, node_id: NodeId) {
        self.node = Some(node_id);
    }

    fn terminate(&mut self) {
        self.terminated.store(true, Ordering::SeqCst);
    }

    fn dispose(&mut self) {
        self.disposed.store(true, Ordering::SeqCst);
    }
}

/// Factory double. All items it creates share one notification queue so
/// tests can inject after creation; filter validation is scriptable.
pub struct ScriptedItemFactory {
    pub queue: SharedQueue,
    pub filter_status: StatusCode,
    pub terminated: Arc<AtomicBool>,
    pub disposed: Arc<AtomicBool>,
}

impl Default for ScriptedItemFactory {
    fn default() -> Self {
        Self {
            queue: Arc::new(Mutex::new(VecDeque::new())),
            filter_status: StatusCode::GOOD,
            terminated: Arc::new(AtomicBool::new(false)),
            disposed: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl ScriptedItemFactory {
    pub fn rejecting(filter_status: StatusCode) -> Self {
        Self {
            filter_status,
            ..Self::default()
        }
    }

    pub fn push(&self, notification: QueuedNotification) {
        self.queue.lock().unwrap().push_back(notification);
    }

    pub fn item_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    pub fn item_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

impl MonitoredItemFactory for ScriptedItemFactory {
    fn validate_filter(
        &self,
        _item_to_monitor: &ReadValueId,
        _filter: &MonitoringFilter,
    ) -> (StatusCode, Variant) {
        (self.filter_status, Variant::Empty)
    }

    fn create(
        &self,
        monitored_item_id: u32,
        request: &MonitoredItemCreateRequest,
        revised_sampling_interval: f64,
        revised_queue_size: u32,
    ) -> Box<dyn MonitoredItem> {
        Box::new(ScriptedItem {
            monitored_item_id,
            client_handle: request.requested_parameters.client_handle,
            mode: request.monitoring_mode,
            sampling_interval: revised_sampling_interval,
            queue_size: revised_queue_size,
            node: None,
            queue: Arc::clone(&self.queue),
            terminated: Arc::clone(&self.terminated),
            disposed: Arc::clone(&self.disposed),
        })
    }
}

/// Fixed node directory.
#[derive(Default)]
pub struct StaticAddressSpace {
    nodes: HashMap<NodeId, NodeDescriptor>,
}

impl StaticAddressSpace {
    pub fn with_variable(node_id: NodeId) -> Arc<Self> {
        Self::with_node(
            node_id,
            NodeDescriptor {
                node_class: NodeClass::Variable,
                minimum_sampling_interval: None,
            },
        )
    }

    pub fn with_node(node_id: NodeId, descriptor: NodeDescriptor) -> Arc<Self> {
        Self::from_nodes(vec![(node_id, descriptor)])
    }

    pub fn from_nodes(entries: Vec<(NodeId, NodeDescriptor)>) -> Arc<Self> {
        Arc::new(Self {
            nodes: entries.into_iter().collect(),
        })
    }
}

impl AddressSpace for StaticAddressSpace {
    fn node(&self, node_id: &NodeId) -> Option<NodeDescriptor> {
        self.nodes.get(node_id).cloned()
    }
}

/// Builder for a subscription wired to the test doubles.
pub struct SubscriptionFixture {
    pub engine: Arc<TestPublishEngine>,
    pub factory: Arc<ScriptedItemFactory>,
    pub space: Arc<StaticAddressSpace>,
    pub subscription: Subscription,
}

pub const TEST_NODE: u32 = 4242;

pub fn variable_node_id() -> NodeId {
    NodeId::new_numeric(1, TEST_NODE)
}

pub fn fixture(engine: Arc<TestPublishEngine>, options: SubscriptionOptions) -> SubscriptionFixture {
    fixture_with_factory(engine, options, ScriptedItemFactory::default())
}

pub fn fixture_with_factory(
    engine: Arc<TestPublishEngine>,
    options: SubscriptionOptions,
    factory: ScriptedItemFactory,
) -> SubscriptionFixture {
    let space = StaticAddressSpace::with_variable(variable_node_id());
    fixture_with_space(engine, options, factory, space)
}

pub fn fixture_with_space(
    engine: Arc<TestPublishEngine>,
    options: SubscriptionOptions,
    factory: ScriptedItemFactory,
    space: Arc<StaticAddressSpace>,
) -> SubscriptionFixture {
    init_tracing();
    let factory = Arc::new(factory);
    let subscription = Subscription::new(
        options,
        Arc::clone(&engine) as Arc<dyn PublishEngine>,
        Arc::clone(&space) as Arc<dyn AddressSpace>,
        Arc::clone(&factory) as Arc<dyn MonitoredItemFactory>,
        MonitoredItemIdGenerator::new(),
    );
    SubscriptionFixture {
        engine,
        factory,
        space,
        subscription,
    }
}

pub fn options(id: u32) -> SubscriptionOptions {
    SubscriptionOptions {
        id,
        session_id: NodeId::new_string(1, "session-1"),
        priority: 0,
        publishing_interval_ms: Some(1000.0),
        max_keep_alive_count: Some(3),
        life_time_count: Some(9),
        max_notifications_per_publish: 0,
        publishing_enabled: true,
    }
}

pub fn data_change(client_handle: u32, value: f64) -> QueuedNotification {
    QueuedNotification::DataChange(MonitoredItemNotification {
        client_handle,
        value: DataValue::new_now(Variant::Double(value)),
    })
}

pub fn event(client_handle: u32) -> QueuedNotification {
    QueuedNotification::Event(EventFieldList {
        client_handle,
        event_fields: vec![Variant::from("ev")],
    })
}

/// Create one reporting monitored item on the fixture's variable node.
pub fn create_reporting_item(fx: &mut SubscriptionFixture) -> u32 {
    let request = MonitoredItemCreateRequest {
        item_to_monitor: ReadValueId::new_value(variable_node_id()),
        monitoring_mode: MonitoringMode::Reporting,
        requested_parameters: Default::default(),
    };
    let result = fx.subscription.create_monitored_item(&request);
    assert_eq!(result.status_code, StatusCode::GOOD);
    result.monitored_item_id
}
