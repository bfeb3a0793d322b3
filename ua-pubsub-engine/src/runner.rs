use crate::{
    monitored_item::{MonitoredItemCreateRequest, MonitoredItemCreateResult, MonitoringMode},
    subscription::{ModifyOptions, Subscription, TickOutcome},
};
use std::time::Duration;
use tokio::{
    sync::{mpsc, oneshot},
    time::{self, Instant, Interval, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use ua_pubsub_error::{UaError, UaResult};
use ua_pubsub_types::{NodeId, StatusCode};

const COMMAND_CHANNEL_CAPACITY: usize = 64;

/// Operations delivered onto a subscription's serialization domain.
///
/// Everything that mutates a subscription travels through this channel so
/// ticks and cross-session operations interleave on a single task.
pub enum SubscriptionCommand {
    Modify {
        options: ModifyOptions,
        reply: oneshot::Sender<(f64, u32, u32)>,
    },
    SetPublishingMode {
        enabled: bool,
        reply: oneshot::Sender<StatusCode>,
    },
    Acknowledge {
        sequence_number: u32,
        reply: oneshot::Sender<StatusCode>,
    },
    CreateMonitoredItem {
        request: Box<MonitoredItemCreateRequest>,
        reply: oneshot::Sender<MonitoredItemCreateResult>,
    },
    DeleteMonitoredItem {
        monitored_item_id: u32,
        reply: oneshot::Sender<StatusCode>,
    },
    SetMonitoringMode {
        monitored_item_id: u32,
        mode: MonitoringMode,
        reply: oneshot::Sender<StatusCode>,
    },
    /// A publish request arrived; a LATE subscription services it at once.
    PublishRequestArrived,
    Transfer {
        new_session_id: NodeId,
    },
    SessionAborted,
    Terminate,
}

/// Cloneable command front for one running subscription.
#[derive(Clone)]
pub struct SubscriptionHandle {
    id: u32,
    tx: mpsc::Sender<SubscriptionCommand>,
}

impl SubscriptionHandle {
    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    pub async fn modify(&self, options: ModifyOptions) -> UaResult<(f64, u32, u32)> {
        let (reply, rx) = oneshot::channel();
        self.send(SubscriptionCommand::Modify { options, reply }).await?;
        rx.await
            .map_err(|_| UaError::ChannelClosed("subscription runner".into()))
    }

    pub async fn set_publishing_mode(&self, enabled: bool) -> UaResult<StatusCode> {
        let (reply, rx) = oneshot::channel();
        self.send(SubscriptionCommand::SetPublishingMode { enabled, reply })
            .await?;
        rx.await
            .map_err(|_| UaError::ChannelClosed("subscription runner".into()))
    }

    pub async fn acknowledge(&self, sequence_number: u32) -> UaResult<StatusCode> {
        let (reply, rx) = oneshot::channel();
        self.send(SubscriptionCommand::Acknowledge {
            sequence_number,
            reply,
        })
        .await?;
        rx.await
            .map_err(|_| UaError::ChannelClosed("subscription runner".into()))
    }

    pub async fn create_monitored_item(
        &self,
        request: MonitoredItemCreateRequest,
    ) -> UaResult<MonitoredItemCreateResult> {
        let (reply, rx) = oneshot::channel();
        self.send(SubscriptionCommand::CreateMonitoredItem {
            request: Box::new(request),
            reply,
        })
        .await?;
        rx.await
            .map_err(|_| UaError::ChannelClosed("subscription runner".into()))
    }

    pub async fn delete_monitored_item(&self, monitored_item_id: u32) -> UaResult<StatusCode> {
        let (reply, rx) = oneshot::channel();
        self.send(SubscriptionCommand::DeleteMonitoredItem {
            monitored_item_id,
            reply,
        })
        .await?;
        rx.await
            .map_err(|_| UaError::ChannelClosed("subscription runner".into()))
    }

    pub async fn set_monitoring_mode(
        &self,
        monitored_item_id: u32,
        mode: MonitoringMode,
    ) -> UaResult<StatusCode> {
        let (reply, rx) = oneshot::channel();
        self.send(SubscriptionCommand::SetMonitoringMode {
            monitored_item_id,
            mode,
            reply,
        })
        .await?;
        rx.await
            .map_err(|_| UaError::ChannelClosed("subscription runner".into()))
    }

    pub async fn publish_request_arrived(&self) -> UaResult<()> {
        self.send(SubscriptionCommand::PublishRequestArrived).await
    }

    pub async fn transfer(&self, new_session_id: NodeId) -> UaResult<()> {
        self.send(SubscriptionCommand::Transfer { new_session_id })
            .await
    }

    pub async fn session_aborted(&self) -> UaResult<()> {
        self.send(SubscriptionCommand::SessionAborted).await
    }

    pub async fn terminate(&self) -> UaResult<()> {
        self.send(SubscriptionCommand::Terminate).await
    }

    async fn send(&self, command: SubscriptionCommand) -> UaResult<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| UaError::ChannelClosed("subscription runner".into()))
    }
}

/// Owns a [`Subscription`] and drives its publishing cycle.
///
/// One runner task per subscription: interval ticks and commands are
/// processed on the same loop, which is the engine's whole concurrency
/// story — the state machine itself never needs a lock.
pub struct SubscriptionRunner {
    subscription: Subscription,
    rx: mpsc::Receiver<SubscriptionCommand>,
    cancel: CancellationToken,
}

impl SubscriptionRunner {
    /// Spawn the runner task and hand back its command front.
    pub fn spawn(subscription: Subscription, cancel: CancellationToken) -> SubscriptionHandle {
        let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let id = subscription.id();
        let runner = Self {
            subscription,
            rx,
            cancel,
        };
        tokio::spawn(runner.run());
        SubscriptionHandle { id, tx }
    }

    async fn run(mut self) {
        let mut interval = new_interval(self.subscription.publishing_interval_ms());

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    self.subscription.terminate();
                    return;
                }
                _ = interval.tick() => {
                    if self.drive(Subscription::tick) {
                        return;
                    }
                }
                maybe_cmd = self.rx.recv() => {
                    let Some(cmd) = maybe_cmd else {
                        self.subscription.terminate();
                        return;
                    };
                    if self.handle_command(cmd, &mut interval) {
                        return;
                    }
                }
            }
        }
    }

    /// Run one cycle entry point, then drain back-to-back while the core
    /// asks for immediate extra ticks. Returns true when the subscription
    /// reached a terminal state.
    fn drive(&mut self, entry: fn(&mut Subscription) -> TickOutcome) -> bool {
        let mut outcome = entry(&mut self.subscription);
        while matches!(outcome, TickOutcome::MessageSent { drain_again: true }) {
            outcome = self.subscription.tick();
        }
        matches!(outcome, TickOutcome::Expired | TickOutcome::Closed)
    }

    /// Returns true when the runner should exit.
    fn handle_command(&mut self, command: SubscriptionCommand, interval: &mut Interval) -> bool {
        match command {
            SubscriptionCommand::Modify { options, reply } => {
                let revised = self.subscription.modify(options);
                *interval = new_interval(self.subscription.publishing_interval_ms());
                let _ = reply.send(revised);
            }
            SubscriptionCommand::SetPublishingMode { enabled, reply } => {
                let _ = reply.send(self.subscription.set_publishing_mode(enabled));
            }
            SubscriptionCommand::Acknowledge {
                sequence_number,
                reply,
            } => {
                let _ = reply.send(self.subscription.acknowledge(sequence_number));
            }
            SubscriptionCommand::CreateMonitoredItem { request, reply } => {
                let _ = reply.send(self.subscription.create_monitored_item(&request));
            }
            SubscriptionCommand::DeleteMonitoredItem {
                monitored_item_id,
                reply,
            } => {
                let _ = reply.send(self.subscription.delete_monitored_item(monitored_item_id));
            }
            SubscriptionCommand::SetMonitoringMode {
                monitored_item_id,
                mode,
                reply,
            } => {
                let _ = reply.send(
                    self.subscription
                        .set_monitoring_mode(monitored_item_id, mode),
                );
            }
            SubscriptionCommand::PublishRequestArrived => {
                return self.drive(Subscription::on_publish_request);
            }
            SubscriptionCommand::Transfer { new_session_id } => {
                self.subscription.transfer_to_session(new_session_id);
            }
            SubscriptionCommand::SessionAborted => {
                self.subscription.set_aborted();
            }
            SubscriptionCommand::Terminate => {
                debug!(
                    subscription_id = self.subscription.id(),
                    "Terminate command received"
                );
                self.subscription.terminate();
                return true;
            }
        }
        false
    }
}

fn new_interval(publishing_interval_ms: f64) -> Interval {
    let period = Duration::from_millis(publishing_interval_ms.max(1.0) as u64);
    // Start one period out: the cycle runs at interval boundaries, not at
    // creation/modify time.
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}
