//! Actor-level tests: the runner drives ticks on a real timer and
//! serializes commands with them.

mod common;

use common::*;
use std::{sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;
use ua_pubsub_engine::{
    ModifyOptions, MonitoredItemCreateRequest, MonitoringMode, ReadValueId, SubscriptionRegistry,
    SubscriptionRunner,
};
use ua_pubsub_types::{NodeId, StatusCode};

fn spawn_fixture(
    engine: Arc<TestPublishEngine>,
    id: u32,
    cancel: CancellationToken,
) -> ua_pubsub_engine::SubscriptionHandle {
    let mut opts = options(id);
    opts.publishing_interval_ms = Some(100.0);
    let fx = fixture(engine, opts);
    SubscriptionRunner::spawn(fx.subscription, cancel)
}

#[tokio::test(start_paused = true)]
async fn runner_emits_keep_alives_on_the_publishing_interval() {
    let engine = TestPublishEngine::unlimited();
    let cancel = CancellationToken::new();
    let handle = spawn_fixture(Arc::clone(&engine), 1, cancel.clone());

    // First cycle fires one interval after spawn.
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(engine.keep_alive_count(), 1);
    assert_eq!(engine.keep_alives(), vec![(1, 1)]);

    // maxKeepAliveCount = 3: the next keep-alive lands three cycles later.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(engine.keep_alive_count(), 2);

    cancel.cancel();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(engine.closed_subscriptions(), vec![1]);
    // The runner is gone; commands fail cleanly.
    assert!(handle.acknowledge(1).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn commands_are_serialized_with_the_cycle() {
    let engine = TestPublishEngine::unlimited();
    let cancel = CancellationToken::new();
    let handle = spawn_fixture(Arc::clone(&engine), 2, cancel.clone());

    let result = handle
        .create_monitored_item(MonitoredItemCreateRequest {
            item_to_monitor: ReadValueId::new_value(variable_node_id()),
            monitoring_mode: MonitoringMode::Reporting,
            requested_parameters: Default::default(),
        })
        .await
        .unwrap();
    assert_eq!(result.status_code, StatusCode::GOOD);

    let (interval, keep_alive, _) = handle
        .modify(ModifyOptions {
            publishing_interval_ms: Some(60.0),
            max_keep_alive_count: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(interval, 60.0);
    assert_eq!(keep_alive, 2);

    assert_eq!(
        handle.set_publishing_mode(false).await.unwrap(),
        StatusCode::GOOD
    );
    assert_eq!(
        handle.acknowledge(99).await.unwrap(),
        StatusCode::BAD_SEQUENCE_NUMBER_UNKNOWN
    );
    assert_eq!(
        handle.delete_monitored_item(result.monitored_item_id).await.unwrap(),
        StatusCode::GOOD
    );

    handle.terminate().await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(engine.closed_subscriptions(), vec![2]);
}

#[tokio::test(start_paused = true)]
async fn registry_routes_session_teardown_and_transfer() {
    let engine = TestPublishEngine::unlimited();
    let cancel = CancellationToken::new();
    let registry = SubscriptionRegistry::new();

    let session_a = NodeId::new_string(1, "session-a");
    let session_b = NodeId::new_string(1, "session-b");

    for id in [10, 11] {
        let handle = spawn_fixture(Arc::clone(&engine), id, cancel.clone());
        registry.register(session_a.clone(), handle);
    }
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.subscription_ids_for_session(&session_a).len(), 2);

    // Transfer one subscription to another session.
    assert_eq!(
        registry.transfer(10, session_b.clone()).await,
        StatusCode::GOOD
    );
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(registry.subscription_ids_for_session(&session_b), vec![10]);
    let transferred: Vec<_> = engine
        .sent_messages()
        .into_iter()
        .filter(|(m, initial)| {
            *initial
                && m.message
                    .is_status_change(StatusCode::GOOD_SUBSCRIPTION_TRANSFERRED)
        })
        .collect();
    assert_eq!(transferred.len(), 1);

    assert_eq!(
        registry.transfer(999, session_b).await,
        StatusCode::BAD_SUBSCRIPTION_ID_INVALID
    );

    // Tearing down session A only stops its remaining subscription.
    assert_eq!(registry.terminate_session(&session_a).await, 1);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(engine.closed_subscriptions(), vec![11]);
    assert_eq!(registry.len(), 1);
}
