use crate::runner::SubscriptionHandle;
use dashmap::DashMap;
use tracing::info;
use ua_pubsub_types::{NodeId, StatusCode};

struct RegisteredSubscription {
    session_id: NodeId,
    handle: SubscriptionHandle,
}

/// Process-wide directory of running subscriptions.
///
/// Cross-subscription operations (session teardown, transfer) resolve
/// their targets here and are forwarded as commands onto each
/// subscription's own serialization domain.
#[derive(Default)]
pub struct SubscriptionRegistry {
    entries: DashMap<u32, RegisteredSubscription>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn register(&self, session_id: NodeId, handle: SubscriptionHandle) {
        self.entries.insert(
            handle.id(),
            RegisteredSubscription { session_id, handle },
        );
    }

    pub fn unregister(&self, subscription_id: u32) {
        self.entries.remove(&subscription_id);
    }

    pub fn get(&self, subscription_id: u32) -> Option<SubscriptionHandle> {
        self.entries
            .get(&subscription_id)
            .map(|entry| entry.handle.clone())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn subscription_ids_for_session(&self, session_id: &NodeId) -> Vec<u32> {
        self.entries
            .iter()
            .filter(|entry| entry.session_id == *session_id)
            .map(|entry| *entry.key())
            .collect()
    }

    /// Move a subscription to another session. The subscription notifies
    /// the old session itself.
    pub async fn transfer(&self, subscription_id: u32, new_session_id: NodeId) -> StatusCode {
        let handle = {
            let Some(mut entry) = self.entries.get_mut(&subscription_id) else {
                return StatusCode::BAD_SUBSCRIPTION_ID_INVALID;
            };
            entry.session_id = new_session_id.clone();
            entry.handle.clone()
        };
        match handle.transfer(new_session_id).await {
            Ok(()) => StatusCode::GOOD,
            Err(_) => StatusCode::BAD_SUBSCRIPTION_ID_INVALID,
        }
    }

    /// Terminate every subscription a closing session owns. Returns how
    /// many were told to stop.
    pub async fn terminate_session(&self, session_id: &NodeId) -> usize {
        let ids = self.subscription_ids_for_session(session_id);
        let mut terminated = 0;
        for id in ids {
            let handle = {
                let Some((_, entry)) = self.entries.remove(&id) else {
                    continue;
                };
                entry.handle
            };
            if handle.terminate().await.is_ok() {
                terminated += 1;
            }
        }
        if terminated > 0 {
            info!(
                session_id = %session_id,
                terminated, "Session subscriptions terminated"
            );
        }
        terminated
    }
}
