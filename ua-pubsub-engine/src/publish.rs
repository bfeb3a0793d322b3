use crate::notification::NotificationMessage;

/// A notification message as handed to the publish engine, together with
/// the response metadata the wire side needs.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedMessage {
    pub subscription_id: u32,
    pub message: NotificationMessage,
    /// More messages are already queued behind this one.
    pub more_notifications: bool,
    /// Current contents of the retransmission queue, oldest first.
    pub available_sequence_numbers: Vec<u32>,
}

/// The wire-side collaborator that owns the pool of pending publish
/// requests. May call back into the subscription while servicing a send
/// (e.g. to deliver a publish request that arrived mid-call), so
/// implementations and callers must not rely on exclusive access across
/// the call.
pub trait PublishEngine: Send + Sync {
    /// Number of publish requests currently waiting to be fulfilled.
    fn pending_publish_request_count(&self) -> usize;

    /// Fulfil one publish request with a notification message. Returns
    /// whether a request was actually consumed. `initial` marks
    /// out-of-cycle status sends (subscription transfer).
    fn send_notification_message(&self, message: PublishedMessage, initial: bool) -> bool;

    /// Fulfil one publish request with an empty keep-alive carrying the
    /// next sequence number to expect. Returns whether a request was
    /// consumed.
    fn send_keep_alive_response(&self, subscription_id: u32, future_sequence_number: u32) -> bool;

    /// The subscription has closed; drop any per-subscription state.
    fn on_close_subscription(&self, subscription_id: u32);

    /// Called once per subscription tick, before the cycle runs.
    fn on_tick(&self) {}
}
