//! Broadcast bus for reply lifecycle events.
//!
//! Publishing with no active subscribers is a no-op.

use agentverse_types::reply::ReplyEvent;
use tokio::sync::broadcast;

/// Multi-consumer bus for `ReplyEvent`s. Cloning shares the channel.
#[derive(Clone)]
pub struct ReplyEventBus {
    sender: broadcast::Sender<ReplyEvent>,
}

impl ReplyEventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create a new subscriber that will receive all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<ReplyEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: ReplyEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for ReplyEventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl std::fmt::Debug for ReplyEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplyEventBus")
            .field("receiver_count", &self.sender.receiver_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentverse_types::agent::AgentId;
    use uuid::Uuid;

    fn cancelled() -> ReplyEvent {
        ReplyEvent::Cancelled {
            ticket_id: Uuid::now_v7(),
            agent_id: AgentId::new(),
        }
    }

    #[tokio::test]
    async fn subscribers_each_receive_event() {
        let bus = ReplyEventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(cancelled());

        assert!(matches!(rx1.recv().await.unwrap(), ReplyEvent::Cancelled { .. }));
        assert!(matches!(rx2.recv().await.unwrap(), ReplyEvent::Cancelled { .. }));
    }

    #[test]
    fn publish_without_subscribers_is_noop() {
        let bus = ReplyEventBus::default();
        bus.publish(cancelled());
    }

    #[test]
    fn clone_shares_channel() {
        let bus = ReplyEventBus::new(4);
        let mut rx = bus.subscribe();
        bus.clone().publish(cancelled());
        assert!(rx.try_recv().is_ok());
        assert!(format!("{bus:?}").contains("receiver_count"));
    }
}
