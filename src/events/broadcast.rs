//! In-process event bus on a tokio broadcast channel.

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::publisher::{EmailSentEvent, EventError, EventPublisher};

/// Fans `email_sent` events out to every current subscriber.
///
/// Publishing with no subscribers is not an error; the event is dropped.
/// Slow subscribers lose the oldest events once `capacity` is exceeded.
pub struct BroadcastPublisher {
    sender: broadcast::Sender<EmailSentEvent>,
}

impl BroadcastPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EmailSentEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl EventPublisher for BroadcastPublisher {
    async fn publish(&self, event: &EmailSentEvent) -> Result<(), EventError> {
        match self.sender.send(event.clone()) {
            Ok(receivers) => {
                tracing::trace!(receivers = receivers, "Broadcast email_sent event");
            }
            Err(_) => {
                tracing::trace!("No subscribers for email_sent event");
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailer::SendResult;
    use chrono::Utc;

    fn event() -> EmailSentEvent {
        EmailSentEvent::new(SendResult {
            recipient_id: None,
            recipient_name: "a@b.com".to_string(),
            recipient_email: "a@b.com".to_string(),
            subject: "Hi".to_string(),
            template_id: "welcome".to_string(),
            arguments: Default::default(),
            message_id: "<1@b.com>".to_string(),
            sent_at: Utc::now(),
        })
    }

    #[tokio::test]
    async fn test_subscribers_receive_event() {
        let publisher = BroadcastPublisher::new(8);
        let mut first = publisher.subscribe();
        let mut second = publisher.subscribe();
        assert_eq!(publisher.subscriber_count(), 2);

        publisher.publish(&event()).await.unwrap();

        assert_eq!(first.recv().await.unwrap().event, "email_sent");
        assert_eq!(second.recv().await.unwrap().result.template_id, "welcome");
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let publisher = BroadcastPublisher::new(8);
        assert!(publisher.publish(&event()).await.is_ok());
    }
}
