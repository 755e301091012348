//! In-memory transport that records messages instead of sending them.

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::backend::{MailTransport, OutgoingMessage, TransportError};

/// Records every message it is given and returns a fixed message id.
///
/// No network I/O happens. Install it on a `Mailer` in tests to capture what
/// would have been sent.
pub struct RecordingTransport {
    message_id: String,
    failure: Option<String>,
    sent: Mutex<Vec<OutgoingMessage>>,
}

impl RecordingTransport {
    /// Accept every message, answering with `message_id`
    pub fn new(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            failure: None,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Reject every message with `reason`, still recording the attempt
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            message_id: String::new(),
            failure: Some(reason.into()),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Messages received so far, oldest first
    pub async fn sent(&self) -> Vec<OutgoingMessage> {
        self.sent.lock().await.clone()
    }

    /// The most recent message, if any
    pub async fn last(&self) -> Option<OutgoingMessage> {
        self.sent.lock().await.last().cloned()
    }

    pub async fn count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self::new("<recorded@localhost>")
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, message: &OutgoingMessage) -> Result<String, TransportError> {
        self.sent.lock().await.push(message.clone());

        tracing::debug!(
            to = %message.to_email,
            subject = %message.subject,
            "Recorded outgoing email"
        );

        match &self.failure {
            Some(reason) => Err(TransportError::DeliveryFailed(reason.clone())),
            None => Ok(self.message_id.clone()),
        }
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(subject: &str) -> OutgoingMessage {
        OutgoingMessage {
            to_email: "a@b.com".to_string(),
            to_name: "a@b.com".to_string(),
            subject: subject.to_string(),
            text: "Body".to_string(),
            html: None,
        }
    }

    #[tokio::test]
    async fn test_records_and_returns_id() {
        let transport = RecordingTransport::new("msg-1");

        let id = transport.send(&message("First")).await.unwrap();
        transport.send(&message("Second")).await.unwrap();

        assert_eq!(id, "msg-1");
        assert_eq!(transport.count().await, 2);
        assert_eq!(transport.last().await.unwrap().subject, "Second");
        assert_eq!(transport.sent().await[0].subject, "First");
    }

    #[tokio::test]
    async fn test_failing_transport() {
        let transport = RecordingTransport::failing("relay down");

        let err = transport.send(&message("Hi")).await.unwrap_err();
        assert!(matches!(err, TransportError::DeliveryFailed(ref msg) if msg == "relay down"));
        assert_eq!(transport.count().await, 1);
    }
}
