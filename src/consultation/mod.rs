//! Live consultation sessions
//!
//! A session owns one append-only message log. Outgoing messages are appended
//! as soon as they are sent; incoming ones are appended in arrival order.

pub mod cli;
pub mod transport;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::models::{Consultation, ConsultationStatus, Message, Sender};

pub use transport::{MessageTransport, RemoteTransport, SimulatedTransport};

#[derive(Debug, Error)]
pub enum ConsultationError {
    #[error("Message is empty")]
    EmptyMessage,
    #[error("Consultation has ended")]
    Ended,
    /// The message stays in the log even though delivery failed.
    #[error("Message could not be delivered: {0}")]
    Delivery(anyhow::Error),
}

pub struct ConsultationSession<T: MessageTransport> {
    consultation: Consultation,
    local: Sender,
    messages: Vec<Message>,
    status: ConsultationStatus,
    transport: T,
    incoming: Option<mpsc::UnboundedReceiver<Message>>,
}

impl ConsultationSession<SimulatedTransport> {
    pub fn simulated(consultation: Consultation, local: Sender) -> Self {
        Self::new(consultation, local, SimulatedTransport::new())
    }
}

impl<T: MessageTransport> ConsultationSession<T> {
    pub fn new(consultation: Consultation, local: Sender, mut transport: T) -> Self {
        let incoming = Some(transport.subscribe());
        Self {
            status: consultation.status,
            consultation,
            local,
            messages: Vec::new(),
            transport,
            incoming,
        }
    }

    pub fn consultation(&self) -> &Consultation {
        &self.consultation
    }

    pub fn local_sender(&self) -> Sender {
        self.local
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn status(&self) -> ConsultationStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == ConsultationStatus::Active
    }

    /// Append `text` as the local side and hand it to the transport.
    pub async fn send_message(&mut self, text: &str) -> Result<Message, ConsultationError> {
        if !self.is_active() {
            return Err(ConsultationError::Ended);
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(ConsultationError::EmptyMessage);
        }

        let message = Message::new(self.local, text);
        self.messages.push(message.clone());
        self.transport
            .deliver(&message)
            .await
            .map_err(ConsultationError::Delivery)?;
        Ok(message)
    }

    /// Wait for the next incoming message and append it.
    ///
    /// Pends forever once the transport is closed or the session ended, so
    /// it can sit in a `select!` next to other branches. Cancel safe.
    pub async fn next_incoming(&mut self) -> Message {
        loop {
            let Some(rx) = self.incoming.as_mut() else {
                return std::future::pending().await;
            };
            match rx.recv().await {
                Some(message) => {
                    self.messages.push(message.clone());
                    return message;
                }
                None => self.incoming = None,
            }
        }
    }

    /// Append whatever has already arrived without waiting. Returns how many.
    pub fn poll_incoming(&mut self) -> usize {
        let Some(rx) = self.incoming.as_mut() else {
            return 0;
        };
        let mut count = 0;
        while let Ok(message) = rx.try_recv() {
            self.messages.push(message);
            count += 1;
        }
        count
    }

    /// Mark the session completed. Replies still in flight are dropped.
    pub fn end(&mut self) {
        self.status = ConsultationStatus::Completed;
        self.incoming = None;
        tracing::info!("Consultation {} completed", self.consultation.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConsultationType;
    use std::time::Duration;

    fn consultation() -> Consultation {
        Consultation {
            id: "c-1".to_string(),
            lawyer_id: "l-1".to_string(),
            lawyer_name: Some("Ahmed".to_string()),
            client_id: Some("u-1".to_string()),
            consultation_type: ConsultationType::Chat,
            status: ConsultationStatus::Active,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_hello_gets_exactly_one_reply() {
        let mut session = ConsultationSession::simulated(consultation(), Sender::Client);

        session.send_message("hello").await.unwrap();
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].sender, Sender::Client);
        assert_eq!(session.messages()[0].text, "hello");

        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert_eq!(session.poll_incoming(), 0);

        let reply = session.next_incoming().await;
        assert_eq!(reply.sender, Sender::Lawyer);
        assert_eq!(session.messages().len(), 2);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(session.poll_incoming(), 0);
        assert_eq!(session.messages().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lawyer_side_gets_client_reply() {
        let mut session = ConsultationSession::simulated(consultation(), Sender::Lawyer);
        session.send_message("Please upload the contract").await.unwrap();
        let reply = session.next_incoming().await;
        assert_eq!(reply.sender, Sender::Client);
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let mut session = ConsultationSession::simulated(consultation(), Sender::Client);
        let err = session.send_message("   ").await.unwrap_err();
        assert!(matches!(err, ConsultationError::EmptyMessage));
        assert!(session.messages().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_after_end_rejected() {
        let mut session = ConsultationSession::simulated(consultation(), Sender::Client);
        session.send_message("hi").await.unwrap();
        session.end();
        assert_eq!(session.status(), ConsultationStatus::Completed);

        let err = session.send_message("still there?").await.unwrap_err();
        assert!(matches!(err, ConsultationError::Ended));

        // pending reply is dropped with the receiver
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(session.poll_incoming(), 0);
        assert_eq!(session.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_delivery_keeps_message() {
        use crate::api::client::{test_server, ApiClient};

        let client = ApiClient::new(test_server::dead_url().await, None);
        let transport = RemoteTransport::new(client, "c-1");
        let mut session = ConsultationSession::new(consultation(), Sender::Client, transport);

        let err = session.send_message("anyone?").await.unwrap_err();
        assert!(matches!(err, ConsultationError::Delivery(_)));
        assert_eq!(session.messages().len(), 1);
    }
}
