//! Message delivery for consultation sessions

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

use crate::api::client::ApiClient;
use crate::api::consultations::post_message_data;
use crate::models::Message;

/// Delay before the simulated counterpart answers
pub const REPLY_DELAY: Duration = Duration::from_secs(2);

const CANNED_REPLIES: &[&str] = &[
    "Thank you, I have noted that. Could you tell me a little more?",
    "Understood. Do you have any documents related to this matter?",
    "That is helpful. Let me review the details and advise you.",
];

/// Carries outgoing messages away and incoming messages back.
pub trait MessageTransport: Send {
    /// Take the receiver for incoming messages. Can be taken once; later
    /// calls return a receiver that never yields.
    fn subscribe(&mut self) -> mpsc::UnboundedReceiver<Message>;

    fn deliver(&self, message: &Message) -> impl Future<Output = Result<()>> + Send;
}

/// Local counterpart that answers every message once after `REPLY_DELAY`.
pub struct SimulatedTransport {
    tx: mpsc::UnboundedSender<Message>,
    rx: Option<mpsc::UnboundedReceiver<Message>>,
    delay: Duration,
}

impl SimulatedTransport {
    pub fn new() -> Self {
        Self::with_delay(REPLY_DELAY)
    }

    pub fn with_delay(delay: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Some(rx),
            delay,
        }
    }

    fn reply_to(message: &Message) -> Message {
        let pick = message.text.chars().count() % CANNED_REPLIES.len();
        Message::new(message.sender.opposite(), CANNED_REPLIES[pick])
    }
}

impl Default for SimulatedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageTransport for SimulatedTransport {
    fn subscribe(&mut self) -> mpsc::UnboundedReceiver<Message> {
        self.rx.take().unwrap_or_else(|| mpsc::unbounded_channel().1)
    }

    fn deliver(&self, message: &Message) -> impl Future<Output = Result<()>> + Send {
        let tx = self.tx.clone();
        let reply = Self::reply_to(message);
        let deadline = Instant::now() + self.delay;

        tokio::spawn(async move {
            sleep_until(deadline).await;
            // Receiver gone means the session ended
            let _ = tx.send(reply);
        });

        async { Ok(()) }
    }
}

/// Posts messages to the backend consultation record. Produces no replies.
pub struct RemoteTransport {
    client: ApiClient,
    consultation_id: String,
}

impl RemoteTransport {
    pub fn new(client: ApiClient, consultation_id: impl Into<String>) -> Self {
        Self {
            client,
            consultation_id: consultation_id.into(),
        }
    }
}

impl MessageTransport for RemoteTransport {
    fn subscribe(&mut self) -> mpsc::UnboundedReceiver<Message> {
        // Sender dropped right away: the stream is closed and never yields
        mpsc::unbounded_channel().1
    }

    fn deliver(&self, message: &Message) -> impl Future<Output = Result<()>> + Send {
        let client = self.client.clone();
        let id = self.consultation_id.clone();
        let message = message.clone();
        async move {
            post_message_data(&client, &id, &message).await?;
            Ok(())
        }
    }
}
