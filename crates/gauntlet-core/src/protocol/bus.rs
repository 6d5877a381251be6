//! In-process agent message bus.
//!
//! Each registered agent owns a mailbox. `send` enqueues and returns
//! immediately; `receive` blocks up to a caller-specified deadline. The
//! transport contract is at-least-once delivery with exactly-once
//! observable processing: duplicate deliveries of the same correlation id
//! are dropped inside `receive`, keyed per recipient.
//!
//! `request` pairs a send with the wait for its response. Responses resolve
//! through a pending-response table rather than the sender's mailbox, so a
//! caller blocked in `request` never swallows unrelated traffic.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, Mutex as AsyncMutex, RwLock};
use tokio::time::Instant;

use super::envelope::{ActorId, AgentMessage, CorrelationId, MessagePayload};
use crate::error::{GauntletError, Result};

struct Mailbox {
    tx: mpsc::UnboundedSender<AgentMessage>,
    rx: AsyncMutex<mpsc::UnboundedReceiver<AgentMessage>>,
    /// Correlation ids already observed by this recipient.
    seen: Mutex<HashSet<CorrelationId>>,
}

impl Mailbox {
    fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: AsyncMutex::new(rx),
            seen: Mutex::new(HashSet::new()),
        }
    }
}

/// In-process mailbox registry implementing the A2A protocol.
#[derive(Default)]
pub struct AgentBus {
    mailboxes: RwLock<HashMap<ActorId, Arc<Mailbox>>>,
    /// Outstanding `request` calls awaiting a response by correlation id.
    pending: Mutex<HashMap<CorrelationId, oneshot::Sender<AgentMessage>>>,
}

impl AgentBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an agent, creating its mailbox. Registering twice replaces
    /// the mailbox and drops any queued messages.
    pub async fn register(&self, actor: &ActorId) {
        let mut mailboxes = self.mailboxes.write().await;
        mailboxes.insert(actor.clone(), Arc::new(Mailbox::new()));
    }

    async fn mailbox(&self, actor: &ActorId) -> Result<Arc<Mailbox>> {
        let mailboxes = self.mailboxes.read().await;
        mailboxes
            .get(actor)
            .cloned()
            .ok_or_else(|| GauntletError::UnknownRecipient(actor.to_string()))
    }

    /// Queues a message for its recipient and returns immediately.
    pub async fn send(&self, message: AgentMessage) -> Result<CorrelationId> {
        let correlation_id = message.correlation_id;
        let mailbox = self.mailbox(&message.recipient).await?;
        tracing::debug!(
            kind = message.payload.kind(),
            from = %message.sender,
            to = %message.recipient,
            correlation = %correlation_id,
            "queueing agent message"
        );
        mailbox
            .tx
            .send(message)
            .map_err(|_| GauntletError::internal("recipient mailbox closed"))?;
        Ok(correlation_id)
    }

    /// Blocks until a message arrives for `actor` or the timeout elapses.
    ///
    /// Duplicate deliveries (same correlation id, at-least-once transport)
    /// are dropped without resetting the caller's deadline.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolTimeout` when the deadline elapses with nothing to
    /// observe.
    pub async fn receive(&self, actor: &ActorId, timeout: Duration) -> Result<AgentMessage> {
        let mailbox = self.mailbox(actor).await?;
        let deadline = Instant::now() + timeout;
        let mut rx = mailbox.rx.lock().await;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(GauntletError::protocol_timeout(
                    actor.as_str(),
                    timeout.as_millis() as u64,
                ));
            }

            match tokio::time::timeout(remaining, rx.recv()).await {
                Ok(Some(message)) => {
                    let fresh = mailbox
                        .seen
                        .lock()
                        .expect("seen set lock poisoned")
                        .insert(message.correlation_id);
                    if fresh {
                        return Ok(message);
                    }
                    tracing::debug!(
                        correlation = %message.correlation_id,
                        recipient = %actor,
                        "dropping duplicate delivery"
                    );
                }
                Ok(None) => return Err(GauntletError::internal("mailbox channel closed")),
                Err(_) => {
                    return Err(GauntletError::protocol_timeout(
                        actor.as_str(),
                        timeout.as_millis() as u64,
                    ));
                }
            }
        }
    }

    /// Sends a response carrying the original's correlation id.
    ///
    /// If the original sender is blocked in [`AgentBus::request`] the
    /// response resolves that call directly; otherwise it lands in the
    /// sender's mailbox.
    pub async fn respond(
        &self,
        original: &AgentMessage,
        payload: MessagePayload,
    ) -> Result<CorrelationId> {
        let response = original.response(payload);
        let correlation_id = response.correlation_id;

        let waiter = self
            .pending
            .lock()
            .expect("pending table lock poisoned")
            .remove(&correlation_id);

        match waiter {
            Some(tx) => match tx.send(response) {
                Ok(()) => Ok(correlation_id),
                // The requester gave up (timeout) between our lookup and the
                // send; deliver to the mailbox so the response is not lost.
                Err(response) => self.send(response).await,
            },
            None => self.send(response).await,
        }
    }

    /// Sends a request and awaits its response.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolTimeout` if no response with the request's
    /// correlation id arrives within the deadline. Callers must treat the
    /// target agent as unavailable and fall back; this is recoverable.
    pub async fn request(&self, message: AgentMessage, timeout: Duration) -> Result<AgentMessage> {
        let recipient = message.recipient.clone();
        let correlation_id = message.correlation_id;
        let (tx, rx) = oneshot::channel();

        self.pending
            .lock()
            .expect("pending table lock poisoned")
            .insert(correlation_id, tx);

        if let Err(err) = self.send(message).await {
            self.pending
                .lock()
                .expect("pending table lock poisoned")
                .remove(&correlation_id);
            return Err(err);
        }

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(response)) => Ok(response),
            // Responder dropped without answering, or deadline elapsed:
            // either way the target is unavailable to the caller.
            Ok(Err(_)) | Err(_) => {
                self.pending
                    .lock()
                    .expect("pending table lock poisoned")
                    .remove(&correlation_id);
                Err(GauntletError::protocol_timeout(
                    recipient.as_str(),
                    timeout.as_millis() as u64,
                ))
            }
        }
    }
}
