//! The chat session: owns the conversation and drives one exchange at a time.

use std::sync::Arc;

use questro_types::{
    AssemblyOutcome, Attachment, ChatBackend, ChatRecord, ChatRequest, HistoryStore, Message,
    StoreError, derive_title,
};
use tokio_util::sync::CancellationToken;

use crate::cancel::{CancelHandle, CancelSlot};
use crate::error::SessionError;

/// A completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    /// The record the exchange was persisted to.
    pub chat_id: String,
    /// The full assistant reply.
    pub reply: String,
    /// Assembly counters for the reply stream.
    pub outcome: AssemblyOutcome,
}

/// One user's conversation with the chat backend.
///
/// `submit` takes `&mut self`, so at most one exchange is in flight per
/// session. While it streams, the last message is the assistant reply under
/// construction; if the exchange fails or its future is dropped, that
/// placeholder is removed and nothing is persisted.
pub struct ChatSession<B> {
    user_id: String,
    chat_id: Option<String>,
    messages: Vec<Message>,
    backend: B,
    store: Arc<dyn HistoryStore>,
    slot: CancelSlot,
}

impl<B: ChatBackend> ChatSession<B> {
    /// Start an empty conversation for `user_id`.
    pub fn new(user_id: impl Into<String>, backend: B, store: Arc<dyn HistoryStore>) -> Self {
        Self {
            user_id: user_id.into(),
            chat_id: None,
            messages: Vec::new(),
            backend,
            store,
            slot: CancelSlot::default(),
        }
    }

    /// The owning user.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// The persisted record this conversation writes to, once it has one.
    pub fn chat_id(&self) -> Option<&str> {
        self.chat_id.as_deref()
    }

    /// The conversation so far.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The history store backing this session.
    pub fn store(&self) -> &Arc<dyn HistoryStore> {
        &self.store
    }

    /// A handle that cancels the in-flight exchange from another task.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            slot: self.slot.clone(),
        }
    }

    /// Drop the current conversation and start a fresh one.
    pub fn new_chat(&mut self) {
        self.chat_id = None;
        self.messages.clear();
    }

    /// Load a persisted conversation and continue it.
    pub async fn open(&mut self, chat_id: &str) -> Result<(), SessionError> {
        let record = self
            .store
            .get(&self.user_id, chat_id)
            .await?
            .ok_or_else(|| StoreError::not_found(&self.user_id, chat_id))?;
        tracing::debug!(chat_id, messages = record.messages.len(), "opened chat");
        self.chat_id = Some(record.id);
        self.messages = record.messages;
        Ok(())
    }

    /// The user's saved conversations, newest first.
    pub async fn history(&self) -> Result<Vec<ChatRecord>, SessionError> {
        Ok(self.store.list(&self.user_id).await?)
    }

    /// Rename a saved conversation.
    pub async fn rename_chat(&self, chat_id: &str, title: &str) -> Result<(), SessionError> {
        Ok(self.store.rename(&self.user_id, chat_id, title).await?)
    }

    /// Delete a saved conversation. Deleting the open one starts a new chat.
    pub async fn delete_chat(&mut self, chat_id: &str) -> Result<(), SessionError> {
        self.store.delete(&self.user_id, chat_id).await?;
        if self.chat_id.as_deref() == Some(chat_id) {
            self.new_chat();
        }
        Ok(())
    }

    /// Delete every saved conversation of this user and start a new chat.
    pub async fn clear_history(&mut self) -> Result<(), SessionError> {
        self.store.clear(&self.user_id).await?;
        self.new_chat();
        Ok(())
    }

    /// Send a message and stream the reply.
    ///
    /// `on_delta` receives the cumulative reply text after every delta. On
    /// success the conversation is persisted once: a new record (titled from
    /// the first user message) or an update of the open one. On failure the
    /// placeholder is removed, nothing is persisted, and the error's
    /// [`user_message`](SessionError::user_message) is what to show.
    ///
    /// No retries: the user re-submits.
    pub async fn submit<F>(
        &mut self,
        text: &str,
        attachment: Option<Attachment>,
        mut on_delta: F,
    ) -> Result<Exchange, SessionError>
    where
        F: FnMut(&str) + Send,
    {
        let text = text.trim();
        if text.is_empty() && attachment.is_none() {
            return Err(SessionError::EmptyInput);
        }

        let mut user = Message::user(text);
        if let Some(attachment) = attachment {
            user = user.with_attachment(attachment);
        }
        self.messages.push(user);
        let request = ChatRequest::from_history(&self.messages);

        let token = CancellationToken::new();
        let mut in_flight = InFlight::begin(&mut self.messages, &self.slot, token.clone());
        tracing::debug!(messages = request.messages.len(), "submitting exchange");

        let result = {
            let mut sink = |reply: &str| {
                in_flight.set_reply(reply);
                on_delta(reply);
            };
            self.backend.stream_chat(&request, token, &mut sink).await
        };

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                drop(in_flight);
                tracing::warn!(error = %err, "exchange failed, reply discarded");
                return Err(err.into());
            }
        };
        in_flight.set_reply(&outcome.text);
        in_flight.commit();

        let chat_id = self.persist().await?;
        Ok(Exchange {
            chat_id,
            reply: outcome.text.clone(),
            outcome,
        })
    }

    async fn persist(&mut self) -> Result<String, SessionError> {
        let chat_id = match &self.chat_id {
            Some(id) => {
                self.store
                    .update_messages(&self.user_id, id, &self.messages)
                    .await?;
                id.clone()
            }
            None => {
                let title = derive_title(&self.messages);
                let record = self
                    .store
                    .create(&self.user_id, &title, &self.messages)
                    .await?;
                self.chat_id = Some(record.id.clone());
                record.id
            }
        };
        tracing::info!(%chat_id, messages = self.messages.len(), "exchange persisted");
        Ok(chat_id)
    }
}

/// The placeholder reply of one in-flight exchange.
///
/// Pushes the placeholder on creation and removes it on drop unless
/// committed. Also keeps the session's cancel slot armed for its lifetime.
struct InFlight<'a> {
    messages: &'a mut Vec<Message>,
    slot: &'a CancelSlot,
    committed: bool,
}

impl<'a> InFlight<'a> {
    fn begin(messages: &'a mut Vec<Message>, slot: &'a CancelSlot, token: CancellationToken) -> Self {
        messages.push(Message::placeholder());
        slot.arm(token);
        Self {
            messages,
            slot,
            committed: false,
        }
    }

    fn set_reply(&mut self, reply: &str) {
        if let Some(placeholder) = self.messages.last_mut() {
            placeholder.content.clear();
            placeholder.content.push_str(reply);
        }
    }

    fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.slot.disarm();
        if !self.committed {
            self.messages.pop();
        }
    }
}
