use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::warn;

use crate::api::{ApiResult, Backend};
use crate::chat::{Transcript, FALLBACK_REPLY, SUGGESTED_QUESTIONS};
use crate::dispatch::Dispatcher;
use crate::view::{Presenter, ViewEvent};

#[derive(Debug)]
pub struct ChatReply {
    slot: usize,
    answer: ApiResult<String>,
}

/// Question/answer loop with the backend's typing assistant
pub struct ChatController<B: Backend> {
    backend: Arc<B>,
    dispatcher: Dispatcher<ChatReply>,
    transcript: Transcript,
}

impl<B: Backend> ChatController<B> {
    pub fn new(backend: Arc<B>, handle: Handle) -> Self {
        Self {
            backend,
            dispatcher: Dispatcher::new(handle),
            transcript: Transcript::new(),
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Show the welcome message
    pub fn open<P: Presenter + ?Sized>(&mut self, presenter: &mut P) {
        presenter.present(ViewEvent::Chat(self.transcript.messages().to_vec()));
    }

    /// Send a question. Blank queries are ignored; returns whether one was sent.
    pub fn ask<P: Presenter + ?Sized>(&mut self, query: &str, presenter: &mut P) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return false;
        }
        self.transcript.push_user(query);
        let slot = self.transcript.push_pending();
        presenter.present(ViewEvent::Chat(self.transcript.messages().to_vec()));
        presenter.present(ViewEvent::ClearInput);

        let backend = Arc::clone(&self.backend);
        let query = query.to_string();
        self.dispatcher.spawn(async move {
            ChatReply {
                slot,
                answer: backend.ask_chatbot(&query).await,
            }
        });
        true
    }

    /// Ask one of the suggested questions by its index
    pub fn ask_suggested<P: Presenter + ?Sized>(&mut self, index: usize, presenter: &mut P) -> bool {
        match SUGGESTED_QUESTIONS.get(index) {
            Some(question) => self.ask(question, presenter),
            None => false,
        }
    }

    pub fn poll<P: Presenter + ?Sized>(&mut self, presenter: &mut P) {
        for reply in self.dispatcher.drain() {
            self.apply(reply, presenter);
        }
    }

    pub async fn await_reply<P: Presenter + ?Sized>(&mut self, presenter: &mut P) -> bool {
        match self.dispatcher.next_reply().await {
            Some(reply) => {
                self.apply(reply, presenter);
                true
            }
            None => false,
        }
    }

    fn apply<P: Presenter + ?Sized>(&mut self, reply: ChatReply, presenter: &mut P) {
        let text = match reply.answer {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "chat query failed");
                FALLBACK_REPLY.to_string()
            }
        };
        if self.transcript.resolve(reply.slot, &text) {
            presenter.present(ViewEvent::Chat(self.transcript.messages().to_vec()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryBackend;
    use crate::chat::{Sender, PENDING_TEXT};

    #[tokio::test]
    async fn reply_replaces_pending_message() {
        let backend = Arc::new(MemoryBackend::new().with_chat_reply("Practice daily."));
        let mut ctl = ChatController::new(Arc::clone(&backend), Handle::current());
        let mut events: Vec<ViewEvent> = Vec::new();

        assert!(ctl.ask("  How can I improve my typing speed?  ", &mut events));
        let pending = ctl.transcript().messages().last().unwrap();
        assert_eq!(pending.text, PENDING_TEXT);

        ctl.await_reply(&mut events).await;
        let messages = ctl.transcript().messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].sender, Sender::User);
        assert_eq!(messages[2].text, "Practice daily.");
        assert!(!ctl.transcript().has_pending());
        assert_eq!(
            backend.chat_queries(),
            vec!["How can I improve my typing speed?".to_string()]
        );
    }

    #[tokio::test]
    async fn failure_uses_fallback_reply() {
        let mut ctl = ChatController::new(Arc::new(MemoryBackend::new()), Handle::current());
        let mut events: Vec<ViewEvent> = Vec::new();

        assert!(ctl.ask_suggested(3, &mut events));
        ctl.await_reply(&mut events).await;

        let messages = ctl.transcript().messages();
        assert_eq!(messages[1].text, "What is touch typing?");
        assert_eq!(messages[2].text, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn blank_query_is_ignored() {
        let backend = Arc::new(MemoryBackend::new());
        let mut ctl = ChatController::new(Arc::clone(&backend), Handle::current());
        let mut events: Vec<ViewEvent> = Vec::new();

        assert!(!ctl.ask("   ", &mut events));
        assert!(!ctl.ask_suggested(10, &mut events));
        assert!(events.is_empty());
        assert_eq!(ctl.transcript().messages().len(), 1);
        assert!(backend.chat_queries().is_empty());
    }
}
