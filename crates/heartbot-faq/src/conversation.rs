//! Per-user chat transcript and follow-up context.
//!
//! [`ConversationSession::submit`] answers a message, appends the
//! `(You, message)` and `(HeartBot, reply)` turns in that order, and then
//! writes the whole transcript through the [`HistoryStore`].
//!
//! Appended turns are never rolled back. When the store write fails the
//! failure is logged and reported through [`Exchange::persisted`]; the next
//! successful save replaces the document with the full transcript anyway.

use std::sync::Arc;

use heartbot_types::{ConversationTurn, HistoryStore};
use tracing::warn;

use crate::responder::{Answer, FaqResponder};

/// Result of a submitted message.
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    /// The trimmed message as recorded in the transcript.
    pub question: String,
    pub answer: Answer,
    /// `false` when saving the transcript failed.
    pub persisted: bool,
}

pub struct ConversationSession {
    username: String,
    responder: FaqResponder,
    transcript: Vec<ConversationTurn>,
    context: String,
    store: Arc<dyn HistoryStore>,
}

impl ConversationSession {
    pub fn new(
        username: impl Into<String>,
        responder: FaqResponder,
        store: Arc<dyn HistoryStore>,
    ) -> Self {
        Self {
            username: username.into(),
            responder,
            transcript: Vec::new(),
            context: String::new(),
            store,
        }
    }

    /// Start from a previously saved transcript.
    pub fn with_transcript(mut self, transcript: Vec<ConversationTurn>) -> Self {
        self.transcript = transcript;
        self
    }

    /// Answer `raw` and record the exchange.
    ///
    /// Blank or whitespace-only input is ignored and returns `None`.
    pub fn submit(&mut self, raw: &str) -> Option<Exchange> {
        let question = raw.trim();
        if question.is_empty() {
            return None;
        }

        let answer = self.responder.answer(question, &self.context);
        if answer.outcome.is_confident() {
            self.context = answer.normalized.clone();
        }

        self.transcript.push(ConversationTurn::user(question));
        self.transcript.push(ConversationTurn::bot(answer.reply.clone()));

        let persisted = match self.store.save_transcript(&self.username, &self.transcript) {
            Ok(()) => true,
            Err(e) => {
                warn!(user = %self.username, error = %e, "failed to persist chat transcript");
                false
            }
        };

        Some(Exchange {
            question: question.to_string(),
            answer,
            persisted,
        })
    }

    /// Drop the in-memory transcript. Context and learned entries are kept.
    pub fn clear_transcript(&mut self) {
        self.transcript.clear();
    }

    pub fn transcript(&self) -> &[ConversationTurn] {
        &self.transcript
    }

    /// Normalized topic of the last confident match.
    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn responder(&self) -> &FaqResponder {
        &self.responder
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}
