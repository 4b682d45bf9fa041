//! [`HeartBotService`] – process-wide state, constructed once and shared by
//! every [`UserSession`].
//!
//! The service owns the read-only static FAQ corpus, the encoder, the history
//! store and the settings. Opening a session restores the user's transcript
//! and BPM history from the store and gives the session a private copy of the
//! index to learn into.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use heartbot_faq::{
    EmbeddingIndex, Encoder, FaqResponder, MatchConfig, default_corpus, default_encoder,
};
use heartbot_sensor::SerialConfig;
use heartbot_sensor::monitor::DEFAULT_POLL_INTERVAL;
use heartbot_types::{FaqEntry, HeartbotError, HistoryStore};
use tracing::{info, warn};

use crate::session::UserSession;

/// Runtime settings shared by all sessions.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub matching: MatchConfig,
    pub serial: SerialConfig,
    pub poll_interval: Duration,
    /// Directory CSV exports are written to.
    pub export_dir: PathBuf,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            matching: MatchConfig::default(),
            serial: SerialConfig::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            export_dir: PathBuf::from("."),
        }
    }
}

pub struct HeartBotService {
    corpus: Arc<[FaqEntry]>,
    encoder: Arc<dyn Encoder>,
    store: Arc<dyn HistoryStore>,
    settings: ServiceSettings,
}

impl HeartBotService {
    /// Service over the built-in corpus and the all-MiniLM-L6-v2 sentence
    /// model, or the offline hashing encoder when the model cannot be loaded.
    pub fn new(store: Arc<dyn HistoryStore>, settings: ServiceSettings) -> Self {
        Self::with_encoder(store, settings, default_encoder())
    }

    /// Service over the built-in corpus and an explicit encoder.
    pub fn with_encoder(
        store: Arc<dyn HistoryStore>,
        settings: ServiceSettings,
        encoder: Arc<dyn Encoder>,
    ) -> Self {
        info!(dimension = encoder.dimension(), "faq encoder ready");
        Self {
            corpus: default_corpus().into(),
            encoder,
            store,
            settings,
        }
    }

    pub fn with_corpus(mut self, corpus: Vec<FaqEntry>) -> Self {
        self.corpus = corpus.into();
        self
    }

    /// Open a session for `username`, resuming any saved state.
    ///
    /// Load failures are logged and treated as "nothing saved" so a broken
    /// store never blocks the dashboard.
    ///
    /// # Errors
    ///
    /// [`HeartbotError::InvalidSession`] when `username` is blank.
    pub fn open_session(&self, username: &str) -> Result<UserSession, HeartbotError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(HeartbotError::InvalidSession(
                "a username is required".to_string(),
            ));
        }

        let transcript = self.store.load_transcript(username).unwrap_or_else(|e| {
            warn!(user = username, error = %e, "could not load chat transcript");
            Vec::new()
        });
        let readings = self.store.load_readings(username).unwrap_or_else(|e| {
            warn!(user = username, error = %e, "could not load bpm history");
            Vec::new()
        });

        let index = EmbeddingIndex::build(&self.corpus, Arc::clone(&self.encoder));
        let responder = FaqResponder::new(index, self.settings.matching.clone());
        let session = UserSession::new(
            username,
            responder,
            transcript,
            readings,
            Arc::clone(&self.store),
            &self.settings,
        );
        info!(
            session = %session.id(),
            user = username,
            turns = session.transcript().len(),
            readings = session.readings().count(),
            "session opened"
        );
        Ok(session)
    }

    pub fn corpus(&self) -> &[FaqEntry] {
        &self.corpus
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<dyn HistoryStore> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heartbot_faq::HashedEncoder;
    use heartbot_store::SqliteHistoryStore;
    use heartbot_types::ConversationTurn;

    fn offline(store: Arc<dyn HistoryStore>) -> HeartBotService {
        HeartBotService::with_encoder(
            store,
            ServiceSettings::default(),
            Arc::new(HashedEncoder::default()),
        )
    }

    fn service() -> HeartBotService {
        offline(Arc::new(SqliteHistoryStore::open_in_memory().unwrap()))
    }

    /// Store whose every call fails.
    struct BrokenStore;

    impl HistoryStore for BrokenStore {
        fn load_transcript(&self, _: &str) -> Result<Vec<ConversationTurn>, HeartbotError> {
            Err(HeartbotError::Persistence("disk gone".into()))
        }
        fn save_transcript(&self, _: &str, _: &[ConversationTurn]) -> Result<(), HeartbotError> {
            Err(HeartbotError::Persistence("disk gone".into()))
        }
        fn load_readings(&self, _: &str) -> Result<Vec<f64>, HeartbotError> {
            Err(HeartbotError::Persistence("disk gone".into()))
        }
        fn save_readings(&self, _: &str, _: &[f64]) -> Result<(), HeartbotError> {
            Err(HeartbotError::Persistence("disk gone".into()))
        }
    }

    #[test]
    fn blank_username_is_rejected() {
        let svc = service();
        assert!(matches!(
            svc.open_session("   "),
            Err(HeartbotError::InvalidSession(_))
        ));
    }

    #[test]
    fn session_starts_from_full_static_corpus() {
        let svc = service();
        let session = svc.open_session("alice").unwrap();
        assert_eq!(svc.corpus().len(), 28);
        assert_eq!(session.conversation().responder().index().len(), 28);
    }

    #[test]
    fn username_is_trimmed() {
        let svc = service();
        let session = svc.open_session("  alice ").unwrap();
        assert_eq!(session.username(), "alice");
    }

    #[test]
    fn broken_store_still_opens_an_empty_session() {
        let svc = offline(Arc::new(BrokenStore));
        let mut session = svc.open_session("alice").unwrap();
        assert!(session.transcript().is_empty());
        assert_eq!(session.readings().count(), 0);

        let exchange = session.chat("What is bpm?").unwrap();
        assert!(!exchange.persisted);
        assert_eq!(session.transcript().len(), 2);
    }

    #[test]
    fn custom_corpus_replaces_builtin() {
        let svc = service().with_corpus(vec![FaqEntry::new("Is coffee bad?", "In moderation, no.")]);
        let mut session = svc.open_session("alice").unwrap();
        let exchange = session.chat("is coffee bad").unwrap();
        assert_eq!(exchange.answer.reply, "In moderation, no.");
    }
}
