//! [`UserSession`] – everything one signed-in user owns: the chat
//! transcript and context, a private dynamic FAQ extension, and the BPM
//! reading session.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use chrono::{DateTime, Local, Utc};
use heartbot_faq::{ConversationSession, Exchange, FaqResponder};
use heartbot_sensor::export::write_csv;
use heartbot_sensor::{
    Monitor, MonitorExit, ReadingSession, ReadingSummary, Sample, SampleSource, SerialConfig,
    SerialSource,
};
use heartbot_types::{ConversationTurn, HeartbotError, HistoryStore};
use tracing::{info, warn};
use uuid::Uuid;

use crate::service::ServiceSettings;

pub struct UserSession {
    id: Uuid,
    username: String,
    opened_at: DateTime<Utc>,
    conversation: ConversationSession,
    readings: ReadingSession,
    store: Arc<dyn HistoryStore>,
    monitor: Monitor,
    serial: SerialConfig,
    export_dir: PathBuf,
}

impl UserSession {
    pub(crate) fn new(
        username: &str,
        responder: FaqResponder,
        transcript: Vec<ConversationTurn>,
        readings: Vec<f64>,
        store: Arc<dyn HistoryStore>,
        settings: &ServiceSettings,
    ) -> Self {
        let conversation = ConversationSession::new(username, responder, Arc::clone(&store))
            .with_transcript(transcript);
        Self {
            id: Uuid::new_v4(),
            username: username.to_string(),
            opened_at: Utc::now(),
            conversation,
            readings: ReadingSession::restore(readings),
            store,
            monitor: Monitor::new(settings.poll_interval),
            serial: settings.serial.clone(),
            export_dir: settings.export_dir.clone(),
        }
    }

    // ── Chat ────────────────────────────────────────────────────────────────

    /// Send a chat message. Blank input is ignored.
    pub fn chat(&mut self, text: &str) -> Option<Exchange> {
        self.conversation.submit(text)
    }

    // ── Monitoring ──────────────────────────────────────────────────────────

    /// Open the configured serial port and monitor until complete or stopped.
    ///
    /// A session that already holds a full history reports `Completed`
    /// without touching the port.
    pub fn connect_and_monitor<F>(
        &mut self,
        stop: &AtomicBool,
        on_sample: F,
    ) -> Result<MonitorExit, HeartbotError>
    where
        F: FnMut(&Sample, &ReadingSession),
    {
        if self.readings.is_complete() {
            info!(user = %self.username, "bpm history already complete, sensor not opened");
            return Ok(MonitorExit::Completed);
        }
        let mut source = SerialSource::open(&self.serial)?;
        self.run_monitor(&mut source, stop, on_sample)
    }

    /// Feed `source` into the reading session.
    ///
    /// Whenever the run added samples the history is saved, including runs
    /// cut short by a disconnect or the stop flag, so the next visit resumes
    /// where this one ended.
    ///
    /// # Errors
    ///
    /// The source's failure when it disconnects, otherwise a persistence
    /// failure of the history save.
    pub fn run_monitor<S, F>(
        &mut self,
        source: &mut S,
        stop: &AtomicBool,
        on_sample: F,
    ) -> Result<MonitorExit, HeartbotError>
    where
        S: SampleSource + ?Sized,
        F: FnMut(&Sample, &ReadingSession),
    {
        let before = self.readings.count();
        let result = self.monitor.run(source, &mut self.readings, stop, on_sample);
        let saved = if self.readings.count() > before {
            self.save_readings()
        } else {
            Ok(())
        };

        match result {
            Ok(exit) => {
                saved?;
                Ok(exit)
            }
            Err(e) => {
                if let Err(save_err) = saved {
                    warn!(user = %self.username, error = %save_err, "partial bpm history not saved");
                }
                Err(e.into())
            }
        }
    }

    fn save_readings(&self) -> Result<(), HeartbotError> {
        self.store
            .save_readings(&self.username, self.readings.history())?;
        info!(
            user = %self.username,
            count = self.readings.count(),
            "bpm history saved"
        );
        Ok(())
    }

    // ── Session lifecycle ───────────────────────────────────────────────────

    /// Clear the transcript and start a fresh reading session.
    ///
    /// Only in-memory state is reset. Learned FAQ entries and the follow-up
    /// context survive for the rest of the session.
    pub fn restart(&mut self) {
        self.conversation.clear_transcript();
        self.readings = ReadingSession::new();
        info!(session = %self.id, user = %self.username, "session restarted");
    }

    // ── Export ──────────────────────────────────────────────────────────────

    /// Export the BPM history to the configured directory.
    pub fn export_csv(&self) -> Result<PathBuf, HeartbotError> {
        self.export_csv_to(&self.export_dir, Local::now())
    }

    /// Export the BPM history into `dir` as
    /// `heartbot_<user>_<YYYYmmdd_HHMMSS>.csv`, stamped with `at`.
    ///
    /// # Errors
    ///
    /// [`HeartbotError::InvalidSession`] when there are no readings yet;
    /// otherwise I/O and CSV failures.
    pub fn export_csv_to(&self, dir: &Path, at: DateTime<Local>) -> Result<PathBuf, HeartbotError> {
        if self.readings.count() == 0 {
            return Err(HeartbotError::InvalidSession(
                "no BPM readings to export".to_string(),
            ));
        }
        fs::create_dir_all(dir).map_err(|e| {
            HeartbotError::Persistence(format!("cannot create {}: {e}", dir.display()))
        })?;

        let path = dir.join(export_file_name(&self.username, at));
        let file = fs::File::create(&path).map_err(|e| {
            HeartbotError::Persistence(format!("cannot create {}: {e}", path.display()))
        })?;
        write_csv(self.readings.history(), file)?;
        info!(user = %self.username, path = %path.display(), "bpm history exported");
        Ok(path)
    }

    // ── Accessors ───────────────────────────────────────────────────────────

    pub fn summary(&self) -> Option<ReadingSummary> {
        self.readings.summary()
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    pub fn transcript(&self) -> &[ConversationTurn] {
        self.conversation.transcript()
    }

    pub fn conversation(&self) -> &ConversationSession {
        &self.conversation
    }

    pub fn readings(&self) -> &ReadingSession {
        &self.readings
    }
}

/// Characters outside `[A-Za-z0-9_-]` in the username become `_`.
fn export_file_name(username: &str, at: DateTime<Local>) -> String {
    let user: String = username
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("heartbot_{user}_{}.csv", at.format("%Y%m%d_%H%M%S"))
}
