//! [`Monitor`] – the poll-driven sampling loop.
//!
//! Each iteration checks a stop flag, takes at most one line from the
//! [`SampleSource`], feeds it to the [`ReadingSession`] and then sleeps for
//! the poll interval. The loop ends when the session completes, when the
//! stop flag is raised, or when the source reports a disconnect.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, info, trace};

use crate::reading::{IngestOutcome, ReadingSession, Sample};
use crate::source::{SampleSource, SensorError};

/// Default pause between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Why [`Monitor::run`] returned normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorExit {
    /// The session reached its sample cap (or already had).
    Completed,
    /// The stop flag was raised before completion.
    Stopped,
}

#[derive(Debug, Clone)]
pub struct Monitor {
    poll_interval: Duration,
}

impl Default for Monitor {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl Monitor {
    pub fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    /// Drive `session` from `source` until it completes or is stopped.
    ///
    /// `on_sample` is called after every accepted sample with the updated
    /// session.
    ///
    /// # Errors
    ///
    /// Propagates the source's [`SensorError`] when it disconnects; samples
    /// accepted before that remain in `session`.
    pub fn run<S, F>(
        &self,
        source: &mut S,
        session: &mut ReadingSession,
        stop: &AtomicBool,
        mut on_sample: F,
    ) -> Result<MonitorExit, SensorError>
    where
        S: SampleSource + ?Sized,
        F: FnMut(&Sample, &ReadingSession),
    {
        if session.is_complete() {
            debug!(count = session.count(), "reading session already complete");
            return Ok(MonitorExit::Completed);
        }
        info!(
            source = source.name(),
            count = session.count(),
            cap = session.cap(),
            "monitoring started"
        );

        loop {
            if stop.load(Ordering::SeqCst) {
                info!(count = session.count(), "monitoring stopped");
                return Ok(MonitorExit::Stopped);
            }

            if let Some(line) = source.poll_line()? {
                match session.ingest_line(&line) {
                    IngestOutcome::Accepted(sample) => on_sample(&sample, session),
                    IngestOutcome::Completed(sample) => {
                        on_sample(&sample, session);
                        info!(count = session.count(), "reading session complete");
                        return Ok(MonitorExit::Completed);
                    }
                    IngestOutcome::Ignored => trace!(line = %line, "ignored sensor line"),
                    IngestOutcome::Closed => return Ok(MonitorExit::Completed),
                }
            }

            if !self.poll_interval.is_zero() {
                std::thread::sleep(self.poll_interval);
            }
        }
    }
}
