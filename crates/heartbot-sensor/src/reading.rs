//! [`ReadingSession`] – the live BPM sampling state machine.
//!
//! ```text
//!   Idle ──sample──▶ Collecting ──sample──▶ … ──15th sample──▶ Complete
//!  (count 0)        (0 < count < 15)                        (count ≥ 15)
//! ```
//!
//! Each accepted sample is appended to the unbounded history (what gets
//! persisted) and to a display window holding the most recent 50 points.
//! The running mean is taken over the full history and classified with
//! [`BpmStatus::classify`]. Once complete, further input is a no-op.
//!
//! A session can be restored from a saved history, in which case it starts
//! in whichever state the restored count implies.
//!
//! # Example
//!
//! ```rust
//! use heartbot_sensor::reading::{IngestOutcome, ReadingSession, ReadingState};
//! use heartbot_types::BpmStatus;
//!
//! let mut session = ReadingSession::new();
//! assert!(matches!(session.ingest_line("BPM: 72.5"), IngestOutcome::Accepted(_)));
//! assert_eq!(session.state(), ReadingState::Collecting);
//! assert_eq!(session.average(), Some(72.5));
//! assert_eq!(session.status(), Some(BpmStatus::Normal));
//! ```

use std::collections::VecDeque;

use heartbot_types::BpmStatus;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::protocol::parse_bpm_line;

/// Samples collected before a session is complete.
pub const SAMPLE_CAP: usize = 15;
/// Points kept for live display.
pub const DISPLAY_WINDOW: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadingState {
    Idle,
    Collecting,
    Complete,
}

/// One accepted sample. `beat` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub beat: usize,
    pub bpm: f64,
}

/// What happened to a line or value fed to the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IngestOutcome {
    /// The input carried no valid sample.
    Ignored,
    /// Sample recorded; the session is still collecting.
    Accepted(Sample),
    /// Sample recorded and the session just reached its cap.
    Completed(Sample),
    /// The session was already complete; input dropped.
    Closed,
}

/// Snapshot for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReadingSummary {
    pub count: usize,
    pub last_bpm: f64,
    pub average_bpm: f64,
    pub status: BpmStatus,
}

#[derive(Debug, Clone)]
pub struct ReadingSession {
    cap: usize,
    window_len: usize,
    window: VecDeque<Sample>,
    history: Vec<f64>,
}

impl Default for ReadingSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadingSession {
    /// A fresh session with the standard cap and display window.
    pub fn new() -> Self {
        Self::with_limits(SAMPLE_CAP, DISPLAY_WINDOW)
    }

    /// A fresh session with custom limits. Both are raised to at least one.
    pub fn with_limits(cap: usize, window_len: usize) -> Self {
        let window_len = window_len.max(1);
        Self {
            cap: cap.max(1),
            window_len,
            window: VecDeque::with_capacity(window_len),
            history: Vec::new(),
        }
    }

    /// Rebuild a session from a saved history.
    pub fn restore(history: Vec<f64>) -> Self {
        Self::restore_with_limits(history, SAMPLE_CAP, DISPLAY_WINDOW)
    }

    pub fn restore_with_limits(history: Vec<f64>, cap: usize, window_len: usize) -> Self {
        let mut session = Self::with_limits(cap, window_len);
        let skip = history.len().saturating_sub(session.window_len);
        session.window = history
            .iter()
            .enumerate()
            .skip(skip)
            .map(|(i, &bpm)| Sample { beat: i + 1, bpm })
            .collect();
        session.history = history;
        debug!(
            count = session.count(),
            state = ?session.state(),
            "reading session restored"
        );
        session
    }

    /// Parse a raw sensor line and ingest the sample it carries, if any.
    pub fn ingest_line(&mut self, line: &str) -> IngestOutcome {
        if self.is_complete() {
            return IngestOutcome::Closed;
        }
        match parse_bpm_line(line) {
            Some(bpm) => self.ingest(bpm),
            None => IngestOutcome::Ignored,
        }
    }

    /// Ingest an already-parsed BPM value. Non-finite or negative values are
    /// ignored.
    pub fn ingest(&mut self, bpm: f64) -> IngestOutcome {
        if self.is_complete() {
            return IngestOutcome::Closed;
        }
        if !bpm.is_finite() || bpm < 0.0 {
            return IngestOutcome::Ignored;
        }

        self.history.push(bpm);
        let sample = Sample {
            beat: self.history.len(),
            bpm,
        };
        if self.window.len() == self.window_len {
            self.window.pop_front();
        }
        self.window.push_back(sample);

        if self.is_complete() {
            IngestOutcome::Completed(sample)
        } else {
            IngestOutcome::Accepted(sample)
        }
    }

    pub fn state(&self) -> ReadingState {
        match self.history.len() {
            0 => ReadingState::Idle,
            n if n < self.cap => ReadingState::Collecting,
            _ => ReadingState::Complete,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.state() == ReadingState::Complete
    }

    /// Number of samples recorded, including restored ones.
    pub fn count(&self) -> usize {
        self.history.len()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Samples still needed before the session completes.
    pub fn remaining(&self) -> usize {
        self.cap.saturating_sub(self.count())
    }

    /// Mean over the full history; `None` before the first sample.
    pub fn average(&self) -> Option<f64> {
        if self.history.is_empty() {
            None
        } else {
            Some(self.history.iter().sum::<f64>() / self.history.len() as f64)
        }
    }

    pub fn status(&self) -> Option<BpmStatus> {
        self.average().map(BpmStatus::classify)
    }

    pub fn last_bpm(&self) -> Option<f64> {
        self.history.last().copied()
    }

    pub fn summary(&self) -> Option<ReadingSummary> {
        let last_bpm = self.last_bpm()?;
        let average_bpm = self.average()?;
        Some(ReadingSummary {
            count: self.count(),
            last_bpm,
            average_bpm,
            status: BpmStatus::classify(average_bpm),
        })
    }

    /// The most recent points, oldest first.
    pub fn window(&self) -> impl ExactSizeIterator<Item = &Sample> {
        self.window.iter()
    }

    /// Every recorded BPM value, oldest first.
    pub fn history(&self) -> &[f64] {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(bpm: f64) -> String {
        format!("BPM: {bpm}")
    }

    #[test]
    fn starts_idle() {
        let s = ReadingSession::new();
        assert_eq!(s.state(), ReadingState::Idle);
        assert_eq!(s.count(), 0);
        assert_eq!(s.average(), None);
        assert_eq!(s.status(), None);
        assert!(s.summary().is_none());
    }

    #[test]
    fn single_line_example() {
        let mut s = ReadingSession::new();
        let outcome = s.ingest_line("BPM: 72.5");
        assert_eq!(outcome, IngestOutcome::Accepted(Sample { beat: 1, bpm: 72.5 }));
        assert_eq!(s.count(), 1);
        assert_eq!(s.average(), Some(72.5));
        assert_eq!(s.status(), Some(BpmStatus::Normal));
        assert_eq!(s.state(), ReadingState::Collecting);
    }

    #[test]
    fn malformed_lines_are_ignored() {
        let mut s = ReadingSession::new();
        assert_eq!(s.ingest_line("Sensor booting..."), IngestOutcome::Ignored);
        assert_eq!(s.ingest_line("BPM: 1.2.3"), IngestOutcome::Ignored);
        assert_eq!(s.state(), ReadingState::Idle);
    }

    #[test]
    fn cap_completes_exactly_once_and_sixteenth_is_noop() {
        let mut s = ReadingSession::new();
        let mut completions = 0;
        for i in 0..SAMPLE_CAP {
            match s.ingest_line(&line(70.0 + i as f64)) {
                IngestOutcome::Completed(sample) => {
                    completions += 1;
                    assert_eq!(sample.beat, SAMPLE_CAP);
                }
                IngestOutcome::Accepted(_) => {}
                other => panic!("unexpected outcome {other:?}"),
            }
        }
        assert_eq!(completions, 1);
        assert_eq!(s.state(), ReadingState::Complete);

        let history_before = s.history().to_vec();
        assert_eq!(s.ingest_line("BPM: 99"), IngestOutcome::Closed);
        assert_eq!(s.ingest(99.0), IngestOutcome::Closed);
        assert_eq!(s.count(), SAMPLE_CAP);
        assert_eq!(s.history(), history_before.as_slice());
    }

    #[test]
    fn display_window_never_exceeds_limit() {
        let mut s = ReadingSession::with_limits(200, DISPLAY_WINDOW);
        for i in 0..120 {
            s.ingest(60.0 + (i % 10) as f64);
            assert!(s.window().len() <= DISPLAY_WINDOW);
        }
        assert_eq!(s.window().len(), DISPLAY_WINDOW);
        assert_eq!(s.history().len(), 120);
        let beats: Vec<usize> = s.window().map(|p| p.beat).collect();
        assert_eq!(beats.first(), Some(&71));
        assert_eq!(beats.last(), Some(&120));
    }

    #[test]
    fn average_covers_full_history() {
        let mut s = ReadingSession::with_limits(10, 2);
        for bpm in [50.0, 60.0, 70.0, 80.0] {
            s.ingest(bpm);
        }
        assert_eq!(s.window().len(), 2);
        assert_eq!(s.average(), Some(65.0));
    }

    #[test]
    fn status_follows_mean() {
        let mut low = ReadingSession::new();
        low.ingest(59.9);
        assert_eq!(low.status(), Some(BpmStatus::Low));

        let mut high = ReadingSession::new();
        high.ingest(100.1);
        assert_eq!(high.status(), Some(BpmStatus::High));

        let mut edge = ReadingSession::new();
        edge.ingest(100.0);
        assert_eq!(edge.status(), Some(BpmStatus::Normal));
        edge.ingest(60.0);
        assert_eq!(edge.average(), Some(80.0));
    }

    #[test]
    fn invalid_values_are_ignored() {
        let mut s = ReadingSession::new();
        assert_eq!(s.ingest(f64::NAN), IngestOutcome::Ignored);
        assert_eq!(s.ingest(f64::INFINITY), IngestOutcome::Ignored);
        assert_eq!(s.ingest(-1.0), IngestOutcome::Ignored);
        assert_eq!(s.count(), 0);
    }

    #[test]
    fn restore_partial_history_resumes_collecting() {
        let mut s = ReadingSession::restore(vec![70.0, 72.0, 74.0]);
        assert_eq!(s.state(), ReadingState::Collecting);
        assert_eq!(s.count(), 3);
        assert_eq!(s.remaining(), 12);
        assert_eq!(s.average(), Some(72.0));

        let outcome = s.ingest_line("BPM: 76");
        assert_eq!(outcome, IngestOutcome::Accepted(Sample { beat: 4, bpm: 76.0 }));
    }

    #[test]
    fn restore_full_history_is_complete() {
        let mut s = ReadingSession::restore(vec![80.0; SAMPLE_CAP]);
        assert_eq!(s.state(), ReadingState::Complete);
        assert_eq!(s.ingest_line("BPM: 80"), IngestOutcome::Closed);
    }

    #[test]
    fn restore_empty_history_is_idle() {
        let s = ReadingSession::restore(Vec::new());
        assert_eq!(s.state(), ReadingState::Idle);
    }

    #[test]
    fn restore_keeps_last_window_points_numbered_from_one() {
        let history: Vec<f64> = (0..60).map(|i| 60.0 + i as f64).collect();
        let s = ReadingSession::restore_with_limits(history, 100, DISPLAY_WINDOW);
        assert_eq!(s.window().len(), DISPLAY_WINDOW);
        let first = s.window().next().unwrap();
        assert_eq!(first.beat, 11);
        assert_eq!(first.bpm, 70.0);
    }

    #[test]
    fn summary_reports_last_and_mean() {
        let mut s = ReadingSession::new();
        s.ingest(58.0);
        s.ingest(60.0);
        let summary = s.summary().unwrap();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.last_bpm, 60.0);
        assert_eq!(summary.average_bpm, 59.0);
        assert_eq!(summary.status, BpmStatus::Low);
    }
}
