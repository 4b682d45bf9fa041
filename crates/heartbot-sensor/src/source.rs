//! Generic `SampleSource` trait for anything that produces sensor lines.
//!
//! The [`Monitor`][crate::monitor::Monitor] only ever talks to this trait, so
//! the serial driver can be swapped for a scripted source in tests or demos.

use std::collections::VecDeque;
use std::io;

use heartbot_types::HeartbotError;
use thiserror::Error;

/// Errors raised by sensor sources and exports.
#[derive(Error, Debug)]
pub enum SensorError {
    #[error("failed to open sensor port {port}: {source}")]
    Connect {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("sensor {port} disconnected: {source}")]
    Disconnected {
        port: String,
        #[source]
        source: io::Error,
    },

    #[error("CSV export failed: {0}")]
    Export(#[from] csv::Error),
}

/// Device failures keep the port name. A failed export is a write of saved
/// data, so it surfaces as a persistence failure.
impl From<SensorError> for HeartbotError {
    fn from(e: SensorError) -> Self {
        match &e {
            SensorError::Connect { port, .. } | SensorError::Disconnected { port, .. } => {
                HeartbotError::Sensor {
                    device: port.clone(),
                    details: e.to_string(),
                }
            }
            SensorError::Export(_) => HeartbotError::Persistence(e.to_string()),
        }
    }
}

/// A non-blocking producer of sensor lines.
pub trait SampleSource {
    /// Human-readable identifier, e.g. the serial device path.
    fn name(&self) -> &str;

    /// Return the next complete line if one is available right now.
    ///
    /// `Ok(None)` means no data yet; callers poll again later.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::Disconnected`] once the source is gone.
    fn poll_line(&mut self) -> Result<Option<String>, SensorError>;
}

/// A source that replays a fixed script, then reports a disconnect.
///
/// Each script step is either a line or an empty poll (`None`).
pub struct ScriptedSource {
    name: String,
    steps: VecDeque<Option<String>>,
}

impl ScriptedSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: VecDeque::new(),
        }
    }

    /// Source that yields `lines` one per poll.
    pub fn from_lines<I, S>(name: impl Into<String>, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut source = Self::new(name);
        source.steps = lines.into_iter().map(|l| Some(l.into())).collect();
        source
    }

    pub fn push_line(&mut self, line: impl Into<String>) -> &mut Self {
        self.steps.push_back(Some(line.into()));
        self
    }

    /// Queue a poll that returns no data.
    pub fn push_idle(&mut self) -> &mut Self {
        self.steps.push_back(None);
        self
    }

    /// Steps not yet consumed.
    pub fn remaining(&self) -> usize {
        self.steps.len()
    }
}

impl SampleSource for ScriptedSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn poll_line(&mut self) -> Result<Option<String>, SensorError> {
        match self.steps.pop_front() {
            Some(step) => Ok(step),
            None => Err(SensorError::Disconnected {
                port: self.name.clone(),
                source: io::Error::new(io::ErrorKind::BrokenPipe, "script exhausted"),
            }),
        }
    }
}
