//! `heartbot-sensor` – heart-rate sensor acquisition.
//!
//! # Modules
//!
//! - [`protocol`] – parsing of the sensor's `BPM: <value>` text lines.
//! - [`reading`] – [`ReadingSession`][reading::ReadingSession]: the
//!   Idle → Collecting → Complete sampling state machine with a bounded
//!   display window, running mean and status.
//! - [`source`] – the [`SampleSource`][source::SampleSource] trait, the
//!   crate's [`SensorError`][source::SensorError], and a scripted source for
//!   tests and demos.
//! - [`serial`] – [`SerialSource`][serial::SerialSource]: the serial-port
//!   driver for the sensor board.
//! - [`monitor`] – [`Monitor`][monitor::Monitor]: the poll-driven loop that
//!   feeds a source into a session.
//! - [`export`] – CSV export of a BPM history.

pub mod export;
pub mod monitor;
pub mod protocol;
pub mod reading;
pub mod serial;
pub mod source;

pub use monitor::{Monitor, MonitorExit};
pub use reading::{IngestOutcome, ReadingSession, ReadingState, ReadingSummary, Sample};
pub use serial::{SerialConfig, SerialSource};
pub use source::{SampleSource, ScriptedSource, SensorError};
