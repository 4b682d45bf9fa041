//! Serial-port [`SampleSource`] for the heart-rate sensor board.
//!
//! Opening the port fails fast: there is no retry or backoff. The port is
//! owned exclusively by [`SerialSource`] and released when it is dropped, on
//! every exit path of the monitoring loop.

use std::io::{ErrorKind, Read};
use std::time::Duration;

use serialport::SerialPort;
use tracing::{info, warn};

use crate::source::{SampleSource, SensorError};

/// Connection settings for the sensor board.
#[derive(Debug, Clone, PartialEq)]
pub struct SerialConfig {
    pub port: String,
    pub baud_rate: u32,
    pub read_timeout: Duration,
    /// Pause after opening while the board resets.
    pub settle_delay: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyACM0".to_string(),
            baud_rate: 9600,
            read_timeout: Duration::from_secs(2),
            settle_delay: Duration::from_secs(2),
        }
    }
}

/// Accumulates raw bytes and splits them into trimmed text lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn extend(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    /// Pop the next newline-terminated line. Invalid UTF-8 is replaced.
    pub fn next_line(&mut self) -> Option<String> {
        let end = self.pending.iter().position(|b| *b == b'\n')?;
        let raw: Vec<u8> = self.pending.drain(..=end).collect();
        Some(String::from_utf8_lossy(&raw).trim().to_string())
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

pub struct SerialSource {
    port_name: String,
    port: Box<dyn SerialPort>,
    buffer: LineBuffer,
}

impl SerialSource {
    /// Open the configured port and wait for the board to settle.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::Connect`] if the port cannot be opened.
    pub fn open(config: &SerialConfig) -> Result<Self, SensorError> {
        let port = serialport::new(&config.port, config.baud_rate)
            .timeout(config.read_timeout)
            .open()
            .map_err(|source| SensorError::Connect {
                port: config.port.clone(),
                source,
            })?;
        info!(port = %config.port, baud = config.baud_rate, "sensor port opened");
        if !config.settle_delay.is_zero() {
            std::thread::sleep(config.settle_delay);
        }
        Ok(Self {
            port_name: config.port.clone(),
            port,
            buffer: LineBuffer::default(),
        })
    }

    fn disconnected(&self, source: std::io::Error) -> SensorError {
        SensorError::Disconnected {
            port: self.port_name.clone(),
            source,
        }
    }
}

impl SampleSource for SerialSource {
    fn name(&self) -> &str {
        &self.port_name
    }

    fn poll_line(&mut self) -> Result<Option<String>, SensorError> {
        if let Some(line) = self.buffer.next_line() {
            return Ok(Some(line));
        }

        let available = self
            .port
            .bytes_to_read()
            .map_err(|e| self.disconnected(e.into()))?;
        if available == 0 {
            return Ok(None);
        }

        let mut chunk = vec![0u8; available as usize];
        match self.port.read(&mut chunk) {
            Ok(n) => self.buffer.extend(&chunk[..n]),
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {}
            Err(e) => return Err(self.disconnected(e)),
        }
        Ok(self.buffer.next_line())
    }
}

impl Drop for SerialSource {
    fn drop(&mut self) {
        if self.buffer.pending_len() > 0 {
            warn!(
                port = %self.port_name,
                bytes = self.buffer.pending_len(),
                "discarding partial sensor line"
            );
        }
        info!(port = %self.port_name, "sensor port closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_buffer_splits_on_newline() {
        let mut buf = LineBuffer::default();
        buf.extend(b"BPM: 7");
        assert_eq!(buf.next_line(), None);

        buf.extend(b"2.5\r\nBPM: 80\nBP");
        assert_eq!(buf.next_line().as_deref(), Some("BPM: 72.5"));
        assert_eq!(buf.next_line().as_deref(), Some("BPM: 80"));
        assert_eq!(buf.next_line(), None);
        assert_eq!(buf.pending_len(), 2);
    }

    #[test]
    fn line_buffer_replaces_invalid_utf8() {
        let mut buf = LineBuffer::default();
        buf.extend(&[0xff, b'B', b'P', b'M', b':', b' ', b'7', b'0', b'\n']);
        let line = buf.next_line().unwrap();
        assert!(line.ends_with("BPM: 70"));
    }

    #[test]
    fn opening_missing_port_fails_fast() {
        let config = SerialConfig {
            port: "/dev/heartbot-does-not-exist".to_string(),
            settle_delay: Duration::ZERO,
            ..SerialConfig::default()
        };
        match SerialSource::open(&config) {
            Err(SensorError::Connect { port, .. }) => {
                assert_eq!(port, "/dev/heartbot-does-not-exist")
            }
            Err(other) => panic!("unexpected error {other}"),
            Ok(_) => panic!("port should not open"),
        }
    }

    #[test]
    fn default_config_matches_sensor_firmware() {
        let config = SerialConfig::default();
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.read_timeout, Duration::from_secs(2));
    }
}
