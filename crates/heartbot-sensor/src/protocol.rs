//! Sensor line protocol.
//!
//! The heart-rate sensor prints free text, one line at a time. A line carries
//! a sample only if it contains `BPM:` followed by optional whitespace and a
//! decimal number, e.g. `"BPM: 72.5"`. Everything else (boot banners, blank
//! lines, partial writes) is ignored.

use std::sync::LazyLock;

use regex::Regex;

static BPM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"BPM:\s*([0-9.]+)").expect("BPM regex is valid"));

/// Extract the BPM value from a sensor line.
///
/// Returns `None` when the line has no `BPM:` marker or the number after it
/// does not parse (`"BPM: 1.2.3"`, `"BPM: ."`).
pub fn parse_bpm_line(line: &str) -> Option<f64> {
    let captures = BPM_RE.captures(line)?;
    captures.get(1)?.as_str().parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_sample() {
        assert_eq!(parse_bpm_line("BPM: 72.5"), Some(72.5));
        assert_eq!(parse_bpm_line("BPM:80"), Some(80.0));
    }

    #[test]
    fn parses_sample_embedded_in_text() {
        assert_eq!(parse_bpm_line("IBI: 812ms  BPM:   73.9 (ok)"), Some(73.9));
    }

    #[test]
    fn ignores_lines_without_marker() {
        assert_eq!(parse_bpm_line(""), None);
        assert_eq!(parse_bpm_line("Sensor ready"), None);
        assert_eq!(parse_bpm_line("bpm: 72"), None);
        assert_eq!(parse_bpm_line("BPM 72"), None);
    }

    #[test]
    fn ignores_marker_without_number() {
        assert_eq!(parse_bpm_line("BPM: --"), None);
        assert_eq!(parse_bpm_line("BPM: -72"), None);
    }

    #[test]
    fn ignores_unparseable_numbers() {
        assert_eq!(parse_bpm_line("BPM: 1.2.3"), None);
        assert_eq!(parse_bpm_line("BPM: ."), None);
    }
}
