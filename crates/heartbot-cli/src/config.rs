//! Settings file – reads/writes `~/.heartbot/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use heartbot_faq::MatchConfig;
use heartbot_runtime::ServiceSettings;
use heartbot_sensor::SerialConfig;

/// Persisted user configuration stored in `~/.heartbot/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// User the dashboard signs in as. Asked for at startup when empty.
    #[serde(default)]
    pub username: String,

    /// Serial device of the heart-rate sensor board.
    #[serde(default = "default_serial_port")]
    pub serial_port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Wait after opening the port while the board resets.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// SQLite database holding chat transcripts and BPM histories.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Minimum cosine similarity for an FAQ answer.
    #[serde(default = "default_match_threshold")]
    pub match_threshold: f32,

    /// Remember unanswered questions for the rest of the session.
    #[serde(default = "default_learn_unmatched")]
    pub learn_unmatched: bool,

    /// Directory CSV exports are written to.
    #[serde(default = "default_export_dir")]
    pub export_dir: String,
}

fn default_serial_port() -> String {
    "/dev/ttyACM0".to_string()
}
fn default_baud_rate() -> u32 {
    9600
}
fn default_read_timeout_ms() -> u64 {
    2000
}
fn default_settle_delay_ms() -> u64 {
    2000
}
fn default_poll_interval_ms() -> u64 {
    100
}
fn default_database_path() -> String {
    config_dir().join("heartbot.db").display().to_string()
}
fn default_match_threshold() -> f32 {
    0.5
}
fn default_learn_unmatched() -> bool {
    true
}
fn default_export_dir() -> String {
    ".".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            username: String::new(),
            serial_port: default_serial_port(),
            baud_rate: default_baud_rate(),
            read_timeout_ms: default_read_timeout_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            database_path: default_database_path(),
            match_threshold: default_match_threshold(),
            learn_unmatched: default_learn_unmatched(),
            export_dir: default_export_dir(),
        }
    }
}

impl Config {
    /// Runtime settings derived from this file.
    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            matching: MatchConfig {
                threshold: self.match_threshold,
                learn_unmatched: self.learn_unmatched,
                ..MatchConfig::default()
            },
            serial: SerialConfig {
                port: self.serial_port.clone(),
                baud_rate: self.baud_rate,
                read_timeout: Duration::from_millis(self.read_timeout_ms),
                settle_delay: Duration::from_millis(self.settle_delay_ms),
            },
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            export_dir: PathBuf::from(&self.export_dir),
        }
    }
}

fn home_dir() -> String {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string())
}

/// `~/.heartbot`
pub fn config_dir() -> PathBuf {
    config_dir_for_home(&home_dir())
}

pub(crate) fn config_dir_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".heartbot")
}

/// Return the path to `~/.heartbot/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(&home_dir())
}

/// Build the config path relative to the given home directory.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    config_dir_for_home(home).join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

/// Load the config from a specific path.
pub(crate) fn load_from(path: &PathBuf) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config = toml::from_str(&raw)
        .map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `HEARTBOT_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `HEARTBOT_USERNAME` | `username` |
/// | `HEARTBOT_SERIAL_PORT` | `serial_port` |
/// | `HEARTBOT_BAUD_RATE` | `baud_rate` |
/// | `HEARTBOT_DATABASE` | `database_path` |
/// | `HEARTBOT_EXPORT_DIR` | `export_dir` |
/// | `HEARTBOT_MATCH_THRESHOLD` | `match_threshold` |
///
/// Values that do not parse are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("HEARTBOT_USERNAME") {
        cfg.username = v;
    }
    if let Ok(v) = std::env::var("HEARTBOT_SERIAL_PORT") {
        cfg.serial_port = v;
    }
    if let Ok(v) = std::env::var("HEARTBOT_BAUD_RATE")
        && let Ok(baud) = v.parse::<u32>()
    {
        cfg.baud_rate = baud;
    }
    if let Ok(v) = std::env::var("HEARTBOT_DATABASE") {
        cfg.database_path = v;
    }
    if let Ok(v) = std::env::var("HEARTBOT_EXPORT_DIR") {
        cfg.export_dir = v;
    }
    if let Ok(v) = std::env::var("HEARTBOT_MATCH_THRESHOLD")
        && let Ok(t) = v.parse::<f32>()
        && (-1.0..=1.0).contains(&t)
    {
        cfg.match_threshold = t;
    }
}

/// Save the config to disk, creating `~/.heartbot/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

/// Save the config to a specific path.
pub(crate) fn save_to(cfg: &Config, path: &PathBuf) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        // The directory also holds the history database.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| {
                use std::io::Write;
                f.write_all(raw.as_bytes())
            })
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn config_file_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        save_to(&Config::default(), &path).expect("save");

        let file_mode = std::fs::metadata(&path).expect("file metadata").permissions().mode() & 0o777;
        assert_eq!(file_mode, 0o600, "config file must have 0o600 permissions");

        let dir_meta = std::fs::metadata(path.parent().unwrap()).expect("dir metadata");
        assert_eq!(dir_meta.permissions().mode() & 0o777, 0o700);
    }

    #[test]
    fn roundtrip_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        let cfg = Config {
            username: "alice".to_string(),
            poll_interval_ms: 250,
            match_threshold: 0.65,
            ..Config::default()
        };
        save_to(&cfg, &path).expect("save");

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.username, "alice");
        assert_eq!(loaded.poll_interval_ms, 250);
        assert_eq!(loaded.settle_delay_ms, 2000);
        assert!((loaded.match_threshold - 0.65).abs() < f32::EPSILON);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let cfg: Config = toml::from_str("username = \"bob\"\n").expect("parse");
        assert_eq!(cfg.username, "bob");
        assert_eq!(cfg.serial_port, "/dev/ttyACM0");
        assert_eq!(cfg.read_timeout_ms, 2000);
        assert_eq!(cfg.poll_interval_ms, 100);
        assert!(cfg.learn_unmatched);
    }

    #[test]
    fn config_path_points_to_heartbot_dir() {
        let p = config_path_for_home("/home/testuser");
        assert_eq!(p, PathBuf::from("/home/testuser/.heartbot/config.toml"));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "baud_rate = \"fast\"").expect("write");
        assert!(load_from(&path).is_err());
    }

    #[test]
    fn service_settings_carry_config_values() {
        let cfg = Config {
            serial_port: "/dev/ttyUSB0".to_string(),
            settle_delay_ms: 0,
            poll_interval_ms: 25,
            learn_unmatched: false,
            export_dir: "/tmp/exports".to_string(),
            ..Config::default()
        };
        let s = cfg.service_settings();
        assert_eq!(s.serial.port, "/dev/ttyUSB0");
        assert_eq!(s.serial.settle_delay, Duration::ZERO);
        assert_eq!(s.poll_interval, Duration::from_millis(25));
        assert!(!s.matching.learn_unmatched);
        assert_eq!(s.matching.min_learn_len, 10);
        assert_eq!(s.export_dir, PathBuf::from("/tmp/exports"));
    }

    #[test]
    fn apply_env_overrides_changes_serial_port() {
        // SAFETY: no other test reads this variable.
        unsafe { std::env::set_var("HEARTBOT_SERIAL_PORT", "/dev/ttyS3") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.serial_port, "/dev/ttyS3");
        unsafe { std::env::remove_var("HEARTBOT_SERIAL_PORT") };
    }

    #[test]
    fn apply_env_overrides_changes_baud_rate() {
        // SAFETY: no other test reads this variable.
        unsafe { std::env::set_var("HEARTBOT_BAUD_RATE", "115200") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.baud_rate, 115200);
        unsafe { std::env::remove_var("HEARTBOT_BAUD_RATE") };
    }

    #[test]
    fn apply_env_overrides_ignores_out_of_range_threshold() {
        // SAFETY: no other test reads this variable.
        unsafe { std::env::set_var("HEARTBOT_MATCH_THRESHOLD", "3.5") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert!((cfg.match_threshold - 0.5).abs() < f32::EPSILON);
        unsafe { std::env::remove_var("HEARTBOT_MATCH_THRESHOLD") };
    }
}
