//! REPL – Read-Eval-Print Loop for the HeartBot dashboard.
//!
//! Plain text is sent to the FAQ chatbot. Supported slash-commands:
//!   /help          – show this list
//!   /monitor       – read BPM samples from the sensor until the measurement completes
//!   /status        – latest reading, average and status
//!   /history [n]   – show the chat transcript (last `n` messages)
//!   /export        – write the BPM history to a CSV file
//!   /restart       – clear the chat and start a new measurement
//!   /settings      – interactively edit `~/.heartbot/config.toml`
//!   /quit | /exit  – exit the dashboard

use colored::{ColoredString, Colorize};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use heartbot_runtime::UserSession;
use heartbot_sensor::{MonitorExit, ReadingSession, ReadingSummary, Sample};
use heartbot_types::{BpmStatus, Speaker};

use crate::config::{self, Config};

/// Flags shared with the Ctrl-C handler.
#[derive(Debug, Clone, Default)]
pub struct Signals {
    pub shutdown: Arc<AtomicBool>,
    /// Set while `/monitor` is running.
    pub monitoring: Arc<AtomicBool>,
    pub stop_monitor: Arc<AtomicBool>,
}

/// A parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Monitor,
    Status,
    History(Option<usize>),
    Export,
    Restart,
    Settings,
    Quit,
    Chat(String),
    Unknown(String),
}

/// Anything not starting with `/` is a chat message.
pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if !line.starts_with('/') {
        return Command::Chat(line.to_string());
    }
    let mut parts = line.split_whitespace();
    let name = parts.next().unwrap_or_default();
    match name {
        "/help" => Command::Help,
        "/monitor" => Command::Monitor,
        "/status" => Command::Status,
        "/history" => match parts.next() {
            None => Command::History(None),
            Some(n) => match n.parse::<usize>() {
                Ok(n) => Command::History(Some(n)),
                Err(_) => Command::Unknown(line.to_string()),
            },
        },
        "/export" => Command::Export,
        "/restart" => Command::Restart,
        "/settings" => Command::Settings,
        "/quit" | "/exit" => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    }
}

/// Entry point for the interactive REPL.
///
/// `signals.shutdown` is polled each iteration; when set the REPL exits
/// cleanly.
pub fn run(mut session: UserSession, signals: Signals) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let prompt = format!("{}>", session.username());

    loop {
        if signals.shutdown.load(Ordering::SeqCst) {
            break;
        }

        print!("{} ", prompt.bold().red());
        stdout.flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        }

        if line.trim().is_empty() {
            continue;
        }

        match parse_command(&line) {
            Command::Help => cmd_help(),
            Command::Monitor => cmd_monitor(&mut session, &signals),
            Command::Status => cmd_status(&session),
            Command::History(limit) => cmd_history(&session, limit),
            Command::Export => cmd_export(&session),
            Command::Restart => {
                session.restart();
                println!("{}", "✓ Chat cleared. Ready for a new measurement.".green());
            }
            Command::Settings => cmd_settings(),
            Command::Quit => {
                println!("{}", "Goodbye. Take care of your heart!".green());
                signals.shutdown.store(true, Ordering::SeqCst);
                break;
            }
            Command::Chat(text) => cmd_chat(&mut session, &text),
            Command::Unknown(other) => {
                println!(
                    "{} '{}'. Type {} for available commands.",
                    "Unknown command:".red(),
                    other.yellow(),
                    "/help".bold()
                );
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Command handlers
// ─────────────────────────────────────────────────────────────────────────────

fn cmd_help() {
    println!();
    println!("{}", "HeartBot Commands".bold().underline());
    println!("  {}       – ask the health assistant a question", "<text>".bold().cyan());
    println!("  {}     – measure your heart rate from the sensor", "/monitor".bold().cyan());
    println!("  {}      – latest reading, average and status", "/status".bold().cyan());
    println!("  {}  – show the chat transcript", "/history [n]".bold().cyan());
    println!("  {}      – save BPM readings to a CSV file", "/export".bold().cyan());
    println!("  {}     – clear the chat and start over", "/restart".bold().cyan());
    println!("  {}    – edit ~/.heartbot/config.toml settings", "/settings".bold().cyan());
    println!("  {}  – exit the dashboard", "/quit  /exit".bold().cyan());
    println!();
}

fn cmd_chat(session: &mut UserSession, text: &str) {
    let Some(exchange) = session.chat(text) else {
        return;
    };
    println!("{} {}", "HeartBot:".bold().red(), exchange.answer.reply);
    if !exchange.persisted {
        println!("  {}", "(chat history could not be saved)".yellow());
    }
}

fn cmd_monitor(session: &mut UserSession, signals: &Signals) {
    if session.readings().is_complete() {
        println!(
            "  Measurement already complete. Use {} to measure again or {} to save it.",
            "/restart".bold(),
            "/export".bold()
        );
        if let Some(summary) = session.summary() {
            print_summary(&summary, session.readings());
        }
        return;
    }

    println!(
        "  Connecting to the sensor … ({} readings to go, Ctrl-C to stop)",
        session.readings().remaining()
    );
    signals.stop_monitor.store(false, Ordering::SeqCst);
    signals.monitoring.store(true, Ordering::SeqCst);
    let result = session.connect_and_monitor(&signals.stop_monitor, print_sample);
    signals.monitoring.store(false, Ordering::SeqCst);

    match result {
        Ok(MonitorExit::Completed) => {
            println!("{}", "✓ Measurement complete.".green().bold());
            if let Some(summary) = session.summary() {
                print_summary(&summary, session.readings());
            }
        }
        Ok(MonitorExit::Stopped) => {
            println!(
                "  Measurement paused at {}/{} readings. Run {} to continue.",
                session.readings().count(),
                session.readings().cap(),
                "/monitor".bold()
            );
        }
        Err(e) => {
            println!("{}: {}", "Sensor error".red(), e);
            if session.readings().count() > 0 {
                println!(
                    "  {} reading(s) kept. Run {} to continue.",
                    session.readings().count(),
                    "/monitor".bold()
                );
            }
        }
    }
}

fn cmd_status(session: &UserSession) {
    println!("{}", "Heart Rate".bold().underline());
    match session.summary() {
        Some(summary) => print_summary(&summary, session.readings()),
        None => println!("  No readings yet. Run {} to start.", "/monitor".bold()),
    }
    println!(
        "  {}",
        format!(
            "session {} · opened {}",
            session.id(),
            session
                .opened_at()
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
        )
        .dimmed()
    );
}

fn cmd_history(session: &UserSession, limit: Option<usize>) {
    let transcript = session.transcript();
    if transcript.is_empty() {
        println!("  No messages yet.");
        return;
    }
    let skip = limit.map_or(0, |n| transcript.len().saturating_sub(n));
    for turn in &transcript[skip..] {
        let label = match turn.speaker {
            Speaker::User => format!("{}:", turn.speaker).bold().cyan(),
            Speaker::Bot => format!("{}:", turn.speaker).bold().red(),
        };
        println!("{} {}", label, turn.text);
    }
}

fn cmd_export(session: &UserSession) {
    match session.export_csv() {
        Ok(path) => println!(
            "{} {}",
            "✓ Readings exported to".green(),
            path.display().to_string().bold()
        ),
        Err(e) => println!("{}: {}", "Export failed".red(), e),
    }
}

fn cmd_settings() {
    let mut cfg = match config::load() {
        Ok(Some(c)) => c,
        Ok(None) => Config::default(),
        Err(e) => {
            println!("{}: {}", "Error loading config".red(), e);
            return;
        }
    };

    println!("{}", "Settings Editor".bold().underline());
    cfg.serial_port = prompt_str(
        &format!("  Serial port     [{}]: ", cfg.serial_port),
        &cfg.serial_port,
    );

    let raw = prompt_str(&format!("  Baud rate       [{}]: ", cfg.baud_rate), &cfg.baud_rate.to_string());
    match raw.parse::<u32>() {
        Ok(v) => cfg.baud_rate = v,
        Err(_) => println!("  {} '{}' is not a valid baud rate, keeping {}", "Warning:".yellow(), raw, cfg.baud_rate),
    }

    let raw = prompt_str(
        &format!("  Match threshold [{}]: ", cfg.match_threshold),
        &cfg.match_threshold.to_string(),
    );
    match raw.parse::<f32>() {
        Ok(v) if (-1.0..=1.0).contains(&v) => cfg.match_threshold = v,
        _ => println!(
            "  {} '{}' must be between -1 and 1, keeping {}",
            "Warning:".yellow(),
            raw,
            cfg.match_threshold
        ),
    }

    cfg.export_dir = prompt_str(
        &format!("  Export folder   [{}]: ", cfg.export_dir),
        &cfg.export_dir,
    );

    match config::save(&cfg) {
        Ok(()) => {
            println!(
                "{} {}",
                "✓ Settings saved to".green(),
                config::config_path().display().to_string().bold()
            );
            println!("  Changes take effect the next time HeartBot starts.");
        }
        Err(e) => println!("{}: {}", "Error saving config".red(), e),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rendering
// ─────────────────────────────────────────────────────────────────────────────

fn print_sample(sample: &Sample, readings: &ReadingSession) {
    let avg = readings.average().unwrap_or(sample.bpm);
    let status = readings
        .status()
        .map(|s| status_label(s).to_string())
        .unwrap_or_default();
    println!(
        "  #{:02}  {:>6.1} BPM  {:<30}  avg {:>6.1}  {}",
        sample.beat,
        sample.bpm,
        bpm_bar(sample.bpm).red(),
        avg,
        status
    );
}

fn print_summary(summary: &ReadingSummary, readings: &ReadingSession) {
    println!("  Latest  : {:.1} BPM", summary.last_bpm);
    println!("  Average : {:.1} BPM", summary.average_bpm);
    println!("  Status  : {}", status_label(summary.status));
    println!("  Readings: {}/{}", summary.count, readings.cap());
    let values: Vec<f64> = readings.window().map(|s| s.bpm).collect();
    println!("  Trend   : {}", sparkline(&values).red());
    if summary.status == BpmStatus::High {
        println!(
            "  {}",
            "Your heart rate is running high. Sit down, breathe slowly and drink some water."
                .yellow()
        );
    }
}

fn status_label(status: BpmStatus) -> ColoredString {
    match status {
        BpmStatus::Low => status.to_string().blue().bold(),
        BpmStatus::Normal => status.to_string().green().bold(),
        BpmStatus::High => status.to_string().red().bold(),
    }
}

/// One block per 5 BPM, capped at 30.
pub fn bpm_bar(bpm: f64) -> String {
    let width = (bpm / 5.0).round().clamp(0.0, 30.0) as usize;
    "█".repeat(width)
}

/// Scale `values` onto eight block heights between their min and max.
pub fn sparkline(values: &[f64]) -> String {
    const TICKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    values
        .iter()
        .map(|v| {
            if span <= f64::EPSILON {
                TICKS[3]
            } else {
                let level = ((v - min) / span * 7.0).round() as usize;
                TICKS[level.min(7)]
            }
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Prompt for a string value.  Returns `default` when the user presses Enter.
fn prompt_str(msg: &str, default: &str) -> String {
    print!("{}", msg);
    io::stdout().flush().ok();

    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(_) => {
            let trimmed = line.trim().to_string();
            if trimmed.is_empty() {
                default.to_string()
            } else {
                trimmed
            }
        }
        Err(_) => default.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_chat() {
        assert_eq!(
            parse_command("  What is bpm? "),
            Command::Chat("What is bpm?".to_string())
        );
    }

    #[test]
    fn slash_commands_parse() {
        assert_eq!(parse_command("/monitor"), Command::Monitor);
        assert_eq!(parse_command("/exit"), Command::Quit);
        assert_eq!(parse_command("/history"), Command::History(None));
        assert_eq!(parse_command("/history 4"), Command::History(Some(4)));
    }

    #[test]
    fn bad_commands_are_unknown() {
        assert_eq!(parse_command("/dance"), Command::Unknown("/dance".to_string()));
        assert_eq!(
            parse_command("/history lots"),
            Command::Unknown("/history lots".to_string())
        );
    }

    #[test]
    fn bar_scales_and_caps() {
        assert_eq!(bpm_bar(72.0).chars().count(), 14);
        assert_eq!(bpm_bar(400.0).chars().count(), 30);
        assert!(bpm_bar(0.0).is_empty());
    }

    #[test]
    fn sparkline_spans_min_to_max() {
        assert_eq!(sparkline(&[60.0, 80.0, 100.0]), "▁▅█");
        assert_eq!(sparkline(&[70.0, 70.0]), "▄▄");
        assert_eq!(sparkline(&[]), "");
    }
}
