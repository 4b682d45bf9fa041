//! `heartbot` – HeartBot command line dashboard
//!
//! This binary is the interactive front end of the HeartBot stack.  It:
//!
//! 1. Checks for `~/.heartbot/config.toml`; runs a **First-Run Wizard** when
//!    the file is absent.
//! 2. Opens the history database and resumes the user's chat transcript and
//!    BPM history.
//! 3. Drops the user into an **interactive REPL**: plain text goes to the FAQ
//!    chatbot, slash-commands drive the sensor (`/monitor`, `/status`,
//!    `/export`, `/restart`, `/help`).
//! 4. Intercepts **Ctrl-C** to stop a running measurement, or to exit.

mod config;
mod repl;

use colored::Colorize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, warn};

use heartbot_runtime::HeartBotService;
use heartbot_store::SqliteHistoryStore;
use heartbot_types::HistoryStore;

fn main() {
    // User-facing output goes through println!, so the default filter stays
    // quiet unless RUST_LOG asks for more.
    let _telemetry = heartbot_runtime::telemetry::init_tracing("heartbot", "warn");

    print_banner();

    // ── Shared flags ──────────────────────────────────────────────────────
    let signals = repl::Signals::default();
    let handler_signals = signals.clone();

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        if handler_signals.monitoring.load(Ordering::SeqCst) {
            println!("{}", "⚠  Ctrl-C received – stopping measurement …".yellow().bold());
            handler_signals.stop_monitor.store(true, Ordering::SeqCst);
        } else {
            println!("{}", "⚠  Ctrl-C received – press Enter to exit.".yellow().bold());
            handler_signals.shutdown.store(true, Ordering::SeqCst);
        }
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; measurements can only stop on completion");
    }

    // ── Configuration ─────────────────────────────────────────────────────
    let mut cfg = match config::load() {
        Ok(None) => run_first_run_wizard(),
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            config::Config::default()
        }
    };

    while cfg.username.trim().is_empty() {
        match prompt_line("  Username: ") {
            Some(name) => cfg.username = name,
            None => return,
        }
    }

    // ── History store ─────────────────────────────────────────────────────
    let store = open_store(&cfg.database_path);

    // ── Session ───────────────────────────────────────────────────────────
    println!("  Loading the FAQ language model …");
    let service = HeartBotService::new(store, cfg.service_settings());
    let session = match service.open_session(&cfg.username) {
        Ok(session) => session,
        Err(e) => {
            error!(error = %e, "could not open session");
            println!("{}: {}", "Could not start session".red(), e);
            return;
        }
    };

    println!();
    if session.transcript().is_empty() && session.readings().count() == 0 {
        println!("  Welcome, {}!", session.username().bold());
    } else {
        println!(
            "  Welcome back, {}! Resuming {} chat message(s) and {} BPM reading(s).",
            session.username().bold(),
            session.transcript().len(),
            session.readings().count()
        );
    }
    println!(
        "  Ask me anything about heart health, or type {} for commands.\n",
        "/help".bold().cyan()
    );

    // ── Interactive REPL ──────────────────────────────────────────────────
    repl::run(session, signals);
}

/// Open the SQLite store, falling back to an in-memory database so the
/// dashboard still works (without persistence across runs).
fn open_store(path: &str) -> Arc<dyn HistoryStore> {
    if let Some(parent) = std::path::Path::new(path).parent()
        && !parent.as_os_str().is_empty()
        && let Err(e) = std::fs::create_dir_all(parent)
    {
        warn!(path, error = %e, "could not create database directory");
    }

    match SqliteHistoryStore::open(path) {
        Ok(store) => {
            println!("  History database: {}", path.bold());
            Arc::new(store)
        }
        Err(e) => {
            println!(
                "  {} {} ({}). History will not be saved this run.",
                "Could not open".yellow(),
                path.bold(),
                e
            );
            match SqliteHistoryStore::open_in_memory() {
                Ok(store) => Arc::new(store),
                Err(e) => {
                    error!(error = %e, "in-memory store unavailable");
                    std::process::exit(1);
                }
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// First-Run Wizard
// ─────────────────────────────────────────────────────────────────────────────

fn run_first_run_wizard() -> config::Config {
    println!();
    println!("{}", "  ╔══════════════════════════════════════╗".bold().red());
    println!("{}", "  ║      HeartBot First-Run Wizard       ║".bold().red());
    println!("{}", "  ╚══════════════════════════════════════╝".bold().red());
    println!();
    println!("  No configuration found.  Let's set up HeartBot.\n");

    let mut cfg = config::Config::default();

    cfg.username = prompt_line("  Your name: ").unwrap_or_default();

    cfg.serial_port = prompt_with_default(
        &format!("  Sensor serial port [{}]: ", cfg.serial_port),
        &cfg.serial_port,
    );

    let baud = prompt_with_default(
        &format!("  Baud rate [{}]: ", cfg.baud_rate),
        &cfg.baud_rate.to_string(),
    );
    if let Ok(b) = baud.parse::<u32>() {
        cfg.baud_rate = b;
    }

    match config::save(&cfg) {
        Ok(()) => println!(
            "\n  {} Config saved to {}\n",
            "✓".green().bold(),
            config::config_path().display().to_string().bold()
        ),
        Err(e) => println!("{}: {}", "Error saving config".red(), e),
    }
    cfg
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"   _  _                _   ___      _   "#.bold().red());
    println!("{}", r#"  | || |___ __ _ _ _| |_| _ ) ___| |_ "#.bold().red());
    println!("{}", r#"  | __ / -_) _` | '_|  _| _ \/ _ \  _|"#.bold().red());
    println!("{}", r#"  |_||_\___\__,_|_|  \__|___/\___/\__|"#.bold().red());
    println!();
    println!("  {} {}",
        "HeartBot".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Heart-rate dashboard & health FAQ assistant");
    println!();
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Read one trimmed line. `None` on EOF or a read error.
fn prompt_line(msg: &str) -> Option<String> {
    use std::io::{BufRead, Write};
    print!("{}", msg);
    std::io::stdout().flush().ok();
    let mut line = String::new();
    match std::io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim().to_string()),
    }
}

fn prompt_with_default(msg: &str, default: &str) -> String {
    match prompt_line(msg) {
        Some(t) if !t.is_empty() => t,
        _ => default.to_string(),
    }
}
