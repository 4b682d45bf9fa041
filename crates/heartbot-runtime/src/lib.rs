//! `heartbot-runtime` – the application layer tying chat, sensor and storage
//! together.
//!
//! # Modules
//!
//! - [`service`] – [`HeartBotService`][service::HeartBotService]: the shared
//!   static corpus, encoder, store and settings; opens user sessions.
//! - [`session`] – [`UserSession`][session::UserSession]: one user's chat,
//!   reading session, restart and CSV export.
//! - [`telemetry`] – `tracing` subscriber and optional OTLP exporter setup.

pub mod service;
pub mod session;
pub mod telemetry;

pub use service::{HeartBotService, ServiceSettings};
pub use session::UserSession;
