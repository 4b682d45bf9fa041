//! Logging and span export for the HeartBot dashboard.
//!
//! [`init_tracing`] installs one global `tracing` subscriber. The dashboard
//! owns stdout for the chat and the live BPM display, so log lines always go
//! to stderr, filtered down to `warn` unless `RUST_LOG` asks for more.
//!
//! | Variable | Effect |
//! |---|---|
//! | `RUST_LOG` | Log filter, overriding the caller's default. |
//! | `HEARTBOT_LOG_FORMAT` | `compact` (default) or `json` for newline-delimited JSON. |
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | OTLP/HTTP collector URL. Spans (chat matches, monitoring runs, saves) are exported when set. |
//!
//! ```rust,no_run
//! let _telemetry = heartbot_runtime::telemetry::init_tracing("heartbot", "warn");
//! ```

use std::io;

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{Resource, trace::SdkTracerProvider};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_FORMAT_ENV: &str = "HEARTBOT_LOG_FORMAT";
pub const OTLP_ENDPOINT_ENV: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

/// Shape of the stderr log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl LogFormat {
    /// Unknown values fall back to [`LogFormat::Compact`].
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}

/// Where logs and spans go, resolved from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySettings {
    pub service_name: String,
    pub format: LogFormat,
    pub otlp_endpoint: Option<String>,
}

impl TelemetrySettings {
    pub fn from_env(service_name: &str) -> Self {
        Self::from_lookup(service_name, |key| std::env::var(key).ok())
    }

    fn from_lookup(service_name: &str, lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            service_name: service_name.to_string(),
            format: LogFormat::parse(lookup(LOG_FORMAT_ENV).as_deref()),
            otlp_endpoint: lookup(OTLP_ENDPOINT_ENV).filter(|e| !e.trim().is_empty()),
        }
    }
}

/// Install the global subscriber.
///
/// `default_filter` applies when `RUST_LOG` is unset. Hold the returned
/// guard until exit; dropping it flushes exported spans. A second call keeps
/// the first subscriber.
pub fn init_tracing(service_name: &str, default_filter: &str) -> TracerProviderGuard {
    let settings = TelemetrySettings::from_env(service_name);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let provider = settings
        .otlp_endpoint
        .as_deref()
        .and_then(|endpoint| build_provider(&settings.service_name, endpoint));

    let otel_layer = provider.as_ref().map(|p| {
        tracing_opentelemetry::layer().with_tracer(p.tracer(settings.service_name.clone()))
    });
    let (json_layer, compact_layer) = match settings.format {
        LogFormat::Json => (Some(fmt::layer().json().with_writer(io::stderr)), None),
        LogFormat::Compact => (None, Some(fmt::layer().compact().with_writer(io::stderr))),
    };

    if let Err(e) = tracing_subscriber::registry()
        .with(filter)
        .with(otel_layer)
        .with(json_layer)
        .with(compact_layer)
        .try_init()
    {
        eprintln!("[heartbot] tracing already initialised: {e}");
    }

    TracerProviderGuard(provider)
}

/// Flushes and shuts down the span exporter on drop.
pub struct TracerProviderGuard(Option<SdkTracerProvider>);

impl TracerProviderGuard {
    /// `true` when spans are being exported over OTLP.
    pub fn is_exporting(&self) -> bool {
        self.0.is_some()
    }
}

impl Drop for TracerProviderGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.0.take()
            && let Err(e) = provider.shutdown()
        {
            eprintln!("[heartbot] span exporter shutdown failed: {e}");
        }
    }
}

/// `None` when the exporter cannot be built; the error goes to stderr and
/// HeartBot keeps running with local logs only.
fn build_provider(service_name: &str, endpoint: &str) -> Option<SdkTracerProvider> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| eprintln!("[heartbot] OTLP exporter for {endpoint} unavailable: {e}"))
        .ok()?;

    let resource = Resource::builder()
        .with_service_name(service_name.to_string())
        .build();

    // No async runtime in this process, so spans are exported synchronously.
    Some(
        SdkTracerProvider::builder()
            .with_resource(resource)
            .with_simple_exporter(exporter)
            .build(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(vars: &[(&str, &str)]) -> TelemetrySettings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        TelemetrySettings::from_lookup("heartbot", |key| vars.get(key).cloned())
    }

    #[test]
    fn log_format_parsing() {
        assert_eq!(LogFormat::parse(Some("json")), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some(" JSON ")), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some("compact")), LogFormat::Compact);
        assert_eq!(LogFormat::parse(Some("xml")), LogFormat::Compact);
        assert_eq!(LogFormat::parse(None), LogFormat::Compact);
    }

    #[test]
    fn quiet_environment_logs_compact_without_export() {
        let settings = settings_from(&[]);
        assert_eq!(settings.service_name, "heartbot");
        assert_eq!(settings.format, LogFormat::Compact);
        assert_eq!(settings.otlp_endpoint, None);
    }

    #[test]
    fn environment_selects_json_and_collector() {
        let settings = settings_from(&[
            (LOG_FORMAT_ENV, "json"),
            (OTLP_ENDPOINT_ENV, "http://localhost:4318"),
        ]);
        assert_eq!(settings.format, LogFormat::Json);
        assert_eq!(settings.otlp_endpoint.as_deref(), Some("http://localhost:4318"));
    }

    #[test]
    fn blank_endpoint_disables_export() {
        let settings = settings_from(&[(OTLP_ENDPOINT_ENV, "  ")]);
        assert_eq!(settings.otlp_endpoint, None);
    }

    #[test]
    fn empty_guard_is_not_exporting() {
        let guard = TracerProviderGuard(None);
        assert!(!guard.is_exporting());
        drop(guard);
    }
}
