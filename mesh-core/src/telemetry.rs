//! Tracing subscriber initialization
//!
//! Library code only emits `tracing` events; binaries and test harnesses call
//! [`init_tracing`] once to decide where they go.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Telemetry configuration from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// `EnvFilter` directives, e.g. `mesh_storage=debug`
    pub filter: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            filter: std::env::var("MESH_LOG").unwrap_or_else(|_| "info".to_string()),
            json: std::env::var("MESH_LOG_FORMAT")
                .map(|s| s.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        }
    }
}

impl TelemetryConfig {
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

/// Install the global tracing subscriber.
///
/// Returns `false` when a subscriber was already installed; calling this more
/// than once is harmless.
pub fn init_tracing(config: &TelemetryConfig) -> bool {
    let filter = EnvFilter::try_new(&config.filter).unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .try_init()
    };

    if installed.is_ok() {
        tracing::debug!(filter = %config.filter, json = config.json, "Tracing initialized");
    }
    installed.is_ok()
}
