//! Telemetry configuration.

use serde::Deserialize;

/// Logging settings.
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetrySettings {
    /// Default log filter; `RUST_LOG` takes precedence.
    pub log_level: String,
    /// Emit JSON log lines instead of plain text.
    #[serde(default)]
    pub json: bool,
}
