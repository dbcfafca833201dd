use serde::{Deserialize, Serialize};

/// Structured-logging setup shared by every component process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `env-filter` directive string, e.g. "info,mesh_registry=debug".
    #[serde(default = "d_filter")]
    pub filter: String,
    /// Emit logs as JSON lines instead of the default human-readable format.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: d_filter(),
            json: false,
        }
    }
}

fn d_filter() -> String {
    "info".to_string()
}
