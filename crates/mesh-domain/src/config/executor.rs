use serde::{Deserialize, Serialize};

/// Configuration for the plan executor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExecutorConfig {
    #[serde(default = "d_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "d_timeout_ms")]
    pub default_step_timeout_ms: u64,
    #[serde(default = "d_attempts")]
    pub default_max_attempts: u32,
    #[serde(default = "d_retry_delay_ms")]
    pub default_retry_delay_ms: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: d_concurrency(),
            default_step_timeout_ms: d_timeout_ms(),
            default_max_attempts: d_attempts(),
            default_retry_delay_ms: d_retry_delay_ms(),
        }
    }
}

fn d_concurrency() -> usize {
    5
}
fn d_timeout_ms() -> u64 {
    30_000
}
fn d_attempts() -> u32 {
    1
}
fn d_retry_delay_ms() -> u64 {
    500
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_concurrency_is_five() {
        assert_eq!(ExecutorConfig::default().max_concurrency, 5);
    }
}
