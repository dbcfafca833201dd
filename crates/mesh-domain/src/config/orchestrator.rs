use serde::{Deserialize, Serialize};

/// Configuration for plan generation, micro-resolution, and synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    #[serde(default = "d_plan_temp")]
    pub plan_temperature: f32,
    #[serde(default = "d_micro_temp")]
    pub micro_resolution_temperature: f32,
    #[serde(default = "d_synth_temp")]
    pub synthesis_temperature: f32,
    #[serde(default = "d_micro_tokens")]
    pub micro_resolution_max_tokens: u32,
    /// Directory containing workflow template files, for `workflow`/`hybrid` modes.
    #[serde(default)]
    pub workflow_dir: Option<String>,
    /// Enable persistence of per-request LLM interaction traces.
    #[serde(default)]
    pub debug_recording: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            plan_temperature: d_plan_temp(),
            micro_resolution_temperature: d_micro_temp(),
            synthesis_temperature: d_synth_temp(),
            micro_resolution_max_tokens: d_micro_tokens(),
            workflow_dir: None,
            debug_recording: false,
        }
    }
}

fn d_plan_temp() -> f32 {
    0.3
}
fn d_micro_temp() -> f32 {
    0.0
}
fn d_synth_temp() -> f32 {
    0.5
}
fn d_micro_tokens() -> u32 {
    500
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_temperatures() {
        let cfg = OrchestratorConfig::default();
        assert!((cfg.plan_temperature - 0.3).abs() < f32::EPSILON);
        assert!((cfg.micro_resolution_temperature - 0.0).abs() < f32::EPSILON);
        assert!((cfg.synthesis_temperature - 0.5).abs() < f32::EPSILON);
    }
}
