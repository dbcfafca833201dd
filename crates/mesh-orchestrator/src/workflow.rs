//! Named workflow templates for the `workflow` and `hybrid` plan modes,
//! loaded from a directory of JSON files the way the reference gateway
//! scans its skill/schedule directories.

use mesh_domain::plan::RoutingStep;
use mesh_domain::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A named, externally stored template of steps. Instantiated with
/// caller-provided inputs rather than generated by an LLM call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowTemplate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Input names the template expects at instantiation time.
    #[serde(default)]
    pub inputs: Vec<String>,
    pub steps: Vec<RoutingStep>,
}

/// Load `{workflow_dir}/{name}.json` and parse it as a [`WorkflowTemplate`].
pub fn load_workflow(workflow_dir: &Path, name: &str) -> Result<WorkflowTemplate> {
    let path = workflow_dir.join(format!("{name}.json"));
    let content = std::fs::read_to_string(&path)?;
    let template: WorkflowTemplate = serde_json::from_str(&content)?;
    Ok(template)
}

/// Scan a workflow directory and list the template names available
/// (the file stem of every `*.json` file found).
pub fn scan_workflows(workflow_dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    if !workflow_dir.exists() {
        return Ok(names);
    }
    let read_dir = std::fs::read_dir(workflow_dir)?;
    for entry in read_dir {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        match path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) => names.push(stem.to_string()),
            None => continue,
        }
    }
    names.sort();
    Ok(names)
}

/// Require `workflow_dir` to be configured, returning a clear config error otherwise.
pub fn require_workflow_dir(workflow_dir: &Option<String>) -> Result<&Path> {
    match workflow_dir {
        Some(dir) => Ok(Path::new(dir)),
        None => Err(Error::Config(
            "orchestrator.workflow_dir must be set to use workflow/hybrid modes".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_domain::plan::{BackoffKind, PlanMode};
    use std::io::Write;

    fn sample_template_json() -> &'static str {
        r#"{
            "name": "daily_digest",
            "description": "Summarize overnight activity",
            "inputs": ["channel"],
            "steps": [
                {
                    "id": "s1",
                    "target_name": "summarizer",
                    "capability": "summarize",
                    "parameters": {"channel": "{{channel}}"},
                    "order": 1,
                    "required": true
                }
            ]
        }"#
    }

    #[test]
    fn loads_a_template_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut f = std::fs::File::create(dir.path().join("daily_digest.json")).unwrap();
        f.write_all(sample_template_json().as_bytes()).unwrap();

        let template = load_workflow(dir.path(), "daily_digest").unwrap();
        assert_eq!(template.name, "daily_digest");
        assert_eq!(template.steps.len(), 1);
        assert_eq!(template.inputs, vec!["channel".to_string()]);
    }

    #[test]
    fn scan_lists_template_stems_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b_flow", "a_flow"] {
            let mut f = std::fs::File::create(dir.path().join(format!("{name}.json"))).unwrap();
            f.write_all(sample_template_json().as_bytes()).unwrap();
        }
        let names = scan_workflows(dir.path()).unwrap();
        assert_eq!(names, vec!["a_flow".to_string(), "b_flow".to_string()]);
    }

    #[test]
    fn missing_template_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_workflow(dir.path(), "nope").is_err());
    }

    #[test]
    fn require_workflow_dir_rejects_none() {
        assert!(require_workflow_dir(&None).is_err());
    }

    #[allow(dead_code)]
    fn unused_imports_silencer() -> (PlanMode, BackoffKind) {
        (PlanMode::Workflow, BackoffKind::Constant)
    }
}
