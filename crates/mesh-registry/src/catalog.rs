//! Deterministic text rendering of the catalog for LLM prompts.

use chrono::{DateTime, Utc};
use mesh_domain::registration::Registration;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Health marker bucket derived from elapsed time since the last heartbeat.
fn health_marker(elapsed_secs: i64) -> &'static str {
    if elapsed_secs < 60 {
        "active"
    } else if elapsed_secs < 300 {
        "warning"
    } else {
        "inactive"
    }
}

fn derive_endpoint(reg: &Registration) -> String {
    if let Some(ref service) = reg.endpoint.service {
        return format!("{service}.{}.svc.cluster.local:8080", reg.namespace);
    }
    match (&reg.endpoint.address, reg.endpoint.port) {
        (Some(addr), Some(port)) => format!("{addr}:{port}"),
        (Some(addr), None) => addr.clone(),
        _ => "unknown".to_string(),
    }
}

/// Render the catalog as deterministic text suitable for an LLM prompt.
///
/// Registrations are grouped by namespace (sorted), and within each
/// namespace listed in a stable order (sorted by id) with a numbered
/// index. `sync_error_count` is appended to the summary footer only when
/// nonzero.
pub fn catalog_for_llm(
    registrations: &[Registration],
    now: DateTime<Utc>,
    last_sync_elapsed_secs: i64,
    sync_error_count: u64,
) -> String {
    let mut by_namespace: BTreeMap<&str, Vec<&Registration>> = BTreeMap::new();
    for reg in registrations {
        by_namespace.entry(reg.namespace.as_str()).or_default().push(reg);
    }
    for regs in by_namespace.values_mut() {
        regs.sort_by(|a, b| a.id.cmp(&b.id));
    }

    let mut out = String::new();
    out.push_str("Registered components\n");
    out.push_str("======================\n\n");

    for (namespace, regs) in &by_namespace {
        let _ = writeln!(out, "Namespace: {namespace}");
        for (idx, reg) in regs.iter().enumerate() {
            let elapsed = reg.elapsed_secs(now);
            let _ = writeln!(out, "  {}. {}", idx + 1, reg.name);
            let _ = writeln!(out, "     description: {}", reg.description);
            let _ = writeln!(out, "     endpoint: {}", derive_endpoint(reg));
            let _ = writeln!(out, "     status: {:?}", reg.health);
            if reg.capabilities.is_empty() {
                let _ = writeln!(out, "     capabilities: (none)");
            } else {
                let _ = writeln!(out, "     capabilities:");
                for cap in &reg.capabilities {
                    let _ = write!(out, "       - {}: {}", cap.name, cap.description);
                    if let Some(ref hint) = cap.routing_hint {
                        let _ = write!(out, " (routing hint: {hint})");
                    }
                    out.push('\n');
                }
            }
            let _ = writeln!(
                out,
                "     health: {} ({}s since last heartbeat)",
                health_marker(elapsed),
                elapsed
            );
        }
        out.push('\n');
    }

    let total: usize = by_namespace.values().map(|v| v.len()).sum();
    let _ = write!(
        out,
        "{} agents across {} namespaces, last sync {}s ago",
        total,
        by_namespace.len(),
        last_sync_elapsed_secs
    );
    if sync_error_count > 0 {
        let _ = write!(out, ", {sync_error_count} sync errors");
    }
    out.push('\n');

    out
}
