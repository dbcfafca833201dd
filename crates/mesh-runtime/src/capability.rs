//! A registered capability: the descriptor the registry advertises,
//! paired with the handler that actually runs it.

use std::sync::Arc;

use mesh_domain::registration::Capability;

use crate::traits::CapabilityHandler;

pub struct CapabilityEntry {
    pub descriptor: Capability,
    pub handler: Arc<dyn CapabilityHandler>,
}

/// A one-line deterministic rendering of a capability's expected input,
/// for the `/api/capabilities` listing.
pub fn input_summary(cap: &Capability) -> String {
    if cap.input_fields.is_empty() {
        return "(no input fields)".to_string();
    }
    cap.input_fields
        .iter()
        .map(|f| {
            let marker = if f.required { "required" } else { "optional" };
            match &f.type_hint {
                Some(hint) => format!("{}: {hint} ({marker})", f.name),
                None => format!("{}: ({marker})", f.name),
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_domain::registration::CapabilityField;

    fn cap_with_fields(fields: Vec<CapabilityField>) -> Capability {
        Capability {
            name: "get_forecast".into(),
            description: "fetch weather".into(),
            input_media_type: None,
            output_media_type: None,
            input_fields: fields,
            routing_hint: None,
        }
    }

    #[test]
    fn no_fields_renders_placeholder() {
        assert_eq!(input_summary(&cap_with_fields(vec![])), "(no input fields)");
    }

    #[test]
    fn renders_required_and_optional_markers() {
        let cap = cap_with_fields(vec![
            CapabilityField {
                name: "city".into(),
                required: true,
                type_hint: Some("string".into()),
                example: None,
            },
            CapabilityField {
                name: "units".into(),
                required: false,
                type_hint: None,
                example: None,
            },
        ]);
        let summary = input_summary(&cap);
        assert!(summary.contains("city: string (required)"));
        assert!(summary.contains("units: (optional)"));
    }
}
