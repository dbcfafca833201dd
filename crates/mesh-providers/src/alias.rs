//! Portable model aliases.
//!
//! Lets a caller ask for `"fast"` or `"smart"` instead of a vendor-specific
//! model id. Resolution order: an environment override named
//! `{NAMESPACE}_{PROVIDER}_MODEL_{ALIAS}` beats the hard-coded table below,
//! which beats passing the name through unchanged — so a real vendor model
//! id, or an alias this table has no entry for, reaches the wire untouched.

use mesh_domain::config::ProviderKind;

/// Resolve `requested` (a portable alias or an already-concrete model id) to
/// the model id that should actually go on the wire for `provider_id`.
pub fn resolve(namespace: &str, provider_id: &str, kind: ProviderKind, requested: &str) -> String {
    if let Some(v) = env_override(namespace, provider_id, requested) {
        return v;
    }
    if let Some(v) = hardcoded(kind, requested) {
        return v.to_string();
    }
    requested.to_string()
}

fn env_override(namespace: &str, provider_id: &str, alias: &str) -> Option<String> {
    let var = format!(
        "{}_{}_MODEL_{}",
        shout(namespace),
        shout(provider_id),
        shout(alias)
    );
    std::env::var(var).ok().filter(|v| !v.is_empty())
}

fn shout(s: &str) -> String {
    s.to_uppercase().replace('-', "_")
}

fn hardcoded(kind: ProviderKind, alias: &str) -> Option<&'static str> {
    use ProviderKind::*;
    Some(match (kind, alias) {
        (Anthropic, "default") => "claude-sonnet-4-20250514",
        (Anthropic, "fast") => "claude-3-5-haiku-20241022",
        (Anthropic, "smart") => "claude-opus-4-20250514",
        (Anthropic, "premium") => "claude-opus-4-20250514",
        (Anthropic, "code") => "claude-sonnet-4-20250514",
        (Anthropic, "vision") => "claude-sonnet-4-20250514",

        (OpenaiCompat, "default") | (AzureOpenai, "default") => "gpt-4o",
        (OpenaiCompat, "fast") | (AzureOpenai, "fast") => "gpt-4o-mini",
        (OpenaiCompat, "smart") | (AzureOpenai, "smart") => "gpt-4o",
        (OpenaiCompat, "premium") | (AzureOpenai, "premium") => "o1",
        (OpenaiCompat, "code") | (AzureOpenai, "code") => "gpt-4o",
        (OpenaiCompat, "vision") | (AzureOpenai, "vision") => "gpt-4o",

        (Google, "default") => "gemini-2.0-flash",
        (Google, "fast") => "gemini-2.5-flash-lite",
        (Google, "smart") => "gemini-2.5-pro",
        (Google, "premium") => "gemini-2.5-pro",
        (Google, "code") => "gemini-2.0-flash",
        (Google, "vision") => "gemini-2.0-flash",

        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_through_for_concrete_model_id() {
        assert_eq!(
            resolve("mesh", "openai", ProviderKind::OpenaiCompat, "gpt-4o-2024-11-20"),
            "gpt-4o-2024-11-20"
        );
    }

    #[test]
    fn pass_through_for_unmapped_alias() {
        assert_eq!(
            resolve("mesh", "gemini", ProviderKind::Google, "banana"),
            "banana"
        );
    }

    #[test]
    fn hardcoded_alias_used_when_no_env_override() {
        assert_eq!(
            resolve("mesh", "gemini", ProviderKind::Google, "fast"),
            "gemini-2.5-flash-lite"
        );
    }

    #[test]
    fn env_override_beats_hardcoded_alias() {
        let var = "MESH_GEMINI_MODEL_FAST";
        std::env::set_var(var, "gemini-2.0-flash");
        let resolved = resolve("mesh", "gemini", ProviderKind::Google, "fast");
        std::env::remove_var(var);
        assert_eq!(resolved, "gemini-2.0-flash");
    }

    #[test]
    fn namespace_and_provider_id_are_both_shouted_into_the_env_var_name() {
        let var = "TEST_NS_MY_PROVIDER_MODEL_CODE";
        std::env::set_var(var, "vendor-code-model");
        let resolved = resolve("test_ns", "my-provider", ProviderKind::Anthropic, "code");
        std::env::remove_var(var);
        assert_eq!(resolved, "vendor-code-model");
    }
}
