use mesh_domain::config::MeshConfig;

#[test]
fn default_namespace_is_default() {
    let config = MeshConfig::default();
    assert_eq!(config.registry.namespace, "default");
}

#[test]
fn explicit_namespace_parses_from_toml() {
    let toml_str = r#"
[registry]
namespace = "prod"
ttl_secs = 90
"#;
    let config: MeshConfig = toml::from_str(toml_str).unwrap();
    assert_eq!(config.registry.namespace, "prod");
    assert_eq!(config.registry.ttl_secs, 90);
}

#[test]
fn unset_sections_fall_back_to_defaults() {
    let toml_str = r#"
[registry]
namespace = "prod"
"#;
    let config: MeshConfig = toml::from_str(toml_str).unwrap();
    assert_eq!(config.executor.max_concurrency, 5);
    assert_eq!(config.communicator.scheme, "http");
}
