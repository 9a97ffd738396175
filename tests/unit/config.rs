use super::*;

#[test]
fn defaults_match_documented_values() {
    let config = DegradeConfig::default();
    assert!(config.cache.enabled);
    assert_eq!(config.cache.max_entries, 64);
    assert_eq!(config.cache.max_bytes, 512 * 1024 * 1024);
    assert_eq!(config.workers.threads, None);
    assert!(config.workers.parallel_frames);
    assert_eq!(config.workers.min_parallel_frames, 4);
    assert_eq!(config.pipeline.max_steps, 8);
    assert_eq!(config.pipeline.timeout_ms, None);
    assert!(config.validate().is_ok());
}

#[test]
fn partial_json_fills_the_rest() {
    let config = DegradeConfig::from_json_str(
        r#"{
            "cache": {"max_entries": 3},
            "pipeline": {"timeout_ms": 250},
            "defaults": {"blur": {"kernel_size": 7}}
        }"#,
    )
    .unwrap();
    assert_eq!(config.cache.max_entries, 3);
    assert_eq!(config.cache.max_bytes, CacheConfig::default().max_bytes);
    assert_eq!(config.pipeline.timeout_ms, Some(250));
    assert_eq!(config.pipeline.max_steps, 8);
    assert_eq!(config.defaults["blur"]["kernel_size"], 7);
}

#[test]
fn rejects_bad_budgets_and_unknown_keys() {
    for text in [
        r#"{"cache": {"max_entries": 0}}"#,
        r#"{"cache": {"max_bytes": 0}}"#,
        r#"{"workers": {"threads": 0}}"#,
        r#"{"pipeline": {"max_steps": 0}}"#,
        r#"{"cache": {"size": 10}}"#,
    ] {
        let err = DegradeConfig::from_json_str(text).unwrap_err();
        assert_eq!(err.kind(), "config", "{text}");
    }
    // A disabled cache may carry zero budgets.
    assert!(DegradeConfig::from_json_str(r#"{"cache": {"enabled": false, "max_entries": 0}}"#).is_ok());
}

#[test]
fn defaults_are_checked_against_the_registry() {
    let registry = OperationRegistry::builtin();

    let unknown = DegradeConfig::from_json_str(r#"{"defaults": {"sharpen": {}}}"#).unwrap();
    assert_eq!(unknown.check_defaults(&registry).unwrap_err().kind(), "config");

    let invalid = DegradeConfig::from_json_str(r#"{"defaults": {"blur": {"kernel_size": 500}}}"#).unwrap();
    let err = invalid.check_defaults(&registry).unwrap_err();
    assert_eq!(err.kind(), "config");
    assert!(err.to_string().contains("'blur'"), "{err}");
    assert!(err.to_string().contains("out_of_range:kernel_size"), "{err}");

    let undeclared = DegradeConfig::from_json_str(r#"{"defaults": {"blur": {"radius": 2}}}"#).unwrap();
    let err = undeclared.check_defaults(&registry).unwrap_err();
    assert_eq!(err.kind(), "config");
    assert!(err.to_string().contains("unknown:radius"), "{err}");

    let ok = DegradeConfig::from_json_str(r#"{"defaults": {"noise": {"seed": 4}}}"#).unwrap();
    assert!(ok.check_defaults(&registry).is_ok());
}

#[test]
fn loads_from_a_file() {
    let dir = std::env::temp_dir().join("degrade_config_test");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.json");
    std::fs::write(&path, r#"{"workers": {"threads": 2, "parallel_frames": false}}"#).unwrap();

    let config = DegradeConfig::from_path(&path).unwrap();
    assert_eq!(config.workers.threads, Some(2));
    assert!(!config.workers.parallel_frames);

    assert!(DegradeConfig::from_path(&dir.join("missing.json")).is_err());
}

#[test]
fn partial_defaults_skip_cross_field_rules() {
    let registry = OperationRegistry::builtin();
    // min_radius 20 conflicts with the schema's max_radius 10, but a request can supply both.
    let config =
        DegradeConfig::from_json_str(r#"{"defaults": {"dirt": {"min_radius": 20}}}"#).unwrap();
    assert!(config.check_defaults(&registry).is_ok());

    let dirt = registry.resolve("dirt").unwrap();
    let defaults = &config.defaults["dirt"];
    let mut raw = RawParams::new();
    raw.insert("max_radius".to_owned(), 30.into());
    let set = dirt.validate(&raw, Some(defaults)).unwrap();
    assert_eq!(set.int("min_radius").unwrap(), 20);

    // Without an override the rule still applies at request time.
    let err = dirt.validate(&RawParams::new(), Some(defaults)).unwrap_err();
    assert_eq!(err.report().field.as_deref(), Some("out_of_range:min_radius"));

    // Even kernel sizes are a cross rule too: accepted here, refused per request.
    let even = DegradeConfig::from_json_str(r#"{"defaults": {"blur": {"kernel_size": 6}}}"#).unwrap();
    assert!(even.check_defaults(&registry).is_ok());
}
