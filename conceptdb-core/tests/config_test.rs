use conceptdb_core::config::*;

#[test]
fn config_loads_from_empty_toml_with_all_defaults() {
    let config = ConceptDbConfig::from_toml("").unwrap();

    // Storage defaults
    assert_eq!(config.storage.db_path, "conceptdb.db");
    assert!(config.storage.wal_mode);
    assert_eq!(config.storage.busy_timeout_ms, 5_000);

    // Confidence defaults
    assert_eq!(config.confidence.default_confidence, 0.5);
    assert_eq!(config.confidence.default_weight, 1.0);
    assert!(!config.confidence.strict_lookup);

    // Propagation defaults
    assert_eq!(config.propagation.strategy, Strategy::Electrical);
    assert_eq!(config.propagation.ground_weight, 1.0);
    assert_eq!(config.propagation.epsilon, 1e-6);
    assert_eq!(config.propagation.max_iterations, 100);
    assert_eq!(config.propagation.walk_depth, 20);
    assert_eq!(config.propagation.seed, 0);

    // Observability defaults
    assert_eq!(config.observability.log_level, "info");
    assert!(!config.observability.json_logs);

    assert_eq!(config, ConceptDbConfig::default());
}

#[test]
fn config_loads_partial_toml_with_overrides() {
    let toml = r#"
[storage]
db_path = "/custom/path.db"

[propagation]
strategy = "corona"
seed = 42
"#;
    let config = ConceptDbConfig::from_toml(toml).unwrap();
    assert_eq!(config.storage.db_path, "/custom/path.db");
    // Non-overridden fields keep defaults
    assert!(config.storage.wal_mode);
    assert_eq!(config.propagation.strategy, Strategy::Corona);
    assert_eq!(config.propagation.seed, 42);
    assert_eq!(config.propagation.max_iterations, 100);
}

#[test]
fn config_rejects_unknown_strategy() {
    let toml = r#"
[propagation]
strategy = "magnetic"
"#;
    assert!(ConceptDbConfig::from_toml(toml).is_err());
}

#[test]
fn strategy_parses_from_cli_names() {
    assert_eq!("spreading".parse::<Strategy>().unwrap(), Strategy::Spreading);
    assert!("".parse::<Strategy>().is_err());
}

#[test]
fn validate_rejects_bad_propagation_settings() {
    let mut config = PropagationConfig::default();
    assert!(config.validate().is_ok());

    config.epsilon = 0.0;
    assert!(config.validate().is_err());

    config = PropagationConfig {
        ground_weight: -1.0,
        ..PropagationConfig::default()
    };
    assert!(config.validate().is_err());

    config = PropagationConfig {
        max_iterations: 0,
        ..PropagationConfig::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn from_file_reads_and_validates() {
    let dir = std::env::temp_dir().join(format!("conceptdb-config-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    let good = dir.join("good.toml");
    std::fs::write(&good, "[propagation]\nepsilon = 0.001\n").unwrap();
    let config = ConceptDbConfig::from_file(&good).unwrap();
    assert_eq!(config.propagation.epsilon, 0.001);

    let bad = dir.join("bad.toml");
    std::fs::write(&bad, "[propagation]\nwalk_depth = 0\n").unwrap();
    assert!(ConceptDbConfig::from_file(&bad).is_err());

    let missing = dir.join("missing.toml");
    let err = ConceptDbConfig::from_file(&missing).unwrap_err();
    assert!(matches!(err, conceptdb_core::ConceptDbError::Io(_)));

    std::fs::remove_dir_all(&dir).ok();
}
