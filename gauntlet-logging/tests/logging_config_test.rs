use gauntlet_logging::{
    env_filter, init_logging_from_config, init_simple_tracing, LogFormat, LogLevel, LoggingConfig,
};

#[test]
fn test_logging_config_from_yaml() {
    let yaml_config = r#"
level: debug
format: json
include_location: true
"#;

    let config: LoggingConfig = serde_yaml::from_str(yaml_config).unwrap();

    assert_eq!(config.level, LogLevel::Debug);
    assert_eq!(config.format, LogFormat::Json);
    assert!(config.include_location);
}

#[test]
fn test_minimal_logging_config() {
    let config = LoggingConfig::default();

    assert_eq!(config.level, LogLevel::Info);
    assert_eq!(config.format, LogFormat::Text);
    assert!(!config.include_location);
}

#[test]
fn test_filter_falls_back_to_configured_level() {
    temp_env::with_var_unset("RUST_LOG", || {
        assert_eq!(env_filter(LogLevel::Debug).to_string(), "debug");
        assert_eq!(env_filter(LogLevel::Warn).to_string(), "warn");
    });
}

#[test]
fn test_rust_log_takes_precedence() {
    temp_env::with_var("RUST_LOG", Some("gauntlet_engine=trace"), || {
        assert_eq!(env_filter(LogLevel::Error).to_string(), "gauntlet_engine=trace");
    });
}

#[test]
fn test_repeated_initialisation_is_harmless() {
    let config = LoggingConfig {
        level: LogLevel::Warn,
        format: LogFormat::Compact,
        include_location: false,
    };

    assert!(init_logging_from_config(&config).is_ok());
    assert!(init_logging_from_config(&LoggingConfig::default()).is_ok());
    assert!(init_simple_tracing("debug").is_ok());
    tracing::info!("still logging after repeated init");
}
