//! Integration tests for volley-config

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use temp_env::with_vars;
use volley_config::*;

#[test]
fn test_default_config_validation() {
    let config = VolleyConfig::default();
    assert!(config.validate_all().is_ok());
    assert_eq!(config.server.ui_path, "/volley/");
    assert_eq!(config.server.data_dir, PathBuf::from("./data"));
    assert_eq!(config.logging.format, LogFormat::Text);
}

#[test]
fn test_config_loader_from_env() {
    let vars = vec![
        ("VOLLEY_SERVER_PORT", Some("9090")),
        ("VOLLEY_UI_PATH", Some("/load/")),
        ("VOLLEY_DATA_DIR", Some("/tmp/volley-results")),
        ("VOLLEY_ENGINE_DEFAULT_QPS", Some("-1")),
        ("VOLLEY_ENGINE_DEFAULT_CONNECTIONS", Some("16")),
        ("VOLLEY_ENGINE_DEFAULT_DURATION_SECONDS", Some("30")),
        ("VOLLEY_ENGINE_TIMEOUT_SECONDS", Some("10")),
        ("VOLLEY_LOG_LEVEL", Some("debug")),
        ("VOLLEY_LOG_FORMAT", Some("json")),
    ];

    with_vars(vars, || {
        let config = ConfigLoader::new().from_env().unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.ui_path, "/load/");
        assert_eq!(config.server.data_dir, PathBuf::from("/tmp/volley-results"));
        assert_eq!(config.engine.default_qps, -1.0);
        assert_eq!(config.engine.default_connections, 16);
        assert_eq!(config.engine.default_duration, Duration::from_secs(30));
        assert_eq!(config.engine.request_timeout, Duration::from_secs(10));
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.format, LogFormat::Json);
    });
}

#[test]
fn test_invalid_env_value() {
    with_vars(vec![("VOLLEY_SERVER_PORT", Some("eighty"))], || {
        let err = ConfigLoader::new().from_env().unwrap_err();
        assert!(matches!(err, ConfigError::EnvError(_)));
        assert!(err.to_string().contains("VOLLEY_SERVER_PORT"));
    });
}

#[test]
fn test_env_override_is_validated() {
    with_vars(vec![("VOLLEY_UI_PATH", Some("no-slashes"))], || {
        let err = ConfigLoader::new().from_env().unwrap_err();
        assert!(matches!(err, ConfigError::DomainError { .. }));
    });
}

#[test]
fn test_custom_prefix() {
    with_vars(vec![("LOADGEN_LOG_LEVEL", Some("trace"))], || {
        let config = ConfigLoader::with_prefix("LOADGEN").from_env().unwrap();
        assert_eq!(config.logging.level, LogLevel::Trace);
    });
}

#[test]
fn test_yaml_file_with_env_override() {
    let yaml = r#"
server:
  bind_address: "0.0.0.0"
  port: 8181
  ui_path: "/fire/"
engine:
  default_qps: 50
  default_connections: 2
  request_timeout: 7
logging:
  level: warn
"#;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();

    with_vars(vec![("VOLLEY_ENGINE_DEFAULT_CONNECTIONS", Some("6"))], || {
        let config = ConfigLoader::new().load(Some(file.path())).unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert_eq!(config.server.port, 8181);
        assert_eq!(config.server.ui_path, "/fire/");
        assert_eq!(config.engine.default_qps, 50.0);
        assert_eq!(config.engine.default_connections, 6);
        assert_eq!(config.engine.request_timeout, Duration::from_secs(7));
        assert_eq!(config.engine.default_duration, Duration::from_secs(5));
        assert_eq!(config.logging.level, LogLevel::Warn);
    });
}

#[test]
fn test_missing_file() {
    let err = ConfigLoader::new().from_file("/nonexistent/volley.yaml").unwrap_err();
    assert!(matches!(err, ConfigError::FileReadError(_)));
}

#[test]
fn test_sample_config_parses_back() {
    let sample = VolleyConfig::generate_sample();
    let parsed: VolleyConfig = serde_yaml::from_str(&sample).unwrap();
    assert!(parsed.validate_all().is_ok());
}
