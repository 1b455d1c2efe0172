use hermes_config::{ConfigError, ConfigLoader, LogFormat};
use std::io::Write;
use tempfile::Builder;

fn write_config(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn loads_toml_file_over_defaults() {
    let file = write_config(
        ".toml",
        r#"
            [server]
            http_addr = "127.0.0.1:9000"
            root_path = "/api"

            [logging]
            format = "compact"

            [multipart]
            max_fields = 8
        "#,
    );

    let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
    assert_eq!(config.server.http_addr, "127.0.0.1:9000");
    assert_eq!(config.server.root_path, "/api");
    assert_eq!(config.logging.format, LogFormat::Compact);
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.multipart.max_fields, 8);
    assert_eq!(config.server_config().root_path(), "/api");
}

#[test]
fn loads_json_file() {
    let file = write_config(".json", r#"{"server": {"allow_origin": "*"}}"#);
    let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
    assert_eq!(config.server.allow_origin.as_deref(), Some("*"));
}

#[test]
fn rejects_unknown_fields_in_file() {
    let file = write_config(".toml", "[server]\nhttp_adr = \"127.0.0.1:9000\"\n");
    let err = ConfigLoader::new().with_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)), "{err}");
}

#[test]
fn rejects_unknown_extension() {
    let file = write_config(".yaml", "server: {}\n");
    let err = ConfigLoader::new().with_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::UnsupportedFormat(_)), "{err}");
}

#[test]
fn validation_runs_after_file() {
    let file = write_config(".toml", "[server]\nhttp_addr = \"not an address\"\n");
    let err = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { .. }), "{err}");
}

#[test]
fn environment_overrides_file() {
    let file = write_config(".toml", "[server]\nhttp_addr = \"127.0.0.1:9000\"\n");
    std::env::set_var("HERMES_CFG_TEST__SERVER__HTTP_ADDR", "127.0.0.1:9100");
    let config = ConfigLoader::new()
        .with_file(file.path())
        .unwrap()
        .with_env_prefix("hermes_cfg_test")
        .load()
        .unwrap();
    std::env::remove_var("HERMES_CFG_TEST__SERVER__HTTP_ADDR");
    assert_eq!(config.server.http_addr, "127.0.0.1:9100");
}
