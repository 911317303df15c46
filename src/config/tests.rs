use super::settings::Settings;
use super::{load_config_from, ENV_PREFIX};
use serial_test::serial;
use std::fs;
use tempfile::TempDir;

fn env_key(section: &str, key: &str) -> String {
    format!("{ENV_PREFIX}__{section}__{key}")
}

#[test]
fn test_default_settings() {
    let settings = Settings::default();
    assert_eq!(settings.server.host, "127.0.0.1");
    assert_eq!(settings.server.port, 5000);
    assert_eq!(settings.server.addr(), "127.0.0.1:5000");
    assert_eq!(settings.broker.max_connections, 1000);
    assert_eq!(settings.broker.handshake_timeout_ms, 5000);
    assert_eq!(settings.logging.level, "info");
}

#[test]
#[serial]
fn load_config_without_file_uses_defaults() {
    let tmp = TempDir::new().expect("create tempdir");
    let path = tmp.path().join("missing");

    let cfg = load_config_from(path.to_str().unwrap()).expect("load_config failed");
    assert_eq!(cfg.server.port, 5000);
    assert_eq!(cfg.broker.max_connections, 1000);
}

#[test]
#[serial]
fn load_config_from_file_overrides_defaults() {
    let tmp = TempDir::new().expect("create tempdir");
    let toml = r#"
        [server]
        host = "0.0.0.0"
        port = 9000

        [broker]
        max_connections = 10
    "#;
    fs::write(tmp.path().join("pullsub.toml"), toml).expect("write config file");

    let path = tmp.path().join("pullsub");
    let cfg = load_config_from(path.to_str().unwrap()).expect("load_config failed");
    assert_eq!(cfg.server.host, "0.0.0.0");
    assert_eq!(cfg.server.port, 9000);
    assert_eq!(cfg.broker.max_connections, 10);
    // Not present in the file
    assert_eq!(cfg.logging.level, "info");
}

#[test]
#[serial]
fn env_overrides_file() {
    let tmp = TempDir::new().expect("create tempdir");
    fs::write(
        tmp.path().join("pullsub.toml"),
        "[server]\nport = 9000\n[logging]\nlevel = \"warn\"\n",
    )
    .expect("write config file");
    let path = tmp.path().join("pullsub");

    temp_env::with_vars(
        [
            (env_key("SERVER", "PORT"), Some("9100")),
            (env_key("BROKER", "MAX_CONNECTIONS"), Some("3")),
            (env_key("BROKER", "HANDSHAKE_TIMEOUT_MS"), Some("250")),
        ],
        || {
            let cfg = load_config_from(path.to_str().unwrap()).expect("load_config failed");
            assert_eq!(cfg.server.port, 9100);
            assert_eq!(cfg.broker.max_connections, 3);
            assert_eq!(cfg.broker.handshake_timeout_ms, 250);
            assert_eq!(cfg.logging.level, "warn");
        },
    );
}

#[test]
#[serial]
fn invalid_port_is_a_config_error() {
    let tmp = TempDir::new().expect("create tempdir");
    let path = tmp.path().join("missing");

    temp_env::with_var(env_key("SERVER", "PORT"), Some("not-a-port"), || {
        assert!(load_config_from(path.to_str().unwrap()).is_err());
    });
}
