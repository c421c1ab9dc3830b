use super::settings::Settings;
use super::{load_config, load_config_from};
use serial_test::serial;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_default_settings() {
    let settings = Settings::default();
    assert_eq!(settings.server.host, "0.0.0.0");
    assert_eq!(settings.server.port, 8000);
    assert_eq!(settings.relay.handshake_timeout_ms, 2000);
    assert_eq!(settings.relay.subscriber_queue, 64);
    assert!(settings.relay.forward_handshake);
    assert_eq!(settings.log.level, "info");
    assert_eq!(settings.server.addr(), "0.0.0.0:8000");
}

#[test]
#[serial]
fn load_config_without_sources_uses_defaults() {
    temp_env::with_vars_unset(["PORT", "RELAY_SERVER__PORT", "RELAY_SERVER__HOST"], || {
        let cfg = load_config_from("does/not/exist").expect("load_config failed");
        assert_eq!(cfg.server.port, 8000);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.relay.write_timeout_ms, 5000);
    });
}

#[test]
#[serial]
fn port_env_overrides_listen_port() {
    temp_env::with_vars(
        [("PORT", Some("9123")), ("RELAY_SERVER__PORT", Some("7000"))],
        || {
            let cfg = load_config().expect("load_config failed");
            assert_eq!(cfg.server.port, 9123);
        },
    );
}

#[test]
#[serial]
fn prefixed_env_sets_nested_values() {
    temp_env::with_vars(
        [
            ("PORT", None),
            ("RELAY_SERVER__HOST", Some("127.0.0.1")),
            ("RELAY_RELAY__HANDSHAKE_TIMEOUT_MS", Some("250")),
            ("RELAY_RELAY__FORWARD_HANDSHAKE", Some("false")),
            ("RELAY_LOG__LEVEL", Some("debug")),
        ],
        || {
            let cfg = load_config().expect("load_config failed");
            assert_eq!(cfg.server.host, "127.0.0.1");
            assert_eq!(cfg.server.port, 8000);
            assert_eq!(cfg.relay.handshake_timeout_ms, 250);
            assert!(!cfg.relay.forward_handshake);
            assert_eq!(cfg.relay.write_timeout_ms, 5000);
            assert_eq!(cfg.log.level, "debug");
        },
    );
}

#[test]
#[serial]
fn load_config_from_file_overrides_defaults() {
    let tmp = TempDir::new().expect("create tempdir");
    let toml = r#"
        [server]
        host = "127.0.0.1"
        port = 9000

        [relay]
        handshake_timeout_ms = 500
        subscriber_queue = 8
    "#;
    let path = tmp.path().join("relay.toml");
    fs::write(&path, toml).expect("write config file");
    let base = tmp.path().join("relay");

    temp_env::with_vars_unset(["PORT", "RELAY_SERVER__PORT", "RELAY_SERVER__HOST"], || {
        let cfg = load_config_from(base.to_str().unwrap()).expect("load_config failed");
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.relay.handshake_timeout_ms, 500);
        assert_eq!(cfg.relay.subscriber_queue, 8);
        assert_eq!(cfg.relay.write_timeout_ms, 5000);
    });
}
