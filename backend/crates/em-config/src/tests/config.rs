use crate::Config;
use crate::tests::{EnvGuard, setup_config_dir};

use googletest::assert_that;
use googletest::prelude::{anything, eq, err, ok};
use serial_test::serial;

// =========================================================================
// Happy Path Tests
// =========================================================================

#[test]
#[serial]
fn given_no_config_file_when_load_then_ok_with_defaults() {
    // Given
    let (_temp, _guard) = setup_config_dir();

    // When
    let result = Config::load();

    // Then
    assert_that!(result, ok(anything()));
    let config = result.unwrap();
    assert_that!(config.server.port, eq(crate::DEFAULT_PORT));
    assert_that!(
        config.server.max_connections,
        eq(crate::DEFAULT_MAX_CONNECTIONS)
    );
    assert_that!(config.auth.enabled, eq(false));
    assert_that!(config.websocket.heartbeat_interval_secs, eq(30));
    assert_that!(config.producer.devices.len(), eq(3));
}

#[test]
#[serial]
fn given_no_config_file_when_load_and_validate_then_ok() {
    // Given
    let (_temp, _guard) = setup_config_dir();

    // When
    let config = Config::load().unwrap();
    let result = config.validate();

    // Then
    assert_that!(result, ok(anything()));
}

#[test]
#[serial]
fn given_valid_toml_file_when_load_then_uses_toml_values() {
    // Given
    let (temp, _guard) = setup_config_dir();
    std::fs::write(
        temp.path().join("config.toml"),
        r#"
            [server]
            port = 9000
            max_connections = 5000

            [producer]
            min_interval_ms = 200
            max_interval_ms = 800
            devices = ["meter-a", "meter-b"]
        "#,
    )
    .unwrap();

    // When
    let config = Config::load().unwrap();

    // Then
    assert_that!(config.server.port, eq(9000));
    assert_that!(config.server.max_connections, eq(5000));
    assert_that!(config.producer.min_interval_ms, eq(200));
    assert_that!(config.producer.max_interval_ms, eq(800));
    assert_that!(config.producer.devices.len(), eq(2));
    // Sections absent from the file keep their defaults
    assert_that!(config.websocket.send_buffer_size, eq(100));
}

#[test]
#[serial]
fn given_env_var_and_toml_when_load_then_env_var_overrides_toml() {
    // Given
    let (temp, _guard) = setup_config_dir();
    std::fs::write(
        temp.path().join("config.toml"),
        r#"
            [server]
            port = 9000
        "#,
    )
    .unwrap();
    let _port = EnvGuard::set("EM_SERVER_PORT", "9100");

    // When
    let config = Config::load().unwrap();

    // Then
    assert_that!(config.server.port, eq(9100));
}

#[test]
#[serial]
fn given_device_list_env_var_when_load_then_split_on_commas() {
    // Given
    let (_temp, _guard) = setup_config_dir();
    let _devices = EnvGuard::set("EM_PRODUCER_DEVICES", "main-meter, heat-pump,,solar");

    // When
    let config = Config::load().unwrap();

    // Then
    assert_eq!(
        config.producer.devices,
        vec!["main-meter", "heat-pump", "solar"]
    );
}

#[test]
#[serial]
fn given_invalid_log_level_env_var_when_load_then_falls_back_to_info() {
    // Given
    let (_temp, _guard) = setup_config_dir();
    let _level = EnvGuard::set("EM_LOG_LEVEL", "chatty");

    // When
    let config = Config::load().unwrap();

    // Then
    assert_that!(*config.logging.level, eq(log::LevelFilter::Info));
}

// =========================================================================
// Error Tests
// =========================================================================

#[test]
#[serial]
fn given_malformed_toml_when_load_then_error() {
    // Given
    let (temp, _guard) = setup_config_dir();
    std::fs::write(temp.path().join("config.toml"), "[server\nport = ").unwrap();

    // When
    let result = Config::load();

    // Then
    assert_that!(result, err(anything()));
}

#[test]
#[serial]
fn given_missing_config_dir_when_load_then_dir_created() {
    // Given
    let (temp, _guard) = setup_config_dir();
    let nested = temp.path().join("nested").join("em");
    let _dir = EnvGuard::set("EM_CONFIG_DIR", nested.to_str().unwrap());

    // When
    let result = Config::load();

    // Then
    assert_that!(result, ok(anything()));
    assert!(nested.exists());
}
