//! Integration tests for loading configuration from a TOML file.
//!
//! Exercises the file path end to end: read -> raw parse -> key resolution
//! -> validated Config with KeySource metadata.

use std::io::Write;

use voxgate::config::{Config, ConfigError, KeySource};
use voxgate::keys::RotationPolicy;

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(content.as_bytes()).expect("write config");
    file
}

#[test]
fn test_file_with_literal_keys() {
    let file = write_config(
        r#"
[server]
listen = "127.0.0.1:19876"

[tts]
api_keys = "tts-literal"

[chat]
api_keys = "c1, c2"
rotation = "round_robin"
"#,
    );

    let (config, key_sources) = Config::load(Some(file.path())).expect("config loads");

    assert_eq!(config.server.listen, "127.0.0.1:19876");
    assert_eq!(
        config.tts.api_keys.as_ref().unwrap().expose_secret(),
        "tts-literal"
    );
    assert_eq!(config.chat.rotation, RotationPolicy::RoundRobin);
    assert_eq!(
        key_sources,
        vec![
            ("tts".to_string(), KeySource::Literal),
            ("chat".to_string(), KeySource::Literal),
        ]
    );
}

#[test]
fn test_file_with_unset_reference_names_variable_and_section() {
    let var_name = "VOXGATE_TEST_DEFINITELY_UNSET_7f3a";
    let file = write_config(&format!(
        r#"
[chat]
api_keys = "${{{}}}"
"#,
        var_name
    ));

    let err = Config::from_file_with_env(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::EnvVar { .. }));
    let message = err.to_string();
    assert!(message.contains(var_name), "{}", message);
    assert!(message.contains("chat"), "{}", message);
}

#[test]
fn test_missing_file_is_io_error_naming_path() {
    let dir = tempfile::tempdir().expect("temp dir");
    let missing = dir.path().join("nope.toml");

    let err = Config::from_file_with_env(&missing).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("nope.toml"));
}

#[test]
fn test_invalid_toml_is_parse_error() {
    let file = write_config("[tts\nendpoint = ");
    let err = Config::from_file_with_env(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}
