use super::*;

use std::{
    collections::HashMap,
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn temp_config(contents: &str) -> std::path::PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = env::temp_dir().join(format!("guesser_config_test_{suffix}"));
    fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join(DEFAULT_CONFIG_FILE);
    fs::write(&path, contents).expect("write config");
    path
}

#[test]
fn normalizes_bare_host_to_http_url() {
    assert_eq!(
        normalize_service_url("127.0.0.1:8000").expect("normalize"),
        "http://127.0.0.1:8000"
    );
}

#[test]
fn strips_trailing_slash_and_whitespace() {
    assert_eq!(
        normalize_service_url("  https://guess.example.com/api/  ").expect("normalize"),
        "https://guess.example.com/api"
    );
}

#[test]
fn empty_service_url_falls_back_to_default() {
    assert_eq!(
        normalize_service_url("   ").expect("normalize"),
        DEFAULT_SERVICE_URL
    );
}

#[test]
fn rejects_non_http_scheme() {
    let err = normalize_service_url("ftp://127.0.0.1").expect_err("must fail");
    assert!(matches!(err, ClientError::Config(_)), "unexpected error: {err}");
}

#[test]
fn missing_file_yields_defaults() {
    let path = env::temp_dir().join("guesser_config_test_missing/none.toml");
    let loaded = load_settings_from(&path);
    assert_eq!(loaded.first_question, DEFAULT_FIRST_QUESTION);
    assert_eq!(loaded.connect_timeout(), Duration::from_secs(10));
}

#[test]
fn file_values_override_defaults() {
    let path = temp_config(
        r#"
service_url = "http://10.0.0.5:9000"
request_timeout_secs = 5
notice_ttl_secs = 7
first_question = "Is it bigger than a breadbox?"
"#,
    );

    let mut settings = Settings::default();
    let raw = fs::read_to_string(&path).expect("read");
    apply_file_settings(&mut settings, toml::from_str(&raw).expect("parse"));

    assert_eq!(settings.service_url, "http://10.0.0.5:9000");
    assert_eq!(settings.request_timeout(), Duration::from_secs(5));
    assert_eq!(settings.connect_timeout_secs, 10);
    assert_eq!(settings.notice_ttl_secs, 7);
    assert_eq!(settings.first_question, "Is it bigger than a breadbox?");

    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn blank_first_question_in_file_is_ignored() {
    let mut settings = Settings::default();
    apply_file_settings(
        &mut settings,
        toml::from_str(r#"first_question = "  ""#).expect("parse"),
    );
    assert_eq!(settings.first_question, DEFAULT_FIRST_QUESTION);
}

#[test]
fn env_overrides_take_precedence_and_skip_garbage() {
    let vars: HashMap<&str, &str> = [
        ("GUESSER_SERVICE_URL", "http://first:1"),
        ("APP__SERVICE_URL", "http://second:2"),
        ("APP__REQUEST_TIMEOUT_SECS", "12"),
        ("APP__NOTICE_TTL_SECS", "soon"),
    ]
    .into_iter()
    .collect();

    let mut settings = Settings::default();
    apply_env_overrides(&mut settings, |key| vars.get(key).map(|v| v.to_string()));

    assert_eq!(settings.service_url, "http://second:2");
    assert_eq!(settings.request_timeout_secs, 12);
    assert_eq!(settings.notice_ttl_secs, 3);
}
