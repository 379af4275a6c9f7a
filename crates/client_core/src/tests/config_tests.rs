use super::*;

use std::{
    env,
    time::{SystemTime, UNIX_EPOCH},
};

#[test]
fn defaults_point_at_local_service() {
    let settings = ClientSettings::default();
    assert_eq!(settings.server_url, "http://localhost:8083");
    assert_eq!(settings.request_timeout(), Some(Duration::from_secs(30)));
}

#[test]
fn zero_timeout_disables_it() {
    let settings = ClientSettings {
        request_timeout_secs: 0,
        ..ClientSettings::default()
    };
    assert_eq!(settings.request_timeout(), None);
}

#[test]
fn file_values_override_defaults() {
    let mut settings = ClientSettings::default();
    apply_file_overrides(
        &mut settings,
        "server_url = \"http://compiler.internal:9000\"\nrequest_timeout_secs = 5\n",
    );
    assert_eq!(settings.server_url, "http://compiler.internal:9000");
    assert_eq!(settings.request_timeout_secs, 5);
}

#[test]
fn malformed_file_keeps_defaults() {
    let mut settings = ClientSettings::default();
    apply_file_overrides(&mut settings, "server_url = [not valid");
    assert_eq!(settings, ClientSettings::default());
}

#[test]
fn app_prefixed_env_wins_over_plain_env() {
    let mut settings = ClientSettings::default();
    apply_env_overrides(&mut settings, |key| match key {
        "COMPILER_API_URL" => Some("http://plain:1".to_string()),
        "APP__SERVER_URL" => Some("http://prefixed:2".to_string()),
        "APP__REQUEST_TIMEOUT_SECS" => Some("not-a-number".to_string()),
        _ => None,
    });
    assert_eq!(settings.server_url, "http://prefixed:2");
    assert_eq!(settings.request_timeout_secs, 30);
}

#[test]
fn loads_settings_file_from_disk() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = env::temp_dir().join(format!("compiler_client_settings_{suffix}"));
    fs::create_dir_all(&temp_root).expect("temp root");
    let path = temp_root.join(SETTINGS_FILE);
    fs::write(&path, "request_timeout_secs = 12\n").expect("write settings");

    let settings = load_settings_from(&path);
    if env::var("APP__REQUEST_TIMEOUT_SECS").is_err() {
        assert_eq!(settings.request_timeout_secs, 12);
    }

    fs::remove_dir_all(temp_root).expect("cleanup");
}
