use super::*;

use std::{
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn lookup_from<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
    move |key| {
        pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
    }
}

#[test]
fn defaults_match_documented_values() {
    let settings = OperatorSettings::default();
    assert_eq!(settings.user_id, "user_123");
    assert_eq!(settings.request_timeout(), Duration::from_secs(60));
    assert_eq!(settings.markup_policy, MarkupPolicy::Sanitize);
    assert!(settings.accept_list().allows("inventory.csv"));
    assert!(!settings.accept_list().allows("inventory.xlsx"));
}

#[test]
fn file_values_override_defaults() {
    let mut settings = OperatorSettings::default();
    apply_overrides(
        &mut settings,
        lookup_from(&[
            ("api_base_url", "https://assistant.example/"),
            ("request_timeout_secs", "15"),
            ("markup_policy", "trust"),
            ("upload_accept", ".csv"),
        ]),
    );

    assert_eq!(settings.api_base_url, "https://assistant.example/");
    assert_eq!(settings.request_timeout_secs, 15);
    assert_eq!(settings.markup_policy, MarkupPolicy::Trust);
    assert!(!settings.accept_list().allows("photo.png"));
}

#[test]
fn app_prefixed_env_wins_over_plain_env() {
    let mut settings = OperatorSettings::default();
    apply_env_overrides(
        &mut settings,
        lookup_from(&[
            ("ASSISTANT_API_URL", "https://plain.example"),
            ("APP__API_BASE_URL", "https://app.example"),
            ("APP__USER_ID", "ops-7"),
        ]),
    );

    assert_eq!(settings.api_base_url, "https://app.example");
    assert_eq!(settings.user_id, "ops-7");
}

#[test]
fn invalid_values_are_ignored() {
    let mut settings = OperatorSettings::default();
    apply_env_overrides(
        &mut settings,
        lookup_from(&[
            ("APP__REQUEST_TIMEOUT_SECS", "soon"),
            ("APP__MARKUP_POLICY", "html"),
        ]),
    );
    assert_eq!(settings, OperatorSettings::default());

    apply_env_overrides(&mut settings, lookup_from(&[("APP__REQUEST_TIMEOUT_SECS", "0")]));
    assert_eq!(settings.request_timeout_secs, 60);
}

#[test]
fn finalize_normalizes_and_rejects_bad_urls() {
    let settings = finalize(OperatorSettings {
        api_base_url: "https://assistant.example/".into(),
        ..OperatorSettings::default()
    })
    .expect("valid");
    assert_eq!(settings.api_base_url, "https://assistant.example");

    let err = finalize(OperatorSettings {
        api_base_url: "not a url".into(),
        ..OperatorSettings::default()
    })
    .expect_err("invalid url");
    assert!(err.to_string().contains("invalid assistant base url"), "{err}");

    assert!(finalize(OperatorSettings {
        user_id: "  ".into(),
        ..OperatorSettings::default()
    })
    .is_err());
}

#[test]
fn load_settings_reads_toml_file() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = env::temp_dir().join(format!("store_operator_config_test_{suffix}"));
    fs::create_dir_all(&temp_root).expect("temp root");
    let path = temp_root.join("operator.toml");
    fs::write(
        &path,
        "user_id = \"ops-from-file\"\nrequest_timeout_secs = \"30\"\n",
    )
    .expect("write config");

    let settings = load_settings(&path).expect("load");
    assert_eq!(settings.request_timeout_secs, 30);
    if env::var("APP__USER_ID").is_err() {
        assert_eq!(settings.user_id, "ops-from-file");
    }

    fs::write(&path, "user_id = [1, 2]\n").expect("write bad config");
    assert!(load_settings(&path).is_err());

    fs::remove_dir_all(temp_root).expect("cleanup");
}

#[test]
fn missing_config_file_falls_back_to_defaults() {
    let path = env::temp_dir().join("store_operator_definitely_missing.toml");
    let settings = load_settings(&path).expect("load");
    if env::var("APP__REQUEST_TIMEOUT_SECS").is_err() {
        assert_eq!(settings.request_timeout_secs, 60);
    }
}
