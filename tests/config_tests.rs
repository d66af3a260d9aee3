use std::collections::HashMap;
use std::fs;

use chrono::{NaiveDate, Weekday};
use exam_timetable::config::{
    DEFAULT_BACKEND_URL, DEFAULT_PAGE_SIZE, ENV_BACKEND_TOKEN, ENV_BACKEND_URL, MAX_WINDOW_DAYS,
};
use exam_timetable::{AssignmentPolicy, ConfigError, TimetableConfig};
use tempfile::tempdir;

#[test]
fn empty_document_uses_defaults() {
    let config: TimetableConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config, TimetableConfig::default());
    assert_eq!(config.backend.base_url, DEFAULT_BACKEND_URL);
    assert_eq!(config.backend.page_size, DEFAULT_PAGE_SIZE);
    assert_eq!(config.backend.token, None);
    assert_eq!(config.policy, AssignmentPolicy::Strict);
    assert_eq!(config.calendar.disallowed_days(), &[Weekday::Sun]);
    assert!(!config.persist_exam_window);
}

#[test]
fn load_from_file_reads_every_section() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("timetable.json");
    fs::write(
        &path,
        r#"{
            "backend": {"base_url": "http://localhost:8090/", "token": "abc", "timeout_secs": 5},
            "calendar": {"disallowed_days": ["Sun", "Sat"], "holidays": ["2025-03-03"]},
            "policy": "multi_select",
            "default_window_days": 14,
            "persist_exam_window": true
        }"#,
    )
    .unwrap();

    let config = TimetableConfig::load_from_file(&path).unwrap();
    assert_eq!(config.backend.trimmed_base_url(), "http://localhost:8090");
    assert_eq!(config.backend.token.as_deref(), Some("abc"));
    assert_eq!(config.backend.timeout(), Some(std::time::Duration::from_secs(5)));
    assert_eq!(config.policy, AssignmentPolicy::MultiSelect);
    assert_eq!(config.default_window_days, 14);
    assert!(config.persist_exam_window);
    assert_eq!(
        config.calendar.holidays(),
        &[NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()]
    );
    assert_eq!(config.calendar.disallowed_days().len(), 2);
}

#[test]
fn missing_and_malformed_files_are_errors() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("absent.json");
    assert!(matches!(
        TimetableConfig::load_from_file(&missing),
        Err(ConfigError::Io(_))
    ));

    let broken = dir.path().join("broken.json");
    fs::write(&broken, "{ not json").unwrap();
    assert!(matches!(
        TimetableConfig::load_from_file(&broken),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn validation_rejects_unusable_values() {
    let mut config = TimetableConfig::default();
    config.backend.page_size = 0;
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

    let mut config = TimetableConfig::default();
    config.default_window_days = -1;
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

    let config: TimetableConfig =
        serde_json::from_str(r#"{"default_window_days": 1000000000000}"#).unwrap();
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

    let mut config = TimetableConfig::default();
    config.default_window_days = MAX_WINDOW_DAYS;
    assert!(config.validate().is_ok());
    config.default_window_days = MAX_WINDOW_DAYS + 1;
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

    let config: TimetableConfig = serde_json::from_str(
        r#"{"calendar": {"disallowed_days": ["Mon","Tue","Wed","Thu","Fri","Sat","Sun"]}}"#,
    )
    .unwrap();
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

    assert!(TimetableConfig::default().validate().is_ok());
}

#[test]
fn environment_overrides_url_and_token() {
    let env: HashMap<&str, &str> = HashMap::from([
        (ENV_BACKEND_URL, "http://records.internal"),
        (ENV_BACKEND_TOKEN, " secret "),
    ]);
    let mut config = TimetableConfig::default();
    config.apply_overrides_from(|key| env.get(key).map(|v| v.to_string()));
    assert_eq!(config.backend.base_url, "http://records.internal");
    assert_eq!(config.backend.token.as_deref(), Some("secret"));
}

#[test]
fn blank_environment_values_do_not_override() {
    let env: HashMap<&str, &str> =
        HashMap::from([(ENV_BACKEND_URL, "  "), (ENV_BACKEND_TOKEN, "")]);
    let mut config = TimetableConfig::default();
    config.backend.token = Some("from-file".into());
    config.apply_overrides_from(|key| env.get(key).map(|v| v.to_string()));
    assert_eq!(config.backend.base_url, DEFAULT_BACKEND_URL);
    assert_eq!(config.backend.token, None);
}
