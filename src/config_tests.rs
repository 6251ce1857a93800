#![allow(clippy::unwrap_used)]

use super::*;

#[test]
fn test_defaults() {
    let s = Settings::default();
    assert_eq!(s.company_id, "default");
    assert_eq!(s.max_write_attempts, 3);
    assert_eq!(s.log_level, "warn");
}

#[test]
fn test_missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let s = Settings::load_from(&dir.path().join("settings.json")).unwrap();
    assert_eq!(s, Settings::default());
}

#[test]
fn test_partial_file_merges_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, r#"{"company_id": "acme", "max_write_attempts": 5}"#).unwrap();
    let s = Settings::load_from(&path).unwrap();
    assert_eq!(s.company_id, "acme");
    assert_eq!(s.max_write_attempts, 5);
    assert_eq!(s.log_level, "warn");
}

#[test]
fn test_save_and_load_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("settings.json");
    let settings = Settings {
        data_dir: dir.path().join("data"),
        company_id: "acme".into(),
        max_write_attempts: 2,
        log_level: "debug".into(),
    };
    settings.save_to(&path).unwrap();
    assert_eq!(Settings::load_from(&path).unwrap(), settings);
}

#[test]
fn test_invalid_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, "not json").unwrap();
    let err = Settings::load_from(&path).unwrap_err();
    assert!(err.to_string().starts_with("Invalid settings file"));
}

#[test]
fn test_database_path_creates_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings {
        data_dir: dir.path().join("books"),
        ..Settings::default()
    };
    let path = settings.database_path().unwrap();
    assert!(dir.path().join("books").is_dir());
    assert_eq!(path.file_name().unwrap(), "bookkeep.db");
}
