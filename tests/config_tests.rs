use anyhow::Result;
use confectionery::config::{AppConfig, PathResolver, DEFAULT_DATA_DIR};
use std::collections::HashMap;
use tempfile::TempDir;

fn lookup_from(vars: HashMap<&'static str, String>) -> impl Fn(&str) -> Option<String> {
    move |key| vars.get(key).cloned()
}

#[test]
fn test_config_from_lookup() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let data_dir = temp_dir.path().join("photos");

    let config = AppConfig::from_lookup(lookup_from(HashMap::from([
        ("TELEGRAM_BOT_TOKEN", " 123:abc ".to_string()),
        ("DATA_DIR", data_dir.to_string_lossy().to_string()),
        ("STAFF_IDS", "100, 200".to_string()),
    ])))?;

    assert_eq!(config.bot_token, "123:abc");
    assert_eq!(config.staff_ids, vec![100, 200]);
    assert!(data_dir.is_dir());
    assert_eq!(config.storage.base_dir(), std::fs::canonicalize(&data_dir)?);

    Ok(())
}

#[test]
fn test_missing_token_is_rejected() {
    let result = AppConfig::from_lookup(lookup_from(HashMap::new()));
    assert!(result.is_err());

    let result = AppConfig::from_lookup(lookup_from(HashMap::from([(
        "TELEGRAM_BOT_TOKEN",
        "   ".to_string(),
    )])));
    assert!(result.is_err());
}

#[test]
fn test_invalid_staff_ids_are_rejected() -> Result<()> {
    let temp_dir = TempDir::new()?;

    let result = AppConfig::from_lookup(lookup_from(HashMap::from([
        ("TELEGRAM_BOT_TOKEN", "123:abc".to_string()),
        ("DATA_DIR", temp_dir.path().to_string_lossy().to_string()),
        ("STAFF_IDS", "100,pastry-chef".to_string()),
    ])));
    assert!(result.is_err());

    Ok(())
}

#[test]
fn test_default_data_dir_name() {
    assert_eq!(DEFAULT_DATA_DIR, "data");
}

#[test]
fn test_resolved_paths_stay_under_data_dir() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = AppConfig::from_lookup(lookup_from(HashMap::from([
        ("TELEGRAM_BOT_TOKEN", "123:abc".to_string()),
        ("DATA_DIR", temp_dir.path().to_string_lossy().to_string()),
    ])))?;

    let base = config.storage.base_dir().to_path_buf();
    let user_dir = config.storage.user_path(5, None)?;
    assert!(user_dir.starts_with(&base));
    assert!(config.storage.resolve_relative_path("users/../../x").is_none());
    assert!(config.staff_ids.is_empty());

    Ok(())
}
