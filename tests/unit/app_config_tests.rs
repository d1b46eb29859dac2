/*!
 * Tests for configuration loading, validation and overrides
 */

use sheet_translator::app_config::{Config, ConfigOverrides, LogLevel, TranslationProvider};
use std::time::Duration;
use tempfile::TempDir;

use crate::common;

#[test]
fn test_loadOrCreate_missingFile_shouldWriteDefaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("conf.json");

    let config = Config::load_or_create(&path).unwrap();

    assert!(path.exists());
    assert_eq!(config.dispatch.parallel_tasks, 5);
    let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["source_language"], "en");
}

#[test]
fn test_loadOrCreate_existingFile_shouldKeepSavedValues() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("conf.json");

    let mut config = Config::default();
    config.dispatch.parallel_tasks = 8;
    config.translation.provider = TranslationProvider::Anthropic;
    config.save(&path).unwrap();

    let reloaded = Config::load_or_create(&path).unwrap();
    assert_eq!(reloaded.dispatch.parallel_tasks, 8);
    assert_eq!(reloaded.translation.provider, TranslationProvider::Anthropic);
}

#[test]
fn test_loadOrCreate_invalidJson_shouldFail() {
    let dir = TempDir::new().unwrap();
    let path = common::write_workbook(dir.path(), "conf.json", "{ not json").unwrap();

    assert!(Config::load_or_create(&path).is_err());
}

#[test]
fn test_validate_badHighlightColor_shouldFail() {
    let mut config = common::test_config();
    config.sheets.highlight_translations = true;
    config.sheets.highlight_color = "yellow".to_string();

    assert!(config.validate().is_err());

    config.sheets.highlight_translations = false;
    assert!(config.validate().is_ok());
}

#[test]
fn test_overrides_shouldTargetSelectedProvider() {
    let mut config = Config::default();
    let overrides = ConfigOverrides {
        provider: Some(TranslationProvider::Anthropic),
        model: Some("claude-3-haiku-20240307".to_string()),
        anthropic_api_key: Some("anthropic-key".to_string()),
        openai_api_key: Some(String::new()),
        ..Default::default()
    };

    overrides.apply(&mut config);

    assert_eq!(config.translation.provider, TranslationProvider::Anthropic);
    assert_eq!(config.translation.get_model(), "claude-3-haiku-20240307");
    assert_eq!(config.translation.get_api_key(), "anthropic-key");
    assert!(config.validate().is_ok());
}

#[test]
fn test_overrides_shouldSetContextAndJournal() {
    let mut config = Config::default();
    let overrides = ConfigOverrides {
        game_context_document: Some("context-doc".to_string()),
        feature_sheet: Some(12),
        game_context_sheet: Some(34),
        disable_journal: true,
        log_level: Some(LogLevel::Debug),
        ..Default::default()
    };

    overrides.apply(&mut config);

    assert_eq!(config.context.document.as_deref(), Some("context-doc"));
    assert_eq!(config.context.feature_sheet, Some(12));
    assert_eq!(config.context.game_context_sheet, Some(34));
    assert!(!config.context.ignore);
    assert!(!config.journal.enabled);
    assert_eq!(config.log_level, LogLevel::Debug);
}

#[test]
fn test_translationSettings_shouldCarryDispatchAndRetryValues() {
    let mut config = common::test_config();
    config.dispatch.parallel_tasks = 2;
    config.dispatch.stagger_ms = 250;
    config.translation.common.retry_count = 4;
    config.translation.common.max_rate_limit_wait_secs = 60;

    let settings = config.translation_settings();

    assert_eq!(settings.dispatch.parallel_tasks, 2);
    assert_eq!(settings.dispatch.stagger, Duration::from_millis(250));
    assert_eq!(settings.retry.retries, 4);
    assert_eq!(settings.retry.max_rate_limit_wait_total, Duration::from_secs(60));
    assert!(settings.highlight.is_none());
}
