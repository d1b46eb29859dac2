use anyhow::{Context, Result, anyhow};
use log::warn;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::table::{CellStyle, Color, SheetId};
use crate::translation::{BatchingPolicy, DispatchSettings, RetryPolicy, TranslationSettings};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Code of the source column (e.g. "en" for a `[en] English` header)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Window sizing and batching
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Spreadsheet access and write styling
    #[serde(default)]
    pub sheets: SheetsConfig,

    /// Game context document
    #[serde(default)]
    pub context: ContextConfig,

    /// Run journal
    #[serde(default)]
    pub journal: JournalConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: OpenAI
    #[default]
    OpenAI,
    // @provider: Anthropic
    Anthropic,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::OpenAI => "openai".to_string(),
            Self::Anthropic => "anthropic".to_string(),
        }
    }
}

// Implement Display trait for TranslationProvider
impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

// Implement FromStr trait for TranslationProvider
impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Organization id (OpenAI only)
    #[serde(default)]
    pub organization: Option<String>,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: TranslationProvider) -> Self {
        match provider_type {
            TranslationProvider::OpenAI => Self {
                provider_type: "openai".to_string(),
                model: default_openai_model(),
                api_key: String::new(),
                organization: None,
                endpoint: default_openai_endpoint(),
                timeout_secs: default_timeout_secs(),
            },
            TranslationProvider::Anthropic => Self {
                provider_type: "anthropic".to_string(),
                model: default_anthropic_model(),
                api_key: String::new(),
                organization: None,
                endpoint: default_anthropic_endpoint(),
                timeout_secs: default_timeout_secs(),
            },
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Translation provider to use
    #[serde(default)]
    pub provider: TranslationProvider,

    /// Available translation providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Common translation settings
    #[serde(default)]
    pub common: TranslationCommonConfig,
}

/// Common translation settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// Attempts for a failed request, first one included
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Delay between two failed attempts in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Wait after a rate-limit signal that carries no retry-after, in milliseconds
    #[serde(default = "default_rate_limit_wait_ms")]
    pub rate_limit_wait_ms: u64,

    /// Maximum rate-limit waits for one request
    #[serde(default = "default_max_rate_limit_waits")]
    pub max_rate_limit_waits: u32,

    /// Maximum total rate-limit wait for one request, in seconds
    #[serde(default = "default_max_rate_limit_wait_secs")]
    pub max_rate_limit_wait_secs: u64,

    /// Temperature parameter for text generation (0.0 to 1.0)
    /// Lower values make output more deterministic, higher values more creative
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            retry_count: default_retry_count(),
            retry_delay_ms: default_retry_delay_ms(),
            rate_limit_wait_ms: default_rate_limit_wait_ms(),
            max_rate_limit_waits: default_max_rate_limit_waits(),
            max_rate_limit_wait_secs: default_max_rate_limit_wait_secs(),
            temperature: default_temperature(),
        }
    }
}

/// Dispatch and batching configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DispatchConfig {
    /// Maximum requests in flight (window size)
    #[serde(default = "default_parallel_tasks")]
    pub parallel_tasks: usize,

    /// Maximum languages per request
    #[serde(default = "default_batched_languages_size")]
    pub batched_languages_size: usize,

    /// Texts longer than this many characters get one request per language
    #[serde(default = "default_max_text_length_for_batching_languages")]
    pub max_text_length_for_batching_languages: usize,

    /// Start offset between two requests of a window, in milliseconds
    #[serde(default = "default_stagger_ms")]
    pub stagger_ms: u64,

    /// Pause between two windows, in milliseconds
    #[serde(default = "default_cool_down_ms")]
    pub cool_down_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            parallel_tasks: default_parallel_tasks(),
            batched_languages_size: default_batched_languages_size(),
            max_text_length_for_batching_languages: default_max_text_length_for_batching_languages(),
            stagger_ms: default_stagger_ms(),
            cool_down_ms: default_cool_down_ms(),
        }
    }
}

/// Spreadsheet configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SheetsConfig {
    /// Bearer token for the Google Sheets API
    #[serde(default)]
    pub google_access_token: String,

    /// Google Sheets API endpoint
    #[serde(default = "default_sheets_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Highlight translated cells
    #[serde(default = "default_true")]
    pub highlight_translations: bool,

    /// Highlight color as `#rrggbb`
    #[serde(default = "default_highlight_color")]
    pub highlight_color: String,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            google_access_token: String::new(),
            endpoint: default_sheets_endpoint(),
            timeout_secs: default_timeout_secs(),
            highlight_translations: true,
            highlight_color: default_highlight_color(),
        }
    }
}

/// Where the game context comes from
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ContextConfig {
    /// Document holding the feature and game-context sheets
    #[serde(default)]
    pub document: Option<String>,

    /// Feature names sheet id
    #[serde(default)]
    pub feature_sheet: Option<SheetId>,

    /// Game description sheet id
    #[serde(default)]
    pub game_context_sheet: Option<SheetId>,

    /// Skip the game context entirely
    #[serde(default)]
    pub ignore: bool,
}

/// Run journal configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct JournalConfig {
    /// Record runs and unresolved items
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Database path, defaults to the user data directory
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    "en".to_string()
}

fn default_parallel_tasks() -> usize {
    5
}

fn default_batched_languages_size() -> usize {
    5
}

fn default_max_text_length_for_batching_languages() -> usize {
    300
}

fn default_stagger_ms() -> u64 {
    100
}

fn default_cool_down_ms() -> u64 {
    1000
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    3000
}

fn default_rate_limit_wait_ms() -> u64 {
    3000
}

fn default_max_rate_limit_waits() -> u32 {
    30
}

fn default_max_rate_limit_wait_secs() -> u64 {
    600
}

fn default_temperature() -> f32 {
    0.3
}

fn default_true() -> bool {
    true
}

fn default_openai_endpoint() -> String {
    crate::providers::openai::DEFAULT_OPENAI_ENDPOINT.to_string()
}

fn default_anthropic_endpoint() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_sheets_endpoint() -> String {
    crate::table::google::DEFAULT_SHEETS_ENDPOINT.to_string()
}

fn default_highlight_color() -> String {
    "#d9ead3".to_string()
}

fn default_openai_model() -> String {
    "gpt-4-turbo-preview".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-5-sonnet-20240620".to_string()
}

impl Config {
    /// Load a configuration file, creating it with defaults when absent
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            let file = File::open(path).context(format!("Failed to open config file: {}", path.display()))?;
            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .context(format!("Failed to parse config file: {}", path.display()))?;
            Ok(config)
        } else {
            warn!("Config file not found at '{}', creating default config.", path.display());
            let config = Config::default();
            config.save(path)?;
            Ok(config)
        }
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, json).context(format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.source_language.trim().is_empty() {
            return Err(anyhow!("Source language must not be empty"));
        }
        if self.dispatch.parallel_tasks == 0 {
            return Err(anyhow!("parallel_tasks must be at least 1"));
        }
        if self.dispatch.batched_languages_size == 0 {
            return Err(anyhow!("batched_languages_size must be at least 1"));
        }
        if self.translation.common.retry_count == 0 {
            return Err(anyhow!("retry_count must be at least 1"));
        }
        if self.sheets.highlight_translations && Color::from_hex(&self.sheets.highlight_color).is_none() {
            return Err(anyhow!(
                "Invalid highlight color '{}', expected #rrggbb",
                self.sheets.highlight_color
            ));
        }

        // Validate API key for every remote provider
        if self.translation.get_api_key().is_empty() {
            return Err(anyhow!(
                "Translation API key is required for {} provider",
                self.translation.provider.display_name()
            ));
        }

        Ok(())
    }

    /// Style applied to translated cells, if highlighting is on
    pub fn highlight_style(&self) -> Option<CellStyle> {
        if !self.sheets.highlight_translations {
            return None;
        }
        Color::from_hex(&self.sheets.highlight_color).map(CellStyle::highlight)
    }

    /// Settings for the translation service
    pub fn translation_settings(&self) -> TranslationSettings {
        let common = &self.translation.common;
        TranslationSettings {
            source_language: self.source_language.trim().to_string(),
            batching: BatchingPolicy::new(
                self.dispatch.batched_languages_size,
                self.dispatch.max_text_length_for_batching_languages,
            ),
            dispatch: DispatchSettings {
                parallel_tasks: self.dispatch.parallel_tasks,
                stagger: Duration::from_millis(self.dispatch.stagger_ms),
                cool_down: Duration::from_millis(self.dispatch.cool_down_ms),
            },
            retry: RetryPolicy {
                retries: common.retry_count,
                retry_delay: Duration::from_millis(common.retry_delay_ms),
                default_rate_limit_wait: Duration::from_millis(common.rate_limit_wait_ms),
                max_rate_limit_waits: common.max_rate_limit_waits,
                max_rate_limit_wait_total: Duration::from_secs(common.max_rate_limit_wait_secs),
            },
            highlight: self.highlight_style(),
        }
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            translation: TranslationConfig::default(),
            dispatch: DispatchConfig::default(),
            sheets: SheetsConfig::default(),
            context: ContextConfig::default(),
            journal: JournalConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl TranslationConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        let provider_str = self.provider.to_lowercase_string();
        self.available_providers.iter().find(|p| p.provider_type == provider_str)
    }

    /// Mutable access to the active provider configuration, created if missing
    pub fn active_provider_config_mut(&mut self) -> &mut ProviderConfig {
        let provider = self.provider.clone();
        self.provider_config_mut(&provider)
    }

    /// Mutable access to a provider's configuration, created if missing
    pub fn provider_config_mut(&mut self, provider: &TranslationProvider) -> &mut ProviderConfig {
        let provider_str = provider.to_lowercase_string();
        match self.available_providers.iter().position(|p| p.provider_type == provider_str) {
            Some(index) => &mut self.available_providers[index],
            None => {
                self.available_providers.push(ProviderConfig::new(provider.clone()));
                let last = self.available_providers.len() - 1;
                &mut self.available_providers[last]
            }
        }
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.model.is_empty() {
                return provider_config.model.clone();
            }
        }

        // Default fallback based on provider type
        match self.provider {
            TranslationProvider::OpenAI => default_openai_model(),
            TranslationProvider::Anthropic => default_anthropic_model(),
        }
    }

    /// Get the API key for the active provider
    pub fn get_api_key(&self) -> String {
        self.get_active_provider_config()
            .map(|p| p.api_key.clone())
            .unwrap_or_default()
    }

    /// Get the organization for the active provider
    pub fn get_organization(&self) -> Option<String> {
        self.get_active_provider_config()
            .and_then(|p| p.organization.clone())
            .filter(|o| !o.is_empty())
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.endpoint.is_empty() {
                return provider_config.endpoint.clone();
            }
        }

        // Default fallback based on provider type
        match self.provider {
            TranslationProvider::OpenAI => default_openai_endpoint(),
            TranslationProvider::Anthropic => default_anthropic_endpoint(),
        }
    }

    /// Get the timeout for the active provider
    pub fn get_timeout_secs(&self) -> u64 {
        self.get_active_provider_config()
            .map(|p| p.timeout_secs)
            .filter(|t| *t > 0)
            .unwrap_or_else(default_timeout_secs)
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::default(),
            available_providers: vec![
                ProviderConfig::new(TranslationProvider::OpenAI),
                ProviderConfig::new(TranslationProvider::Anthropic),
            ],
            common: TranslationCommonConfig::default(),
        }
    }
}

/// Values from the command line and environment, applied over the file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub provider: Option<TranslationProvider>,
    pub model: Option<String>,
    pub parallel_tasks: Option<usize>,
    pub batched_languages_size: Option<usize>,
    pub max_text_length_for_batching_languages: Option<usize>,
    pub openai_api_key: Option<String>,
    pub openai_organization: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub google_access_token: Option<String>,
    pub game_context_document: Option<String>,
    pub feature_sheet: Option<SheetId>,
    pub game_context_sheet: Option<SheetId>,
    pub ignore_game_context: bool,
    pub log_level: Option<LogLevel>,
    pub disable_journal: bool,
}

impl ConfigOverrides {
    /// Overwrite every field of `config` that has a value here
    pub fn apply(&self, config: &mut Config) {
        if let Some(provider) = &self.provider {
            config.translation.provider = provider.clone();
        }
        if let Some(model) = self.model.as_ref().filter(|m| !m.is_empty()) {
            config.translation.active_provider_config_mut().model = model.clone();
        }

        if let Some(parallel_tasks) = self.parallel_tasks {
            config.dispatch.parallel_tasks = parallel_tasks;
        }
        if let Some(size) = self.batched_languages_size {
            config.dispatch.batched_languages_size = size;
        }
        if let Some(length) = self.max_text_length_for_batching_languages {
            config.dispatch.max_text_length_for_batching_languages = length;
        }

        let openai = TranslationProvider::OpenAI;
        if let Some(key) = self.openai_api_key.as_ref().filter(|k| !k.is_empty()) {
            config.translation.provider_config_mut(&openai).api_key = key.clone();
        }
        if let Some(organization) = self.openai_organization.as_ref().filter(|o| !o.is_empty()) {
            config.translation.provider_config_mut(&openai).organization = Some(organization.clone());
        }
        if let Some(key) = self.anthropic_api_key.as_ref().filter(|k| !k.is_empty()) {
            config
                .translation
                .provider_config_mut(&TranslationProvider::Anthropic)
                .api_key = key.clone();
        }
        if let Some(token) = self.google_access_token.as_ref().filter(|t| !t.is_empty()) {
            config.sheets.google_access_token = token.clone();
        }

        if let Some(document) = &self.game_context_document {
            config.context.document = Some(document.clone());
        }
        if self.feature_sheet.is_some() {
            config.context.feature_sheet = self.feature_sheet;
        }
        if self.game_context_sheet.is_some() {
            config.context.game_context_sheet = self.game_context_sheet;
        }
        if self.ignore_game_context {
            config.context.ignore = true;
        }

        if let Some(log_level) = &self.log_level {
            config.log_level = log_level.clone();
        }
        if self.disable_journal {
            config.journal.enabled = false;
        }
    }
}
