// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info};
use std::io::Write;
use std::path::{Path, PathBuf};

use sheet_translator::app_config::{self, Config, ConfigOverrides, TranslationProvider};
use sheet_translator::app_controller::{Controller, journal_repository, print_report};
use sheet_translator::table::{SheetId, SheetLocator};

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    #[value(name = "openai")]
    OpenAI,
    Anthropic,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::OpenAI => TranslationProvider::OpenAI,
            CliTranslationProvider::Anthropic => TranslationProvider::Anthropic,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fill the missing translations of a sheet (default command)
    Translate(TranslateArgs),

    /// Show the latest journaled run and its unresolved items
    Report,

    /// Generate shell completions for sheet-translator
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Clone)]
struct TranslateArgs {
    /// Sheet to translate: Google Sheets URL, document id, or local .json workbook
    #[arg(short, long, value_name = "SHEET")]
    sheet: Option<String>,

    /// Document holding the feature and game-context sheets
    #[arg(long, env = "GAME_CONTEXT_DOCUMENT_ID_FALLBACK")]
    game_context_document: Option<String>,

    /// Sheet id of the feature names
    #[arg(long, env = "FEATURE_SHEET_ID_FALLBACK")]
    feature_sheet: Option<SheetId>,

    /// Sheet id of the game description
    #[arg(long, env = "GAME_CONTEXT_SHEET_ID_FALLBACK")]
    game_context_sheet: Option<SheetId>,

    /// Translate without any game context
    #[arg(long)]
    ignore_game_context: bool,

    /// Model name to use for translation
    #[arg(long, value_name = "MODEL")]
    gpt_version: Option<String>,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Maximum concurrent provider calls per window
    #[arg(long, env = "PARALLEL_TASKS")]
    parallel_tasks: Option<usize>,

    /// Maximum languages per provider call
    #[arg(long, env = "BATCHED_LANGUAGES_SIZE")]
    batched_languages_size: Option<usize>,

    /// Longer source texts get one call per language
    #[arg(long, env = "MAX_TEXT_LENGTH_FOR_BATCHING_LANGUAGES")]
    max_text_length_for_batching_languages: Option<usize>,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    #[arg(long, env = "OPENAI_API_ORG")]
    openai_api_org: Option<String>,

    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    anthropic_api_key: Option<String>,

    /// OAuth access token for the Google Sheets API
    #[arg(long, env = "GOOGLE_ACCESS_TOKEN", hide_env_values = true)]
    google_access_token: Option<String>,

    /// Do not record this run in the journal
    #[arg(long)]
    no_journal: bool,
}

impl TranslateArgs {
    fn overrides(&self, log_level: Option<CliLogLevel>) -> ConfigOverrides {
        ConfigOverrides {
            provider: self.provider.clone().map(Into::into),
            model: self.gpt_version.clone(),
            parallel_tasks: self.parallel_tasks,
            batched_languages_size: self.batched_languages_size,
            max_text_length_for_batching_languages: self.max_text_length_for_batching_languages,
            openai_api_key: self.openai_api_key.clone(),
            openai_organization: self.openai_api_org.clone(),
            anthropic_api_key: self.anthropic_api_key.clone(),
            google_access_token: self.google_access_token.clone(),
            game_context_document: self.game_context_document.clone(),
            feature_sheet: self.feature_sheet,
            game_context_sheet: self.game_context_sheet,
            ignore_game_context: self.ignore_game_context,
            log_level: log_level.map(Into::into),
            disable_journal: self.no_journal,
        }
    }
}

/// sheet-translator - fills missing cells of localization spreadsheets
#[derive(Parser, Debug)]
#[command(name = "sheet-translator")]
#[command(version)]
#[command(about = "AI-powered localization sheet translator")]
#[command(long_about = "sheet-translator scans localization sheets for empty language cells and fills them using AI providers.

EXAMPLES:
    sheet-translator -s https://docs.google.com/spreadsheets/d/<id>/edit#gid=0
    sheet-translator -s <document-id>                 # every sheet of the document
    sheet-translator -s ./strings.json#gid=2          # local workbook
    sheet-translator -s <id> --ignore-game-context --gpt-version gpt-4o
    sheet-translator report                           # latest run and unresolved items
    sheet-translator completions bash > sheet-translator.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. A default one is created
    when missing. Flags and environment variables (a .env file is honored)
    override the file.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    translate: TranslateArgs,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger::new(level)))?;
        log::set_max_level(level);
        Ok(())
    }

    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stdout = std::io::stdout().lock();
            let _ = writeln!(
                stdout,
                "{}{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stdout().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    // Level is lowered or raised once the config is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "sheet-translator", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Report) => {
            let config = load_config(&cli.config_path, &ConfigOverrides::default())?;
            let repository = journal_repository(&config.journal)?;
            print_report(&repository).await
        }
        Some(Commands::Translate(args)) => run_translate(args, &cli.config_path, cli.log_level).await,
        None => run_translate(cli.translate, &cli.config_path, cli.log_level).await,
    }
}

fn load_config(config_path: &Path, overrides: &ConfigOverrides) -> Result<Config> {
    let mut config = Config::load_or_create(config_path)?;
    overrides.apply(&mut config);
    log::set_max_level(config.log_level.to_level_filter());
    Ok(config)
}

async fn run_translate(args: TranslateArgs, config_path: &Path, log_level: Option<CliLogLevel>) -> Result<()> {
    let sheet = args
        .sheet
        .clone()
        .ok_or_else(|| anyhow!("--sheet is required: a Google Sheets URL, document id or .json workbook"))?;
    let locator: SheetLocator = sheet.parse()?;

    let config = load_config(config_path, &args.overrides(log_level))?;
    let controller = Controller::with_config(config)?;

    let report = controller
        .run(&locator)
        .await
        .with_context(|| format!("Translation of {} failed", locator))?;

    info!("Done: {}", report.summary());
    Ok(())
}
