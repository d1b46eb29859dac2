/*!
 * Application controller.
 *
 * Ties a run together: resolves the document from its locator, builds the
 * provider and the optional game context, then translates each selected sheet
 * in turn while the run journal records what could not be resolved.
 */

use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::{Config, JournalConfig, TranslationProvider};
use crate::database::{DatabaseConnection, Repository, RunCounters, RunJournal, RunStatus};
use crate::errors::TranslationError;
use crate::providers::Provider;
use crate::providers::anthropic::Anthropic;
use crate::providers::openai::OpenAI;
use crate::table::google::GoogleSpreadsheet;
use crate::table::local::LocalWorkbook;
use crate::table::{SheetId, SheetLocator, Table, Workbook};
use crate::translation::{GameContext, GameContextBuilder, SheetReport, TranslationService};

/// A sheet the run could not translate at all
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSheet {
    pub sheet_id: SheetId,
    pub reason: String,
}

/// Outcome of a whole run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub document: String,
    pub sheets: Vec<SheetReport>,
    pub skipped: Vec<SkippedSheet>,
    pub duration: Duration,
}

impl RunReport {
    pub fn counters(&self) -> RunCounters {
        let mut counters = RunCounters {
            sheet_count: (self.sheets.len() + self.skipped.len()) as i64,
            ..Default::default()
        };
        for sheet in &self.sheets {
            counters.work_items += sheet.work_items as i64;
            counters.cells_written += sheet.dispatch.cells_written as i64;
            counters.failed_items += sheet.dispatch.failed.len() as i64;
            counters.unresolved_translations += sheet.dispatch.unresolved.len() as i64;
        }
        counters
    }

    /// `Completed` only when every sheet ran and every work item succeeded
    pub fn status(&self) -> RunStatus {
        let counters = self.counters();
        if self.skipped.is_empty() && counters.failed_items == 0 {
            RunStatus::Completed
        } else {
            RunStatus::CompletedWithErrors
        }
    }

    pub fn summary(&self) -> String {
        let counters = self.counters();
        format!(
            "{}: {} sheet(s) translated, {} skipped, {} cell(s) written, {} failed request(s), {} unresolved translation(s) in {}",
            self.document,
            self.sheets.len(),
            self.skipped.len(),
            counters.cells_written,
            counters.failed_items,
            counters.unresolved_translations,
            format_duration(self.duration)
        )
    }
}

/// Main application controller
#[derive(Debug)]
pub struct Controller {
    config: Config,
    provider: Arc<dyn Provider>,
    journal_repository: Option<Repository>,
}

impl Controller {
    /// Create a controller with the provider selected by the configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        let provider = build_provider(&config);
        Ok(Self {
            config,
            provider,
            journal_repository: None,
        })
    }

    /// Create a controller around an explicit provider
    pub fn with_provider(config: Config, provider: Arc<dyn Provider>) -> Self {
        Self {
            config,
            provider,
            journal_repository: None,
        }
    }

    /// Journal into `repository` instead of the configured location
    pub fn with_journal_repository(mut self, repository: Repository) -> Self {
        self.journal_repository = Some(repository);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    /// Translate the sheets designated by `locator`
    pub async fn run(&self, locator: &SheetLocator) -> Result<RunReport> {
        let workbook = self.open_workbook(locator)?;
        self.run_workbook(workbook.as_ref(), locator.gid()).await
    }

    /// Translate one sheet of `workbook`, or every sheet when `gid` is `None`
    pub async fn run_workbook(&self, workbook: &dyn Workbook, gid: Option<SheetId>) -> Result<RunReport> {
        let started = Instant::now();
        let document = workbook.document_id();

        let sheet_ids = match gid {
            Some(gid) => vec![gid],
            None => workbook
                .sheet_ids()
                .await
                .with_context(|| format!("Failed to list sheets of {}", document))?,
        };
        info!(
            "Translating {} sheet(s) of {} with {} ({})",
            sheet_ids.len(),
            document,
            self.provider.name(),
            self.provider.model()
        );

        // A failed check is only a warning; each request still retries on its own
        match self.provider.test_connection().await {
            Ok(()) => info!("Connection to {} verified", self.provider.name()),
            Err(e) => warn!("Connection check against {} failed: {}", self.provider.name(), e),
        }

        let mut journal = self.open_journal();
        journal
            .start(&document, self.provider.name(), self.provider.model())
            .await;

        let service = TranslationService::new(self.provider.clone(), self.config.translation_settings())
            .with_game_context(self.load_game_context().await);

        let mut report = RunReport {
            document,
            sheets: Vec::new(),
            skipped: Vec::new(),
            duration: Duration::ZERO,
        };

        for sheet_id in sheet_ids {
            match self.translate_sheet(&service, workbook, sheet_id).await {
                Ok(sheet_report) => {
                    info!("{}", sheet_report.summary());
                    journal.record_sheet(&sheet_report).await;
                    report.sheets.push(sheet_report);
                }
                Err(e) => {
                    error!("Skipping sheet {}: {:#}", sheet_id, e);
                    report.skipped.push(SkippedSheet {
                        sheet_id,
                        reason: format!("{:#}", e),
                    });
                }
            }
        }

        report.duration = started.elapsed();
        journal.finish(report.status(), report.counters()).await;
        info!("{}", report.summary());

        Ok(report)
    }

    async fn translate_sheet(
        &self,
        service: &TranslationService,
        workbook: &dyn Workbook,
        sheet_id: SheetId,
    ) -> Result<SheetReport, TranslationError> {
        let table = workbook.open_sheet(sheet_id).await?;
        let plan = service.plan(table.as_ref())?;

        let windows = plan.window_count(service.settings().dispatch.parallel_tasks);
        let progress_bar = window_progress_bar(&table.title(), windows as u64);
        let sheet_report = service
            .execute(table.clone(), plan, |done, _total| progress_bar.set_position(done as u64))
            .await;
        progress_bar.finish_and_clear();

        flush_remaining(table.as_ref()).await;
        Ok(sheet_report)
    }

    /// Open the document a locator points at
    pub fn open_workbook(&self, locator: &SheetLocator) -> Result<Arc<dyn Workbook>> {
        match locator {
            SheetLocator::Google { document_id, .. } => {
                let sheets = &self.config.sheets;
                if sheets.google_access_token.is_empty() {
                    return Err(anyhow!(
                        "A Google access token is required to open document {}",
                        document_id
                    ));
                }
                Ok(Arc::new(GoogleSpreadsheet::new(
                    document_id.clone(),
                    sheets.google_access_token.clone(),
                    sheets.endpoint.clone(),
                    sheets.timeout_secs,
                )))
            }
            SheetLocator::Local { path, .. } => {
                let workbook = LocalWorkbook::open(path.clone())
                    .with_context(|| format!("Failed to open workbook {}", path.display()))?;
                Ok(Arc::new(workbook))
            }
        }
    }

    /// Build the game context; any failure leaves the run without one
    pub async fn load_game_context(&self) -> Option<Arc<GameContext>> {
        let context = &self.config.context;
        if context.ignore {
            info!("Game context ignored");
            return None;
        }
        let document = context.document.as_deref().filter(|d| !d.trim().is_empty())?;

        let locator: SheetLocator = match document.parse() {
            Ok(locator) => locator,
            Err(e) => {
                warn!("Running without game context: {}", e);
                return None;
            }
        };
        let workbook = match self.open_workbook(&locator) {
            Ok(workbook) => workbook,
            Err(e) => {
                warn!("Running without game context: {:#}", e);
                return None;
            }
        };

        let built = GameContextBuilder::new(workbook.as_ref())
            .feature_sheet(context.feature_sheet)
            .context_sheet(context.game_context_sheet)
            .build()
            .await;

        match built {
            Ok(game_context) if game_context.is_empty() => {
                warn!("Game context document {} is empty", document);
                None
            }
            Ok(game_context) => Some(Arc::new(game_context)),
            Err(e) => {
                warn!("Running without game context: {}", e);
                None
            }
        }
    }

    fn open_journal(&self) -> RunJournal {
        match &self.journal_repository {
            Some(repository) => RunJournal::with_repository(repository.clone()),
            None => RunJournal::open(&self.config.journal),
        }
    }

    /// Print the latest journaled run and its unresolved items
    pub async fn report(&self) -> Result<()> {
        let repository = match &self.journal_repository {
            Some(repository) => repository.clone(),
            None => journal_repository(&self.config.journal)?,
        };
        print_report(&repository).await
    }
}

/// Repository over the configured journal location
pub fn journal_repository(journal: &JournalConfig) -> Result<Repository> {
    match &journal.path {
        Some(path) => Ok(Repository::new(DatabaseConnection::new(path)?)),
        None => Repository::new_default(),
    }
}

/// Print the latest run of `repository` and its unresolved items
pub async fn print_report(repository: &Repository) -> Result<()> {
    for line in report_lines(repository).await? {
        println!("{}", line);
    }
    Ok(())
}

/// Lines printed by the `report` command
pub async fn report_lines(repository: &Repository) -> Result<Vec<String>> {
    let Some(run) = repository.latest_run().await? else {
        return Ok(vec!["No run recorded yet".to_string()]);
    };

    let items = repository.list_unresolved(&run.id).await?;
    let mut lines = vec![run.to_string()];
    if items.is_empty() {
        lines.push("No unresolved items".to_string());
    }
    lines.extend(items.iter().map(|item| format!("  {}", item)));
    Ok(lines)
}

/// Build the provider selected by the configuration
pub fn build_provider(config: &Config) -> Arc<dyn Provider> {
    let translation = &config.translation;
    match translation.provider {
        TranslationProvider::OpenAI => Arc::new(OpenAI::new(
            translation.get_api_key(),
            translation.get_organization(),
            translation.get_endpoint(),
            translation.get_model(),
            translation.common.temperature,
            translation.get_timeout_secs(),
        )),
        TranslationProvider::Anthropic => Arc::new(Anthropic::new(
            translation.get_api_key(),
            translation.get_endpoint(),
            translation.get_model(),
            translation.common.temperature,
            translation.get_timeout_secs(),
        )),
    }
}

/// Last attempt at writes whose window checkpoint failed
async fn flush_remaining(table: &dyn Table) {
    match table.persist_pending_writes().await {
        Ok(0) => {}
        Ok(count) => info!("Flushed {} leftover cell(s) of '{}'", count, table.title()),
        Err(e) => error!("Cells of '{}' were not saved: {}", table.title(), e),
    }
}

fn window_progress_bar(title: &str, windows: u64) -> ProgressBar {
    let progress_bar = ProgressBar::new(windows);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} windows ({percent}%) {msg} {eta}")
        .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    progress_bar.set_style(style.progress_chars("█▓▒░"));
    progress_bar.set_message(title.to_string());
    progress_bar
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    } else if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{:.1}s", duration.as_secs_f64())
    }
}
