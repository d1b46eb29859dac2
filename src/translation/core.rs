/*!
 * Core translation service implementation.
 *
 * This module contains the `TranslationService`, which drives one sheet
 * through the whole pipeline: scan the header and rows, split candidates
 * into work items, dispatch them under the retry policy, merge results into
 * the sheet and checkpoint after every window.
 */

use log::{info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::errors::TranslationError;
use crate::providers::Provider;
use crate::table::{CellStyle, SheetId, Table};

use super::batching::BatchingPolicy;
use super::checkpoint::{CheckpointController, CheckpointStats};
use super::dispatcher::{DispatchReport, DispatchSettings, Dispatcher};
use super::merger::{MergeOutcome, ResultMerger};
use super::model::{GameContext, TranslationRequest, WorkItem};
use super::retry::RetryPolicy;
use super::scanner::{HeaderLayout, MissingTranslationScanner};

/// Settings shared by every sheet of a run
#[derive(Debug, Clone)]
pub struct TranslationSettings {
    /// Code of the source column
    pub source_language: String,
    pub batching: BatchingPolicy,
    pub dispatch: DispatchSettings,
    pub retry: RetryPolicy,
    /// Style applied to every written cell
    pub highlight: Option<CellStyle>,
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            source_language: "en".to_string(),
            batching: BatchingPolicy::default(),
            dispatch: DispatchSettings::default(),
            retry: RetryPolicy::default(),
            highlight: None,
        }
    }
}

/// Work planned for one sheet
#[derive(Debug, Clone)]
pub struct SheetPlan {
    pub layout: HeaderLayout,
    pub candidates: usize,
    pub skipped_rows: usize,
    pub items: Vec<WorkItem>,
}

impl SheetPlan {
    /// Windows the dispatcher will run for this plan
    pub fn window_count(&self, parallel_tasks: usize) -> usize {
        DispatchReport::window_count(self.items.len(), parallel_tasks)
    }
}

/// Outcome of translating one sheet
#[derive(Debug, Clone)]
pub struct SheetReport {
    pub sheet_id: SheetId,
    pub title: String,
    pub candidates: usize,
    pub skipped_rows: usize,
    pub work_items: usize,
    pub dispatch: DispatchReport,
    pub checkpoints: CheckpointStats,
    pub duration: Duration,
}

impl SheetReport {
    /// One-line summary for the console
    pub fn summary(&self) -> String {
        format!(
            "'{}': {} row(s) to translate, {} request(s), {} cell(s) written, {} failed request(s), {} unresolved translation(s), {} checkpoint(s) ({} failed) in {:.1}s",
            self.title,
            self.candidates,
            self.work_items,
            self.dispatch.cells_written,
            self.dispatch.failed.len(),
            self.dispatch.unresolved.len(),
            self.checkpoints.attempts,
            self.checkpoints.failures,
            self.duration.as_secs_f64()
        )
    }
}

/// Translation service for localization sheets
#[derive(Debug, Clone)]
pub struct TranslationService {
    provider: Arc<dyn Provider>,
    settings: TranslationSettings,
    game_context: Option<Arc<GameContext>>,
}

impl TranslationService {
    /// Create a new translation service
    pub fn new(provider: Arc<dyn Provider>, settings: TranslationSettings) -> Self {
        Self {
            provider,
            settings,
            game_context: None,
        }
    }

    /// Attach the run-wide game context
    pub fn with_game_context(mut self, game_context: Option<Arc<GameContext>>) -> Self {
        self.game_context = game_context;
        self
    }

    pub fn settings(&self) -> &TranslationSettings {
        &self.settings
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    /// Read the header and every row, and split candidates into work items
    pub fn plan(&self, table: &dyn Table) -> Result<SheetPlan, TranslationError> {
        let title = table.title();
        let layout = HeaderLayout::parse(&table.header_row(), &title, &self.settings.source_language)?;

        let mut scanner = MissingTranslationScanner::new(table, &layout);
        let mut candidates = 0;
        let mut items = Vec::new();
        for candidate in scanner.by_ref() {
            candidates += 1;
            items.extend(self.settings.batching.split(&candidate));
        }
        let skipped_rows = scanner.skipped_rows();

        info!(
            "Sheet '{}': {} row(s) with missing translations, {} work item(s), {} row(s) skipped",
            title,
            candidates,
            items.len(),
            skipped_rows
        );

        Ok(SheetPlan {
            layout,
            candidates,
            skipped_rows,
            items,
        })
    }

    /// Translate one work item and merge the result into the table
    pub async fn translate_item(
        &self,
        table: &dyn Table,
        layout: &HeaderLayout,
        item: &WorkItem,
    ) -> Result<MergeOutcome, TranslationError> {
        let request = TranslationRequest::from_item(item, &self.settings.source_language);
        let context = self.game_context.as_deref();
        let label = item.label();

        let started = Instant::now();
        let result = self
            .settings
            .retry
            .run(&label, || self.provider.complete(&request, context))
            .await?;
        info!("Translated {} in {:.2}s", label, started.elapsed().as_secs_f64());

        Ok(ResultMerger::new(table, layout, self.settings.highlight).merge(item, &result))
    }

    /// Dispatch a plan's work items against the table
    pub async fn execute(
        &self,
        table: Arc<dyn Table>,
        plan: SheetPlan,
        progress_callback: impl Fn(usize, usize),
    ) -> SheetReport {
        let started = Instant::now();
        let checkpoint = CheckpointController::new(table.clone());
        let dispatcher = Dispatcher::new(self.settings.dispatch);
        let work_items = plan.items.len();
        let layout = &plan.layout;
        let table_ref = table.as_ref();

        let dispatch = dispatcher
            .run(
                plan.items,
                &checkpoint,
                |item| async move { self.translate_item(table_ref, layout, &item).await },
                progress_callback,
            )
            .await;

        if !dispatch.failed.is_empty() {
            warn!(
                "Sheet '{}': {} work item(s) failed and stay untranslated",
                table.title(),
                dispatch.failed.len()
            );
        }

        SheetReport {
            sheet_id: table.sheet_id(),
            title: table.title(),
            candidates: plan.candidates,
            skipped_rows: plan.skipped_rows,
            work_items,
            dispatch,
            checkpoints: checkpoint.stats(),
            duration: started.elapsed(),
        }
    }

    /// Plan and execute a whole sheet
    ///
    /// # Returns
    /// * `Result<SheetReport, TranslationError>` - The report, or a scan error
    ///   when the header has no key or source column
    pub async fn translate_sheet(
        &self,
        table: Arc<dyn Table>,
        progress_callback: impl Fn(usize, usize),
    ) -> Result<SheetReport, TranslationError> {
        let plan = self.plan(table.as_ref())?;
        Ok(self.execute(table, plan, progress_callback).await)
    }
}
