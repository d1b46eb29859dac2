/*!
 * Bounded dispatcher.
 *
 * Work items run in windows of at most `parallel_tasks` concurrent tasks.
 * Inside a window the task at position `p` starts `p * stagger` after the
 * window opens. When every task of a window has settled a checkpoint is
 * taken, progress is reported, and the dispatcher cools down before opening
 * the next window.
 *
 * A failing task is logged, triggers a best-effort checkpoint right away and
 * ends up in the report; the other tasks are not affected.
 */

use futures::future::join_all;
use log::{error, info, warn};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::errors::TranslationError;

use super::checkpoint::{CheckpointController, CheckpointReason};
use super::merger::{MergeOutcome, UnresolvedTranslation};
use super::model::WorkItem;

/// Window sizing and pacing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSettings {
    /// Maximum tasks in flight, i.e. the window size
    pub parallel_tasks: usize,

    /// Start offset between two consecutive tasks of a window
    pub stagger: Duration,

    /// Pause between two windows
    pub cool_down: Duration,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            parallel_tasks: 5,
            stagger: Duration::from_millis(100),
            cool_down: Duration::from_millis(1000),
        }
    }
}

/// A work item whose task failed for good
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedItem {
    pub item: WorkItem,
    pub error: String,
}

/// Outcome of a dispatch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub windows: usize,
    pub succeeded: usize,
    /// Cells written in memory by successful tasks
    pub cells_written: usize,
    pub failed: Vec<FailedItem>,
    pub unresolved: Vec<UnresolvedTranslation>,
}

impl DispatchReport {
    /// Number of windows needed for `items` work items
    pub fn window_count(items: usize, parallel_tasks: usize) -> usize {
        items.div_ceil(parallel_tasks.max(1))
    }
}

/// Runs work items in bounded, staggered windows
#[derive(Debug, Clone)]
pub struct Dispatcher {
    settings: DispatchSettings,
}

impl Dispatcher {
    pub fn new(settings: DispatchSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    /// Run every item through `task`
    ///
    /// # Arguments
    /// * `items` - Work items, dispatched in order
    /// * `checkpoint` - Controller persisting the table the tasks write into
    /// * `task` - Translates and merges one item
    /// * `progress_callback` - Called with (windows done, total windows) after each window's checkpoint
    pub async fn run<F, Fut>(
        &self,
        items: Vec<WorkItem>,
        checkpoint: &CheckpointController,
        task: F,
        progress_callback: impl Fn(usize, usize),
    ) -> DispatchReport
    where
        F: Fn(WorkItem) -> Fut,
        Fut: Future<Output = Result<MergeOutcome, TranslationError>>,
    {
        let window_size = self.settings.parallel_tasks.max(1);
        let total_windows = DispatchReport::window_count(items.len(), window_size);
        let mut report = DispatchReport::default();

        for (window_index, window) in items.chunks(window_size).enumerate() {
            info!(
                "Window {}/{}: dispatching {} item(s)",
                window_index + 1,
                total_windows,
                window.len()
            );

            let tasks = window.iter().enumerate().map(|(position, item)| {
                let task = &task;
                let delay = self.settings.stagger * position as u32;
                async move {
                    if !delay.is_zero() {
                        sleep(delay).await;
                    }
                    let result = task(item.clone()).await;
                    if let Err(e) = &result {
                        error!("Translation of {} failed: {}", item.label(), e);
                        let _ = checkpoint
                            .checkpoint(CheckpointReason::TaskFailure { window: window_index })
                            .await;
                    }
                    (item, result)
                }
            });

            for (item, result) in join_all(tasks).await {
                match result {
                    Ok(outcome) => {
                        report.succeeded += 1;
                        report.cells_written += outcome.written.len();
                        report.unresolved.extend(outcome.unresolved);
                    }
                    Err(e) => report.failed.push(FailedItem {
                        item: item.clone(),
                        error: e.to_string(),
                    }),
                }
            }

            if let Err(e) = checkpoint
                .checkpoint(CheckpointReason::WindowComplete { window: window_index })
                .await
            {
                warn!("Window {} results stay pending: {}", window_index + 1, e);
            }

            report.windows += 1;
            progress_callback(report.windows, total_windows);

            if report.windows < total_windows && !self.settings.cool_down.is_zero() {
                sleep(self.settings.cool_down).await;
            }
        }

        report
    }
}
