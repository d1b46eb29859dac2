/*!
 * Translation orchestration for localization sheets.
 *
 * This module contains the engine that fills missing cells. It is split
 * into several submodules:
 *
 * - `model`: work items, requests, results and the game context
 * - `scanner`: header semantics and lazy detection of missing cells
 * - `batching`: splitting a row's missing languages into work items
 * - `retry`: bounded retries and rate-limit backoff
 * - `dispatcher`: windowed, staggered, bounded concurrency
 * - `merger`: writing provider output back into the sheet
 * - `checkpoint`: persisting pending writes
 * - `game_context`: building the game context from a context document
 * - `prompts`: prompt templates and builders
 * - `core`: the service tying the above together for one sheet
 */

// Re-export main types for easier usage
pub use self::batching::BatchingPolicy;
pub use self::checkpoint::{CheckpointController, CheckpointReason, CheckpointStats};
pub use self::core::{SheetPlan, SheetReport, TranslationService, TranslationSettings};
pub use self::dispatcher::{DispatchReport, DispatchSettings, Dispatcher, FailedItem};
pub use self::game_context::GameContextBuilder;
pub use self::merger::{MergeOutcome, ResultMerger, UnresolvedTranslation};
pub use self::model::{
    FeatureLocalization, GameContext, MissingTranslation, TranslationCandidate, TranslationRequest,
    TranslationResult, WorkItem,
};
pub use self::retry::RetryPolicy;
pub use self::scanner::{HeaderLayout, MissingTranslationScanner};

// Re-export prompt types
pub use self::prompts::{PromptTemplate, TranslationPromptBuilder};

// Submodules
pub mod batching;
pub mod checkpoint;
pub mod core;
pub mod dispatcher;
pub mod game_context;
pub mod merger;
pub mod model;
pub mod prompts;
pub mod retry;
pub mod scanner;
