/*!
 * Batching policy: turns a candidate into work items.
 *
 * Short source texts are sent with several languages per request; long ones
 * get one request per language so responses stay small.
 */

use super::model::{TranslationCandidate, WorkItem};

/// Splits candidates into work items by language count and text length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchingPolicy {
    /// Maximum languages per work item
    pub batched_languages_size: usize,

    /// Texts longer than this (in characters) get one language per item
    pub max_text_length_for_batching: usize,
}

impl Default for BatchingPolicy {
    fn default() -> Self {
        Self {
            batched_languages_size: 5,
            max_text_length_for_batching: 300,
        }
    }
}

impl BatchingPolicy {
    pub fn new(batched_languages_size: usize, max_text_length_for_batching: usize) -> Self {
        Self {
            batched_languages_size: batched_languages_size.max(1),
            max_text_length_for_batching,
        }
    }

    /// Languages per item for a given source text
    pub fn chunk_size(&self, source_text: &str) -> usize {
        if source_text.chars().count() <= self.max_text_length_for_batching {
            self.batched_languages_size.max(1)
        } else {
            1
        }
    }

    /// Partition a candidate's missing languages into work items, order preserved
    pub fn split(&self, candidate: &TranslationCandidate) -> Vec<WorkItem> {
        let chunk_size = self.chunk_size(&candidate.source_text);
        candidate
            .missing_language_codes
            .chunks(chunk_size)
            .map(|codes| WorkItem {
                key: candidate.key.clone(),
                source_text: candidate.source_text.clone(),
                target_language_codes: codes.to_vec(),
                context: candidate.context.clone(),
                row_index: candidate.row_index,
                category: candidate.category.clone(),
            })
            .collect()
    }

    /// Split every candidate, keeping scan order
    pub fn split_all<I>(&self, candidates: I) -> Vec<WorkItem>
    where
        I: IntoIterator<Item = TranslationCandidate>,
    {
        candidates.into_iter().flat_map(|c| self.split(&c)).collect()
    }
}
