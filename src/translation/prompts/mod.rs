/*!
 * Prompt construction for localization requests.
 *
 * This module provides:
 * - System prompt templates (role, answer schema, request schema, glossary usage)
 * - A builder turning a translation request and the game context into messages
 */

pub mod templates;

// Re-export main types
pub use templates::{PromptTemplate, TranslationPromptBuilder};
