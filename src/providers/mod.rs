/*!
 * Provider implementations for translation services.
 *
 * This module contains client implementations for the supported providers:
 * - OpenAI: chat completions in JSON response mode
 * - Anthropic: messages API
 * - Mock: scripted behaviors for tests
 */

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::HeaderMap;
use std::fmt::Debug;

use crate::errors::ProviderError;
use crate::translation::model::{GameContext, TranslationRequest, TranslationResult};

/// Common trait for all translation providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably by the translation service.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Translate one request
    ///
    /// # Arguments
    /// * `request` - Key, source text and languages to retrieve
    /// * `context` - Run-wide game context, if any
    ///
    /// # Returns
    /// * `Result<TranslationResult, ProviderError>` - The validated result, or a
    ///   classified error (rate limits are `RateLimitExceeded`)
    async fn complete(
        &self,
        request: &TranslationRequest,
        context: Option<&GameContext>,
    ) -> Result<TranslationResult, ProviderError>;

    /// Test the connection to the provider
    ///
    /// # Returns
    /// * `Result<(), ProviderError>` - Ok if the connection is successful, or an error
    async fn test_connection(&self) -> Result<(), ProviderError>;

    /// Provider name, for logs and the run journal
    fn name(&self) -> &str;

    /// Model in use
    fn model(&self) -> &str;
}

static TRY_AGAIN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)try again in\s+(\d+(?:\.\d+)?)\s*(ms|s)\b").unwrap());

/// Wait suggested by a rate-limited response, in milliseconds
///
/// Looks at `retry-after-ms`, then `retry-after` (seconds), then a
/// "try again in 1.5s" / "try again in 300ms" hint in the body.
pub fn retry_after_ms(headers: &HeaderMap, body: &str) -> Option<u64> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim);

    if let Some(ms) = header("retry-after-ms").and_then(|v| v.parse::<f64>().ok()) {
        return Some(ms.max(0.0).ceil() as u64);
    }
    if let Some(secs) = header("retry-after").and_then(|v| v.parse::<f64>().ok()) {
        return Some((secs.max(0.0) * 1000.0).ceil() as u64);
    }

    let caps = TRY_AGAIN_REGEX.captures(body)?;
    let amount: f64 = caps[1].parse().ok()?;
    let ms = if caps[2].eq_ignore_ascii_case("ms") { amount } else { amount * 1000.0 };
    Some(ms.ceil() as u64)
}

/// Classify a non-success HTTP status
pub fn error_for_status(status: u16, headers: &HeaderMap, body: String) -> ProviderError {
    match status {
        429 => ProviderError::RateLimitExceeded {
            retry_after_ms: retry_after_ms(headers, &body),
            message: body,
        },
        401 | 403 => ProviderError::AuthenticationError(body),
        _ => ProviderError::ApiError {
            status_code: status,
            message: body,
        },
    }
}

pub mod anthropic;
pub mod mock;
pub mod openai;
