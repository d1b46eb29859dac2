/*!
 * Mock provider implementations for testing.
 *
 * This module provides a mock provider that simulates different behaviors:
 * - `MockProvider::working()` - Always succeeds, translating every requested language
 * - `MockProvider::failing()` - Always fails with an API error
 * - `MockProvider::rate_limited(n, wait)` - Signals a rate limit `n` times, then succeeds
 * - `MockProvider::intermittent(n)` - Fails every `n`th request
 * - `MockProvider::malformed()` - Answers with content that is not JSON
 * - `MockProvider::reporting_missing(code, reason)` - Lists one language as missing
 *
 * Every clone shares the same counters, so tests can keep a handle while the
 * service owns another.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;

use crate::errors::ProviderError;
use crate::providers::Provider;
use crate::translation::model::{GameContext, MissingTranslation, TranslationRequest, TranslationResult};

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with a translation for every requested language
    Working,
    /// Always fails with an error
    Failing,
    /// Signals a rate limit for the first `times` requests
    RateLimited { times: usize, retry_after_ms: Option<u64> },
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Returns content that is not JSON
    Malformed,
    /// Simulates slow response
    Slow { delay_ms: u64 },
    /// Translates everything except one language, reported as missing
    ReportsMissing { language_code: &'static str, reason: &'static str },
    /// Fails every request for one key, succeeds for the others
    FailingKey { key: &'static str },
}

/// Mock provider for testing translation behavior
#[derive(Debug, Clone)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Latency added to every request
    latency: Option<Duration>,
    /// Custom raw response generator (optional)
    custom_response: Option<fn(&TranslationRequest) -> String>,
    /// Request counter
    request_count: Arc<AtomicUsize>,
    /// Requests currently being served
    in_flight: Arc<AtomicUsize>,
    /// Highest number of concurrent requests seen
    peak_in_flight: Arc<AtomicUsize>,
    /// When each request started
    call_instants: Arc<Mutex<Vec<Instant>>>,
    /// Every request received
    requests: Arc<Mutex<Vec<TranslationRequest>>>,
    /// Connection checks received
    connection_checks: Arc<AtomicUsize>,
}

/// Decrements the in-flight counter when a request settles
struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            latency: None,
            custom_response: None,
            request_count: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
            call_instants: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            connection_checks: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that is rate limited for its first `times` requests
    pub fn rate_limited(times: usize, retry_after_ms: Option<u64>) -> Self {
        Self::new(MockBehavior::RateLimited { times, retry_after_ms })
    }

    /// Create an intermittently failing mock provider
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    /// Create a mock that answers with non-JSON content
    pub fn malformed() -> Self {
        Self::new(MockBehavior::Malformed)
    }

    /// Create a mock that reports one language as missing
    pub fn reporting_missing(language_code: &'static str, reason: &'static str) -> Self {
        Self::new(MockBehavior::ReportsMissing { language_code, reason })
    }

    /// Create a mock that always fails for one key
    pub fn failing_key(key: &'static str) -> Self {
        Self::new(MockBehavior::FailingKey { key })
    }

    /// Add latency to every request
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Set a custom raw response generator; its output goes through schema validation
    pub fn with_custom_response(mut self, generator: fn(&TranslationRequest) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Number of requests received
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Highest number of requests served at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Start instant of every request, in arrival order
    pub fn call_instants(&self) -> Vec<Instant> {
        self.call_instants.lock().clone()
    }

    /// Every request received, in arrival order
    pub fn requests(&self) -> Vec<TranslationRequest> {
        self.requests.lock().clone()
    }

    /// Number of connection checks received
    pub fn connection_checks(&self) -> usize {
        self.connection_checks.load(Ordering::SeqCst)
    }

    /// Translation used by the working behaviors: `[code] source text`
    pub fn fake_translation(code: &str, source_text: &str) -> String {
        format!("[{}] {}", code, source_text)
    }

    fn translate_all(request: &TranslationRequest, skip: Option<&str>) -> TranslationResult {
        let translations = request
            .languages_to_retrieve
            .iter()
            .filter(|code| Some(code.as_str()) != skip)
            .map(|code| {
                let texts = BTreeMap::from([(
                    request.key.clone(),
                    Self::fake_translation(code, &request.source_text),
                )]);
                (code.clone(), texts)
            })
            .collect();

        TranslationResult {
            translations,
            missing: Vec::new(),
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(
        &self,
        request: &TranslationRequest,
        _context: Option<&GameContext>,
    ) -> Result<TranslationResult, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.call_instants.lock().push(Instant::now());
        self.requests.lock().push(request.clone());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlightGuard(self.in_flight.clone());

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if let Some(generator) = self.custom_response {
            return TranslationResult::parse(&generator(request), request);
        }

        match self.behavior {
            MockBehavior::Working => Ok(Self::translate_all(request, None)),

            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),

            MockBehavior::RateLimited { times, retry_after_ms } => {
                if count < times {
                    Err(ProviderError::RateLimitExceeded {
                        message: format!("Simulated rate limit (request #{})", count + 1),
                        retry_after_ms,
                    })
                } else {
                    Ok(Self::translate_all(request, None))
                }
            }

            MockBehavior::Intermittent { fail_every } => {
                if fail_every > 0 && count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                        status_code: 503,
                    })
                } else {
                    Ok(Self::translate_all(request, None))
                }
            }

            MockBehavior::Malformed => TranslationResult::parse("Sorry, I cannot help with that.", request),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(Self::translate_all(request, None))
            }

            MockBehavior::ReportsMissing { language_code, reason } => {
                let mut result = Self::translate_all(request, Some(language_code));
                if request.languages_to_retrieve.iter().any(|c| c == language_code) {
                    result.missing.push(MissingTranslation {
                        key: request.key.clone(),
                        language_code: Some(language_code.to_string()),
                        reason: reason.to_string(),
                    });
                }
                Ok(result)
            }

            MockBehavior::FailingKey { key } => {
                if request.key == key {
                    Err(ProviderError::ConnectionError(format!("Simulated failure for key '{}'", key)))
                } else {
                    Ok(Self::translate_all(request, None))
                }
            }
        }
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.connection_checks.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::ConnectionError("Simulated provider failure".to_string())),
            _ => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}
