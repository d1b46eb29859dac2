/*!
 * Tests for bounded retries and rate-limit cooperation, through the service
 */

use sheet_translator::errors::{ProviderError, TranslationError};
use sheet_translator::providers::mock::MockProvider;
use sheet_translator::table::Table;
use sheet_translator::translation::{HeaderLayout, TranslationService, TranslationSettings};
use std::sync::Arc;
use std::time::Duration;

use crate::common;

async fn translate_greet(
    provider: MockProvider,
    settings: TranslationSettings,
) -> (MockProvider, Result<usize, TranslationError>) {
    let sheet = common::sheet(0, "UI", &[["greet", "Hello", "", "Bonjour"]]);
    let layout = HeaderLayout::parse(&sheet.header_row(), "UI", "en").unwrap();
    let service = TranslationService::new(Arc::new(provider.clone()), settings);
    let plan = service.plan(&sheet).unwrap();

    let result = service
        .translate_item(&sheet, &layout, &plan.items[0])
        .await
        .map(|outcome| outcome.written.len());
    (provider, result)
}

#[tokio::test(start_paused = true)]
async fn test_failingProvider_shouldStopAfterRetryBudget() {
    let (provider, result) = translate_greet(MockProvider::failing(), common::settings(5)).await;

    assert_eq!(provider.request_count(), 3);
    assert!(matches!(result, Err(TranslationError::RetriesExhausted { attempts: 3, .. })));
}

#[tokio::test(start_paused = true)]
async fn test_failingProvider_shouldWaitRetryDelayBetweenAttempts() {
    let (provider, _) = translate_greet(MockProvider::failing(), common::settings(5)).await;

    let instants = provider.call_instants();
    assert_eq!(instants.len(), 3);
    assert!(instants[1] - instants[0] >= Duration::from_millis(3000));
    assert!(instants[2] - instants[1] >= Duration::from_millis(3000));
}

#[tokio::test(start_paused = true)]
async fn test_rateLimits_shouldNotConsumeRetryBudget() {
    let mut settings = common::settings(5);
    settings.retry.retries = 1;

    let (provider, result) = translate_greet(MockProvider::rate_limited(4, Some(200)), settings).await;

    assert_eq!(result.unwrap(), 1);
    assert_eq!(provider.request_count(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_rateLimit_shouldHonorRetryAfter() {
    let (provider, result) = translate_greet(MockProvider::rate_limited(1, Some(1500)), common::settings(5)).await;

    assert!(result.is_ok());
    let instants = provider.call_instants();
    assert!(instants[1] - instants[0] >= Duration::from_millis(1500));
}

#[tokio::test(start_paused = true)]
async fn test_endlessRateLimit_shouldSurfaceAtWaitCountCeiling() {
    let mut settings = common::settings(5);
    settings.retry.max_rate_limit_waits = 2;

    let (provider, result) = translate_greet(MockProvider::rate_limited(100, None), settings).await;

    assert!(matches!(result, Err(TranslationError::RateLimitCeiling { waits: 2, .. })));
    assert_eq!(provider.request_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_malformedResponse_shouldConsumeRetryBudget() {
    let (provider, result) = translate_greet(MockProvider::malformed(), common::settings(5)).await;

    assert_eq!(provider.request_count(), 3);
    match result {
        Err(TranslationError::RetriesExhausted { last, .. }) => {
            assert!(matches!(last, ProviderError::ParseError(_)))
        }
        other => panic!("expected exhausted retries, got {:?}", other),
    }
}
