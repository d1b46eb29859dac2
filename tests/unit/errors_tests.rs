/*!
 * Tests for error classification and messages
 */

use sheet_translator::errors::{LocatorError, ProviderError, ScanError, TableError, TranslationError};
use sheet_translator::table::SheetLocator;
use std::time::Duration;

#[test]
fn test_rateLimitError_shouldBeDistinguishedFromFailures() {
    let limited = ProviderError::RateLimitExceeded {
        message: "slow down".to_string(),
        retry_after_ms: Some(2500),
    };
    let failed = ProviderError::ApiError {
        status_code: 500,
        message: "boom".to_string(),
    };

    assert!(limited.is_rate_limit());
    assert_eq!(limited.retry_after(), Some(Duration::from_millis(2500)));
    assert!(!failed.is_rate_limit());
    assert_eq!(failed.retry_after(), None);
}

#[test]
fn test_retriesExhausted_shouldMentionLastError() {
    let error = TranslationError::RetriesExhausted {
        attempts: 3,
        last: ProviderError::ConnectionError("reset by peer".to_string()),
    };

    let message = error.to_string();
    assert!(message.contains("3 attempt(s)"));
    assert!(message.contains("reset by peer"));
}

#[test]
fn test_scanError_shouldConvertIntoTranslationError() {
    let scan = ScanError::MissingSourceColumn {
        sheet: "UI".to_string(),
        language: "en".to_string(),
    };

    let error: TranslationError = scan.clone().into();
    assert!(matches!(error, TranslationError::Scan(ref inner) if *inner == scan));
    assert!(error.to_string().contains("[en]"));
}

#[test]
fn test_persistError_shouldReportPendingCount() {
    let error = TableError::Persist {
        pending: 4,
        message: "quota".to_string(),
    };

    assert_eq!(error.to_string(), "Failed to persist 4 pending cell(s): quota");
}

#[test]
fn test_locatorError_shouldDescribeRejectedInput() {
    let error = "https://docs.google.com/spreadsheets/d/abcdefghijkl/edit#gid=abc"
        .parse::<SheetLocator>()
        .unwrap_err();

    assert_eq!(error, LocatorError("gid 'abc' is not a number".to_string()));
    assert_eq!(error.to_string(), "Invalid sheet locator: gid 'abc' is not a number");

    let boxed: Box<dyn std::error::Error + Send + Sync> = Box::new(error);
    assert!(boxed.to_string().starts_with("Invalid sheet locator"));
}
