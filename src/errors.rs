/*!
 * Error types for the sheet-translator application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails, or the response breaks the expected schema
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The provider asked us to slow down
    #[error("Rate limit exceeded: {message}")]
    RateLimitExceeded {
        /// Message reported by the provider
        message: String,
        /// Wait suggested by the provider, if any
        retry_after_ms: Option<u64>,
    },

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Whether this error is a rate-limit signal rather than a real failure
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimitExceeded { .. })
    }

    /// Provider-supplied wait for a rate-limit signal
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimitExceeded { retry_after_ms: Some(ms), .. } => Some(Duration::from_millis(*ms)),
            _ => None,
        }
    }
}

/// Errors raised by a table store
#[derive(Error, Debug)]
pub enum TableError {
    /// The requested sheet does not exist in the document
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// The store answered with an error
    #[error("Table API error: {status_code} - {message}")]
    Api {
        /// HTTP status code
        status_code: u16,
        /// Error message from the store
        message: String,
    },

    /// The store could not be reached
    #[error("Table request failed: {0}")]
    Request(String),

    /// The stored document could not be decoded
    #[error("Malformed table data: {0}")]
    Malformed(String),

    /// Local file error
    #[error("Table file error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisting pending writes failed
    #[error("Failed to persist {pending} pending cell(s): {message}")]
    Persist {
        /// Number of cells that stay pending
        pending: usize,
        /// Underlying failure
        message: String,
    },
}

/// Errors found while reading a sheet's header
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// The header row is empty
    #[error("Sheet '{0}' has an empty header row")]
    EmptyHeader(String),

    /// No "key"/"keys" column was found
    #[error("Sheet '{sheet}' has no key column (expected a 'Key' or 'Keys' label)")]
    MissingKeyColumn {
        /// Sheet title
        sheet: String,
    },

    /// No column carries the source language code
    #[error("Sheet '{sheet}' has no source column (expected a label containing '[{language}]')")]
    MissingSourceColumn {
        /// Sheet title
        sheet: String,
        /// Source language code that was searched for
        language: String,
    },
}

/// Errors that can occur during translation
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Every bounded attempt failed
    #[error("All {attempts} attempt(s) failed, last error: {last}")]
    RetriesExhausted {
        /// Number of attempts made
        attempts: u32,
        /// Error of the final attempt
        last: ProviderError,
    },

    /// Rate-limit backoff went past its ceiling
    #[error("Gave up after {waits} rate-limit wait(s) totalling {waited:?}")]
    RateLimitCeiling {
        /// Number of waits performed
        waits: u32,
        /// Total time spent waiting
        waited: Duration,
    },

    /// Error from the table store
    #[error("Table error: {0}")]
    Table(#[from] TableError),

    /// Error reading the sheet layout
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
}

/// A sheet locator that cannot be understood
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid sheet locator: {0}")]
pub struct LocatorError(pub String);
