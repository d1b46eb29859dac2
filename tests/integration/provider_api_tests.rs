/*!
 * Sheet translation through real provider clients against a mock HTTP server
 */

use serde_json::json;
use sheet_translator::app_config::TranslationProvider;
use sheet_translator::app_controller::build_provider;
use sheet_translator::table::memory::MemorySheet;
use sheet_translator::translation::{TranslationService, TranslationSettings};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common;

fn fast_settings() -> TranslationSettings {
    let mut settings = common::settings(2);
    settings.dispatch.stagger = Duration::ZERO;
    settings.dispatch.cool_down = Duration::ZERO;
    settings.retry.retry_delay = Duration::from_millis(10);
    settings.retry.default_rate_limit_wait = Duration::from_millis(10);
    settings
}

fn openai_service(server: &MockServer) -> TranslationService {
    let mut config = common::test_config();
    config.translation.active_provider_config_mut().endpoint = server.uri();
    TranslationService::new(build_provider(&config), fast_settings())
}

fn chat_completion(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{"message": {"role": "assistant", "content": content}}]
    }))
}

fn greet_sheet() -> Arc<MemorySheet> {
    Arc::new(common::sheet(0, "UI", &[["greet", "Hello", "", "Bonjour"]]))
}

#[tokio::test]
async fn test_openai_shouldFillSheetFromChatCompletion() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-api-key"))
        .and(body_string_contains("greet"))
        .respond_with(chat_completion(r#"{"es":{"greet":"Hola"}}"#))
        .expect(1)
        .mount(&server)
        .await;

    let sheet = greet_sheet();
    let report = openai_service(&server).translate_sheet(sheet.clone(), |_, _| {}).await.unwrap();

    assert_eq!(report.dispatch.cells_written, 1);
    assert_eq!(sheet.committed_value(1, 2).as_deref(), Some("Hola"));
}

#[tokio::test]
async fn test_openai_rateLimit_shouldWaitAndRetry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after-ms", "20")
                .set_body_string("Rate limit reached"),
        )
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(chat_completion(r#"{"es":{"greet":"Hola"}}"#))
        .mount(&server)
        .await;

    let sheet = greet_sheet();
    let mut settings = fast_settings();
    settings.retry.retries = 1;
    let mut config = common::test_config();
    config.translation.active_provider_config_mut().endpoint = server.uri();
    let service = TranslationService::new(build_provider(&config), settings);

    let report = service.translate_sheet(sheet.clone(), |_, _| {}).await.unwrap();

    assert!(report.dispatch.failed.is_empty());
    assert_eq!(sheet.committed_value(1, 2).as_deref(), Some("Hola"));
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_openai_serverErrors_shouldExhaustRetriesAndLeaveCellEmpty() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .expect(3)
        .mount(&server)
        .await;

    let sheet = greet_sheet();
    let report = openai_service(&server).translate_sheet(sheet.clone(), |_, _| {}).await.unwrap();

    assert_eq!(report.dispatch.failed.len(), 1);
    assert!(report.dispatch.failed[0].error.contains("3 attempt(s)"));
    assert_eq!(sheet.committed_value(1, 2), None);
}

#[tokio::test]
async fn test_openai_missingSection_shouldBeUnresolved() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(chat_completion(
            r#"{"es":{"jar_gift":"Regalo"},"missing":[{"key":"jar_gift","languageCode":"fr","reason":"ambiguous"}]}"#,
        ))
        .mount(&server)
        .await;

    let sheet = Arc::new(common::sheet(0, "Items", &[["jar_gift", "Jar gift", "", ""]]));
    let report = openai_service(&server).translate_sheet(sheet.clone(), |_, _| {}).await.unwrap();

    assert_eq!(sheet.committed_value(1, 2).as_deref(), Some("Regalo"));
    assert_eq!(sheet.committed_value(1, 3), None);
    assert_eq!(report.dispatch.unresolved.len(), 1);
    assert_eq!(report.dispatch.unresolved[0].reason, "ambiguous");
}

#[tokio::test]
async fn test_anthropic_shouldFillSheetFromMessages() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "anthropic-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{"type": "text", "text": "{\"es\":{\"greet\":\"Hola\"}}"}]
        })))
        .mount(&server)
        .await;

    let mut config = common::test_config();
    config.translation.provider = TranslationProvider::Anthropic;
    let provider_config = config.translation.active_provider_config_mut();
    provider_config.api_key = "anthropic-key".to_string();
    provider_config.endpoint = server.uri();
    let service = TranslationService::new(build_provider(&config), fast_settings());

    let sheet = greet_sheet();
    service.translate_sheet(sheet.clone(), |_, _| {}).await.unwrap();

    assert_eq!(sheet.committed_value(1, 2).as_deref(), Some("Hola"));
}
