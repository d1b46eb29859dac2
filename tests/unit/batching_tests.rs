/*!
 * Tests for the batching policy
 */

use sheet_translator::translation::{BatchingPolicy, TranslationCandidate};

fn candidate(text: &str, codes: &[&str]) -> TranslationCandidate {
    TranslationCandidate {
        key: "key".to_string(),
        source_text: text.to_string(),
        missing_language_codes: codes.iter().map(|s| s.to_string()).collect(),
        context: Some("note".to_string()),
        row_index: 7,
        category: Some("UI".to_string()),
    }
}

const CODES: [&str; 12] = ["es", "fr", "de", "it", "pt", "ru", "ja", "ko", "zh", "tr", "pl", "nl"];

#[test]
fn test_split_shouldPartitionMissingLanguagesInOrder() {
    for size in 1..=6 {
        let policy = BatchingPolicy::new(size, 300);
        for count in 1..=CODES.len() {
            let items = policy.split(&candidate("Short", &CODES[..count]));

            let flattened: Vec<&str> = items
                .iter()
                .flat_map(|i| i.target_language_codes.iter().map(String::as_str))
                .collect();
            assert_eq!(flattened, CODES[..count].to_vec(), "size {} count {}", size, count);
            assert!(items.iter().all(|i| !i.target_language_codes.is_empty()));
            assert!(items.iter().all(|i| i.target_language_codes.len() <= size));
            assert_eq!(items.len(), count.div_ceil(size));
        }
    }
}

#[test]
fn test_split_withLongText_shouldUseOneLanguagePerItem() {
    let policy = BatchingPolicy::new(5, 10);
    let items = policy.split(&candidate("This text is definitely longer than ten", &["es", "fr", "de"]));

    assert_eq!(items.len(), 3);
    assert!(items.iter().all(|i| i.target_language_codes.len() == 1));
}

#[test]
fn test_split_atLengthThreshold_shouldStillBatch() {
    let policy = BatchingPolicy::new(5, 5);
    assert_eq!(policy.split(&candidate("12345", &["es", "fr"])).len(), 1);
    assert_eq!(policy.split(&candidate("123456", &["es", "fr"])).len(), 2);
}

#[test]
fn test_split_shouldCountCharactersNotBytes() {
    let policy = BatchingPolicy::new(5, 4);
    // 4 characters, 8 bytes
    assert_eq!(policy.split(&candidate("ñañá", &["es", "fr"])).len(), 1);
}

#[test]
fn test_split_shouldCopyRowDataIntoEveryItem() {
    let policy = BatchingPolicy::new(1, 300);
    for item in policy.split(&candidate("Hi", &["es", "fr"])) {
        assert_eq!(item.key, "key");
        assert_eq!(item.source_text, "Hi");
        assert_eq!(item.row_index, 7);
        assert_eq!(item.context.as_deref(), Some("note"));
        assert_eq!(item.category.as_deref(), Some("UI"));
    }
}

#[test]
fn test_new_withZeroBatchSize_shouldClampToOne() {
    let policy = BatchingPolicy::new(0, 300);
    assert_eq!(policy.batched_languages_size, 1);
    assert_eq!(policy.split(&candidate("Hi", &["es", "fr"])).len(), 2);
}

#[test]
fn test_splitAll_shouldKeepScanOrder() {
    let policy = BatchingPolicy::default();
    let mut first = candidate("One", &["es"]);
    first.key = "first".to_string();
    let mut second = candidate("Two", &["fr"]);
    second.key = "second".to_string();

    let items = policy.split_all(vec![first, second]);

    let keys: Vec<&str> = items.iter().map(|i| i.key.as_str()).collect();
    assert_eq!(keys, vec!["first", "second"]);
}
