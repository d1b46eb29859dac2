use isolang::Language;
use once_cell::sync::Lazy;
use regex::Regex;

/// Language utilities for header labels and language codes
///
/// Header labels carry their language code in brackets, e.g. `[es] Spanish`
/// or `Portuguese [pt-BR]`. Codes may have a region or script subtag.
static BRACKET_CODE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]+)\]").unwrap());

/// Extract the language code from a header label
///
/// The content of the first bracket pair, trimmed; empty when the label has
/// none, which marks a non-language column.
pub fn language_code(label: &str) -> String {
    BRACKET_CODE_REGEX
        .captures(label)
        .map(|caps| caps[1].trim().to_string())
        .unwrap_or_default()
}

/// Whether two codes designate the same column language (trimmed, case-insensitive)
pub fn codes_match(code1: &str, code2: &str) -> bool {
    code1.trim().eq_ignore_ascii_case(code2.trim())
}

/// Primary subtag of a code: `pt` for `pt-BR`, `zh` for `zh_Hans`
pub fn primary_subtag(code: &str) -> &str {
    code.trim().split(['-', '_']).next().unwrap_or_default()
}

/// Look up the ISO 639 language of a code, from its primary subtag
fn iso_language(code: &str) -> Option<Language> {
    let primary = primary_subtag(code).to_lowercase();
    match primary.len() {
        2 => Language::from_639_1(&primary),
        3 => Language::from_639_3(&primary),
        _ => None,
    }
}

/// Whether the primary subtag is a known ISO 639-1 or 639-3 code
pub fn is_known_language(code: &str) -> bool {
    iso_language(code).is_some()
}

/// English name of a code, with the subtag appended, e.g. `Portuguese (BR)`
pub fn get_language_name(code: &str) -> Option<String> {
    let language = iso_language(code)?;
    let name = language.to_name();
    let primary_len = primary_subtag(code).len();
    let rest = code.trim()[primary_len..].trim_start_matches(['-', '_']);
    if rest.is_empty() {
        Some(name.to_string())
    } else {
        Some(format!("{} ({})", name, rest))
    }
}

/// Label used in log lines, e.g. `es (Spanish)`
pub fn describe(code: &str) -> String {
    match get_language_name(code) {
        Some(name) => format!("{} ({})", code, name),
        None => code.to_string(),
    }
}
