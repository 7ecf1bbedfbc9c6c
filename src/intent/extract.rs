use super::PartialFields;
use regex::{Captures, Regex};
use std::sync::LazyLock;

static NAME_AFTER_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:called|named)\s*(?:"([^"]+)"|'([^']+)')"#).expect("name label pattern")
});
static NAME_AFTER_REPO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:repo|repository)\s+(?:"([^"]+)"|'([^']+)')"#).expect("repo name pattern")
});
static NAME_BARE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:create|make)\s+(?:a\s+)?(?:repo|repository)\s+(?:(?:called|named)\s+)?([A-Za-z0-9_.\-]+)",
    )
    .expect("bare name pattern")
});
static PRIVATE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:private|privately|make it private)\b").expect("private pattern")
});
static PUBLIC_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:public|publicly|make it public)\b").expect("public pattern")
});
static DESCRIPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)description\s*[:\-]\s*(?:"([^"]+)"|'([^']+)'|(.+))"#)
        .expect("description pattern")
});
static AUTO_INIT_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:initialize with a readme|with readme|auto[- ]?init|initialize|init)\b")
        .expect("auto init pattern")
});

pub fn extract_fields(text: &str) -> PartialFields {
    if text.trim().is_empty() {
        return PartialFields::default();
    }

    PartialFields {
        name: extract_name(text),
        private: extract_private(text),
        description: extract_description(text),
        auto_init: extract_auto_init(text),
    }
}

fn first_group(captures: &Captures<'_>) -> Option<String> {
    captures
        .iter()
        .skip(1)
        .flatten()
        .map(|group| group.as_str())
        .next()
        .map(str::to_string)
}

fn extract_name(text: &str) -> Option<String> {
    [&NAME_AFTER_LABEL, &NAME_AFTER_REPO, &NAME_BARE_TOKEN]
        .into_iter()
        .find_map(|pattern| pattern.captures(text).as_ref().and_then(first_group))
}

fn extract_private(text: &str) -> Option<bool> {
    if PRIVATE_MARKER.is_match(text) {
        Some(true)
    } else if PUBLIC_MARKER.is_match(text) {
        Some(false)
    } else {
        None
    }
}

fn extract_description(text: &str) -> Option<String> {
    DESCRIPTION
        .captures(text)
        .as_ref()
        .and_then(first_group)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn extract_auto_init(text: &str) -> Option<bool> {
    AUTO_INIT_MARKER.is_match(text).then_some(true)
}
