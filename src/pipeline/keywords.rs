use serde::Serialize;

pub const MAX_KEYWORDS: usize = 5;

/// Up to five keywords in the order the model produced them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct KeywordSet(Vec<String>);

impl KeywordSet {
    /// Splits on commas and newlines, trims, drops blanks, keeps the first five.
    pub fn parse(raw: &str) -> Self {
        Self(
            raw.split([',', '\n'])
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .take(MAX_KEYWORDS)
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fewer than five is tolerated but worth a warning.
    pub fn is_complete(&self) -> bool {
        self.0.len() == MAX_KEYWORDS
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// The first `max_chars` characters of `text`, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
