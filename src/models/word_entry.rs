//! Vocabulary row model.

/// Tokens treated as "no value" in any text column (compared case-insensitively).
pub const NULL_TOKENS: &[&str] = &["nan", "none", "null"];

/// Check whether a cell is empty: blank, whitespace-only, or a null token.
pub fn is_empty_value(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || NULL_TOKENS
            .iter()
            .any(|token| trimmed.eq_ignore_ascii_case(token))
}

/// One row of the vocabulary table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordEntry {
    /// Headword cell exactly as read. Never blank for a row that reaches the
    /// pipeline.
    pub front: String,
    /// Gloss and/or user notes, possibly carrying an audio marker.
    pub back: String,
    /// Resolved pronunciation URL, or empty.
    pub audio_url: String,
    /// Resolved definition page URL, or empty.
    pub definition_url: String,
    /// Whether pronunciation audio was found.
    pub download_valid: bool,
    /// Values of columns this tool does not manage, keyed by header.
    pub extra: Vec<(String, String)>,
}

impl WordEntry {
    /// Create an entry with a headword and back text.
    pub fn new(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            front: front.into(),
            back: back.into(),
            ..Default::default()
        }
    }

    /// Lookup key: the headword without surrounding whitespace.
    pub fn word(&self) -> &str {
        self.front.trim()
    }

    /// Whether the back column still needs a gloss.
    pub fn needs_gloss(&self) -> bool {
        is_empty_value(&self.back)
    }

    /// Append an audio marker for `filename` to the back text.
    ///
    /// The marker is separated from existing content by one space, or becomes
    /// the whole value when the back is empty-valued.
    pub fn append_sound_marker(&mut self, filename: &str) {
        let marker = sound_marker(filename);
        let current = self.back.trim();
        self.back = if is_empty_value(current) {
            marker
        } else {
            format!("{} {}", current, marker)
        };
    }

    /// Look up an unmanaged column value.
    pub fn extra_value(&self, column: &str) -> Option<&str> {
        self.extra
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }
}

/// Flashcard audio tag referencing a sound file.
pub fn sound_marker(filename: &str) -> String {
    format!("[sound:{}]", filename)
}
