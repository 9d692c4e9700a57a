//! Candidate URL construction for pronunciation audio and definition pages.
//!
//! The dictionary host buckets media under a shard path derived from the
//! word itself: first character, first three characters and first five
//! characters (the latter two right-padded with `_`).

use std::sync::LazyLock;

use regex::Regex;

static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s\-]+").expect("valid separator regex"));
static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w]").expect("valid non-word regex"));

/// Normalize a word for use in dictionary URLs.
///
/// Trims, lowercases, collapses whitespace/hyphen runs into `_` and drops
/// every character outside `[A-Za-z0-9_]` (Unicode letters and digits are
/// kept). Returns an empty string when nothing usable remains.
pub fn normalize_word(word: &str) -> String {
    let lowered = word.trim().to_lowercase();
    let joined = SEPARATORS.replace_all(&lowered, "_");
    NON_WORD.replace_all(&joined, "").into_owned()
}

/// First `len` characters of `word`, right-padded with `_`.
fn padded_prefix(word: &str, len: usize) -> String {
    let mut prefix: String = word.chars().take(len).collect();
    let count = prefix.chars().count();
    prefix.extend(std::iter::repeat('_').take(len - count));
    prefix
}

/// Shard path components for a normalized word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardPath {
    pub first: String,
    pub three: String,
    pub five: String,
}

impl ShardPath {
    pub fn for_word(word: &str) -> Self {
        let first = word
            .chars()
            .next()
            .map(String::from)
            .unwrap_or_else(|| "a".to_string());
        Self {
            first,
            three: padded_prefix(word, 3),
            five: padded_prefix(word, 5),
        }
    }

    fn join(&self) -> String {
        format!("{}/{}/{}", self.first, self.three, self.five)
    }

    /// Shard used for `x`-prefixed (derived/compound) recordings.
    fn x_join(&self) -> String {
        format!("x/x{}/x{}", self.three, self.five)
    }
}

/// Media collections on the dictionary host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Collection {
    UsOgg,
    UsMp3,
    UkMp3,
}

impl Collection {
    fn as_path(self) -> &'static str {
        match self {
            Self::UsOgg => "us_pron_ogg",
            Self::UsMp3 => "us_pron",
            Self::UkMp3 => "uk_pron",
        }
    }
}

/// Builds dictionary URLs against a configurable host.
#[derive(Debug, Clone)]
pub struct DictionaryUrls {
    base: String,
}

impl DictionaryUrls {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    fn media_url(&self, collection: Collection, shard: &str, filename: &str) -> String {
        format!(
            "{}/media/english/{}/{}/{}",
            self.base,
            collection.as_path(),
            shard,
            filename
        )
    }

    /// Ordered audio candidates for `word`, most likely first.
    ///
    /// Returns an empty list when the word normalizes to nothing.
    pub fn audio_candidates(&self, word: &str) -> Vec<String> {
        let word = normalize_word(word);
        if word.is_empty() {
            return Vec::new();
        }

        let shard = ShardPath::for_word(&word);
        let path = shard.join();

        let mut urls = vec![
            self.media_url(Collection::UsOgg, &path, &format!("{word}__us_1.ogg")),
            self.media_url(Collection::UsMp3, &path, &format!("{word}__us_1.mp3")),
            self.media_url(Collection::UsMp3, &path, &format!("{word}__us_1_rr.mp3")),
            self.media_url(Collection::UsOgg, &path, &format!("{word}__us_1_rr.ogg")),
        ];
        for n in 1..=3 {
            urls.push(self.media_url(Collection::UsMp3, &path, &format!("{word}__us_{n}.mp3")));
        }
        urls.push(self.media_url(Collection::UkMp3, &path, &format!("{word}__gb_1.mp3")));
        urls.push(self.media_url(
            Collection::UsMp3,
            &shard.x_join(),
            &format!("x{word}__us_1.mp3"),
        ));

        dedup_in_order(urls)
    }

    /// Definition page URL for `word`, or `None` when it normalizes to nothing.
    pub fn definition_url(&self, word: &str) -> Option<String> {
        let word = normalize_word(word);
        if word.is_empty() {
            return None;
        }
        Some(format!("{}/definition/english/{}", self.base, word))
    }
}

/// Drop repeated URLs while keeping first-seen order.
fn dedup_in_order(urls: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(urls.len());
    for url in urls {
        if !out.contains(&url) {
            out.push(url);
        }
    }
    out
}

/// Final path segment of a URL, used as the local audio filename.
pub fn filename_from_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.split('/').next_back().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.oxfordlearnersdictionaries.com";

    #[test]
    fn test_normalize_word() {
        assert_eq!(normalize_word("  Apple "), "apple");
        assert_eq!(normalize_word("ice cream"), "ice_cream");
        assert_eq!(normalize_word("well-being"), "well_being");
        assert_eq!(normalize_word("up -  to"), "up_to");
        assert_eq!(normalize_word("don't!"), "dont");
        assert_eq!(normalize_word("café"), "café");
        assert_eq!(normalize_word("?!"), "");
        assert_eq!(normalize_word(""), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for word in ["Apple", "ice cream", "well-being", "a__b", "x - y", "don't", "Über Cool"] {
            let once = normalize_word(word);
            assert_eq!(normalize_word(&once), once, "not idempotent for {word:?}");
        }
    }

    #[test]
    fn test_shard_path_padding() {
        let shard = ShardPath::for_word("go");
        assert_eq!(shard.first, "g");
        assert_eq!(shard.three, "go_");
        assert_eq!(shard.five, "go___");

        let shard = ShardPath::for_word("apple");
        assert_eq!(shard.three, "app");
        assert_eq!(shard.five, "apple");

        let shard = ShardPath::for_word("");
        assert_eq!(shard.first, "a");
        assert_eq!(shard.three, "___");
    }

    #[test]
    fn test_candidates_order() {
        let urls = DictionaryUrls::new(BASE).audio_candidates("Apple");
        let media = format!("{BASE}/media/english");
        assert_eq!(
            urls,
            vec![
                format!("{media}/us_pron_ogg/a/app/apple/apple__us_1.ogg"),
                format!("{media}/us_pron/a/app/apple/apple__us_1.mp3"),
                format!("{media}/us_pron/a/app/apple/apple__us_1_rr.mp3"),
                format!("{media}/us_pron_ogg/a/app/apple/apple__us_1_rr.ogg"),
                format!("{media}/us_pron/a/app/apple/apple__us_2.mp3"),
                format!("{media}/us_pron/a/app/apple/apple__us_3.mp3"),
                format!("{media}/uk_pron/a/app/apple/apple__gb_1.mp3"),
                format!("{media}/us_pron/x/xapp/xapple/xapple__us_1.mp3"),
            ]
        );
    }

    #[test]
    fn test_candidates_count_for_any_word() {
        let urls = DictionaryUrls::new(BASE);
        for word in ["a", "go", "ice cream", "zzqx123"] {
            assert_eq!(urls.audio_candidates(word).len(), 8, "word {word:?}");
        }
    }

    #[test]
    fn test_candidates_empty_for_unusable_word() {
        let urls = DictionaryUrls::new(BASE);
        assert!(urls.audio_candidates("").is_empty());
        assert!(urls.audio_candidates("?!.").is_empty());
    }

    #[test]
    fn test_separator_only_word_keeps_underscore() {
        let urls = DictionaryUrls::new(BASE);
        assert_eq!(normalize_word("  --  "), "_");

        let candidates = urls.audio_candidates("--");
        assert_eq!(candidates.len(), 8);
        assert_eq!(
            candidates[0],
            format!("{BASE}/media/english/us_pron_ogg/_/___/_____/___us_1.ogg")
        );
        assert_eq!(
            urls.definition_url("--"),
            Some(format!("{BASE}/definition/english/_"))
        );
    }

    #[test]
    fn test_definition_url() {
        let urls = DictionaryUrls::new(&format!("{BASE}/"));
        assert_eq!(
            urls.definition_url("Ice Cream"),
            Some(format!("{BASE}/definition/english/ice_cream"))
        );
        assert_eq!(urls.definition_url("!!"), None);
    }

    #[test]
    fn test_filename_from_url() {
        assert_eq!(
            filename_from_url("https://host/media/a/app/apple/apple__us_1.mp3"),
            "apple__us_1.mp3"
        );
        assert_eq!(filename_from_url("https://host/x/y.ogg?sig=1"), "y.ogg");
        assert_eq!(filename_from_url("plain.mp3"), "plain.mp3");
    }
}
