//! Fetch-side collaborators: URL guessing, HTTP probing and downloading,
//! and browser-rendered gloss lookups.
//!
//! The pipeline only sees the capability traits defined here, so tests can
//! substitute stubs for the network and the browser.

pub mod browser;
pub mod candidates;
pub mod gloss;
pub mod http_client;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

pub use browser::BrowserFetcher;
pub use candidates::{filename_from_url, normalize_word, DictionaryUrls};
pub use gloss::{extract_inbrief, BrowserGlossFetcher, DEFINITION_NOT_FOUND};
pub use http_client::{FetchError, HeaderPool, HttpClient};

/// Looks up a short gloss for a word.
#[async_trait]
pub trait GlossFetcher: Send + Sync {
    /// Returns `None` when the lookup itself failed.
    async fn fetch(&self, word: &str) -> Option<String>;
}

/// Checks whether a remote resource exists.
#[async_trait]
pub trait ResourceProber: Send + Sync {
    /// True iff the resource answered 200 OK. Never errors.
    async fn probe(&self, url: &str) -> bool;
}

/// Saves a remote file into a local directory.
#[async_trait]
pub trait AudioDownloader: Send + Sync {
    /// Returns the path written.
    async fn download(&self, url: &str, dir: &Path) -> Result<PathBuf, FetchError>;
}
