//! Row enrichment service.
//!
//! Walks the word table strictly in order. For each row it fills a missing
//! gloss, discovers pronunciation audio and the definition page, updates the
//! managed columns, downloads the audio and appends the sound marker, then
//! waits before the next row. Failures degrade the affected columns and never
//! stop the run. Separated from UI concerns: progress is emitted as events.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::config::PacingConfig;
use crate::models::{RunStatistics, WordEntry};
use crate::scrapers::{
    filename_from_url, AudioDownloader, DictionaryUrls, GlossFetcher, ResourceProber,
};
use crate::table::WordTable;

/// Events emitted while enriching rows.
#[derive(Debug, Clone, PartialEq)]
pub enum EnrichEvent {
    /// Row processing started (index is zero-based).
    RowStarted {
        index: usize,
        total: usize,
        word: String,
    },
    /// Back column already has content; gloss lookup skipped.
    GlossSkipped,
    /// Gloss lookup started.
    GlossFetching,
    /// Gloss written into the back column.
    GlossAdded { gloss: String },
    /// Gloss lookup failed.
    GlossMissing,
    /// Probing audio candidates.
    AudioSearching { candidates: Vec<String> },
    AudioFound { url: String, filename: String },
    AudioNotFound,
    DefinitionFound { url: String },
    DefinitionNotFound,
    /// Audio saved and marker appended.
    AudioDownloaded { path: PathBuf },
    AudioDownloadFailed { error: String },
    /// Waiting before the next row.
    Pacing { delay: Duration },
}

/// A confirmed audio location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioMatch {
    pub url: String,
    pub filename: String,
}

/// What a single row did, used for pacing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowOutcome {
    pub gloss_attempted: bool,
    pub audio_found: bool,
}

impl RowOutcome {
    /// Rows that hit the lookup site or found audio back off more.
    pub fn is_heavy(&self) -> bool {
        self.gloss_attempted || self.audio_found
    }
}

/// Configuration for the enrichment service.
#[derive(Debug, Clone)]
pub struct EnrichConfig {
    pub audio_dir: PathBuf,
    pub pacing: PacingConfig,
    /// Run the gloss stage for rows with an empty back column.
    pub fetch_glosses: bool,
}

/// Service enriching word rows with glosses, audio and definition links.
pub struct EnrichService {
    gloss: Arc<dyn GlossFetcher>,
    prober: Arc<dyn ResourceProber>,
    downloader: Arc<dyn AudioDownloader>,
    urls: DictionaryUrls,
    config: EnrichConfig,
    events: Option<mpsc::UnboundedSender<EnrichEvent>>,
}

impl EnrichService {
    /// Create a new enrichment service.
    pub fn new(
        gloss: Arc<dyn GlossFetcher>,
        prober: Arc<dyn ResourceProber>,
        downloader: Arc<dyn AudioDownloader>,
        urls: DictionaryUrls,
        config: EnrichConfig,
    ) -> Self {
        Self {
            gloss,
            prober,
            downloader,
            urls,
            config,
            events: None,
        }
    }

    /// Emit progress events on `tx`.
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<EnrichEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    fn emit(&self, event: EnrichEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    /// Probe audio candidates in priority order and return the first hit.
    pub async fn find_audio(&self, word: &str) -> Option<AudioMatch> {
        let candidates = self.urls.audio_candidates(word);
        self.emit(EnrichEvent::AudioSearching {
            candidates: candidates.clone(),
        });

        for url in candidates {
            if self.prober.probe(&url).await {
                let filename = filename_from_url(&url);
                return Some(AudioMatch { url, filename });
            }
        }
        None
    }

    /// Build and probe the definition page URL.
    pub async fn find_definition(&self, word: &str) -> Option<String> {
        let url = self.urls.definition_url(word)?;
        if self.prober.probe(&url).await {
            Some(url)
        } else {
            None
        }
    }

    /// Run the gloss stage for one entry.
    async fn fill_gloss(&self, entry: &mut WordEntry, stats: &mut RunStatistics) -> bool {
        if !entry.needs_gloss() {
            self.emit(EnrichEvent::GlossSkipped);
            return false;
        }
        // Null tokens are not echoed back to the output.
        entry.back.clear();
        if !self.config.fetch_glosses {
            return false;
        }

        self.emit(EnrichEvent::GlossFetching);
        match self.gloss.fetch(entry.word()).await {
            Some(gloss) if !gloss.trim().is_empty() => {
                entry.back = gloss.trim().to_string();
                stats.glosses_added += 1;
                self.emit(EnrichEvent::GlossAdded {
                    gloss: entry.back.clone(),
                });
            }
            _ => self.emit(EnrichEvent::GlossMissing),
        }
        true
    }

    /// Process one row in place.
    pub async fn process_entry(
        &self,
        entry: &mut WordEntry,
        stats: &mut RunStatistics,
    ) -> RowOutcome {
        let word = entry.word().to_string();
        let gloss_attempted = self.fill_gloss(entry, stats).await;

        let audio = self.find_audio(&word).await;
        let definition = self.find_definition(&word).await;

        match &audio {
            Some(found) => {
                stats.audio_found += 1;
                self.emit(EnrichEvent::AudioFound {
                    url: found.url.clone(),
                    filename: found.filename.clone(),
                });
            }
            None => {
                warn!("Audio not found for word: {}", word);
                self.emit(EnrichEvent::AudioNotFound);
            }
        }
        match &definition {
            Some(url) => {
                stats.definitions_found += 1;
                self.emit(EnrichEvent::DefinitionFound { url: url.clone() });
            }
            None => {
                warn!("Definition page not found for word: {}", word);
                self.emit(EnrichEvent::DefinitionNotFound);
            }
        }

        entry.audio_url = audio.as_ref().map(|a| a.url.clone()).unwrap_or_default();
        entry.definition_url = definition.unwrap_or_default();
        entry.download_valid = audio.is_some();

        // A failed download keeps the discovered URL and DL valid flag but
        // adds no marker.
        if let Some(found) = &audio {
            match self
                .downloader
                .download(&found.url, &self.config.audio_dir)
                .await
            {
                Ok(path) => {
                    entry.append_sound_marker(&found.filename);
                    stats.audio_downloaded += 1;
                    self.emit(EnrichEvent::AudioDownloaded { path });
                }
                Err(e) => {
                    error!("Failed to download audio from {} | {}", found.url, e);
                    self.emit(EnrichEvent::AudioDownloadFailed {
                        error: e.to_string(),
                    });
                }
            }
        }

        stats.processed += 1;
        RowOutcome {
            gloss_attempted,
            audio_found: audio.is_some(),
        }
    }

    /// Enrich every row of `table` in order and return the run totals.
    pub async fn run(&self, table: &mut WordTable) -> RunStatistics {
        let mut stats = RunStatistics::default();
        let total = table.len();

        for (index, entry) in table.entries_mut().iter_mut().enumerate() {
            self.emit(EnrichEvent::RowStarted {
                index,
                total,
                word: entry.word().to_string(),
            });

            let outcome = self.process_entry(entry, &mut stats).await;

            if index + 1 < total {
                let delay = self
                    .config
                    .pacing
                    .delay_after(&mut rand::thread_rng(), outcome.is_heavy());
                if !delay.is_zero() {
                    self.emit(EnrichEvent::Pacing { delay });
                    tokio::time::sleep(delay).await;
                }
            }
        }

        info!(
            "Run finished: {} processed, {} audio, {} definitions, {} glosses, {} downloaded",
            stats.processed,
            stats.audio_found,
            stats.definitions_found,
            stats.glosses_added,
            stats.audio_downloaded
        );
        stats
    }
}
