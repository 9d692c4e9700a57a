//! Aggregate counters for a single run.

/// Counters accumulated across the row loop and reported once at the end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStatistics {
    /// Rows processed.
    pub processed: usize,
    /// Rows for which a pronunciation URL was found.
    pub audio_found: usize,
    /// Rows for which a definition page was found.
    pub definitions_found: usize,
    /// Rows whose back column was filled with a fetched gloss.
    pub glosses_added: usize,
    /// Audio files written to disk.
    pub audio_downloaded: usize,
}

impl RunStatistics {
    /// Rows where audio was found but the file could not be saved.
    pub fn download_failures(&self) -> usize {
        self.audio_found.saturating_sub(self.audio_downloaded)
    }
}
