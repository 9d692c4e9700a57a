//! End-to-end enrichment runs over temporary CSV files with stubbed
//! network and browser collaborators.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::tempdir;

use vocabfetch::config::PacingConfig;
use vocabfetch::scrapers::{
    filename_from_url, AudioDownloader, DictionaryUrls, FetchError, GlossFetcher, ResourceProber,
};
use vocabfetch::services::{EnrichConfig, EnrichService};
use vocabfetch::table::{read_table, write_table};

const DICTIONARY: &str = "https://dict.test";

struct FixedGloss(Option<&'static str>);

#[async_trait]
impl GlossFetcher for FixedGloss {
    async fn fetch(&self, _word: &str) -> Option<String> {
        self.0.map(String::from)
    }
}

struct AllowList {
    hits: Vec<String>,
    probed: Mutex<Vec<String>>,
}

#[async_trait]
impl ResourceProber for AllowList {
    async fn probe(&self, url: &str) -> bool {
        self.probed.lock().unwrap().push(url.to_string());
        self.hits.iter().any(|h| h == url)
    }
}

/// Writes a placeholder file so the audio directory can be inspected.
struct LocalWriter;

#[async_trait]
impl AudioDownloader for LocalWriter {
    async fn download(&self, url: &str, dir: &Path) -> Result<PathBuf, FetchError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(filename_from_url(url));
        std::fs::write(&path, b"audio")?;
        Ok(path)
    }
}

fn service(gloss: Option<&'static str>, hits: Vec<String>, audio_dir: &Path) -> EnrichService {
    EnrichService::new(
        Arc::new(FixedGloss(gloss)),
        Arc::new(AllowList {
            hits,
            probed: Mutex::new(Vec::new()),
        }),
        Arc::new(LocalWriter),
        DictionaryUrls::new(DICTIONARY),
        EnrichConfig {
            audio_dir: audio_dir.to_path_buf(),
            pacing: PacingConfig::disabled(),
            fetch_glosses: true,
        },
    )
}

fn read_rows(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    reader
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect()
}

#[tokio::test]
async fn apple_gets_gloss_audio_and_definition() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in.csv");
    let output = dir.path().join("out.csv");
    let audio_dir = dir.path().join("audio");
    std::fs::write(&input, "Front,Back\napple,\n").unwrap();

    let urls = DictionaryUrls::new(DICTIONARY);
    let audio_url = urls.audio_candidates("apple")[1].clone();
    let definition_url = urls.definition_url("apple").unwrap();

    let svc = service(
        Some("a round fruit"),
        vec![audio_url.clone(), definition_url.clone()],
        &audio_dir,
    );
    let mut table = read_table(&input).unwrap();
    let stats = svc.run(&mut table).await;
    write_table(&output, &table).unwrap();

    let rows = read_rows(&output);
    assert_eq!(
        rows,
        vec![vec![
            "apple".to_string(),
            "a round fruit [sound:apple__us_1.mp3]".to_string(),
            audio_url,
            definition_url,
            "True".to_string(),
        ]]
    );
    assert!(audio_dir.join("apple__us_1.mp3").exists());
    assert_eq!(stats.glosses_added, 1);
    assert_eq!(stats.audio_found, 1);
    assert_eq!(stats.definitions_found, 1);
}

#[tokio::test]
async fn unknown_word_keeps_back_and_clears_links() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in.csv");
    let output = dir.path().join("out.csv");
    std::fs::write(
        &input,
        "Front,Back,Audio,Definition,DL valid\nzzqx123,x,stale,stale,True\n",
    )
    .unwrap();

    let svc = service(Some("never used"), Vec::new(), &dir.path().join("audio"));
    let mut table = read_table(&input).unwrap();
    let stats = svc.run(&mut table).await;
    write_table(&output, &table).unwrap();

    let rows = read_rows(&output);
    assert_eq!(
        rows,
        vec![vec![
            "zzqx123".to_string(),
            "x".to_string(),
            String::new(),
            String::new(),
            "False".to_string(),
        ]]
    );
    assert_eq!(stats.processed, 1);
    assert_eq!(stats.audio_found, 0);
    assert_eq!(stats.definitions_found, 0);
    assert_eq!(stats.glosses_added, 0);
    assert!(!dir.path().join("audio").exists());
}

#[tokio::test]
async fn blank_front_rows_are_dropped_from_output_and_stats() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in.csv");
    let output = dir.path().join("out.csv");
    std::fs::write(&input, "Front,Back\nkiwi,green\n   ,ghost\n,\npear,yellow\n").unwrap();

    let svc = service(None, Vec::new(), &dir.path().join("audio"));
    let mut table = read_table(&input).unwrap();
    assert_eq!(table.filtered_count(), 2);

    let stats = svc.run(&mut table).await;
    write_table(&output, &table).unwrap();

    let fronts: Vec<String> = read_rows(&output).into_iter().map(|r| r[0].clone()).collect();
    assert_eq!(fronts, vec!["kiwi", "pear"]);
    assert_eq!(stats.processed, 2);
}
