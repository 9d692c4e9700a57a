//! Command-line interface.

mod progress;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use console::style;
use tokio::sync::mpsc;

use crate::config::Settings;
use crate::models::RunStatistics;
use crate::scrapers::{BrowserFetcher, BrowserGlossFetcher, DictionaryUrls, HeaderPool, HttpClient};
use crate::services::{EnrichConfig, EnrichEvent, EnrichService};
use crate::table::{read_table, write_table};

pub use progress::{preview, print_event};

#[derive(Parser, Debug)]
#[command(name = "vocabfetch")]
#[command(about = "Fetch pronunciation audio, definition links and glosses for a word list")]
#[command(version)]
pub struct Cli {
    /// Input CSV file with a 'Front' column
    pub input: PathBuf,

    /// Output CSV file to save results
    pub output: PathBuf,

    /// Directory to save audio files
    #[arg(long, visible_alias = "audio_dir", value_name = "DIR")]
    pub audio_dir: Option<PathBuf>,

    /// Config file path
    #[arg(short, long, env = "VOCABFETCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip gloss lookups for rows with an empty 'Back'
    #[arg(long)]
    pub no_gloss: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Enrich the input table and write the result.
pub async fn run(cli: &Cli, settings: &Settings) -> anyhow::Result<RunStatistics> {
    let mut table = read_table(&cli.input)?;

    if table.filtered_count() > 0 {
        println!(
            "{} Filtered out {} rows with empty 'Front' values",
            style("⚠").yellow(),
            table.filtered_count()
        );
    }
    if table.is_empty() {
        anyhow::bail!("No valid words found in '{}'", cli.input.display());
    }

    println!("Processing {} words...", table.len());
    if cli.verbose {
        println!(
            "{}",
            style("Verbose mode enabled - showing candidate URLs and timings").dim()
        );
    }

    let audio_dir = cli
        .audio_dir
        .clone()
        .unwrap_or_else(|| settings.audio_dir.clone());

    let http = Arc::new(HttpClient::new(&settings.http).context("Failed to create HTTP client")?);
    let gloss = Arc::new(BrowserGlossFetcher::new(
        BrowserFetcher::new(settings.browser.clone()),
        &settings.lookup_base,
        HeaderPool::new(settings.http.user_agents.clone()),
    ));

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<EnrichEvent>();
    let service = EnrichService::new(
        gloss,
        http.clone(),
        http,
        DictionaryUrls::new(&settings.dictionary_base),
        EnrichConfig {
            audio_dir: audio_dir.clone(),
            pacing: settings.pacing,
            fetch_glosses: !cli.no_gloss,
        },
    )
    .with_events(event_tx);

    let verbose = cli.verbose;
    let event_handler = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            print_event(&event, verbose);
        }
    });

    let stats = service.run(&mut table).await;

    // Closing the channel lets the printer drain and exit
    drop(service);
    let _ = event_handler.await;

    write_table(&cli.output, &table)
        .with_context(|| format!("Failed to write '{}'", cli.output.display()))?;

    println!("\n{}", style("Processing complete!").green().bold());
    println!("Results saved to: '{}'", cli.output.display());
    println!("Audio files saved to: '{}' directory", audio_dir.display());
    println!("Log saved to: '{}'", settings.log_file.display());
    print_summary(&stats);

    Ok(stats)
}

/// Print run totals.
pub fn print_summary(stats: &RunStatistics) {
    println!("\n{}", style("Summary:").bold());
    println!("  Total words processed: {}", stats.processed);
    println!("  Audio files found: {}", stats.audio_found);
    println!("  Audio files downloaded: {}", stats.audio_downloaded);
    println!("  Definition pages found: {}", stats.definitions_found);
    println!("  Glosses added: {}", stats.glosses_added);
    if stats.download_failures() > 0 {
        println!(
            "  {} {} found but not downloaded",
            style("→").dim(),
            stats.download_failures()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableError;

    #[test]
    fn test_parse_positional_and_flags() {
        let cli = Cli::try_parse_from([
            "vocabfetch",
            "in.csv",
            "out.csv",
            "--audio_dir",
            "sounds",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.input, PathBuf::from("in.csv"));
        assert_eq!(cli.output, PathBuf::from("out.csv"));
        assert_eq!(cli.audio_dir, Some(PathBuf::from("sounds")));
        assert!(cli.verbose);
        assert!(!cli.no_gloss);
    }

    #[test]
    fn test_requires_both_paths() {
        assert!(Cli::try_parse_from(["vocabfetch", "in.csv"]).is_err());
    }

    #[test]
    fn test_audio_dir_long_form() {
        let cli =
            Cli::try_parse_from(["vocabfetch", "a.csv", "b.csv", "--audio-dir", "x"]).unwrap();
        assert_eq!(cli.audio_dir, Some(PathBuf::from("x")));
    }

    fn cli_for(input: PathBuf, output: PathBuf) -> Cli {
        Cli {
            input,
            output,
            audio_dir: None,
            config: None,
            no_gloss: true,
            verbose: false,
        }
    }

    #[tokio::test]
    async fn test_missing_input_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.csv");
        let cli = cli_for(dir.path().join("missing.csv"), output.clone());

        let err = run(&cli, &Settings::default()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TableError>(),
            Some(TableError::NotFound(_))
        ));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_empty_input_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        let output = dir.path().join("out.csv");
        std::fs::write(&input, "").unwrap();

        let err = run(&cli_for(input, output.clone()), &Settings::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TableError>(),
            Some(TableError::Empty(_))
        ));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_only_blank_front_rows_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        let output = dir.path().join("out.csv");
        std::fs::write(&input, "Front,Back\n  ,ghost\n,\n").unwrap();

        let err = run(&cli_for(input, output.clone()), &Settings::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No valid words"));
        assert!(!output.exists());
    }
}
