//! Console rendering of enrichment progress.

use console::style;

use crate::services::EnrichEvent;

/// Longest gloss preview shown outside verbose mode.
const GLOSS_PREVIEW_CHARS: usize = 100;

/// Shorten `text` to `max` characters, marking the cut with `...`.
pub fn preview(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{}...", cut)
}

/// Print one progress event.
pub fn print_event(event: &EnrichEvent, verbose: bool) {
    match event {
        EnrichEvent::RowStarted { index, total, word } => {
            println!(
                "\n{} Processing: '{}'",
                style(format!("[{}/{}]", index + 1, total)).bold(),
                word
            );
        }
        EnrichEvent::GlossSkipped => {
            println!(
                "  {} Back column already has content, skipping gloss lookup",
                style("↳").dim()
            );
        }
        EnrichEvent::GlossFetching => {
            println!("  Fetching gloss...");
        }
        EnrichEvent::GlossAdded { gloss } => {
            let shown = if verbose {
                gloss.clone()
            } else {
                preview(gloss, GLOSS_PREVIEW_CHARS)
            };
            println!("  {} Gloss: {}", style("✓").green(), shown);
        }
        EnrichEvent::GlossMissing => {
            println!("  {} No gloss found", style("✗").red());
        }
        EnrichEvent::AudioSearching { candidates } => {
            println!("  Searching for audio...");
            if verbose {
                println!(
                    "    {}",
                    style(format!("{} candidate URLs", candidates.len())).dim()
                );
                for url in candidates {
                    println!("    {}", style(url).dim());
                }
            }
        }
        EnrichEvent::AudioFound { filename, url } => {
            println!("  {} Audio found: {}", style("✓").green(), filename);
            if verbose {
                println!("    {}", style(url).dim());
            }
        }
        EnrichEvent::AudioNotFound => {
            println!("  {} No audio found", style("✗").red());
        }
        EnrichEvent::DefinitionFound { url } => {
            println!("  {} Definition page found", style("✓").green());
            if verbose {
                println!("    {}", style(url).dim());
            }
        }
        EnrichEvent::DefinitionNotFound => {
            println!("  {} Definition page not found", style("✗").red());
        }
        EnrichEvent::AudioDownloaded { path } => {
            println!("  {} Audio downloaded successfully", style("✓").green());
            if verbose {
                println!("    {}", style(path.display()).dim());
            }
        }
        EnrichEvent::AudioDownloadFailed { error } => {
            println!("  {} Audio download failed", style("✗").red());
            if verbose {
                println!("    {}", style(error).dim());
            }
        }
        EnrichEvent::Pacing { delay } => {
            if verbose {
                println!(
                    "  {}",
                    style(format!("Waiting {:.1}s", delay.as_secs_f64())).dim()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_short_text_unchanged() {
        assert_eq!(preview("a round fruit", 100), "a round fruit");
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let text = "é".repeat(120);
        let shown = preview(&text, 100);
        assert!(shown.ends_with("..."));
        assert_eq!(shown.chars().count(), 103);
    }
}
