//! CLI binary for edgequake-causelist.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `AnalysisConfig` and prints results.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use edgequake_causelist::{
    analyze, inspect, write_result, AnalysisConfig, AnalysisResult, CaseCategory, ProgressCallback,
    ProgressObserver, ProgressState, Record, RecordFilter, Stage,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress observer using indicatif ────────────────────────────────────

/// Renders progress snapshots as a single bar: a spinner until the page
/// count is known, then `current/total` for extraction and for analysis.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }

    /// Switch to the counter style once `total` is known.
    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
    }
}

impl ProgressObserver for CliProgress {
    fn on_progress(&self, state: &ProgressState) {
        if state.total > 0 && self.bar.length() != Some(state.total as u64) {
            self.activate_bar(state.total);
        }

        match state.stage {
            Stage::Idle => {}
            Stage::Extracting => {
                self.bar.set_prefix("Extracting");
                self.bar.set_position(state.current as u64);
            }
            Stage::Analyzing => {
                if state.current == 0 {
                    self.bar.reset_elapsed();
                }
                self.bar.set_prefix("Analyzing ");
                self.bar.set_position(state.current as u64);
            }
            Stage::Complete => self.bar.finish_and_clear(),
            Stage::Error => self.bar.abandon(),
        }
        if let Some(line) = closing_line(state) {
            eprintln!("{line}");
        }
    }
}

/// Line printed once a run ends. Failures print nothing here: `main`
/// reports the full error.
fn closing_line(state: &ProgressState) -> Option<String> {
    match state.stage {
        Stage::Complete => Some(format!(
            "{} {} pages analyzed",
            green("✔"),
            bold(&state.total.to_string())
        )),
        _ => None,
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Per-category summary of a cause list
  causelist cause-list.pdf

  # Only criminal matters
  causelist --category criminal cause-list.pdf

  # Cases fixed for one date, as JSON
  causelist --date 2024-03-07 --json cause-list.pdf

  # Save the full result
  causelist cause-list.pdf -o result.json

  # Smaller chunks for a rate-limited key
  causelist --chunk-size 2 cause-list.pdf

  # Inspect PDF metadata (no API key needed)
  causelist --inspect-only cause-list.pdf

CATEGORIES:
  Criminal, Service, Civil, Family, Election, Tax, Other

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (preferred when set)
  OPENAI_API_KEY          OpenAI API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (gemini, openai, anthropic, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
"#;

/// Categorize the cases of a court cause-list PDF with an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "causelist",
    version,
    about = "Categorize the cases of a court cause-list PDF with an LLM",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Also write the full result as JSON to this file.
    #[arg(short, long, env = "CAUSELIST_OUTPUT")]
    output: Option<PathBuf>,

    /// LLM model ID (default: gemini-2.5-flash).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: gemini, openai, anthropic, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Pages classified concurrently per chunk.
    #[arg(long, env = "CAUSELIST_CHUNK_SIZE", default_value_t = edgequake_causelist::DEFAULT_CHUNK_SIZE,
          value_parser = clap::value_parser!(usize))]
    chunk_size: usize,

    /// Only show cases of this category.
    #[arg(long)]
    category: Option<CaseCategory>,

    /// Only show cases dated YYYY-MM-DD.
    #[arg(long)]
    date: Option<NaiveDate>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "CAUSELIST_PASSWORD")]
    password: Option<String>,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "CAUSELIST_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Max LLM output tokens per page.
    #[arg(long, env = "CAUSELIST_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "CAUSELIST_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Retries per page on LLM failure.
    #[arg(long, env = "CAUSELIST_MAX_RETRIES", default_value_t = 2)]
    max_retries: u32,

    /// Print the (filtered) result as JSON instead of a summary.
    #[arg(long, env = "CAUSELIST_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "CAUSELIST_NO_PROGRESS")]
    no_progress: bool,

    /// Print PDF metadata only, no analysis.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "CAUSELIST_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "CAUSELIST_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "CAUSELIST_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Per-page LLM call timeout in seconds.
    #[arg(long, env = "CAUSELIST_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,
}

impl Cli {
    fn filter(&self) -> RecordFilter {
        RecordFilter {
            category: self.category,
            date: self.date,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let config = build_config(&cli, None).await?;
        let meta = inspect(&cli.input, &config)
            .await
            .context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", meta.name);
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            if let Some(ref s) = meta.subject {
                println!("Subject:      {}", s);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
            if let Some(ref c) = meta.creator {
                println!("Creator:      {}", c);
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgress::new() as Arc<dyn ProgressObserver>)
    } else {
        None
    };
    let config = build_config(&cli, progress).await?;

    // ── Run analysis ─────────────────────────────────────────────────────
    let result = analyze(&cli.input, &config)
        .await
        .context("Analysis failed")?;

    if let Some(ref output_path) = cli.output {
        write_result(&result, output_path)
            .await
            .context("Failed to write result")?;
        if !cli.quiet {
            eprintln!(
                "{}  {} cases  →  {}",
                green("✔"),
                result.total(),
                bold(&output_path.display().to_string()),
            );
        }
    }

    let filter = cli.filter();
    if cli.json {
        if filter == RecordFilter::default() {
            let json = serde_json::to_string_pretty(&result).context("Failed to serialise output")?;
            println!("{json}");
        } else {
            let records: Vec<&Record> = result.filter(&filter).collect();
            let json = serde_json::to_string_pretty(&records).context("Failed to serialise output")?;
            println!("{json}");
        }
    } else if !cli.quiet {
        print_summary(&result, &filter);
    }

    Ok(())
}

/// Category counts, known dates, then the matching cases.
fn print_summary(result: &AnalysisResult, filter: &RecordFilter) {
    println!("{}  {}", bold(&result.source_name), dim(&format!("{} pages", result.stats.total_pages)));
    println!("Total cases:  {}", bold(&result.total().to_string()));
    for (category, count) in result.category_counts() {
        println!("  {:<10} {:>4}", category.as_str(), count);
    }

    let dates = result.dates();
    if !dates.is_empty() {
        let listed: Vec<String> = dates.iter().map(|d| d.to_string()).collect();
        println!("Dates:        {}", listed.join(", "));
    }

    let matching: Vec<&Record> = result.filter(filter).collect();
    if matching.is_empty() {
        println!("{}", dim("No cases match the selected filters."));
        return;
    }

    println!();
    for record in matching {
        println!(
            "{} {}  {}",
            cyan(&format!("[{}]", record.category)),
            bold(&record.case_number),
            record.title
        );
        let mut detail = format!("    {}", record.summary);
        if let Some(date) = record.date {
            detail.push_str(&format!("  ·  {date}"));
        }
        if !record.lawyers.is_empty() {
            detail.push_str(&format!("  ·  {}", record.lawyers.join(", ")));
        }
        detail.push_str(&format!("  ·  page {}", record.page_index));
        println!("{}", dim(&detail));
    }

    let elapsed = result.stats.total_duration_ms;
    eprintln!("{}", dim(&format!("{elapsed}ms total")));
}

/// Map CLI args to `AnalysisConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<AnalysisConfig> {
    let mut builder = AnalysisConfig::builder()
        .chunk_size(cli.chunk_size)
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .max_retries(cli.max_retries)
        .download_timeout_secs(cli.download_timeout)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref path) = cli.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref password) = cli.password {
        builder = builder.password(password);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_prints_page_count() {
        let state = ProgressState {
            stage: Stage::Complete,
            current: 7,
            total: 7,
            message: None,
        };
        let line = closing_line(&state).unwrap();
        assert!(line.contains("pages analyzed"));
        assert!(line.contains('7'));
    }

    #[test]
    fn failure_is_left_to_main() {
        let state = ProgressState {
            stage: Stage::Error,
            current: 1,
            total: 5,
            message: Some("Failed to parse 'x.pdf'".into()),
        };
        assert_eq!(closing_line(&state), None);
    }
}
