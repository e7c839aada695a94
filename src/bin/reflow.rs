//! CLI binary for reflow-text.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `CleanOptions` / `BatchConfig` and prints results.

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use reflow_text::{
    clean_file, clean_files, clean_to_file, process, BatchConfig, BatchProgressCallback,
    CleanOptions, CleanOutput, ProgressCallback, ScoreReport, Status,
};
use std::collections::HashMap;
use std::io::{self, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
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

fn status_colour(status: Status) -> String {
    match status {
        Status::Draft => red(status.label()),
        Status::Improved => yellow(status.label()),
        Status::DeliveryReady => green(status.label()),
    }
}

// ── CLI progress callback using indicatif ────────────────────────────────────

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

/// Terminal progress callback: one bar plus a log line per file. Files
/// complete out of order, so start times are keyed by batch index.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start time and display name per in-flight file.
    started: Mutex<HashMap<usize, (Instant, String)>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);
        bar.set_style(style);
        bar.set_prefix("Cleaning");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            started: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    /// Elapsed seconds and display name for a finished file.
    fn finish_file(&self, index: usize) -> (f64, String) {
        self.started
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&index))
            .map(|(t, name)| (t.elapsed().as_secs_f64(), name))
            .unwrap_or_else(|| (0.0, format!("#{index}")))
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_files: usize) {
        self.bar.set_length(total_files as u64);
        self.bar.reset_eta();
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Cleaning {total_files} files…"))
        ));
    }

    fn on_file_start(&self, index: usize, _total: usize, path: &Path) {
        let name = path.display().to_string();
        self.bar.set_message(name.clone());
        if let Ok(mut m) = self.started.lock() {
            m.insert(index, (Instant::now(), name));
        }
    }

    fn on_file_complete(&self, index: usize, _total: usize, chars: usize) {
        let (secs, name) = self.finish_file(index);
        self.bar.println(format!(
            "  {} {:<40}  {}  {}",
            green("✓"),
            name,
            dim(&format!("{chars:>7} chars")),
            dim(&format!("{secs:.2}s")),
        ));
        self.bar.inc(1);
    }

    fn on_file_error(&self, index: usize, _total: usize, error: &str) {
        let (secs, name) = self.finish_file(index);
        self.errors.fetch_add(1, Ordering::SeqCst);

        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} {:<40}  {}  {}",
            red("✗"),
            name,
            red(&msg),
            dim(&format!("{secs:.2}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        let failed = total_files.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} files cleaned successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} files cleaned  ({} failed)",
                if failed == total_files {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_files,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r###"EXAMPLES:
  # Clean a model answer from the clipboard
  pbpaste | reflow

  # Clean inline text
  reflow --text "## 结论" "**Rust**很快!!"

  # Clean a file into another file
  reflow answer.md -o answer.txt

  # Keep line breaks and Markdown, drop emoji
  reflow --keep-lines --keep-markdown --remove-emoji notes.md

  # Clean many files into a directory, 8 at a time
  reflow -c 8 --out-dir cleaned drafts/*.md

  # Structured output with the quality report
  reflow --json answer.md > answer.json

STAGES (in order):
  1. Markdown     strip headings, emphasis, links, quotes  (--keep-markdown skips)
  2. Duplicates   collapse stuttered tokens and punctuation runs
  3. Punctuation  full-width in CJK context, ASCII in Latin context
  4. Spacing      one space between CJK and Latin/digits
  5. Paragraphs   join broken lines                        (--keep-lines skips)
  6. Indentation  two ideographic spaces per paragraph     (--no-indent skips)
  7. Emoji        remove emoji and pictographs             (--remove-emoji enables)

  Fenced code blocks and code-like lines are never modified. Ragged tables are
  padded and get a missing header separator; cells are left alone.

QUALITY SCORE:
  0-100, from how much noise was removed and how much remains.
  draft < 40 <= improved < 75 <= delivery-ready

ENVIRONMENT VARIABLES:
  Every flag can be set through REFLOW_<FLAG>, e.g. REFLOW_KEEP_LINES=true.
  RUST_LOG overrides the log filter.
"###;

/// Normalize LLM-generated text into clean prose.
#[derive(Parser, Debug)]
#[command(
    name = "reflow",
    version,
    about = "Normalize LLM-generated text into clean prose",
    long_about = "Strip Markdown, collapse stuttered tokens, unify punctuation width, fix \
CJK/Latin spacing and rejoin broken lines in text produced by chat models. Reads --text, \
a file, or stdin; several files are cleaned concurrently.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input files. Reads stdin when neither files nor --text are given.
    inputs: Vec<PathBuf>,

    /// Clean this text instead of reading files (words are joined with spaces).
    #[arg(long, num_args = 1.., env = "REFLOW_TEXT", conflicts_with = "inputs")]
    text: Option<Vec<String>>,

    /// Write the cleaned text to this file instead of stdout.
    #[arg(short, long, env = "REFLOW_OUTPUT", conflicts_with = "out_dir")]
    output: Option<PathBuf>,

    /// Clean every input into this directory (batch mode).
    #[arg(long, env = "REFLOW_OUT_DIR")]
    out_dir: Option<PathBuf>,

    /// Keep Markdown markup.
    #[arg(long, env = "REFLOW_KEEP_MARKDOWN")]
    keep_markdown: bool,

    /// Keep line breaks exactly; skip paragraph merging.
    #[arg(long, env = "REFLOW_KEEP_LINES")]
    keep_lines: bool,

    /// Remove emoji and pictographs.
    #[arg(long, env = "REFLOW_REMOVE_EMOJI")]
    remove_emoji: bool,

    /// Do not indent paragraphs.
    #[arg(long, env = "REFLOW_NO_INDENT")]
    no_indent: bool,

    /// Output structured JSON (text + quality report) instead of text.
    #[arg(long, env = "REFLOW_JSON")]
    json: bool,

    /// Print the quality report to stderr.
    #[arg(long, env = "REFLOW_REPORT")]
    report: bool,

    /// Number of files cleaned at once in batch mode.
    #[arg(short, long, env = "REFLOW_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Disable progress bar.
    #[arg(long, env = "REFLOW_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "REFLOW_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "REFLOW_QUIET")]
    quiet: bool,
}

impl Cli {
    fn options(&self) -> CleanOptions {
        CleanOptions::builder()
            .keep_markdown(self.keep_markdown)
            .keep_lines(self.keep_lines)
            .remove_emoji(self.remove_emoji)
            .indent_paragraphs(!self.no_indent)
            .build()
    }

    fn is_batch(&self) -> bool {
        self.text.is_none() && (self.inputs.len() > 1 || self.out_dir.is_some())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar only exists in batch mode; while it is shown, INFO
    // logs would tear it, so only errors get through.
    let show_progress = cli.is_batch() && !cli.quiet && !cli.no_progress && !cli.json;
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

    if cli.is_batch() {
        run_batch(&cli, show_progress).await
    } else {
        run_single(&cli).await
    }
}

/// One text: `--text`, a single file, or stdin.
async fn run_single(cli: &Cli) -> Result<()> {
    let options = cli.options();

    let output: CleanOutput = match (&cli.text, cli.inputs.first()) {
        (Some(words), _) => {
            let out = process(words.join(" ").as_str(), &options)?;
            if let Some(ref path) = cli.output {
                write_text(path, &out.text)?;
            }
            out
        }
        (None, Some(input)) => match cli.output {
            Some(ref path) => clean_to_file(input, path, &options)
                .await
                .with_context(|| format!("Failed to clean {}", input.display()))?,
            None => clean_file(input, &options)
                .await
                .with_context(|| format!("Failed to clean {}", input.display()))?,
        },
        (None, None) => {
            let stdin = io::stdin();
            if stdin.is_terminal() {
                bail!("no input: pass files, --text, or pipe text on stdin (see --help)");
            }
            let mut text = String::new();
            stdin
                .lock()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            let out = process(text.as_str(), &options)?;
            if let Some(ref path) = cli.output {
                write_text(path, &out.text)?;
            }
            out
        }
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if cli.output.is_none() {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(output.text.as_bytes())
            .context("Failed to write to stdout")?;
        // Ensure a trailing newline on stdout.
        if !output.text.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }

    if cli.report && !cli.quiet {
        print_report(&output.report);
    } else if !cli.quiet && !cli.json {
        if let Some(ref path) = cli.output {
            eprintln!(
                "{}  score {}  →  {}",
                green("✔"),
                output.report.score,
                bold(&path.display().to_string()),
            );
        }
    }

    Ok(())
}

/// Several files, or any files with `--out-dir`.
async fn run_batch(cli: &Cli, show_progress: bool) -> Result<()> {
    if cli.inputs.is_empty() {
        bail!("--out-dir needs at least one input file");
    }

    let mut builder = BatchConfig::builder()
        .options(cli.options())
        .concurrency(cli.concurrency);
    if let Some(ref dir) = cli.out_dir {
        builder = builder.output_dir(dir);
    }
    if show_progress {
        let cb: ProgressCallback = CliProgressCallback::new();
        builder = builder.progress_callback(cb);
    }
    let config = builder.build().context("Invalid configuration")?;

    let batch = clean_files(cli.inputs.as_slice(), &config)
        .await
        .context("Batch failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&batch).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    if cli.quiet {
        return Ok(());
    }

    if cli.report {
        for file in &batch.files {
            match (&file.report, &file.error) {
                (Some(report), _) => {
                    eprintln!("{}", bold(&file.input.display().to_string()));
                    print_report(report);
                }
                (None, Some(err)) => {
                    eprintln!("{}  {}", bold(&file.input.display().to_string()), red(&err.to_string()));
                }
                (None, None) => {}
            }
        }
    }

    let stats = &batch.stats;
    eprintln!(
        "   {}/{} files  {} → {} chars  mean score {:.1}  {}ms total",
        stats.succeeded,
        stats.total_files,
        dim(&stats.chars_in.to_string()),
        dim(&stats.chars_out.to_string()),
        stats.mean_score,
        stats.duration_ms,
    );

    Ok(())
}

/// Write cleaned text from `--text` or stdin to `-o`.
fn write_text(path: &Path, text: &str) -> Result<()> {
    let mut contents = text.to_string();
    if !contents.is_empty() && !contents.ends_with('\n') {
        contents.push('\n');
    }
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn print_report(report: &ScoreReport) {
    eprintln!(
        "{} score {}  {}",
        cyan("◆"),
        bold(&format!("{:.1}", report.score)),
        status_colour(report.status),
    );
    for note in &report.notes {
        eprintln!("  {} {}", green("✓"), note);
    }
    for warning in &report.warnings {
        eprintln!("  {} {}", yellow("⚠"), warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_after_help_keeps_heading_example() {
        assert!(AFTER_HELP.contains("reflow --text \"## 结论\" \"**Rust**很快!!\""));
        assert!(AFTER_HELP.trim_end().ends_with("RUST_LOG overrides the log filter."));
    }

    #[test]
    fn test_batch_mode_detection() {
        let cli = Cli::parse_from(["reflow", "a.md", "b.md"]);
        assert!(cli.is_batch());
        let cli = Cli::parse_from(["reflow", "a.md"]);
        assert!(!cli.is_batch());
        let cli = Cli::parse_from(["reflow", "--out-dir", "out", "a.md"]);
        assert!(cli.is_batch());
        let cli = Cli::parse_from(["reflow", "--no-indent", "--text", "x"]);
        assert!(!cli.options().indent_paragraphs);
    }
}
