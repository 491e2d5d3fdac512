//! Binary entry point for the subtitle translator.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use srt_translate_core::translate::openai::{
    OpenAiConfig, OpenAiTranslator, DEFAULT_API_BASE, DEFAULT_MODEL, DEFAULT_TEMPERATURE,
};
use srt_translate_core::translate::{run, LanguagePair, RunOptions, DEFAULT_TIMEOUT};
use srt_translate_core::verify::{self, DEFAULT_SAMPLES};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Command line options for the binary.
#[derive(Parser)]
#[command(name = "translate", about = "Translate SRT subtitle files with the OpenAI API")]
struct Cli {
    /// Path to the original SRT file.
    input: PathBuf,

    /// Path where the translated file will be saved.
    output: PathBuf,

    /// Source language code.
    #[arg(long, default_value = "ja")]
    source: String,

    /// Target language code.
    #[arg(long, default_value = "zh-TW")]
    target: String,

    /// Enable verbose debug and trace logs.
    #[arg(long)]
    debug: bool,

    /// Compare sample blocks of input and output after translating.
    #[arg(long)]
    verify: bool,

    /// Number of blocks shown by --verify.
    #[arg(long, default_value_t = DEFAULT_SAMPLES)]
    samples: usize,

    /// Chat model used for translation.
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Sampling temperature.
    #[arg(long, default_value_t = DEFAULT_TEMPERATURE)]
    temperature: f64,

    /// Seconds to wait for each block before keeping its original text.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs(), value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: u64,

    /// Base URL of the OpenAI compatible API.
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Directory receiving one log file per run.
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,
}

/// Application entry point which parses CLI args and performs actions.
/// Credentials are checked before any file is touched.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let progress = progress_bar();
    let _guard = setup_logging(&cli.log_dir, cli.debug, &progress)?;

    let languages = LanguagePair::new(cli.source.clone(), cli.target.clone())?;
    let translator = OpenAiTranslator::from_env(OpenAiConfig {
        api_base: cli.api_base.clone(),
        model: cli.model.clone(),
        temperature: cli.temperature,
    })?;
    let options = RunOptions {
        timeout: Duration::from_secs(cli.timeout_secs),
    };

    let report = run(&cli.input, &cli.output, &languages, &translator, &options, &progress)
        .await
        .with_context(|| format!("translating {}", cli.input.display()))?;
    println!(
        "Translated {}/{} blocks into {}",
        report.translated,
        report.total,
        cli.output.display()
    );
    if !report.fallbacks.is_empty() {
        let kept: Vec<String> = report.fallbacks.iter().map(u32::to_string).collect();
        println!("Kept original text for blocks: {}", kept.join(", "));
    }

    if cli.verify {
        info!("verifying translation");
        if let Some(shown) = verification(&cli.input, &cli.output, cli.samples) {
            print!("{shown}");
        }
    }
    Ok(())
}

/// Rendered samples, or `None` after a warning when either file cannot be re-read.
fn verification(input: &Path, output: &Path, samples: usize) -> Option<String> {
    match verify::verify_files(input, output, samples) {
        Ok(samples) => Some(verify::render(&samples)),
        Err(err) => {
            warn!("skipping verification: {err}");
            None
        }
    }
}

/// Log to stderr and to a timestamped file under `log_dir`.
/// The console stays at warnings unless `debug` and is drawn above the progress bar.
fn setup_logging(log_dir: &Path, debug: bool, progress: &ProgressBar) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("creating log directory {}", log_dir.display()))?;
    let name = format!(
        "translation_{}.log",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(log_dir, name));

    let (console, file) = if debug {
        (filter("trace", "info"), filter("trace", "info"))
    } else {
        (filter("warn", "warn"), filter("info", "warn"))
    };
    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer({
            let progress = progress.clone();
            move || BarWriter(progress.clone())
        })
        .with_filter(console);
    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_filter(file);
    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("initializing logging")?;
    Ok(guard)
}

/// Filter with `ours` for the binary and core crate, `rest` for dependencies.
fn filter(ours: &str, rest: &str) -> EnvFilter {
    let directives = format!("translate={ours},srt_translate_core={ours},{rest}");
    EnvFilter::new(directives)
}

/// Console log sink that hides the progress bar while a line is written.
struct BarWriter(ProgressBar);

impl Write for BarWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.suspend(|| io::stderr().write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(0);
    let style = ProgressStyle::default_bar()
        .template("Translating subtitles [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style.progress_chars("=> "));
    bar
}
