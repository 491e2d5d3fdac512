//! Translation orchestration utilities.
//! This module wires decoding, subtitle parsing, translator calls and output writing.

use crate::decode::{self, Candidate};
use crate::error::{Error, Result, TranslationError};
use crate::srt::{self, SrtBlock};
use async_trait::async_trait;
use indicatif::ProgressBar;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, info_span, trace, warn, Instrument};

pub mod openai;

/// Default bound on a single translation request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Source and target language codes, passed through to the translator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePair {
    pub source: String,
    pub target: String,
}

impl LanguagePair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Result<Self> {
        let (source, target) = (source.into(), target.into());
        if source.trim().is_empty() {
            return Err(Error::InvalidLanguage("source"));
        }
        if target.trim().is_empty() {
            return Err(Error::InvalidLanguage("target"));
        }
        Ok(Self { source, target })
    }
}

/// Translates the text of one subtitle block.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` keeping its line breaks. Implementations do not retry.
    async fn translate(
        &self,
        text: &str,
        languages: &LanguagePair,
    ) -> std::result::Result<String, TranslationError>;
}

/// Knobs for a single [`run`].
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Upper bound on each translator call.
    pub timeout: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub total: usize,
    pub translated: usize,
    /// Indices of blocks whose original text was kept.
    pub fallbacks: Vec<u32>,
    pub encoding: Candidate,
}

/// Translate `input` into `output`.
///
/// Decoding, parsing and writing errors abort the run before anything is
/// written. A failed translation only affects its own block, which keeps its
/// original text, so the output always has as many blocks as the input.
pub async fn run<T>(
    input: &Path,
    output: &Path,
    languages: &LanguagePair,
    translator: &T,
    options: &RunOptions,
    progress: &ProgressBar,
) -> Result<RunReport>
where
    T: Translator + ?Sized,
{
    let span = info_span!("run", input = %input.display());
    async move {
        info!("reading input file");
        let (content, encoding) = decode::decode_file(input)?;
        info!("read file with encoding {encoding}");
        let mut blocks = srt::parse(&content)?;
        let total = blocks.len();
        info!("found {total} subtitle blocks");

        progress.set_length(total as u64);
        let mut fallbacks = Vec::new();
        for (done, block) in blocks.iter_mut().enumerate() {
            let outcome = translate_block(block, languages, translator, options.timeout).await;
            match outcome {
                Ok(lines) => {
                    debug!(block = block.index, "translated text: {}", lines.join("\n"));
                    block.text = lines;
                }
                Err(err) => {
                    warn!(block = block.index, "keeping original text: {err}");
                    fallbacks.push(block.index);
                }
            }
            progress.inc(1);
            info!(block = block.index, "completed {}/{}", done + 1, total);
        }
        progress.finish_and_clear();

        info!("writing translated content to {}", output.display());
        srt::write(output, &blocks)?;
        let report = RunReport {
            total,
            translated: total - fallbacks.len(),
            fallbacks,
            encoding,
        };
        info!(
            "translation completed: {} translated, {} kept original",
            report.translated,
            report.fallbacks.len()
        );
        Ok(report)
    }
    .instrument(span)
    .await
}

/// Translate one block and split the answer into subtitle lines.
async fn translate_block<T>(
    block: &SrtBlock,
    languages: &LanguagePair,
    translator: &T,
    timeout: Duration,
) -> std::result::Result<Vec<String>, TranslationError>
where
    T: Translator + ?Sized,
{
    let text = block.joined_text();
    debug!(block = block.index, "original text: {text}");
    let translated = tokio::time::timeout(timeout, translator.translate(&text, languages))
        .await
        .map_err(|_| TranslationError::Timeout(timeout))??;
    let lines = subtitle_lines(&translated);
    if lines.is_empty() {
        return Err(TranslationError::Empty);
    }
    Ok(lines)
}

/// Split translated text into lines, dropping blank ones which would end the block early.
fn subtitle_lines(text: &str) -> Vec<String> {
    trace!("subtitle_lines len={}", text.len());
    text.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.trim_end().to_string())
        .collect()
}
