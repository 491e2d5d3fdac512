//! This module is responsible for SRT parsing and serialization.
//! Blocks read with [`parse`] render back to the same text with [`format`].

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, trace};

static TIME_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2}):(\d{2}):(\d{2}),(\d{3}) --> (\d{2}):(\d{2}):(\d{2}),(\d{3})$")
        .expect("time range pattern is valid")
});

/// A subtitle timestamp stored as milliseconds.
/// Displays as `HH:MM:SS,mmm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn from_parts(h: u64, m: u64, s: u64, ms: u64) -> Self {
        Timestamp(((h * 60 + m) * 60 + s) * 1000 + ms)
    }

    pub fn as_millis(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ms = self.0;
        let h = ms / 3_600_000;
        let m = (ms % 3_600_000) / 60_000;
        let s = (ms % 60_000) / 1000;
        let ms = ms % 1000;
        write!(f, "{h:02}:{m:02}:{s:02},{ms:03}")
    }
}

/// Represents a single SRT block (index, time range, text lines).
#[derive(Debug, Clone, PartialEq)]
pub struct SrtBlock {
    pub index: u32,
    /// Index line exactly as read, so `01` is written back as `01`.
    pub label: String,
    pub start: Timestamp,
    pub end: Timestamp,
    pub text: Vec<String>,
}

impl SrtBlock {
    /// Text lines joined with `\n`, as sent to the translator.
    pub fn joined_text(&self) -> String {
        self.text.join("\n")
    }
}

/// Parse SRT text into a list of blocks in file order.
pub fn parse(input: &str) -> Result<Vec<SrtBlock>> {
    let mut blocks = Vec::new();
    let mut chunk: Vec<&str> = Vec::new();
    for line in input.lines() {
        if line.trim().is_empty() {
            if !chunk.is_empty() {
                blocks.push(parse_chunk(&chunk, blocks.len() + 1)?);
                chunk.clear();
            }
        } else {
            chunk.push(line);
        }
    }
    if !chunk.is_empty() {
        blocks.push(parse_chunk(&chunk, blocks.len() + 1)?);
    }
    debug!("parsed {} blocks", blocks.len());
    Ok(blocks)
}

/// Parse one blank-line delimited chunk. `position` is 1-based.
fn parse_chunk(lines: &[&str], position: usize) -> Result<SrtBlock> {
    trace!("parse_chunk position={position}");
    let fail = |reason: String| Error::Parse { position, reason };
    let (index_line, rest) = lines
        .split_first()
        .ok_or_else(|| fail("empty block".into()))?;
    let label = index_line.trim();
    let index: u32 = label
        .bytes()
        .all(|b| b.is_ascii_digit())
        .then(|| label.parse::<u32>().ok())
        .flatten()
        .ok_or_else(|| fail(format!("invalid index line {label:?}")))?;
    let (time_line, text) = rest
        .split_first()
        .ok_or_else(|| fail(format!("block {index} has no time range")))?;
    let (start, end) = parse_times(time_line.trim())
        .ok_or_else(|| fail(format!("invalid time range {:?}", time_line.trim())))?;
    if end < start {
        return Err(fail(format!("block {index} ends before it starts")));
    }
    if text.is_empty() {
        return Err(fail(format!("block {index} has no text")));
    }
    Ok(SrtBlock {
        index,
        label: label.to_string(),
        start,
        end,
        text: text.iter().map(|l| l.to_string()).collect(),
    })
}

/// Parse a time range like `00:00:01,000 --> 00:00:02,000`.
fn parse_times(line: &str) -> Option<(Timestamp, Timestamp)> {
    let caps = TIME_RANGE.captures(line)?;
    let field = |i: usize| caps[i].parse::<u64>().ok();
    let stamp = |base: usize| -> Option<Timestamp> {
        let (h, m, s, ms) = (field(base)?, field(base + 1)?, field(base + 2)?, field(base + 3)?);
        if m >= 60 || s >= 60 {
            return None;
        }
        Some(Timestamp::from_parts(h, m, s, ms))
    };
    Some((stamp(1)?, stamp(5)?))
}

/// Format SRT blocks back to text.
/// Each block is followed by a blank separator line.
pub fn format(blocks: &[SrtBlock]) -> String {
    let mut out = String::new();
    for block in blocks {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            block.label,
            block.start,
            block.end,
            block.joined_text()
        ));
    }
    out
}

/// Serialize `blocks` and write them to `path` as UTF-8.
pub fn write(path: &Path, blocks: &[SrtBlock]) -> Result<()> {
    trace!("write path={}", path.display());
    fs::write(path, format(blocks)).map_err(|source| Error::Write {
        path: path.to_path_buf(),
        source,
    })
}
