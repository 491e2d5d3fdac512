//! Side-by-side sampling of original and translated blocks.
//! Purely diagnostic: nothing here judges a translation.

use crate::decode;
use crate::error::Result;
use crate::srt::{self, SrtBlock};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

/// Default number of blocks shown by `--verify`.
pub const DEFAULT_SAMPLES: usize = 5;

/// One block as it reads before and after translation.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub index: u32,
    pub original: String,
    pub translated: String,
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Block {}:", self.index)?;
        writeln!(f, "Original: {}", self.original)?;
        write!(f, "Translated: {}", self.translated)
    }
}

/// Pick up to `n` evenly spaced blocks whose index appears in both sequences.
pub fn sample_compare(original: &[SrtBlock], translated: &[SrtBlock], n: usize) -> Vec<Sample> {
    let mut by_index: HashMap<u32, &SrtBlock> = HashMap::new();
    for block in translated {
        by_index.entry(block.index).or_insert(block);
    }
    let common: Vec<(&SrtBlock, &SrtBlock)> = original
        .iter()
        .filter_map(|o| by_index.get(&o.index).map(|t| (o, *t)))
        .collect();
    if common.is_empty() || n == 0 {
        debug!("no common blocks to sample");
        return Vec::new();
    }
    spread(common.len(), n)
        .into_iter()
        .map(|pos| {
            let (o, t) = common[pos];
            Sample {
                index: o.index,
                original: o.joined_text(),
                translated: t.joined_text(),
            }
        })
        .collect()
}

/// Evenly spaced positions in `0..len`, always including both ends.
fn spread(len: usize, n: usize) -> Vec<usize> {
    if n >= len {
        return (0..len).collect();
    }
    if n == 1 {
        return vec![0];
    }
    (0..n).map(|k| k * (len - 1) / (n - 1)).collect()
}

/// Re-read both files and sample them. Warns when the block counts differ.
pub fn verify_files(input: &Path, output: &Path, n: usize) -> Result<Vec<Sample>> {
    let (input_text, _) = decode::decode_file(input)?;
    let (output_text, _) = decode::decode_file(output)?;
    let original = srt::parse(&input_text)?;
    let translated = srt::parse(&output_text)?;
    if original.len() != translated.len() {
        warn!(
            "block count mismatch: input has {} blocks, output has {} blocks",
            original.len(),
            translated.len()
        );
    }
    Ok(sample_compare(&original, &translated, n))
}

/// Render samples for the terminal.
pub fn render(samples: &[Sample]) -> String {
    let mut out = String::from("Verification samples:\n");
    for sample in samples {
        out.push('\n');
        out.push_str(&sample.to_string());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::srt::Timestamp;
    use std::fs;
    use tempfile::tempdir;

    fn block(index: u32, text: &str) -> SrtBlock {
        SrtBlock {
            index,
            label: index.to_string(),
            start: Timestamp(u64::from(index) * 1000),
            end: Timestamp(u64::from(index) * 1000 + 500),
            text: vec![text.to_string()],
        }
    }

    #[test]
    fn samples_are_evenly_spaced() {
        let original: Vec<_> = (1..=9).map(|i| block(i, &format!("o{i}"))).collect();
        let translated: Vec<_> = (1..=9).map(|i| block(i, &format!("t{i}"))).collect();
        let samples = sample_compare(&original, &translated, 5);
        let indices: Vec<u32> = samples.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![1, 3, 5, 7, 9]);
        assert_eq!(samples[0].original, "o1");
        assert_eq!(samples[0].translated, "t1");
    }

    #[test]
    fn small_files_show_every_block() {
        let original = vec![block(1, "a"), block(2, "b")];
        let samples = sample_compare(&original, &original, 5);
        assert_eq!(samples.len(), 2);
    }

    #[test]
    fn only_common_indices_are_sampled() {
        let original = vec![block(1, "a"), block(2, "b"), block(3, "c")];
        let translated = vec![block(2, "B"), block(4, "D")];
        let samples = sample_compare(&original, &translated, 5);
        assert_eq!(
            samples,
            vec![Sample {
                index: 2,
                original: "b".into(),
                translated: "B".into()
            }]
        );
    }

    #[test]
    fn disjoint_indices_yield_nothing() {
        let original = vec![block(1, "a")];
        let translated = vec![block(2, "b")];
        assert!(sample_compare(&original, &translated, 5).is_empty());
        assert!(sample_compare(&original, &original, 0).is_empty());
    }

    #[test]
    fn verifies_files_on_disk() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.srt");
        let output = dir.path().join("out.srt");
        fs::write(&input, "1\n00:00:01,000 --> 00:00:02,000\nこんにちは\n\n").unwrap();
        fs::write(&output, "1\n00:00:01,000 --> 00:00:02,000\n你好\n\n").unwrap();
        let samples = verify_files(&input, &output, DEFAULT_SAMPLES).unwrap();
        assert_eq!(samples.len(), 1);
        let shown = render(&samples);
        assert!(shown.contains("Block 1:\nOriginal: こんにちは\nTranslated: 你好"));
    }
}
