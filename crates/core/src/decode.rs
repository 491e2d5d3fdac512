//! Character set detection for subtitle files.
//! Candidates are tried in a fixed order and the first one that decodes the
//! whole byte stream without a malformed sequence wins.

use crate::error::{Error, Result};
use encoding_rs::{Encoding, EUC_JP, ISO_2022_JP, SHIFT_JIS, UTF_16BE, UTF_16LE, UTF_8};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, trace};

/// An encoding the decoder is willing to try.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Candidate {
    /// UTF-8, with a leading byte order mark stripped when present.
    Utf8,
    /// UTF-16 in either byte order; only accepted with a byte order mark.
    Utf16,
    ShiftJis,
    EucJp,
    Iso2022Jp,
}

/// Preference order used by [`decode_bytes`].
pub const CANDIDATES: [Candidate; 5] = [
    Candidate::Utf8,
    Candidate::Utf16,
    Candidate::ShiftJis,
    Candidate::EucJp,
    Candidate::Iso2022Jp,
];

impl Candidate {
    /// Decode all of `bytes`, or `None` if any sequence is invalid.
    pub fn attempt(self, bytes: &[u8]) -> Option<String> {
        match self {
            Candidate::Utf8 => {
                let body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
                strict(UTF_8, body)
            }
            Candidate::Utf16 => match Encoding::for_bom(bytes) {
                Some((enc, bom_len)) if enc == UTF_16LE || enc == UTF_16BE => {
                    strict(enc, &bytes[bom_len..])
                }
                _ => None,
            },
            Candidate::ShiftJis => strict(SHIFT_JIS, bytes),
            Candidate::EucJp => strict(EUC_JP, bytes),
            Candidate::Iso2022Jp => strict(ISO_2022_JP, bytes),
        }
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Candidate::Utf8 => "utf-8",
            Candidate::Utf16 => "utf-16",
            Candidate::ShiftJis => "shift-jis",
            Candidate::EucJp => "euc-jp",
            Candidate::Iso2022Jp => "iso-2022-jp",
        };
        f.write_str(name)
    }
}

fn strict(encoding: &'static Encoding, bytes: &[u8]) -> Option<String> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
}

/// Decode raw bytes with the first candidate that accepts them.
pub fn decode_bytes(bytes: &[u8]) -> Option<(String, Candidate)> {
    CANDIDATES.iter().find_map(|&candidate| {
        trace!("trying {candidate}");
        candidate.attempt(bytes).map(|text| (text, candidate))
    })
}

/// Read `path` and decode it.
pub fn decode_file(path: &Path) -> Result<(String, Candidate)> {
    trace!("decode_file path={}", path.display());
    let bytes = fs::read(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let (text, candidate) = decode_bytes(&bytes).ok_or_else(|| Error::Decode {
        path: path.to_path_buf(),
    })?;
    debug!("decoded {} as {candidate}", path.display());
    Ok((text, candidate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn plain_utf8_wins_first() {
        let (text, candidate) = decode_bytes("1\nこんにちは\n".as_bytes()).unwrap();
        assert_eq!(candidate, Candidate::Utf8);
        assert_eq!(text, "1\nこんにちは\n");
    }

    #[test]
    fn strips_utf8_bom() {
        let (text, candidate) = decode_bytes(b"\xEF\xBB\xBF1\nhi\n").unwrap();
        assert_eq!(candidate, Candidate::Utf8);
        assert_eq!(text, "1\nhi\n");
    }

    #[test]
    fn utf16_requires_bom() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "1\nhi\n".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let (text, candidate) = decode_bytes(&bytes).unwrap();
        assert_eq!(candidate, Candidate::Utf16);
        assert_eq!(text, "1\nhi\n");

        assert_eq!(Candidate::Utf16.attempt(&bytes[2..]), None);
    }

    #[test]
    fn falls_back_to_shift_jis() {
        let (bytes, _, had_errors) = SHIFT_JIS.encode("こんにちは、世界");
        assert!(!had_errors);
        assert!(std::str::from_utf8(&bytes).is_err());

        let (text, candidate) = decode_bytes(&bytes).unwrap();
        assert_eq!(candidate, Candidate::ShiftJis);
        assert_eq!(text, "こんにちは、世界");
    }

    #[test]
    fn rejects_bytes_no_candidate_accepts() {
        assert!(decode_bytes(&[0xFF, 0xFF, 0xFF]).is_none());
    }

    #[test]
    fn decode_file_reports_errors() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.srt");
        assert!(matches!(decode_file(&missing), Err(Error::Read { .. })));

        let garbage = dir.path().join("garbage.srt");
        fs::write(&garbage, [0xFF, 0xFF, 0xFF]).unwrap();
        assert!(matches!(decode_file(&garbage), Err(Error::Decode { .. })));
    }
}
