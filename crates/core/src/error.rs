//! Error taxonomy for the translation pipeline.
//! Only [`TranslationError`] is recovered from; every [`Error`] ends the run.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Fatal errors that abort a run.
#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot decode {} with any candidate encoding", .path.display())]
    Decode { path: PathBuf },

    /// `position` is the 1-based position of the chunk in the file.
    #[error("malformed subtitle block #{position}: {reason}")]
    Parse { position: usize, reason: String },

    #[error("cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("language code must not be empty ({0})")]
    InvalidLanguage(&'static str),

    #[error("environment variable {0} is not set")]
    MissingCredential(&'static str),
}

/// Failure of a single translation request.
#[derive(Error, Debug)]
pub enum TranslationError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("service responded with {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("response contained no text")]
    Empty,
}

pub type Result<T> = std::result::Result<T, Error>;
