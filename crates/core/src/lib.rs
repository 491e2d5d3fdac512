//! Core library for translating SRT subtitle files block by block.

pub mod decode;
pub mod error;
pub mod srt;
pub mod translate;
pub mod verify;

pub use error::{Error, Result, TranslationError};
