//! Error types

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the preparation pipeline.
#[derive(Debug, Error)]
pub enum NormkitError {
    #[error("Audio error: {0}")]
    Audio(String),

    #[error("TextGrid error: {0}")]
    TextGrid(String),

    #[error("Token name error: {0}")]
    Token(String),

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("Praat error: {0}")]
    Praat(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Output directory already exists: {0}. Rerun with --overwrite if desired.")]
    OutputExists(PathBuf),
}

impl NormkitError {
    pub fn audio<S: Into<String>>(msg: S) -> Self {
        Self::Audio(msg.into())
    }

    pub fn textgrid<S: Into<String>>(msg: S) -> Self {
        Self::TextGrid(msg.into())
    }

    pub fn token<S: Into<String>>(msg: S) -> Self {
        Self::Token(msg.into())
    }

    pub fn metadata<S: Into<String>>(msg: S) -> Self {
        Self::Metadata(msg.into())
    }

    pub fn praat<S: Into<String>>(msg: S) -> Self {
        Self::Praat(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    pub fn pipeline<S: Into<String>>(msg: S) -> Self {
        Self::Pipeline(msg.into())
    }
}

impl From<hound::Error> for NormkitError {
    fn from(err: hound::Error) -> Self {
        Self::audio(err.to_string())
    }
}

impl From<csv::Error> for NormkitError {
    fn from(err: csv::Error) -> Self {
        Self::metadata(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, NormkitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = NormkitError::audio("bad sample rate");
        assert!(e.to_string().contains("Audio"));

        let e = NormkitError::OutputExists(PathBuf::from("/tmp/out"));
        assert!(e.to_string().contains("--overwrite"));
    }
}
