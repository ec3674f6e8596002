//! # normkit
//!
//! Audio preparation pipeline for sociophonetic norming studies. Takes raw
//! fieldwork recordings of word-list readings through silence-annotated
//! TextGrids, token extraction, normalized target selection, acoustic
//! profiling via Praat, and norming/rating subsets.
//!
//! ## Pipeline stages
//!
//! - `textgrids`: bootstrap annotation grids from silence detection
//! - `extract`: cut hand-coded tokens out of the recordings
//! - `select`: keep target variants, normalize, concatenate
//! - `profile`: forced-alignment prep, ProsodyPro, FormantPro, FastTrack
//! - `subset`: seeded norming draw and per-variable rating folders

pub mod audio;
pub mod config;
pub mod error;
pub mod metadata;
pub mod pipeline;
pub mod praat;
pub mod textgrid;
pub mod token;

pub use config::Config;
pub use error::{NormkitError, Result};

/// Version of the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the crate.
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize logging with the given verbosity level.
pub fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_not_empty() {
        assert!(!VERSION.is_empty());
        assert_eq!(NAME, "normkit");
    }
}
