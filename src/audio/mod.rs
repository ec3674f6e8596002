//! Audio file handling
//!
//! WAV reading and writing plus the sample-level operations the pipeline
//! performs in-process: normalization, cutting, padding, concatenation, and
//! zero-crossing search. Anything heavier goes through the Praat bridge.

pub mod ops;
pub mod wav;

pub use wav::{SampleEncoding, Sound};
