//! Token extraction from coded recordings
//!
//! Takes the hand-coded TextGrids, snaps every interval boundary to a zero
//! crossing of the recording, and cuts one WAV plus one windowed TextGrid
//! per coded interval. Outputs land in per-recording subfolders of
//! `3_extracted` so multi-session speakers keep their sessions apart.

use crate::audio::{ops, Sound};
use crate::config::Config;
use crate::error::Result;
use crate::pipeline::layout::{list_files_with_ext, prepare_output_dirs, SpeakerLayout};
use crate::textgrid::TextGrid;

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub speaker: String,
    /// Read from `1_audio/1_original` instead of `2_processed`.
    pub use_original: bool,
    pub overwrite: bool,
}

/// One coded stretch of a recording: the coding label, the word-tier label
/// at its midpoint, and its (snapped) time window.
#[derive(Debug, Clone, PartialEq)]
pub struct CodedInterval {
    pub label: String,
    pub word: String,
    pub start: f64,
    pub end: f64,
}

pub fn run(config: &Config, options: &ExtractOptions) -> Result<()> {
    let layout = SpeakerLayout::new(&config.project.recordings_root, &options.speaker);
    let audio_in = if options.use_original {
        layout.original_audio()
    } else {
        layout.processed_audio()
    };
    let grid_in = layout.manual_textgrid();
    let audio_out = layout.extracted_audio();
    let grid_out = layout.extracted_textgrid();

    prepare_output_dirs(&[audio_out.clone(), grid_out.clone()], options.overwrite)?;

    let mut missing = Vec::new();
    let mut extracted = 0usize;

    for grid_path in list_files_with_ext(&grid_in, "TextGrid")? {
        let base = grid_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let wav_path = audio_in.join(format!("{base}.wav"));
        if !wav_path.exists() {
            missing.push(base);
            continue;
        }

        let sound = Sound::from_file(&wav_path)?;
        let mut grid = TextGrid::read(&grid_path)?;
        snap_boundaries(&mut grid, &sound);
        grid.save(grid_out.join(format!("{base}.TextGrid")))?;

        let tokens = coded_intervals(&grid)?;
        log::info!("{base}: {} coded token(s)", tokens.len());

        for token in &tokens {
            let stem = format!("{base}_{}_{}", token.word, token.label);
            let cut = sound.extract_part(token.start, token.end)?;
            cut.save(audio_out.join(&base).join(format!("{stem}.wav")))?;
            grid.extract_window(token.start, token.end)?
                .save(grid_out.join(&base).join(format!("{stem}.TextGrid")))?;
            extracted += 1;
        }
    }

    println!("Extracted {extracted} token(s) for {}.", options.speaker);
    if !missing.is_empty() {
        println!("Missing audio for: {}", missing.join(", "));
    }
    Ok(())
}

/// Move every internal interval-tier boundary to the nearest zero crossing.
///
/// A boundary only moves when the snapped time stays strictly inside its
/// two neighbouring intervals; otherwise the tier would stop tiling.
pub fn snap_boundaries(grid: &mut TextGrid, sound: &Sound) {
    for tier in &mut grid.tiers {
        let Some(tier) = tier.as_interval_mut() else {
            continue;
        };
        for i in 0..tier.intervals.len().saturating_sub(1) {
            let boundary = tier.intervals[i].xmax;
            let snapped = ops::nearest_zero_crossing(sound, boundary);
            if snapped > tier.intervals[i].xmin && snapped < tier.intervals[i + 1].xmax {
                tier.intervals[i].xmax = snapped;
                tier.intervals[i + 1].xmin = snapped;
            }
        }
    }
}

/// Coded stretches of the first tier: non-empty labels other than the
/// silence-detector's `silent` and the reject mark `x`. The word comes from
/// the second tier at the stretch's midpoint.
pub fn coded_intervals(grid: &TextGrid) -> Result<Vec<CodedInterval>> {
    let coding = grid.interval_tier(1)?;
    let mut tokens = Vec::new();
    for interval in &coding.intervals {
        let label = interval.text.trim();
        if label.is_empty() || label == "silent" || label == "x" {
            continue;
        }
        let midpoint = (interval.xmin + interval.xmax) / 2.0;
        let word = grid.label_at(2, midpoint)?.trim().to_string();
        tokens.push(CodedInterval {
            label: label.to_string(),
            word,
            start: interval.xmin,
            end: interval.xmax,
        });
    }
    Ok(tokens)
}
