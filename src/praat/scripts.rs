//! Bridge scripts and their invocations
//!
//! The silence-detection wrapper is embedded here. ProsodyPro, FormantPro,
//! and the rating script are researcher-owned and live in the configured
//! script directory; they are staged into the working folder for a run and
//! removed afterwards, because both Pro scripts scan the directory they sit
//! in.

use crate::config::AnalysisConfig;
use crate::error::{NormkitError, Result};
use crate::praat::PraatRunner;
use std::path::{Path, PathBuf};

pub const PROSODY_PRO: &str = "_ProsodyPro.praat";
pub const FORMANT_PRO: &str = "_FormantPro.praat";
pub const RATING_SCRIPT: &str = "soundfile_rating_randomblind.praat";

/// The two batch modes both Pro scripts are driven through.
const BATCH_MODES: [&str; 2] = [
    "2. Process all sounds without pause",
    "3. Get ensemble files",
];

/// Wrapper around Praat's `To TextGrid (silences)`.
const SILENCE_SCRIPT: &str = r#"form Silence TextGrid
    sentence Sound_file
    sentence Grid_file
    real Silence_threshold_(dB) -50
    real Minimum_silent_interval_(s) 0.2
    real Minimum_sounding_interval_(s) 0.3
endform

sound = Read from file: sound_file$
selectObject: sound
grid = To TextGrid (silences): 100, 0, silence_threshold, minimum_silent_interval, minimum_sounding_interval, "silent", ""
selectObject: grid
Save as text file: grid_file$
"#;

/// Detect silences in a WAV and write the resulting TextGrid.
pub fn silence_textgrid(
    runner: &PraatRunner,
    wav: &Path,
    grid_out: &Path,
    config: &AnalysisConfig,
) -> Result<()> {
    let staging_dir = grid_out
        .parent()
        .ok_or_else(|| NormkitError::praat("Grid output path has no parent directory"))?;
    std::fs::create_dir_all(staging_dir)?;
    let script_path = staging_dir.join("to_textgrid_silences.praat");
    std::fs::write(&script_path, SILENCE_SCRIPT)?;

    let args = vec![
        wav.display().to_string(),
        grid_out.display().to_string(),
        config.silence_threshold_db.to_string(),
        config.min_silent_interval.to_string(),
        config.min_sounding_interval.to_string(),
    ];
    let result = runner.run_script(&script_path, &args, None);
    let _ = std::fs::remove_file(&script_path);
    result.map(|_| ())
}

/// ProsodyPro argument list for one batch mode.
///
/// Layout after the mode: tier settings, label and sound extensions, input
/// flags, F0 analysis options (floor, ceiling, sampling, smoothing), then
/// the BID analysis options ending in the formant ceiling.
pub fn prosody_args(mode: &str, config: &AnalysisConfig) -> Vec<String> {
    vec![
        mode.to_string(),
        "1".to_string(),
        "1".to_string(),
        ".label".to_string(),
        ".wav".to_string(),
        "1".to_string(),
        "0".to_string(),
        "0".to_string(),
        config.f0_floor.to_string(),
        config.f0_ceiling.to_string(),
        "10".to_string(),
        "100".to_string(),
        "0".to_string(),
        "500".to_string(),
        "250".to_string(),
        config.n_formants.to_string(),
        config.max_formant.to_string(),
    ]
}

/// FormantPro argument list for one batch mode.
pub fn formant_args(mode: &str, config: &AnalysisConfig) -> Vec<String> {
    vec![
        mode.to_string(),
        "1".to_string(),
        "1".to_string(),
        "0".to_string(),
        "0".to_string(),
        "repetition_list.txt".to_string(),
        "0".to_string(),
        ".TextGrid".to_string(),
        ".wav".to_string(),
        "./".to_string(),
        "speaker_folders.txt".to_string(),
        config.n_formants.to_string(),
        config.max_formant.to_string(),
        "0.25".to_string(),
        config.samples_per_interval.to_string(),
        "0.10".to_string(),
    ]
}

/// Stage a researcher-owned script into `workdir`, run every batch mode,
/// and remove the staged copy again.
pub fn run_staged_batch(
    runner: &PraatRunner,
    script_dir: &Path,
    script_name: &str,
    workdir: &Path,
    build_args: impl Fn(&str) -> Vec<String>,
) -> Result<()> {
    let staged = stage_script(script_dir, script_name, workdir)?;

    let mut outcome = Ok(());
    for mode in BATCH_MODES {
        log::info!("Running {script_name}: {mode}");
        if let Err(e) = runner.run_script(&staged, &build_args(mode), Some(workdir)) {
            outcome = Err(e);
            break;
        }
    }

    let _ = std::fs::remove_file(&staged);
    outcome
}

fn stage_script(script_dir: &Path, script_name: &str, workdir: &Path) -> Result<PathBuf> {
    let source = script_dir.join(script_name);
    if !source.exists() {
        return Err(NormkitError::praat(format!(
            "Script {script_name} not found in {}",
            script_dir.display()
        )));
    }
    let staged = workdir.join(script_name);
    std::fs::copy(&source, &staged)?;
    Ok(staged)
}

/// Patch the rating script's default variable number.
///
/// The researcher's script hardcodes `positive Rating_variable 3` in its
/// form; each per-variable rating folder gets a copy pointing at its own
/// variable.
pub fn render_rating_script(source: &str, variable_n: u32) -> String {
    source.replace(
        "positive Rating_variable 3",
        &format!("positive Rating_variable {variable_n}"),
    )
}
