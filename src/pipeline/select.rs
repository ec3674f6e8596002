//! Target token selection and normalization
//!
//! Walks every session folder of extracted tokens, keeps the target-coded
//! ones, renames them into the selected-token encoding, normalizes peak
//! and intensity, and concatenates the lot in item-code order together
//! with a recoverable TextGrid and a token info log. Later sessions
//! replace earlier copies of the same item; supplementary-session tokens
//! are kept apart in a `supp` subfolder and stay out of the concatenation.

use crate::audio::{ops, Sound};
use crate::config::Config;
use crate::error::{NormkitError, Result};
use crate::metadata::{write_token_records, TokenRecord};
use crate::pipeline::layout::{
    discover_speakers, list_files_with_ext, list_subdirs, prepare_output_dirs, SpeakerLayout,
};
use crate::textgrid::TextGrid;
use crate::token::{RecordedToken, SelectedToken};
use rayon::prelude::*;

#[derive(Debug, Clone)]
pub struct SelectOptions {
    /// Speakers to process; empty means every discovered speaker.
    pub speakers: Vec<String>,
    pub overwrite: bool,
}

pub fn run(config: &Config, options: &SelectOptions) -> Result<()> {
    let root = &config.project.recordings_root;
    let speakers = if options.speakers.is_empty() {
        discover_speakers(root)?
    } else {
        options.speakers.clone()
    };
    if speakers.is_empty() {
        println!("No speaker with extracted tokens found under {}.", root.display());
        return Ok(());
    }

    if speakers.len() == 1 {
        return select_speaker(config, &speakers[0], options.overwrite);
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.jobs.min(speakers.len()))
        .build()
        .map_err(|e| NormkitError::pipeline(format!("Failed to build worker pool: {e}")))?;
    pool.install(|| {
        speakers
            .par_iter()
            .map(|speaker| select_speaker(config, speaker, options.overwrite))
            .collect::<Result<Vec<_>>>()
    })?;
    Ok(())
}

fn select_speaker(config: &Config, speaker: &str, overwrite: bool) -> Result<()> {
    let layout = SpeakerLayout::new(&config.project.recordings_root, speaker);
    let audio_in = layout.extracted_audio();
    let grid_in = layout.extracted_textgrid();
    let audio_out = layout.selected_audio();
    let grid_out = layout.selected_textgrid();
    let concat_out = layout.concatenated();

    prepare_output_dirs(
        &[audio_out.clone(), grid_out.clone(), concat_out.clone()],
        overwrite,
    )?;

    let mut selected = 0usize;
    for session_dir in list_subdirs(&audio_in)? {
        let session = session_dir
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let is_supp = crate::token::Session::parse(&session).is_supp();
        let (audio_dest, grid_dest) = if is_supp {
            (audio_out.join("supp"), grid_out.join("supp"))
        } else {
            (audio_out.clone(), grid_out.clone())
        };

        for wav in list_files_with_ext(&session_dir, "wav")? {
            let stem = wav
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let token = match RecordedToken::parse(&stem) {
                Ok(token) => token,
                Err(e) => {
                    log::warn!("Skipping {stem}: {e}");
                    continue;
                }
            };
            if !token.is_target() {
                continue;
            }

            let selection = token.to_selected()?;
            let out_wav = audio_dest.join(format!("{}.wav", selection.stem()));
            if out_wav.exists() {
                log::debug!("Replacing {} with the copy from {session}", selection.stem());
            }

            let mut sound = Sound::from_file(&wav)?;
            ops::scale_peak(&mut sound, config.normalize.peak);
            ops::scale_intensity(&mut sound, config.normalize.intensity_db);
            sound.save(&out_wav)?;

            let token_grid = grid_in.join(&session).join(format!("{stem}.TextGrid"));
            if token_grid.exists() {
                std::fs::create_dir_all(&grid_dest)?;
                std::fs::copy(
                    &token_grid,
                    grid_dest.join(format!("{}.TextGrid", selection.stem())),
                )?;
            } else {
                log::warn!("No TextGrid for {stem} in {session}");
            }
            selected += 1;
        }
    }

    concatenate_selection(&layout)?;
    println!("{speaker}: selected {selected} token(s).");
    Ok(())
}

/// Join the selected tokens in item-code order into one WAV, the matching
/// recoverable TextGrid, and the token info log.
fn concatenate_selection(layout: &SpeakerLayout) -> Result<()> {
    let audio_out = layout.selected_audio();
    let concat_out = layout.concatenated();
    let speaker = layout.speaker();

    let mut tokens: Vec<SelectedToken> = Vec::new();
    for wav in list_files_with_ext(&audio_out, "wav")? {
        let stem = wav
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        tokens.push(SelectedToken::parse(&stem)?);
    }
    if tokens.is_empty() {
        log::warn!("{speaker}: nothing selected, skipping concatenation");
        return Ok(());
    }
    tokens.sort_by_key(SelectedToken::ordering);

    let mut sounds = Vec::with_capacity(tokens.len());
    let mut pieces = Vec::with_capacity(tokens.len());
    let mut records = Vec::with_capacity(tokens.len());
    for token in &tokens {
        let sound = Sound::from_file(audio_out.join(format!("{}.wav", token.stem())))?;
        pieces.push((token.stem(), sound.duration()));
        sounds.push(sound);
        records.push(TokenRecord::from_token(token));
    }

    let joined = ops::concatenate(&sounds)?;
    joined.save(concat_out.join(format!("{speaker}_selected_tokens.wav")))?;
    TextGrid::recovered("tokens", &pieces)
        .save(concat_out.join(format!("{speaker}_selected_tokens.TextGrid")))?;
    write_token_records(
        concat_out.join(format!("{speaker}_selected_tokens_info.csv")),
        &records,
    )?;
    Ok(())
}
