//! Acoustic profiling of the concatenated selection
//!
//! Three stages, run independently per speaker. `--alignment` prepares a
//! forced-alignment corpus from the concatenated selection (bare-word
//! labels for the aligner's dictionary lookup). After the researcher runs
//! the aligner, `--prosody` drives ProsodyPro over the word-level grids
//! and `--formants` merges the aligned phone tiers back in, marks the
//! target phone of every token, and drives FormantPro. `--fasttrack`
//! stages the same marked grids for a manual FastTrack run instead.

use crate::config::Config;
use crate::error::{NormkitError, Result};
use crate::pipeline::layout::{self, list_files_with_ext, prepare_output_dirs, SpeakerLayout};
use crate::praat::scripts::{
    formant_args, prosody_args, run_staged_batch, FORMANT_PRO, PROSODY_PRO,
};
use crate::praat::PraatRunner;
use crate::textgrid::TextGrid;
use crate::token::SelectedToken;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct ProfileOptions {
    pub speaker: String,
    pub alignment: bool,
    pub prosody: bool,
    pub formants: bool,
    pub fasttrack: bool,
    pub overwrite: bool,
}

pub fn run(config: &Config, runner: &PraatRunner, options: &ProfileOptions) -> Result<()> {
    let layout = SpeakerLayout::new(&config.project.recordings_root, &options.speaker);

    if !(options.alignment || options.prosody || options.formants || options.fasttrack) {
        println!(
            "Nothing to do. Pass --alignment, --prosody, --formants, or --fasttrack."
        );
        return Ok(());
    }

    if options.alignment {
        prepare_alignment(&layout, options.overwrite)?;
    }
    if options.prosody {
        run_prosody(config, runner, &layout, options.overwrite)?;
    }
    if options.formants || options.fasttrack {
        let marked = build_marked_grids(config, &layout)?;
        if options.formants {
            run_formants(config, runner, &layout, &marked, options.overwrite)?;
        }
        if options.fasttrack {
            stage_fasttrack(&layout, &marked, options.overwrite)?;
        }
    }
    Ok(())
}

/// Copy the concatenated selection into a forced-alignment corpus, with
/// token labels reduced to the bare word the aligner's dictionary knows.
fn prepare_alignment(layout: &SpeakerLayout, overwrite: bool) -> Result<()> {
    let concat_in = layout.concatenated();
    let corpus = layout.aligned_original_corpus();
    prepare_output_dirs(
        &[corpus.clone(), layout.aligned_mfa(), layout.aligned_corpus()],
        overwrite,
    )?;

    for grid_path in list_files_with_ext(&concat_in, "TextGrid")? {
        let mut grid = TextGrid::read(&grid_path)?;
        strip_to_words(&mut grid)?;
        grid.save(corpus.join(grid_path.file_name().unwrap_or_default()))?;
    }
    for wav in list_files_with_ext(&concat_in, "wav")? {
        std::fs::copy(&wav, corpus.join(wav.file_name().unwrap_or_default()))?;
    }

    println!(
        "Alignment corpus ready in {}. Run the forced aligner and place its \
         output grids in {}.",
        corpus.display(),
        layout.aligned_corpus().display()
    );
    Ok(())
}

/// Rewrite every token-stem label on tier 1 to its bare word.
fn strip_to_words(grid: &mut TextGrid) -> Result<()> {
    let tier = grid.interval_tier_mut(1)?;
    for interval in &mut tier.intervals {
        let label = interval.text.trim();
        if label.is_empty() {
            continue;
        }
        match SelectedToken::parse(label) {
            Ok(token) => interval.text = token.word,
            Err(e) => log::warn!("Leaving unparsable label '{label}' in place: {e}"),
        }
    }
    Ok(())
}

fn run_prosody(
    config: &Config,
    runner: &PraatRunner,
    layout: &SpeakerLayout,
    overwrite: bool,
) -> Result<()> {
    let corpus = layout.aligned_original_corpus();
    if !corpus.exists() || list_files_with_ext(&corpus, "TextGrid")?.is_empty() {
        return Err(NormkitError::pipeline(
            "No alignment corpus found. Run --alignment first.",
        ));
    }

    let workdir = layout.profiled_word_level();
    prepare_output_dirs(&[workdir.clone()], overwrite)?;
    for grid in list_files_with_ext(&corpus, "TextGrid")? {
        std::fs::copy(&grid, workdir.join(grid.file_name().unwrap_or_default()))?;
    }
    let wavs = copy_wavs_into(&layout.concatenated(), &workdir)?;

    let outcome = run_staged_batch(runner, &config.project.script_dir, PROSODY_PRO, &workdir, |mode| {
        prosody_args(mode, &config.analysis)
    });
    remove_files(&wavs);
    outcome?;

    println!("Prosodic profiles written to {}.", workdir.display());
    Ok(())
}

/// Merge each aligned grid with its concatenated-selection grid and mark
/// every token's target phone on a fresh `targets` tier.
fn build_marked_grids(
    config: &Config,
    layout: &SpeakerLayout,
) -> Result<Vec<(String, TextGrid)>> {
    let aligned_dir = layout.aligned_corpus();
    let aligned = if aligned_dir.exists() {
        list_files_with_ext(&aligned_dir, "TextGrid")?
    } else {
        Vec::new()
    };
    if aligned.is_empty() {
        return Err(NormkitError::pipeline(
            "No aligned TextGrid found. Run the forced aligner before --formants or --fasttrack.",
        ));
    }

    let mut marked = Vec::with_capacity(aligned.len());
    for aligned_path in aligned {
        let name = aligned_path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let concat_path = layout.concatenated().join(&name);
        let concat_grid = TextGrid::read(&concat_path)?;
        let aligned_grid = TextGrid::read(&aligned_path)?;

        let mut grid = TextGrid::merge(&[&concat_grid, &aligned_grid])?;
        grid.insert_interval_tier(1, "targets");
        let n = mark_targets(&mut grid, &config.analysis.target_phones)?;
        log::info!("{name}: marked {n} target phone(s)");
        marked.push((name, grid));
    }
    Ok(marked)
}

/// Tier layout after merging: 1 targets, 2 tokens, then the aligner's word
/// and phone tiers, with phones on tier 4.
const TOKEN_TIER: usize = 2;
const PHONE_TIER: usize = 4;

fn mark_targets(grid: &mut TextGrid, target_phones: &BTreeMap<String, String>) -> Result<usize> {
    let phones = grid.interval_tier(PHONE_TIER)?.intervals.clone();
    let mut marked = 0usize;

    for phone in phones {
        let label = phone.text.trim().to_string();
        if label.is_empty() {
            continue;
        }
        let midpoint = (phone.xmin + phone.xmax) / 2.0;
        let token_label = grid.label_at(TOKEN_TIER, midpoint)?.trim().to_string();
        let Ok(token) = SelectedToken::parse(&token_label) else {
            continue;
        };
        let Some(target) = target_phones.get(&token.variable_n.to_string()) else {
            continue;
        };
        if label != *target {
            continue;
        }

        let targets = grid.interval_tier_mut(1)?;
        // Boundaries may coincide with existing ones at tier edges
        let _ = targets.insert_boundary(phone.xmin);
        let _ = targets.insert_boundary(phone.xmax);
        if let Some(idx) = targets.interval_at(midpoint) {
            targets.intervals[idx].text = label;
            marked += 1;
        }
    }

    Ok(marked)
}

fn run_formants(
    config: &Config,
    runner: &PraatRunner,
    layout: &SpeakerLayout,
    marked: &[(String, TextGrid)],
    overwrite: bool,
) -> Result<()> {
    let workdir = layout.profiled_phone_level();
    prepare_output_dirs(&[workdir.clone()], overwrite)?;
    for (name, grid) in marked {
        grid.save(workdir.join(name))?;
    }
    let wavs = copy_wavs_into(&layout.concatenated(), &workdir)?;

    let outcome = run_staged_batch(runner, &config.project.script_dir, FORMANT_PRO, &workdir, |mode| {
        formant_args(mode, &config.analysis)
    });
    remove_files(&wavs);
    outcome?;

    println!("Formant profiles written to {}.", workdir.display());
    Ok(())
}

fn stage_fasttrack(
    layout: &SpeakerLayout,
    marked: &[(String, TextGrid)],
    overwrite: bool,
) -> Result<()> {
    let workdir = layout.profiled_phone_level_ft();
    prepare_output_dirs(&[workdir.clone()], overwrite)?;
    for (name, grid) in marked {
        grid.save(workdir.join(name))?;
    }
    copy_wavs_into(&layout.concatenated(), &workdir)?;

    println!(
        "FastTrack inputs staged in {}. In Praat, run FastTrack's \
         'Extract vowels with TextGrid' over this folder using the \
         'targets' tier.",
        layout::absolute(&workdir).display()
    );
    Ok(())
}

fn copy_wavs_into(from: &Path, to: &Path) -> Result<Vec<std::path::PathBuf>> {
    let mut copied = Vec::new();
    for wav in list_files_with_ext(from, "wav")? {
        let dest = to.join(wav.file_name().unwrap_or_default());
        std::fs::copy(&wav, &dest)?;
        copied.push(dest);
    }
    Ok(copied)
}

fn remove_files(paths: &[std::path::PathBuf]) {
    for path in paths {
        let _ = std::fs::remove_file(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::textgrid::{Interval, IntervalTier, Tier};

    fn tier(name: &str, spec: &[(f64, f64, &str)]) -> Tier {
        Tier::Interval(IntervalTier {
            name: name.to_string(),
            intervals: spec
                .iter()
                .map(|&(xmin, xmax, text)| Interval {
                    xmin,
                    xmax,
                    text: text.to_string(),
                })
                .collect(),
        })
    }

    #[test]
    fn test_strip_to_words() {
        let mut grid = TextGrid {
            xmin: 0.0,
            xmax: 1.0,
            tiers: vec![tier(
                "tokens",
                &[
                    (0.0, 0.5, "S1_3-5-1_thing_M"),
                    (0.5, 0.8, "S1_3-6-3_bath_N"),
                    (0.8, 1.0, ""),
                ],
            )],
        };
        strip_to_words(&mut grid).unwrap();
        let tokens = grid.interval_tier(1).unwrap();
        assert_eq!(tokens.intervals[0].text, "thing");
        assert_eq!(tokens.intervals[1].text, "bath");
        assert_eq!(tokens.intervals[2].text, "");
    }

    #[test]
    fn test_mark_targets() {
        // Merged layout minus the targets tier, which the test inserts
        // the same way build_marked_grids does.
        let mut grid = TextGrid {
            xmin: 0.0,
            xmax: 1.0,
            tiers: vec![
                tier("tokens", &[(0.0, 0.6, "S1_3-5-1_thing_M"), (0.6, 1.0, "")]),
                tier("words", &[(0.0, 0.6, "thing"), (0.6, 1.0, "")]),
                tier(
                    "phones",
                    &[
                        (0.0, 0.2, "DH"),
                        (0.2, 0.4, "IH1"),
                        (0.4, 0.6, "NG"),
                        (0.6, 1.0, ""),
                    ],
                ),
            ],
        };
        grid.insert_interval_tier(1, "targets");

        let mut phones = BTreeMap::new();
        phones.insert("3".to_string(), "DH".to_string());
        let marked = mark_targets(&mut grid, &phones).unwrap();
        assert_eq!(marked, 1);

        let targets = grid.interval_tier(1).unwrap();
        // DH spans 0.0..0.2; only one boundary needed at 0.2
        assert_eq!(targets.intervals.len(), 2);
        assert_eq!(targets.intervals[0].text, "DH");
        assert!((targets.intervals[0].xmax - 0.2).abs() < 1e-9);
        assert_eq!(targets.intervals[1].text, "");
    }

    #[test]
    fn test_mark_targets_skips_other_phones() {
        let mut grid = TextGrid {
            xmin: 0.0,
            xmax: 1.0,
            tiers: vec![
                tier("tokens", &[(0.0, 1.0, "S1_5-2-1_goose_M")]),
                tier("words", &[(0.0, 1.0, "goose")]),
                tier("phones", &[(0.0, 0.5, "G"), (0.5, 1.0, "UW1")]),
            ],
        };
        grid.insert_interval_tier(1, "targets");

        let mut phones = BTreeMap::new();
        phones.insert("5".to_string(), "UW1".to_string());
        let marked = mark_targets(&mut grid, &phones).unwrap();
        assert_eq!(marked, 1);

        let targets = grid.interval_tier(1).unwrap();
        assert_eq!(targets.intervals.len(), 2);
        assert_eq!(targets.intervals[0].text, "");
        assert_eq!(targets.intervals[1].text, "UW1");
    }
}
