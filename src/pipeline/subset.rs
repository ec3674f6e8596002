//! Norming and rating subsets of the selected tokens
//!
//! Two kinds of subset come out of the selected-token pool. The random
//! norming subset draws three mainstream items per vowel variable (5-8),
//! restricted to words every speaker attests, pads each token with silence,
//! and concatenates them in one shared random order; the draw is seeded so
//! every speaker gets the same items, and the drawn list is written next to
//! the scripts for reuse. The per-variable rating subsets copy a variable's
//! tokens into a `sounds_in` folder together with a patched copy of the
//! researcher's rating script.

use crate::audio::{ops, Sound};
use crate::config::Config;
use crate::error::{NormkitError, Result};
use crate::metadata::{
    read_random_items, read_token_records, write_random_items, RandomItem, TokenRecord,
};
use crate::pipeline::layout::{
    discover_token_infos, prepare_output_dirs, AggregateLayout, SpeakerLayout,
};
use crate::praat::scripts::{render_rating_script, RATING_SCRIPT};
use crate::textgrid::TextGrid;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const RANDOM_ITEMS_FILE: &str = "N2_random_items.csv";

/// Variables the norming subset draws from, and how many items each.
const NORMING_VARIABLES: std::ops::RangeInclusive<u32> = 5..=8;
const ITEMS_PER_VARIABLE: usize = 3;

#[derive(Debug, Clone)]
pub struct SubsetOptions {
    /// Speakers to process; empty means every speaker with an info log.
    pub speakers: Vec<String>,
    /// Seed for the shared random draw.
    pub seed: u64,
    /// Variables to build rating subsets for.
    pub variables: Vec<u32>,
    /// Collect outputs in the cross-speaker aggregate folders.
    pub aggregate: bool,
    pub overwrite: bool,
}

pub fn run(config: &Config, options: &SubsetOptions) -> Result<()> {
    let root = &config.project.recordings_root;
    let infos = discover_token_infos(root)?;
    if infos.is_empty() {
        return Err(NormkitError::pipeline(
            "No selected-token info log found. Run the select stage first.",
        ));
    }

    let selected: Vec<&(String, PathBuf)> = if options.speakers.is_empty() {
        infos.iter().collect()
    } else {
        let chosen: Vec<&(String, PathBuf)> = infos
            .iter()
            .filter(|(speaker, _)| options.speakers.contains(speaker))
            .collect();
        for wanted in &options.speakers {
            if !chosen.iter().any(|(speaker, _)| speaker == wanted) {
                return Err(NormkitError::pipeline(format!(
                    "No selected-token info log for speaker {wanted}"
                )));
            }
        }
        chosen
    };

    let aggregate = AggregateLayout::new(root);
    let (norming_agg, ratings_agg) = if options.aggregate {
        if options.variables.is_empty() {
            prepare_output_dirs(&[aggregate.norming_temp()], options.overwrite)?;
            (Some(aggregate.norming_temp()), None)
        } else {
            prepare_output_dirs(&[aggregate.ratings_temp()], options.overwrite)?;
            std::fs::create_dir_all(aggregate.ratings_manual())?;
            (None, Some(aggregate.ratings_temp()))
        }
    } else {
        (None, None)
    };

    let items = load_or_draw_items(config, &infos, options.seed)?;

    for (speaker, info_path) in selected {
        let layout = SpeakerLayout::new(root, speaker);
        let records = read_token_records(info_path)?;

        subset_random(
            config,
            &layout,
            &records,
            &items,
            norming_agg.as_deref(),
            options.overwrite,
        )?;

        if !options.variables.is_empty() {
            let base_out = match &ratings_agg {
                Some(dir) => dir.clone(),
                None => {
                    prepare_output_dirs(&[layout.subsetted()], options.overwrite)?;
                    layout.subsetted()
                }
            };
            for &variable_n in &options.variables {
                subset_variable(config, &layout, &records, variable_n, &base_out)?;
            }
        }
    }

    Ok(())
}

/// Reuse the saved random item list or draw a fresh one from every
/// speaker's info log.
fn load_or_draw_items(
    config: &Config,
    infos: &[(String, PathBuf)],
    seed: u64,
) -> Result<Vec<RandomItem>> {
    let path = config.project.script_dir.join(RANDOM_ITEMS_FILE);
    if path.exists() {
        let items = read_random_items(&path)?;
        log::info!(
            "Reusing {} random item(s) from {} (random_state {})",
            items.len(),
            path.display(),
            items.first().map(|i| i.random_state).unwrap_or(seed)
        );
        return Ok(items);
    }

    let mut all = Vec::new();
    for (_, info_path) in infos {
        all.extend(read_token_records(info_path)?);
    }
    let items = draw_random_items(&all, infos.len(), seed)?;
    write_random_items(&path, &items)?;
    println!("Drew {} random item(s), saved to {}.", items.len(), path.display());
    Ok(items)
}

/// Draw the shared norming items: mainstream tokens of variables 5-8 whose
/// word every speaker attests, three per variable, in one shuffled order.
pub fn draw_random_items(
    records: &[TokenRecord],
    n_speakers: usize,
    seed: u64,
) -> Result<Vec<RandomItem>> {
    let eligible: Vec<&TokenRecord> = records
        .iter()
        .filter(|r| r.variant_n == 1 && NORMING_VARIABLES.contains(&r.variable_n))
        .collect();

    let mut word_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in &eligible {
        *word_counts.entry(record.word.as_str()).or_insert(0) += 1;
    }

    // Items keyed by code so multi-speaker duplicates collapse
    let mut candidates: BTreeMap<String, RandomItem> = BTreeMap::new();
    for record in &eligible {
        if word_counts.get(record.word.as_str()) != Some(&n_speakers) {
            continue;
        }
        candidates
            .entry(record.item_code.clone())
            .or_insert_with(|| RandomItem {
                item_code: record.item_code.clone(),
                variable_n: record.variable_n,
                row_n: record.row_n,
                variant_n: record.variant_n,
                word: record.word.clone(),
                random_state: seed,
            });
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut drawn = Vec::with_capacity(ITEMS_PER_VARIABLE * 4);
    for variable_n in NORMING_VARIABLES {
        let pool: Vec<&RandomItem> = candidates
            .values()
            .filter(|i| i.variable_n == variable_n)
            .collect();
        if pool.len() < ITEMS_PER_VARIABLE {
            return Err(NormkitError::pipeline(format!(
                "Only {} candidate item(s) for variable {variable_n}, need {}",
                pool.len(),
                ITEMS_PER_VARIABLE
            )));
        }
        drawn.extend(
            pool.choose_multiple(&mut rng, ITEMS_PER_VARIABLE)
                .map(|item| (*item).clone()),
        );
    }
    drawn.shuffle(&mut rng);
    Ok(drawn)
}

/// Pad and copy this speaker's drawn tokens, then concatenate them in the
/// shared random order.
fn subset_random(
    config: &Config,
    layout: &SpeakerLayout,
    records: &[TokenRecord],
    items: &[RandomItem],
    aggregate_out: Option<&Path>,
    overwrite: bool,
) -> Result<()> {
    let audio_in = layout.selected_audio();
    let audio_out = layout.norming_audio();
    let concat_out = layout.norming_concatenated();
    prepare_output_dirs(&[audio_out.clone(), concat_out.clone()], overwrite)?;

    let mut padded = Vec::new();
    let mut pieces = Vec::new();
    for item in items {
        let Some(record) = records.iter().find(|r| r.item_code == item.item_code) else {
            log::warn!(
                "{}: item {} not in the selection, skipping",
                layout.speaker(),
                item.item_code
            );
            continue;
        };

        let sound = Sound::from_file(audio_in.join(format!("{}.wav", record.filename)))?;
        let sound = ops::pad_with_silence(&sound, config.normalize.padding)?;
        sound.save(audio_out.join(format!("{}.wav", record.filename)))?;
        pieces.push((record.filename.clone(), sound.duration()));
        padded.push(sound);
    }
    if padded.is_empty() {
        log::warn!("{}: no norming token found", layout.speaker());
        return Ok(());
    }

    let speaker = layout.speaker();
    let joined = ops::concatenate(&padded)?;
    let concat_wav = concat_out.join(format!("{speaker}_random_tokens.wav"));
    joined.save(&concat_wav)?;
    TextGrid::recovered("tokens", &pieces)
        .save(concat_out.join(format!("{speaker}_random_tokens.TextGrid")))?;

    if let Some(aggregate) = aggregate_out {
        std::fs::copy(
            &concat_wav,
            aggregate.join(format!("{speaker}_random_tokens.wav")),
        )?;
    }

    println!("{speaker}: norming subset of {} token(s).", pieces.len());
    Ok(())
}

/// Copy one variable's tokens into a rating folder with a patched copy of
/// the rating script.
fn subset_variable(
    config: &Config,
    layout: &SpeakerLayout,
    records: &[TokenRecord],
    variable_n: u32,
    base_out: &Path,
) -> Result<()> {
    let v_dir = base_out.join(format!("v{variable_n}"));
    let sounds_in = v_dir.join("sounds_in");
    std::fs::create_dir_all(&sounds_in)?;
    std::fs::create_dir_all(v_dir.join("sounds_out"))?;

    let script_src = config.project.script_dir.join(RATING_SCRIPT);
    let script = std::fs::read_to_string(&script_src).map_err(|e| {
        NormkitError::pipeline(format!(
            "Cannot read rating script {}: {e}",
            script_src.display()
        ))
    })?;
    std::fs::write(
        v_dir.join(RATING_SCRIPT),
        render_rating_script(&script, variable_n),
    )?;

    let mut copied = 0usize;
    for record in records.iter().filter(|r| r.variable_n == variable_n) {
        let name = format!("{}.wav", record.filename);
        std::fs::copy(layout.selected_audio().join(&name), sounds_in.join(&name))?;
        copied += 1;
    }
    println!(
        "{}: rating subset v{variable_n} with {copied} token(s) in {}.",
        layout.speaker(),
        v_dir.display()
    );
    Ok(())
}
