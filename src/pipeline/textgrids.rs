//! Bootstrap annotation TextGrids
//!
//! For each recording, Praat's silence detection produces a first tier of
//! sounding/silent intervals. On top of that, empty `row` and `variable`
//! tiers are cut into evenly spaced stretches matching the word-list
//! structure and pre-labelled from the word-list CSVs, plus an empty
//! `notes` point tier. The researcher then only has to drag boundaries
//! instead of typing labels.

use crate::config::Config;
use crate::error::{NormkitError, Result};
use crate::metadata::{read_word_rows, WordRow};
use crate::pipeline::layout::{list_files_with_ext, SpeakerLayout};
use crate::praat::scripts::silence_textgrid;
use crate::praat::PraatRunner;
use crate::textgrid::TextGrid;
use std::path::PathBuf;

const WORDROWS_FILE: &str = "recordings_wordrows.csv";
const SUPP_WORDROWS_FILE: &str = "recordings_suppwordrows.csv";

/// Which part of the word list a recording covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordListScope {
    /// Every variable in the main list.
    All,
    /// A single variable from the main list.
    Variable(u32),
    /// The supplementary list.
    Supplementary,
    /// Silence detection only, no label tiers.
    None,
}

impl WordListScope {
    /// CLI numbering: omitted means all, `0` means none, `9` means the
    /// supplementary list, anything else names a variable.
    pub fn from_number(number: Option<u32>) -> Self {
        match number {
            None => WordListScope::All,
            Some(0) => WordListScope::None,
            Some(9) => WordListScope::Supplementary,
            Some(n) => WordListScope::Variable(n),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextgridsOptions {
    pub speaker: String,
    /// Restrict to a single recording stem instead of every WAV.
    pub file: Option<String>,
    pub scope: WordListScope,
    /// Read from `1_original` instead of `2_processed`.
    pub use_original: bool,
}

/// Labels to prefill, one interval per entry, in recording order.
#[derive(Debug, Clone, Default)]
pub struct WordLabels {
    pub variables: Vec<String>,
    pub words: Vec<String>,
    /// Word intervals cut per variable interval.
    pub words_per_variable: usize,
}

impl WordLabels {
    pub fn from_rows(rows: &[WordRow], words_per_variable: usize) -> Self {
        let mut variables = Vec::new();
        for row in rows {
            if variables.last() != Some(&row.variable_name) {
                variables.push(row.variable_name.clone());
            }
        }
        WordLabels {
            variables,
            words: rows.iter().map(|r| r.word_code.clone()).collect(),
            words_per_variable,
        }
    }
}

pub fn run(config: &Config, runner: &PraatRunner, options: &TextgridsOptions) -> Result<()> {
    let layout = SpeakerLayout::new(&config.project.recordings_root, &options.speaker);
    let audio_in = if options.use_original {
        layout.original_audio()
    } else {
        layout.processed_audio()
    };
    let grid_out = layout.original_textgrid();
    std::fs::create_dir_all(&grid_out)?;

    let wavs: Vec<PathBuf> = match &options.file {
        Some(name) => {
            let path = audio_in.join(format!("{}.wav", bare_stem(name)));
            if path.exists() {
                vec![path]
            } else {
                Vec::new()
            }
        }
        None => list_files_with_ext(&audio_in, "wav")?,
    };
    if wavs.is_empty() {
        println!("No audio file found in {}.", audio_in.display());
        return Ok(());
    }

    let labels = load_labels(config, options.scope)?;

    for wav in &wavs {
        let stem = wav
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let grid_path = grid_out.join(format!("{stem}.TextGrid"));

        log::info!("Detecting silences in {stem}");
        silence_textgrid(runner, wav, &grid_path, &config.analysis)?;

        let mut grid = TextGrid::read(&grid_path)?;
        annotate_grid(&mut grid, &labels)?;
        grid.save(&grid_path)?;
        println!("Wrote {}", grid_path.display());
    }

    Ok(())
}

/// The recording stem with a trailing `.wav` or `.TextGrid` removed, so
/// `--file` accepts either a stem or a file name.
fn bare_stem(name: &str) -> &str {
    name.strip_suffix(".wav")
        .or_else(|| name.strip_suffix(".TextGrid"))
        .unwrap_or(name)
}

fn load_labels(config: &Config, scope: WordListScope) -> Result<WordLabels> {
    let script_dir = &config.project.script_dir;
    match scope {
        WordListScope::None => Ok(WordLabels::default()),
        WordListScope::Supplementary => {
            let rows = read_word_rows(script_dir.join(SUPP_WORDROWS_FILE))?;
            Ok(WordLabels::from_rows(&rows, 14))
        }
        WordListScope::All => {
            let rows = read_word_rows(script_dir.join(WORDROWS_FILE))?;
            Ok(WordLabels::from_rows(&rows, 10))
        }
        WordListScope::Variable(n) => {
            let rows: Vec<WordRow> = read_word_rows(script_dir.join(WORDROWS_FILE))?
                .into_iter()
                .filter(|r| r.variable_num == Some(n))
                .collect();
            if rows.is_empty() {
                return Err(NormkitError::metadata(format!(
                    "No word-list rows for variable {n}"
                )));
            }
            Ok(WordLabels::from_rows(&rows, 10))
        }
    }
}

/// Add `row`, `variable`, and `notes` tiers over a silence grid and cut
/// them into evenly spaced, pre-labelled stretches.
pub fn annotate_grid(grid: &mut TextGrid, labels: &WordLabels) -> Result<()> {
    grid.insert_interval_tier(2, "row");
    grid.insert_interval_tier(3, "variable");
    grid.insert_point_tier(4, "notes");

    let n_variables = labels.variables.len();
    if n_variables == 0 {
        return Ok(());
    }

    let duration = grid.duration();
    let variable_span = duration / n_variables as f64;
    let word_span = variable_span / labels.words_per_variable as f64;

    {
        let variable_tier = grid.interval_tier_mut(3)?;
        for i in 1..n_variables {
            variable_tier.insert_boundary(variable_span * i as f64)?;
        }
        for (i, label) in labels.variables.iter().enumerate() {
            variable_tier.intervals[i].text = label.clone();
        }
    }

    let row_tier = grid.interval_tier_mut(2)?;
    let n_words = n_variables * labels.words_per_variable;
    for i in 1..n_words {
        row_tier.insert_boundary(word_span * i as f64)?;
    }
    for (i, word) in labels.words.iter().take(n_words).enumerate() {
        row_tier.intervals[i].text = word.clone();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::WordRow;
    use crate::textgrid::{Interval, IntervalTier, Tier};

    fn silence_grid(duration: f64) -> TextGrid {
        TextGrid {
            xmin: 0.0,
            xmax: duration,
            tiers: vec![Tier::Interval(IntervalTier {
                name: "silences".to_string(),
                intervals: vec![Interval {
                    xmin: 0.0,
                    xmax: duration,
                    text: String::new(),
                }],
            })],
        }
    }

    fn rows(spec: &[(&str, &str)]) -> Vec<WordRow> {
        spec.iter()
            .map(|(var, word)| WordRow {
                variable_num: None,
                variable_name: var.to_string(),
                word_code: word.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_word_labels_from_rows() {
        let rows = rows(&[
            ("DRESS", "bed-bad"),
            ("DRESS", "pen-pin"),
            ("TH", "thing-ting"),
        ]);
        let labels = WordLabels::from_rows(&rows, 2);
        assert_eq!(labels.variables, vec!["DRESS", "TH"]);
        assert_eq!(labels.words.len(), 3);
        assert_eq!(labels.words_per_variable, 2);
    }

    #[test]
    fn test_bare_stem() {
        assert_eq!(bare_stem("S1-2"), "S1-2");
        assert_eq!(bare_stem("S1-2.wav"), "S1-2");
        assert_eq!(bare_stem("S1-2.TextGrid"), "S1-2");
    }

    #[test]
    fn test_scope_from_number() {
        assert_eq!(WordListScope::from_number(None), WordListScope::All);
        assert_eq!(WordListScope::from_number(Some(0)), WordListScope::None);
        assert_eq!(
            WordListScope::from_number(Some(9)),
            WordListScope::Supplementary
        );
        assert_eq!(
            WordListScope::from_number(Some(4)),
            WordListScope::Variable(4)
        );
    }

    #[test]
    fn test_annotate_grid_cuts_even_stretches() {
        let mut grid = silence_grid(8.0);
        let rows = rows(&[
            ("DRESS", "bed-bad"),
            ("DRESS", "pen-pin"),
            ("TH", "thing-ting"),
            ("TH", "bath-bat"),
        ]);
        let labels = WordLabels::from_rows(&rows, 2);
        annotate_grid(&mut grid, &labels).unwrap();

        assert_eq!(grid.tiers.len(), 4);
        assert_eq!(grid.tiers[1].name(), "row");
        assert_eq!(grid.tiers[2].name(), "variable");
        assert_eq!(grid.tiers[3].name(), "notes");

        let variable = grid.interval_tier(3).unwrap();
        assert_eq!(variable.intervals.len(), 2);
        assert!((variable.intervals[0].xmax - 4.0).abs() < 1e-9);
        assert_eq!(variable.intervals[0].text, "DRESS");
        assert_eq!(variable.intervals[1].text, "TH");

        let row = grid.interval_tier(2).unwrap();
        assert_eq!(row.intervals.len(), 4);
        assert!((row.intervals[1].xmin - 2.0).abs() < 1e-9);
        assert_eq!(row.intervals[3].text, "bath-bat");
    }

    #[test]
    fn test_annotate_grid_without_labels() {
        let mut grid = silence_grid(5.0);
        annotate_grid(&mut grid, &WordLabels::default()).unwrap();
        assert_eq!(grid.tiers.len(), 4);
        assert_eq!(grid.interval_tier(2).unwrap().intervals.len(), 1);
    }
}
