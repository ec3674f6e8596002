//! Project directory layout
//!
//! Every stage reads and writes a fixed layout under the recordings root,
//! one subdirectory per speaker. Output directories follow one protocol:
//! refuse to run when the primary output already exists, wipe and recreate
//! everything with `--overwrite`.

use crate::error::{NormkitError, Result};
use std::path::{Path, PathBuf};

/// Per-speaker paths.
#[derive(Debug, Clone)]
pub struct SpeakerLayout {
    speaker: String,
    dir: PathBuf,
}

impl SpeakerLayout {
    pub fn new<P: AsRef<Path>>(root: P, speaker: &str) -> Self {
        SpeakerLayout {
            speaker: speaker.to_string(),
            dir: root.as_ref().join(speaker),
        }
    }

    pub fn speaker(&self) -> &str {
        &self.speaker
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn original_audio(&self) -> PathBuf {
        self.dir.join("1_audio").join("1_original")
    }

    pub fn processed_audio(&self) -> PathBuf {
        self.dir.join("1_audio").join("2_processed")
    }

    pub fn extracted_audio(&self) -> PathBuf {
        self.dir.join("1_audio").join("3_extracted")
    }

    pub fn original_textgrid(&self) -> PathBuf {
        self.dir.join("2_textgrid").join("1_original")
    }

    pub fn manual_textgrid(&self) -> PathBuf {
        self.dir.join("2_textgrid").join("2_manual")
    }

    pub fn extracted_textgrid(&self) -> PathBuf {
        self.dir.join("2_textgrid").join("3_extracted")
    }

    fn selections(&self) -> PathBuf {
        self.dir.join("3_selections").join("1_P1")
    }

    pub fn selected_audio(&self) -> PathBuf {
        self.selections().join("1_audio")
    }

    pub fn selected_textgrid(&self) -> PathBuf {
        self.selections().join("2_textgrid")
    }

    pub fn concatenated(&self) -> PathBuf {
        self.selections().join("3_concatenated")
    }

    pub fn aligned_original_corpus(&self) -> PathBuf {
        self.selections().join("4_aligned").join("original_corpus")
    }

    pub fn aligned_mfa(&self) -> PathBuf {
        self.selections().join("4_aligned").join("mfa_aligner")
    }

    pub fn aligned_corpus(&self) -> PathBuf {
        self.selections().join("4_aligned").join("aligned_corpus")
    }

    pub fn profiled_word_level(&self) -> PathBuf {
        self.selections().join("5_profiled").join("word_level")
    }

    pub fn profiled_phone_level(&self) -> PathBuf {
        self.selections().join("5_profiled").join("phone_level")
    }

    pub fn profiled_phone_level_ft(&self) -> PathBuf {
        self.selections().join("5_profiled").join("phone_level_ft")
    }

    pub fn subsetted(&self) -> PathBuf {
        self.selections().join("6_subsetted")
    }

    pub fn norming_audio(&self) -> PathBuf {
        self.dir.join("3_selections").join("0_N2").join("1_audio")
    }

    pub fn norming_concatenated(&self) -> PathBuf {
        self.dir
            .join("3_selections")
            .join("0_N2")
            .join("2_concatenated")
    }
}

/// Cross-speaker aggregate paths under the recordings root.
#[derive(Debug, Clone)]
pub struct AggregateLayout {
    dir: PathBuf,
}

impl AggregateLayout {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        AggregateLayout {
            dir: root.as_ref().join("1_aggregate"),
        }
    }

    pub fn ratings_temp(&self) -> PathBuf {
        self.dir.join("1_ratings").join("temp")
    }

    pub fn ratings_manual(&self) -> PathBuf {
        self.dir.join("1_ratings").join("1_manual")
    }

    pub fn norming_temp(&self) -> PathBuf {
        self.dir.join("1_norming").join("temp")
    }
}

/// Apply the shared output-directory protocol.
///
/// The first path is the stage's primary output and gates the decision;
/// all listed paths are wiped and recreated together.
pub fn prepare_output_dirs(dirs: &[PathBuf], overwrite: bool) -> Result<()> {
    let primary = dirs
        .first()
        .ok_or_else(|| NormkitError::config("No output directories given"))?;

    if primary.exists() {
        if !overwrite {
            return Err(NormkitError::OutputExists(primary.clone()));
        }
        for dir in dirs {
            if dir.exists() {
                std::fs::remove_dir_all(dir)?;
            }
        }
    }

    for dir in dirs {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// Speakers with an extracted-audio directory, sorted.
pub fn discover_speakers<P: AsRef<Path>>(root: P) -> Result<Vec<String>> {
    let root = root.as_ref();
    let mut speakers = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('S')
            && entry.path().is_dir()
            && SpeakerLayout::new(root, &name).extracted_audio().exists()
        {
            speakers.push(name);
        }
    }
    speakers.sort();
    Ok(speakers)
}

/// Speakers that already have a token info log, with its path, sorted.
///
/// The info file lives at
/// `{speaker}/3_selections/1_P1/3_concatenated/{speaker}_selected_tokens_info.csv`.
pub fn discover_token_infos<P: AsRef<Path>>(root: P) -> Result<Vec<(String, PathBuf)>> {
    let mut found = Vec::new();
    walk_for_infos(root.as_ref(), &mut found)?;
    found.sort();
    Ok(found)
}

fn walk_for_infos(dir: &Path, found: &mut Vec<(String, PathBuf)>) -> Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            walk_for_infos(&path, found)?;
        } else if path
            .file_name()
            .map(|n| n.to_string_lossy().ends_with("selected_tokens_info.csv"))
            .unwrap_or(false)
        {
            // Speaker dir sits four levels above the info file
            let speaker = path
                .ancestors()
                .nth(4)
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned());
            if let Some(speaker) = speaker {
                found.push((speaker, path));
            }
        }
    }
    Ok(())
}

/// Absolute form of a path for messages handed to the researcher.
///
/// Falls back to prefixing the current directory when the path does not
/// exist yet.
pub fn absolute(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    })
}

/// Files in a directory with the given extension, sorted by name.
pub fn list_files_with_ext(dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().map(|e| e == ext).unwrap_or(false) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Immediate subdirectories, sorted by name.
pub fn list_subdirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_speaker_paths() {
        let layout = SpeakerLayout::new("/data/recordings", "S3");
        assert_eq!(
            layout.processed_audio(),
            PathBuf::from("/data/recordings/S3/1_audio/2_processed")
        );
        assert_eq!(
            layout.aligned_corpus(),
            PathBuf::from("/data/recordings/S3/3_selections/1_P1/4_aligned/aligned_corpus")
        );
        assert_eq!(
            layout.norming_audio(),
            PathBuf::from("/data/recordings/S3/3_selections/0_N2/1_audio")
        );
    }

    #[test]
    fn test_prepare_output_dirs_protocol() {
        let root = TempDir::new().unwrap();
        let a = root.path().join("out_a");
        let b = root.path().join("out_b");
        let dirs = vec![a.clone(), b.clone()];

        prepare_output_dirs(&dirs, false).unwrap();
        assert!(a.is_dir() && b.is_dir());

        std::fs::write(a.join("stale.wav"), b"x").unwrap();
        let err = prepare_output_dirs(&dirs, false).unwrap_err();
        assert!(matches!(err, NormkitError::OutputExists(_)));
        assert!(a.join("stale.wav").exists());

        prepare_output_dirs(&dirs, true).unwrap();
        assert!(a.is_dir() && !a.join("stale.wav").exists());
    }

    #[test]
    fn test_discover_speakers() {
        let root = TempDir::new().unwrap();
        for speaker in ["S2", "S1", "S9"] {
            let layout = SpeakerLayout::new(root.path(), speaker);
            std::fs::create_dir_all(layout.extracted_audio()).unwrap();
        }
        // No extracted audio: ignored
        std::fs::create_dir_all(root.path().join("S5")).unwrap();
        // Not a speaker dir
        std::fs::create_dir_all(root.path().join("1_aggregate")).unwrap();

        let speakers = discover_speakers(root.path()).unwrap();
        assert_eq!(speakers, vec!["S1", "S2", "S9"]);
    }

    #[test]
    fn test_discover_token_infos() {
        let root = TempDir::new().unwrap();
        let layout = SpeakerLayout::new(root.path(), "S4");
        std::fs::create_dir_all(layout.concatenated()).unwrap();
        let info = layout.concatenated().join("S4_selected_tokens_info.csv");
        std::fs::write(&info, "filename\n").unwrap();

        let infos = discover_token_infos(root.path()).unwrap();
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].0, "S4");
        assert_eq!(infos[0].1, info);
    }

    #[test]
    fn test_absolute_resolves_relative_paths() {
        let root = TempDir::new().unwrap();
        let existing = root.path().join("out");
        std::fs::create_dir(&existing).unwrap();
        assert!(absolute(&existing).is_absolute());

        let relative = Path::new("some/future/dir");
        let resolved = absolute(relative);
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("some/future/dir"));
    }

    #[test]
    fn test_list_helpers() {
        let root = TempDir::new().unwrap();
        std::fs::write(root.path().join("b.wav"), b"").unwrap();
        std::fs::write(root.path().join("a.wav"), b"").unwrap();
        std::fs::write(root.path().join("c.TextGrid"), b"").unwrap();
        std::fs::create_dir(root.path().join("sub")).unwrap();

        let wavs = list_files_with_ext(root.path(), "wav").unwrap();
        assert_eq!(wavs.len(), 2);
        assert!(wavs[0].ends_with("a.wav"));

        let grids = list_files_with_ext(root.path(), "TextGrid").unwrap();
        assert_eq!(grids.len(), 1);

        let subs = list_subdirs(root.path()).unwrap();
        assert_eq!(subs.len(), 1);
    }
}
