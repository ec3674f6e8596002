//! Configuration management for the preparation pipeline

use crate::error::{NormkitError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub project: ProjectConfig,
    pub praat: PraatConfig,
    pub analysis: AnalysisConfig,
    pub normalize: NormalizeConfig,
    /// Worker count for multi-speaker stages.
    pub jobs: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Root directory holding one subdirectory per speaker.
    pub recordings_root: PathBuf,
    /// Directory holding the researcher-owned Praat scripts (ProsodyPro,
    /// FormantPro, the rating script) and the word-list CSVs.
    pub script_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PraatConfig {
    /// Praat executable, resolved through PATH when relative.
    pub binary: PathBuf,
}

/// Parameters handed to the external analysis scripts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Silence threshold for TextGrid bootstrap (dB).
    pub silence_threshold_db: f64,
    /// Minimum silent interval (s).
    pub min_silent_interval: f64,
    /// Minimum sounding interval (s).
    pub min_sounding_interval: f64,
    /// F0 floor for ProsodyPro (Hz).
    pub f0_floor: f64,
    /// F0 ceiling for ProsodyPro (Hz).
    pub f0_ceiling: f64,
    /// Number of formants tracked by FormantPro.
    pub n_formants: u32,
    /// Formant ceiling (Hz); 5500 for female voices, 5000 for male.
    pub max_formant: f64,
    /// Normalized measurement times per interval in FormantPro.
    pub samples_per_interval: u32,
    /// Target phone (ARPABET) per variable number, matched against the
    /// forced-aligned phone tier. Keys are variable numbers, kept as
    /// strings because TOML map keys are strings.
    pub target_phones: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Peak amplitude after normalization, in (0, 1].
    pub peak: f32,
    /// Average intensity after normalization (dB SPL).
    pub intensity_db: f64,
    /// Silence padding around subset tokens (s).
    pub padding: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project: ProjectConfig::default(),
            praat: PraatConfig::default(),
            analysis: AnalysisConfig::default(),
            normalize: NormalizeConfig::default(),
            jobs: num_cpus::get(),
        }
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            recordings_root: PathBuf::from("../02-stimuli/P0-norming/n2/03-recordings"),
            script_dir: PathBuf::from("."),
        }
    }
}

impl Default for PraatConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("praat"),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let target_phones = [
            (1, "EH1"),
            (2, "IY1"),
            (3, "DH"),
            (4, "OW1"),
            (5, "UW1"),
            (6, "AE1"),
            (7, "AE1"),
            (8, "T"),
        ]
        .into_iter()
        .map(|(n, p): (u32, &str)| (n.to_string(), p.to_string()))
        .collect();

        Self {
            silence_threshold_db: -50.0,
            min_silent_interval: 0.2,
            min_sounding_interval: 0.3,
            f0_floor: 75.0,
            f0_ceiling: 600.0,
            n_formants: 5,
            max_formant: 5500.0,
            samples_per_interval: 10,
            target_phones,
        }
    }
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            peak: 0.99,
            intensity_db: 70.0,
            padding: 0.25,
        }
    }
}

impl Config {
    /// Load config from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| NormkitError::config(format!("Failed to read config file: {e}")))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| NormkitError::config(format!("Failed to parse config file: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Load config from a file when given, otherwise the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    /// Validate configuration parameter validity.
    pub fn validate(&self) -> Result<()> {
        if self.normalize.peak <= 0.0 || self.normalize.peak > 1.0 {
            return Err(NormkitError::config("Peak target must be in (0.0, 1.0]"));
        }

        if self.normalize.padding < 0.0 {
            return Err(NormkitError::config("Silence padding must be non-negative"));
        }

        if self.analysis.silence_threshold_db >= 0.0 {
            return Err(NormkitError::config("Silence threshold must be negative"));
        }

        if self.analysis.min_silent_interval <= 0.0 || self.analysis.min_sounding_interval <= 0.0 {
            return Err(NormkitError::config(
                "Silent and sounding interval minimums must be positive",
            ));
        }

        if self.analysis.f0_floor <= 0.0 || self.analysis.f0_ceiling <= self.analysis.f0_floor {
            return Err(NormkitError::config("F0 ceiling must exceed the F0 floor"));
        }

        if self.analysis.max_formant <= 0.0 || self.analysis.n_formants == 0 {
            return Err(NormkitError::config("Formant settings must be positive"));
        }

        for key in self.analysis.target_phones.keys() {
            if key.parse::<u32>().is_err() {
                return Err(NormkitError::config(format!(
                    "Target phone key '{key}' is not a variable number"
                )));
            }
        }

        if self.jobs == 0 {
            return Err(NormkitError::config("Job count must be greater than 0"));
        }
        if self.jobs > num_cpus::get() * 2 {
            return Err(NormkitError::config(
                "Job count cannot exceed 2x logical CPU cores",
            ));
        }

        Ok(())
    }

    /// Save config to a TOML file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| NormkitError::config(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path.as_ref(), content)
            .map_err(|e| NormkitError::config(format!("Failed to write config file: {e}")))
    }

    /// Target phone for a variable number, if profiled.
    pub fn target_phone(&self, variable_n: u32) -> Option<&str> {
        self.analysis
            .target_phones
            .get(&variable_n.to_string())
            .map(|s| s.as_str())
    }
}
