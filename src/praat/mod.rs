//! Praat scripting bridge
//!
//! All heavy acoustics (silence detection, prosodic profiling, formant
//! profiling) runs inside Praat via `praat --run <script> <args...>` as a
//! subprocess. Requires a Praat binary on PATH or configured under
//! `[praat]`.

pub mod scripts;

use crate::config::PraatConfig;
use crate::error::{NormkitError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

pub struct PraatRunner {
    binary: PathBuf,
}

impl PraatRunner {
    pub fn new<P: Into<PathBuf>>(binary: P) -> Self {
        PraatRunner {
            binary: binary.into(),
        }
    }

    pub fn from_config(config: &PraatConfig) -> Self {
        Self::new(config.binary.clone())
    }

    /// Whether the configured binary answers to `--version`.
    pub fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .output()
            .map(|out| out.status.success())
            .unwrap_or(false)
    }

    /// Run a script with positional arguments, returning captured stdout.
    ///
    /// `workdir` matters for scripts that scan their own directory, such as
    /// ProsodyPro and FormantPro.
    pub fn run_script(
        &self,
        script: &Path,
        args: &[String],
        workdir: Option<&Path>,
    ) -> Result<String> {
        let mut command = Command::new(&self.binary);
        command.arg("--run").arg(script).args(args);
        if let Some(dir) = workdir {
            command.current_dir(dir);
        }

        log::debug!(
            "Running praat script {} with {} argument(s)",
            script.display(),
            args.len()
        );

        let output = command.output().map_err(|e| {
            NormkitError::praat(format!(
                "Failed to launch {}: {e}. Is Praat installed?",
                self.binary.display()
            ))
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(NormkitError::praat(format!(
                "Script {} failed ({}): {}",
                script.display(),
                output.status,
                stderr.trim()
            )));
        }

        if !stdout.trim().is_empty() {
            log::debug!("praat output: {}", stdout.trim());
        }
        Ok(stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary_is_unavailable() {
        let runner = PraatRunner::new("/nonexistent/praat-binary");
        assert!(!runner.is_available());
    }

    #[test]
    fn test_run_script_with_missing_binary() {
        let runner = PraatRunner::new("/nonexistent/praat-binary");
        let err = runner
            .run_script(Path::new("script.praat"), &[], None)
            .unwrap_err();
        assert!(err.to_string().contains("Praat"));
    }
}
