use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use normkit::pipeline::{extract, profile, select, subset, textgrids};
use normkit::praat::PraatRunner;
use normkit::Config;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(
    name = "normkit",
    version,
    about = "Fieldwork audio preparation for sociophonetic norming studies"
)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Bootstrap annotation TextGrids from silence detection
    Textgrids {
        /// Speaker to process
        #[arg(short, long)]
        speaker: String,

        /// Single recording stem instead of every WAV
        #[arg(short, long)]
        file: Option<String>,

        /// Word-list part: omit for all, 0 for none, 9 for the
        /// supplementary list, otherwise a variable number
        #[arg(short, long)]
        number: Option<u32>,

        /// Silence threshold override (dB)
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Minimum silent interval override (s)
        #[arg(long)]
        silent_interval: Option<f64>,

        /// Minimum sounding interval override (s)
        #[arg(long)]
        sounding_interval: Option<f64>,

        /// Read from 1_original instead of 2_processed
        #[arg(long = "original-dir")]
        original: bool,
    },

    /// Cut hand-coded tokens out of the recordings
    Extract {
        /// Speaker to process
        #[arg(short, long)]
        speaker: String,

        /// Read from 1_original instead of 2_processed
        #[arg(long = "original-dir")]
        original: bool,

        /// Replace existing outputs
        #[arg(short, long)]
        overwrite: bool,
    },

    /// Select target tokens, normalize, and concatenate
    Select {
        /// Speakers to process (comma separated); omit for all
        #[arg(short, long = "speaker", value_delimiter = ',')]
        speakers: Vec<String>,

        /// Replace existing outputs
        #[arg(short, long)]
        overwrite: bool,
    },

    /// Profile the concatenated selection acoustically
    Profile {
        /// Speaker to process
        #[arg(short, long)]
        speaker: String,

        /// Prepare the forced-alignment corpus
        #[arg(short, long)]
        alignment: bool,

        /// Run ProsodyPro over the word-level grids
        #[arg(short, long)]
        prosody: bool,

        /// Mark target phones and run FormantPro
        #[arg(short, long)]
        formants: bool,

        /// Mark target phones and stage FastTrack inputs
        #[arg(long)]
        fasttrack: bool,

        /// Replace existing outputs
        #[arg(short, long)]
        overwrite: bool,
    },

    /// Build the norming and rating subsets
    Subset {
        /// Speakers to process (comma separated); omit for all
        #[arg(short, long = "speaker", value_delimiter = ',')]
        speakers: Vec<String>,

        /// Seed for the shared random draw
        #[arg(short, long, default_value_t = 6)]
        random: u64,

        /// Variables to build rating subsets for (comma separated)
        #[arg(short = 'n', long = "variable", value_delimiter = ',')]
        variables: Vec<u32>,

        /// Collect outputs in the cross-speaker aggregate folders
        #[arg(short, long)]
        aggregate: bool,

        /// Replace existing outputs
        #[arg(short, long)]
        overwrite: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    normkit::init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        log::error!("{e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config =
        Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Command::Textgrids {
            speaker,
            file,
            number,
            threshold,
            silent_interval,
            sounding_interval,
            original,
        } => {
            if let Some(threshold) = threshold {
                config.analysis.silence_threshold_db = threshold;
            }
            if let Some(interval) = silent_interval {
                config.analysis.min_silent_interval = interval;
            }
            if let Some(interval) = sounding_interval {
                config.analysis.min_sounding_interval = interval;
            }
            config
                .validate()
                .context("Invalid silence detection settings")?;
            let runner = PraatRunner::from_config(&config.praat);
            textgrids::run(
                &config,
                &runner,
                &textgrids::TextgridsOptions {
                    speaker,
                    file,
                    scope: textgrids::WordListScope::from_number(number),
                    use_original: original,
                },
            )?;
        }
        Command::Extract {
            speaker,
            original,
            overwrite,
        } => {
            extract::run(
                &config,
                &extract::ExtractOptions {
                    speaker,
                    use_original: original,
                    overwrite,
                },
            )?;
        }
        Command::Select {
            speakers,
            overwrite,
        } => {
            select::run(&config, &select::SelectOptions { speakers, overwrite })?;
        }
        Command::Profile {
            speaker,
            alignment,
            prosody,
            formants,
            fasttrack,
            overwrite,
        } => {
            let runner = PraatRunner::from_config(&config.praat);
            profile::run(
                &config,
                &runner,
                &profile::ProfileOptions {
                    speaker,
                    alignment,
                    prosody,
                    formants,
                    fasttrack,
                    overwrite,
                },
            )?;
        }
        Command::Subset {
            speakers,
            random,
            variables,
            aggregate,
            overwrite,
        } => {
            subset::run(
                &config,
                &subset::SubsetOptions {
                    speakers,
                    seed: random,
                    variables,
                    aggregate,
                    overwrite,
                },
            )?;
        }
    }

    Ok(())
}
