//! CLI definitions for ascbids
//!
//! This module contains the clap CLI structure definitions, separated from main.rs
//! so they can be accessed by xtask for documentation generation (man pages, markdown).

use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{ArgAction, Args, Parser, Subcommand};
use clap_complete::Shell as CompletionShell;

/// Build clap styles.
pub fn build_cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Green.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::White.on_default())
        .valid(AnsiColor::White.on_default())
        .invalid(AnsiColor::Red.on_default())
        .error(AnsiColor::Red.on_default() | Effects::BOLD)
}

#[derive(Parser)]
#[command(name = "ascbids")]
#[command(about = "Convert EyeLink ASC recordings into BIDS eye-tracking files")]
#[command(
    long_about = "ascbids - Convert EyeLink ASC recordings into BIDS eye-tracking files.

Each recording is split into a settings sidecar (_eyetrack.json), the gaze
sample table (_eyetrack.tsv.gz) and a per-trial event table (_events.tsv).
Trials are delimited by a start message (default: TRIALID) and either an end
message or the next start message.

QUICK START:
    ascbids inspect s01.asc                         Show what a file contains
    ascbids convert s01.asc -p 01 --task search     Convert one file
    ascbids batch raw/ -o bids/                     Convert every file of an info table

Defaults are read from ~/.config/ascbids/config.toml (see `ascbids config show`)."
)]
#[command(version, styles = build_cli_styles())]
pub struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Less log output (warnings and errors only)
    #[arg(short, long, global = true, action = ArgAction::Count, conflicts_with = "verbose")]
    pub quiet: u8,

    /// Use this configuration file instead of ~/.config/ascbids/config.toml
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Verbosity balance passed to the logger.
    pub fn verbosity(&self) -> i8 {
        i8::try_from(self.verbose).unwrap_or(i8::MAX) - i8::try_from(self.quiet).unwrap_or(i8::MAX)
    }
}

/// Trial segmentation options shared by the converting commands.
///
/// Every option falls back to the `[conversion]` section of the config.
#[derive(Args, Debug, Clone, Default)]
pub struct ParseArgs {
    /// Message text that opens a trial
    #[arg(long, short = 's', value_name = "TEXT")]
    pub start_message: Option<String>,

    /// Message text that closes a trial (default: the next start message)
    #[arg(long, short = 'e', value_name = "TEXT")]
    pub end_message: Option<String>,

    /// Message name to capture per trial (repeatable)
    #[arg(long = "event", value_name = "NAME")]
    pub saved_events: Vec<String>,
}

/// Output options shared by the writing commands.
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Root of the BIDS tree
    #[arg(long, short, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Write the sample table as plain .tsv instead of .tsv.gz
    #[arg(long)]
    pub no_compress: bool,

    /// Do not copy the source .asc into the BIDS tree
    #[arg(long)]
    pub no_copy: bool,

    /// Settings JSON whose non-null values overwrite extracted settings
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert one ASC file
    #[command(long_about = "Convert a single ASC file into BIDS eye-tracking files.

The participant label is required; the other entities are optional and are
left out of the file names when absent. Labels are reduced to letters and
digits (\"visual search\" becomes \"visualsearch\").

EXAMPLES:
    ascbids convert s01.asc -p 01
    ascbids convert s01.asc -p 01 --ses 2 --task search --run 1 -o bids/
    ascbids convert s01.asc -p 01 -s TRIALID -e TRIAL_RESULT --event STIM_ON
    ascbids convert s01.asc -p 01 --settings screen.json --events responses.tsv")]
    Convert {
        /// ASC file to convert
        input: PathBuf,

        /// Participant label (sub-<label>)
        #[arg(long, short)]
        participant: String,

        /// Session label (ses-<label>)
        #[arg(long)]
        ses: Option<String>,

        /// Task label (task-<label>); also fills TaskName when unset
        #[arg(long)]
        task: Option<String>,

        /// Acquisition label (acq-<label>)
        #[arg(long)]
        acq: Option<String>,

        /// Run label (run-<label>)
        #[arg(long)]
        run: Option<String>,

        /// Events TSV merged into the trial table by trial number
        #[arg(long, value_name = "FILE")]
        events: Option<PathBuf>,

        #[command(flatten)]
        parse: ParseArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Convert every file listed in an info table
    #[command(long_about = "Convert every file listed in the info table of a directory.

Without --info-file the table is the first .tsv file in the directory
whose header has a filename column. It needs the columns filename, filepath
and participant_id, and may add ses, task, acq, run and eventsfilename. An
empty filepath means the directory itself; eventsfilename is relative to
the folder of its data file. Columns that are constant for every file of a
participant go to the participants table; other columns that name sidecar
keys are applied to the settings of their file. Every .asc file under the
directory must be listed.

Files are converted in parallel. A failing file does not stop the others;
the command exits with an error if any file failed.

EXAMPLES:
    ascbids batch raw/ -o bids/
    ascbids batch raw/ --info-file sessions.tsv --workers 4")]
    Batch {
        /// Directory holding the info table and the data files
        input: PathBuf,

        /// Info table name inside the input directory (discovered when unset)
        #[arg(long, value_name = "NAME")]
        info_file: Option<String>,

        /// Worker threads
        #[arg(long, short = 'j')]
        workers: Option<usize>,

        #[command(flatten)]
        parse: ParseArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Write a starter info table and settings template
    #[command(long_about = "Write infoFiles.tsv and settings.json into a data directory.

The info table lists every .asc file under the directory with its filepath,
and its eventsfilename when a .tsv with the same name sits next to it. The
participant_id and entity columns are left empty to fill in by hand.
settings.json holds every sidecar key with a null value.

Refuses to overwrite existing files unless --force is given.

EXAMPLES:
    ascbids init raw/
    ascbids init raw/ --force")]
    Init {
        /// Directory holding the data files
        input: PathBuf,

        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Show what an ASC file contains without writing anything
    #[command(long_about = "Parse an ASC file and print a summary of its settings,
sample schema and trials.

EXAMPLES:
    ascbids inspect s01.asc
    ascbids inspect s01.asc --trials
    ascbids inspect s01.asc --json > s01.json")]
    Inspect {
        /// ASC file to inspect
        input: PathBuf,

        /// List every trial
        #[arg(long)]
        trials: bool,

        /// Print settings and trials as JSON
        #[arg(long, conflicts_with = "trials")]
        json: bool,

        #[command(flatten)]
        parse: ParseArgs,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    #[command(long_about = "Generate a shell completion script.

EXAMPLES:
    ascbids completions --shell bash > /etc/bash_completion.d/ascbids
    ascbids completions --shell zsh > ~/.zfunc/_ascbids")]
    Completions {
        /// Shell to generate completions for
        #[arg(long, value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration as TOML
    #[command(long_about = "Display the effective configuration in TOML format.

Values missing from the config file are shown with their defaults.

EXAMPLE:
    ascbids config show")]
    Show,
    /// Write the default configuration file
    #[command(long_about = "Write a configuration file holding the defaults.

Refuses to overwrite an existing file unless --force is given.

EXAMPLE:
    ascbids config init")]
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the configuration file path
    Path,
}
