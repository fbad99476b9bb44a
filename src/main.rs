//! ascbids - CLI entry point

mod commands;

use anyhow::Result;
use clap::Parser;

use ascbids::cli::{Cli, Commands, ConfigCommands};
use ascbids::{logging, Config};

use commands::convert::EntityArgs;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbosity());

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::config_path()?,
    };

    let load_config = || Config::load_from(&config_path);

    match cli.command {
        Commands::Convert {
            input,
            participant,
            ses,
            task,
            acq,
            run,
            events,
            parse,
            output,
        } => {
            let entities = EntityArgs {
                participant,
                ses,
                task,
                acq,
                run,
            };
            commands::convert::handle(&load_config()?, input, entities, events, &parse, &output)
        }
        Commands::Batch {
            input,
            info_file,
            workers,
            parse,
            output,
        } => commands::batch::handle(&load_config()?, input, info_file, workers, &parse, &output),
        Commands::Inspect {
            input,
            trials,
            json,
            parse,
        } => commands::inspect::handle(&load_config()?, input, trials, json, &parse),
        Commands::Init { input, force } => commands::init::handle(&input, force),
        Commands::Completions { shell } => commands::completions::handle::<Cli>(shell),
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show => commands::config::handle_show(&load_config()?),
            ConfigCommands::Init { force } => commands::config::handle_init(&config_path, force),
            ConfigCommands::Path => commands::config::handle_path(&config_path),
        },
    }
}
