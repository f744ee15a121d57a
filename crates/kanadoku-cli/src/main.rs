//! kanadoku command-line tool.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Command};
use kanadoku_core::CorpusLayout;
use log::debug;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let layout = CorpusLayout::new(&cli.data_dir);
    let store_path = cli.store.clone().unwrap_or_else(commands::default_store_path);
    debug!(
        "Corpus in {}, selection state in {}",
        layout.root().display(),
        store_path.display()
    );

    let outcome = match &cli.command {
        Command::Generate(args) => commands::generate(&layout, args),
        Command::Validate(args) => commands::validate(&layout, args),
        Command::Maintain(args) => commands::maintain(&layout, args),
        Command::Pick { difficulty } => {
            commands::pick(&layout, &store_path, *difficulty, &mut rand::thread_rng())
        }
        Command::Skip { id } => commands::skip(&store_path, *id),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
