mod catalog;
mod categorizer;
mod cli;
mod consolidator;
mod error;
mod exporter;
mod fmt;
mod importer;
mod models;
mod normalize;
mod rules;
mod settings;
mod similarity;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Categorize(args) => cli::categorize::run(args),
        Commands::Catalog { file } => cli::catalog::run(&file),
        Commands::Consolidate {
            file,
            category_column,
        } => cli::consolidate::run(&file, category_column.as_deref()),
        Commands::Rules { rules_file } => cli::rules::list(rules_file),
        Commands::Config { init } => cli::config::run(init),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
