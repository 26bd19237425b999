use anyhow::Result;
use clap::Parser;
use codexref::Settings;
use codexref::cli::commands::{index, init, retrieve};
use codexref::cli::{Cli, Commands};

fn load_config(cli: &Cli) -> Settings {
    let loaded = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    loaded.unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        eprintln!("Using default configuration for now.");
        Settings::default()
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // For non-init commands, check if project is initialized
    if !matches!(cli.command, Commands::Init { .. }) && cli.config.is_none() {
        if let Err(warning) = Settings::check_init() {
            eprintln!("Warning: {warning}");
            eprintln!("Run 'codexref init' to create one.");
        }
    }

    let config = load_config(&cli);
    codexref::logging::init_with_config(&config.logging);

    match cli.command {
        Commands::Init { force } => init::run_init(&std::env::current_dir()?, force),
        Commands::Config => init::run_config(&config),
        Commands::Index { path, threads } => index::run(path, threads, config),
        Commands::Retrieve { json, query } => retrieve::run(query, json, &config),
    }
}
