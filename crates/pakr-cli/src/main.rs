//! pakr - a multi-format Linux packager

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pakr_cli::ui::Output;
use pakr_cli::{Cli, Commands, cmd};

fn main() -> ExitCode {
    // Logs go to stderr; artifacts and progress to stdout.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output = Output::new(cli.quiet);

    let result = match cli.command {
        Commands::Package {
            config,
            packagers,
            target,
        } => cmd::package::package(&config, &packagers, &target, &output),
        Commands::Init { config } => cmd::init::init(&config, &output),
        Commands::Completions { shell } => {
            cmd::completions::completions(shell);
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
