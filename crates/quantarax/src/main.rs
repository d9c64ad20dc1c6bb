//! QuantaraX CLI - point-to-point encrypted file transfer

#![forbid(unsafe_code)]

mod cli;
mod commands;
mod engine;
mod exit_codes;
mod logging;
mod output;
mod runtime;
pub mod sandbox;

use clap::Parser;
use cli::Cli;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logging(cli.verbose, cli.quiet) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(exit_codes::ERROR);
    }

    if let Err(e) = quantarax_store::persistence::ensure_dirs() {
        tracing::warn!("Failed to create storage directories: {}", e);
    }

    let rt = match runtime::build_runtime() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            std::process::exit(exit_codes::ERROR);
        }
    };

    let result = rt.block_on(dispatch(cli.command));

    match result {
        Ok(()) => std::process::exit(exit_codes::SUCCESS),
        Err(e) => {
            output::color::error(&format!("{}", e));
            if let Some(hint) = output::errors::diagnose(&e) {
                output::color::info(&hint);
            }
            std::process::exit(exit_codes::ERROR);
        }
    }
}

async fn dispatch(command: cli::Commands) -> anyhow::Result<()> {
    match command {
        cli::Commands::Send(args) => commands::send::execute(args).await,
        cli::Commands::Receive(args) => commands::receive::execute(args).await,
        cli::Commands::Identity(args) => commands::identity::execute(args).await,
        cli::Commands::Config(args) => commands::config_cmd::execute(args).await,
        cli::Commands::Doctor => commands::doctor::execute().await,
        cli::Commands::Completions(args) => {
            commands::completions::execute(args);
            Ok(())
        }
        cli::Commands::Version => {
            commands::version::execute();
            Ok(())
        }
    }
}
